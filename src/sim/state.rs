//! Stone registry and simulation context
//!
//! Everything the core mutates lives in one owned `SimulationContext`; there
//! is no hidden global state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::delivery::{Delivery, DeliveryPhase};
use super::sweep::SweepInterpreter;
use crate::consts::*;
use crate::settings::Settings;

/// Stable handle for a stone (index into the registry arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoneId(pub u32);

impl StoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Red,
    Yellow,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Red => Team::Yellow,
            Team::Yellow => Team::Red,
        }
    }
}

/// Weight class decided at release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightClass {
    /// Slow release, meant to stop in front of the house
    Guard,
    #[default]
    Normal,
}

/// Why a stone left play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutOfPlayReason {
    HitSideWall,
    WentPastBackLine,
    DidNotReachFarHogLine,
    FreeGuardZoneViolation,
    /// Thrower never let go before the near hog line
    HogLineViolation,
}

/// Stone lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoneState {
    #[default]
    InPlay,
    OutOfPlay(OutOfPlayReason),
}

/// A curling stone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stone {
    pub id: StoneId,
    pub team: Team,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians per second, positive = counter-clockwise (curls left)
    pub angular_velocity: f32,
    /// Physical orientation (radians, [-π, π))
    pub rotation: f32,
    /// Speed at the moment of release
    pub initial_speed: f32,
    pub weight_class: WeightClass,
    pub state: StoneState,
}

impl Stone {
    pub fn new(id: StoneId, team: Team, position: Vec2) -> Self {
        Self {
            id,
            team,
            position,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            rotation: 0.0,
            initial_speed: 0.0,
            weight_class: WeightClass::Normal,
            state: StoneState::InPlay,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    #[inline]
    pub fn is_in_play(&self) -> bool {
        self.state == StoneState::InPlay
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }

    /// Reason the stone left play, if it has
    pub fn out_of_play_reason(&self) -> Option<OutOfPlayReason> {
        match self.state {
            StoneState::InPlay => None,
            StoneState::OutOfPlay(reason) => Some(reason),
        }
    }

    /// Kinetic energy in joules
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * STONE_MASS * self.velocity.length_squared()
    }

    /// Park the stone off the sheet and mark it out of play.
    ///
    /// Returns false if it was already out; the original reason is kept.
    pub(crate) fn take_out_of_play(&mut self, reason: OutOfPlayReason, parking: Vec2) -> bool {
        self.position = parking;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        if !self.is_in_play() {
            return false;
        }
        self.state = StoneState::OutOfPlay(reason);
        true
    }

    /// Free guard zone rollback: restore the stone to an earlier copy.
    ///
    /// This is the only path from out of play back to in play.
    pub(crate) fn restore_from(&mut self, earlier: &Stone) {
        debug_assert_eq!(self.id, earlier.id);
        *self = earlier.clone();
    }

    pub fn snapshot(&self) -> StoneSnapshot {
        StoneSnapshot {
            id: self.id,
            team: self.team,
            position: self.position,
            rotation: self.rotation,
            in_play: self.is_in_play(),
        }
    }
}

/// Per-tick render data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoneSnapshot {
    pub id: StoneId,
    pub team: Team,
    pub position: Vec2,
    pub rotation: f32,
    pub in_play: bool,
}

/// Discrete events for the presentation and rules layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    StoneCreated { id: StoneId, team: Team },
    StoneReleased { id: StoneId, speed: f32, spin: f32 },
    SweepStarted { id: StoneId },
    SweepStopped { id: StoneId },
    CollisionOccurred { a: StoneId, b: StoneId, relative_speed: f32 },
    StoneOutOfPlay { id: StoneId, reason: OutOfPlayReason },
    HogLineViolation { id: StoneId },
    FreeGuardZoneViolation { id: StoneId },
    DeliveryAborted,
    DeliveryResting,
}

/// Match progression read by the ice-conditioning model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchContext {
    /// Current end (1-based)
    pub current_end: u32,
    pub total_ends: u32,
}

impl Default for MatchContext {
    fn default() -> Self {
        Self {
            current_end: 1,
            total_ends: 8,
        }
    }
}

impl MatchContext {
    /// Fraction of the match played, in [0, 1]
    pub fn progression(&self) -> f32 {
        if self.total_ends == 0 {
            return 0.0;
        }
        (self.current_end as f32 / self.total_ends as f32).clamp(0.0, 1.0)
    }
}

/// Owned simulation state threaded through every core operation
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub settings: Settings,
    pub match_context: MatchContext,
    seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Stone arena; a stone's id is its index
    pub(crate) stones: Vec<Stone>,
    /// The just-released, still-controllable stone
    pub(crate) active: Option<StoneId>,
    pub(crate) delivery: Delivery,
    pub(crate) sweep: SweepInterpreter,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) deliveries_this_end: u32,
    parked: u32,
}

impl SimulationContext {
    /// Create a context with the given settings and RNG seed
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            settings,
            match_context: MatchContext::default(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            stones: Vec::new(),
            active: None,
            delivery: Delivery::new(Team::Red),
            sweep: SweepInterpreter::default(),
            events: Vec::new(),
            deliveries_this_end: 0,
            parked: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Reseed the ice variability source (e.g. per match)
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }

    pub fn set_match_context(&mut self, current_end: u32, total_ends: u32) {
        self.match_context = MatchContext {
            current_end,
            total_ends,
        };
    }

    /// Clear the sheet between ends
    pub fn reset_end(&mut self) {
        log::info!("Resetting end ({} stones cleared)", self.stones.len());
        self.stones.clear();
        self.active = None;
        self.sweep.reset();
        self.deliveries_this_end = 0;
        self.parked = 0;
        let team = self.delivery.team;
        self.delivery = Delivery::new(team);
    }

    /// Put a stationary stone on the sheet (setups, drills, tests)
    pub fn place_stone(&mut self, team: Team, position: Vec2) -> StoneId {
        let id = StoneId(self.stones.len() as u32);
        self.stones.push(Stone::new(id, team, position));
        self.events.push(SimEvent::StoneCreated { id, team });
        id
    }

    /// Remove a stone from play, parking it beside the sheet.
    ///
    /// Idempotent: a stone already out keeps its first reason and this
    /// returns false.
    pub fn remove_from_play(&mut self, id: StoneId, reason: OutOfPlayReason) -> bool {
        let parking = Vec2::new(HOLDING_AREA_X, self.parked as f32 * HOLDING_AREA_SPACING);
        let Some(stone) = self.stones.get_mut(id.index()) else {
            log::warn!("remove_from_play: unknown stone {:?}", id);
            return false;
        };
        if !stone.is_in_play() {
            return false;
        }
        stone.take_out_of_play(reason, parking);
        self.parked += 1;
        self.events.push(SimEvent::StoneOutOfPlay { id, reason });
        log::debug!("Stone {:?} out of play: {:?}", id, reason);

        if self.active == Some(id) {
            if self.sweep.is_sweeping() {
                self.events.push(SimEvent::SweepStopped { id });
            }
            self.active = None;
            self.sweep.reset();
        }
        true
    }

    pub fn stone(&self, id: StoneId) -> Option<&Stone> {
        self.stones.get(id.index())
    }

    pub(crate) fn stone_mut(&mut self, id: StoneId) -> Option<&mut Stone> {
        self.stones.get_mut(id.index())
    }

    /// All stones of the current end, in id order
    pub fn stones(&self) -> &[Stone] {
        &self.stones
    }

    pub fn in_play(&self) -> impl Iterator<Item = &Stone> {
        self.stones.iter().filter(|s| s.is_in_play())
    }

    pub fn in_play_count(&self) -> usize {
        self.in_play().count()
    }

    pub fn active_stone(&self) -> Option<StoneId> {
        self.active
    }

    pub fn phase(&self) -> DeliveryPhase {
        self.delivery.phase
    }

    /// Deliveries started in the current end
    pub fn deliveries_this_end(&self) -> u32 {
        self.deliveries_this_end
    }

    /// True when no in-play stone is moving
    pub fn all_at_rest(&self) -> bool {
        self.in_play().all(|s| !s.is_moving())
    }

    /// Render snapshots for every stone
    pub fn snapshots(&self) -> Vec<StoneSnapshot> {
        self.stones.iter().map(Stone::snapshot).collect()
    }

    /// In-play stones whose disc touches the circle around `point`
    pub fn stones_within(&self, point: Vec2, radius: f32) -> Vec<StoneId> {
        self.in_play()
            .filter(|s| s.position.distance(point) <= radius + STONE_RADIUS)
            .map(|s| s.id)
            .collect()
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
