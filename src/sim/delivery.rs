//! Delivery state machine
//!
//! One shot runs `Aiming → Charging → Sliding → Released → Sweeping →
//! Waiting`. Invalid inputs are ignored rather than rejected with errors;
//! rule failures (hog line, short stones, free guard zone) end up as
//! out-of-play reasons on the stone.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{OutOfPlayReason, SimEvent, SimulationContext, Stone, StoneId, Team, WeightClass};
use crate::consts::*;
use crate::heading_to_direction;

/// Phase of the current delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryPhase {
    /// Choosing line, curl and handle
    Aiming,
    /// Power building up
    Charging,
    /// Thrower still holding the stone
    Sliding,
    /// Let go; brooms not on yet
    Released,
    Sweeping,
    /// Everything at rest, waiting for the next delivery
    Waiting,
}

/// Rotation the thrower puts on the stone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurlDirection {
    /// Curls right
    Clockwise,
    /// Curls left
    CounterClockwise,
}

impl CurlDirection {
    /// Sign of the angular velocity
    pub fn sign(self) -> f32 {
        match self {
            CurlDirection::Clockwise => -1.0,
            CurlDirection::CounterClockwise => 1.0,
        }
    }
}

/// Complete shot description from a player or AI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryParams {
    /// Radians from the sheet's long axis, positive to the right
    pub aim_angle: f32,
    /// 0-100
    pub effort_percent: f32,
    pub curl_direction: CurlDirection,
    /// 0-100
    pub handle_amount: f32,
}

/// Result of a commit tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Power started charging
    Charging,
    /// Stone let go
    Released(StoneId),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    InsufficientPower,
}

/// Result of letting go of the charge input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeRelease {
    /// Stone created and sliding
    Sliding(StoneId),
    /// Back to aiming, no stone created
    Aborted(AbortReason),
    Ignored,
}

/// Per-shot state
#[derive(Debug, Clone)]
pub(crate) struct Delivery {
    pub phase: DeliveryPhase,
    pub team: Team,
    pub aim_angle: f32,
    pub curl: Option<CurlDirection>,
    pub handle: f32,
    pub effort: f32,
    /// Effort set explicitly; charging does not accumulate
    pub effort_locked: bool,
    pub slide_speed: f32,
    pub auto_release_y: Option<f32>,
    pub ticks_since_release: u32,
    /// Stone created by this delivery
    pub stone: Option<StoneId>,
    /// The delivered stone touched another stone
    pub struck_stone: bool,
    /// Registry before the stone was created (free guard zone rollback)
    pub pre_delivery: Vec<Stone>,
}

impl Delivery {
    pub fn new(team: Team) -> Self {
        Self {
            phase: DeliveryPhase::Aiming,
            team,
            aim_angle: 0.0,
            curl: None,
            handle: 50.0,
            effort: 0.0,
            effort_locked: false,
            slide_speed: 0.0,
            auto_release_y: None,
            ticks_since_release: 0,
            stone: None,
            struck_stone: false,
            pre_delivery: Vec::new(),
        }
    }
}

/// Free guard zone: past the far hog line, short of the tee line, outside the house
pub fn in_free_guard_zone(position: Vec2) -> bool {
    position.y >= FAR_HOG_LINE_Y
        && position.y < FAR_TEE_LINE_Y
        && position.distance(crate::button()) > HOUSE_RADIUS + STONE_RADIUS
}

impl SimulationContext {
    /// Start a new delivery for `team` (from `Waiting` or `Aiming`)
    pub fn begin_delivery(&mut self, team: Team) -> bool {
        match self.delivery.phase {
            DeliveryPhase::Waiting | DeliveryPhase::Aiming => {
                self.delivery = Delivery::new(team);
                self.sweep.reset();
                true
            }
            _ => false,
        }
    }

    pub fn delivering_team(&self) -> Team {
        self.delivery.team
    }

    /// Current effort (percent), including charge accumulated so far
    pub fn effort(&self) -> f32 {
        self.delivery.effort
    }

    /// Aim can still be adjusted while the thrower holds the stone
    pub fn set_aim(&mut self, angle: f32) {
        if matches!(
            self.delivery.phase,
            DeliveryPhase::Aiming | DeliveryPhase::Charging | DeliveryPhase::Sliding
        ) {
            self.delivery.aim_angle = angle;
        }
    }

    pub fn set_curl_direction(&mut self, curl: CurlDirection) {
        if matches!(
            self.delivery.phase,
            DeliveryPhase::Aiming | DeliveryPhase::Charging | DeliveryPhase::Sliding
        ) {
            self.delivery.curl = Some(curl);
        }
    }

    pub fn set_handle(&mut self, amount: f32) {
        if matches!(
            self.delivery.phase,
            DeliveryPhase::Aiming | DeliveryPhase::Charging | DeliveryPhase::Sliding
        ) {
            self.delivery.handle = amount.clamp(0.0, 100.0);
        }
    }

    /// Set power directly instead of charging it (AI path)
    pub fn set_effort(&mut self, percent: f32) {
        if matches!(
            self.delivery.phase,
            DeliveryPhase::Aiming | DeliveryPhase::Charging
        ) {
            self.delivery.effort = percent.clamp(0.0, 100.0);
            self.delivery.effort_locked = true;
        }
    }

    /// Commit tap: start charging, or let go of a sliding stone
    pub fn commit(&mut self) -> CommitOutcome {
        match self.delivery.phase {
            DeliveryPhase::Aiming => {
                if self.delivery.curl.is_none() {
                    log::debug!("Commit ignored: no curl direction selected");
                    return CommitOutcome::Ignored;
                }
                if !self.delivery.effort_locked {
                    self.delivery.effort = 0.0;
                }
                self.delivery.phase = DeliveryPhase::Charging;
                CommitOutcome::Charging
            }
            DeliveryPhase::Sliding => match self.release_stone() {
                Some(id) => CommitOutcome::Released(id),
                None => CommitOutcome::Ignored,
            },
            _ => CommitOutcome::Ignored,
        }
    }

    /// Let go of the charge input: push off, or abort if too weak
    pub fn release_charge(&mut self) -> ChargeRelease {
        if self.delivery.phase != DeliveryPhase::Charging {
            return ChargeRelease::Ignored;
        }

        let tuning = &self.settings.delivery;
        let effort = self.delivery.effort;
        if effort < tuning.min_commit_effort {
            log::info!("Delivery aborted: effort {:.1}% too low", effort);
            self.delivery.phase = DeliveryPhase::Aiming;
            self.delivery.effort_locked = false;
            self.events.push(SimEvent::DeliveryAborted);
            return ChargeRelease::Aborted(AbortReason::InsufficientPower);
        }

        let speed = tuning.min_slide_speed
            + (tuning.max_slide_speed - tuning.min_slide_speed) * effort / 100.0;

        self.delivery.pre_delivery = self.stones.clone();
        self.delivery.slide_speed = speed;
        self.delivery.struck_stone = false;
        self.deliveries_this_end += 1;

        let team = self.delivery.team;
        let direction = heading_to_direction(self.delivery.aim_angle);
        let id = self.place_stone(team, Vec2::new(0.0, HACK_Y));
        if let Some(stone) = self.stone_mut(id) {
            stone.velocity = direction * speed;
        }
        self.active = Some(id);
        self.delivery.stone = Some(id);
        self.delivery.phase = DeliveryPhase::Sliding;
        log::info!(
            "Delivery {} ({:?}): effort {:.1}% -> slide {:.2} m/s",
            self.deliveries_this_end,
            team,
            effort,
            speed
        );
        ChargeRelease::Sliding(id)
    }

    /// Run aiming, charging and push-off in one call and let go
    /// automatically at the configured release line
    pub fn execute_delivery(&mut self, params: DeliveryParams) -> ChargeRelease {
        if self.delivery.phase != DeliveryPhase::Aiming {
            return ChargeRelease::Ignored;
        }
        self.set_aim(params.aim_angle);
        self.set_curl_direction(params.curl_direction);
        self.set_handle(params.handle_amount);
        self.set_effort(params.effort_percent);
        if self.commit() != CommitOutcome::Charging {
            return ChargeRelease::Ignored;
        }
        let result = self.release_charge();
        if matches!(result, ChargeRelease::Sliding(_)) {
            self.delivery.auto_release_y = Some(self.settings.delivery.auto_release_y);
        }
        result
    }

    /// Let go: impart spin and hand the stone to the ice
    fn release_stone(&mut self) -> Option<StoneId> {
        let Some(id) = self.active else {
            log::warn!("Release with no active stone");
            return None;
        };
        let tuning = self.settings.delivery.clone();
        let curl = self
            .delivery
            .curl
            .unwrap_or(CurlDirection::CounterClockwise);
        let spin = curl.sign()
            * (tuning.min_spin + (tuning.max_spin - tuning.min_spin) * self.delivery.handle / 100.0);

        let stone = self.stone_mut(id)?;
        let speed = stone.speed();
        stone.angular_velocity = spin;
        stone.initial_speed = speed;
        stone.weight_class = if speed < tuning.guard_weight_speed {
            WeightClass::Guard
        } else {
            WeightClass::Normal
        };

        self.delivery.phase = DeliveryPhase::Released;
        self.delivery.ticks_since_release = 0;
        self.events.push(SimEvent::StoneReleased { id, speed, spin });
        log::info!("Released {:?} at {:.2} m/s, spin {:.2} rad/s", id, speed, spin);
        Some(id)
    }

    /// Delivery work done before the integrator moves stones
    pub(crate) fn delivery_pre_tick(&mut self, dt: f32) {
        match self.delivery.phase {
            DeliveryPhase::Charging => {
                if !self.delivery.effort_locked {
                    let rate = self.settings.delivery.charge_rate;
                    self.delivery.effort = (self.delivery.effort + rate * dt).min(100.0);
                }
            }
            DeliveryPhase::Sliding => {
                let Some(id) = self.active else {
                    log::warn!("Sliding with no active stone; ending delivery");
                    self.delivery.phase = DeliveryPhase::Waiting;
                    return;
                };
                if self.stone(id).is_none() {
                    log::warn!("Active stone {:?} missing; ending delivery", id);
                    self.active = None;
                    self.delivery.phase = DeliveryPhase::Waiting;
                    return;
                }
                let direction = heading_to_direction(self.delivery.aim_angle);
                let speed = self.delivery.slide_speed;
                let auto_release = self.delivery.auto_release_y;
                let mut reached_release = false;
                if let Some(stone) = self.stone_mut(id) {
                    stone.velocity = direction * speed;
                    reached_release = auto_release.is_some_and(|y| stone.position.y >= y);
                }
                self.delivery.slide_speed *= self.settings.delivery.slide_decay;
                if reached_release {
                    self.release_stone();
                }
            }
            DeliveryPhase::Released => {
                self.delivery.ticks_since_release += 1;
                let delay = self.settings.delivery.release_to_sweep_secs;
                if self.delivery.ticks_since_release as f32 * dt >= delay {
                    self.delivery.phase = DeliveryPhase::Sweeping;
                }
            }
            DeliveryPhase::Aiming | DeliveryPhase::Sweeping | DeliveryPhase::Waiting => {}
        }
    }

    /// Delivery work done after movement and contacts
    pub(crate) fn delivery_post_tick(&mut self) {
        match self.delivery.phase {
            DeliveryPhase::Sliding => self.check_hog_line(),
            DeliveryPhase::Released | DeliveryPhase::Sweeping => {
                if self.all_at_rest() {
                    self.conclude_delivery();
                }
            }
            _ => {}
        }
    }

    fn check_hog_line(&mut self) {
        let Some(id) = self.active else {
            // Lost to a side wall while still sliding
            self.delivery.phase = DeliveryPhase::Waiting;
            self.events.push(SimEvent::DeliveryResting);
            return;
        };
        let crossed = self
            .stone(id)
            .is_some_and(|s| s.position.y > NEAR_HOG_LINE_Y);
        if !crossed {
            return;
        }

        log::info!("Hog line violation by {:?}", id);
        self.remove_from_play(id, OutOfPlayReason::HogLineViolation);
        self.events.push(SimEvent::HogLineViolation { id });
        self.active = None;
        self.delivery.phase = DeliveryPhase::Waiting;
        self.events.push(SimEvent::DeliveryResting);
    }

    fn conclude_delivery(&mut self) {
        if let Some(id) = self.active {
            let short = self
                .stone(id)
                .is_some_and(|s| s.is_in_play() && s.position.y - STONE_RADIUS <= FAR_HOG_LINE_Y);
            // A stone that hit another stone stays where it ended up
            if short && !self.delivery.struck_stone {
                self.remove_from_play(id, OutOfPlayReason::DidNotReachFarHogLine);
            }
        }

        self.apply_free_guard_zone_rule();

        if let Some(id) = self.active.filter(|_| self.sweep.is_sweeping()) {
            self.events.push(SimEvent::SweepStopped { id });
        }
        self.active = None;
        self.sweep.reset();
        self.delivery.phase = DeliveryPhase::Waiting;
        self.events.push(SimEvent::DeliveryResting);
        log::info!("Delivery {} resting", self.deliveries_this_end);
    }

    /// Restore the sheet if a protected guard was removed during the
    /// opening deliveries of the end
    fn apply_free_guard_zone_rule(&mut self) {
        if self.deliveries_this_end > self.settings.delivery.free_guard_zone_deliveries {
            return;
        }
        let opponent = self.delivery.team.opponent();
        let violated = self
            .delivery
            .pre_delivery
            .iter()
            .filter(|s| s.is_in_play() && s.team == opponent && in_free_guard_zone(s.position))
            .any(|s| self.stone(s.id).is_some_and(|now| !now.is_in_play()));
        let Some(delivered) = self.delivery.stone.filter(|_| violated) else {
            return;
        };

        log::info!("Free guard zone violation by {:?}; restoring sheet", delivered);
        let pre_delivery = std::mem::take(&mut self.delivery.pre_delivery);
        for earlier in &pre_delivery {
            if let Some(stone) = self.stone_mut(earlier.id) {
                stone.restore_from(earlier);
            }
        }
        self.delivery.pre_delivery = pre_delivery;

        // A stone already out (e.g. deflected into a wall) keeps its first reason
        if !self.remove_from_play(delivered, OutOfPlayReason::FreeGuardZoneViolation) {
            log::debug!("{:?} already out of play; reason unchanged", delivered);
        }
        self.events.push(SimEvent::FreeGuardZoneViolation { id: delivered });
    }
}
