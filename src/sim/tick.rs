//! Fixed timestep simulation tick
//!
//! Advances the sheet deterministically: delivery bookkeeping, sweep
//! interpretation, per-stone integration, contacts, boundaries, rules.

use glam::Vec2;
use rand::Rng;

use super::collision;
use super::curl::{self, CurlInputs};
use super::delivery::{CurlDirection, DeliveryPhase};
use super::friction::{self, FrictionInputs};
use super::state::{SimEvent, SimulationContext};
use super::sweep::{SweepSample, SweepTransition};
use crate::consts::*;
use crate::normalize_angle;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim angle from the pointer (radians, positive to the right)
    pub aim_angle: Option<f32>,
    pub curl_direction: Option<CurlDirection>,
    /// Handle amount 0-100
    pub handle_amount: Option<f32>,
    /// Commit tap: start charging, or let go of a sliding stone
    pub commit: bool,
    /// Charge input let go
    pub release_charge: bool,
    /// Pointer samples gathered since the last tick
    pub sweep_samples: Vec<SweepSample>,
}

impl TickInput {
    /// Clear one-shot inputs after they have been applied
    pub fn clear_one_shots(&mut self) {
        self.commit = false;
        self.release_charge = false;
        self.sweep_samples.clear();
    }
}

/// Apply one tick of input, then advance the simulation
pub fn tick(ctx: &mut SimulationContext, input: &TickInput, dt: f32) {
    if let Some(curl) = input.curl_direction {
        ctx.set_curl_direction(curl);
    }
    if let Some(handle) = input.handle_amount {
        ctx.set_handle(handle);
    }
    if let Some(angle) = input.aim_angle {
        ctx.set_aim(angle);
    }
    if input.commit {
        ctx.commit();
    }
    if input.release_charge {
        ctx.release_charge();
    }
    if ctx.phase() == DeliveryPhase::Sweeping {
        for sample in &input.sweep_samples {
            ctx.sweep.push(&ctx.settings.sweep, *sample);
        }
    }

    step(ctx, dt);
}

/// Advance the simulation by one fixed timestep with no new input
pub fn step(ctx: &mut SimulationContext, dt: f32) {
    ctx.time_ticks += 1;

    ctx.delivery_pre_tick(dt);
    update_sweep(ctx, dt);
    integrate(ctx, dt);
    collision::resolve_collisions(ctx);
    collision::resolve_walls(ctx);
    ctx.delivery_post_tick();
}

/// Refresh the sweep reading for the active stone
fn update_sweep(ctx: &mut SimulationContext, dt: f32) {
    if ctx.phase() != DeliveryPhase::Sweeping {
        return;
    }
    let Some((id, travel_dir, spin)) = ctx
        .active
        .and_then(|id| ctx.stone(id))
        .filter(|s| s.is_moving())
        .map(|s| (s.id, s.velocity.normalize_or_zero(), s.angular_velocity))
    else {
        return;
    };

    match ctx.sweep.evaluate(&ctx.settings.sweep, travel_dir, spin, dt) {
        SweepTransition::Started => {
            log::debug!("Sweeping {:?}", id);
            ctx.events.push(SimEvent::SweepStarted { id });
        }
        SweepTransition::Stopped => {
            log::debug!("Stopped sweeping {:?}", id);
            ctx.events.push(SimEvent::SweepStopped { id });
        }
        SweepTransition::None => {}
    }
}

/// Move every in-play stone (id order)
fn integrate(ctx: &mut SimulationContext, dt: f32) {
    let phase = ctx.phase();
    let sliding = ctx.active.filter(|_| phase == DeliveryPhase::Sliding);
    let swept = ctx.active.filter(|_| phase == DeliveryPhase::Sweeping);
    let reading = ctx.sweep.reading();
    let progression = ctx.match_context.progression();

    let SimulationContext {
        settings,
        rng,
        stones,
        ..
    } = ctx;
    let variability = settings.skill_tier.variability_scale();

    for stone in stones.iter_mut() {
        if !stone.is_in_play() || !stone.is_moving() {
            continue;
        }

        // The thrower controls a sliding stone; the ice does not act on it yet
        if sliding == Some(stone.id) {
            stone.position += stone.velocity * dt;
            continue;
        }

        let (effectiveness, influence) = if swept == Some(stone.id) {
            (reading.effectiveness, reading.curl_influence)
        } else {
            (0.0, 0.0)
        };
        let noise: f32 = rng.random_range(-1.0..=1.0);
        let jitter: f32 = rng.random_range(-1.0..=1.0);
        let speed = stone.speed();

        let curl_accel = curl::lateral_force(
            &settings.curl,
            &CurlInputs {
                velocity: stone.velocity,
                initial_speed: stone.initial_speed,
                angular_velocity: stone.angular_velocity,
                sweep_effectiveness: effectiveness,
                curl_influence: influence,
                jitter,
                variability_scale: variability,
            },
        );
        stone.velocity += curl_accel * dt;

        let drag = friction::drag_coefficient(
            &settings.friction,
            &FrictionInputs {
                speed,
                weight_class: stone.weight_class,
                progression,
                skill_tier: settings.skill_tier,
                sweep_effectiveness: effectiveness,
                noise,
            },
        );
        stone.velocity *= 1.0 - drag;

        if let Some(damping) =
            friction::cliff_damping(&settings.friction, stone.speed(), stone.position.y)
        {
            stone.velocity *= damping;
        }
        stone.angular_velocity *= settings.curl.spin_damping;

        if stone.speed() < settings.friction.rest_speed {
            stone.velocity = Vec2::ZERO;
            stone.angular_velocity = 0.0;
        }

        stone.position += stone.velocity * dt;
        stone.rotation = normalize_angle(stone.rotation + stone.angular_velocity * dt);
    }
}

/// Fixed-timestep accumulator between a variable frame rate and `tick`
#[derive(Debug, Clone)]
pub struct FrameClock {
    accumulator: f32,
    fast_forward: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            accumulator: 0.0,
            fast_forward: 1,
        }
    }

    pub fn fast_forward(&self) -> u32 {
        self.fast_forward
    }

    /// Request more ticks per frame while a released stone travels
    pub fn set_fast_forward(&mut self, multiplier: u32) {
        self.fast_forward = multiplier.clamp(1, MAX_FAST_FORWARD);
    }

    /// Run as many fixed ticks as this frame covers; returns the tick count.
    ///
    /// Fast-forward only applies once the stone has been let go, and turns
    /// itself off when the delivery comes to rest.
    pub fn advance(
        &mut self,
        ctx: &mut SimulationContext,
        input: &mut TickInput,
        frame_dt: f32,
    ) -> u32 {
        let frame_dt = frame_dt.clamp(0.0, 0.1);
        let multiplier = match ctx.phase() {
            DeliveryPhase::Released | DeliveryPhase::Sweeping => self.fast_forward,
            _ => 1,
        };
        self.accumulator += frame_dt * multiplier as f32;

        let max_substeps = MAX_SUBSTEPS * multiplier;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < max_substeps {
            tick(ctx, input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            input.clear_one_shots();
        }
        // Drop whatever backlog the substep cap left behind
        if substeps == max_substeps {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        if ctx.phase() == DeliveryPhase::Waiting && self.fast_forward != 1 {
            log::debug!("Delivery resting; fast-forward off");
            self.fast_forward = 1;
        }
        substeps
    }
}
