//! Curling Sim - stone physics and delivery simulation for a curling game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integrator, friction, curl, collisions, sweeping, delivery)
//! - `settings`: Data-driven physics tuning and skill tiers

pub mod settings;
pub mod sim;

pub use settings::{Settings, SkillTier};
pub use sim::{SimulationContext, tick};

use glam::Vec2;

/// Simulation and sheet constants
///
/// Sheet-plane coordinates are in meters. `x` is lateral (0 on the centre
/// line, positive to the thrower's right), `y` runs along the sheet from the
/// delivering hack.
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Upper bound for the fast-forward multiplier
    pub const MAX_FAST_FORWARD: u32 = 8;

    /// Sheet dimensions
    pub const SHEET_HALF_WIDTH: f32 = 2.375;
    pub const HACK_Y: f32 = 0.0;
    pub const NEAR_HOG_LINE_Y: f32 = 10.06;
    pub const FAR_HOG_LINE_Y: f32 = 32.01;
    /// Far tee line; the button sits on the centre line here
    pub const FAR_TEE_LINE_Y: f32 = 38.41;
    pub const FAR_BACK_LINE_Y: f32 = 40.24;

    /// House rings (12-foot, 8-foot, 4-foot, button)
    pub const HOUSE_RADIUS: f32 = 1.83;
    pub const EIGHT_FOOT_RADIUS: f32 = 1.22;
    pub const FOUR_FOOT_RADIUS: f32 = 0.61;
    pub const BUTTON_RADIUS: f32 = 0.15;

    /// Stone defaults
    pub const STONE_RADIUS: f32 = 0.145;
    pub const STONE_MASS: f32 = 19.96;

    /// Out-of-play stones are parked beside the sheet
    pub const HOLDING_AREA_X: f32 = SHEET_HALF_WIDTH + 1.0;
    pub const HOLDING_AREA_SPACING: f32 = STONE_RADIUS * 2.5;
}

/// Button (centre of the far house)
#[inline]
pub fn button() -> Vec2 {
    Vec2::new(0.0, consts::FAR_TEE_LINE_Y)
}

/// Unit direction for an aim angle measured from the sheet's long axis
/// (positive angles aim to the right)
#[inline]
pub fn heading_to_direction(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), angle.cos())
}

/// Unit vector perpendicular to `dir`, pointing to its left
#[inline]
pub fn lateral_left(dir: Vec2) -> Vec2 {
    dir.perp()
}

/// Wrap a stone's handle rotation into [-PI, PI)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}
