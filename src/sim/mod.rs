//! Deterministic simulation module
//!
//! All stone physics and delivery logic lives here. This module must be pure
//! and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (ice variability)
//! - Stable iteration order (by stone ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod curl;
pub mod delivery;
pub mod friction;
pub mod state;
pub mod sweep;
pub mod tick;

pub use collision::{ContactOutcome, resolve_stone_pair, wall_exit};
pub use delivery::{
    AbortReason, ChargeRelease, CommitOutcome, CurlDirection, DeliveryParams, DeliveryPhase,
    in_free_guard_zone,
};
pub use state::{
    MatchContext, OutOfPlayReason, SimEvent, SimulationContext, Stone, StoneId, StoneSnapshot,
    StoneState, Team, WeightClass,
};
pub use sweep::{SweepReading, SweepSample};
pub use tick::{FrameClock, TickInput, step, tick};
