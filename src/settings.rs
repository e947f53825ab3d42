//! Simulation settings and physics tuning
//!
//! Every model constant lives here so a front-end can ship alternative ice
//! without touching the core. Partial JSON documents are accepted; missing
//! fields fall back to the tuned defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Skill tier of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SkillTier {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl SkillTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillTier::Easy => "Easy",
            SkillTier::Normal => "Normal",
            SkillTier::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(SkillTier::Easy),
            "normal" | "medium" => Some(SkillTier::Normal),
            "hard" => Some(SkillTier::Hard),
            _ => None,
        }
    }

    /// Whether the ice speeds up as the match progresses
    pub fn ice_conditioning_enabled(&self) -> bool {
        !matches!(self, SkillTier::Easy)
    }

    /// Multiplier on ice variability (friction noise and curl jitter)
    pub fn variability_scale(&self) -> f32 {
        match self {
            SkillTier::Easy => 0.5,
            SkillTier::Normal => 1.0,
            SkillTier::Hard => 1.5,
        }
    }
}

/// Linear drag and ice conditioning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionTuning {
    /// Per-tick drag coefficient at running speed
    pub base_coefficient: f32,
    /// Fractional drag reduction reached by the last end
    pub ice_conditioning_max: f32,
    /// Guard-weight stones feel the conditioning ramp this much more
    pub guard_conditioning_sensitivity: f32,
    /// Upper edge of the medium-low speed band (m/s)
    pub band_ceiling_speed: f32,
    /// Lower edge of the medium-low speed band (m/s)
    pub band_floor_speed: f32,
    /// Extra drag at the bottom of the band (1.2 = +120%)
    pub band_gain: f32,
    /// Below this speed the cliff damping applies (m/s)
    pub cliff_speed: f32,
    /// Per-tick velocity multiplier under the cliff, short of the far hog line
    pub cliff_damping_short: f32,
    /// Per-tick velocity multiplier under the cliff, past the far hog line
    pub cliff_damping_long: f32,
    /// Speeds below this snap to zero (m/s)
    pub rest_speed: f32,
    /// Fraction of drag removed by perfect sweeping at the ideal speed
    pub sweep_reduction: f32,
    /// Speed where sweeping works best (m/s)
    pub sweep_peak_speed: f32,
    /// Width of the sweep response curve (m/s)
    pub sweep_speed_width: f32,
    /// Relative amplitude of per-tick ice noise
    pub noise: f32,
}

impl Default for FrictionTuning {
    fn default() -> Self {
        Self {
            base_coefficient: 0.0014,
            ice_conditioning_max: 0.06,
            guard_conditioning_sensitivity: 1.5,
            band_ceiling_speed: 1.2,
            band_floor_speed: 0.3,
            band_gain: 1.2,
            cliff_speed: 0.3,
            cliff_damping_short: 0.955,
            cliff_damping_long: 0.97,
            rest_speed: 0.01,
            sweep_reduction: 0.15,
            sweep_peak_speed: 1.8,
            sweep_speed_width: 1.4,
            noise: 0.02,
        }
    }
}

/// Curl force model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurlTuning {
    /// Lateral acceleration at full late-curl gain and unit rotation factor (m/s²)
    pub base_force: f32,
    /// Normalized speed above which there is no curl
    pub onset_ratio: f32,
    /// Normalized speed below which curl gain is at its maximum
    pub full_ratio: f32,
    /// Shape of the ramp between onset and full
    pub onset_exponent: f32,
    /// Late-curl gain at or below `full_ratio`
    pub max_gain: f32,
    /// How strongly spin suppresses curl and variance
    pub spin_stability: f32,
    /// Spin below this dumps unpredictably (rad/s)
    pub dump_spin: f32,
    /// Relative jitter on the curl force
    pub jitter: f32,
    /// Additional jitter while dumping
    pub dump_jitter: f32,
    /// Lateral force cap (m/s²)
    pub max_force: f32,
    /// Per-tick angular velocity multiplier
    pub spin_damping: f32,
    /// Curl reduction from straight sweeping at full effectiveness
    pub sweep_neutral_reduction: f32,
    /// Curl reduction from fully diagonal sweeping against the curl
    pub sweep_into_reduction: f32,
    /// Curl increase from fully diagonal sweeping with the curl
    pub sweep_away_boost: f32,
}

impl Default for CurlTuning {
    fn default() -> Self {
        Self {
            base_force: 0.035,
            onset_ratio: 0.7,
            full_ratio: 0.2,
            onset_exponent: 1.6,
            max_gain: 1.0,
            spin_stability: 0.4,
            dump_spin: 0.15,
            jitter: 0.08,
            dump_jitter: 0.5,
            max_force: 0.25,
            spin_damping: 0.9997,
            sweep_neutral_reduction: 0.05,
            sweep_into_reduction: 0.6,
            sweep_away_boost: 0.1,
        }
    }
}

/// Sweep gesture interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepTuning {
    /// Sliding sample window (seconds)
    pub window_secs: f64,
    /// Gesture speed that counts as full effectiveness (pointer units/s)
    pub full_speed: f32,
    /// How long input may stall before effectiveness decays (seconds)
    pub stall_grace_secs: f32,
    /// Per-tick decay once stalled
    pub stall_decay: f32,
    /// Effectiveness above which the brooms count as sweeping
    pub active_threshold: f32,
    /// Hard cap on buffered samples
    pub max_samples: usize,
}

impl Default for SweepTuning {
    fn default() -> Self {
        Self {
            window_secs: 0.5,
            full_speed: 1200.0,
            stall_grace_secs: 0.1,
            stall_decay: 0.85,
            active_threshold: 0.05,
            max_samples: 64,
        }
    }
}

/// Stone-stone contact response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Coefficient of restitution
    pub restitution: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self { restitution: 0.85 }
    }
}

/// Delivery phases and release mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryTuning {
    /// Slide speed at 0% effort (m/s)
    pub min_slide_speed: f32,
    /// Slide speed at 100% effort (m/s)
    pub max_slide_speed: f32,
    /// Per-tick multiplier on the thrower-controlled slide speed
    pub slide_decay: f32,
    /// Efforts below this abort the delivery (percent)
    pub min_commit_effort: f32,
    /// Effort accumulated per second of held charge (percent/s)
    pub charge_rate: f32,
    /// Spin at 0% handle (rad/s)
    pub min_spin: f32,
    /// Spin at 100% handle (rad/s)
    pub max_spin: f32,
    /// Delay between release and sweeping (seconds)
    pub release_to_sweep_secs: f32,
    /// Where scripted deliveries let go (m from the hack)
    pub auto_release_y: f32,
    /// Release speeds below this are guard weight (m/s)
    pub guard_weight_speed: f32,
    /// Deliveries per end protected by the free guard zone rule
    pub free_guard_zone_deliveries: u32,
}

impl Default for DeliveryTuning {
    fn default() -> Self {
        Self {
            min_slide_speed: 2.0,
            max_slide_speed: 4.0,
            slide_decay: 0.9996,
            min_commit_effort: 5.0,
            charge_rate: 60.0,
            min_spin: 0.2,
            max_spin: 2.4,
            release_to_sweep_secs: 0.25,
            auto_release_y: 8.5,
            guard_weight_speed: 2.6,
            free_guard_zone_deliveries: 5,
        }
    }
}

/// Complete simulation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Skill tier of the current match
    pub skill_tier: SkillTier,
    pub friction: FrictionTuning,
    pub curl: CurlTuning,
    pub sweep: SweepTuning,
    pub collision: CollisionTuning,
    pub delivery: DeliveryTuning,
}

impl Settings {
    /// Default tuning with the given skill tier
    pub fn for_tier(skill_tier: SkillTier) -> Self {
        Self {
            skill_tier,
            ..Self::default()
        }
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize settings to pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
