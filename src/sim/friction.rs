//! Friction and ice-conditioning model
//!
//! Produces the per-tick linear drag coefficient for a moving stone, plus the
//! separate low-speed "cliff" damping. This is a tuned approximation aimed at
//! real-world travel times, not a first-principles friction model.

use super::state::WeightClass;
use crate::consts::FAR_HOG_LINE_Y;
use crate::settings::{FrictionTuning, SkillTier};

/// Everything the drag coefficient depends on for one stone and one tick
#[derive(Debug, Clone, Copy)]
pub struct FrictionInputs {
    pub speed: f32,
    pub weight_class: WeightClass,
    /// Match progression in [0, 1]
    pub progression: f32,
    pub skill_tier: SkillTier,
    /// Sweep effectiveness in [0, 1]
    pub sweep_effectiveness: f32,
    /// Ice noise sample in [-1, 1]
    pub noise: f32,
}

/// Multiplier (≤ 1) from the ice getting faster as the match goes on
pub fn ice_conditioning_factor(
    tuning: &FrictionTuning,
    weight_class: WeightClass,
    progression: f32,
    skill_tier: SkillTier,
) -> f32 {
    if !skill_tier.ice_conditioning_enabled() {
        return 1.0;
    }
    let sensitivity = match weight_class {
        WeightClass::Guard => tuning.guard_conditioning_sensitivity,
        WeightClass::Normal => 1.0,
    };
    let reduction = tuning.ice_conditioning_max * progression.clamp(0.0, 1.0) * sensitivity;
    1.0 - reduction.clamp(0.0, 0.9)
}

/// Multiplier (≥ 1) for the medium-low speed band
pub fn speed_regime_factor(tuning: &FrictionTuning, speed: f32) -> f32 {
    if speed >= tuning.band_ceiling_speed {
        return 1.0;
    }
    let width = tuning.band_ceiling_speed - tuning.band_floor_speed;
    let depth = if width > f32::EPSILON {
        ((tuning.band_ceiling_speed - speed) / width).clamp(0.0, 1.0)
    } else {
        1.0
    };
    1.0 + tuning.band_gain.max(0.0) * depth
}

/// How much sweeping helps at this speed, in [0, 1]
///
/// Peaks at `sweep_peak_speed` and falls away for very fast or nearly
/// stopped stones.
pub fn sweep_speed_response(tuning: &FrictionTuning, speed: f32) -> f32 {
    if tuning.sweep_speed_width <= f32::EPSILON {
        return 0.0;
    }
    let x = (speed - tuning.sweep_peak_speed) / tuning.sweep_speed_width;
    (-x * x).exp()
}

/// Per-tick drag coefficient, applied as `velocity *= 1 - coefficient`
pub fn drag_coefficient(tuning: &FrictionTuning, inputs: &FrictionInputs) -> f32 {
    let mut coefficient = tuning.base_coefficient
        * ice_conditioning_factor(
            tuning,
            inputs.weight_class,
            inputs.progression,
            inputs.skill_tier,
        );

    coefficient *= speed_regime_factor(tuning, inputs.speed);

    let sweep = inputs.sweep_effectiveness.clamp(0.0, 1.0)
        * sweep_speed_response(tuning, inputs.speed)
        * tuning.sweep_reduction;
    coefficient *= 1.0 - sweep.clamp(0.0, 1.0);

    let noise = inputs.noise.clamp(-1.0, 1.0) * tuning.noise * inputs.skill_tier.variability_scale();
    coefficient *= 1.0 + noise;

    coefficient.clamp(0.0, 1.0)
}

/// Extra direct velocity damping near rest.
///
/// Stones short of the far hog line die faster than stones already in the
/// scoring end.
pub fn cliff_damping(tuning: &FrictionTuning, speed: f32, position_y: f32) -> Option<f32> {
    if speed >= tuning.cliff_speed {
        return None;
    }
    let damping = if position_y < FAR_HOG_LINE_Y {
        tuning.cliff_damping_short
    } else {
        tuning.cliff_damping_long
    };
    Some(damping.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(speed: f32) -> FrictionInputs {
        FrictionInputs {
            speed,
            weight_class: WeightClass::Normal,
            progression: 0.0,
            skill_tier: SkillTier::Normal,
            sweep_effectiveness: 0.0,
            noise: 0.0,
        }
    }

    #[test]
    fn test_high_speed_uses_base_coefficient() {
        let tuning = FrictionTuning::default();
        let c = drag_coefficient(&tuning, &inputs(3.0));
        assert!((c - tuning.base_coefficient).abs() < 1e-9);
    }

    #[test]
    fn test_band_raises_drag_as_speed_falls() {
        let tuning = FrictionTuning::default();
        let upper = drag_coefficient(&tuning, &inputs(1.1));
        let lower = drag_coefficient(&tuning, &inputs(0.5));
        assert!(lower > upper);
        assert!(upper > tuning.base_coefficient);
        let floor = speed_regime_factor(&tuning, 0.1);
        assert!((floor - (1.0 + tuning.band_gain)).abs() < 1e-6);
    }

    #[test]
    fn test_conditioning_speeds_up_ice() {
        let tuning = FrictionTuning::default();
        let early = ice_conditioning_factor(&tuning, WeightClass::Normal, 0.0, SkillTier::Normal);
        let late = ice_conditioning_factor(&tuning, WeightClass::Normal, 1.0, SkillTier::Normal);
        let late_guard = ice_conditioning_factor(&tuning, WeightClass::Guard, 1.0, SkillTier::Normal);
        assert_eq!(early, 1.0);
        assert!(late < early);
        assert!(late_guard < late);
    }

    #[test]
    fn test_easy_tier_has_no_conditioning() {
        let tuning = FrictionTuning::default();
        let f = ice_conditioning_factor(&tuning, WeightClass::Guard, 1.0, SkillTier::Easy);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_sweeping_reduces_drag_most_at_moderate_speed() {
        let tuning = FrictionTuning::default();
        let swept = |speed: f32| {
            let unswept = drag_coefficient(&tuning, &inputs(speed));
            let swept = drag_coefficient(
                &tuning,
                &FrictionInputs {
                    sweep_effectiveness: 1.0,
                    ..inputs(speed)
                },
            );
            1.0 - swept / unswept
        };
        let moderate = swept(tuning.sweep_peak_speed);
        assert!(moderate > swept(4.5));
        assert!(moderate > swept(0.05));
        assert!((moderate - tuning.sweep_reduction).abs() < 1e-5);
    }

    #[test]
    fn test_cliff_depends_on_side_of_far_hog() {
        let tuning = FrictionTuning::default();
        assert_eq!(cliff_damping(&tuning, 1.0, 20.0), None);
        assert_eq!(
            cliff_damping(&tuning, 0.1, FAR_HOG_LINE_Y - 1.0),
            Some(tuning.cliff_damping_short)
        );
        assert_eq!(
            cliff_damping(&tuning, 0.1, FAR_HOG_LINE_Y + 1.0),
            Some(tuning.cliff_damping_long)
        );
    }

    #[test]
    fn test_degenerate_band_does_not_divide_by_zero() {
        let tuning = FrictionTuning {
            band_floor_speed: 1.0,
            band_ceiling_speed: 1.0,
            ..FrictionTuning::default()
        };
        let f = speed_regime_factor(&tuning, 0.0);
        assert!(f.is_finite());
    }

    proptest! {
        #[test]
        fn prop_coefficient_stays_in_unit_range(
            speed in 0.0f32..6.0,
            progression in -1.0f32..2.0,
            effectiveness in -1.0f32..2.0,
            noise in -5.0f32..5.0,
            guard in any::<bool>(),
        ) {
            let tuning = FrictionTuning::default();
            let c = drag_coefficient(&tuning, &FrictionInputs {
                speed,
                weight_class: if guard { WeightClass::Guard } else { WeightClass::Normal },
                progression,
                skill_tier: SkillTier::Hard,
                sweep_effectiveness: effectiveness,
                noise,
            });
            prop_assert!((0.0..=1.0).contains(&c));
        }
    }
}
