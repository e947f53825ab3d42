//! Curl force model
//!
//! A spinning stone drifts sideways as it slows. Most of the drift happens
//! late in the stone's travel, so the lateral force is keyed to speed
//! normalized by release speed rather than to absolute speed.

use glam::Vec2;

use crate::lateral_left;
use crate::settings::CurlTuning;

/// Per-tick inputs for one stone
#[derive(Debug, Clone, Copy)]
pub struct CurlInputs {
    pub velocity: Vec2,
    pub initial_speed: f32,
    /// Positive = counter-clockwise = curls left
    pub angular_velocity: f32,
    pub sweep_effectiveness: f32,
    /// Negative fights the curl, positive lets it run
    pub curl_influence: f32,
    /// Ice variability sample in [-1, 1]
    pub jitter: f32,
    /// Skill-tier scale on the jitter amplitude
    pub variability_scale: f32,
}

/// Current speed over release speed, in [0, 1]
pub fn normalized_speed(speed: f32, initial_speed: f32) -> f32 {
    if initial_speed <= f32::EPSILON {
        return 0.0;
    }
    (speed / initial_speed).clamp(0.0, 1.0)
}

/// Late-curl gain: 0 at/above onset, `max_gain` at/below full, smooth ramp between
pub fn late_curl_gain(tuning: &CurlTuning, ratio: f32) -> f32 {
    if ratio >= tuning.onset_ratio {
        return 0.0;
    }
    if ratio <= tuning.full_ratio {
        return tuning.max_gain;
    }
    let t = (tuning.onset_ratio - ratio) / (tuning.onset_ratio - tuning.full_ratio);
    tuning.max_gain * t.clamp(0.0, 1.0).powf(tuning.onset_exponent)
}

/// More spin means less curl
pub fn rotation_factor(tuning: &CurlTuning, angular_velocity: f32) -> f32 {
    1.0 / (1.0 + tuning.spin_stability * angular_velocity.abs())
}

/// Relative jitter amplitude; low-spin stones dump unpredictably
pub fn jitter_amplitude(tuning: &CurlTuning, angular_velocity: f32) -> f32 {
    let mut amplitude = tuning.jitter * rotation_factor(tuning, angular_velocity);
    if angular_velocity.abs() < tuning.dump_spin {
        amplitude += tuning.dump_jitter;
    }
    amplitude
}

/// Multiplier from the brooms.
///
/// Any sweeping smooths the path a little; diagonal sweeping against the curl
/// holds the line, diagonal sweeping with it lets the stone fall.
pub fn sweep_curl_multiplier(tuning: &CurlTuning, effectiveness: f32, influence: f32) -> f32 {
    let effectiveness = effectiveness.clamp(0.0, 1.0);
    let influence = influence.clamp(-1.0, 1.0);
    let mut multiplier = 1.0 - tuning.sweep_neutral_reduction * effectiveness;
    if influence < 0.0 {
        multiplier *= 1.0 + influence * tuning.sweep_into_reduction * effectiveness;
    } else {
        multiplier *= 1.0 + influence * tuning.sweep_away_boost * effectiveness;
    }
    multiplier.max(0.0)
}

/// Lateral force (acceleration, m/s²) for this tick
pub fn lateral_force(tuning: &CurlTuning, inputs: &CurlInputs) -> Vec2 {
    let speed = inputs.velocity.length();
    if speed <= f32::EPSILON || inputs.angular_velocity == 0.0 {
        return Vec2::ZERO;
    }

    let ratio = normalized_speed(speed, inputs.initial_speed);
    let gain = late_curl_gain(tuning, ratio);
    if gain <= 0.0 {
        return Vec2::ZERO;
    }

    let amplitude = jitter_amplitude(tuning, inputs.angular_velocity) * inputs.variability_scale;
    let jitter = (1.0 + amplitude * inputs.jitter.clamp(-1.0, 1.0)).max(0.0);

    let magnitude = tuning.base_force
        * gain
        * rotation_factor(tuning, inputs.angular_velocity)
        * jitter
        * sweep_curl_multiplier(tuning, inputs.sweep_effectiveness, inputs.curl_influence);
    let magnitude = magnitude.clamp(0.0, tuning.max_force);

    let side = lateral_left(inputs.velocity / speed);
    side * magnitude * inputs.angular_velocity.signum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(speed: f32, spin: f32) -> CurlInputs {
        CurlInputs {
            velocity: Vec2::new(0.0, speed),
            initial_speed: 3.0,
            angular_velocity: spin,
            sweep_effectiveness: 0.0,
            curl_influence: 0.0,
            jitter: 0.0,
            variability_scale: 1.0,
        }
    }

    #[test]
    fn test_gain_endpoints() {
        let tuning = CurlTuning::default();
        assert_eq!(late_curl_gain(&tuning, 1.0), 0.0);
        assert_eq!(late_curl_gain(&tuning, tuning.onset_ratio), 0.0);
        assert_eq!(late_curl_gain(&tuning, tuning.full_ratio), tuning.max_gain);
        assert_eq!(late_curl_gain(&tuning, 0.0), tuning.max_gain);
    }

    #[test]
    fn test_no_curl_early_in_travel() {
        let tuning = CurlTuning::default();
        assert_eq!(lateral_force(&tuning, &inputs(2.9, 1.0)), Vec2::ZERO);
    }

    #[test]
    fn test_direction_follows_spin_sign() {
        let tuning = CurlTuning::default();
        let ccw = lateral_force(&tuning, &inputs(0.5, 1.0));
        let cw = lateral_force(&tuning, &inputs(0.5, -1.0));
        assert!(ccw.x < 0.0, "counter-clockwise curls left");
        assert!(cw.x > 0.0, "clockwise curls right");
        assert!(ccw.y.abs() < 1e-6);
        assert!((ccw.x + cw.x).abs() < 1e-6);
    }

    #[test]
    fn test_more_spin_curls_less() {
        let tuning = CurlTuning::default();
        let low = lateral_force(&tuning, &inputs(0.5, 0.5)).length();
        let high = lateral_force(&tuning, &inputs(0.5, 2.0)).length();
        assert!(high < low);
        assert!(jitter_amplitude(&tuning, 2.0) < jitter_amplitude(&tuning, 0.5));
    }

    #[test]
    fn test_dumping_stone_is_less_predictable() {
        let tuning = CurlTuning::default();
        let dumping = jitter_amplitude(&tuning, tuning.dump_spin * 0.5);
        let spinning = jitter_amplitude(&tuning, tuning.dump_spin * 2.0);
        assert!(dumping > spinning + tuning.dump_jitter * 0.9);
    }

    #[test]
    fn test_sweep_bias() {
        let tuning = CurlTuning::default();
        let neutral = sweep_curl_multiplier(&tuning, 1.0, 0.0);
        let into = sweep_curl_multiplier(&tuning, 1.0, -1.0);
        let away = sweep_curl_multiplier(&tuning, 1.0, 1.0);
        assert!(neutral < 1.0);
        assert!(into < neutral);
        assert!(away > neutral);
        assert_eq!(sweep_curl_multiplier(&tuning, 0.0, -1.0), 1.0);
    }

    #[test]
    fn test_force_is_capped() {
        let tuning = CurlTuning {
            base_force: 10.0,
            ..CurlTuning::default()
        };
        let force = lateral_force(&tuning, &inputs(0.2, 0.5));
        assert!(force.length() <= tuning.max_force + 1e-6);
    }

    #[test]
    fn test_zero_initial_speed_is_guarded() {
        assert_eq!(normalized_speed(1.0, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_gain_non_decreasing_as_stone_slows(a in 0.0f32..1.0, b in 0.0f32..1.0) {
            let tuning = CurlTuning::default();
            let (slow, fast) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(late_curl_gain(&tuning, slow) >= late_curl_gain(&tuning, fast));
        }

        #[test]
        fn prop_force_is_perpendicular_to_travel(
            angle in -0.3f32..0.3,
            speed in 0.05f32..1.5,
            spin in -2.5f32..2.5,
            jitter in -1.0f32..1.0,
        ) {
            let tuning = CurlTuning::default();
            let velocity = crate::heading_to_direction(angle) * speed;
            let force = lateral_force(&tuning, &CurlInputs {
                velocity,
                initial_speed: 3.0,
                angular_velocity: spin,
                sweep_effectiveness: 0.0,
                curl_influence: 0.0,
                jitter,
                variability_scale: 1.0,
            });
            prop_assert!(force.dot(velocity).abs() < 1e-4);
            prop_assert!(force.length() <= tuning.max_force + 1e-6);
        }
    }
}
