//! Sweep gesture interpretation
//!
//! Turns a short window of pointer samples into two scalars:
//! - `effectiveness` in [0, 1]: how hard the brooms are working
//! - `curl_influence` in [-1, 1]: diagonal bias against (negative) or with
//!   (positive) the curl
//!
//! Samples are expected in sheet-aligned pointer space: `+y` points down the
//! sheet, units are arbitrary (pixels) and only matter through
//! `SweepTuning::full_speed`.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::SweepTuning;

/// One pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepSample {
    pub position: Vec2,
    /// Seconds on the caller's clock
    pub timestamp: f64,
}

impl SweepSample {
    pub fn new(x: f32, y: f32, timestamp: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            timestamp,
        }
    }
}

/// Derived sweep values consumed by the friction and curl models
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReading {
    pub effectiveness: f32,
    pub curl_influence: f32,
}

/// Start/stop edge of the sweeping state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepTransition {
    None,
    Started,
    Stopped,
}

/// Sliding-window sweep interpreter
#[derive(Debug, Clone, Default)]
pub struct SweepInterpreter {
    samples: VecDeque<SweepSample>,
    reading: SweepReading,
    /// A sample arrived since the last evaluation
    fresh: bool,
    ticks_since_sample: u32,
    sweeping: bool,
}

impl SweepInterpreter {
    /// Record a pointer sample; out-of-order samples are dropped
    pub fn push(&mut self, tuning: &SweepTuning, sample: SweepSample) {
        if let Some(last) = self.samples.back() {
            if sample.timestamp < last.timestamp {
                return;
            }
        }
        self.samples.push_back(sample);
        let cutoff = sample.timestamp - tuning.window_secs;
        while self.samples.front().is_some_and(|s| s.timestamp < cutoff) {
            self.samples.pop_front();
        }
        while self.samples.len() > tuning.max_samples.max(2) {
            self.samples.pop_front();
        }
        self.fresh = true;
    }

    /// Current reading
    pub fn reading(&self) -> SweepReading {
        self.reading
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping
    }

    /// Forget all samples and state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Recompute (or decay) the reading for one tick
    pub fn evaluate(
        &mut self,
        tuning: &SweepTuning,
        travel_dir: Vec2,
        angular_velocity: f32,
        dt: f32,
    ) -> SweepTransition {
        if self.fresh {
            self.fresh = false;
            self.ticks_since_sample = 0;
            self.reading = measure(tuning, &self.samples, travel_dir, angular_velocity);
        } else {
            self.ticks_since_sample = self.ticks_since_sample.saturating_add(1);
            if self.ticks_since_sample as f32 * dt > tuning.stall_grace_secs {
                self.reading.effectiveness *= tuning.stall_decay;
                self.reading.curl_influence *= tuning.stall_decay;
                if self.reading.effectiveness < 1e-3 {
                    self.reading = SweepReading::default();
                }
            }
        }

        let sweeping = self.reading.effectiveness > tuning.active_threshold;
        let transition = match (self.sweeping, sweeping) {
            (false, true) => SweepTransition::Started,
            (true, false) => SweepTransition::Stopped,
            _ => SweepTransition::None,
        };
        self.sweeping = sweeping;
        transition
    }
}

fn measure(
    tuning: &SweepTuning,
    samples: &VecDeque<SweepSample>,
    travel_dir: Vec2,
    angular_velocity: f32,
) -> SweepReading {
    let (Some(first), Some(last)) = (samples.front(), samples.back()) else {
        return SweepReading::default();
    };
    let elapsed = (last.timestamp - first.timestamp) as f32;
    if samples.len() < 2 || elapsed <= 1e-4 {
        return SweepReading::default();
    }

    let mut path_length = 0.0;
    // Strokes are folded to point down the sheet so back-and-forth motion
    // accumulates instead of cancelling
    let mut folded = Vec2::ZERO;
    for (prev, next) in samples.iter().zip(samples.iter().skip(1)) {
        let stroke = next.position - prev.position;
        path_length += stroke.length();
        folded += if stroke.dot(travel_dir) < 0.0 { -stroke } else { stroke };
    }

    let full_speed = tuning.full_speed.max(f32::EPSILON);
    let effectiveness = (path_length / elapsed / full_speed).clamp(0.0, 1.0);

    let folded_length = folded.length();
    let curl_influence = if folded_length > f32::EPSILON && angular_velocity != 0.0 {
        // Positive lean = strokes drift to the left of travel
        let lean = folded.dot(crate::lateral_left(travel_dir)) / folded_length;
        // Counter-clockwise stones curl left; leaning into that side fights it
        (-lean * angular_velocity.signum()).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    SweepReading {
        effectiveness,
        curl_influence,
    }
}
