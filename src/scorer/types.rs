use super::simulator::Measurement;
use crate::config::FitnessParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub distance: f64,
    pub time: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            distance: 0.5,
            time: 0.5,
        }
    }
}

impl From<&FitnessParams> for FitnessWeights {
    fn from(p: &FitnessParams) -> Self {
        Self {
            distance: p.weight_distance,
            time: p.weight_time,
        }
    }
}

/// Closed interval used for min-max normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Zero-width windows normalize everything to 0. Values outside are not clamped.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width.abs() < crate::consts::NORMALIZATION_EPSILON {
            0.0
        } else {
            (value - self.min) / width
        }
    }

    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Bounds>, v| match acc {
                None => Some(Bounds { min: v, max: v }),
                Some(b) => Some(Bounds {
                    min: b.min.min(v),
                    max: b.max.max(v),
                }),
            })
    }
}

/// Distance and time bounds, calibrated once per run and then frozen.
///
/// Layouts measured after calibration may fall outside these bounds, so their
/// normalized values (and fitness) can leave `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationWindow {
    pub distance: Bounds,
    pub time: Bounds,
}

impl NormalizationWindow {
    /// `[0, 1]` on both axes, i.e. raw values pass through unchanged.
    pub fn unit() -> Self {
        let b = Bounds { min: 0.0, max: 1.0 };
        Self { distance: b, time: b }
    }

    /// Min/max over the finite measurements; `None` if there are none.
    pub fn calibrate(measurements: &[Measurement]) -> Option<Self> {
        Some(Self {
            distance: Bounds::of(measurements.iter().map(|m| m.distance))?,
            time: Bounds::of(measurements.iter().map(|m| m.time))?,
        })
    }
}

/// Everything besides the chromosome and dataset that determines a fitness value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessMode {
    pub weights: FitnessWeights,
    pub window: NormalizationWindow,
}

impl FitnessMode {
    pub fn new(weights: FitnessWeights, window: NormalizationWindow) -> Self {
        Self { weights, window }
    }

    /// Stable label fed into cache fingerprints.
    pub fn label(&self) -> String {
        let w = &self.window;
        format!(
            "w={}/{};d=[{},{}];t=[{},{}]",
            self.weights.distance,
            self.weights.time,
            w.distance.min,
            w.distance.max,
            w.time.min,
            w.time.max
        )
    }

    pub fn combine(&self, m: Measurement) -> FitnessResult {
        let fitness = self.weights.distance * self.window.distance.normalize(m.distance)
            + self.weights.time * self.window.time.normalize(m.time);
        FitnessResult {
            fitness,
            distance: m.distance,
            time: m.time,
        }
    }
}

/// Lower is better. Failed evaluations carry `+inf` everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessResult {
    #[serde(with = "crate::util::non_finite_as_null")]
    pub fitness: f64,
    #[serde(with = "crate::util::non_finite_as_null")]
    pub distance: f64,
    #[serde(with = "crate::util::non_finite_as_null")]
    pub time: f64,
}

impl FitnessResult {
    pub fn failed() -> Self {
        Self {
            fitness: f64::INFINITY,
            distance: f64::INFINITY,
            time: f64::INFINITY,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.fitness.is_finite() && self.distance.is_finite() && self.time.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_window_normalizes_to_zero() {
        let b = Bounds { min: 3.0, max: 3.0 };
        assert_eq!(b.normalize(3.0), 0.0);
        assert_eq!(b.normalize(10.0), 0.0);
    }

    #[test]
    fn calibration_spans_measurements() {
        let ms = [
            Measurement {
                distance: 4.0,
                time: 1.0,
            },
            Measurement {
                distance: 2.0,
                time: 3.0,
            },
        ];
        let w = NormalizationWindow::calibrate(&ms).unwrap();
        assert_eq!(w.distance, Bounds { min: 2.0, max: 4.0 });
        assert_eq!(w.time, Bounds { min: 1.0, max: 3.0 });

        let mode = FitnessMode::new(FitnessWeights::default(), w);
        assert_eq!(mode.combine(ms[0]).fitness, 0.5);
        assert_eq!(mode.combine(ms[1]).fitness, 0.5);
    }

    #[test]
    fn values_outside_the_window_are_not_clamped() {
        let w = NormalizationWindow {
            distance: Bounds { min: 2.0, max: 4.0 },
            time: Bounds { min: 1.0, max: 3.0 },
        };
        assert_eq!(w.distance.normalize(6.0), 2.0);
        assert_eq!(w.time.normalize(0.0), -0.5);

        let mode = FitnessMode::new(FitnessWeights::default(), w);
        let better_than_calibration = Measurement {
            distance: 1.0,
            time: 0.0,
        };
        assert!(mode.combine(better_than_calibration).fitness < 0.0);
    }

    #[test]
    fn window_change_changes_label() {
        let a = FitnessMode::new(FitnessWeights::default(), NormalizationWindow::unit());
        let mut b = a;
        b.window.time.max = 2.0;
        assert_ne!(a.label(), b.label());
    }
}
