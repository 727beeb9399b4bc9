/// Number of tracked fingers (left pinky = 0 ... left thumb = 4, right thumb = 5 ... right pinky = 9).
pub const FINGER_COUNT: usize = 10;

/// Characters typed between two finger-position resets.
pub const DEFAULT_RESET_INTERVAL: usize = 255;

/// Fitts's Law intercept (seconds).
pub const DEFAULT_FITTS_A: f64 = 0.05;

/// Fitts's Law slope (seconds per bit).
pub const DEFAULT_FITTS_B: f64 = 0.15;

/// Effective target width in key units.
pub const DEFAULT_TARGET_WIDTH: f64 = 1.0;

pub const DEFAULT_CROSSOVER_BIAS: f64 = 0.75;
pub const DEFAULT_OFFSPRING_PER_CROSSOVER: usize = 4;
pub const DEFAULT_TOURNAMENT_SIZE: usize = 3;

/// Chance per individual per generation of adding or removing a layer.
pub const LAYER_CHANGE_PROBABILITY: f64 = 0.01;

/// Bounds narrower than this count as a zero-width normalization window.
pub const NORMALIZATION_EPSILON: f64 = 1e-12;
