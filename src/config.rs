use crate::chromosome::{CharacterSet, LayerBounds};
use crate::consts::*;
use crate::error::{KeyForgeError, KfResult};
use crate::geometry::KeyboardGeometry;
use crate::optimizer::phases::Phase;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub fitness: FitnessParams,
    #[command(flatten)]
    pub simulation: SimulationParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchParams {
    /// Characters the search permutes across the assignable keys
    #[arg(long, default_value = "abcdefghijklmnopqrstuvwxyz,.;/")]
    pub charset: String,
    #[arg(long, default_value_t = 100)]
    pub population_size: usize,
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,
    /// Population phases as "iterations:max_population,..."; overrides the two above
    #[arg(long, default_value = "")]
    pub phases: String,
    #[arg(long, default_value_t = 1)]
    pub num_layers: usize,
    #[arg(long, default_value_t = 1)]
    pub max_layers: usize,
    #[arg(long, default_value_t = 50)]
    pub stagnant_limit: usize,
    #[arg(long, default_value_t = DEFAULT_TOURNAMENT_SIZE)]
    pub tournament_size: usize,
    #[arg(long, default_value_t = DEFAULT_CROSSOVER_BIAS)]
    pub crossover_bias: f64,
    #[arg(long, default_value_t = DEFAULT_OFFSPRING_PER_CROSSOVER)]
    pub offspring_per_crossover: usize,
    /// Swap probability of an upper layer; the base layer uses half
    #[arg(long, default_value_t = 0.3)]
    pub mutation_probability: f64,
    #[arg(long, default_value_t = LAYER_CHANGE_PROBABILITY)]
    pub layer_change_probability: f64,
    #[arg(long, default_value_t = false)]
    pub skip_heuristics: bool,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, default_value_t = default_workers())]
    pub workers: usize,
    #[arg(long, default_value_t = 30_000)]
    pub job_timeout_ms: u64,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            charset: "abcdefghijklmnopqrstuvwxyz,.;/".to_string(),
            population_size: 100,
            max_iterations: 200,
            phases: String::new(),
            num_layers: 1,
            max_layers: 1,
            stagnant_limit: 50,
            tournament_size: DEFAULT_TOURNAMENT_SIZE,
            crossover_bias: DEFAULT_CROSSOVER_BIAS,
            offspring_per_crossover: DEFAULT_OFFSPRING_PER_CROSSOVER,
            mutation_probability: 0.3,
            layer_change_probability: LAYER_CHANGE_PROBABILITY,
            skip_heuristics: false,
            seed: None,
            workers: default_workers(),
            job_timeout_ms: 30_000,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FitnessParams {
    #[arg(long, default_value_t = 0.5)]
    pub weight_distance: f64,
    #[arg(long, default_value_t = 0.5)]
    pub weight_time: f64,
}

impl Default for FitnessParams {
    fn default() -> Self {
        Self {
            weight_distance: 0.5,
            weight_time: 0.5,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationParams {
    #[arg(long, default_value_t = DEFAULT_FITTS_A)]
    pub fitts_a: f64,
    #[arg(long, default_value_t = DEFAULT_FITTS_B)]
    pub fitts_b: f64,
    #[arg(long, default_value_t = DEFAULT_TARGET_WIDTH)]
    pub target_width: f64,
    #[arg(long, default_value_t = DEFAULT_RESET_INTERVAL)]
    pub reset_interval: usize,
    /// Fixed per-press overhead for fingers 0..=9 (left pinky to right pinky)
    #[arg(long, default_value = "0,0,0,0,0,0,0,0,0,0")]
    pub finger_overhead: String,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            fitts_a: DEFAULT_FITTS_A,
            fitts_b: DEFAULT_FITTS_B,
            target_width: DEFAULT_TARGET_WIDTH,
            reset_interval: DEFAULT_RESET_INTERVAL,
            finger_overhead: "0,0,0,0,0,0,0,0,0,0".to_string(),
        }
    }
}

impl SimulationParams {
    pub fn finger_overhead(&self) -> KfResult<[f64; FINGER_COUNT]> {
        let values = parse_f64_array::<FINGER_COUNT>(&self.finger_overhead, "finger_overhead")?;
        if values.iter().any(|v| *v < 0.0) {
            return Err(KeyForgeError::Config(
                "finger_overhead values must be non-negative".into(),
            ));
        }
        Ok(values)
    }

    pub fn validate(&self) -> KfResult<()> {
        if !(self.target_width > 0.0 && self.target_width.is_finite()) {
            return Err(KeyForgeError::Config("target_width must be > 0".into()));
        }
        if !self.fitts_a.is_finite() || !self.fitts_b.is_finite() || self.fitts_b < 0.0 {
            return Err(KeyForgeError::Config(
                "fitts constants must be finite with fitts_b >= 0".into(),
            ));
        }
        if self.reset_interval == 0 {
            return Err(KeyForgeError::Config("reset_interval must be > 0".into()));
        }
        self.finger_overhead()?;
        Ok(())
    }
}

impl SearchParams {
    pub fn charset(&self) -> KfResult<CharacterSet> {
        CharacterSet::parse(&self.charset)
    }

    pub fn phases(&self) -> KfResult<Vec<Phase>> {
        if self.phases.trim().is_empty() {
            return Ok(vec![Phase::new(self.max_iterations, self.population_size)]);
        }
        self.phases
            .split(',')
            .map(|part| {
                let (iters, pop) = part.trim().split_once(':').ok_or_else(|| {
                    KeyForgeError::Config(format!("phase '{}' is not 'iterations:size'", part))
                })?;
                let iterations = iters.trim().parse().map_err(|_| {
                    KeyForgeError::Config(format!("invalid phase iterations '{}'", iters))
                })?;
                let max_population = pop.trim().parse().map_err(|_| {
                    KeyForgeError::Config(format!("invalid phase population '{}'", pop))
                })?;
                Ok(Phase::new(iterations, max_population))
            })
            .collect()
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Layer bounds implied by the character set and the board.
    pub fn layer_bounds(&self, geometry: &KeyboardGeometry) -> KfResult<LayerBounds> {
        let charset = self.search.charset()?;
        LayerBounds::new(charset.min_layers(geometry.slot_count()), self.search.max_layers)
    }

    /// Fails fast on anything that would make a run meaningless.
    pub fn validate(&self, geometry: &KeyboardGeometry) -> KfResult<()> {
        geometry.validate()?;
        self.simulation.validate()?;

        let s = &self.search;
        let charset = s.charset()?;
        if let Some(c) = charset.chars().iter().find(|c| geometry.fixed.contains_key(c)) {
            return Err(KeyForgeError::Config(format!(
                "{:?} is both in the character set and pinned by the geometry",
                c
            )));
        }

        let min_layers = charset.min_layers(geometry.slot_count());
        if s.num_layers < min_layers {
            return Err(KeyForgeError::Config(format!(
                "{} characters on {} keys need at least {} layers, num_layers is {}",
                charset.len(),
                geometry.slot_count(),
                min_layers,
                s.num_layers
            )));
        }
        if s.max_layers < s.num_layers {
            return Err(KeyForgeError::Config(format!(
                "max_layers ({}) is below num_layers ({})",
                s.max_layers, s.num_layers
            )));
        }
        if s.max_layers > geometry.addressable_layers() {
            return Err(KeyForgeError::Config(format!(
                "max_layers ({}) exceeds the {} layers the geometry can address",
                s.max_layers,
                geometry.addressable_layers()
            )));
        }

        let w = &self.fitness;
        if w.weight_distance < 0.0
            || w.weight_time < 0.0
            || (w.weight_distance + w.weight_time - 1.0).abs() > 1e-9
        {
            return Err(KeyForgeError::Config(format!(
                "fitness weights must be non-negative and sum to 1 (got {} + {})",
                w.weight_distance, w.weight_time
            )));
        }

        for phase in s.phases()? {
            if phase.iterations == 0 || phase.max_population < 2 {
                return Err(KeyForgeError::Config(format!(
                    "phase {:?} needs iterations >= 1 and population >= 2",
                    phase
                )));
            }
        }
        if s.tournament_size == 0 || s.offspring_per_crossover == 0 {
            return Err(KeyForgeError::Config(
                "tournament_size and offspring_per_crossover must be >= 1".into(),
            ));
        }
        for (name, p) in [
            ("crossover_bias", s.crossover_bias),
            ("mutation_probability", s.mutation_probability),
            ("layer_change_probability", s.layer_change_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(KeyForgeError::Config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, p
                )));
            }
        }
        if s.workers == 0 || s.job_timeout_ms == 0 {
            return Err(KeyForgeError::Config(
                "workers and job_timeout_ms must be > 0".into(),
            ));
        }
        if s.stagnant_limit == 0 {
            return Err(KeyForgeError::Config("stagnant_limit must be > 0".into()));
        }
        Ok(())
    }
}

fn parse_f64_array<const N: usize>(s: &str, name: &str) -> KfResult<[f64; N]> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != N {
        return Err(KeyForgeError::Config(format!(
            "--{} requires {} values",
            name, N
        )));
    }
    let mut arr = [0.0; N];
    for (i, p) in parts.iter().enumerate() {
        arr[i] = p
            .trim()
            .parse()
            .map_err(|_| KeyForgeError::Config(format!("Invalid number in {}", name)))?;
    }
    Ok(arr)
}
