pub mod cache;
pub mod physics;
pub mod simulator;
pub mod types;

pub use self::cache::{CacheStats, FitnessCache};
pub use self::simulator::{Measurement, TypingSimulator};
pub use self::types::{Bounds, FitnessMode, FitnessResult, FitnessWeights, NormalizationWindow};

use crate::chromosome::Chromosome;
use crate::config::SimulationParams;
use crate::corpus::DatasetRegistry;
use crate::error::{EvalError, KfResult};
use crate::geometry::KeyboardGeometry;
use crate::keymap::CharacterMapping;
use crate::util::hash_parts;
use std::sync::Arc;
use tracing::debug;

/// Chromosome + dataset → fitness, through the simulator and the shared cache.
///
/// Holds only immutable inputs plus the internally synchronized cache, so one
/// instance is shared by every worker behind an `Arc`.
pub struct FitnessScorer {
    geometry: KeyboardGeometry,
    simulator: TypingSimulator,
    datasets: DatasetRegistry,
    cache: Arc<FitnessCache>,
}

impl FitnessScorer {
    pub fn new(
        geometry: KeyboardGeometry,
        params: &SimulationParams,
        datasets: DatasetRegistry,
    ) -> KfResult<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            simulator: TypingSimulator::new(params)?,
            datasets,
            cache: Arc::new(FitnessCache::new()),
        })
    }

    /// Swaps in a pre-populated (e.g. loaded from disk) cache.
    pub fn with_cache(mut self, cache: Arc<FitnessCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn geometry(&self) -> &KeyboardGeometry {
        &self.geometry
    }

    pub fn datasets(&self) -> &DatasetRegistry {
        &self.datasets
    }

    pub fn cache(&self) -> &Arc<FitnessCache> {
        &self.cache
    }

    pub fn fingerprint(chromosome: &Chromosome, dataset_id: &str, mode: &FitnessMode) -> String {
        hash_parts(&[&chromosome.canonical_string(), dataset_id, &mode.label()])
    }

    /// Raw distance/time, bypassing the cache.
    pub fn measure(&self, chromosome: &Chromosome, dataset_id: &str) -> Result<Measurement, EvalError> {
        let dataset = self
            .datasets
            .get(dataset_id)
            .ok_or_else(|| EvalError::UnknownDataset(dataset_id.to_string()))?;

        chromosome
            .check_shape()
            .map_err(|e| EvalError::InvalidChromosome(e.to_string()))?;
        let mapping = CharacterMapping::build(chromosome, &self.geometry)
            .map_err(|e| EvalError::InvalidChromosome(e.to_string()))?;

        let m = self.simulator.simulate(&dataset.text, &mapping, &self.geometry);
        if !m.distance.is_finite() || !m.time.is_finite() {
            return Err(EvalError::Simulation(format!(
                "non-finite measurement (distance {}, time {})",
                m.distance, m.time
            )));
        }
        Ok(m)
    }

    pub fn score(
        &self,
        chromosome: &Chromosome,
        dataset_id: &str,
        mode: &FitnessMode,
    ) -> Result<FitnessResult, EvalError> {
        let fingerprint = Self::fingerprint(chromosome, dataset_id, mode);
        if let Some(hit) = self.cache.get(&fingerprint) {
            return Ok(hit);
        }

        let result = mode.combine(self.measure(chromosome, dataset_id)?);
        debug!(
            "scored {} → {:.5} (d {:.2}, t {:.2})",
            &fingerprint[..12],
            result.fitness,
            result.distance,
            result.time
        );
        self.cache.insert(fingerprint, result);
        Ok(result)
    }

    /// Stores a result computed outside `score` (calibration batches).
    pub fn record(&self, chromosome: &Chromosome, dataset_id: &str, mode: &FitnessMode, result: FitnessResult) {
        self.cache
            .insert(Self::fingerprint(chromosome, dataset_id, mode), result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::{CharacterSet, Layer};
    use crate::corpus::Dataset;

    fn scorer() -> FitnessScorer {
        FitnessScorer::new(
            KeyboardGeometry::standard(),
            &SimulationParams::default(),
            DatasetRegistry::with(Dataset::new("t", "hello world, the quick brown fox")),
        )
        .unwrap()
    }

    fn qwerty() -> Chromosome {
        let cs = CharacterSet::parse("qwertyuiopasdfghjkl;zxcvbnm,./").unwrap();
        Chromosome::single(Layer::identity(&cs))
    }

    #[test]
    fn cache_hit_equals_cold_value() {
        let s = scorer();
        let mode = FitnessMode::new(FitnessWeights::default(), NormalizationWindow::unit());
        let cold = s.score(&qwerty(), "t", &mode).unwrap();
        let warm = s.score(&qwerty(), "t", &mode).unwrap();
        assert_eq!(cold, warm);
        assert_eq!(s.cache().stats().hits, 1);
    }

    #[test]
    fn unknown_dataset_is_an_eval_error() {
        let s = scorer();
        let mode = FitnessMode::new(FitnessWeights::default(), NormalizationWindow::unit());
        assert_eq!(
            s.score(&qwerty(), "nope", &mode),
            Err(EvalError::UnknownDataset("nope".into()))
        );
    }

    #[test]
    fn unit_window_is_weighted_raw_cost() {
        let s = scorer();
        let m = s.measure(&qwerty(), "t").unwrap();
        let mode = FitnessMode::new(FitnessWeights::default(), NormalizationWindow::unit());
        let r = s.score(&qwerty(), "t", &mode).unwrap();
        assert!((r.fitness - 0.5 * (m.distance + m.time)).abs() < 1e-9);
    }
}
