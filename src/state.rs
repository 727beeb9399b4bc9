use crate::config::Config;
use crate::dispatch::EvaluationStats;
use crate::error::KfResult;
use crate::individual::{IdAllocator, Individual};
use crate::optimizer::Stagnation;
use crate::scorer::NormalizationWindow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumString};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Running,
    /// Every configured generation ran.
    Completed,
    /// Stopped after `stagnant_limit` generations without improvement.
    Stagnated,
    Cancelled,
}

/// Snapshot written at every generation boundary. Enough to continue the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    #[serde(default)]
    pub parent_run: Option<String>,
    pub config: Config,
    pub dataset_id: String,
    /// Last fully resolved generation (0 = initial population).
    pub generation: usize,
    pub ids: IdAllocator,
    pub window: Option<NormalizationWindow>,
    pub stagnation: Stagnation,
    pub status: RunStatus,
    #[serde(default)]
    pub stats: EvaluationStats,
    pub population: Vec<Individual>,
    /// Every individual ever evaluated, in evaluation order.
    pub history: Vec<Individual>,
}

impl RunState {
    /// Largest id seen anywhere in the run.
    pub fn max_id(&self) -> Option<u64> {
        self.history
            .iter()
            .chain(self.population.iter())
            .map(|i| i.id())
            .max()
    }

    pub fn best(&self) -> Option<&Individual> {
        self.population.iter().min_by(|a, b| a.cmp_fitness(b))
    }

    /// Writes via a sibling temp file so a crash never leaves a torn snapshot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KfResult<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(self)?)?;
        fs::rename(&tmp, path)?;
        debug!(
            "saved run {} at generation {} to {}",
            self.run_id,
            self.generation,
            path.display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
