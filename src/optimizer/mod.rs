pub mod crossover;
pub mod initialization;
pub mod mutation;
pub mod phases;
pub mod population;
pub mod runner;
pub mod selection;

pub use self::phases::{Phase, PhaseSchedule};
pub use self::population::{GeneticParams, Population, Stagnation};
pub use self::runner::{GenerationReport, ProgressCallback, RunController, RunResult};

use crate::error::KfResult;
use crate::individual::Individual;

/// Scores a batch of individuals, returning them in the same order.
///
/// Per-individual failures come back as +inf fitness; an `Err` aborts the run.
pub trait Evaluator {
    fn evaluate(&mut self, batch: Vec<Individual>) -> KfResult<Vec<Individual>>;
}
