use crate::chromosome::Chromosome;
use crate::error::EvalError;
use crate::individual::Individual;
use crate::scorer::{FitnessMode, FitnessResult, Measurement};
use serde::{Deserialize, Serialize};

pub type JobId = u64;

/// What a worker computes for a job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EvalTask {
    /// Raw distance/time only; the run has no normalization window yet.
    Measure,
    Score(FitnessMode),
}

/// Self-contained unit of work. Carries no references into coordinator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalJob {
    pub run_id: String,
    pub individual_id: u64,
    pub chromosome: Chromosome,
    pub dataset_id: String,
    pub task: EvalTask,
    pub attempt: u32,
}

impl EvalJob {
    pub fn for_individual(run_id: &str, individual: &Individual, dataset_id: &str, task: EvalTask) -> Self {
        Self {
            run_id: run_id.to_string(),
            individual_id: individual.id(),
            chromosome: individual.chromosome().clone(),
            dataset_id: dataset_id.to_string(),
            task,
            attempt: 0,
        }
    }

    pub fn retry(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    pub job: EvalJob,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobOutcome {
    Scored(FitnessResult),
    Measured(Measurement),
    Failed(EvalError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub run_id: String,
    pub job_id: JobId,
    pub individual_id: u64,
    pub outcome: JobOutcome,
}
