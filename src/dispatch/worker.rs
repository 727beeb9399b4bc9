use super::job::{EvalJob, EvalTask, JobOutcome, JobResult};
use super::queue::JobQueue;
use crate::error::{EvalError, KeyForgeError, KfResult};
use crate::scorer::FitnessScorer;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// The pure computation behind a job.
pub trait JobExecutor: Send + Sync + 'static {
    fn execute(&self, job: &EvalJob) -> JobOutcome;
}

impl JobExecutor for FitnessScorer {
    fn execute(&self, job: &EvalJob) -> JobOutcome {
        let outcome = match &job.task {
            EvalTask::Measure => self
                .measure(&job.chromosome, &job.dataset_id)
                .map(JobOutcome::Measured),
            EvalTask::Score(mode) => self
                .score(&job.chromosome, &job.dataset_id, mode)
                .map(JobOutcome::Scored),
        };
        outcome.unwrap_or_else(JobOutcome::Failed)
    }
}

/// Fixed set of async workers draining a [`JobQueue`].
///
/// Each worker owns a single-thread rayon pool for the CPU-bound part and waits
/// for it with a timeout. A job that overruns is abandoned together with its
/// pool, so the next job always starts on an idle thread and its clock only
/// measures its own work.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn<Q: JobQueue>(
        runtime: &Handle,
        queue: Arc<Q>,
        executor: Arc<dyn JobExecutor>,
        size: usize,
        timeout: Duration,
    ) -> KfResult<Self> {
        let handles = (0..size.max(1))
            .map(|worker_id| {
                let compute = compute_pool(worker_id, 0)?;
                let queue = queue.clone();
                let executor = executor.clone();
                Ok(runtime.spawn(async move {
                    worker_loop(worker_id, queue, executor, compute, timeout).await;
                }))
            })
            .collect::<KfResult<Vec<_>>>()?;

        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn abort(&self) {
        for h in &self.handles {
            h.abort();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.abort();
    }
}

fn compute_pool(worker_id: usize, generation: usize) -> KfResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .thread_name(move |_| format!("keyforge-eval-{}.{}", worker_id, generation))
        .build()
        .map_err(|e| KeyForgeError::Runtime(e.to_string()))
}

async fn worker_loop<Q: JobQueue>(
    worker_id: usize,
    queue: Arc<Q>,
    executor: Arc<dyn JobExecutor>,
    mut compute: rayon::ThreadPool,
    timeout: Duration,
) {
    let mut abandoned = 0usize;
    while let Some(queued) = queue.dequeue().await {
        if queue.is_retired(&queued.job.run_id) {
            continue;
        }
        debug!(
            "worker {} took job {} (individual {}, attempt {})",
            worker_id, queued.id, queued.job.individual_id, queued.job.attempt
        );

        let outcome = run_job(&executor, &compute, queued.job.clone(), timeout).await;
        if let JobOutcome::Failed(e) = &outcome {
            warn!(
                "⚠️  Worker {}: individual {} failed: {}",
                worker_id, queued.job.individual_id, e
            );
        }

        let timed_out = matches!(outcome, JobOutcome::Failed(EvalError::TimedOut(_)));
        queue.publish_result(JobResult {
            run_id: queued.job.run_id,
            job_id: queued.id,
            individual_id: queued.job.individual_id,
            outcome,
        });

        // The overrunning closure keeps its thread until it returns; later jobs get a fresh one.
        if timed_out {
            abandoned += 1;
            match compute_pool(worker_id, abandoned) {
                Ok(fresh) => compute = fresh,
                Err(e) => {
                    error!("❌ Worker {}: cannot replace compute thread: {}", worker_id, e);
                    break;
                }
            }
        }
    }
    debug!("worker {} stopped", worker_id);
}

/// Runs one job on an idle compute pool, converting panics and overruns into failures.
pub async fn run_job(
    executor: &Arc<dyn JobExecutor>,
    compute: &rayon::ThreadPool,
    job: EvalJob,
    timeout: Duration,
) -> JobOutcome {
    let (tx, rx) = oneshot::channel();
    let executor = executor.clone();

    compute.spawn(move || {
        let outcome = catch_unwind(AssertUnwindSafe(|| executor.execute(&job)))
            .unwrap_or_else(|payload| {
                JobOutcome::Failed(EvalError::Panicked(panic_message(payload.as_ref())))
            });
        let _ = tx.send(outcome);
    });

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => JobOutcome::Failed(EvalError::Panicked("compute task vanished".into())),
        Err(_) => JobOutcome::Failed(EvalError::TimedOut(timeout.as_millis() as u64)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
