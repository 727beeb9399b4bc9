use super::job::{EvalJob, JobId, JobResult, QueuedJob};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Transport between the coordinator and the workers.
///
/// Jobs and results are plain values; a broker-backed implementation only has to
/// move them. Results are grouped per run so several runs can share one queue.
pub trait JobQueue: Send + Sync + 'static {
    fn enqueue(&self, job: EvalJob) -> JobId;

    /// Waits for the next job. `None` once the queue is closed and drained.
    fn dequeue(&self) -> impl Future<Output = Option<QueuedJob>> + Send + '_;

    fn publish_result(&self, result: JobResult);

    /// Drains the results published so far for `run_id`.
    fn poll_results(&self, run_id: &str) -> Vec<JobResult>;

    /// Drops queued jobs and future results of `run_id`.
    fn retire_run(&self, run_id: &str);

    fn is_retired(&self, run_id: &str) -> bool;

    fn close(&self);
}

/// Tokio-channel queue for a single process.
pub struct InProcessQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedJob>>,
    next_id: AtomicU64,
    results: Mutex<HashMap<String, Vec<JobResult>>>,
    retired: RwLock<HashSet<String>>,
}

impl Default for InProcessQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: tokio::sync::Mutex::new(rx),
            next_id: AtomicU64::new(1),
            results: Mutex::new(HashMap::new()),
            retired: RwLock::new(HashSet::new()),
        }
    }
}

impl JobQueue for InProcessQueue {
    fn enqueue(&self, job: EvalJob) -> JobId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(QueuedJob { id, job }).is_err() {
                    warn!("⚠️  Job {} dropped: no receiver", id);
                }
            }
            None => warn!("⚠️  Job {} dropped: queue closed", id),
        }
        id
    }

    fn dequeue(&self) -> impl Future<Output = Option<QueuedJob>> + Send + '_ {
        async move {
            let mut rx = self.receiver.lock().await;
            loop {
                let queued = rx.recv().await?;
                if self.is_retired(&queued.job.run_id) {
                    debug!("skipping job {} of retired run", queued.id);
                    continue;
                }
                return Some(queued);
            }
        }
    }

    fn publish_result(&self, result: JobResult) {
        if self.is_retired(&result.run_id) {
            return;
        }
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(result.run_id.clone())
            .or_default()
            .push(result);
    }

    fn poll_results(&self, run_id: &str) -> Vec<JobResult> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(run_id)
            .unwrap_or_default()
    }

    fn retire_run(&self, run_id: &str) {
        self.retired
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(run_id.to_string());
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(run_id);
    }

    fn is_retired(&self, run_id: &str) -> bool {
        self.retired
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(run_id)
    }

    fn close(&self) {
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::{CharacterSet, Chromosome, Layer};
    use crate::dispatch::job::{EvalTask, JobOutcome};
    use crate::scorer::Measurement;

    fn job(run: &str, individual_id: u64) -> EvalJob {
        let cs = CharacterSet::parse("ab").unwrap();
        EvalJob {
            run_id: run.into(),
            individual_id,
            chromosome: Chromosome::single(Layer::identity(&cs)),
            dataset_id: "d".into(),
            task: EvalTask::Measure,
            attempt: 0,
        }
    }

    #[tokio::test]
    async fn fifo_and_close() {
        let q = InProcessQueue::new();
        let a = q.enqueue(job("r", 1));
        let b = q.enqueue(job("r", 2));
        assert!(b > a);
        q.close();
        assert_eq!(q.dequeue().await.map(|j| j.id), Some(a));
        assert_eq!(q.dequeue().await.map(|j| j.id), Some(b));
        assert!(q.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn retired_runs_are_skipped() {
        let q = InProcessQueue::new();
        q.enqueue(job("old", 1));
        let keep = q.enqueue(job("new", 2));
        q.retire_run("old");
        q.close();
        assert_eq!(q.dequeue().await.map(|j| j.id), Some(keep));

        q.publish_result(JobResult {
            run_id: "old".into(),
            job_id: 1,
            individual_id: 1,
            outcome: JobOutcome::Measured(Measurement::default()),
        });
        assert!(q.poll_results("old").is_empty());
    }

    #[test]
    fn results_are_grouped_by_run() {
        let q = InProcessQueue::new();
        for (run, id) in [("a", 1), ("b", 2), ("a", 3)] {
            q.publish_result(JobResult {
                run_id: run.into(),
                job_id: id,
                individual_id: id,
                outcome: JobOutcome::Measured(Measurement::default()),
            });
        }
        assert_eq!(q.poll_results("a").len(), 2);
        assert!(q.poll_results("a").is_empty());
        assert_eq!(q.poll_results("b").len(), 1);
    }
}
