//! Deferred answer scoring
//!
//! Answers created through the unscored path are stored first and scored
//! later by a small pool of workers:
//! - Bounded queue of answer ids
//! - Workers share one receiver
//! - Jobs overwrite ratings, so running one twice is harmless

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::aggregator::Scorer;
use crate::model::Ratings;
use crate::store::Store;
use crate::types::{IdeaMeshError, Result};

/// Configuration for the scoring queue
pub struct QueueConfig {
    /// Number of worker tasks
    pub worker_count: usize,
    /// Maximum queued jobs
    pub max_queue_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            max_queue_size: 256,
        }
    }
}

/// Loads an answer, scores it and writes the ratings back
#[derive(Clone)]
struct JobRunner {
    scorer: Scorer,
    store: Arc<dyn Store>,
}

impl JobRunner {
    async fn run(&self, answer_id: &str) -> Result<Option<Ratings>> {
        let Some(answer) = self.store.get_answer(answer_id).await? else {
            warn!(answer_id, "Answer vanished before scoring, dropping job");
            return Ok(None);
        };

        let ratings = self
            .scorer
            .score_answer(&answer.question_id, &answer.content)
            .await?;

        if !self.store.set_answer_ratings(answer_id, ratings).await? {
            warn!(answer_id, "Answer deleted while scoring, ratings discarded");
            return Ok(None);
        }

        info!(
            answer_id,
            question_id = %answer.question_id,
            uniqueness = ratings.uniqueness,
            reasonableness = ratings.reasonableness,
            "Deferred scoring complete"
        );
        Ok(Some(ratings))
    }
}

/// Handle for submitting deferred scoring jobs
#[derive(Clone)]
pub struct ScoringQueue {
    job_tx: mpsc::Sender<String>,
    runner: JobRunner,
    processed: Arc<AtomicUsize>,
    worker_count: usize,
}

impl ScoringQueue {
    /// Create the queue and spawn its workers
    pub fn start(config: QueueConfig, scorer: Scorer, store: Arc<dyn Store>) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<String>(config.max_queue_size.max(1));
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));
        let runner = JobRunner { scorer, store };
        let processed = Arc::new(AtomicUsize::new(0));

        for i in 0..config.worker_count {
            let job_rx = Arc::clone(&job_rx);
            let runner = runner.clone();
            let processed = Arc::clone(&processed);
            tokio::spawn(async move {
                worker_task(i, job_rx, runner, processed).await;
            });
        }

        info!(
            "Scoring queue started with {} workers (capacity {})",
            config.worker_count, config.max_queue_size
        );

        Self {
            job_tx,
            runner,
            processed,
            worker_count: config.worker_count,
        }
    }

    /// Submit an answer for scoring without waiting.
    ///
    /// Fails only when the queue is full or shut down.
    pub fn enqueue(&self, answer_id: &str) -> Result<()> {
        self.job_tx.try_send(answer_id.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                IdeaMeshError::Internal("Scoring queue is full".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                IdeaMeshError::Internal("Scoring queue closed".into())
            }
        })?;
        debug!(answer_id, "Scoring job queued");
        Ok(())
    }

    /// Score an answer now, on the caller's task.
    ///
    /// Returns `None` when the answer no longer exists.
    pub async fn process(&self, answer_id: &str) -> Result<Option<Ratings>> {
        self.runner.run(answer_id).await
    }

    /// Jobs finished by workers, successful or not
    pub fn processed_count(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

async fn worker_task(
    worker_id: usize,
    job_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
    runner: JobRunner,
    processed: Arc<AtomicUsize>,
) {
    debug!("Scoring worker {} started", worker_id);

    loop {
        let answer_id = {
            let mut rx = job_rx.lock().await;
            match rx.recv().await {
                Some(id) => id,
                None => {
                    info!("Scoring worker {} shutting down (channel closed)", worker_id);
                    return;
                }
            }
        };

        if let Err(e) = runner.run(&answer_id).await {
            error!(answer_id = %answer_id, error = %e, "Deferred scoring failed");
        }
        processed.fetch_add(1, Ordering::Relaxed);
    }
}
