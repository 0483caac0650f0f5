//! Single-worker FIFO queue for indexing jobs.
//!
//! Every batch step and every backend round trip runs as one job. A run
//! continues by enqueuing its next step at the back, so concurrent runs
//! interleave one batch at a time.

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A unit of work executed by the queue's worker.
pub type Job = BoxFuture<'static, ()>;

/// Handle to the background work queue.
///
/// Cloning yields another handle to the same worker.
#[derive(Clone)]
pub struct WorkQueue {
    sender: mpsc::UnboundedSender<Job>,
    shutdown: CancellationToken,
}

impl WorkQueue {
    /// Spawn the worker task on the current tokio runtime.
    ///
    /// Must be called from within a runtime context.
    pub fn spawn() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        tokio::spawn(async move {
            let mut completed: u64 = 0;
            loop {
                let job = tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    job = receiver.recv() => match job {
                        Some(job) => job,
                        None => break,
                    },
                };
                job.await;
                completed += 1;
                debug!(completed, "Work queue job finished");
            }
            // Dropping the receiver drops queued jobs and anything they own.
            receiver.close();
            info!(completed, "Work queue stopped");
        });

        Self { sender, shutdown }
    }

    /// Enqueue a job.
    ///
    /// Returns `false` if the queue has shut down; the job is dropped.
    pub fn submit(&self, job: Job) -> bool {
        self.sender.send(job).is_ok()
    }

    /// Resolve once every job enqueued before this call has run.
    ///
    /// Returns immediately if the queue has shut down.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = done_tx.send(());
        });
        if self.submit(job) {
            let _ = done_rx.await;
        }
    }

    /// Stop the worker after its current job.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether the worker is gone and new jobs would be dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_run_in_fifo_order() {
        let queue = WorkQueue::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            queue.submit(Box::pin(async move {
                order.lock().unwrap().push(i);
            }));
        }
        queue.flush().await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_jobs_run_one_at_a_time() {
        let queue = WorkQueue::spawn();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let log = log.clone();
            queue.submit(Box::pin(async move {
                log.lock().unwrap().push(format!("{name} start"));
                tokio::time::sleep(Duration::from_millis(10)).await;
                log.lock().unwrap().push(format!("{name} end"));
            }));
        }
        queue.flush().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first start", "first end", "second start", "second end"]
        );
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_drops_job() {
        let queue = WorkQueue::spawn();
        queue.shutdown();

        for _ in 0..100 {
            if queue.is_closed() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(queue.is_closed());

        let marker = Arc::new(());
        let held = marker.clone();
        let accepted = queue.submit(Box::pin(async move {
            drop(held);
        }));

        assert!(!accepted);
        assert_eq!(Arc::strong_count(&marker), 1);
    }
}
