use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use persona_api::ClassifierBackend;
use persona_common::{
    error::{PersonaError, Result},
    types::{JobId, JobProgress},
};
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info};

/// Polls a job until it reports `done`, then downloads its result once.
pub struct ProgressPoller<B> {
    backend: Arc<B>,
    interval: Duration,
}

impl<B> Clone for ProgressPoller<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            interval: self.interval,
        }
    }
}

impl<B: ClassifierBackend + 'static> ProgressPoller<B> {
    pub fn new(backend: Arc<B>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls sequentially: the next request is only scheduled after the
    /// previous response arrived. There is no attempt limit.
    pub async fn run(
        &self,
        job_id: &JobId,
        mut on_progress: impl FnMut(JobProgress),
    ) -> Result<Bytes> {
        let mut attempts = 0u64;
        loop {
            attempts += 1;
            let progress = self
                .backend
                .job_progress(job_id)
                .await
                .map_err(|err| progress_failure(job_id, err))?;
            debug!(%job_id, attempts, processed = progress.processed, total = progress.total, "polled job");
            on_progress(progress);

            if progress.done {
                break;
            }
            sleep(self.interval).await;
        }

        info!(%job_id, attempts, "job finished, fetching result");
        self.backend
            .fetch_result(job_id)
            .await
            .map_err(|err| result_failure(job_id, err))
    }

    /// Runs [`ProgressPoller::run`] on its own task.
    pub fn spawn<P, F>(&self, job_id: JobId, on_progress: P, on_finish: F) -> PollHandle
    where
        P: FnMut(JobProgress) + Send + 'static,
        F: FnOnce(Result<Bytes>) + Send + 'static,
    {
        let poller = self.clone();
        let task_job_id = job_id.clone();
        let task = tokio::spawn(async move {
            let outcome = poller.run(&task_job_id, on_progress).await;
            on_finish(outcome);
        });
        PollHandle { job_id, task }
    }
}

fn progress_failure(job_id: &JobId, err: PersonaError) -> PersonaError {
    debug!(%job_id, error = %err, "polling failed");
    match err {
        PersonaError::ProgressFailed(_) => err,
        other => PersonaError::ProgressFailed(other.to_string()),
    }
}

fn result_failure(job_id: &JobId, err: PersonaError) -> PersonaError {
    debug!(%job_id, error = %err, "result download failed");
    match err {
        PersonaError::ResultFetchFailed(_) => err,
        other => PersonaError::ResultFetchFailed(other.to_string()),
    }
}

/// A running poll task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct PollHandle {
    job_id: JobId,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!(job_id = %self.job_id, "cancelling poll task");
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex, atomic::Ordering},
        time::Duration,
    };

    use persona_common::{
        error::PersonaError,
        types::{JobId, JobProgress},
    };
    use tokio::sync::oneshot;

    use super::ProgressPoller;
    use crate::testing::FakeBackend;

    fn progress(processed: u64, total: u64, done: bool) -> JobProgress {
        JobProgress {
            processed,
            total,
            done,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_at_fixed_cadence_until_done() {
        let backend = Arc::new(
            FakeBackend::accepting("job-42")
                .with_progress(vec![
                    Ok(progress(0, 5, false)),
                    Ok(progress(2, 5, false)),
                    Ok(progress(5, 5, true)),
                ])
                .with_result(Ok(bytes::Bytes::from_static(b"zip"))),
        );
        let poller = ProgressPoller::new(Arc::clone(&backend), Duration::from_secs(1));

        let seen = Mutex::new(Vec::new());
        let artifact = poller
            .run(&JobId::new("job-42"), |progress| {
                seen.lock().unwrap().push(progress)
            })
            .await
            .unwrap();

        assert_eq!(&artifact[..], b"zip");
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
        assert_eq!(backend.result_fetches.load(Ordering::SeqCst), 1);

        let times = backend.poll_times.lock().unwrap().clone();
        for pair in times.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(1));
        }
    }

    #[tokio::test]
    async fn poll_failure_is_terminal() {
        let backend = Arc::new(FakeBackend::accepting("job-42").with_progress(vec![
            Ok(progress(1, 5, false)),
            Err(PersonaError::Transport("connection reset".to_string())),
            Ok(progress(5, 5, true)),
        ]));
        let poller = ProgressPoller::new(Arc::clone(&backend), Duration::from_millis(1));

        let err = poller
            .run(&JobId::new("job-42"), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, PersonaError::ProgressFailed(_)));
        assert_eq!(err.notice(), "Failed to get processing progress.");
        assert_eq!(backend.polls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.result_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn result_failure_is_not_retried() {
        let backend = Arc::new(
            FakeBackend::accepting("job-42")
                .with_progress(vec![Ok(progress(5, 5, true))])
                .with_result(Err(PersonaError::ResultFetchFailed("status 500".to_string()))),
        );
        let poller = ProgressPoller::new(Arc::clone(&backend), Duration::from_millis(1));

        let err = poller
            .run(&JobId::new("job-42"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.notice(), "Failed to fetch result.");
        assert_eq!(backend.result_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_handle_stops_polling() {
        // No scripted progress: the fake reports a stalled job forever.
        let backend = Arc::new(FakeBackend::accepting("job-42"));
        let poller = ProgressPoller::new(Arc::clone(&backend), Duration::from_secs(1));

        let (finished_tx, mut finished_rx) = oneshot::channel();
        let handle = poller.spawn(JobId::new("job-42"), |_| {}, move |outcome| {
            let _ = finished_tx.send(outcome.is_ok());
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let polls_before_cancel = backend.polls.load(Ordering::SeqCst);
        assert_eq!(polls_before_cancel, 4);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.polls.load(Ordering::SeqCst), polls_before_cancel);
        assert!(handle.is_finished());
        assert!(finished_rx.try_recv().is_err());
    }
}
