use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use persona_api::{ClassifierBackend, UploadProgress};
use persona_common::{
    error::{PersonaError, Result},
    types::{AccessToken, JobId, JobProgress, RegisteredUser, Registration, SelectedFile},
};
use tokio::time::Instant;

/// Scripted backend. Once the progress script runs out the job stalls at
/// `done: false` forever.
pub(crate) struct FakeBackend {
    submit: Mutex<Option<Result<JobId>>>,
    progress: Mutex<VecDeque<Result<JobProgress>>>,
    result: Mutex<Option<Result<Bytes>>>,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub result_fetches: AtomicUsize,
    pub poll_times: Mutex<Vec<Instant>>,
}

impl FakeBackend {
    pub fn accepting(job_id: &str) -> Self {
        Self::with_submit(Ok(JobId::new(job_id)))
    }

    pub fn rejecting(err: PersonaError) -> Self {
        Self::with_submit(Err(err))
    }

    fn with_submit(submit: Result<JobId>) -> Self {
        Self {
            submit: Mutex::new(Some(submit)),
            progress: Mutex::new(VecDeque::new()),
            result: Mutex::new(None),
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            result_fetches: AtomicUsize::new(0),
            poll_times: Mutex::new(Vec::new()),
        }
    }

    pub fn with_progress(self, script: Vec<Result<JobProgress>>) -> Self {
        *self.progress.lock().unwrap() = script.into();
        self
    }

    pub fn with_result(self, result: Result<Bytes>) -> Self {
        *self.result.lock().unwrap() = Some(result);
        self
    }
}

#[async_trait]
impl ClassifierBackend for FakeBackend {
    async fn submit_images(
        &self,
        files: &[SelectedFile],
        progress: &UploadProgress,
    ) -> Result<JobId> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        progress.set_total(files.iter().map(|file| file.size).sum());
        for file in files {
            progress.advance(file.size);
            tokio::task::yield_now().await;
        }
        progress.finish();
        self.submit
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(PersonaError::Transport("submit script exhausted".to_string())))
    }

    async fn job_progress(&self, _job_id: &JobId) -> Result<JobProgress> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.poll_times.lock().unwrap().push(Instant::now());
        let next = self.progress.lock().unwrap().pop_front();
        next.unwrap_or(Ok(JobProgress {
            processed: 0,
            total: 0,
            done: false,
        }))
    }

    async fn fetch_result(&self, _job_id: &JobId) -> Result<Bytes> {
        self.result_fetches.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Bytes::from_static(b"PK\x05\x06")))
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<AccessToken> {
        Err(PersonaError::LoginFailed { detail: None })
    }

    async fn register(&self, _registration: &Registration) -> Result<RegisteredUser> {
        Err(PersonaError::RegistrationFailed { detail: None })
    }
}

pub(crate) fn image_files(count: usize, ext: &str) -> Vec<SelectedFile> {
    (0..count)
        .map(|index| SelectedFile::new(format!("/pics/{index}.{ext}"), 100))
        .collect()
}
