use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use persona_common::{
    error::Result,
    types::{AccessToken, JobId, JobProgress, RegisteredUser, Registration, SelectedFile},
};

use crate::progress::UploadProgress;

/// The remote classification service.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Uploads every file as one multipart submission and returns the job it created.
    async fn submit_images(
        &self,
        files: &[SelectedFile],
        progress: &UploadProgress,
    ) -> Result<JobId>;

    async fn job_progress(&self, job_id: &JobId) -> Result<JobProgress>;

    async fn fetch_result(&self, job_id: &JobId) -> Result<Bytes>;

    async fn login(&self, username: &str, password: &str) -> Result<AccessToken>;

    async fn register(&self, registration: &Registration) -> Result<RegisteredUser>;
}

#[async_trait]
impl ClassifierBackend for Arc<dyn ClassifierBackend> {
    async fn submit_images(
        &self,
        files: &[SelectedFile],
        progress: &UploadProgress,
    ) -> Result<JobId> {
        self.as_ref().submit_images(files, progress).await
    }

    async fn job_progress(&self, job_id: &JobId) -> Result<JobProgress> {
        self.as_ref().job_progress(job_id).await
    }

    async fn fetch_result(&self, job_id: &JobId) -> Result<Bytes> {
        self.as_ref().fetch_result(job_id).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        self.as_ref().login(username, password).await
    }

    async fn register(&self, registration: &Registration) -> Result<RegisteredUser> {
        self.as_ref().register(registration).await
    }
}
