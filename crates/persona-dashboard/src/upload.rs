use std::sync::Arc;

use persona_api::{ClassifierBackend, UploadProgress};
use persona_common::{error::Result, types::JobId};
use tracing::{debug, info};

use crate::batch::Batch;

/// Submits a validated batch as one multipart request.
pub struct UploadController<B> {
    backend: Arc<B>,
}

impl<B: ClassifierBackend> UploadController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn upload(&self, batch: &Batch, progress: &UploadProgress) -> Result<JobId> {
        info!(
            files = batch.len(),
            bytes = batch.total_bytes(),
            "uploading batch"
        );
        match self.backend.submit_images(batch.files(), progress).await {
            Ok(job_id) => {
                info!(%job_id, "batch accepted");
                Ok(job_id)
            }
            Err(err) => {
                debug!(error = %err, "batch upload failed");
                Err(err)
            }
        }
    }
}
