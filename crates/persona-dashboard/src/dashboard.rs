use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use persona_api::{ClassifierBackend, UploadProgress};
use persona_common::{
    config::{ClientConfig, DEFAULT_POLL_INTERVAL, MAX_IMAGES, RESULT_FILE_NAME},
    error::{PersonaError, Result},
    types::{JobId, SelectedFile},
};
use tokio::sync::watch;
use tracing::info;

use crate::{
    batch::{Batch, check_capacity},
    flow::FlowState,
    poller::{PollHandle, ProgressPoller},
    presenter::ResultPresenter,
    upload::UploadController,
};

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub poll_interval: Duration,
    pub max_images: usize,
    pub result_file_name: String,
}

impl DashboardSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_images: config.max_images,
            result_file_name: RESULT_FILE_NAME.to_string(),
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_images: MAX_IMAGES,
            result_file_name: RESULT_FILE_NAME.to_string(),
        }
    }
}

/// Drives one submission at a time: select, upload, poll, present.
///
/// The current [`FlowState`] is published on a watch channel; callers render
/// from [`Dashboard::subscribe`].
pub struct Dashboard<B> {
    uploader: UploadController<B>,
    poller: ProgressPoller<B>,
    presenter: ResultPresenter,
    max_images: usize,
    selection: Vec<SelectedFile>,
    state: Arc<watch::Sender<FlowState>>,
    poll: Option<PollHandle>,
}

impl<B: ClassifierBackend + 'static> Dashboard<B> {
    pub fn new(backend: Arc<B>, settings: DashboardSettings) -> Self {
        Self {
            uploader: UploadController::new(Arc::clone(&backend)),
            poller: ProgressPoller::new(backend, settings.poll_interval),
            presenter: ResultPresenter::new(settings.result_file_name),
            max_images: settings.max_images,
            selection: Vec::new(),
            state: Arc::new(watch::Sender::new(FlowState::Idle)),
            poll: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FlowState {
        self.state.borrow().clone()
    }

    pub fn selection(&self) -> &[SelectedFile] {
        &self.selection
    }

    /// Replaces the selection. Any earlier job is abandoned and the flow
    /// returns to idle, even when the new selection is rejected.
    pub fn select(&mut self, files: Vec<SelectedFile>) -> Result<()> {
        self.reset();
        if let Err(err) = check_capacity(&files, self.max_images) {
            info!(files = files.len(), max = self.max_images, "selection rejected");
            return Err(err);
        }
        info!(files = files.len(), "selection updated");
        self.selection = files;
        Ok(())
    }

    /// Validates and uploads the selection, then starts polling in the
    /// background. Returns once the backend has accepted the batch.
    pub async fn submit(&mut self) -> Result<JobId> {
        if self.state.borrow().is_busy() {
            return Err(PersonaError::SubmissionInProgress);
        }
        self.cancel_poll();

        self.state.send_replace(FlowState::Validating);
        let batch = match Batch::validate(&self.selection) {
            Ok(batch) => batch,
            Err(err) => {
                info!(notice = %err.notice(), "selection not submitted");
                self.state.send_replace(FlowState::Idle);
                return Err(err);
            }
        };

        self.state.send_replace(FlowState::Uploading { percent: 0 });
        let progress = UploadProgress::new();
        let mut percent = progress.subscribe();
        let upload = self.uploader.upload(&batch, &progress);
        tokio::pin!(upload);

        let outcome = loop {
            tokio::select! {
                outcome = &mut upload => break outcome,
                Ok(()) = percent.changed() => {
                    let value = *percent.borrow_and_update();
                    self.state.send_replace(FlowState::Uploading { percent: value });
                }
            }
        };

        let job_id = match outcome {
            Ok(job_id) => job_id,
            Err(err) => {
                self.state.send_replace(FlowState::Failed(err.notice()));
                return Err(err);
            }
        };

        self.state.send_replace(FlowState::Processing {
            job_id: job_id.clone(),
            processed: 0,
            total: batch.len() as u64,
        });
        self.poll = Some(self.start_polling(job_id.clone()));
        Ok(job_id)
    }

    /// Waits until the current submission stops being busy and returns the state it settled in.
    pub async fn wait(&self) -> FlowState {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(|state| !state.is_busy()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Saves the finished archive into `dir`.
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let artifact = self
            .state
            .borrow()
            .artifact()
            .cloned()
            .ok_or(PersonaError::NoResult)?;
        artifact.save(dir).await
    }

    fn start_polling(&self, job_id: JobId) -> PollHandle {
        let progress_state = Arc::clone(&self.state);
        let progress_job = job_id.clone();
        let finish_state = Arc::clone(&self.state);
        let finish_job = job_id.clone();
        let presenter = self.presenter.clone();

        // Both callbacks only write while the flow is still processing this
        // job, so a cancelled poll can never overwrite a newer submission.
        self.poller.spawn(
            job_id,
            move |progress| {
                progress_state.send_if_modified(|state| {
                    if let FlowState::Processing {
                        job_id,
                        processed,
                        total,
                    } = state
                        && *job_id == progress_job
                    {
                        *processed = progress.processed;
                        *total = progress.total;
                        return true;
                    }
                    false
                });
            },
            move |outcome| {
                let next = match outcome {
                    Ok(bytes) => FlowState::Succeeded(presenter.present(bytes)),
                    Err(err) => FlowState::Failed(err.notice()),
                };
                finish_state.send_if_modified(|state| {
                    let current = matches!(
                        state,
                        FlowState::Processing { job_id, .. } if *job_id == finish_job
                    );
                    if current {
                        info!(job_id = %finish_job, outcome = next.label(), "submission finished");
                        *state = next;
                    }
                    current
                });
            },
        )
    }

    fn cancel_poll(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.cancel();
        }
    }

    fn reset(&mut self) {
        self.cancel_poll();
        self.selection.clear();
        self.state.send_replace(FlowState::Idle);
    }
}
