use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use persona_common::{
    config::ClientConfig,
    error::{PersonaError, Result},
    types::{
        AccessToken, ErrorDetail, JobId, JobProgress, RegisteredUser, Registration, SelectedFile,
        SubmitResponse,
    },
};
use reqwest::{
    Body, RequestBuilder, StatusCode,
    multipart::{Form, Part},
};
use tracing::{debug, info};

use crate::{
    backend::ClassifierBackend,
    progress::{ProgressStream, UploadProgress},
};

pub const UPLOAD_FIELD: &str = "files";
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// `ClassifierBackend` over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    endpoint: String,
    client: reqwest::Client,
    request_timeout: Duration,
    bearer: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // Uploads and result downloads can take minutes, so only the small
        // JSON calls get a per-request timeout.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| PersonaError::InternalError(format!("failed to build http client: {err}")))?;

        Ok(Self {
            endpoint: config.api_url.clone(),
            client,
            request_timeout: config.request_timeout,
            bearer: None,
        })
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    fn job_url(&self, prefix: &str, job_id: &JobId) -> String {
        let segment = utf8_percent_encode(job_id.as_str(), PATH_SEGMENT);
        self.url(&format!("/{prefix}/{segment}"))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn build_form(&self, files: &[SelectedFile], progress: &UploadProgress) -> Result<Form> {
        let mut form = Form::new();
        let mut total = 0u64;

        for file in files {
            let contents = Bytes::from(tokio::fs::read(&file.path).await?);
            let length = contents.len() as u64;
            total = total.saturating_add(length);

            let body = ProgressStream::new(
                stream::iter(chunk(contents).into_iter().map(Ok::<_, std::io::Error>)),
                progress.clone(),
            );
            let mime = mime_guess::from_path(&file.name).first_or_octet_stream();
            let part = Part::stream_with_length(Body::wrap_stream(body), length)
                .file_name(file.name.clone())
                .mime_str(mime.as_ref())
                .map_err(|err| {
                    PersonaError::InternalError(format!(
                        "invalid content type for {}: {err}",
                        file.name
                    ))
                })?;
            form = form.part(UPLOAD_FIELD, part);
        }

        progress.set_total(total);
        Ok(form)
    }
}

fn chunk(contents: Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(contents.len() / UPLOAD_CHUNK_SIZE + 1);
    let mut offset = 0;
    while offset < contents.len() {
        let end = (offset + UPLOAD_CHUNK_SIZE).min(contents.len());
        chunks.push(contents.slice(offset..end));
        offset = end;
    }
    chunks
}

#[async_trait]
impl ClassifierBackend for HttpBackend {
    async fn submit_images(
        &self,
        files: &[SelectedFile],
        progress: &UploadProgress,
    ) -> Result<JobId> {
        let form = self.build_form(files, progress).await?;
        let url = self.url("/classify-images/");
        info!(files = files.len(), bytes = progress.total(), %url, "submitting images");

        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                debug!(error = %err, "image upload failed");
                PersonaError::Transport(format!("failed to upload images to {url}: {err}"))
            })?;
        progress.finish();

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, "image submission rejected");
            return Err(PersonaError::SubmissionRejected(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|err| {
            PersonaError::UnexpectedResponse(format!("failed to read submission response: {err}"))
        })?;
        let parsed: SubmitResponse = serde_json::from_slice(&body).map_err(|err| {
            PersonaError::UnexpectedResponse(format!("invalid submission response: {err}"))
        })?;
        if parsed.job_id.as_str().is_empty() {
            return Err(PersonaError::UnexpectedResponse(
                "submission response carries an empty job_id".to_string(),
            ));
        }

        info!(job_id = %parsed.job_id, "images accepted");
        Ok(parsed.job_id)
    }

    async fn job_progress(&self, job_id: &JobId) -> Result<JobProgress> {
        let url = self.job_url("progress", job_id);
        let response = self
            .authorized(self.client.get(&url))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|err| PersonaError::ProgressFailed(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersonaError::ProgressFailed(format!(
                "progress endpoint {url} returned status {status}"
            )));
        }

        let progress = response.json::<JobProgress>().await.map_err(|err| {
            PersonaError::ProgressFailed(format!("invalid progress response: {err}"))
        })?;
        debug!(
            %job_id,
            processed = progress.processed,
            total = progress.total,
            done = progress.done,
            "job progress"
        );
        Ok(progress)
    }

    async fn fetch_result(&self, job_id: &JobId) -> Result<Bytes> {
        let url = self.job_url("result", job_id);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|err| PersonaError::ResultFetchFailed(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersonaError::ResultFetchFailed(format!(
                "result endpoint {url} returned status {status}"
            )));
        }

        let artifact = response.bytes().await.map_err(|err| {
            PersonaError::ResultFetchFailed(format!("failed to read result body: {err}"))
        })?;
        info!(%job_id, bytes = artifact.len(), "result downloaded");
        Ok(artifact)
    }

    async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let url = self.url("/login");
        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|err| {
                debug!(error = %err, %url, "login request failed");
                PersonaError::LoginFailed { detail: None }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            debug!(%status, "login rejected");
            return Err(PersonaError::LoginFailed {
                detail: ErrorDetail::parse(&body),
            });
        }

        response.json::<AccessToken>().await.map_err(|err| {
            debug!(error = %err, "invalid login response");
            PersonaError::LoginFailed { detail: None }
        })
    }

    async fn register(&self, registration: &Registration) -> Result<RegisteredUser> {
        let url = self.url("/register");
        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(registration)
            .send()
            .await
            .map_err(|err| {
                debug!(error = %err, %url, "register request failed");
                PersonaError::RegistrationFailed { detail: None }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            debug!(%status, "registration rejected");
            return Err(PersonaError::RegistrationFailed {
                detail: ErrorDetail::parse(&body),
            });
        }

        response.json::<RegisteredUser>().await.map_err(|err| {
            debug!(error = %err, "invalid register response");
            PersonaError::RegistrationFailed { detail: None }
        })
    }
}
