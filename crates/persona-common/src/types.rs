use std::{fmt, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file picked by the user for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name, size }
    }
}

/// Opaque job identifier issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub processed: u64,
    pub total: u64,
    pub done: bool,
}

impl JobProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.processed.saturating_mul(100) / self.total).min(100) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A logged-in session as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: AccessToken,
    pub logged_in_at: DateTime<Utc>,
}

/// Error body returned by the backend, `{"detail": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorDetail {
    pub fn parse(body: &[u8]) -> Option<String> {
        let parsed: ErrorDetail = serde_json::from_slice(body).ok()?;
        match parsed.detail? {
            serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorDetail, JobProgress, SelectedFile, SubmitResponse};

    #[test]
    fn job_progress_percent_is_bounded() {
        let progress = JobProgress {
            processed: 2,
            total: 5,
            done: false,
        };
        assert_eq!(progress.percent(), 40);

        let overshoot = JobProgress {
            processed: 7,
            total: 5,
            done: true,
        };
        assert_eq!(overshoot.percent(), 100);
        assert_eq!(JobProgress::default().percent(), 0);
    }

    #[test]
    fn submit_response_requires_job_id() {
        let parsed: SubmitResponse = serde_json::from_str(r#"{"job_id":"job-42"}"#).unwrap();
        assert_eq!(parsed.job_id.as_str(), "job-42");
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"id":"job-42"}"#).is_err());
    }

    #[test]
    fn error_detail_only_accepts_strings() {
        assert_eq!(
            ErrorDetail::parse(br#"{"detail":"Username or email already registered"}"#),
            Some("Username or email already registered".to_string())
        );
        assert_eq!(ErrorDetail::parse(br#"{"detail":[{"loc":["body"]}]}"#), None);
        assert_eq!(ErrorDetail::parse(b"Internal Server Error"), None);
    }

    #[test]
    fn selected_file_takes_name_from_path() {
        let file = SelectedFile::new("/photos/summer/a.JPG", 12);
        assert_eq!(file.name, "a.JPG");
        assert_eq!(file.size, 12);
    }
}
