use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("no files selected")]
    EmptySelection,
    #[error("selection contains no image files")]
    NoValidImages,
    #[error("selection mixes images with {invalid} non-image files")]
    MixedFileTypes { invalid: usize },
    #[error("too many files selected: count={count}, max={max}")]
    TooManyFiles { count: usize, max: usize },
    #[error("a submission is already in progress")]
    SubmissionInProgress,
    #[error("submission rejected with status {0}")]
    SubmissionRejected(u16),
    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to get processing progress: {0}")]
    ProgressFailed(String),
    #[error("failed to fetch result: {0}")]
    ResultFetchFailed(String),
    #[error("username and password are required")]
    MissingCredentials,
    #[error("registration form is incomplete")]
    IncompleteForm,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("login failed: {}", .detail.as_deref().unwrap_or("no detail"))]
    LoginFailed { detail: Option<String> },
    #[error("registration failed: {}", .detail.as_deref().unwrap_or("no detail"))]
    RegistrationFailed { detail: Option<String> },
    #[error("not logged in")]
    NotLoggedIn,
    #[error("no result available")]
    NoResult,
    #[error("job failed: {0}")]
    JobFailed(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("internal error: {0}")]
    InternalError(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PersonaError {
    /// Text shown to the user for this error.
    pub fn notice(&self) -> String {
        match self {
            Self::EmptySelection => "Please select a folder of images before submitting.".to_string(),
            Self::NoValidImages => "No valid images found in the selected folder.".to_string(),
            Self::MixedFileTypes { .. } => {
                "Please select a folder containing only image files (jpg, jpeg, png, bmp, gif)."
                    .to_string()
            }
            Self::TooManyFiles { max, .. } => {
                format!("You can only upload up to {max} images at a time.")
            }
            Self::SubmissionInProgress => "Please wait for the current submission to finish.".to_string(),
            Self::SubmissionRejected(_) => "Failed to process images".to_string(),
            Self::UnexpectedResponse(_) => "Unexpected response from server.".to_string(),
            Self::Transport(_) => "Error occurred".to_string(),
            Self::ProgressFailed(_) => "Failed to get processing progress.".to_string(),
            Self::ResultFetchFailed(_) => "Failed to fetch result.".to_string(),
            Self::MissingCredentials => "Please enter both username and password.".to_string(),
            Self::IncompleteForm => "Please fill in all fields.".to_string(),
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            Self::LoginFailed { detail } => {
                detail.clone().unwrap_or_else(|| "Login failed".to_string())
            }
            Self::RegistrationFailed { detail } => {
                detail.clone().unwrap_or_else(|| "Registration failed".to_string())
            }
            Self::NotLoggedIn => "Please log in first.".to_string(),
            Self::NoResult => "No result is available yet.".to_string(),
            Self::JobFailed(notice) => notice.clone(),
            Self::InvalidConfig(_) | Self::InternalError(_) | Self::Io(_) => self.to_string(),
        }
    }

    /// Input problems caught before any request is sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptySelection
                | Self::NoValidImages
                | Self::MixedFileTypes { .. }
                | Self::TooManyFiles { .. }
                | Self::MissingCredentials
                | Self::IncompleteForm
                | Self::InvalidEmail(_)
                | Self::PasswordMismatch
        )
    }
}

pub type Result<T> = std::result::Result<T, PersonaError>;
