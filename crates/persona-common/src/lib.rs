pub mod config;
pub mod error;
pub mod types;

pub use config::ClientConfig;
pub use error::{PersonaError, Result};
pub use types::{AccessToken, JobId, JobProgress, RegisteredUser, Registration, SelectedFile, Session};
