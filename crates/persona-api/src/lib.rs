pub mod backend;
pub mod http;
pub mod progress;

pub use backend::ClassifierBackend;
pub use http::HttpBackend;
pub use progress::{ProgressStream, UploadProgress};
