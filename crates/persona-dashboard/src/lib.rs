pub mod batch;
pub mod dashboard;
pub mod flow;
pub mod poller;
pub mod presenter;
pub mod selection;
pub mod upload;

#[cfg(test)]
mod testing;

pub use batch::{Batch, IMAGE_EXTENSIONS, check_capacity, is_image_name};
pub use dashboard::{Dashboard, DashboardSettings};
pub use flow::FlowState;
pub use poller::{PollHandle, ProgressPoller};
pub use presenter::{Artifact, ResultPresenter};
pub use selection::scan_folder;
pub use upload::UploadController;
