pub mod context;
pub mod forms;
pub mod service;
pub mod store;

pub use context::AuthContext;
pub use forms::{LoginForm, RegisterForm};
pub use service::{AuthService, REGISTRATION_SUCCESS};
pub use store::TokenStore;
