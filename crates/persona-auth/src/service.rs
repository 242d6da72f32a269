use std::sync::Arc;

use chrono::Utc;
use persona_api::ClassifierBackend;
use persona_common::{
    error::Result,
    types::{RegisteredUser, Session},
};
use tracing::info;

use crate::{
    context::AuthContext,
    forms::{LoginForm, RegisterForm},
    store::TokenStore,
};

pub const REGISTRATION_SUCCESS: &str = "Registration successful! You can now log in.";

pub struct AuthService<B> {
    backend: Arc<B>,
    store: TokenStore,
}

impl<B: ClassifierBackend> AuthService<B> {
    pub fn new(backend: Arc<B>, store: TokenStore) -> Self {
        Self { backend, store }
    }

    /// Context for the session saved by the last successful login, if any.
    pub async fn current(&self) -> Result<AuthContext> {
        Ok(AuthContext::from_session(self.store.load().await?))
    }

    pub async fn login(&self, form: &LoginForm) -> Result<AuthContext> {
        form.validate()?;
        let token = self.backend.login(&form.username, &form.password).await?;
        let session = Session {
            username: form.username.clone(),
            token,
            logged_in_at: Utc::now(),
        };
        self.store.save(&session).await?;
        info!(username = %session.username, "logged in");
        Ok(AuthContext::from_session(Some(session)))
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<RegisteredUser> {
        let registration = form.validate()?;
        let user = self.backend.register(&registration).await?;
        info!(username = %user.username, id = user.id, "registered");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<AuthContext> {
        self.store.clear().await?;
        info!("logged out");
        Ok(AuthContext::anonymous())
    }
}
