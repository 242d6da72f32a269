use persona_common::{
    error::{PersonaError, Result},
    types::Session,
};

/// Who is using the client. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    session: Option<Session>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn from_session(session: Option<Session>) -> Self {
        Self { session }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.username.as_str())
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.session
            .as_ref()
            .map(|session| session.token.access_token.clone())
    }

    pub fn require(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(PersonaError::NotLoggedIn)
    }
}
