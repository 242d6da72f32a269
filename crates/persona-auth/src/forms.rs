use std::sync::LazyLock;

use persona_common::{
    error::{PersonaError, Result},
    types::Registration,
};
use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            return Err(PersonaError::MissingCredentials);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Checks the form in the order the user sees the problems and builds the request body.
    pub fn validate(&self) -> Result<Registration> {
        let fields = [
            &self.username,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(PersonaError::IncompleteForm);
        }
        if !is_valid_email(&self.email) {
            return Err(PersonaError::InvalidEmail(self.email.clone()));
        }
        if self.password != self.confirm_password {
            return Err(PersonaError::PasswordMismatch);
        }

        Ok(Registration {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}
