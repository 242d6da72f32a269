use std::sync::Arc;

use dialoguer::{Input, Password};
use persona_api::HttpBackend;
use persona_auth::{AuthService, LoginForm, REGISTRATION_SUCCESS, RegisterForm, TokenStore};
use persona_common::{config::ClientConfig, error::Result};

fn service(config: &ClientConfig) -> Result<AuthService<HttpBackend>> {
    let backend = Arc::new(HttpBackend::new(config)?);
    Ok(AuthService::new(backend, TokenStore::new(&config.token_path)))
}

fn ask(prompt: &str) -> Result<String> {
    let value = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|dialoguer::Error::IO(err)| err)?;
    Ok(value)
}

fn ask_secret(prompt: &str) -> Result<String> {
    let value = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|dialoguer::Error::IO(err)| err)?;
    Ok(value)
}

pub async fn login(config: &ClientConfig, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => ask("Username")?,
    };
    let form = LoginForm::new(username, ask_secret("Password")?);

    let context = service(config)?.login(&form).await?;
    if let Some(username) = context.username() {
        println!("Logged in as {username}.");
    }
    Ok(())
}

pub async fn register(config: &ClientConfig) -> Result<()> {
    let form = RegisterForm {
        username: ask("Username")?,
        email: ask("Email")?,
        password: ask_secret("Password")?,
        confirm_password: ask_secret("Confirm password")?,
    };

    service(config)?.register(&form).await?;
    println!("{REGISTRATION_SUCCESS}");
    Ok(())
}

pub async fn logout(config: &ClientConfig) -> Result<()> {
    service(config)?.logout().await?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(config: &ClientConfig) -> Result<()> {
    let context = service(config)?.current().await?;
    let session = context.require()?;
    println!(
        "{} (logged in {})",
        session.username,
        session.logged_in_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}
