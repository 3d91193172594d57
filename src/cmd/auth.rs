//! `taskflow login` / `taskflow logout`.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use taskflow::board::rest::RestBackend;
use taskflow::config::TaskflowConfig;

pub async fn cmd_login(config: &TaskflowConfig, email: Option<String>) -> Result<()> {
    if config.offline {
        anyhow::bail!("Nothing to sign in to in --offline mode");
    }
    let settings = config.backend()?;

    let email = match email.or_else(|| config.email()) {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let password = match config.password() {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let backend = RestBackend::new(settings.url, settings.anon_key);
    let session = backend.sign_in(&email, &password).await?;
    config.save_session(&session)?;
    println!(
        "Signed in as {} (session saved to {})",
        session.email.as_deref().unwrap_or(&email),
        config.session_file().display()
    );
    Ok(())
}

pub fn cmd_logout(config: &TaskflowConfig) -> Result<()> {
    if config.clear_session()? {
        println!("Signed out.");
    } else {
        println!("No saved session.");
    }
    Ok(())
}
