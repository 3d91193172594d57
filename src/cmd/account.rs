//! Account commands: `taskflow profile`, `taskflow settings`.

use anyhow::Result;

use taskflow::board::models::{ProfilePatch, SettingKey};
use taskflow::config::TaskflowConfig;

use super::render::{print_notices, print_profile, print_settings};
use super::workspace::Workspace;

/// Accepts on/off, true/false, yes/no and 1/0.
pub fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("Invalid switch value: {} (use on or off)", raw)),
    }
}

pub async fn cmd_profile(config: &TaskflowConfig, patch: Option<ProfilePatch>) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut account = workspace.account_store();
    let result = match patch {
        Some(patch) => account
            .update_profile(&workspace.session, patch)
            .await
            .map(|_| ()),
        None => account.load_profile(&workspace.session).await.map(|_| ()),
    };
    print_notices(account.take_notices());
    result?;
    if let Some(profile) = account.profile() {
        print_profile(profile);
    }
    Ok(())
}

pub async fn cmd_settings(
    config: &TaskflowConfig,
    change: Option<(SettingKey, bool)>,
) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut account = workspace.account_store();
    let result = match change {
        Some((key, value)) => account
            .set(&workspace.session, key, value)
            .await
            .map(|_| ()),
        None => account.load_settings(&workspace.session).await.map(|_| ()),
    };
    print_notices(account.take_notices());
    result?;
    if let Some(settings) = account.settings() {
        print_settings(settings);
    }
    Ok(())
}
