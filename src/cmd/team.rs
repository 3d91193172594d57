//! Team directory commands: `taskflow team`, `taskflow invite`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};

use taskflow::board::forms::InviteDialog;
use taskflow::board::models::MemberRole;
use taskflow::config::TaskflowConfig;

use super::render::{print_members, print_notices};
use super::workspace::Workspace;

pub async fn cmd_team(config: &TaskflowConfig) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut team = workspace.team_store();
    let loaded = team.load(&workspace.session).await.map(|_| ());
    print_notices(team.take_notices());
    loaded?;
    println!();
    println!("{}", style("Team members").bold().cyan());
    print_members(team.members());
    println!();
    Ok(())
}

pub async fn cmd_invite(
    config: &TaskflowConfig,
    email: Option<String>,
    full_name: Option<String>,
    role: Option<MemberRole>,
) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut team = workspace.team_store();
    let mut dialog = InviteDialog::new();
    dialog.open();

    let interactive =
        (email.is_none() || full_name.is_none()) && console::user_attended();
    dialog.draft.email = email.unwrap_or_default();
    dialog.draft.full_name = full_name.unwrap_or_default();
    if let Some(role) = role {
        dialog.draft.role = role;
    }

    if interactive {
        dialog.draft.email = Input::new()
            .with_prompt("Email")
            .with_initial_text(dialog.draft.email.clone())
            .interact_text()
            .context("Failed to read email")?;
        dialog.draft.full_name = Input::new()
            .with_prompt("Full name")
            .with_initial_text(dialog.draft.full_name.clone())
            .interact_text()
            .context("Failed to read full name")?;
        if role.is_none() {
            let labels: Vec<&str> = MemberRole::ALL.iter().map(|r| r.as_str()).collect();
            let choice = Select::new()
                .with_prompt("Role")
                .items(&labels[..])
                .default(0)
                .interact()
                .context("Failed to read role")?;
            dialog.draft.role = MemberRole::ALL[choice];
        }
    }

    let result = dialog.submit(&mut team, &workspace.session).await;
    print_notices(team.take_notices());
    let member = result?;
    println!(
        "  {} is {} as {}",
        member.email,
        style(member.status.as_deref().unwrap_or("pending")).yellow(),
        member.role.as_deref().unwrap_or("member")
    );
    Ok(())
}
