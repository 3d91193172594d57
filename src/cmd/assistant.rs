//! `taskflow ask`: one question to the AI assistant function.

use anyhow::{Context, Result};
use console::style;

use taskflow::board::functions::ChatRequest;
use taskflow::board::models::Task;
use taskflow::config::TaskflowConfig;

use super::workspace::Workspace;

/// A plain-text outline of the board, sent along as context.
pub fn board_context(tasks: &[Task]) -> String {
    let mut lines = Vec::with_capacity(tasks.len() + 1);
    lines.push(format!("The user's board has {} tasks:", tasks.len()));
    for task in tasks {
        let column = task.column().map(|c| c.title()).unwrap_or("Unknown");
        lines.push(format!(
            "- [{}] {} (priority: {})",
            column,
            task.title,
            task.priority.as_str()
        ));
    }
    lines.join("\n")
}

pub async fn cmd_ask(config: &TaskflowConfig, message: &str, with_board: bool) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("A question is required");
    }
    let workspace = Workspace::open(config).await?;

    let context = if with_board {
        let mut store = workspace.task_store();
        store.load(&workspace.session).await?;
        Some(board_context(store.tasks()))
    } else {
        None
    };

    let request = ChatRequest {
        message: message.trim().to_string(),
        context,
    };
    let reply = workspace
        .functions
        .ask_assistant(&workspace.session, &request)
        .await
        .context("Assistant request failed")?;

    println!();
    println!("{}", style("Assistant").bold().cyan());
    for line in textwrap::wrap(&reply.response, 80) {
        println!("{}", line);
    }
    println!();
    Ok(())
}
