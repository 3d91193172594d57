//! Task commands: `taskflow board`, `add`, `edit`, `rm`, `mv`, `stats`.

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use dialoguer::{Confirm, Input, Select};
use uuid::Uuid;

use taskflow::board::analytics::summarize;
use taskflow::board::dnd::{CardDrag, DropZone};
use taskflow::board::forms::{TaskDialog, TaskDraft};
use taskflow::board::models::{ColumnId, Priority, Task};
use taskflow::config::TaskflowConfig;

use super::render::{print_board, print_notices, print_summary, print_task, short_id};
use super::workspace::Workspace;

/// Field values given on the command line for `add` and `edit`.
#[derive(Debug, Clone, Default)]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
}

impl TaskFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
    }

    fn apply_to(self, draft: &mut TaskDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(assignee) = self.assignee {
            draft.assignee = assignee;
        }
    }
}

/// Find a task by full id or by a unique prefix of its id.
pub fn resolve_task<'a>(tasks: &'a [Task], needle: &str) -> Result<&'a Task> {
    let needle = needle.trim().to_lowercase();
    if let Ok(id) = needle.parse::<Uuid>() {
        return tasks
            .iter()
            .find(|t| t.id == id)
            .with_context(|| format!("No task with id {}", id));
    }
    let compact = needle.replace('-', "");
    if compact.is_empty() {
        anyhow::bail!("Task id is required");
    }
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.simple().to_string().starts_with(&compact))
        .collect();
    match matches.as_slice() {
        [task] => Ok(*task),
        [] => anyhow::bail!("No task matches id '{}'", needle),
        many => anyhow::bail!(
            "Id '{}' is ambiguous: matches {} tasks ({})",
            needle,
            many.len(),
            many.iter().map(|t| short_id(t)).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn prompt_draft(draft: &mut TaskDraft) -> Result<()> {
    draft.title = Input::new()
        .with_prompt("Title")
        .with_initial_text(draft.title.clone())
        .interact_text()
        .context("Failed to read title")?;
    draft.description = Input::new()
        .with_prompt("Description")
        .with_initial_text(draft.description.clone())
        .allow_empty(true)
        .interact_text()
        .context("Failed to read description")?;
    let labels: Vec<&str> = Priority::ALL.iter().map(|p| p.label()).collect();
    let current = Priority::ALL
        .iter()
        .position(|p| *p == draft.priority)
        .unwrap_or(1);
    let choice = Select::new()
        .with_prompt("Priority")
        .items(&labels[..])
        .default(current)
        .interact()
        .context("Failed to read priority")?;
    draft.priority = Priority::ALL[choice];
    draft.assignee = Input::new()
        .with_prompt("Assignee")
        .with_initial_text(draft.assignee.clone())
        .allow_empty(true)
        .interact_text()
        .context("Failed to read assignee")?;
    Ok(())
}

pub async fn cmd_board(config: &TaskflowConfig) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut store = workspace.task_store();
    let loaded = store.load(&workspace.session).await.map(|_| ());
    print_board(&store.columns());
    print_notices(store.take_notices());
    loaded?;
    Ok(())
}

pub async fn cmd_add(config: &TaskflowConfig, fields: TaskFields, column: ColumnId) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut store = workspace.task_store();
    let mut dialog = TaskDialog::new();
    dialog.open_add(column);

    let interactive = fields.title.is_none() && console::user_attended();
    fields.apply_to(&mut dialog.draft);
    if interactive {
        prompt_draft(&mut dialog.draft)?;
    }

    let result = dialog.submit(&mut store, &workspace.session).await;
    print_notices(store.take_notices());
    let task = result?;
    println!();
    print_task(&task);
    println!("  in {}", style(column.title()).bold());
    Ok(())
}

pub async fn cmd_edit(config: &TaskflowConfig, id: &str, fields: TaskFields) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut store = workspace.task_store();
    store.load(&workspace.session).await?;
    let task = resolve_task(store.tasks(), id)?.clone();

    let mut dialog = TaskDialog::new();
    dialog.open_edit(&task);
    let interactive = fields.is_empty() && console::user_attended();
    if fields.is_empty() && !interactive {
        anyhow::bail!("Nothing to change. Pass --title, --description, --priority or --assignee");
    }
    fields.apply_to(&mut dialog.draft);
    if interactive {
        prompt_draft(&mut dialog.draft)?;
    }

    let result = dialog.submit(&mut store, &workspace.session).await;
    print_notices(store.take_notices());
    print_task(&result?);
    Ok(())
}

pub async fn cmd_rm(config: &TaskflowConfig, id: &str, yes: bool) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut store = workspace.task_store();
    store.load(&workspace.session).await?;
    let task = resolve_task(store.tasks(), id)?.clone();

    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!("Delete task '{}'?", task.title))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirm {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let result = store.remove(&workspace.session, task.id).await;
    print_notices(store.take_notices());
    result?;
    Ok(())
}

/// Move by running the same drag/drop path the board UI uses.
pub async fn cmd_mv(config: &TaskflowConfig, id: &str, to: ColumnId) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut store = workspace.task_store();
    store.load(&workspace.session).await?;
    let task = resolve_task(store.tasks(), id)?.clone();

    let mut card = CardDrag::for_task(&task)
        .with_context(|| format!("Task {} is not on any column", short_id(&task)))?;
    let payload = card.drag_start();
    let mut zone = DropZone::new(to);
    let result = zone.drop_into(&payload, &mut store, &workspace.session).await;
    card.drag_end();
    print_notices(store.take_notices());

    if !result? {
        println!("'{}' is already in {}", task.title, to.title());
    }
    Ok(())
}

pub async fn cmd_stats(config: &TaskflowConfig) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut store = workspace.task_store();
    let loaded = store.load(&workspace.session).await.map(|_| ());
    print_notices(store.take_notices());
    loaded?;
    print_summary(&summarize(store.tasks(), Utc::now()));
    Ok(())
}
