//! Draft state for the add/edit task dialog and the invite dialog.
//!
//! A dialog reseeds its draft each time it goes from closed to open. Submit
//! checks required fields locally first. On success the dialog closes and
//! clears its draft; on a store error it stays open with the draft intact so
//! the user can retry.

use uuid::Uuid;

use super::models::{ColumnId, Invite, MemberRole, NewTask, Priority, Session, Task, TaskPatch, TeamMember};
use super::store::TaskStore;
use super::team::{TeamStore, validate_invite};
use crate::errors::BoardError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee: String,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            assignee: task.assignee.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.title.trim().is_empty() {
            return Err(BoardError::validation("Task title is required"));
        }
        Ok(())
    }

    fn to_new_task(&self, column: ColumnId) -> NewTask {
        NewTask {
            title: self.title.trim().to_string(),
            description: Some(self.description.clone()),
            priority: self.priority,
            assignee: Some(self.assignee.clone()),
            column,
        }
    }

    fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.clone()),
            priority: Some(self.priority),
            assignee: Some(self.assignee.clone()),
            column: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDialogMode {
    Add { column: ColumnId },
    Edit { task_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct TaskDialog {
    open: bool,
    mode: TaskDialogMode,
    pub draft: TaskDraft,
}

impl Default for TaskDialog {
    fn default() -> Self {
        Self {
            open: false,
            mode: TaskDialogMode::Add {
                column: ColumnId::Todo,
            },
            draft: TaskDraft::default(),
        }
    }
}

impl TaskDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> TaskDialogMode {
        self.mode
    }

    /// Open for a new task in `column`. The draft resets when the dialog
    /// was closed or pointed somewhere else.
    pub fn open_add(&mut self, column: ColumnId) {
        let mode = TaskDialogMode::Add { column };
        if self.retargets(mode) {
            self.draft = TaskDraft::default();
        }
        self.mode = mode;
        self.open = true;
    }

    /// Open seeded from `task`. The draft reseeds when the dialog was
    /// closed or was editing another task.
    pub fn open_edit(&mut self, task: &Task) {
        let mode = TaskDialogMode::Edit { task_id: task.id };
        if self.retargets(mode) {
            self.draft = TaskDraft::from_task(task);
        }
        self.mode = mode;
        self.open = true;
    }

    fn retargets(&self, mode: TaskDialogMode) -> bool {
        !self.open || self.mode != mode
    }

    pub fn close(&mut self) {
        self.open = false;
        self.draft = TaskDraft::default();
    }

    pub async fn submit(
        &mut self,
        store: &mut TaskStore,
        session: &Session,
    ) -> Result<Task, BoardError> {
        if !self.open {
            return Err(BoardError::validation("Dialog is not open"));
        }
        self.draft.validate()?;
        let task = match self.mode {
            TaskDialogMode::Add { column } => store.add(session, self.draft.to_new_task(column)).await?,
            TaskDialogMode::Edit { task_id } => {
                store.update(session, task_id, self.draft.to_patch()).await?
            }
        };
        self.close();
        Ok(task)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InviteDraft {
    pub email: String,
    pub full_name: String,
    pub role: MemberRole,
}

impl InviteDraft {
    fn to_invite(&self) -> Invite {
        Invite {
            email: self.email.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InviteDialog {
    open: bool,
    /// True while a submit is in flight; the submit button is disabled.
    sending: bool,
    pub draft: InviteDraft,
}

impl InviteDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn open(&mut self) {
        if !self.open {
            self.draft = InviteDraft::default();
        }
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.sending = false;
        self.draft = InviteDraft::default();
    }

    pub async fn submit(
        &mut self,
        team: &mut TeamStore,
        session: &Session,
    ) -> Result<TeamMember, BoardError> {
        if !self.open {
            return Err(BoardError::validation("Dialog is not open"));
        }
        let invite = self.draft.to_invite();
        validate_invite(&invite)?;
        self.sending = true;
        let result = team.invite(session, invite).await;
        self.sending = false;
        let member = result?;
        self.close();
        Ok(member)
    }
}
