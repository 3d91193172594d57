//! The authoritative task list for one signed-in owner.
//!
//! Every mutation is a remote round-trip followed by a full reload; nothing
//! is applied locally first, so a failed call leaves the list exactly as it
//! was. Failures are logged, recorded as error notices and returned.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use super::backend::TaskBackend;
use super::mapper::{self, TaskChanges};
use super::models::{Column, ColumnId, NewTask, Notice, Session, Task, TaskPatch};
use super::projection::{BOARD_COLUMNS, project};
use crate::errors::BoardError;

pub struct TaskStore {
    backend: Arc<dyn TaskBackend>,
    tasks: Vec<Task>,
    notices: Vec<Notice>,
    loaded: bool,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            backend,
            tasks: Vec::new(),
            notices: Vec::new(),
            loaded: false,
        }
    }

    /// Current snapshot, newest-created first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// True once a load has succeeded at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The four board columns derived from the current snapshot.
    pub fn columns(&self) -> Vec<Column> {
        project(&self.tasks, &BOARD_COLUMNS)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Replace the snapshot with the owner's tasks. On failure the previous
    /// snapshot stays in place.
    pub async fn load(&mut self, session: &Session) -> Result<&[Task], BoardError> {
        match self.backend.select_tasks(session).await {
            Ok(rows) => {
                self.tasks = rows.into_iter().map(mapper::to_domain).collect();
                self.loaded = true;
                Ok(&self.tasks)
            }
            Err(e) => {
                error!(error = %e, "failed to load tasks");
                self.notices.push(Notice::error("Error", "Failed to load tasks"));
                Err(BoardError::Fetch {
                    what: "tasks",
                    source: e,
                })
            }
        }
    }

    pub async fn add(&mut self, session: &Session, input: NewTask) -> Result<Task, BoardError> {
        if input.title.trim().is_empty() {
            return Err(BoardError::validation("Task title is required"));
        }
        let row = mapper::insert_record(session.user_id, &input);
        let record = match self.backend.insert_task(session, row).await {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "failed to create task");
                self.notices.push(Notice::error("Error", "Failed to create task"));
                return Err(BoardError::Create(e));
            }
        };
        let task = mapper::to_domain(record);
        info!(task_id = %task.id, column = %input.column, "task created");
        self.notices.push(Notice::info(
            "Task created",
            "New task has been created successfully",
        ));
        self.refresh(session).await;
        Ok(task)
    }

    /// Overwrite the patched fields of an owned task.
    pub async fn update(
        &mut self,
        session: &Session,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, BoardError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(BoardError::validation("Task title is required"));
        }

        let current = match self.backend.select_task(session, id).await {
            Ok(Some(record)) => mapper::to_domain(record),
            Ok(None) => return Err(self.not_found(id, "update")),
            Err(e) => return Err(self.update_failed(id, e)),
        };
        let mut task = current;
        task.apply(&patch);
        let changes = mapper::to_storage(&task).changes();

        match self.backend.update_task(session, id, changes).await {
            Ok(Some(record)) => {
                let task = mapper::to_domain(record);
                info!(task_id = %id, "task updated");
                self.notices.push(Notice::info(
                    "Task updated",
                    "Task has been updated successfully",
                ));
                self.refresh(session).await;
                Ok(task)
            }
            Ok(None) => Err(self.not_found(id, "update")),
            Err(e) => Err(self.update_failed(id, e)),
        }
    }

    pub async fn remove(&mut self, session: &Session, id: Uuid) -> Result<(), BoardError> {
        match self.backend.delete_task(session, id).await {
            Ok(true) => {
                info!(task_id = %id, "task deleted");
                self.notices.push(Notice::info(
                    "Task deleted",
                    "Task has been removed successfully",
                ));
                self.refresh(session).await;
                Ok(())
            }
            Ok(false) => Err(self.not_found(id, "delete")),
            Err(e) => {
                error!(task_id = %id, error = %e, "failed to delete task");
                self.notices.push(Notice::error("Error", "Failed to delete task"));
                Err(BoardError::Delete { id, source: e })
            }
        }
    }

    /// Change only the status of an owned task.
    pub async fn move_task(
        &mut self,
        session: &Session,
        id: Uuid,
        to: ColumnId,
    ) -> Result<(), BoardError> {
        let changes = TaskChanges::status_only(to.status_code());
        match self.backend.update_task(session, id, changes).await {
            Ok(Some(_)) => {
                info!(task_id = %id, to = %to, "task moved");
                self.notices.push(Notice::info(
                    "Task moved",
                    "Task status updated successfully",
                ));
                self.refresh(session).await;
                Ok(())
            }
            Ok(None) => Err(self.not_found(id, "move")),
            Err(e) => {
                error!(task_id = %id, error = %e, "failed to move task");
                self.notices.push(Notice::error("Error", "Failed to move task"));
                Err(BoardError::Update { id, source: e })
            }
        }
    }

    /// Reload after a successful mutation. A failed reload is already
    /// logged and noticed by `load`; the mutation itself still succeeded.
    async fn refresh(&mut self, session: &Session) {
        let _ = self.load(session).await;
    }

    fn not_found(&mut self, id: Uuid, action: &str) -> BoardError {
        error!(task_id = %id, action, "task not found for owner");
        self.notices.push(Notice::error("Error", format!("Failed to {} task", action)));
        BoardError::NotFound { id }
    }

    fn update_failed(&mut self, id: Uuid, e: anyhow::Error) -> BoardError {
        error!(task_id = %id, error = %e, "failed to update task");
        self.notices.push(Notice::error("Error", "Failed to update task"));
        BoardError::Update { id, source: e }
    }
}
