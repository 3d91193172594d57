//! Typed error hierarchy for the task board.
//!
//! `BoardError` is the single enum surfaced by the stores and dialogs:
//! - `Validation`: a required field was empty; raised before any remote call
//! - `Fetch` / `Create` / `Update` / `Delete` / `Invite` / `Save`: the remote call failed
//! - `NotFound`: the target row does not exist or is not owned by the caller

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Failed to load {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to create task: {0}")]
    Create(#[source] anyhow::Error),

    #[error("Failed to update task {id}: {source}")]
    Update {
        id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to delete task {id}: {source}")]
    Delete {
        id: Uuid,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task {id} not found")]
    NotFound { id: Uuid },

    #[error("Failed to send invitation: {0}")]
    Invite(#[source] anyhow::Error),

    /// Writes outside the task table: events, profile, settings.
    #[error("Failed to save {what}: {source}")]
    Save {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Not signed in: {0}")]
    Unauthenticated(String),
}

impl BoardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True when the error came back from the persistence layer rather than
    /// from local input checks.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::Create(_)
                | Self::Update { .. }
                | Self::Delete { .. }
                | Self::Invite(_)
                | Self::Save { .. }
        )
    }
}
