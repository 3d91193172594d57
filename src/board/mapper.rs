//! Conversion between `tasks` table rows and the in-memory [`Task`].
//!
//! The table keeps `priority` and `status` as integers and stores
//! description/assignee inside a `custom_fields` JSON bag. Priority uses the
//! table in [`Priority::code`]; unknown or missing codes fall back to
//! `high`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::models::{NewTask, Priority, Task, non_empty};

/// The `custom_fields` bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomFields {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
}

/// A full `tasks` row as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub custom_fields: Option<CustomFields>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert body; `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskInsert {
    pub title: String,
    pub user_id: Uuid,
    pub priority: i32,
    pub status: i32,
    pub custom_fields: CustomFields,
}

/// Update body. Absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<CustomFields>,
}

impl TaskChanges {
    /// Body for a drag-and-drop move: only the status column is written.
    pub fn status_only(status: i32) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

pub fn to_domain(record: TaskRecord) -> Task {
    let priority = match record.priority {
        Some(code) => Priority::from_code(code).unwrap_or_else(|| {
            warn!(task_id = %record.id, code, "unknown priority code, treating as high");
            Priority::High
        }),
        None => {
            warn!(task_id = %record.id, "missing priority code, treating as high");
            Priority::High
        }
    };
    let fields = record.custom_fields.unwrap_or_default();
    Task {
        id: record.id,
        title: record.title,
        description: fields.description.as_deref().and_then(non_empty),
        priority,
        assignee: fields.assignee.as_deref().and_then(non_empty),
        status: record.status.unwrap_or(0),
        created_at: record.created_at.unwrap_or_default(),
        owner_id: record.user_id.unwrap_or_default(),
    }
}

pub fn to_storage(task: &Task) -> TaskRecord {
    TaskRecord {
        id: task.id,
        title: task.title.clone(),
        priority: Some(task.priority.code()),
        status: Some(task.status),
        custom_fields: Some(custom_fields(
            task.description.as_deref(),
            task.assignee.as_deref(),
        )),
        user_id: Some(task.owner_id),
        created_at: Some(task.created_at),
    }
}

pub fn insert_record(owner: Uuid, task: &NewTask) -> TaskInsert {
    TaskInsert {
        title: task.title.trim().to_string(),
        user_id: owner,
        priority: task.priority.code(),
        status: task.column.status_code(),
        custom_fields: custom_fields(task.description.as_deref(), task.assignee.as_deref()),
    }
}

impl TaskRecord {
    /// Every mutable column of this row, for a full overwrite.
    pub fn changes(&self) -> TaskChanges {
        TaskChanges {
            title: Some(self.title.clone()),
            priority: self.priority,
            status: self.status,
            custom_fields: self.custom_fields.clone(),
        }
    }
}

fn custom_fields(description: Option<&str>, assignee: Option<&str>) -> CustomFields {
    CustomFields {
        description: description.and_then(non_empty),
        assignee: assignee.and_then(non_empty),
    }
}
