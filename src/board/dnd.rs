//! Drag-and-drop between board columns.
//!
//! A card encodes `{taskId, fromColumnId}` as JSON into the platform drag
//! payload when the drag starts. The column it is dropped on decodes it and
//! asks the store to move the task only when the columns differ. A payload
//! that does not decode is a no-op drop.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::models::{ColumnId, Session, Task};
use super::store::TaskStore;
use crate::errors::BoardError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub task_id: String,
    #[serde(alias = "sourceColumnId")]
    pub from_column_id: String,
}

impl DragPayload {
    pub fn new(task_id: Uuid, from: ColumnId) -> Self {
        Self {
            task_id: task_id.to_string(),
            from_column_id: from.as_str().to_string(),
        }
    }

    pub fn encode(&self) -> String {
        // A struct of two strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(error = %e, "ignoring malformed drag payload");
                None
            }
        }
    }
}

/// State of one draggable card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Dragging,
}

#[derive(Debug, Clone)]
pub struct CardDrag {
    task_id: Uuid,
    column: ColumnId,
    state: CardState,
}

impl CardDrag {
    pub fn new(task_id: Uuid, column: ColumnId) -> Self {
        Self {
            task_id,
            column,
            state: CardState::Idle,
        }
    }

    /// A card for a task shown in a column; `None` for tasks that belong to
    /// no column.
    pub fn for_task(task: &Task) -> Option<Self> {
        task.column().map(|column| Self::new(task.id, column))
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == CardState::Dragging
    }

    /// Idle → Dragging. Returns the payload to put on the drag.
    pub fn drag_start(&mut self) -> String {
        self.state = CardState::Dragging;
        DragPayload::new(self.task_id, self.column).encode()
    }

    /// Dragging → Idle, whether the drop succeeded or was cancelled.
    pub fn drag_end(&mut self) {
        self.state = CardState::Idle;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCommand {
    pub task_id: Uuid,
    pub from: ColumnId,
    pub to: ColumnId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Move(MoveCommand),
    SameColumn,
    Malformed,
}

/// A column as a drop target.
#[derive(Debug, Clone)]
pub struct DropZone {
    column: ColumnId,
    hovered: bool,
}

impl DropZone {
    pub fn new(column: ColumnId) -> Self {
        Self {
            column,
            hovered: false,
        }
    }

    pub fn column(&self) -> ColumnId {
        self.column
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn drag_over(&mut self) {
        self.hovered = true;
    }

    pub fn drag_leave(&mut self) {
        self.hovered = false;
    }

    /// Decode the payload and decide what the drop means.
    pub fn drop_payload(&mut self, raw: &str) -> DropOutcome {
        self.hovered = false;
        let Some(payload) = DragPayload::decode(raw) else {
            return DropOutcome::Malformed;
        };
        let (Ok(task_id), Ok(from)) = (
            payload.task_id.parse::<Uuid>(),
            payload.from_column_id.parse::<ColumnId>(),
        ) else {
            warn!(?payload, "drag payload names an unknown task id or column");
            return DropOutcome::Malformed;
        };
        if from == self.column {
            debug!(task_id = %task_id, column = %from, "dropped on its own column");
            return DropOutcome::SameColumn;
        }
        DropOutcome::Move(MoveCommand {
            task_id,
            from,
            to: self.column,
        })
    }

    /// Drop and, when it names another column, move the task. Returns
    /// whether a move was issued.
    pub async fn drop_into(
        &mut self,
        raw: &str,
        store: &mut TaskStore,
        session: &Session,
    ) -> Result<bool, BoardError> {
        match self.drop_payload(raw) {
            DropOutcome::Move(cmd) => {
                store.move_task(session, cmd.task_id, cmd.to).await?;
                Ok(true)
            }
            DropOutcome::SameColumn | DropOutcome::Malformed => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::NewTask;
    use crate::board::store::tests::{FlakyBackend, session};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_drag_start_and_end_toggle_state() {
        let id = Uuid::new_v4();
        let mut card = CardDrag::new(id, ColumnId::Todo);
        assert_eq!(card.state(), &CardState::Idle);

        let raw = card.drag_start();
        assert!(card.is_dragging());
        let payload: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(payload["taskId"], id.to_string());
        assert_eq!(payload["fromColumnId"], "todo");

        card.drag_end();
        assert!(!card.is_dragging());
    }

    #[test]
    fn test_drop_on_other_column_is_a_move() {
        let id = Uuid::new_v4();
        let raw = CardDrag::new(id, ColumnId::Todo).drag_start();
        let mut zone = DropZone::new(ColumnId::Done);
        zone.drag_over();
        assert!(zone.is_hovered());

        let outcome = zone.drop_payload(&raw);
        assert_eq!(
            outcome,
            DropOutcome::Move(MoveCommand {
                task_id: id,
                from: ColumnId::Todo,
                to: ColumnId::Done,
            })
        );
        assert!(!zone.is_hovered());
    }

    #[test]
    fn test_drop_on_same_column_is_noop() {
        let raw = CardDrag::new(Uuid::new_v4(), ColumnId::Review).drag_start();
        let mut zone = DropZone::new(ColumnId::Review);
        assert_eq!(zone.drop_payload(&raw), DropOutcome::SameColumn);
    }

    #[test]
    fn test_malformed_payloads_are_noops() {
        let mut zone = DropZone::new(ColumnId::Done);
        let unknown_column = format!(r#"{{"taskId": "{}", "fromColumnId": "backlog"}}"#, Uuid::new_v4());
        for raw in [
            "",
            "not json",
            "{}",
            r#"{"taskId": 5, "fromColumnId": "todo"}"#,
            r#"{"taskId": "nope", "fromColumnId": "todo"}"#,
            unknown_column.as_str(),
        ] {
            assert_eq!(zone.drop_payload(raw), DropOutcome::Malformed, "payload {raw:?}");
        }
    }

    #[test]
    fn test_source_column_alias_accepted() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"taskId": "{id}", "sourceColumnId": "inprogress"}}"#);
        let payload = DragPayload::decode(&raw).unwrap();
        assert_eq!(payload, DragPayload::new(id, ColumnId::InProgress));
    }

    #[test]
    fn test_card_for_task_outside_columns() {
        let mut task = crate::board::mapper::to_domain(crate::board::mapper::TaskRecord {
            id: Uuid::new_v4(),
            title: "odd".into(),
            priority: Some(2),
            status: Some(9),
            custom_fields: None,
            user_id: None,
            created_at: None,
        });
        assert!(CardDrag::for_task(&task).is_none());
        task.status = 2;
        assert!(CardDrag::for_task(&task).is_some());
    }

    #[tokio::test]
    async fn test_drag_todo_to_done_moves_once() {
        let backend = Arc::new(FlakyBackend::default());
        let mut store = TaskStore::new(backend.clone());
        let s = session();
        let task = store.add(&s, NewTask::new("Drag me")).await.unwrap();

        let mut card = CardDrag::for_task(store.task(task.id).unwrap()).unwrap();
        let raw = card.drag_start();
        let mut done = DropZone::new(ColumnId::Done);
        assert!(done.drop_into(&raw, &mut store, &s).await.unwrap());
        card.drag_end();

        {
            let updates = backend.updates.lock().unwrap();
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].status, Some(3));
        }
        assert_eq!(store.task(task.id).unwrap().status, 3);

        let calls = backend.calls.load(Ordering::SeqCst);
        let mut todo = DropZone::new(ColumnId::Todo);
        let raw_same = CardDrag::new(task.id, ColumnId::Todo).drag_start();
        assert!(!todo.drop_into(&raw_same, &mut store, &s).await.unwrap());
        assert!(!todo.drop_into("garbage", &mut store, &s).await.unwrap());
        assert_eq!(backend.calls.load(Ordering::SeqCst), calls);
    }
}
