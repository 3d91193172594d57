//! Summary figures over a task snapshot, used by `taskflow stats` and
//! `GET /api/analytics`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::models::{ColumnId, Priority, Task};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    /// Whole percent, 0 for an empty board.
    pub completion_rate: u32,
    pub tasks_by_status: Vec<Bucket>,
    pub tasks_by_priority: Vec<Bucket>,
    pub tasks_this_week: usize,
    pub tasks_this_month: usize,
}

pub fn summarize(tasks: &[Task], now: DateTime<Utc>) -> AnalyticsSummary {
    let total_tasks = tasks.len();
    let completed_tasks = tasks
        .iter()
        .filter(|t| t.column() == Some(ColumnId::Done))
        .count();
    let completion_rate = if total_tasks == 0 {
        0
    } else {
        ((completed_tasks as f64 / total_tasks as f64) * 100.0).round() as u32
    };

    let tasks_by_status = ColumnId::ALL
        .iter()
        .map(|column| Bucket {
            label: column.title().to_string(),
            count: tasks.iter().filter(|t| t.column() == Some(*column)).count(),
        })
        .collect();
    let tasks_by_priority = Priority::ALL
        .iter()
        .map(|priority| Bucket {
            label: priority.label().to_string(),
            count: tasks.iter().filter(|t| t.priority == *priority).count(),
        })
        .collect();

    let created_since = |days: i64| {
        let cutoff = now - Duration::days(days);
        tasks.iter().filter(|t| t.created_at >= cutoff).count()
    };

    AnalyticsSummary {
        total_tasks,
        completed_tasks,
        pending_tasks: total_tasks - completed_tasks,
        completion_rate,
        tasks_by_status,
        tasks_by_priority,
        tasks_this_week: created_since(7),
        tasks_this_month: created_since(30),
    }
}
