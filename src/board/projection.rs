use tracing::warn;

use super::models::{Column, ColumnDef, ColumnId, Task};

pub const BOARD_COLUMNS: [ColumnDef; 4] = [
    ColumnDef { id: ColumnId::Todo, title: "To Do" },
    ColumnDef { id: ColumnId::InProgress, title: "In Progress" },
    ColumnDef { id: ColumnId::Review, title: "Review" },
    ColumnDef { id: ColumnId::Done, title: "Done" },
];

/// Partition `tasks` into `columns` by status code.
///
/// Intra-column order is the input order. A task whose status matches none
/// of the columns is left out and logged as a data-integrity warning.
pub fn project(tasks: &[Task], columns: &[ColumnDef]) -> Vec<Column> {
    let mut out: Vec<Column> = columns
        .iter()
        .map(|def| Column {
            id: def.id,
            title: def.title.to_string(),
            tasks: Vec::new(),
        })
        .collect();

    for task in tasks {
        match out
            .iter_mut()
            .find(|col| col.id.status_code() == task.status)
        {
            Some(col) => col.tasks.push(task.clone()),
            None => warn!(
                task_id = %task.id,
                status = task.status,
                "task status matches no board column; dropped from board"
            ),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::Priority;
    use chrono::Utc;
    use uuid::Uuid;

    fn task(title: &str, status: i32) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            priority: Priority::Medium,
            assignee: None,
            status,
            created_at: Utc::now(),
            owner_id: Uuid::nil(),
        }
    }

    fn placements(columns: &[Column], task: &Task) -> usize {
        columns
            .iter()
            .map(|c| c.tasks.iter().filter(|t| t.id == task.id).count())
            .sum()
    }

    #[test]
    fn test_empty_board_has_four_columns() {
        let columns = project(&[], &BOARD_COLUMNS);
        let titles: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["To Do", "In Progress", "Review", "Done"]);
        assert!(columns.iter().all(|c| c.tasks.is_empty()));
    }

    #[test]
    fn test_each_valid_task_lands_in_exactly_one_column() {
        let tasks: Vec<Task> = (-2..6).map(|s| task(&format!("t{s}"), s)).collect();
        let columns = project(&tasks, &BOARD_COLUMNS);
        for t in &tasks {
            let expected = if (0..=3).contains(&t.status) { 1 } else { 0 };
            assert_eq!(placements(&columns, t), expected, "status {}", t.status);
        }
    }

    #[test]
    fn test_column_matches_status() {
        let tasks = vec![task("a", 3), task("b", 1), task("c", 3)];
        let columns = project(&tasks, &BOARD_COLUMNS);
        let done = &columns[3];
        assert_eq!(done.id, ColumnId::Done);
        let titles: Vec<&str> = done.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "c"]);
        assert_eq!(columns[1].tasks.len(), 1);
    }

    #[test]
    fn test_subset_of_columns() {
        let defs = [BOARD_COLUMNS[0]];
        let tasks = vec![task("todo", 0), task("done", 3)];
        let columns = project(&tasks, &defs);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].tasks.len(), 1);
        assert_eq!(columns[0].tasks[0].title, "todo");
    }
}
