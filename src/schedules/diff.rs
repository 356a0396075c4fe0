use std::collections::HashSet;

use crate::db::models::{Task, TaskInput};

use super::draft::TaskDraft;

/// One write against the task list, in form order.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskWrite {
    Update { task_id: i64, input: TaskInput },
    Create(TaskInput),
}

/// Calls needed to bring a schedule's stored task items in line with the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDiff {
    pub deletes: Vec<i64>,
    pub writes: Vec<TaskWrite>,
}

impl TaskDiff {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.writes.is_empty()
    }

    pub fn update_count(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, TaskWrite::Update { .. }))
            .count()
    }

    pub fn create_count(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, TaskWrite::Create(_)))
            .count()
    }
}

/// Diff the stored items against the form's items.
///
/// Blank items are dropped first. Positions in the remaining list become the
/// order index. A draft id that is not among the stored items is treated as
/// a new item. With `has_task == false` every stored item is deleted.
pub fn diff_tasks(previous: &[Task], drafts: &[TaskDraft], has_task: bool) -> TaskDiff {
    if !has_task {
        return TaskDiff {
            deletes: previous.iter().map(|task| task.id).collect(),
            writes: Vec::new(),
        };
    }

    let stored: HashSet<i64> = previous.iter().map(|task| task.id).collect();
    let mut kept: HashSet<i64> = HashSet::new();
    let mut writes = Vec::new();

    let filled = drafts.iter().filter(|d| !d.content.trim().is_empty());
    for (position, draft) in filled.enumerate() {
        let input = TaskInput {
            content: draft.content.trim().to_string(),
            deadline: draft.deadline,
            order_index: position as i64,
        };

        match draft.id {
            Some(task_id) if stored.contains(&task_id) && kept.insert(task_id) => {
                writes.push(TaskWrite::Update { task_id, input });
            }
            _ => writes.push(TaskWrite::Create(input)),
        }
    }

    let deletes = previous
        .iter()
        .map(|task| task.id)
        .filter(|id| !kept.contains(id))
        .collect();

    TaskDiff { deletes, writes }
}
