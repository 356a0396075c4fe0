//! Editor-side state of a schedule and the header payload derived from it.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::db::models::{Schedule, SchedulePayload, ScheduleType, TaskSource};
use crate::error::{require, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDraft {
    /// `None` for items added in this edit.
    pub id: Option<i64>,
    pub content: String,
    pub deadline: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(content: impl Into<String>, deadline: Option<NaiveDate>) -> Self {
        Self {
            id: None,
            content: content.into(),
            deadline,
        }
    }
}

/// Everything the schedule dialog holds when the user hits save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDraft {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub schedule_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub schedule_type: ScheduleType,
    pub color: Option<String>,
    pub client_id: Option<i64>,
    /// Legacy single selection, only consulted when `milestone_ids` is empty.
    pub milestone_id: Option<i64>,
    pub milestone_ids: Vec<i64>,
    pub email_reminder: bool,
    /// Authoritative over `tasks`: when false every existing item is removed.
    pub has_task: bool,
    pub tasks: Vec<TaskDraft>,
}

impl ScheduleDraft {
    pub fn new(schedule_date: NaiveDate) -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            schedule_date,
            end_date: None,
            start_time: None,
            end_time: None,
            schedule_type: ScheduleType::default(),
            color: None,
            client_id: None,
            milestone_id: None,
            milestone_ids: Vec::new(),
            email_reminder: false,
            has_task: false,
            tasks: Vec::new(),
        }
    }

    /// Load an existing schedule into the editor. A legacy inline task shows
    /// up as a new, id-less item so saving migrates it to the task list.
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let tasks: Vec<TaskDraft> = match schedule.task_source() {
            TaskSource::Current(items) => items
                .iter()
                .map(|task| TaskDraft {
                    id: Some(task.id),
                    content: task.content.clone(),
                    deadline: task.deadline,
                })
                .collect(),
            TaskSource::Legacy {
                content, deadline, ..
            } => vec![TaskDraft::new(content, deadline)],
            TaskSource::None => Vec::new(),
        };

        Self {
            id: Some(schedule.id),
            title: schedule.title.clone(),
            description: schedule.description.clone().unwrap_or_default(),
            schedule_date: schedule.schedule_date,
            end_date: schedule.end_date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            schedule_type: schedule.schedule_type,
            color: schedule.color.clone(),
            client_id: schedule.client_id,
            milestone_id: schedule.milestone_id,
            milestone_ids: schedule.milestone_ids.clone(),
            email_reminder: schedule.email_reminder,
            has_task: !tasks.is_empty(),
            tasks,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.title, "title")?;
        if let Some(end) = self.end_date {
            if end < self.schedule_date {
                return Err(ValidationError::InvertedRange {
                    start: self.schedule_date,
                    end,
                });
            }
        }
        Ok(())
    }

    /// Multi-selection first, then the legacy single selection, else none.
    pub fn resolved_milestone_ids(&self) -> Vec<i64> {
        if self.milestone_ids.is_empty() {
            return self.milestone_id.into_iter().collect();
        }

        let mut ids = Vec::with_capacity(self.milestone_ids.len());
        for id in &self.milestone_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    /// Header payload. A client's color overrides the manual one at render
    /// time, so the manual color is dropped whenever a client is set.
    pub fn to_payload(&self, milestone_ids: Vec<i64>) -> SchedulePayload {
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let color = match self.client_id {
            Some(_) => None,
            None => self
                .color
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };

        SchedulePayload {
            title: self.title.trim().to_string(),
            description,
            schedule_date: self.schedule_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            schedule_type: self.schedule_type,
            color,
            client_id: self.client_id,
            milestone_ids,
            email_reminder: self.email_reminder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Task;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> ScheduleDraft {
        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "  Client sync ".into();
        draft
    }

    #[test]
    fn title_required() {
        let mut d = draft();
        d.title = "   ".into();
        assert_eq!(d.validate(), Err(ValidationError::MissingField("title")));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut d = draft();
        d.end_date = Some(date(2025, 8, 31));
        assert!(matches!(d.validate(), Err(ValidationError::InvertedRange { .. })));
        d.end_date = Some(date(2025, 9, 1));
        assert!(d.validate().is_ok());
    }

    #[test]
    fn milestone_ids_fall_back_to_legacy_single() {
        let mut d = draft();
        assert!(d.resolved_milestone_ids().is_empty());

        d.milestone_id = Some(4);
        assert_eq!(d.resolved_milestone_ids(), vec![4]);

        d.milestone_ids = vec![2, 3, 2];
        assert_eq!(d.resolved_milestone_ids(), vec![2, 3]);
    }

    #[test]
    fn client_forces_color_to_none() {
        let mut d = draft();
        d.color = Some("#123456".into());
        assert_eq!(d.to_payload(Vec::new()).color.as_deref(), Some("#123456"));

        d.client_id = Some(1);
        let payload = d.to_payload(vec![9]);
        assert_eq!(payload.color, None);
        assert_eq!(payload.title, "Client sync");
        assert_eq!(payload.description, None);
        assert_eq!(payload.milestone_ids, vec![9]);
    }

    #[test]
    fn legacy_task_loads_as_new_item() {
        let schedule = Schedule {
            id: 3,
            title: "Old".into(),
            description: Some("notes".into()),
            schedule_date: date(2025, 9, 1),
            end_date: None,
            start_time: None,
            end_time: None,
            schedule_type: ScheduleType::Task,
            color: None,
            client_id: None,
            milestone_id: Some(8),
            milestone_ids: Vec::new(),
            is_completed: false,
            email_reminder: false,
            task_content: Some("File taxes".into()),
            task_deadline: Some(date(2025, 9, 5)),
            task_completed: false,
            tasks: Vec::new(),
        };

        let d = ScheduleDraft::from_schedule(&schedule);
        assert!(d.has_task);
        assert_eq!(d.tasks, vec![TaskDraft::new("File taxes", Some(date(2025, 9, 5)))]);
        assert_eq!(d.resolved_milestone_ids(), vec![8]);

        let mut current = schedule.clone();
        current.tasks = vec![Task {
            id: 40,
            schedule_id: 3,
            content: "Pay invoice".into(),
            deadline: None,
            is_completed: false,
            completed_at: None,
            order_index: 0,
        }];
        let d = ScheduleDraft::from_schedule(&current);
        assert_eq!(d.tasks.len(), 1);
        assert_eq!(d.tasks[0].id, Some(40));
    }
}
