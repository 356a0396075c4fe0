//! Schedule and task item data models.
//!
//! Older records carry a single milestone reference (`milestone_id`) and a
//! single inline task (`task_content`, `task_deadline`, `task_completed`).
//! Current records use `milestone_ids` and the `tasks` list. The legacy fields
//! are only ever read; see [`Schedule::task_source`] and
//! [`Schedule::resolved_milestone_ids`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::dates::date_range_contains;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Task,
    #[default]
    Meeting,
    Deadline,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Task => "task",
            ScheduleType::Meeting => "meeting",
            ScheduleType::Deadline => "deadline",
        }
    }
}

/// A discrete to-do item attached to a schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub schedule_id: i64,
    pub content: String,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub order_index: i64,
}

/// A calendar entry spanning one or more days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub schedule_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, with = "optional_hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "optional_hhmm")]
    pub end_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub milestone_id: Option<i64>,
    #[serde(default)]
    pub milestone_ids: Vec<i64>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub email_reminder: bool,
    #[serde(default)]
    pub task_content: Option<String>,
    #[serde(default)]
    pub task_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub task_completed: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Where a schedule's to-do items come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskSource<'a> {
    Current(&'a [Task]),
    Legacy {
        content: &'a str,
        deadline: Option<NaiveDate>,
        completed: bool,
    },
    None,
}

impl Schedule {
    pub fn is_task_type(&self) -> bool {
        self.schedule_type == ScheduleType::Task
    }

    /// Inclusive span membership. Task-type schedules are handled by the
    /// classifier and only ever show on `schedule_date`.
    pub fn spans(&self, day: NaiveDate) -> bool {
        date_range_contains(day, self.schedule_date, self.end_date)
    }

    /// Multi-valued milestone links, falling back to the legacy single link.
    pub fn resolved_milestone_ids(&self) -> Vec<i64> {
        if !self.milestone_ids.is_empty() {
            self.milestone_ids.clone()
        } else {
            self.milestone_id.into_iter().collect()
        }
    }

    pub fn references_milestone(&self, milestone_id: i64) -> bool {
        if self.milestone_ids.is_empty() {
            self.milestone_id == Some(milestone_id)
        } else {
            self.milestone_ids.contains(&milestone_id)
        }
    }

    /// Task items fully supersede the legacy inline task once any exist.
    pub fn task_source(&self) -> TaskSource<'_> {
        if !self.tasks.is_empty() {
            return TaskSource::Current(&self.tasks);
        }

        let content = self
            .task_content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        match (content, self.task_deadline) {
            (None, None) => TaskSource::None,
            (content, deadline) => TaskSource::Legacy {
                content: content.unwrap_or(""),
                deadline,
                completed: self.task_completed,
            },
        }
    }
}

/// Header fields written when a schedule is created or updated.
///
/// Legacy single-valued fields have no place here; the store writes them as
/// NULL. Completion state is left alone on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulePayload {
    pub title: String,
    pub description: Option<String>,
    pub schedule_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(with = "optional_hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "optional_hhmm")]
    pub end_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,
    pub color: Option<String>,
    pub client_id: Option<i64>,
    pub milestone_ids: Vec<i64>,
    pub email_reminder: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskInput {
    pub content: String,
    pub deadline: Option<NaiveDate>,
    pub order_index: i64,
}

/// Parse a time of day written as `HH:MM` or `HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Serde helper for optional `HH:MM` times.
mod optional_hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_some(&super::format_time(time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_time(value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid time '{value}'"))),
        }
    }
}
