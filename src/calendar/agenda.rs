//! Everything a single calendar day shows, collected from a snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::{Milestone, Schedule};
use crate::settings::ScheduleColors;
use crate::snapshot::Snapshot;

use super::classifier::{
    display_color, schedules_for_date, task_deadline_items_for_date, task_type_schedules_for_date,
    DeadlineItem,
};
use super::dates::week_days;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub schedule: Schedule,
    pub color: String,
}

/// A task deadline due on the day. `task_id` is `None` for a legacy inline
/// task stored on the schedule itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineEntry {
    pub schedule_id: i64,
    pub schedule_title: String,
    pub task_id: Option<i64>,
    pub content: String,
    pub completed: bool,
}

impl From<DeadlineItem<'_>> for DeadlineEntry {
    fn from(item: DeadlineItem<'_>) -> Self {
        let schedule = item.schedule();
        let (task_id, content, completed) = match item {
            DeadlineItem::Current { task, .. } => {
                (Some(task.id), task.content.clone(), task.is_completed)
            }
            DeadlineItem::Legacy {
                content, completed, ..
            } => (None, content.to_string(), completed),
        };

        Self {
            schedule_id: schedule.id,
            schedule_title: schedule.title.clone(),
            task_id,
            content,
            completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAgenda {
    pub day: NaiveDate,
    pub schedules: Vec<AgendaEntry>,
    pub task_schedules: Vec<AgendaEntry>,
    pub deadlines: Vec<DeadlineEntry>,
    pub milestones_due: Vec<Milestone>,
    pub memo: Option<String>,
}

impl DayAgenda {
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
            && self.task_schedules.is_empty()
            && self.deadlines.is_empty()
            && self.milestones_due.is_empty()
            && self.memo.is_none()
    }
}

pub fn day_agenda(snapshot: &Snapshot, day: NaiveDate, colors: &ScheduleColors) -> DayAgenda {
    let entry = |schedule: &Schedule| AgendaEntry {
        color: display_color(schedule, &snapshot.clients, colors),
        schedule: schedule.clone(),
    };

    DayAgenda {
        day,
        schedules: schedules_for_date(&snapshot.schedules, day)
            .into_iter()
            .map(entry)
            .collect(),
        task_schedules: task_type_schedules_for_date(&snapshot.schedules, day)
            .into_iter()
            .map(entry)
            .collect(),
        deadlines: task_deadline_items_for_date(&snapshot.schedules, day)
            .into_iter()
            .map(DeadlineEntry::from)
            .collect(),
        milestones_due: snapshot
            .milestones
            .iter()
            .filter(|m| m.target_date == Some(day))
            .cloned()
            .collect(),
        memo: snapshot.memo(day).map(|m| m.content.clone()),
    }
}

/// Sunday through Saturday of the week containing `day`.
pub fn week_agenda(snapshot: &Snapshot, day: NaiveDate, colors: &ScheduleColors) -> Vec<DayAgenda> {
    week_days(day)
        .into_iter()
        .map(|d| day_agenda(snapshot, d, colors))
        .collect()
}
