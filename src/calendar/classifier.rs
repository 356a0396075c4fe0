//! Decides what shows up on a given calendar day.

use chrono::NaiveDate;

use crate::db::models::{Client, Schedule, ScheduleType, Task, TaskSource};
use crate::settings::ScheduleColors;

/// A task deadline falling on a day, from either task representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeadlineItem<'a> {
    Current {
        schedule: &'a Schedule,
        task: &'a Task,
    },
    Legacy {
        schedule: &'a Schedule,
        content: &'a str,
        completed: bool,
    },
}

impl<'a> DeadlineItem<'a> {
    pub fn schedule(&self) -> &'a Schedule {
        match *self {
            DeadlineItem::Current { schedule, .. } | DeadlineItem::Legacy { schedule, .. } => {
                schedule
            }
        }
    }

    pub fn item(&self) -> Option<&'a Task> {
        match *self {
            DeadlineItem::Current { task, .. } => Some(task),
            DeadlineItem::Legacy { .. } => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, DeadlineItem::Legacy { .. })
    }
}

/// Untimed entries first, then by start time. The sort is stable so ties keep
/// their incoming order.
fn order_by_start(schedules: &mut [&Schedule]) {
    schedules.sort_by_key(|s| s.start_time);
}

/// Meeting and deadline schedules whose span covers `day`.
pub fn schedules_for_date(all: &[Schedule], day: NaiveDate) -> Vec<&Schedule> {
    let mut matched: Vec<&Schedule> = all
        .iter()
        .filter(|s| !s.is_task_type())
        .filter(|s| s.spans(day))
        .collect();
    order_by_start(&mut matched);
    matched
}

/// Task-type schedules never span a range; they show on their start date only.
pub fn task_type_schedules_for_date(all: &[Schedule], day: NaiveDate) -> Vec<&Schedule> {
    let mut matched: Vec<&Schedule> = all
        .iter()
        .filter(|s| s.is_task_type() && s.schedule_date == day)
        .collect();
    order_by_start(&mut matched);
    matched
}

pub fn task_deadline_items_for_date(all: &[Schedule], day: NaiveDate) -> Vec<DeadlineItem<'_>> {
    let mut items = Vec::new();

    for schedule in all {
        match schedule.task_source() {
            TaskSource::Current(tasks) => {
                items.extend(
                    tasks
                        .iter()
                        .filter(|task| task.deadline == Some(day))
                        .map(|task| DeadlineItem::Current { schedule, task }),
                );
            }
            TaskSource::Legacy {
                content,
                deadline,
                completed,
            } => {
                if deadline == Some(day) {
                    items.push(DeadlineItem::Legacy {
                        schedule,
                        content,
                        completed,
                    });
                }
            }
            TaskSource::None => {}
        }
    }

    items
}

/// Render color: an attached client's color wins, then the schedule's own,
/// then the per-type default.
pub fn display_color(schedule: &Schedule, clients: &[Client], defaults: &ScheduleColors) -> String {
    if let Some(client) = schedule
        .client_id
        .and_then(|id| clients.iter().find(|c| c.id == id))
    {
        return client.color.clone();
    }

    if let Some(color) = schedule.color.as_deref().filter(|c| !c.is_empty()) {
        return color.to_string();
    }

    match schedule.schedule_type {
        ScheduleType::Task => defaults.task.clone(),
        ScheduleType::Meeting => defaults.meeting.clone(),
        ScheduleType::Deadline => defaults.deadline.clone(),
    }
}
