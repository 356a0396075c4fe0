use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::db::models::schedule::{format_time, parse_time};
use crate::db::models::{MilestoneStatus, ProjectStatus, ScheduleType};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn parse_optional_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw, field).map(Some),
    }
}

pub fn parse_optional_time(value: Option<String>, field: &str) -> Result<Option<NaiveTime>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_time(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("failed to parse {field} '{raw}'")),
    }
}

pub fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn optional_date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(date_to_sql)
}

pub fn optional_time_to_sql(time: Option<NaiveTime>) -> Option<String> {
    time.as_ref().map(format_time)
}

pub fn parse_milestone_status(value: &str) -> Result<MilestoneStatus> {
    match value {
        "pending" => Ok(MilestoneStatus::Pending),
        "in_progress" => Ok(MilestoneStatus::InProgress),
        "review_pending" => Ok(MilestoneStatus::ReviewPending),
        "completed" => Ok(MilestoneStatus::Completed),
        other => Err(anyhow!("unknown milestone status {other}")),
    }
}

pub fn parse_project_status(value: &str) -> Result<ProjectStatus> {
    match value {
        "active" => Ok(ProjectStatus::Active),
        "completed" => Ok(ProjectStatus::Completed),
        "on_hold" => Ok(ProjectStatus::OnHold),
        "cancelled" => Ok(ProjectStatus::Cancelled),
        other => Err(anyhow!("unknown project status {other}")),
    }
}

pub fn parse_schedule_type(value: &str) -> Result<ScheduleType> {
    match value {
        "task" => Ok(ScheduleType::Task),
        "meeting" => Ok(ScheduleType::Meeting),
        "deadline" => Ok(ScheduleType::Deadline),
        other => Err(anyhow!("unknown schedule type {other}")),
    }
}
