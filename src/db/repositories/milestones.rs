use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{optional_date_to_sql, parse_milestone_status, parse_optional_date, parse_optional_datetime},
    models::{Milestone, MilestoneInput, MilestoneStatus},
};

const MILESTONE_COLUMNS: &str =
    "id, project_id, name, description, target_date, status, completed_at, review_completed";

fn row_to_milestone(row: &Row) -> Result<Milestone> {
    let target_date: Option<String> = row.get("target_date")?;
    let status: String = row.get("status")?;
    let completed_at: Option<String> = row.get("completed_at")?;

    Ok(Milestone {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        target_date: parse_optional_date(target_date, "target_date")?,
        status: parse_milestone_status(&status)?,
        completed_at: parse_optional_datetime(completed_at, "completed_at")?,
        review_completed: row.get("review_completed")?,
    })
}

fn fetch_milestone(conn: &Connection, milestone_id: i64) -> Result<Option<Milestone>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![milestone_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_milestone(row)?)),
        None => Ok(None),
    }
}

fn ensure_updated(rows_affected: usize, milestone_id: i64) -> Result<()> {
    if rows_affected == 0 {
        return Err(anyhow!("Milestone {milestone_id} not found"));
    }
    Ok(())
}

impl Database {
    /// Milestones ordered by target date, undated ones last
    pub async fn get_milestones(&self) -> Result<Vec<Milestone>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MILESTONE_COLUMNS} FROM milestones
                 ORDER BY target_date IS NULL, target_date ASC, id ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut milestones = Vec::new();
            while let Some(row) = rows.next()? {
                milestones.push(row_to_milestone(row)?);
            }

            Ok(milestones)
        })
        .await
    }

    pub async fn insert_milestone(&self, input: MilestoneInput) -> Result<Milestone> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO milestones (project_id, name, description, target_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    input.project_id,
                    input.name,
                    input.description,
                    optional_date_to_sql(input.target_date),
                    MilestoneStatus::Pending.as_str(),
                ],
            )?;

            let milestone_id = conn.last_insert_rowid();
            fetch_milestone(conn, milestone_id)?
                .ok_or_else(|| anyhow!("Milestone not found after insert"))
        })
        .await
    }

    pub async fn update_milestone_row(
        &self,
        milestone_id: i64,
        input: MilestoneInput,
    ) -> Result<Milestone> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE milestones
                 SET project_id = ?1, name = ?2, description = ?3, target_date = ?4
                 WHERE id = ?5",
                params![
                    input.project_id,
                    input.name,
                    input.description,
                    optional_date_to_sql(input.target_date),
                    milestone_id,
                ],
            )?;
            ensure_updated(rows_affected, milestone_id)?;

            fetch_milestone(conn, milestone_id)?
                .ok_or_else(|| anyhow!("Milestone not found after update"))
        })
        .await
    }

    pub async fn mark_milestone_status(
        &self,
        milestone_id: i64,
        status: MilestoneStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE milestones SET status = ?1, completed_at = ?2 WHERE id = ?3",
                params![
                    status.as_str(),
                    completed_at.map(|dt| dt.to_rfc3339()),
                    milestone_id,
                ],
            )?;
            ensure_updated(rows_affected, milestone_id)
        })
        .await
    }

    pub async fn mark_milestone_review(&self, milestone_id: i64, review_completed: bool) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE milestones SET review_completed = ?1 WHERE id = ?2",
                params![review_completed, milestone_id],
            )?;
            ensure_updated(rows_affected, milestone_id)
        })
        .await
    }

    pub async fn delete_milestone_row(&self, milestone_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM milestones WHERE id = ?1", params![milestone_id])?;
            ensure_updated(rows_affected, milestone_id)
        })
        .await
    }
}
