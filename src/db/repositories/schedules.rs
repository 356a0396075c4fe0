use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{
        date_to_sql, optional_date_to_sql, optional_time_to_sql, parse_date,
        parse_optional_date, parse_optional_datetime, parse_optional_time, parse_schedule_type,
    },
    models::{Schedule, SchedulePayload, Task, TaskInput},
};

const SCHEDULE_COLUMNS: &str = "id, title, description, schedule_date, end_date, start_time, end_time, \
     type, color, client_id, milestone_id, is_completed, email_reminder, \
     task_content, task_deadline, task_completed";

const TASK_COLUMNS: &str =
    "id, schedule_id, content, deadline, is_completed, completed_at, order_index";

fn row_to_schedule(row: &Row) -> Result<Schedule> {
    let schedule_date: String = row.get("schedule_date")?;
    let end_date: Option<String> = row.get("end_date")?;
    let start_time: Option<String> = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let schedule_type: String = row.get("type")?;
    let task_deadline: Option<String> = row.get("task_deadline")?;

    Ok(Schedule {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        schedule_date: parse_date(&schedule_date, "schedule_date")?,
        end_date: parse_optional_date(end_date, "end_date")?,
        start_time: parse_optional_time(start_time, "start_time")?,
        end_time: parse_optional_time(end_time, "end_time")?,
        schedule_type: parse_schedule_type(&schedule_type)?,
        color: row.get("color")?,
        client_id: row.get("client_id")?,
        milestone_id: row.get("milestone_id")?,
        milestone_ids: Vec::new(),
        is_completed: row.get("is_completed")?,
        email_reminder: row.get("email_reminder")?,
        task_content: row.get("task_content")?,
        task_deadline: parse_optional_date(task_deadline, "task_deadline")?,
        task_completed: row.get("task_completed")?,
        tasks: Vec::new(),
    })
}

fn row_to_task(row: &Row) -> Result<Task> {
    let deadline: Option<String> = row.get("deadline")?;
    let completed_at: Option<String> = row.get("completed_at")?;

    Ok(Task {
        id: row.get("id")?,
        schedule_id: row.get("schedule_id")?,
        content: row.get("content")?,
        deadline: parse_optional_date(deadline, "deadline")?,
        is_completed: row.get("is_completed")?,
        completed_at: parse_optional_datetime(completed_at, "completed_at")?,
        order_index: row.get("order_index")?,
    })
}

fn load_tasks(conn: &Connection, schedule_id: Option<i64>) -> Result<HashMap<i64, Vec<Task>>> {
    let mut grouped: HashMap<i64, Vec<Task>> = HashMap::new();
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM schedule_tasks
         WHERE ?1 IS NULL OR schedule_id = ?1
         ORDER BY schedule_id ASC, order_index ASC, id ASC"
    ))?;

    let mut rows = stmt.query(params![schedule_id])?;
    while let Some(row) = rows.next()? {
        let task = row_to_task(row)?;
        grouped.entry(task.schedule_id).or_default().push(task);
    }
    Ok(grouped)
}

fn load_milestone_links(conn: &Connection, schedule_id: Option<i64>) -> Result<HashMap<i64, Vec<i64>>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT schedule_id, milestone_id FROM schedule_milestones
         WHERE ?1 IS NULL OR schedule_id = ?1
         ORDER BY schedule_id ASC, position ASC",
    )?;

    let mut rows = stmt.query(params![schedule_id])?;
    while let Some(row) = rows.next()? {
        let schedule: i64 = row.get(0)?;
        let milestone: i64 = row.get(1)?;
        grouped.entry(schedule).or_default().push(milestone);
    }
    Ok(grouped)
}

fn fetch_schedule(conn: &Connection, schedule_id: i64) -> Result<Schedule> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![schedule_id])?;
    let mut schedule = match rows.next()? {
        Some(row) => row_to_schedule(row)?,
        None => return Err(anyhow!("Schedule {schedule_id} not found")),
    };

    schedule.tasks = load_tasks(conn, Some(schedule_id))?
        .remove(&schedule_id)
        .unwrap_or_default();
    schedule.milestone_ids = load_milestone_links(conn, Some(schedule_id))?
        .remove(&schedule_id)
        .unwrap_or_default();
    Ok(schedule)
}

fn replace_milestone_links(conn: &Connection, schedule_id: i64, milestone_ids: &[i64]) -> Result<()> {
    conn.execute(
        "DELETE FROM schedule_milestones WHERE schedule_id = ?1",
        params![schedule_id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO schedule_milestones (schedule_id, milestone_id, position)
         VALUES (?1, ?2, ?3)",
    )?;
    for (position, milestone_id) in milestone_ids.iter().enumerate() {
        stmt.execute(params![schedule_id, milestone_id, position as i64])?;
    }
    Ok(())
}

fn fetch_task(conn: &Connection, task_id: i64) -> Result<Task> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM schedule_tasks WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![task_id])?;
    match rows.next()? {
        Some(row) => row_to_task(row),
        None => Err(anyhow!("Task {task_id} not found")),
    }
}

impl Database {
    /// All schedules with their task items and milestone links attached
    pub async fn get_schedules(&self) -> Result<Vec<Schedule>> {
        self.execute(|conn| {
            let mut tasks = load_tasks(conn, None)?;
            let mut links = load_milestone_links(conn, None)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY schedule_date ASC, id ASC"
            ))?;
            let mut rows = stmt.query([])?;
            let mut schedules = Vec::new();
            while let Some(row) = rows.next()? {
                let mut schedule = row_to_schedule(row)?;
                schedule.tasks = tasks.remove(&schedule.id).unwrap_or_default();
                schedule.milestone_ids = links.remove(&schedule.id).unwrap_or_default();
                schedules.push(schedule);
            }

            Ok(schedules)
        })
        .await
    }

    pub async fn insert_schedule(&self, payload: SchedulePayload) -> Result<Schedule> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO schedules (title, description, schedule_date, end_date, start_time, end_time,
                                        type, color, client_id, email_reminder)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    payload.title,
                    payload.description,
                    date_to_sql(payload.schedule_date),
                    optional_date_to_sql(payload.end_date),
                    optional_time_to_sql(payload.start_time),
                    optional_time_to_sql(payload.end_time),
                    payload.schedule_type.as_str(),
                    payload.color,
                    payload.client_id,
                    payload.email_reminder,
                ],
            )?;

            let schedule_id = tx.last_insert_rowid();
            replace_milestone_links(&tx, schedule_id, &payload.milestone_ids)?;
            let schedule = fetch_schedule(&tx, schedule_id)?;
            tx.commit()?;
            Ok(schedule)
        })
        .await
    }

    /// Rewrites the header, nulls the single-valued legacy fields and replaces
    /// milestone links in one transaction. Completion state is kept.
    pub async fn update_schedule_row(
        &self,
        schedule_id: i64,
        payload: SchedulePayload,
    ) -> Result<Schedule> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let rows_affected = tx.execute(
                "UPDATE schedules
                 SET title = ?1,
                     description = ?2,
                     schedule_date = ?3,
                     end_date = ?4,
                     start_time = ?5,
                     end_time = ?6,
                     type = ?7,
                     color = ?8,
                     client_id = ?9,
                     email_reminder = ?10,
                     milestone_id = NULL,
                     task_content = NULL,
                     task_deadline = NULL
                 WHERE id = ?11",
                params![
                    payload.title,
                    payload.description,
                    date_to_sql(payload.schedule_date),
                    optional_date_to_sql(payload.end_date),
                    optional_time_to_sql(payload.start_time),
                    optional_time_to_sql(payload.end_time),
                    payload.schedule_type.as_str(),
                    payload.color,
                    payload.client_id,
                    payload.email_reminder,
                    schedule_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Schedule {schedule_id} not found"));
            }

            replace_milestone_links(&tx, schedule_id, &payload.milestone_ids)?;
            let schedule = fetch_schedule(&tx, schedule_id)?;
            tx.commit()?;
            Ok(schedule)
        })
        .await
    }

    pub async fn update_schedule_date_row(
        &self,
        schedule_id: i64,
        schedule_date: NaiveDate,
    ) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE schedules SET schedule_date = ?1 WHERE id = ?2",
                params![date_to_sql(schedule_date), schedule_id],
            )?;
            if rows_affected == 0 {
                return Err(anyhow!("Schedule {schedule_id} not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn mark_schedule_completed(&self, schedule_id: i64, is_completed: bool) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE schedules SET is_completed = ?1 WHERE id = ?2",
                params![is_completed, schedule_id],
            )?;
            if rows_affected == 0 {
                return Err(anyhow!("Schedule {schedule_id} not found"));
            }
            Ok(())
        })
        .await
    }

    /// Task items and milestone links go with the schedule.
    pub async fn delete_schedule_row(&self, schedule_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM schedules WHERE id = ?1", params![schedule_id])?;
            if rows_affected == 0 {
                return Err(anyhow!("Schedule {schedule_id} not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn insert_task(&self, schedule_id: i64, input: TaskInput) -> Result<Task> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO schedule_tasks (schedule_id, content, deadline, order_index)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    schedule_id,
                    input.content,
                    optional_date_to_sql(input.deadline),
                    input.order_index,
                ],
            )?;
            fetch_task(conn, conn.last_insert_rowid())
        })
        .await
    }

    pub async fn update_task_row(&self, task_id: i64, input: TaskInput) -> Result<Task> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE schedule_tasks SET content = ?1, deadline = ?2, order_index = ?3 WHERE id = ?4",
                params![
                    input.content,
                    optional_date_to_sql(input.deadline),
                    input.order_index,
                    task_id,
                ],
            )?;
            if rows_affected == 0 {
                return Err(anyhow!("Task {task_id} not found"));
            }
            fetch_task(conn, task_id)
        })
        .await
    }

    pub async fn mark_task_completed(
        &self,
        task_id: i64,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE schedule_tasks SET is_completed = ?1, completed_at = ?2 WHERE id = ?3",
                params![is_completed, completed_at.map(|dt| dt.to_rfc3339()), task_id],
            )?;
            if rows_affected == 0 {
                return Err(anyhow!("Task {task_id} not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn delete_task_row(&self, task_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM schedule_tasks WHERE id = ?1", params![task_id])?;
            if rows_affected == 0 {
                return Err(anyhow!("Task {task_id} not found"));
            }
            Ok(())
        })
        .await
    }
}
