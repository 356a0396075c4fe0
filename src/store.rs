//! Record store abstraction.
//!
//! Every method is one independent call against the backing store. Callers
//! sequence them; nothing here spans a transaction across calls.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::models::{
    Client, ClientInput, DailyMemo, Milestone, MilestoneInput, MilestoneStatus, Project,
    ProjectInput, Schedule, SchedulePayload, Task, TaskInput,
};

#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>>;
    async fn create_client(&self, input: ClientInput) -> Result<Client>;
    async fn update_client(&self, client_id: i64, input: ClientInput) -> Result<Client>;
    /// Also removes the client's projects and their milestones.
    async fn delete_client(&self, client_id: i64) -> Result<()>;

    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn create_project(&self, input: ProjectInput) -> Result<Project>;
    async fn update_project(&self, project_id: i64, input: ProjectInput) -> Result<Project>;
    async fn delete_project(&self, project_id: i64) -> Result<()>;

    async fn list_milestones(&self) -> Result<Vec<Milestone>>;
    async fn create_milestone(&self, input: MilestoneInput) -> Result<Milestone>;
    async fn update_milestone(&self, milestone_id: i64, input: MilestoneInput)
        -> Result<Milestone>;
    async fn update_milestone_status(
        &self,
        milestone_id: i64,
        status: MilestoneStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
    async fn set_milestone_review(&self, milestone_id: i64, review_completed: bool) -> Result<()>;
    async fn delete_milestone(&self, milestone_id: i64) -> Result<()>;

    /// Schedules with their task items and milestone links attached.
    async fn list_schedules(&self) -> Result<Vec<Schedule>>;
    async fn create_schedule(&self, payload: SchedulePayload) -> Result<Schedule>;
    async fn update_schedule(&self, schedule_id: i64, payload: SchedulePayload)
        -> Result<Schedule>;
    /// Partial update touching `schedule_date` only.
    async fn update_schedule_date(&self, schedule_id: i64, schedule_date: NaiveDate) -> Result<()>;
    async fn set_schedule_completed(&self, schedule_id: i64, is_completed: bool) -> Result<()>;
    async fn delete_schedule(&self, schedule_id: i64) -> Result<()>;

    async fn create_task(&self, schedule_id: i64, input: TaskInput) -> Result<Task>;
    async fn update_task(&self, task_id: i64, input: TaskInput) -> Result<Task>;
    async fn set_task_completed(
        &self,
        task_id: i64,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
    async fn delete_task(&self, task_id: i64) -> Result<()>;

    async fn list_memos(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyMemo>>;
    async fn get_memo(&self, memo_date: NaiveDate) -> Result<Option<DailyMemo>>;
    async fn upsert_memo(&self, memo_date: NaiveDate, content: String) -> Result<DailyMemo>;
    async fn delete_memo(&self, memo_date: NaiveDate) -> Result<()>;
}
