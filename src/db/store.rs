use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::store::DashboardStore;

use super::{
    connection::Database,
    models::{
        Client, ClientInput, DailyMemo, Milestone, MilestoneInput, MilestoneStatus, Project,
        ProjectInput, Schedule, SchedulePayload, Task, TaskInput,
    },
};

#[async_trait]
impl DashboardStore for Database {
    async fn list_clients(&self) -> Result<Vec<Client>> {
        self.get_clients().await
    }

    async fn create_client(&self, input: ClientInput) -> Result<Client> {
        self.insert_client(input).await
    }

    async fn update_client(&self, client_id: i64, input: ClientInput) -> Result<Client> {
        self.update_client_row(client_id, input).await
    }

    async fn delete_client(&self, client_id: i64) -> Result<()> {
        self.delete_client_row(client_id).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_projects().await
    }

    async fn create_project(&self, input: ProjectInput) -> Result<Project> {
        self.insert_project(input).await
    }

    async fn update_project(&self, project_id: i64, input: ProjectInput) -> Result<Project> {
        self.update_project_row(project_id, input).await
    }

    async fn delete_project(&self, project_id: i64) -> Result<()> {
        self.delete_project_row(project_id).await
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>> {
        self.get_milestones().await
    }

    async fn create_milestone(&self, input: MilestoneInput) -> Result<Milestone> {
        self.insert_milestone(input).await
    }

    async fn update_milestone(
        &self,
        milestone_id: i64,
        input: MilestoneInput,
    ) -> Result<Milestone> {
        self.update_milestone_row(milestone_id, input).await
    }

    async fn update_milestone_status(
        &self,
        milestone_id: i64,
        status: MilestoneStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.mark_milestone_status(milestone_id, status, completed_at)
            .await
    }

    async fn set_milestone_review(&self, milestone_id: i64, review_completed: bool) -> Result<()> {
        self.mark_milestone_review(milestone_id, review_completed)
            .await
    }

    async fn delete_milestone(&self, milestone_id: i64) -> Result<()> {
        self.delete_milestone_row(milestone_id).await
    }

    async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        self.get_schedules().await
    }

    async fn create_schedule(&self, payload: SchedulePayload) -> Result<Schedule> {
        self.insert_schedule(payload).await
    }

    async fn update_schedule(
        &self,
        schedule_id: i64,
        payload: SchedulePayload,
    ) -> Result<Schedule> {
        self.update_schedule_row(schedule_id, payload).await
    }

    async fn update_schedule_date(&self, schedule_id: i64, schedule_date: NaiveDate) -> Result<()> {
        self.update_schedule_date_row(schedule_id, schedule_date)
            .await
    }

    async fn set_schedule_completed(&self, schedule_id: i64, is_completed: bool) -> Result<()> {
        self.mark_schedule_completed(schedule_id, is_completed)
            .await
    }

    async fn delete_schedule(&self, schedule_id: i64) -> Result<()> {
        self.delete_schedule_row(schedule_id).await
    }

    async fn create_task(&self, schedule_id: i64, input: TaskInput) -> Result<Task> {
        self.insert_task(schedule_id, input).await
    }

    async fn update_task(&self, task_id: i64, input: TaskInput) -> Result<Task> {
        self.update_task_row(task_id, input).await
    }

    async fn set_task_completed(
        &self,
        task_id: i64,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.mark_task_completed(task_id, is_completed, completed_at)
            .await
    }

    async fn delete_task(&self, task_id: i64) -> Result<()> {
        self.delete_task_row(task_id).await
    }

    async fn list_memos(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyMemo>> {
        self.get_memos_between(from, to).await
    }

    async fn get_memo(&self, memo_date: NaiveDate) -> Result<Option<DailyMemo>> {
        self.get_memo_row(memo_date).await
    }

    async fn upsert_memo(&self, memo_date: NaiveDate, content: String) -> Result<DailyMemo> {
        self.upsert_memo_row(memo_date, content).await
    }

    async fn delete_memo(&self, memo_date: NaiveDate) -> Result<()> {
        self.delete_memo_row(memo_date).await
    }
}
