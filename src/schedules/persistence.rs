//! Saving a schedule: header, task items, then milestone promotion.
//!
//! Each step is its own store call and runs strictly after the previous one.
//! A failing step ends the save; steps already done stay done. Saving again
//! converges because existing ids are reused and updates overwrite.

use anyhow::{Context, Result};

use crate::db::models::{Milestone, MilestoneStatus, Schedule, Task};
use crate::error::ValidationError;
use crate::log_debug;
use crate::store::DashboardStore;

use super::diff::{diff_tasks, TaskWrite};
use super::draft::ScheduleDraft;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// Header as stored, with the synced task items attached.
    pub schedule: Schedule,
    pub deleted_tasks: Vec<i64>,
    /// Milestones moved from pending to in-progress by this save.
    pub promoted: Vec<i64>,
}

/// Milestones among `ids` that are still pending. Attaching a schedule means
/// work has started; in-progress or completed milestones are left alone.
pub fn milestones_to_promote(ids: &[i64], milestones: &[Milestone]) -> Vec<i64> {
    ids.iter()
        .copied()
        .filter(|id| {
            milestones
                .iter()
                .any(|m| m.id == *id && m.status == MilestoneStatus::Pending)
        })
        .collect()
}

pub async fn save_schedule(
    store: &dyn DashboardStore,
    draft: &ScheduleDraft,
    previous: Option<&Schedule>,
    milestones: &[Milestone],
) -> Result<SaveOutcome> {
    draft.validate()?;

    let milestone_ids = draft.resolved_milestone_ids();
    if let Some(id) = milestone_ids
        .iter()
        .find(|id| !milestones.iter().any(|m| m.id == **id))
    {
        return Err(ValidationError::UnknownReference {
            kind: "milestone",
            id: *id,
        }
        .into());
    }
    let payload = draft.to_payload(milestone_ids.clone());

    let mut schedule = match draft.id {
        Some(schedule_id) => store
            .update_schedule(schedule_id, payload)
            .await
            .with_context(|| format!("failed to update schedule {schedule_id}"))?,
        None => store
            .create_schedule(payload)
            .await
            .context("failed to create schedule")?,
    };
    let schedule_id = schedule.id;
    log_debug!("Saved schedule header {schedule_id}");

    let previous_tasks: &[Task] = previous.map(|s| s.tasks.as_slice()).unwrap_or(&[]);
    let diff = diff_tasks(previous_tasks, &draft.tasks, draft.has_task);

    for task_id in &diff.deletes {
        store
            .delete_task(*task_id)
            .await
            .with_context(|| format!("failed to delete task {task_id} of schedule {schedule_id}"))?;
    }

    let mut tasks = Vec::with_capacity(diff.writes.len());
    for write in diff.writes {
        let task = match write {
            TaskWrite::Update { task_id, input } => store
                .update_task(task_id, input)
                .await
                .with_context(|| format!("failed to update task {task_id} of schedule {schedule_id}"))?,
            TaskWrite::Create(input) => store
                .create_task(schedule_id, input)
                .await
                .with_context(|| format!("failed to create task for schedule {schedule_id}"))?,
        };
        tasks.push(task);
    }
    log_debug!(
        "Synced tasks for schedule {schedule_id}: {} deleted, {} written",
        diff.deletes.len(),
        tasks.len()
    );
    schedule.tasks = tasks;

    let promoted = milestones_to_promote(&milestone_ids, milestones);
    for milestone_id in &promoted {
        store
            .update_milestone_status(*milestone_id, MilestoneStatus::InProgress, None)
            .await
            .with_context(|| format!("failed to start milestone {milestone_id}"))?;
    }

    Ok(SaveOutcome {
        schedule,
        deleted_tasks: diff.deletes,
        promoted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::db::models::{
        Client, ClientInput, DailyMemo, MilestoneInput, Project, ProjectInput, ProjectStatus,
        SchedulePayload, TaskInput,
    };
    use crate::db::Database;
    use crate::schedules::draft::TaskDraft;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};
    use rusqlite::params;

    /// Delegates to a real database and records every write it forwards.
    struct RecordingStore {
        db: Database,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn new(db: Database) -> Self {
            Self {
                db,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    #[async_trait]
    impl DashboardStore for RecordingStore {
        async fn list_clients(&self) -> Result<Vec<Client>> {
            self.db.list_clients().await
        }
        async fn create_client(&self, input: ClientInput) -> Result<Client> {
            self.record("create_client".into());
            self.db.create_client(input).await
        }
        async fn update_client(&self, client_id: i64, input: ClientInput) -> Result<Client> {
            self.record(format!("update_client {client_id}"));
            self.db.update_client(client_id, input).await
        }
        async fn delete_client(&self, client_id: i64) -> Result<()> {
            self.record(format!("delete_client {client_id}"));
            self.db.delete_client(client_id).await
        }
        async fn list_projects(&self) -> Result<Vec<Project>> {
            self.db.list_projects().await
        }
        async fn create_project(&self, input: ProjectInput) -> Result<Project> {
            self.record("create_project".into());
            self.db.create_project(input).await
        }
        async fn update_project(&self, project_id: i64, input: ProjectInput) -> Result<Project> {
            self.record(format!("update_project {project_id}"));
            self.db.update_project(project_id, input).await
        }
        async fn delete_project(&self, project_id: i64) -> Result<()> {
            self.record(format!("delete_project {project_id}"));
            self.db.delete_project(project_id).await
        }
        async fn list_milestones(&self) -> Result<Vec<Milestone>> {
            self.db.list_milestones().await
        }
        async fn create_milestone(&self, input: MilestoneInput) -> Result<Milestone> {
            self.record("create_milestone".into());
            self.db.create_milestone(input).await
        }
        async fn update_milestone(&self, milestone_id: i64, input: MilestoneInput) -> Result<Milestone> {
            self.record(format!("update_milestone {milestone_id}"));
            self.db.update_milestone(milestone_id, input).await
        }
        async fn update_milestone_status(
            &self,
            milestone_id: i64,
            status: MilestoneStatus,
            completed_at: Option<DateTime<Utc>>,
        ) -> Result<()> {
            self.record(format!("update_milestone_status {milestone_id} {}", status.as_str()));
            self.db
                .update_milestone_status(milestone_id, status, completed_at)
                .await
        }
        async fn set_milestone_review(&self, milestone_id: i64, review_completed: bool) -> Result<()> {
            self.record(format!("set_milestone_review {milestone_id}"));
            self.db.set_milestone_review(milestone_id, review_completed).await
        }
        async fn delete_milestone(&self, milestone_id: i64) -> Result<()> {
            self.record(format!("delete_milestone {milestone_id}"));
            self.db.delete_milestone(milestone_id).await
        }
        async fn list_schedules(&self) -> Result<Vec<Schedule>> {
            self.db.list_schedules().await
        }
        async fn create_schedule(&self, payload: SchedulePayload) -> Result<Schedule> {
            self.record("create_schedule".into());
            self.db.create_schedule(payload).await
        }
        async fn update_schedule(&self, schedule_id: i64, payload: SchedulePayload) -> Result<Schedule> {
            self.record(format!("update_schedule {schedule_id}"));
            self.db.update_schedule(schedule_id, payload).await
        }
        async fn update_schedule_date(&self, schedule_id: i64, schedule_date: NaiveDate) -> Result<()> {
            self.record(format!("update_schedule_date {schedule_id}"));
            self.db.update_schedule_date(schedule_id, schedule_date).await
        }
        async fn set_schedule_completed(&self, schedule_id: i64, is_completed: bool) -> Result<()> {
            self.record(format!("set_schedule_completed {schedule_id}"));
            self.db.set_schedule_completed(schedule_id, is_completed).await
        }
        async fn delete_schedule(&self, schedule_id: i64) -> Result<()> {
            self.record(format!("delete_schedule {schedule_id}"));
            self.db.delete_schedule(schedule_id).await
        }
        async fn create_task(&self, schedule_id: i64, input: TaskInput) -> Result<Task> {
            self.record(format!("create_task {}", input.content));
            self.db.create_task(schedule_id, input).await
        }
        async fn update_task(&self, task_id: i64, input: TaskInput) -> Result<Task> {
            self.record(format!("update_task {task_id}"));
            self.db.update_task(task_id, input).await
        }
        async fn set_task_completed(
            &self,
            task_id: i64,
            is_completed: bool,
            completed_at: Option<DateTime<Utc>>,
        ) -> Result<()> {
            self.record(format!("set_task_completed {task_id}"));
            self.db.set_task_completed(task_id, is_completed, completed_at).await
        }
        async fn delete_task(&self, task_id: i64) -> Result<()> {
            self.record(format!("delete_task {task_id}"));
            self.db.delete_task(task_id).await
        }
        async fn list_memos(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyMemo>> {
            self.db.list_memos(from, to).await
        }
        async fn get_memo(&self, memo_date: NaiveDate) -> Result<Option<DailyMemo>> {
            self.db.get_memo(memo_date).await
        }
        async fn upsert_memo(&self, memo_date: NaiveDate, content: String) -> Result<DailyMemo> {
            self.record(format!("upsert_memo {memo_date}"));
            self.db.upsert_memo(memo_date, content).await
        }
        async fn delete_memo(&self, memo_date: NaiveDate) -> Result<()> {
            self.record(format!("delete_memo {memo_date}"));
            self.db.delete_memo(memo_date).await
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn milestones(db: &Database, count: usize) -> Vec<Milestone> {
        let client = db
            .create_client(ClientInput {
                name: "Acme".into(),
                color: "#ff0000".into(),
                icon: None,
            })
            .await
            .unwrap();
        let project = db
            .create_project(ProjectInput {
                client_id: client.id,
                name: "Launch".into(),
                description: None,
                status: ProjectStatus::Active,
            })
            .await
            .unwrap();
        for n in 0..count {
            db.create_milestone(MilestoneInput {
                project_id: project.id,
                name: format!("M{n}"),
                description: None,
                target_date: None,
            })
            .await
            .unwrap();
        }
        db.list_milestones().await.unwrap()
    }

    #[tokio::test]
    async fn validation_happens_before_any_call() {
        let db = Database::in_memory().unwrap();
        let draft = ScheduleDraft::new(date(2025, 9, 1));

        let err = save_schedule(&db, &draft, None, &[]).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MissingField("title"))
        );
        assert!(db.list_schedules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_then_edit_syncs_tasks() {
        let db = Database::in_memory().unwrap();

        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "Quarter close".into();
        draft.has_task = true;
        draft.tasks = vec![TaskDraft::new("A", None), TaskDraft::new("B", None)];

        let created = save_schedule(&db, &draft, None, &[]).await.unwrap();
        assert_eq!(created.schedule.tasks.len(), 2);
        let (a, b) = (created.schedule.tasks[0].clone(), created.schedule.tasks[1].clone());

        let stored = db.list_schedules().await.unwrap().remove(0);
        let mut edit = ScheduleDraft::from_schedule(&stored);
        edit.tasks = vec![
            TaskDraft {
                id: Some(b.id),
                content: "B edited".into(),
                deadline: Some(date(2025, 9, 3)),
            },
            TaskDraft::new("C", None),
        ];

        let saved = save_schedule(&db, &edit, Some(&stored), &[]).await.unwrap();
        assert_eq!(saved.deleted_tasks, vec![a.id]);

        let reloaded = db.list_schedules().await.unwrap().remove(0);
        let contents: Vec<&str> = reloaded.tasks.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["B edited", "C"]);
        assert_eq!(reloaded.tasks[0].id, b.id);
        assert_eq!(reloaded.tasks[0].order_index, 0);
        assert_eq!(reloaded.tasks[1].order_index, 1);
    }

    #[tokio::test]
    async fn unchecking_has_task_clears_items() {
        let db = Database::in_memory().unwrap();
        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "Errands".into();
        draft.has_task = true;
        draft.tasks = vec![TaskDraft::new("A", None)];
        save_schedule(&db, &draft, None, &[]).await.unwrap();

        let stored = db.list_schedules().await.unwrap().remove(0);
        let mut edit = ScheduleDraft::from_schedule(&stored);
        edit.has_task = false;
        save_schedule(&db, &edit, Some(&stored), &[]).await.unwrap();

        assert!(db.list_schedules().await.unwrap()[0].tasks.is_empty());
    }

    #[tokio::test]
    async fn only_pending_milestones_are_promoted() {
        let db = Database::in_memory().unwrap();
        let all = milestones(&db, 3).await;
        db.update_milestone_status(all[1].id, MilestoneStatus::Completed, None)
            .await
            .unwrap();
        let all = db.list_milestones().await.unwrap();

        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "Kickoff".into();
        draft.milestone_ids = vec![all[0].id, all[1].id];

        let saved = save_schedule(&db, &draft, None, &all).await.unwrap();
        assert_eq!(saved.promoted, vec![all[0].id]);

        let after = db.list_milestones().await.unwrap();
        let status_of = |id: i64| after.iter().find(|m| m.id == id).unwrap().status;
        assert_eq!(status_of(all[0].id), MilestoneStatus::InProgress);
        assert_eq!(status_of(all[1].id), MilestoneStatus::Completed);
        assert_eq!(status_of(all[2].id), MilestoneStatus::Pending);
    }

    #[tokio::test]
    async fn failure_mid_save_keeps_header() {
        let db = Database::in_memory().unwrap();
        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "Audit".into();
        let saved = save_schedule(&db, &draft, None, &[]).await.unwrap();

        // A stale snapshot claims a task item the store no longer has.
        let mut stale = saved.schedule.clone();
        stale.tasks.push(Task {
            id: 4242,
            schedule_id: stale.id,
            content: "gone".into(),
            deadline: None,
            is_completed: false,
            completed_at: None,
            order_index: 0,
        });
        let mut edit = ScheduleDraft::from_schedule(&saved.schedule);
        edit.title = "Audit (renamed)".into();

        let err = save_schedule(&db, &edit, Some(&stale), &[]).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to delete task 4242"));

        let stored = db.list_schedules().await.unwrap().remove(0);
        assert_eq!(stored.title, "Audit (renamed)");
    }

    #[tokio::test]
    async fn edit_issues_one_delete_one_update_one_create() {
        let store = RecordingStore::new(Database::in_memory().unwrap());

        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "Weekly".into();
        draft.has_task = true;
        draft.tasks = vec![TaskDraft::new("A", None), TaskDraft::new("B", None)];
        let created = save_schedule(&store, &draft, None, &[]).await.unwrap();
        let schedule_id = created.schedule.id;
        let (a, b) = (created.schedule.tasks[0].id, created.schedule.tasks[1].id);
        assert_eq!(
            store.take(),
            vec!["create_schedule", "create_task A", "create_task B"]
        );

        let stored = store.list_schedules().await.unwrap().remove(0);
        let mut edit = ScheduleDraft::from_schedule(&stored);
        edit.tasks = vec![
            TaskDraft {
                id: Some(b),
                content: "B edited".into(),
                deadline: None,
            },
            TaskDraft::new("C", None),
        ];
        save_schedule(&store, &edit, Some(&stored), &[]).await.unwrap();

        assert_eq!(
            store.take(),
            vec![
                format!("update_schedule {schedule_id}"),
                format!("delete_task {a}"),
                format!("update_task {b}"),
                "create_task C".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_milestone_rejected_before_any_call() {
        let store = RecordingStore::new(Database::in_memory().unwrap());
        let known = milestones(&store.db, 1).await;
        store.take();

        let mut draft = ScheduleDraft::new(date(2025, 9, 1));
        draft.title = "Kickoff".into();
        draft.milestone_ids = vec![known[0].id, 4242];

        let err = save_schedule(&store, &draft, None, &known).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownReference {
                kind: "milestone",
                id: 4242
            })
        );
        assert!(store.take().is_empty());
        assert!(store.list_schedules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_row_is_migrated_on_save() {
        let db = Database::in_memory().unwrap();
        let all = milestones(&db, 1).await;
        let milestone_id = all[0].id;

        let schedule_id = db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO schedules (title, schedule_date, type, milestone_id, task_content, task_deadline)
                     VALUES ('Taxes', '2025-09-01', 'task', ?1, 'File taxes', '2025-09-05')",
                    params![milestone_id],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .unwrap();

        let stored = db.list_schedules().await.unwrap().remove(0);
        assert_eq!(stored.milestone_id, Some(milestone_id));
        assert!(stored.milestone_ids.is_empty());

        let draft = ScheduleDraft::from_schedule(&stored);
        let saved = save_schedule(&db, &draft, Some(&stored), &all).await.unwrap();
        assert_eq!(saved.promoted, vec![milestone_id]);

        let legacy: (Option<i64>, Option<String>, Option<String>) = db
            .execute(move |conn| {
                Ok(conn.query_row(
                    "SELECT milestone_id, task_content, task_deadline FROM schedules WHERE id = ?1",
                    params![schedule_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(legacy, (None, None, None));

        let reloaded = db.list_schedules().await.unwrap().remove(0);
        assert_eq!(reloaded.milestone_ids, vec![milestone_id]);
        assert_eq!(reloaded.tasks.len(), 1);
        assert_eq!(reloaded.tasks[0].content, "File taxes");
        assert_eq!(reloaded.tasks[0].deadline, Some(date(2025, 9, 5)));
    }
}
