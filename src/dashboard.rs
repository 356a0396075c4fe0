//! The dashboard session: a store handle, the snapshot it renders from, and
//! the in-flight guards its toggle handlers share.
//!
//! Store calls are always made with the snapshot unlocked. The snapshot is
//! updated from the store's answer afterwards.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::calendar::{dates, day_agenda, week_agenda, DayAgenda};
use crate::db::models::{
    Client, ClientInput, DailyMemo, Milestone, MilestoneInput, MilestoneStatus, Project,
    ProjectInput, Schedule,
};
use crate::error::{require, ValidationError};
use crate::inflight::InFlightRegistry;
use crate::insights::{key_plans, progress_for_all, ClientProgress, KeyPlans};
use crate::milestones::{apply_status_change, has_schedules, plan_status_change, StatusChange};
use crate::schedules::{relocate, save_schedule, Relocation, SaveOutcome, ScheduleDraft};
use crate::settings::DashboardSettings;
use crate::snapshot::Snapshot;
use crate::store::DashboardStore;
use crate::{log_debug, log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// What became of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle<T> {
    Applied(T),
    /// A request for the same record was still outstanding.
    Ignored,
}

impl<T> Toggle<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Toggle::Applied(value) => Some(value),
            Toggle::Ignored => None,
        }
    }
}

fn unknown(kind: &'static str, id: i64) -> anyhow::Error {
    ValidationError::UnknownReference { kind, id }.into()
}

#[derive(Clone)]
pub struct Dashboard {
    store: Arc<dyn DashboardStore>,
    snapshot: Arc<Mutex<Snapshot>>,
    inflight: InFlightRegistry,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(store: Arc<dyn DashboardStore>, settings: DashboardSettings) -> Self {
        Self {
            store,
            snapshot: Arc::new(Mutex::new(Snapshot::default())),
            inflight: InFlightRegistry::default(),
            settings,
        }
    }

    /// Build a session and load its first snapshot.
    pub async fn load(store: Arc<dyn DashboardStore>, settings: DashboardSettings) -> Result<Self> {
        let dashboard = Self::new(store, settings);
        dashboard.refresh().await?;
        Ok(dashboard)
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn inflight(&self) -> &InFlightRegistry {
        &self.inflight
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().await.clone()
    }

    /// Reload everything. Memos are loaded for the visible month grid around
    /// today.
    pub async fn refresh(&self) -> Result<()> {
        let clients = self.store.list_clients().await.context("failed to load clients")?;
        let projects = self.store.list_projects().await.context("failed to load projects")?;
        let milestones = self
            .store
            .list_milestones()
            .await
            .context("failed to load milestones")?;
        let schedules = self
            .store
            .list_schedules()
            .await
            .context("failed to load schedules")?;

        let (first, last) = dates::month_range(dates::today());
        let from = dates::week_start(first);
        let to = dates::week_start(last) + Duration::days(6);
        let memos = self
            .store
            .list_memos(from, to)
            .await
            .context("failed to load memos")?;

        log_info!(
            "Loaded {} clients, {} projects, {} milestones, {} schedules",
            clients.len(),
            projects.len(),
            milestones.len(),
            schedules.len()
        );

        *self.snapshot.lock().await = Snapshot {
            clients,
            projects,
            milestones,
            schedules,
            memos,
        };
        Ok(())
    }

    // Clients and projects

    pub async fn create_client(&self, mut input: ClientInput) -> Result<Client> {
        input.name = require(&input.name, "name")?;
        let client = self
            .store
            .create_client(input)
            .await
            .context("failed to create client")?;
        self.snapshot.lock().await.clients.push(client.clone());
        Ok(client)
    }

    pub async fn update_client(&self, client_id: i64, mut input: ClientInput) -> Result<Client> {
        input.name = require(&input.name, "name")?;
        if self.snapshot.lock().await.client(client_id).is_none() {
            return Err(unknown("client", client_id));
        }
        let client = self
            .store
            .update_client(client_id, input)
            .await
            .with_context(|| format!("failed to update client {client_id}"))?;

        let mut snapshot = self.snapshot.lock().await;
        if let Some(existing) = snapshot.clients.iter_mut().find(|c| c.id == client_id) {
            *existing = client.clone();
        }
        Ok(client)
    }

    /// Removes the client's projects and milestones as well.
    pub async fn delete_client(&self, client_id: i64) -> Result<()> {
        self.store
            .delete_client(client_id)
            .await
            .with_context(|| format!("failed to delete client {client_id}"))?;
        self.snapshot.lock().await.remove_client(client_id);
        log_info!("Deleted client {client_id}");
        Ok(())
    }

    pub async fn create_project(&self, mut input: ProjectInput) -> Result<Project> {
        input.name = require(&input.name, "name")?;
        if self.snapshot.lock().await.client(input.client_id).is_none() {
            return Err(unknown("client", input.client_id));
        }
        let project = self
            .store
            .create_project(input)
            .await
            .context("failed to create project")?;
        self.snapshot.lock().await.projects.push(project.clone());
        Ok(project)
    }

    pub async fn update_project(&self, project_id: i64, mut input: ProjectInput) -> Result<Project> {
        input.name = require(&input.name, "name")?;
        {
            let snapshot = self.snapshot.lock().await;
            if snapshot.project(project_id).is_none() {
                return Err(unknown("project", project_id));
            }
            if snapshot.client(input.client_id).is_none() {
                return Err(unknown("client", input.client_id));
            }
        }
        let project = self
            .store
            .update_project(project_id, input)
            .await
            .with_context(|| format!("failed to update project {project_id}"))?;

        let mut snapshot = self.snapshot.lock().await;
        if let Some(existing) = snapshot.projects.iter_mut().find(|p| p.id == project_id) {
            *existing = project.clone();
        }
        Ok(project)
    }

    pub async fn delete_project(&self, project_id: i64) -> Result<()> {
        self.store
            .delete_project(project_id)
            .await
            .with_context(|| format!("failed to delete project {project_id}"))?;
        self.snapshot.lock().await.remove_project(project_id);
        Ok(())
    }

    // Milestones

    pub async fn create_milestone(&self, mut input: MilestoneInput) -> Result<Milestone> {
        input.name = require(&input.name, "name")?;
        if self.snapshot.lock().await.project(input.project_id).is_none() {
            return Err(unknown("project", input.project_id));
        }
        let milestone = self
            .store
            .create_milestone(input)
            .await
            .context("failed to create milestone")?;
        self.snapshot.lock().await.milestones.push(milestone.clone());
        Ok(milestone)
    }

    pub async fn update_milestone(&self, milestone_id: i64, mut input: MilestoneInput) -> Result<Milestone> {
        input.name = require(&input.name, "name")?;
        {
            let snapshot = self.snapshot.lock().await;
            if snapshot.milestone(milestone_id).is_none() {
                return Err(unknown("milestone", milestone_id));
            }
            if snapshot.project(input.project_id).is_none() {
                return Err(unknown("project", input.project_id));
            }
        }
        let milestone = self
            .store
            .update_milestone(milestone_id, input)
            .await
            .with_context(|| format!("failed to update milestone {milestone_id}"))?;

        if let Some(existing) = self.snapshot.lock().await.milestone_mut(milestone_id) {
            *existing = milestone.clone();
        }
        Ok(milestone)
    }

    pub async fn delete_milestone(&self, milestone_id: i64) -> Result<()> {
        self.store
            .delete_milestone(milestone_id)
            .await
            .with_context(|| format!("failed to delete milestone {milestone_id}"))?;
        self.snapshot.lock().await.remove_milestone(milestone_id);
        Ok(())
    }

    /// Rotate the milestone's status once. A review-pending milestone with
    /// no schedules stays put and no call is made.
    pub async fn toggle_milestone_status(&self, milestone_id: i64) -> Result<Toggle<StatusChange>> {
        let Some(_token) = self.inflight.milestones.try_begin(milestone_id) else {
            log_debug!("Milestone {milestone_id} toggle ignored, request in flight");
            return Ok(Toggle::Ignored);
        };

        let change = {
            let snapshot = self.snapshot.lock().await;
            let milestone = snapshot
                .milestone(milestone_id)
                .ok_or_else(|| unknown("milestone", milestone_id))?;
            let scheduled = has_schedules(milestone_id, &snapshot.schedules);
            plan_status_change(milestone.status, scheduled, Utc::now())
        };

        if change.is_noop() {
            return Ok(Toggle::Applied(change));
        }

        if let Err(err) = self
            .store
            .update_milestone_status(milestone_id, change.to, change.completed_at)
            .await
        {
            log_warn!("Milestone {milestone_id} status change failed: {err:#}");
            return Err(err.context(format!("failed to update milestone {milestone_id} status")));
        }

        if let Some(milestone) = self.snapshot.lock().await.milestone_mut(milestone_id) {
            apply_status_change(milestone, &change);
        }
        log_debug!(
            "Milestone {milestone_id}: {} -> {}",
            change.from.as_str(),
            change.to.as_str()
        );
        Ok(Toggle::Applied(change))
    }

    /// Flip the review flag. Status is not touched.
    pub async fn toggle_milestone_review(&self, milestone_id: i64) -> Result<Toggle<bool>> {
        let Some(_token) = self.inflight.reviews.try_begin(milestone_id) else {
            return Ok(Toggle::Ignored);
        };

        let next = {
            let snapshot = self.snapshot.lock().await;
            let milestone = snapshot
                .milestone(milestone_id)
                .ok_or_else(|| unknown("milestone", milestone_id))?;
            !milestone.review_completed
        };

        self.store
            .set_milestone_review(milestone_id, next)
            .await
            .with_context(|| format!("failed to update milestone {milestone_id} review"))?;

        if let Some(milestone) = self.snapshot.lock().await.milestone_mut(milestone_id) {
            milestone.review_completed = next;
        }
        Ok(Toggle::Applied(next))
    }

    // Schedules

    /// Run the save sequence for a draft. The stored task items and known
    /// milestones are read from the snapshot before the first call, and
    /// references to records missing from it are rejected there.
    pub async fn save_schedule(&self, draft: &ScheduleDraft) -> Result<SaveOutcome> {
        let (previous, milestones) = {
            let snapshot = self.snapshot.lock().await;
            let previous = match draft.id {
                Some(id) => Some(snapshot.schedule(id).cloned().ok_or_else(|| unknown("schedule", id))?),
                None => None,
            };
            if let Some(client_id) = draft.client_id {
                if snapshot.client(client_id).is_none() {
                    return Err(unknown("client", client_id));
                }
            }
            (previous, snapshot.milestones.clone())
        };

        let outcome = match save_schedule(self.store.as_ref(), draft, previous.as_ref(), &milestones).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log_warn!("Saving schedule failed: {err:#}");
                return Err(err);
            }
        };

        let mut snapshot = self.snapshot.lock().await;
        snapshot.upsert_schedule(outcome.schedule.clone());
        for milestone_id in &outcome.promoted {
            if let Some(milestone) = snapshot.milestone_mut(*milestone_id) {
                milestone.status = MilestoneStatus::InProgress;
            }
        }
        log_info!(
            "Saved schedule {} ({} tasks, {} milestones started)",
            outcome.schedule.id,
            outcome.schedule.tasks.len(),
            outcome.promoted.len()
        );
        Ok(outcome)
    }

    pub async fn delete_schedule(&self, schedule_id: i64) -> Result<()> {
        self.store
            .delete_schedule(schedule_id)
            .await
            .with_context(|| format!("failed to delete schedule {schedule_id}"))?;
        self.snapshot
            .lock()
            .await
            .schedules
            .retain(|s| s.id != schedule_id);
        Ok(())
    }

    /// Drop handler for a schedule dragged onto `target`.
    pub async fn relocate_schedule(&self, schedule_id: i64, target: NaiveDate) -> Result<Relocation> {
        let schedule: Schedule = self
            .snapshot
            .lock()
            .await
            .schedule(schedule_id)
            .cloned()
            .ok_or_else(|| unknown("schedule", schedule_id))?;

        let relocation = relocate(self.store.as_ref(), &schedule, target).await?;
        if let Relocation::Moved { to, .. } = relocation {
            if let Some(stored) = self.snapshot.lock().await.schedule_mut(schedule_id) {
                stored.schedule_date = to;
            }
        }
        Ok(relocation)
    }

    pub async fn toggle_schedule_completed(&self, schedule_id: i64) -> Result<Toggle<bool>> {
        let Some(_token) = self.inflight.schedules.try_begin(schedule_id) else {
            return Ok(Toggle::Ignored);
        };

        let next = !self
            .snapshot
            .lock()
            .await
            .schedule(schedule_id)
            .ok_or_else(|| unknown("schedule", schedule_id))?
            .is_completed;

        self.store
            .set_schedule_completed(schedule_id, next)
            .await
            .with_context(|| format!("failed to update schedule {schedule_id}"))?;

        if let Some(schedule) = self.snapshot.lock().await.schedule_mut(schedule_id) {
            schedule.is_completed = next;
        }
        Ok(Toggle::Applied(next))
    }

    /// Flip a task item. Completing stamps the time; reopening clears it.
    pub async fn toggle_task_completed(&self, task_id: i64) -> Result<Toggle<bool>> {
        let Some(_token) = self.inflight.tasks.try_begin(task_id) else {
            return Ok(Toggle::Ignored);
        };

        let next = {
            let snapshot = self.snapshot.lock().await;
            let task = snapshot
                .schedules
                .iter()
                .flat_map(|s| s.tasks.iter())
                .find(|t| t.id == task_id)
                .ok_or_else(|| unknown("task", task_id))?;
            !task.is_completed
        };
        let completed_at = next.then(Utc::now);

        self.store
            .set_task_completed(task_id, next, completed_at)
            .await
            .with_context(|| format!("failed to update task {task_id}"))?;

        let mut snapshot = self.snapshot.lock().await;
        if let Some(task) = snapshot
            .schedules
            .iter_mut()
            .flat_map(|s| s.tasks.iter_mut())
            .find(|t| t.id == task_id)
        {
            task.is_completed = next;
            task.completed_at = completed_at;
        }
        Ok(Toggle::Applied(next))
    }

    // Memos

    /// The memo for `day`, from the snapshot when loaded, else from the store.
    pub async fn memo(&self, day: NaiveDate) -> Result<Option<DailyMemo>> {
        if let Some(memo) = self.snapshot.lock().await.memo(day) {
            return Ok(Some(memo.clone()));
        }
        self.store
            .get_memo(day)
            .await
            .with_context(|| format!("failed to load memo for {day}"))
    }

    /// Blank content removes the memo for that day.
    pub async fn set_memo(&self, day: NaiveDate, content: &str) -> Result<Option<DailyMemo>> {
        let content = content.trim();
        if content.is_empty() {
            self.store
                .delete_memo(day)
                .await
                .with_context(|| format!("failed to delete memo for {day}"))?;
            self.snapshot.lock().await.memos.retain(|m| m.memo_date != day);
            return Ok(None);
        }

        let memo = self
            .store
            .upsert_memo(day, content.to_string())
            .await
            .with_context(|| format!("failed to save memo for {day}"))?;

        let mut snapshot = self.snapshot.lock().await;
        snapshot.memos.retain(|m| m.memo_date != day);
        snapshot.memos.push(memo.clone());
        Ok(Some(memo))
    }

    // Views

    pub async fn day_agenda(&self, day: NaiveDate) -> DayAgenda {
        let snapshot = self.snapshot.lock().await;
        day_agenda(&snapshot, day, &self.settings.default_colors)
    }

    pub async fn week_agenda(&self, day: NaiveDate) -> Vec<DayAgenda> {
        let snapshot = self.snapshot.lock().await;
        week_agenda(&snapshot, day, &self.settings.default_colors)
    }

    pub async fn key_plans(&self, today: NaiveDate) -> KeyPlans {
        let snapshot = self.snapshot.lock().await;
        key_plans(&snapshot, today, self.settings.key_plan_horizon_days)
    }

    pub async fn progress(&self, today: NaiveDate) -> Vec<ClientProgress> {
        let snapshot = self.snapshot.lock().await;
        progress_for_all(&snapshot, today)
    }
}
