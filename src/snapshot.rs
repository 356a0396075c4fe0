//! In-memory copy of everything the dashboard shows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::{Client, DailyMemo, Milestone, Project, Schedule};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub milestones: Vec<Milestone>,
    pub schedules: Vec<Schedule>,
    pub memos: Vec<DailyMemo>,
}

impl Snapshot {
    pub fn client(&self, client_id: i64) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    pub fn project(&self, project_id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn milestone(&self, milestone_id: i64) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == milestone_id)
    }

    pub fn milestone_mut(&mut self, milestone_id: i64) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == milestone_id)
    }

    pub fn schedule(&self, schedule_id: i64) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == schedule_id)
    }

    pub fn schedule_mut(&mut self, schedule_id: i64) -> Option<&mut Schedule> {
        self.schedules.iter_mut().find(|s| s.id == schedule_id)
    }

    pub fn memo(&self, day: NaiveDate) -> Option<&DailyMemo> {
        self.memos.iter().find(|m| m.memo_date == day)
    }

    /// Milestones of every project the client owns.
    pub fn client_milestones(&self, client_id: i64) -> Vec<&Milestone> {
        self.milestones
            .iter()
            .filter(|m| {
                self.project(m.project_id)
                    .is_some_and(|p| p.client_id == client_id)
            })
            .collect()
    }

    /// Label shown above a group of milestones.
    pub fn project_label(&self, project: &Project) -> String {
        match self.client(project.client_id) {
            Some(client) => format!("{} > {}", client.name, project.name),
            None => project.name.clone(),
        }
    }

    /// Drop a client together with its projects and their milestones, the
    /// same cascade the store applies.
    pub fn remove_client(&mut self, client_id: i64) {
        let projects: Vec<i64> = self
            .projects
            .iter()
            .filter(|p| p.client_id == client_id)
            .map(|p| p.id)
            .collect();
        self.clients.retain(|c| c.id != client_id);
        for project_id in projects {
            self.remove_project(project_id);
        }
        for schedule in &mut self.schedules {
            if schedule.client_id == Some(client_id) {
                schedule.client_id = None;
            }
        }
    }

    pub fn remove_project(&mut self, project_id: i64) {
        let milestones: Vec<i64> = self
            .milestones
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| m.id)
            .collect();
        self.projects.retain(|p| p.id != project_id);
        for milestone_id in milestones {
            self.remove_milestone(milestone_id);
        }
    }

    pub fn remove_milestone(&mut self, milestone_id: i64) {
        self.milestones.retain(|m| m.id != milestone_id);
        for schedule in &mut self.schedules {
            schedule.milestone_ids.retain(|id| *id != milestone_id);
            if schedule.milestone_id == Some(milestone_id) {
                schedule.milestone_id = None;
            }
        }
    }

    pub fn upsert_schedule(&mut self, schedule: Schedule) {
        match self.schedule_mut(schedule.id) {
            Some(existing) => *existing = schedule,
            None => self.schedules.push(schedule),
        }
    }
}
