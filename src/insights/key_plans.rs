//! Overdue and upcoming milestones, grouped by project for display.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::models::{Milestone, MilestoneStatus};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPlanGroup {
    pub project_id: i64,
    /// `{client} > {project}`.
    pub label: String,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPlans {
    pub overdue: Vec<KeyPlanGroup>,
    pub upcoming: Vec<KeyPlanGroup>,
}

impl KeyPlans {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.upcoming.is_empty()
    }
}

fn open_with_date(m: &Milestone) -> Option<NaiveDate> {
    if m.status == MilestoneStatus::Completed {
        return None;
    }
    m.target_date
}

pub fn overdue_milestones(milestones: &[Milestone], today: NaiveDate) -> Vec<&Milestone> {
    let mut overdue: Vec<&Milestone> = milestones
        .iter()
        .filter(|m| open_with_date(m).is_some_and(|d| d < today))
        .collect();
    overdue.sort_by_key(|m| m.target_date);
    overdue
}

/// Due within `[today, today + horizon_days]`, keeping for each project only
/// the milestones on its nearest date.
pub fn upcoming_milestones(
    milestones: &[Milestone],
    today: NaiveDate,
    horizon_days: i64,
) -> Vec<&Milestone> {
    let horizon = Duration::try_days(horizon_days)
        .and_then(|span| today.checked_add_signed(span))
        .unwrap_or(if horizon_days < 0 { NaiveDate::MIN } else { NaiveDate::MAX });
    let in_window: Vec<&Milestone> = milestones
        .iter()
        .filter(|m| open_with_date(m).is_some_and(|d| today <= d && d <= horizon))
        .collect();

    let mut nearest: HashMap<i64, NaiveDate> = HashMap::new();
    for m in &in_window {
        if let Some(date) = m.target_date {
            nearest
                .entry(m.project_id)
                .and_modify(|d| *d = (*d).min(date))
                .or_insert(date);
        }
    }

    let mut upcoming: Vec<&Milestone> = in_window
        .into_iter()
        .filter(|m| m.target_date == nearest.get(&m.project_id).copied())
        .collect();
    upcoming.sort_by_key(|m| m.target_date);
    upcoming
}

/// Groups in order of first appearance. Milestones of unknown projects are
/// left out.
pub fn group_by_project(snapshot: &Snapshot, milestones: &[&Milestone]) -> Vec<KeyPlanGroup> {
    let mut groups: Vec<KeyPlanGroup> = Vec::new();
    for milestone in milestones {
        let Some(project) = snapshot.project(milestone.project_id) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.project_id == project.id) {
            Some(group) => group.milestones.push((*milestone).clone()),
            None => groups.push(KeyPlanGroup {
                project_id: project.id,
                label: snapshot.project_label(project),
                milestones: vec![(*milestone).clone()],
            }),
        }
    }
    groups
}

pub fn key_plans(snapshot: &Snapshot, today: NaiveDate, horizon_days: i64) -> KeyPlans {
    let overdue = overdue_milestones(&snapshot.milestones, today);
    let upcoming = upcoming_milestones(&snapshot.milestones, today, horizon_days);

    KeyPlans {
        overdue: group_by_project(snapshot, &overdue),
        upcoming: group_by_project(snapshot, &upcoming),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Client, Project, ProjectStatus};
    use MilestoneStatus::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    fn in_days(days: i64) -> Option<NaiveDate> {
        Some(today() + Duration::days(days))
    }

    fn milestone(id: i64, project_id: i64, target_date: Option<NaiveDate>, status: MilestoneStatus) -> Milestone {
        Milestone {
            id,
            project_id,
            name: format!("M{id}"),
            description: None,
            target_date,
            status,
            completed_at: None,
            review_completed: false,
        }
    }

    fn project(id: i64, client_id: i64, name: &str) -> Project {
        Project {
            id,
            client_id,
            name: name.into(),
            description: None,
            status: ProjectStatus::Active,
            order_index: 0,
        }
    }

    fn snapshot(milestones: Vec<Milestone>) -> Snapshot {
        Snapshot {
            clients: vec![Client {
                id: 1,
                name: "Acme".into(),
                color: "#f00".into(),
                icon: None,
                order_index: 0,
            }],
            projects: vec![project(10, 1, "Launch"), project(20, 1, "Audit"), project(30, 9, "Orphan")],
            milestones,
            ..Snapshot::default()
        }
    }

    fn ids(group: &KeyPlanGroup) -> Vec<i64> {
        group.milestones.iter().map(|m| m.id).collect()
    }

    #[test]
    fn tied_nearest_dates_are_kept() {
        let snap = snapshot(vec![
            milestone(1, 10, in_days(3), Pending),
            milestone(2, 10, in_days(6), Pending),
            milestone(3, 10, in_days(3), InProgress),
        ]);
        let plans = key_plans(&snap, today(), 7);

        assert_eq!(plans.upcoming.len(), 1);
        assert_eq!(ids(&plans.upcoming[0]), vec![1, 3]);
        assert_eq!(plans.upcoming[0].label, "Acme > Launch");
        assert!(plans.overdue.is_empty());
    }

    #[test]
    fn overdue_sorted_and_completed_excluded() {
        let snap = snapshot(vec![
            milestone(1, 10, in_days(-1), Pending),
            milestone(2, 20, in_days(-5), ReviewPending),
            milestone(3, 10, in_days(-9), Completed),
            milestone(4, 10, in_days(-3), InProgress),
            milestone(5, 10, None, Pending),
        ]);
        let plans = key_plans(&snap, today(), 7);

        let overdue: Vec<i64> = overdue_milestones(&snap.milestones, today())
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(overdue, vec![2, 4, 1]);
        assert_eq!(plans.overdue.len(), 2);
        assert_eq!(plans.overdue[0].label, "Acme > Audit");
        assert_eq!(ids(&plans.overdue[1]), vec![4, 1]);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let snap = snapshot(vec![
            milestone(1, 10, in_days(0), Pending),
            milestone(2, 20, in_days(7), Pending),
            milestone(3, 20, in_days(8), Pending),
        ]);
        let upcoming: Vec<i64> = upcoming_milestones(&snap.milestones, today(), 7)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(upcoming, vec![1, 2]);

        let narrow: Vec<i64> = upcoming_milestones(&snap.milestones, today(), 3)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(narrow, vec![1]);
    }

    #[test]
    fn extreme_horizons_do_not_overflow() {
        let snap = snapshot(vec![
            milestone(1, 10, in_days(2), Pending),
            milestone(2, 20, Some(NaiveDate::MAX), Pending),
        ]);

        let wide: Vec<i64> = upcoming_milestones(&snap.milestones, today(), i64::MAX)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(wide, vec![1, 2]);

        assert!(upcoming_milestones(&snap.milestones, today(), i64::MIN).is_empty());
        assert_eq!(key_plans(&snap, today(), 1_000_000_000).upcoming.len(), 2);
    }

    #[test]
    fn orphans_and_unknown_clients() {
        let snap = snapshot(vec![
            milestone(1, 30, in_days(1), Pending),
            milestone(2, 99, in_days(1), Pending),
        ]);
        let plans = key_plans(&snap, today(), 7);
        assert_eq!(plans.upcoming.len(), 1);
        assert_eq!(plans.upcoming[0].label, "Orphan");
    }
}
