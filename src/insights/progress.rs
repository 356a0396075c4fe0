use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::{Milestone, MilestoneStatus};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTrend {
    Ahead,
    OnTrack,
    Behind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProgress {
    pub client_id: i64,
    pub total: usize,
    pub completed: usize,
    /// Milestones whose target date has already arrived.
    pub should_be_done: usize,
    pub actual_percent: i64,
    pub target_percent: i64,
    pub delta: i64,
}

impl ClientProgress {
    pub fn trend(&self) -> ProgressTrend {
        match self.delta {
            d if d > 0 => ProgressTrend::Ahead,
            0 => ProgressTrend::OnTrack,
            _ => ProgressTrend::Behind,
        }
    }
}

/// `round(100 * part / total)`, halves rounded up, 0 for an empty total.
pub fn percent(part: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (part as i64, total as i64);
    (200 * part + total) / (2 * total)
}

pub fn progress_for_milestones(client_id: i64, milestones: &[&Milestone], today: NaiveDate) -> ClientProgress {
    let total = milestones.len();
    let completed = milestones
        .iter()
        .filter(|m| m.status == MilestoneStatus::Completed)
        .count();
    let should_be_done = milestones
        .iter()
        .filter(|m| m.target_date.is_some_and(|d| d <= today))
        .count();

    let actual_percent = percent(completed, total);
    let target_percent = percent(should_be_done, total);

    ClientProgress {
        client_id,
        total,
        completed,
        should_be_done,
        actual_percent,
        target_percent,
        delta: actual_percent - target_percent,
    }
}

pub fn progress_for_client(snapshot: &Snapshot, client_id: i64, today: NaiveDate) -> ClientProgress {
    progress_for_milestones(client_id, &snapshot.client_milestones(client_id), today)
}

/// One entry per client, in client order.
pub fn progress_for_all(snapshot: &Snapshot, today: NaiveDate) -> Vec<ClientProgress> {
    snapshot
        .clients
        .iter()
        .map(|client| progress_for_client(snapshot, client.id, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Client, Project, ProjectStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn milestone(id: i64, project_id: i64, target: Option<NaiveDate>, status: MilestoneStatus) -> Milestone {
        Milestone {
            id,
            project_id,
            name: format!("M{id}"),
            description: None,
            target_date: target,
            status,
            completed_at: None,
            review_completed: false,
        }
    }

    fn snapshot(milestones: Vec<Milestone>) -> Snapshot {
        Snapshot {
            clients: vec![
                Client {
                    id: 1,
                    name: "Acme".into(),
                    color: "#f00".into(),
                    icon: None,
                    order_index: 0,
                },
                Client {
                    id: 2,
                    name: "Globex".into(),
                    color: "#0f0".into(),
                    icon: None,
                    order_index: 1,
                },
            ],
            projects: vec![
                Project {
                    id: 10,
                    client_id: 1,
                    name: "Launch".into(),
                    description: None,
                    status: ProjectStatus::Active,
                    order_index: 0,
                },
                Project {
                    id: 20,
                    client_id: 2,
                    name: "Audit".into(),
                    description: None,
                    status: ProjectStatus::Active,
                    order_index: 0,
                },
            ],
            milestones,
            ..Snapshot::default()
        }
    }

    #[test]
    fn behind_schedule_client() {
        use MilestoneStatus::*;
        let today = date(2025, 9, 15);
        let snap = snapshot(vec![
            milestone(1, 10, Some(date(2025, 9, 1)), Completed),
            milestone(2, 10, Some(date(2025, 9, 10)), Completed),
            milestone(3, 10, Some(date(2025, 9, 15)), InProgress),
            milestone(4, 10, Some(date(2025, 10, 1)), Pending),
            milestone(5, 20, Some(date(2025, 9, 1)), Pending),
        ]);

        let progress = progress_for_client(&snap, 1, today);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.actual_percent, 50);
        assert_eq!(progress.target_percent, 75);
        assert_eq!(progress.delta, -25);
        assert_eq!(progress.trend(), ProgressTrend::Behind);
    }

    #[test]
    fn empty_client_is_zero() {
        let progress = progress_for_client(&snapshot(Vec::new()), 1, date(2025, 9, 15));
        assert_eq!(progress.actual_percent, 0);
        assert_eq!(progress.target_percent, 0);
        assert_eq!(progress.trend(), ProgressTrend::OnTrack);
    }

    #[test]
    fn rounds_instead_of_truncating() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn all_clients_in_order() {
        let snap = snapshot(vec![milestone(
            1,
            20,
            None,
            MilestoneStatus::Completed,
        )]);
        let all = progress_for_all(&snap, date(2025, 9, 15));
        assert_eq!(all.iter().map(|p| p.client_id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(all[1].delta, 100);
        assert_eq!(all[1].trend(), ProgressTrend::Ahead);
    }
}
