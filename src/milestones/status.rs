use chrono::{DateTime, Utc};

use crate::db::models::{Milestone, MilestoneStatus, Schedule};

/// Result of rotating a milestone's status once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: MilestoneStatus,
    pub to: MilestoneStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Next status in the toggle cycle.
///
/// Once schedules are attached the milestone only alternates between
/// in-progress and completed. Without schedules it rotates
/// pending -> in-progress -> completed -> pending. `ReviewPending` is never
/// entered here; without schedules it is left where it is.
pub fn next_status(current: MilestoneStatus, has_schedules: bool) -> MilestoneStatus {
    use MilestoneStatus::*;

    match (has_schedules, current) {
        (true, InProgress) => Completed,
        (true, _) => InProgress,
        (false, Pending) => InProgress,
        (false, InProgress) => Completed,
        (false, Completed) => Pending,
        (false, ReviewPending) => ReviewPending,
    }
}

/// Entering completed stamps `now`; every other target clears the stamp.
pub fn plan_status_change(
    current: MilestoneStatus,
    has_schedules: bool,
    now: DateTime<Utc>,
) -> StatusChange {
    let to = next_status(current, has_schedules);
    let completed_at = (to == MilestoneStatus::Completed).then_some(now);

    StatusChange {
        from: current,
        to,
        completed_at,
    }
}

pub fn has_schedules(milestone_id: i64, schedules: &[Schedule]) -> bool {
    schedules
        .iter()
        .any(|schedule| schedule.references_milestone(milestone_id))
}

pub fn apply_status_change(milestone: &mut Milestone, change: &StatusChange) {
    milestone.status = change.to;
    milestone.completed_at = change.completed_at;
}
