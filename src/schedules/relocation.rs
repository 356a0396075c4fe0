use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::db::models::Schedule;
use crate::log_debug;
use crate::store::DashboardStore;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    Unchanged,
    Moved { from: NaiveDate, to: NaiveDate },
}

/// Only the start date moves. `end_date` stays where it was, so dragging a
/// multi-day schedule far enough can shrink or invert its span.
pub fn plan_relocation(schedule: &Schedule, target: NaiveDate) -> Relocation {
    if schedule.schedule_date == target {
        Relocation::Unchanged
    } else {
        Relocation::Moved {
            from: schedule.schedule_date,
            to: target,
        }
    }
}

/// Drop handler. Issues at most one partial update and never touches the
/// other fields of the schedule.
pub async fn relocate(
    store: &dyn DashboardStore,
    schedule: &Schedule,
    target: NaiveDate,
) -> Result<Relocation> {
    let relocation = plan_relocation(schedule, target);
    if let Relocation::Moved { from, to } = relocation {
        store
            .update_schedule_date(schedule.id, to)
            .await
            .with_context(|| format!("failed to move schedule {} to {to}", schedule.id))?;
        log_debug!("Moved schedule {} from {from} to {to}", schedule.id);
    }
    Ok(relocation)
}
