//! Plain-text summary printed by the `opsdesk` binary.

use std::fmt::Write;

use chrono::{Duration, NaiveDate};

use crate::calendar::dates::format_date;
use crate::calendar::DayAgenda;
use crate::db::models::Milestone;
use crate::insights::{ClientProgress, KeyPlanGroup, KeyPlans, ProgressTrend};
use crate::snapshot::Snapshot;

fn time_label(agenda_start: Option<chrono::NaiveTime>) -> String {
    match agenda_start {
        Some(time) => time.format("%H:%M").to_string(),
        None => "all day".to_string(),
    }
}

fn write_day(out: &mut String, agenda: &DayAgenda) {
    let _ = writeln!(out, "== {} ==", format_date(agenda.day));
    if agenda.is_empty() {
        let _ = writeln!(out, "  nothing scheduled");
        return;
    }

    for entry in agenda.schedules.iter().chain(&agenda.task_schedules) {
        let mark = if entry.schedule.is_completed { "x" } else { " " };
        let _ = writeln!(
            out,
            "  [{mark}] {:>7}  {} ({})",
            time_label(entry.schedule.start_time),
            entry.schedule.title,
            entry.schedule.schedule_type.as_str()
        );
    }
    for deadline in &agenda.deadlines {
        let mark = if deadline.completed { "x" } else { " " };
        let _ = writeln!(
            out,
            "  [{mark}] due      {} ({})",
            deadline.content, deadline.schedule_title
        );
    }
    for milestone in &agenda.milestones_due {
        let _ = writeln!(out, "  milestone {} [{}]", milestone.name, milestone.status.as_str());
    }
    if let Some(memo) = &agenda.memo {
        let _ = writeln!(out, "  memo: {memo}");
    }
}

fn write_groups(out: &mut String, heading: &str, groups: &[KeyPlanGroup]) {
    if groups.is_empty() {
        return;
    }
    let _ = writeln!(out, "{heading}:");
    for group in groups {
        let _ = writeln!(out, "  {}", group.label);
        for Milestone {
            name, target_date, ..
        } in &group.milestones
        {
            let due = target_date.map(format_date).unwrap_or_default();
            let _ = writeln!(out, "    {due}  {name}");
        }
    }
}

fn trend_label(trend: ProgressTrend) -> &'static str {
    match trend {
        ProgressTrend::Ahead => "ahead",
        ProgressTrend::OnTrack => "on track",
        ProgressTrend::Behind => "behind",
    }
}

pub fn render_digest(
    snapshot: &Snapshot,
    days: &[DayAgenda],
    plans: &KeyPlans,
    progress: &[ClientProgress],
) -> String {
    let mut out = String::new();
    for agenda in days {
        write_day(&mut out, agenda);
    }

    if !plans.is_empty() {
        let _ = writeln!(out);
        write_groups(&mut out, "Overdue", &plans.overdue);
        write_groups(&mut out, "Upcoming", &plans.upcoming);
    }

    let tracked: Vec<&ClientProgress> = progress.iter().filter(|p| p.total > 0).collect();
    if !tracked.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Progress:");
        for p in tracked {
            let name = snapshot
                .client(p.client_id)
                .map(|c| c.name.as_str())
                .unwrap_or("?");
            let _ = writeln!(
                out,
                "  {name}: {}% done, {}% due ({:+}, {})",
                p.actual_percent,
                p.target_percent,
                p.delta,
                trend_label(p.trend())
            );
        }
    }
    out
}

/// `count` consecutive days starting at `first`, at least one, stopping at
/// the end of the representable calendar.
pub fn digest_days(first: NaiveDate, count: u32) -> Vec<NaiveDate> {
    (0..i64::from(count.max(1)))
        .map_while(|offset| first.checked_add_signed(Duration::days(offset)))
        .collect()
}
