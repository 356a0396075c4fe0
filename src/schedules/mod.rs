//! Schedule editing: drafts, task item diffs, the save sequence and drag
//! relocation.

pub mod diff;
pub mod draft;
pub mod persistence;
pub mod relocation;

pub use diff::{diff_tasks, TaskDiff, TaskWrite};
pub use draft::{ScheduleDraft, TaskDraft};
pub use persistence::{save_schedule, SaveOutcome};
pub use relocation::{plan_relocation, relocate, Relocation};
