//! Read-only views computed from a snapshot: key plans and client progress.

pub mod key_plans;
pub mod progress;

pub use key_plans::{key_plans, KeyPlanGroup, KeyPlans};
pub use progress::{progress_for_all, progress_for_client, ClientProgress, ProgressTrend};
