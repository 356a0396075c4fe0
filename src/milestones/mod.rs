pub mod status;

pub use status::{apply_status_change, has_schedules, next_status, plan_status_change, StatusChange};
