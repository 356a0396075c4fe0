pub mod clients;
pub mod memos;
pub mod milestones;
pub mod schedules;
