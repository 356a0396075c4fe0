pub mod client;
pub mod memo;
pub mod milestone;
pub mod schedule;

pub use client::{Client, ClientInput, Project, ProjectInput, ProjectStatus};
pub use memo::DailyMemo;
pub use milestone::{Milestone, MilestoneInput, MilestoneStatus};
pub use schedule::{Schedule, SchedulePayload, ScheduleType, Task, TaskInput, TaskSource};
