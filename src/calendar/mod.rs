pub mod agenda;
pub mod classifier;
pub mod dates;

pub use agenda::{day_agenda, week_agenda, AgendaEntry, DayAgenda, DeadlineEntry};
pub use classifier::{
    display_color, schedules_for_date, task_deadline_items_for_date, task_type_schedules_for_date,
    DeadlineItem,
};
