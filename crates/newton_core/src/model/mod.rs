mod change_log;
mod task;

pub use change_log::{ChangeAction, ChangeLogEntry, ChangeMetadata, LogDay, group_by_day};
pub use task::{Task, TaskUpdate};
