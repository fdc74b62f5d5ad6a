//! Owned state container for tasks and their change log.
//!
//! Every mutation goes through [`TaskStore::dispatch`], which applies one
//! [`TaskIntent`] to the in-memory state, prepends the matching change log
//! entry and then writes the full collections back to the key-value store.
//! Intents that do not apply (unknown id, blank title, same-day reschedule)
//! leave state, log and storage untouched.

use crate::clock::{Clock, SystemClock};
use crate::model::{ChangeAction, ChangeLogEntry, ChangeMetadata, LogDay, Task, TaskUpdate};
use crate::storage::{KeyValueStore, records};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_USER: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIntent {
    Add {
        day_id: String,
        title: String,
        description: Option<String>,
    },
    Toggle {
        task_id: String,
    },
    Update {
        task_id: String,
        update: TaskUpdate,
    },
    Delete {
        task_id: String,
    },
    Reschedule {
        task_id: String,
        new_day_id: String,
    },
    SetUser {
        user_id: String,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub change_log: Vec<ChangeLogEntry>,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Nothing,
    Tasks,
    User,
}

pub struct TaskStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    state: TaskState,
}

impl<S: KeyValueStore, C: Clock> TaskStore<S, C> {
    /// Reads the persisted records. Anything unreadable degrades to an empty
    /// collection or to `default_user`.
    pub fn load_with_clock(storage: S, clock: C, default_user: &str) -> Self {
        let tasks = records::load_tasks(&storage).unwrap_or_else(|err| {
            warn!(error = %err, "stored tasks unreadable, starting empty");
            Vec::new()
        });
        let change_log = records::load_change_log(&storage).unwrap_or_else(|err| {
            warn!(error = %err, "stored change log unreadable, starting empty");
            Vec::new()
        });
        let user = match records::load_user(&storage) {
            Ok(Some(user)) => user,
            Ok(None) => default_user.to_string(),
            Err(err) => {
                warn!(error = %err, "stored user unreadable, using default");
                default_user.to_string()
            }
        };

        debug!(
            tasks = tasks.len(),
            entries = change_log.len(),
            user = %user,
            "task store loaded"
        );

        Self {
            storage,
            clock,
            state: TaskState {
                tasks,
                change_log,
                user,
            },
        }
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        let task_id = task_id.trim();
        self.state.tasks.iter().find(|task| task.id == task_id)
    }

    /// Tasks of one day column, in insertion order.
    pub fn tasks_for_day<'a>(&'a self, day_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.state
            .tasks
            .iter()
            .filter(move |task| task.day_id == day_id)
    }

    /// Newest first.
    pub fn change_log(&self) -> &[ChangeLogEntry] {
        &self.state.change_log
    }

    pub fn change_log_by_day(&self) -> Vec<LogDay<'_>> {
        crate::model::group_by_day(&self.state.change_log)
    }

    pub fn last_change(&self) -> Option<&ChangeLogEntry> {
        self.state.change_log.first()
    }

    pub fn user(&self) -> &str {
        &self.state.user
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Applies one intent. Returns `false` when it was a no-op.
    pub fn dispatch(&mut self, intent: TaskIntent) -> bool {
        let now = self.clock.now_utc();
        match reduce(&mut self.state, intent, now) {
            Applied::Nothing => false,
            Applied::Tasks => {
                if let Some(entry) = self.state.change_log.first() {
                    debug!(
                        action = entry.action.as_str(),
                        task_id = %entry.task_id,
                        "task change recorded"
                    );
                }
                self.persist_tasks();
                true
            }
            Applied::User => {
                debug!(user = %self.state.user, "acting user changed");
                self.persist_user();
                true
            }
        }
    }

    pub fn add_task(
        &mut self,
        day_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Option<&Task> {
        let applied = self.dispatch(TaskIntent::Add {
            day_id: day_id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
        });
        if applied {
            self.state.tasks.last()
        } else {
            None
        }
    }

    pub fn toggle_task(&mut self, task_id: &str) -> bool {
        self.dispatch(TaskIntent::Toggle {
            task_id: task_id.to_string(),
        })
    }

    pub fn update_task(&mut self, task_id: &str, update: TaskUpdate) -> bool {
        self.dispatch(TaskIntent::Update {
            task_id: task_id.to_string(),
            update,
        })
    }

    pub fn delete_task(&mut self, task_id: &str) -> bool {
        self.dispatch(TaskIntent::Delete {
            task_id: task_id.to_string(),
        })
    }

    pub fn reschedule_task(&mut self, task_id: &str, new_day_id: &str) -> bool {
        self.dispatch(TaskIntent::Reschedule {
            task_id: task_id.to_string(),
            new_day_id: new_day_id.to_string(),
        })
    }

    pub fn set_user(&mut self, user_id: &str) -> bool {
        self.dispatch(TaskIntent::SetUser {
            user_id: user_id.to_string(),
        })
    }

    fn persist_tasks(&mut self) {
        if let Err(err) = records::save_tasks(&mut self.storage, &self.state.tasks) {
            warn!(error = %err, "failed to persist tasks");
        }
        if let Err(err) = records::save_change_log(&mut self.storage, &self.state.change_log) {
            warn!(error = %err, "failed to persist change log");
        }
    }

    fn persist_user(&mut self) {
        if let Err(err) = records::save_user(&mut self.storage, &self.state.user) {
            warn!(error = %err, "failed to persist user");
        }
    }
}

fn reduce(state: &mut TaskState, intent: TaskIntent, now: OffsetDateTime) -> Applied {
    match intent {
        TaskIntent::Add {
            day_id,
            title,
            description,
        } => {
            let title = title.trim();
            if title.is_empty() {
                return Applied::Nothing;
            }

            let task = Task {
                id: new_id("task"),
                day_id: day_id.trim().to_string(),
                title: title.to_string(),
                description: description.unwrap_or_default(),
                completed: false,
                created_at: timestamp(now),
            };
            let entry = log_entry(state, ChangeAction::Created, &task, now, None);
            state.tasks.push(task);
            state.change_log.insert(0, entry);
            Applied::Tasks
        }
        TaskIntent::Toggle { task_id } => {
            let Some(index) = position(state, &task_id) else {
                return Applied::Nothing;
            };

            let completed = !state.tasks[index].completed;
            state.tasks[index].completed = completed;
            let action = if completed {
                ChangeAction::Completed
            } else {
                ChangeAction::Uncompleted
            };
            let entry = log_entry(state, action, &state.tasks[index], now, None);
            state.change_log.insert(0, entry);
            Applied::Tasks
        }
        TaskIntent::Update { task_id, update } => {
            let Some(index) = position(state, &task_id) else {
                return Applied::Nothing;
            };

            let update = update.without_blank_title();
            if update.is_empty() {
                return Applied::Nothing;
            }

            let task = &mut state.tasks[index];
            if let Some(title) = update.title {
                task.title = title;
            }
            if let Some(description) = update.description {
                task.description = description;
            }
            let entry = log_entry(state, ChangeAction::Edited, &state.tasks[index], now, None);
            state.change_log.insert(0, entry);
            Applied::Tasks
        }
        TaskIntent::Delete { task_id } => {
            let Some(index) = position(state, &task_id) else {
                return Applied::Nothing;
            };

            let removed = state.tasks.remove(index);
            let entry = log_entry(state, ChangeAction::Deleted, &removed, now, None);
            state.change_log.insert(0, entry);
            Applied::Tasks
        }
        TaskIntent::Reschedule {
            task_id,
            new_day_id,
        } => {
            let Some(index) = position(state, &task_id) else {
                return Applied::Nothing;
            };

            let new_day_id = new_day_id.trim();
            if new_day_id.is_empty() || state.tasks[index].day_id == new_day_id {
                return Applied::Nothing;
            }

            let from_day =
                std::mem::replace(&mut state.tasks[index].day_id, new_day_id.to_string());
            let metadata = ChangeMetadata {
                from_day,
                to_day: new_day_id.to_string(),
            };
            let entry = log_entry(
                state,
                ChangeAction::Rescheduled,
                &state.tasks[index],
                now,
                Some(metadata),
            );
            state.change_log.insert(0, entry);
            Applied::Tasks
        }
        TaskIntent::SetUser { user_id } => {
            let user_id = user_id.trim();
            if user_id.is_empty() || user_id == state.user {
                return Applied::Nothing;
            }
            state.user = user_id.to_string();
            Applied::User
        }
    }
}

fn position(state: &TaskState, task_id: &str) -> Option<usize> {
    let task_id = task_id.trim();
    state.tasks.iter().position(|task| task.id == task_id)
}

fn log_entry(
    state: &TaskState,
    action: ChangeAction,
    task: &Task,
    now: OffsetDateTime,
    metadata: Option<ChangeMetadata>,
) -> ChangeLogEntry {
    ChangeLogEntry {
        id: new_id("log"),
        action,
        task_id: task.id.clone(),
        task_name: task.title.clone(),
        timestamp: timestamp(now),
        user_id: state.user.clone(),
        metadata,
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::now_v7().simple())
}

fn timestamp(now: OffsetDateTime) -> String {
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}
