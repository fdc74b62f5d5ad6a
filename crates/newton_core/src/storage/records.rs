use crate::error::AppError;
use crate::model::{ChangeLogEntry, Task};
use crate::storage::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const TASKS_KEY: &str = "newton_tasks";
pub const CHANGE_LOG_KEY: &str = "newton_change_log";
pub const USER_KEY: &str = "newton_user";

pub fn load_tasks<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Task>, AppError> {
    load_list(store, TASKS_KEY)
}

pub fn save_tasks<S: KeyValueStore + ?Sized>(
    store: &mut S,
    tasks: &[Task],
) -> Result<(), AppError> {
    save_list(store, TASKS_KEY, tasks)
}

pub fn load_change_log<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<Vec<ChangeLogEntry>, AppError> {
    load_list(store, CHANGE_LOG_KEY)
}

pub fn save_change_log<S: KeyValueStore + ?Sized>(
    store: &mut S,
    entries: &[ChangeLogEntry],
) -> Result<(), AppError> {
    save_list(store, CHANGE_LOG_KEY, entries)
}

/// A blank stored user counts as no user.
pub fn load_user<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<String>, AppError> {
    Ok(store.get(USER_KEY)?.filter(|user| !user.trim().is_empty()))
}

pub fn save_user<S: KeyValueStore + ?Sized>(store: &mut S, user: &str) -> Result<(), AppError> {
    store.set(USER_KEY, user)
}

fn load_list<S, T>(store: &S, key: &str) -> Result<Vec<T>, AppError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
            .map_err(|err| AppError::invalid_data(format!("{key}: {err}"))),
        _ => Ok(Vec::new()),
    }
}

fn save_list<S, T>(store: &mut S, key: &str, items: &[T]) -> Result<(), AppError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let content = serde_json::to_string(items)?;
    store.set(key, &content)
}
