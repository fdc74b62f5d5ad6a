use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Edited,
    Completed,
    Uncompleted,
    Deleted,
    Rescheduled,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Edited => "edited",
            Self::Completed => "completed",
            Self::Uncompleted => "uncompleted",
            Self::Deleted => "deleted",
            Self::Rescheduled => "rescheduled",
        }
    }

    /// Phrase placed between the task name and the acting user when an entry
    /// is rendered, e.g. `Buy milk was marked as done by alex`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "was created by",
            Self::Edited => "was edited by",
            Self::Completed => "was marked as done by",
            Self::Uncompleted => "was marked as incomplete by",
            Self::Deleted => "was deleted by",
            Self::Rescheduled => "was rescheduled by",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMetadata {
    pub from_day: String,
    pub to_day: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub id: String,
    pub action: ChangeAction,
    pub task_id: String,
    pub task_name: String,
    pub timestamp: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChangeMetadata>,
}

impl ChangeLogEntry {
    /// The `YYYY-MM-DD` portion of the timestamp.
    pub fn day(&self) -> &str {
        self.timestamp.get(..10).unwrap_or(&self.timestamp)
    }
}

/// Change log entries sharing one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDay<'a> {
    pub day: &'a str,
    pub entries: Vec<&'a ChangeLogEntry>,
}

/// Groups a newest-first log by day. Days come newest first; entries inside a
/// day keep their log order.
pub fn group_by_day(entries: &[ChangeLogEntry]) -> Vec<LogDay<'_>> {
    let mut grouped: BTreeMap<&str, Vec<&ChangeLogEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.day()).or_default().push(entry);
    }

    grouped
        .into_iter()
        .rev()
        .map(|(day, entries)| LogDay { day, entries })
        .collect()
}
