use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub day_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: String,
}

/// Fields an edit may replace. `None` leaves the field untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskUpdate {
    pub fn title<T: Into<String>>(title: T) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn description<T: Into<String>>(description: T) -> Self {
        Self {
            title: None,
            description: Some(description.into()),
        }
    }

    /// Trims the title and drops it when nothing is left.
    pub fn without_blank_title(self) -> Self {
        let title = self
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty());
        Self { title, ..self }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}
