//! One terminal session: a task store and a timeline window shared by every
//! command the user runs until the process exits.

use crate::cli::Command;
use newton_core::clock::Clock;
use newton_core::config::Config;
use newton_core::day::{day_id, parse_day_id, resolve_day};
use newton_core::error::AppError;
use newton_core::model::{ChangeLogEntry, Task, TaskUpdate};
use newton_core::storage::KeyValueStore;
use newton_core::task_store::{DEFAULT_USER, TaskStore};
use newton_core::timeline::{DateWindowManager, Edge};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::{OffsetDateTime, UtcOffset};
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const LOG_DAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[weekday repr:short], [month repr:short] [day padding:none]");
const LOG_TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Done")]
    done: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            done: if task.completed { "x" } else { "" }.to_string(),
            description: task.description.clone(),
        }
    }
}

pub struct Session<S, C> {
    clock: C,
    store: TaskStore<S, C>,
    timeline: DateWindowManager<C>,
}

impl<S: KeyValueStore, C: Clock + Clone> Session<S, C> {
    pub fn new(storage: S, clock: C, config: &Config) -> Self {
        let default_user = config.user.as_deref().unwrap_or(DEFAULT_USER);
        let store = TaskStore::load_with_clock(storage, clock.clone(), default_user);
        let timeline = DateWindowManager::new(clock.clone(), config.timeline.settings());
        Self {
            clock,
            store,
            timeline,
        }
    }

    pub fn store(&self) -> &TaskStore<S, C> {
        &self.store
    }

    pub fn timeline(&self) -> &DateWindowManager<C> {
        &self.timeline
    }

    /// Runs one command and returns what should be printed.
    pub fn run(&mut self, command: Command, json: bool) -> Result<String, AppError> {
        match command {
            Command::Add {
                day,
                title,
                description,
            } => {
                let day = self.resolve(&day)?;
                let title = title.unwrap_or_default();
                let task = self
                    .store
                    .add_task(&day, &title, description.as_deref())
                    .ok_or_else(|| AppError::invalid_input("title is required"))?;
                Ok(if json {
                    task_json(task)?
                } else {
                    format!("Added task: {} ({}) on {}", task.title, task.id, task.day_id)
                })
            }
            Command::Toggle { id } => {
                if !self.store.toggle_task(&id) {
                    return Err(task_not_found());
                }
                let task = self.existing(&id)?;
                Ok(if json {
                    task_json(task)?
                } else if task.completed {
                    format!("Completed task: {} ({})", task.title, task.id)
                } else {
                    format!("Reopened task: {} ({})", task.title, task.id)
                })
            }
            Command::Edit {
                id,
                title,
                description,
            } => {
                if title.is_none() && description.is_none() {
                    return Err(AppError::invalid_input("title or description is required"));
                }
                self.existing(&id)?;
                if !self.store.update_task(&id, TaskUpdate { title, description }) {
                    return Err(AppError::invalid_input("title is required"));
                }
                let task = self.existing(&id)?;
                Ok(if json {
                    task_json(task)?
                } else {
                    format!("Updated task: {} ({})", task.title, task.id)
                })
            }
            Command::Delete { id } => {
                let task = self.existing(&id)?.clone();
                self.store.delete_task(&id);
                Ok(if json {
                    task_json(&task)?
                } else {
                    format!("Deleted task: {} ({})", task.title, task.id)
                })
            }
            Command::Reschedule { id, day } => {
                let day = self.resolve(&day)?;
                let from_day = self.existing(&id)?.day_id.clone();
                if !self.store.reschedule_task(&id, &day) {
                    return Err(AppError::invalid_input(format!(
                        "task is already on {day}"
                    )));
                }
                let task = self.existing(&id)?;
                Ok(if json {
                    task_json(task)?
                } else {
                    format!(
                        "Rescheduled task: {} ({}) from {} to {}",
                        task.title, task.id, from_day, task.day_id
                    )
                })
            }
            Command::User { name } => {
                if let Some(name) = name {
                    if name.trim().is_empty() {
                        return Err(AppError::invalid_input("user is required"));
                    }
                    self.store.set_user(&name);
                }
                Ok(if json {
                    serde_json::json!({ "user": self.store.user() }).to_string()
                } else {
                    format!("User: {}", self.store.user())
                })
            }
            Command::List { day } => {
                let day = match day {
                    Some(day) => self.resolve(&day)?,
                    None => self.timeline.locate_today(),
                };
                let tasks: Vec<&Task> = self.store.tasks_for_day(&day).collect();
                render_tasks(&day, &tasks, json)
            }
            Command::Days => Ok(self.render_days(json)),
            Command::Log => Ok(render_log(&self.store, self.clock.offset(), json)),
            Command::Left => Ok(self.expand(Edge::Left, json)),
            Command::Right => Ok(self.expand(Edge::Right, json)),
            Command::Today => Ok(self.render_today(json)),
        }
    }

    fn resolve(&self, raw: &str) -> Result<String, AppError> {
        resolve_day(raw, self.clock.today()).map(day_id)
    }

    fn existing(&self, id: &str) -> Result<&Task, AppError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }
        self.store.task(trimmed).ok_or_else(task_not_found)
    }

    fn expand(&mut self, edge: Edge, json: bool) -> String {
        let grew = self.timeline.on_edge(edge);
        let window = self.timeline.window();
        if json {
            return serde_json::json!({
                "expanded": grew,
                "start": day_id(window.start()),
                "end": day_id(window.end()),
                "days": window.len(),
            })
            .to_string();
        }

        let status = if grew { "Window expanded" } else { "Window unchanged" };
        format!(
            "{status}: {} .. {} ({} days)",
            day_id(window.start()),
            day_id(window.end()),
            window.len()
        )
    }

    fn render_days(&self, json: bool) -> String {
        let today = self.timeline.locate_today();
        let days = self.timeline.visible_days();

        if json {
            let payload: Vec<serde_json::Value> = days
                .iter()
                .map(|date| {
                    let id = day_id(*date);
                    serde_json::json!({
                        "day": id,
                        "weekday": date.weekday().to_string(),
                        "today": id == today,
                        "tasks": self.store.tasks_for_day(&id).count(),
                    })
                })
                .collect();
            return serde_json::Value::Array(payload).to_string();
        }

        days.iter()
            .map(|date| {
                let id = day_id(*date);
                let marker = if id == today { "*" } else { " " };
                let count = self.store.tasks_for_day(&id).count();
                format!("{marker} {id} {:<9} {count} task(s)", date.weekday().to_string())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_today(&self, json: bool) -> String {
        let today = self.timeline.locate_today();
        let index = self.timeline.today_index();
        let total = self.timeline.window().len();
        if json {
            return serde_json::json!({ "today": today, "index": index, "days": total })
                .to_string();
        }
        match index {
            Some(index) => format!("Today: {today} (column {} of {total})", index + 1),
            None => format!("Today: {today} (outside the window)"),
        }
    }
}

fn task_not_found() -> AppError {
    AppError::invalid_input("task not found")
}

fn task_json(task: &Task) -> Result<String, AppError> {
    Ok(serde_json::to_string(task)?)
}

fn render_tasks(day: &str, tasks: &[&Task], json: bool) -> Result<String, AppError> {
    if json {
        return Ok(serde_json::to_string(tasks)?);
    }

    if tasks.is_empty() {
        return Ok(format!("No tasks for {day}"));
    }

    let rows: Vec<TaskRow> = tasks.iter().map(|task| TaskRow::from(*task)).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    Ok(table.to_string())
}

fn render_log<S: KeyValueStore, C: Clock>(
    store: &TaskStore<S, C>,
    offset: UtcOffset,
    json: bool,
) -> String {
    if json {
        return serde_json::to_string(store.change_log()).unwrap_or_else(|_| "[]".to_string());
    }

    let days = store.change_log_by_day();
    if days.is_empty() {
        return "No activity yet".to_string();
    }

    let mut lines = Vec::new();
    for group in days {
        lines.push(day_header(group.day));
        for entry in group.entries {
            lines.push(format!("  {}", log_line(entry, offset)));
        }
    }
    lines.join("\n")
}

fn day_header(day: &str) -> String {
    parse_day_id(day)
        .ok()
        .and_then(|date| date.format(LOG_DAY_FORMAT).ok())
        .unwrap_or_else(|| day.to_string())
}

fn log_line(entry: &ChangeLogEntry, offset: UtcOffset) -> String {
    let time = OffsetDateTime::parse(&entry.timestamp, &Rfc3339)
        .ok()
        .and_then(|stamp| stamp.to_offset(offset).format(LOG_TIME_FORMAT).ok())
        .unwrap_or_else(|| entry.timestamp.clone());
    let mut line = format!(
        "{time} {} {} {}",
        entry.task_name,
        entry.action.label(),
        entry.user_id
    );
    if let Some(metadata) = entry.metadata.as_ref() {
        line.push_str(&format!(" ({} -> {})", metadata.from_day, metadata.to_day));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{Session, log_line};
    use crate::cli::Command;
    use newton_core::clock::ManualClock;
    use newton_core::config::{Config, TimelineConfig};
    use newton_core::model::{ChangeAction, ChangeLogEntry, ChangeMetadata};
    use newton_core::storage::MemoryStore;
    use time::macros::{datetime, offset};

    fn session(clock: &ManualClock) -> Session<MemoryStore, &ManualClock> {
        let config = Config {
            user: Some("alex".into()),
            timeline: TimelineConfig {
                initial_radius_days: 2,
                ..TimelineConfig::default()
            },
        };
        Session::new(MemoryStore::new(), clock, &config)
    }

    fn add(session: &mut Session<MemoryStore, &ManualClock>, day: &str, title: &str) -> String {
        session
            .run(
                Command::Add {
                    day: day.to_string(),
                    title: Some(title.to_string()),
                    description: None,
                },
                false,
            )
            .unwrap();
        session.store().tasks().last().unwrap().id.clone()
    }

    #[test]
    fn add_resolves_relative_days() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        let output = session
            .run(
                Command::Add {
                    day: "tomorrow".into(),
                    title: Some(" Buy milk ".into()),
                    description: None,
                },
                false,
            )
            .unwrap();

        assert!(output.starts_with("Added task: Buy milk (task_"));
        assert!(output.ends_with("on 2025-12-21"));
    }

    #[test]
    fn add_without_title_is_invalid_input() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        let err = session
            .run(
                Command::Add {
                    day: "today".into(),
                    title: Some("   ".into()),
                    description: None,
                },
                false,
            )
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid_input - title is required");
        assert!(session.store().change_log().is_empty());
    }

    #[test]
    fn toggle_reports_new_state() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);
        let id = add(&mut session, "today", "demo");

        let done = session.run(Command::Toggle { id: id.clone() }, false).unwrap();
        let reopened = session.run(Command::Toggle { id }, false).unwrap();

        assert!(done.starts_with("Completed task: demo"));
        assert!(reopened.starts_with("Reopened task: demo"));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        for command in [
            Command::Toggle { id: "task_x".into() },
            Command::Delete { id: "task_x".into() },
            Command::Reschedule {
                id: "task_x".into(),
                day: "today".into(),
            },
        ] {
            let err = session.run(command, false).unwrap_err();
            assert_eq!(err.message(), "task not found");
        }
    }

    #[test]
    fn reschedule_to_same_day_is_rejected_without_log_entry() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);
        let id = add(&mut session, "2025-12-20", "demo");

        let err = session
            .run(
                Command::Reschedule {
                    id,
                    day: "today".into(),
                },
                false,
            )
            .unwrap_err();

        assert_eq!(err.message(), "task is already on 2025-12-20");
        assert_eq!(session.store().change_log().len(), 1);
    }

    #[test]
    fn edit_requires_a_field() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);
        let id = add(&mut session, "today", "demo");

        let err = session
            .run(
                Command::Edit {
                    id: id.clone(),
                    title: None,
                    description: None,
                },
                false,
            )
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let output = session
            .run(
                Command::Edit {
                    id,
                    title: None,
                    description: Some("notes".into()),
                },
                false,
            )
            .unwrap();
        assert!(output.starts_with("Updated task: demo"));
    }

    #[test]
    fn days_marks_today_and_counts_tasks() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);
        add(&mut session, "today", "one");
        add(&mut session, "today", "two");

        let output = session.run(Command::Days, false).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("* 2025-12-20 Saturday"));
        assert!(lines[2].ends_with("2 task(s)"));
        assert!(lines[0].starts_with("  2025-12-18"));
    }

    #[test]
    fn edges_share_cooldown() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        let first = session.run(Command::Left, false).unwrap();
        let second = session.run(Command::Right, false).unwrap();
        clock.advance_millis(800);
        let third = session.run(Command::Right, false).unwrap();

        assert_eq!(first, "Window expanded: 2025-12-04 .. 2025-12-22 (19 days)");
        assert!(second.starts_with("Window unchanged"));
        assert_eq!(third, "Window expanded: 2025-12-04 .. 2026-01-05 (33 days)");
        assert_eq!(session.timeline().window().len(), 33);
    }

    #[test]
    fn today_reports_column() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        let output = session.run(Command::Today, false).unwrap();

        assert_eq!(output, "Today: 2025-12-20 (column 3 of 5)");
    }

    #[test]
    fn log_groups_by_day_with_labels() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:05 UTC));
        let mut session = session(&clock);
        let id = add(&mut session, "today", "demo");
        clock.advance_millis(24 * 60 * 60 * 1_000);
        session
            .run(
                Command::Reschedule {
                    id,
                    day: "2025-12-22".into(),
                },
                false,
            )
            .unwrap();

        let output = session.run(Command::Log, false).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines,
            [
                "Sun, Dec 21",
                "  09:05 demo was rescheduled by alex (2025-12-20 -> 2025-12-22)",
                "Sat, Dec 20",
                "  09:05 demo was created by alex",
            ]
        );
    }

    #[test]
    fn empty_log_and_list_have_friendly_output() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        assert_eq!(session.run(Command::Log, false).unwrap(), "No activity yet");
        assert_eq!(
            session.run(Command::List { day: None }, false).unwrap(),
            "No tasks for 2025-12-20"
        );
    }

    #[test]
    fn list_json_contains_day_tasks_only() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);
        add(&mut session, "today", "here");
        add(&mut session, "tomorrow", "elsewhere");

        let output = session.run(Command::List { day: None }, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["title"], "here");
        assert_eq!(value[0]["dayId"], "2025-12-20");
    }

    #[test]
    fn user_command_sets_acting_user() {
        let clock = ManualClock::new(datetime!(2025-12-20 09:00 UTC));
        let mut session = session(&clock);

        assert_eq!(session.run(Command::User { name: None }, false).unwrap(), "User: alex");
        let output = session
            .run(
                Command::User {
                    name: Some("sam".into()),
                },
                false,
            )
            .unwrap();

        assert_eq!(output, "User: sam");
        add(&mut session, "today", "demo");
        assert_eq!(session.store().change_log()[0].user_id, "sam");
    }

    #[test]
    fn log_line_shows_wall_clock_time() {
        let entry = ChangeLogEntry {
            id: "log_1".into(),
            action: ChangeAction::Rescheduled,
            task_id: "task_1".into(),
            task_name: "demo".into(),
            timestamp: "2025-12-20T23:30:00Z".into(),
            user_id: "alex".into(),
            metadata: Some(ChangeMetadata {
                from_day: "2025-12-20".into(),
                to_day: "2025-12-22".into(),
            }),
        };

        assert_eq!(
            log_line(&entry, offset!(+2)),
            "01:30 demo was rescheduled by alex (2025-12-20 -> 2025-12-22)"
        );
        assert!(log_line(&entry, offset!(UTC)).starts_with("23:30 "));
    }
}
