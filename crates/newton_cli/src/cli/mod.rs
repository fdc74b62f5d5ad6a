use clap::{Parser, Subcommand};
use newton_core::config::ConfigOverrides;
use newton_core::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Day timeline task tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a task to a day
    ///
    /// Example: newton add today "Buy milk"
    /// Example: newton add 2025-12-24 "Wrap gifts" --description "before noon"
    Add {
        day: String,
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// Mark a task done, or open again if it was done
    ///
    /// Example: newton toggle task_0193...
    Toggle { id: String },
    /// Edit a task's title and/or description
    ///
    /// Example: newton edit task_0193... --title "Buy oat milk"
    Edit {
        id: String,
        #[arg(short = 't', long)]
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: newton delete task_0193...
    Delete { id: String },
    /// Move a task to another day
    ///
    /// Example: newton reschedule task_0193... tomorrow
    Reschedule { id: String, day: String },
    /// Show or set the acting user recorded in the change log
    ///
    /// Example: newton user
    /// Example: newton user alex
    User { name: Option<String> },
    /// List the tasks of one day (defaults to today)
    ///
    /// Example: newton list
    /// Example: newton list 2025-12-24
    List { day: Option<String> },
    /// Show the days of the timeline window
    Days,
    /// Show the change log, newest first
    Log,
    /// Report that the timeline was scrolled to its left edge
    Left,
    /// Report that the timeline was scrolled to its right edge
    Right,
    /// Locate today in the timeline window
    Today,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    User,
    InitialRadiusDays,
    ExpandByDays,
    CooldownMs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (section, field) = key_raw
        .split_once('.')
        .map(|(section, rest)| (section.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_section =
        canonicalize_flag_name(section).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match (canonical_section.as_str(), field) {
        ("user", None) => ConfigOverrideTarget::User,
        ("user", Some(_)) => return Err("user override cannot have subfields".to_string()),
        ("timeline", Some(field)) => {
            let canonical_field = canonicalize_flag_name(field)
                .ok_or_else(|| "timeline override requires a field name".to_string())?;
            match canonical_field.as_str() {
                "initial_radius_days" => ConfigOverrideTarget::InitialRadiusDays,
                "expand_by_days" => ConfigOverrideTarget::ExpandByDays,
                "cooldown_ms" => ConfigOverrideTarget::CooldownMs,
                other => return Err(format!("unknown timeline field '{other}'")),
            }
        }
        ("timeline", None) => return Err("timeline override requires a field name".to_string()),
        (other, _) => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` value into one set of overrides. Later
/// values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for item in raw {
        let parsed = parse_config_override(item).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::User => overrides.user = Some(parsed.value),
            ConfigOverrideTarget::InitialRadiusDays => {
                overrides.initial_radius_days = Some(parse_number(&parsed.value)?)
            }
            ConfigOverrideTarget::ExpandByDays => {
                overrides.expand_by_days = Some(parse_number(&parsed.value)?)
            }
            ConfigOverrideTarget::CooldownMs => {
                overrides.cooldown_ms = Some(parse_number(&parsed.value)?)
            }
        }
    }
    Ok(overrides)
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|_| AppError::invalid_input(format!("'{value}' is not a valid number")))
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
