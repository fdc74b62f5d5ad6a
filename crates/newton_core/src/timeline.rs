//! Growable window of calendar days backing the horizontal day timeline.
//!
//! The window starts centred on today and only ever widens. The presentation
//! layer reports when the user scrolls near either end; each report widens
//! that end by a fixed number of days, unless any expansion happened less
//! than the cooldown ago. One cooldown timestamp is shared by both edges so a
//! burst of edge reports can never run away while new columns are still
//! being laid out.

use crate::clock::{Clock, SystemClock};
use crate::day::day_id;
use crate::error::AppError;
use std::time::{Duration, Instant};
use time::Date;
use tracing::debug;

pub const DEFAULT_INITIAL_RADIUS_DAYS: u32 = 30;
pub const DEFAULT_EXPAND_BY_DAYS: u32 = 14;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSettings {
    pub initial_radius_days: u32,
    pub expand_by_days: u32,
    pub cooldown: Duration,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            initial_radius_days: DEFAULT_INITIAL_RADIUS_DAYS,
            expand_by_days: DEFAULT_EXPAND_BY_DAYS,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// Inclusive range of days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: Date,
    end: Date,
}

impl DateWindow {
    pub fn new(start: Date, end: Date) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::invalid_input("window start must not be after end"));
        }
        Ok(Self { start, end })
    }

    pub fn around(center: Date, radius_days: u32) -> Self {
        Self {
            start: shift_back(center, radius_days),
            end: shift_forward(center, radius_days),
        }
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    pub fn len(&self) -> usize {
        let days = (self.end - self.start).whole_days();
        usize::try_from(days).unwrap_or(0) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn position(&self, date: Date) -> Option<usize> {
        if !self.contains(date) {
            return None;
        }
        usize::try_from((date - self.start).whole_days()).ok()
    }

    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

/// Ascending walk over the days of a [`DateWindow`].
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<Date>,
    end: Date,
}

impl Iterator for Days {
    type Item = Date;

    fn next(&mut self) -> Option<Date> {
        let current = self.next.filter(|date| *date <= self.end)?;
        self.next = current.next_day();
        Some(current)
    }
}

pub struct DateWindowManager<C = SystemClock> {
    clock: C,
    settings: TimelineSettings,
    window: DateWindow,
    last_expansion: Option<Instant>,
}

impl<C: Clock> DateWindowManager<C> {
    pub fn new(clock: C, settings: TimelineSettings) -> Self {
        let window = DateWindow::around(clock.today(), settings.initial_radius_days);
        Self {
            clock,
            settings,
            window,
            last_expansion: None,
        }
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn visible_days(&self) -> Vec<Date> {
        self.window.days().collect()
    }

    pub fn visible_day_ids(&self) -> Vec<String> {
        self.window.days().map(day_id).collect()
    }

    pub fn locate_today(&self) -> String {
        day_id(self.clock.today())
    }

    /// Where today sits in [`visible_days`](Self::visible_days), if the
    /// window still covers it.
    pub fn today_index(&self) -> Option<usize> {
        self.window.position(self.clock.today())
    }

    pub fn on_approaching_left_edge(&mut self) -> bool {
        self.on_edge(Edge::Left)
    }

    pub fn on_approaching_right_edge(&mut self) -> bool {
        self.on_edge(Edge::Right)
    }

    /// Returns `true` when the window grew. A trigger at the calendar limit
    /// still starts the cooldown.
    pub fn on_edge(&mut self, edge: Edge) -> bool {
        let now = self.clock.instant();
        if let Some(last) = self.last_expansion
            && now.saturating_duration_since(last) < self.settings.cooldown
        {
            debug!(?edge, "window expansion suppressed by cooldown");
            return false;
        }

        self.last_expansion = Some(now);
        let before = self.window;
        let by = self.settings.expand_by_days;
        match edge {
            Edge::Left => self.window.start = shift_back(self.window.start, by),
            Edge::Right => self.window.end = shift_forward(self.window.end, by),
        }
        if self.window == before {
            debug!(?edge, "window already at the calendar limit");
            return false;
        }

        debug!(
            ?edge,
            start = %day_id(self.window.start),
            end = %day_id(self.window.end),
            "window expanded"
        );
        true
    }
}

fn shift_back(date: Date, days: u32) -> Date {
    date.checked_sub(time::Duration::days(i64::from(days)))
        .unwrap_or(Date::MIN)
}

fn shift_forward(date: Date, days: u32) -> Date {
    date.checked_add(time::Duration::days(i64::from(days)))
        .unwrap_or(Date::MAX)
}
