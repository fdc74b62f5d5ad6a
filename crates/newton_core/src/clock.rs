use crate::day::local_offset;
use std::cell::Cell;
use std::time::{Duration, Instant};
use time::{Date, OffsetDateTime, UtcOffset};

/// Source of time for the store and the timeline.
///
/// `instant` is monotonic and only used to measure elapsed time between
/// window expansions. `now_utc` stamps tasks and change log entries.
/// `offset` places those stamps on the wall clock.
pub trait Clock {
    fn instant(&self) -> Instant;

    fn now_utc(&self) -> OffsetDateTime;

    fn offset(&self) -> UtcOffset {
        local_offset()
    }

    fn today(&self) -> Date {
        self.now_utc().to_offset(self.offset()).date()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn instant(&self) -> Instant {
        (**self).instant()
    }

    fn now_utc(&self) -> OffsetDateTime {
        (**self).now_utc()
    }

    fn offset(&self) -> UtcOffset {
        (**self).offset()
    }

    fn today(&self) -> Date {
        (**self).today()
    }
}

/// Clock that only moves when told to. It reads as UTC so results do not
/// depend on the host time zone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Cell<Instant>,
    now: Cell<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            instant: Cell::new(Instant::now()),
            now: Cell::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.instant.set(self.instant.get() + by);
        self.now.set(self.now.get() + by);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        self.instant.get()
    }

    fn now_utc(&self) -> OffsetDateTime {
        self.now.get()
    }

    fn offset(&self) -> UtcOffset {
        UtcOffset::UTC
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};
    use time::macros::{date, datetime};

    #[test]
    fn manual_clock_advances_both_readings() {
        let clock = ManualClock::new(datetime!(2025-12-20 23:59:59.5 UTC));
        let start = clock.instant();

        clock.advance_millis(800);

        assert_eq!(clock.instant().duration_since(start).as_millis(), 800);
        assert_eq!(clock.today(), date!(2025 - 12 - 21));
    }
}
