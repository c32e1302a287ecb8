//! Day counter advanced by simulated time.

use std::{ops::RangeInclusive, time::Duration};

use transit_core::whole_periods;

/// Day counter driven by simulated time.
///
/// Time left over after a rollover carries into the next day, so the number
/// of days elapsed does not depend on how the time was split into ticks.
#[derive(Clone, Debug)]
pub(crate) struct DayClock {
    day: u32,
    into_day: Duration,
    day_duration: Duration,
}

impl DayClock {
    pub(crate) const FIRST_DAY: u32 = 1;

    pub(crate) fn new(day_duration: Duration) -> Self {
        Self {
            day: Self::FIRST_DAY,
            into_day: Duration::ZERO,
            day_duration,
        }
    }

    pub(crate) const fn day(&self) -> u32 {
        self.day
    }

    pub(crate) fn time_until_next_day(&self) -> Duration {
        self.day_duration.saturating_sub(self.into_day)
    }

    /// Advances the clock and returns the days that started during `dt`.
    pub(crate) fn advance(&mut self, dt: Duration) -> RangeInclusive<u32> {
        let first = self.day.saturating_add(1);
        if self.day_duration.is_zero() {
            return first..=self.day;
        }

        let (days, into_day) = whole_periods(self.into_day.saturating_add(dt), self.day_duration);
        self.into_day = into_day;
        self.day = self
            .day
            .saturating_add(u32::try_from(days).unwrap_or(u32::MAX));
        first..=self.day
    }
}
