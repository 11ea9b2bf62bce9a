//! The calendar periods that windowed statistics are computed over.

use std::ops::Range;

use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};

/// A calendar period containing the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsWindow {
    /// The current local day.
    Day,
    /// The current local week, starting on Monday.
    Week,
    /// The current local month.
    Month,
}

impl StatsWindow {
    /// A short, human readable name for the window.
    pub fn label(self) -> &'static str {
        match self {
            StatsWindow::Day => "Daily",
            StatsWindow::Week => "Weekly",
            StatsWindow::Month => "Monthly",
        }
    }
}

/// The half-open range of instants covered by `window` at `now`.
///
/// Calendar boundaries are taken in local time, where `offset_at` gives the
/// UTC offset in effect at an instant. Each end of the range uses the offset
/// at its own local midnight, so a day with a daylight saving change is 23 or
/// 25 hours long.
pub fn window_range(
    window: StatsWindow,
    now: OffsetDateTime,
    offset_at: impl Fn(OffsetDateTime) -> UtcOffset,
) -> Range<OffsetDateTime> {
    let today = now.to_offset(offset_at(now)).date();

    let (start, end) = match window {
        StatsWindow::Day => (today, today + Duration::days(1)),
        StatsWindow::Week => week_bounds(today),
        StatsWindow::Month => month_bounds(today),
    };

    local_midnight(start, &offset_at)..local_midnight(end, &offset_at)
}

/// The instant of local midnight at the start of `date`.
fn local_midnight(
    date: Date,
    offset_at: impl Fn(OffsetDateTime) -> UtcOffset,
) -> OffsetDateTime {
    let midnight = date.midnight();
    // The offset at UTC midnight is a first guess that is off by at most one
    // change, so checking it once at the guessed instant settles it.
    let guess = midnight.assume_offset(offset_at(midnight.assume_utc()));

    midnight.assume_offset(offset_at(guess))
}

fn week_bounds(date: Date) -> (Date, Date) {
    let days_since_monday = date.weekday().number_days_from_monday() as i64;
    let start = date - Duration::days(days_since_monday);

    (start, start + Duration::days(7))
}

fn month_bounds(date: Date) -> (Date, Date) {
    let start = date - Duration::days(date.day() as i64 - 1);
    let length = last_day_of_month(date.year(), date.month()) as i64;

    (start, start + Duration::days(length))
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if time::util::is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

#[cfg(test)]
mod window_range_tests {
    use time::{
        OffsetDateTime, UtcOffset,
        macros::{datetime, offset},
    };

    use super::{StatsWindow, window_range};

    fn utc(_: OffsetDateTime) -> UtcOffset {
        UtcOffset::UTC
    }

    /// Auckland around the end of daylight saving on 2025-04-06.
    fn auckland_april_2025(at: OffsetDateTime) -> UtcOffset {
        if at < datetime!(2025-04-05 14:00 UTC) {
            offset!(+13)
        } else {
            offset!(+12)
        }
    }

    #[test]
    fn day_covers_local_midnight_to_midnight() {
        let range = window_range(
            StatsWindow::Day,
            datetime!(2025-03-14 15:30 UTC),
            utc,
        );

        assert_eq!(range.start, datetime!(2025-03-14 00:00 UTC));
        assert_eq!(range.end, datetime!(2025-03-15 00:00 UTC));
    }

    #[test]
    fn day_uses_local_date() {
        // 23:30 UTC on the 14th is already the 15th in Auckland.
        let range = window_range(
            StatsWindow::Day,
            datetime!(2025-03-14 23:30 UTC),
            |_| offset!(+13),
        );

        assert_eq!(range.start, datetime!(2025-03-15 00:00 +13));
        assert_eq!(range.end, datetime!(2025-03-16 00:00 +13));
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-03-16 is a Sunday.
        let range = window_range(
            StatsWindow::Week,
            datetime!(2025-03-16 12:00 UTC),
            utc,
        );

        assert_eq!(range.start, datetime!(2025-03-10 00:00 UTC));
        assert_eq!(range.end, datetime!(2025-03-17 00:00 UTC));
    }

    #[test]
    fn week_on_monday_starts_today() {
        let range = window_range(
            StatsWindow::Week,
            datetime!(2025-03-10 00:00 UTC),
            utc,
        );

        assert_eq!(range.start, datetime!(2025-03-10 00:00 UTC));
    }

    #[test]
    fn month_covers_whole_month() {
        let range = window_range(
            StatsWindow::Month,
            datetime!(2025-12-31 23:59 UTC),
            utc,
        );

        assert_eq!(range.start, datetime!(2025-12-01 00:00 UTC));
        assert_eq!(range.end, datetime!(2026-01-01 00:00 UTC));
    }

    #[test]
    fn february_handles_leap_years() {
        let leap = window_range(
            StatsWindow::Month,
            datetime!(2024-02-10 08:00 UTC),
            utc,
        );
        let common = window_range(
            StatsWindow::Month,
            datetime!(2025-02-10 08:00 UTC),
            utc,
        );

        assert_eq!(leap.end, datetime!(2024-03-01 00:00 UTC));
        assert_eq!(common.end, datetime!(2025-03-01 00:00 UTC));
    }

    #[test]
    fn day_bounds_follow_daylight_saving_change() {
        let range = window_range(
            StatsWindow::Day,
            datetime!(2025-04-06 00:00 UTC),
            auckland_april_2025,
        );

        assert_eq!(range.start, datetime!(2025-04-06 00:00 +13));
        assert_eq!(range.end, datetime!(2025-04-07 00:00 +12));
        assert_eq!(range.end - range.start, time::Duration::hours(25));
    }
}
