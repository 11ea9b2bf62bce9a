//! Resolving the server's configured time zone to UTC offsets.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// Look up a canonical time zone name, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns [Error::InvalidTimezone] if `canonical_timezone` is not a known
/// canonical time zone name.
pub fn get_timezone(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))
}

/// The UTC offset of `timezone` at the instant `at`.
pub fn offset_at(timezone: &Tz, at: OffsetDateTime) -> UtcOffset {
    timezone.get_offset_utc(&at).to_utc()
}
