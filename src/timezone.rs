//! Lookup of UTC offsets from canonical timezone names.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset for a canonical timezone name, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in the timezone with the given `offset`.
pub fn local_today(offset: UtcOffset) -> Date {
    OffsetDateTime::now_utc().to_offset(offset).date()
}

/// The instant `date` begins in a canonical timezone, using the offset in
/// effect on that day rather than today's.
///
/// Returns `None` if the name is not a known timezone.
pub fn start_of_day(date: Date, canonical_timezone: &str) -> Option<OffsetDateTime> {
    let timezone = time_tz::timezones::get_by_name(canonical_timezone)?;
    let midnight = date.midnight();

    // The offset at UTC midnight is a guess that is only wrong when a
    // transition falls between UTC midnight and local midnight.
    let guess = timezone.get_offset_utc(&midnight.assume_utc()).to_utc();
    let offset = timezone
        .get_offset_utc(&midnight.assume_offset(guess))
        .to_utc();

    Some(midnight.assume_offset(offset))
}
