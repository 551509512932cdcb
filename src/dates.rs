use std::cell::Cell;

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, TimeZone};

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now". Every day key and streak comparison goes through the local
/// offset carried by the returned timestamp, never through UTC.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Wall-clock time `hour:minute` on `date` at a UTC offset of `offset_secs`.
    pub fn at(date: NaiveDate, hour: u32, minute: u32, offset_secs: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(offset_secs)?;
        let naive = date.and_hms_opt(hour, minute, 0)?;
        let now = offset.from_local_datetime(&naive).single()?;
        Some(Self::new(now))
    }

    pub fn advance_days(&self, days: i64) {
        let current = self.now.get();
        let next = if days >= 0 {
            current.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            current.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        self.now.set(next.unwrap_or(current));
    }

    pub fn advance_millis(&self, millis: i64) {
        let current = self.now.get();
        let next = current + chrono::Duration::milliseconds(millis);
        self.now.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}

pub fn today<C: Clock + ?Sized>(clock: &C) -> NaiveDate {
    clock.today()
}

/// Calendar arithmetic; an out-of-range result leaves the date unchanged.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

pub fn yesterday(date: NaiveDate) -> NaiveDate {
    add_days(date, -1)
}

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Strict `YYYY-MM-DD` parser.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DAY_KEY_FORMAT).ok()
}

/// Header text such as "Wednesday, January 10, 2024".
pub fn display_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, Utc};
    use chrono_tz::{America::Los_Angeles, Asia::Tokyo};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn zoned_clock<Tz: TimeZone>(utc: DateTime<Utc>, tz: &Tz) -> FixedClock {
        let local = utc.with_timezone(tz);
        let offset = local.offset().fix();
        FixedClock::new(local.with_timezone(&offset))
    }

    #[test]
    fn today_uses_local_date_ahead_of_utc() {
        // 20:30 UTC on the 9th is already the 10th in Tokyo.
        let utc = Utc.with_ymd_and_hms(2024, 1, 9, 20, 30, 0).unwrap();
        let clock = zoned_clock(utc, &Tokyo);
        assert_eq!(today(&clock), date(2024, 1, 10));
        assert_eq!(day_key(clock.today()), "2024-01-10");
    }

    #[test]
    fn today_uses_local_date_behind_utc() {
        // 03:00 UTC on the 10th is still the evening of the 9th in Los Angeles.
        let utc = Utc.with_ymd_and_hms(2024, 1, 10, 3, 0, 0).unwrap();
        let clock = zoned_clock(utc, &Los_Angeles);
        assert_eq!(today(&clock), date(2024, 1, 9));
    }

    #[test]
    fn add_days_crosses_month_year_and_leap_boundaries() {
        assert_eq!(add_days(date(2024, 1, 31), 1), date(2024, 2, 1));
        assert_eq!(add_days(date(2024, 2, 28), 1), date(2024, 2, 29));
        assert_eq!(add_days(date(2023, 2, 28), 1), date(2023, 3, 1));
        assert_eq!(add_days(date(2024, 1, 1), -1), date(2023, 12, 31));
        assert_eq!(add_days(date(2024, 3, 1), -1), date(2024, 2, 29));
        assert_eq!(add_days(date(2024, 1, 10), 0), date(2024, 1, 10));
        assert_eq!(add_days(date(2024, 1, 10), -9), date(2024, 1, 1));
        assert_eq!(yesterday(date(2024, 1, 10)), date(2024, 1, 9));
    }

    #[test]
    fn add_days_out_of_range_keeps_date() {
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(date(2024, 1, 10), i64::MIN), date(2024, 1, 10));
    }

    #[test]
    fn day_keys_are_strict() {
        assert_eq!(parse_day_key("2024-01-10"), Some(date(2024, 1, 10)));
        assert_eq!(parse_day_key(" 2024-01-10 "), Some(date(2024, 1, 10)));
        assert_eq!(parse_day_key("2024-1-10"), None);
        assert_eq!(parse_day_key("2024-02-30"), None);
        assert_eq!(parse_day_key("yesterday"), None);
        assert_eq!(day_key(date(2024, 3, 5)), "2024-03-05");
    }

    #[test]
    fn display_label_matches_long_header_format() {
        assert_eq!(display_label(date(2024, 1, 10)), "Wednesday, January 10, 2024");
    }

    #[test]
    fn fixed_clock_moves_only_on_request() {
        let clock = FixedClock::at(date(2024, 1, 10), 23, 59, 3600).unwrap();
        assert_eq!(clock.today(), date(2024, 1, 10));
        let before = clock.now_millis();
        clock.advance_millis(60_000);
        assert_eq!(clock.now_millis(), before + 60_000);
        assert_eq!(clock.today(), date(2024, 1, 11));
        clock.advance_days(-2);
        assert_eq!(clock.today(), date(2024, 1, 9));
    }
}
