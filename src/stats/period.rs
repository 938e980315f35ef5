//! Calendar months used as aggregation windows.

use std::{fmt::Display, ops::RangeInclusive};

use serde::Deserialize;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, macros::time};

use crate::Error;

/// The earliest year a [Period] may be created for.
pub const MIN_YEAR: i32 = 1970;
/// The latest year a [Period] may be created for.
pub const MAX_YEAR: i32 = 9999;

/// A calendar month of a particular year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    first_day: Date,
}

impl Period {
    /// Create the period for `month` (1 to 12) of `year`.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if `month` is not in 1..=12 or `year`
    /// is outside [MIN_YEAR]..=[MAX_YEAR].
    pub fn new(month: u8, year: i32) -> Result<Self, Error> {
        let invalid = || Error::InvalidPeriod(format!("{month}/{year}"));

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(invalid());
        }

        let month = Month::try_from(month).map_err(|_| invalid())?;
        let first_day = Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;

        Ok(Self { first_day })
    }

    /// The period containing `date`.
    pub fn containing(date: Date) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day()) - 1),
        }
    }

    /// The period containing the current date at `offset` from UTC.
    pub fn current(offset: UtcOffset) -> Self {
        Self::containing(OffsetDateTime::now_utc().to_offset(offset).date())
    }

    /// Build a period from optional query parameters, substituting the
    /// month or year of `today` for any value that is missing, malformed or
    /// out of range.
    pub fn from_query(query: &PeriodQuery, today: Date) -> Self {
        let month = query
            .month
            .as_deref()
            .and_then(|month| month.trim().parse::<u8>().ok())
            .filter(|month| (1..=12).contains(month))
            .unwrap_or_else(|| u8::from(today.month()));

        let year = query
            .year
            .as_deref()
            .and_then(|year| year.trim().parse::<i32>().ok())
            .filter(|year| (MIN_YEAR..=MAX_YEAR).contains(year))
            .unwrap_or_else(|| today.year());

        Self::new(month, year).unwrap_or_else(|_| Self::containing(today))
    }

    /// The month as a number from 1 to 12.
    pub fn month(&self) -> u8 {
        u8::from(self.first_day.month())
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        let mut day = self.first_day;

        while let Some(next_day) = day.next_day().filter(|next| next.month() == day.month()) {
            day = next_day;
        }

        day
    }

    /// The month before this one. January rolls back to December of the previous year.
    pub fn previous(&self) -> Self {
        Self::containing(self.first_day - Duration::days(1))
    }

    /// The instants covered by the month, from midnight on the first day to
    /// 23:59:59 on the last day.
    pub fn date_time_range(&self) -> RangeInclusive<PrimitiveDateTime> {
        PrimitiveDateTime::new(self.first_day, Time::MIDNIGHT)
            ..=PrimitiveDateTime::new(self.last_day(), time!(23:59:59))
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// The raw `month` and `year` query parameters of a statistics request.
///
/// Both are kept as strings so that malformed values fall back to defaults
/// in [Period::from_query] instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// The month, 1 to 12.
    pub month: Option<String>,
    /// The four digit year.
    pub year: Option<String>,
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::{
        Error,
        stats::period::{Period, PeriodQuery},
    };

    fn query(month: Option<&str>, year: Option<&str>) -> PeriodQuery {
        PeriodQuery {
            month: month.map(str::to_owned),
            year: year.map(str::to_owned),
        }
    }

    #[test]
    fn new_rejects_month_out_of_range() {
        assert_eq!(
            Period::new(13, 2024),
            Err(Error::InvalidPeriod("13/2024".to_owned()))
        );
        assert_eq!(
            Period::new(0, 2024),
            Err(Error::InvalidPeriod("0/2024".to_owned()))
        );
    }

    #[test]
    fn new_rejects_implausible_year() {
        assert!(Period::new(1, 1066).is_err());
        assert!(Period::new(1, 10_000).is_err());
    }

    #[test]
    fn containing_finds_first_of_month() {
        let period = Period::containing(date!(2024 - 03 - 17));

        assert_eq!(period.first_day(), date!(2024 - 03 - 01));
        assert_eq!(period.month(), 3);
        assert_eq!(period.year(), 2024);
    }

    #[test]
    fn last_day_handles_leap_years() {
        assert_eq!(
            Period::new(2, 2024).unwrap().last_day(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Period::new(2, 2023).unwrap().last_day(),
            date!(2023 - 02 - 28)
        );
        assert_eq!(
            Period::new(12, 9999).unwrap().last_day(),
            date!(9999 - 12 - 31)
        );
    }

    #[test]
    fn current_contains_today() {
        let today = time::OffsetDateTime::now_utc().date();

        let period = Period::current(time::UtcOffset::UTC);

        assert!(period.first_day() <= today && today <= period.last_day());
    }

    #[test]
    fn previous_rolls_back_over_year_boundary() {
        let january = Period::new(1, 2024).unwrap();

        assert_eq!(january.previous(), Period::new(12, 2023).unwrap());
    }

    #[test]
    fn previous_within_year() {
        let march = Period::new(3, 2024).unwrap();

        assert_eq!(march.previous(), Period::new(2, 2024).unwrap());
    }

    #[test]
    fn date_time_range_covers_whole_month() {
        let range = Period::new(3, 2024).unwrap().date_time_range();

        assert_eq!(*range.start(), datetime!(2024-03-01 00:00:00));
        assert_eq!(*range.end(), datetime!(2024-03-31 23:59:59));
    }

    #[test]
    fn from_query_uses_given_values() {
        let period = Period::from_query(&query(Some("3"), Some("2024")), date!(2025 - 10 - 18));

        assert_eq!(period, Period::new(3, 2024).unwrap());
    }

    #[test]
    fn from_query_defaults_missing_values_to_today() {
        let today = date!(2025 - 10 - 18);

        assert_eq!(
            Period::from_query(&query(None, None), today),
            Period::new(10, 2025).unwrap()
        );
        assert_eq!(
            Period::from_query(&query(Some("3"), None), today),
            Period::new(3, 2025).unwrap()
        );
        assert_eq!(
            Period::from_query(&query(None, Some("2024")), today),
            Period::new(10, 2024).unwrap()
        );
    }

    #[test]
    fn from_query_defaults_malformed_values_to_today() {
        let today = date!(2025 - 10 - 18);

        assert_eq!(
            Period::from_query(&query(Some("March"), Some("twenty")), today),
            Period::new(10, 2025).unwrap()
        );
        assert_eq!(
            Period::from_query(&query(Some("13"), Some("-4")), today),
            Period::new(10, 2025).unwrap()
        );
    }

    #[test]
    fn displays_as_year_and_month() {
        assert_eq!(Period::new(3, 2024).unwrap().to_string(), "2024-03");
    }
}
