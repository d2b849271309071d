//! Calendar-day arithmetic in a single reference zone.
//!
//! Every post carries a UTC instant. Whether two instants fall on "the same
//! day" depends on where the wall clock hangs, so all day-level comparisons go
//! through [`calendar_day`] with one fixed [`UtcOffset`].

use crate::{
    model::post::Post,
    util::{from_offset_date_time, to_offset_date_time},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{
    Date, Duration, Month, PrimitiveDateTime, Time, UtcDateTime, UtcOffset, error::ComponentRange,
};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum CalendarError {
    #[error("Invalid calendar component: {0}")]
    Component(#[from] ComponentRange),
    #[error("Date lies outside the supported range")]
    OutOfRange,
}

/// The calendar day `instant` falls on, as seen from `zone`.
#[must_use]
pub fn calendar_day(instant: UtcDateTime, zone: UtcOffset) -> Date {
    to_offset_date_time(instant)
        .checked_to_offset(zone)
        .map_or(instant.date(), |local| local.date())
}

/// Interprets a wall-clock date and time in `zone` and returns the instant.
///
/// Fails if the instant cannot be stored as a timestamp, see
/// [`TIMESTAMP_YEARS`](crate::util::TIMESTAMP_YEARS).
pub fn local_to_utc(
    date: Date,
    time: Time,
    zone: UtcOffset,
) -> Result<UtcDateTime, CalendarError> {
    from_offset_date_time(PrimitiveDateTime::new(date, time).assume_offset(zone))
        .ok_or(CalendarError::OutOfRange)
}

/// All days shown on a month page: whole weeks, Sunday first, starting on or
/// before the 1st and ending on or after the last day of the month.
pub fn month_grid(year: i32, month: Month) -> Result<Vec<Date>, CalendarError> {
    let first = Date::from_calendar_date(year, month, 1)?;
    #[allow(deprecated)]
    let last = Date::from_calendar_date(year, month, time::util::days_in_year_month(year, month))?;

    let start = first
        .checked_sub(Duration::days(i64::from(
            first.weekday().number_days_from_sunday(),
        )))
        .ok_or(CalendarError::OutOfRange)?;
    let end = last
        .checked_add(Duration::days(i64::from(
            6 - last.weekday().number_days_from_sunday(),
        )))
        .ok_or(CalendarError::OutOfRange)?;

    let mut days = Vec::with_capacity(6 * DAYS_PER_WEEK);
    let mut day = start;
    loop {
        days.push(day);
        if day == end {
            break;
        }
        day = day.next_day().ok_or(CalendarError::OutOfRange)?;
    }

    Ok(days)
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CalendarDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub posts: Vec<Post>,
    pub is_current_month: bool,
    pub is_today: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u8,
    pub weeks: Vec<Vec<CalendarDay>>,
}

impl CalendarMonth {
    /// Lays out `month` and fills every cell with `posts_on(day)`.
    pub fn build<F>(
        year: i32,
        month: Month,
        today: Date,
        mut posts_on: F,
    ) -> Result<Self, CalendarError>
    where
        F: FnMut(Date) -> Vec<Post>,
    {
        let days = month_grid(year, month)?;
        let weeks = days
            .chunks(DAYS_PER_WEEK)
            .map(|week| {
                week.iter()
                    .map(|&date| CalendarDay {
                        date,
                        posts: posts_on(date),
                        is_current_month: date.year() == year && date.month() == month,
                        is_today: date == today,
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            year,
            month: month.into(),
            weeks,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::calendar::{CalendarError, CalendarMonth, calendar_day, local_to_utc, month_grid};
    use time::{
        Month, UtcOffset,
        macros::{date, offset, time, utc_datetime},
    };

    #[test]
    fn same_day_regardless_of_time() {
        let morning = utc_datetime!(2024-01-05 09:00);
        let night = utc_datetime!(2024-01-05 23:30);

        assert_eq!(calendar_day(morning, UtcOffset::UTC), date!(2024-01-05));
        assert_eq!(calendar_day(night, UtcOffset::UTC), date!(2024-01-05));
    }

    #[test]
    fn zone_moves_day_boundary() {
        let late = utc_datetime!(2024-01-05 23:30);
        let early = utc_datetime!(2024-01-05 03:00);

        assert_eq!(calendar_day(late, offset!(+2)), date!(2024-01-06));
        assert_eq!(calendar_day(early, offset!(-5)), date!(2024-01-04));
    }

    #[test]
    fn local_time_converts_to_utc() {
        assert_eq!(
            local_to_utc(date!(2024-01-06), time!(01:30), offset!(+2)),
            Ok(utc_datetime!(2024-01-05 23:30))
        );
        assert_eq!(
            local_to_utc(date!(2024-01-05), time!(09:00), UtcOffset::UTC),
            Ok(utc_datetime!(2024-01-05 09:00))
        );
    }

    #[test]
    fn local_time_outside_timestamp_range() {
        assert_eq!(
            local_to_utc(date!(9999-12-31), time!(23:30), offset!(-2)),
            Err(CalendarError::OutOfRange)
        );
        assert_eq!(
            local_to_utc(date!(0000-01-01), time!(00:30), offset!(+2)),
            Err(CalendarError::OutOfRange)
        );
    }

    #[test]
    fn grid_pads_to_whole_weeks() {
        let days = month_grid(2024, Month::January).unwrap();

        assert_eq!(days.len(), 35);
        assert_eq!(days.first(), Some(&date!(2023-12-31)));
        assert_eq!(days.last(), Some(&date!(2024-02-03)));
    }

    #[test]
    fn grid_without_padding() {
        let days = month_grid(2026, Month::February).unwrap();

        assert_eq!(days.len(), 28);
        assert_eq!(days.first(), Some(&date!(2026-02-01)));
        assert_eq!(days.last(), Some(&date!(2026-02-28)));
    }

    #[test]
    fn month_cells() {
        let month = CalendarMonth::build(2024, Month::January, date!(2024-01-05), |_| Vec::new())
            .unwrap();

        assert_eq!(month.month, 1);
        assert_eq!(month.weeks.len(), 5);
        assert!(month.weeks.iter().all(|week| week.len() == 7));

        let first_cell = &month.weeks[0][0];
        assert_eq!(first_cell.date, date!(2023-12-31));
        assert!(!first_cell.is_current_month);

        let today: Vec<_> = month
            .weeks
            .iter()
            .flatten()
            .filter(|day| day.is_today)
            .collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].date, date!(2024-01-05));
        assert!(today[0].is_current_month);
    }
}
