//! Per-day classification of a property's calendar.
//!
//! Everything here is a pure function of the range set, so callers
//! re-derive it from the store's current ranges instead of caching it.

use crate::models::{AvailabilityRange, RangeStatus};
use chrono::{Datelike, NaiveDate};

/// Occupancy of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayStatus {
    /// Not covered by any range; cannot be booked until opened
    Unset,
    Available,
    Reserved,
    Occupied,
}

impl DayStatus {
    pub fn is_booked(&self) -> bool {
        matches!(self, Self::Reserved | Self::Occupied)
    }
}

impl From<RangeStatus> for DayStatus {
    fn from(status: RangeStatus) -> Self {
        match status {
            RangeStatus::Available => Self::Available,
            RangeStatus::Reserved => Self::Reserved,
            RangeStatus::Occupied => Self::Occupied,
        }
    }
}

/// Classification flags of a day. At most one is set; none means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayFlags {
    pub available: bool,
    pub reserved: bool,
    pub occupied: bool,
}

impl DayFlags {
    pub fn is_booked(&self) -> bool {
        self.reserved || self.occupied
    }

    pub fn status(&self) -> DayStatus {
        if self.occupied {
            DayStatus::Occupied
        } else if self.reserved {
            DayStatus::Reserved
        } else if self.available {
            DayStatus::Available
        } else {
            DayStatus::Unset
        }
    }
}

impl From<DayStatus> for DayFlags {
    fn from(status: DayStatus) -> Self {
        Self {
            available: status == DayStatus::Available,
            reserved: status == DayStatus::Reserved,
            occupied: status == DayStatus::Occupied,
        }
    }
}

fn precedence(status: RangeStatus) -> u8 {
    match status {
        RangeStatus::Available => 0,
        RangeStatus::Reserved => 1,
        RangeStatus::Occupied => 2,
    }
}

/// Status of `date` given `ranges`.
///
/// Ranges are inclusive on both ends. When overlapping ranges disagree the
/// strongest status wins: occupied, then reserved, then available.
pub fn day_status(date: NaiveDate, ranges: &[AvailabilityRange]) -> DayStatus {
    ranges
        .iter()
        .filter(|range| range.contains(date))
        .map(|range| range.status)
        .max_by_key(|status| precedence(*status))
        .map(DayStatus::from)
        .unwrap_or(DayStatus::Unset)
}

pub fn classify(date: NaiveDate, ranges: &[AvailabilityRange]) -> DayFlags {
    day_status(date, ranges).into()
}

pub fn is_date_available(date: NaiveDate, ranges: &[AvailabilityRange]) -> bool {
    classify(date, ranges).available
}

pub fn is_date_reserved(date: NaiveDate, ranges: &[AvailabilityRange]) -> bool {
    classify(date, ranges).reserved
}

pub fn is_date_occupied(date: NaiveDate, ranges: &[AvailabilityRange]) -> bool {
    classify(date, ranges).occupied
}

pub fn is_date_booked(date: NaiveDate, ranges: &[AvailabilityRange]) -> bool {
    classify(date, ranges).is_booked()
}

/// Every day from `start` to `end`, inclusive. Empty when `start > end`.
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Status of every day of a month, in order. `None` for an invalid month.
pub fn month(year: i32, month: u32, ranges: &[AvailabilityRange]) -> Option<Vec<(NaiveDate, DayStatus)>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(
        first
            .iter_days()
            .take_while(|day| day.month() == month)
            .map(|day| (day, day_status(day, ranges)))
            .collect(),
    )
}
