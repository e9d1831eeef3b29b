//! Allow/deny checks for booking actions against the current range set.
//!
//! Checks walk the requested interval day by day; a conflict on any day
//! voids the whole request. There is no partial booking.

use crate::availability::classifier::{days, is_date_available, is_date_booked, is_date_occupied, is_date_reserved};
use crate::availability::errors::BookingError;
use crate::models::{AvailabilityRange, RangeStatus};
use chrono::NaiveDate;

/// What the user is trying to do with a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Reserve,
    Occupy,
    /// Mark available
    Free,
}

impl Intent {
    /// Status the affected range ends up with
    pub fn target_status(&self) -> RangeStatus {
        match self {
            Self::Reserve => RangeStatus::Reserved,
            Self::Occupy => RangeStatus::Occupied,
            Self::Free => RangeStatus::Available,
        }
    }
}

/// A selected, inclusive date interval with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSelection {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSelection {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        if start > end {
            return Err(BookingError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// A selection covering one day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        days(self.start, self.end)
    }
}

/// Any day reserved or occupied
pub fn is_range_booked(selection: &DateSelection, ranges: &[AvailabilityRange]) -> bool {
    selection.days().any(|day| is_date_booked(day, ranges))
}

/// Every day covered by an available range.
///
/// An empty range set is never fully available: days must be opened
/// explicitly before they can be reserved.
pub fn is_range_fully_available(selection: &DateSelection, ranges: &[AvailabilityRange]) -> bool {
    !ranges.is_empty() && selection.days().all(|day| is_date_available(day, ranges))
}

/// Any day occupied
pub fn is_range_occupied(selection: &DateSelection, ranges: &[AvailabilityRange]) -> bool {
    selection.days().any(|day| is_date_occupied(day, ranges))
}

/// Every day available or reserved
pub fn is_range_bookable_or_occupiable(selection: &DateSelection, ranges: &[AvailabilityRange]) -> bool {
    !ranges.is_empty()
        && selection
            .days()
            .all(|day| is_date_available(day, ranges) || is_date_reserved(day, ranges))
}

/// Decide whether `intent` may be applied to `selection`.
///
/// `guests` is only checked for reservations and occupancies.
pub fn validate(
    intent: Intent,
    selection: &DateSelection,
    guests: u32,
    capacity: u32,
    ranges: &[AvailabilityRange],
) -> Result<(), BookingError> {
    match intent {
        Intent::Free => Ok(()),
        Intent::Reserve => {
            check_capacity(guests, capacity)?;
            if is_range_booked(selection, ranges) {
                return Err(BookingError::OverlapsBooking);
            }
            if !is_range_fully_available(selection, ranges) {
                return Err(BookingError::NotFullyAvailable);
            }
            Ok(())
        }
        Intent::Occupy => {
            check_capacity(guests, capacity)?;
            if is_range_occupied(selection, ranges) {
                return Err(BookingError::AlreadyOccupied);
            }
            if !is_range_bookable_or_occupiable(selection, ranges) {
                return Err(BookingError::NotOpenForOccupancy);
            }
            Ok(())
        }
    }
}

fn check_capacity(guests: u32, capacity: u32) -> Result<(), BookingError> {
    if guests > capacity {
        return Err(BookingError::ExceedsCapacity {
            requested: guests,
            capacity,
        });
    }
    Ok(())
}
