use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy status of a single availability range.
///
/// The backend speaks a loose vocabulary (`Ocupado`, `reservado`, ...). It is
/// folded into this enum once, when a range is decoded, and never re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeStatus {
    #[serde(rename = "disponible")]
    Available,
    #[serde(rename = "reservado_temp")]
    Reserved,
    #[serde(rename = "ocupado_temp")]
    Occupied,
}

impl RangeStatus {
    /// Map a raw status string onto the canonical status.
    ///
    /// Comparison is case-insensitive and accepts the legacy `reservado` and
    /// `ocupado` spellings. Returns `None` for anything else.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "disponible" => Some(Self::Available),
            "reservado" | "reservado_temp" => Some(Self::Reserved),
            "ocupado" | "ocupado_temp" => Some(Self::Occupied),
            _ => None,
        }
    }

    /// Canonical string sent to the backend.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Available => "disponible",
            Self::Reserved => "reservado_temp",
            Self::Occupied => "ocupado_temp",
        }
    }

    /// Reserved or occupied.
    pub fn is_booked(&self) -> bool {
        matches!(self, Self::Reserved | Self::Occupied)
    }
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A date interval of a property's calendar with its occupancy status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRange {
    pub id: String,
    /// First day, inclusive
    pub start_date: NaiveDate,
    /// Last day, inclusive
    pub end_date: NaiveDate,
    pub status: RangeStatus,
    pub client_name: String,
    pub deposit: f64,
    pub guests: u32,
}

impl AvailabilityRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of calendar days covered.
    pub fn len_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// A requested change to a property's calendar.
///
/// The backend merges it into its range set and answers with the
/// authoritative result.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeUpdate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RangeStatus,
    pub client_name: String,
    pub deposit: f64,
    pub guests: u32,
}

impl RangeUpdate {
    /// Mark `[start_date, end_date]` available, dropping any booking details.
    pub fn available(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            status: RangeStatus::Available,
            client_name: String::new(),
            deposit: 0.0,
            guests: 1,
        }
    }
}
