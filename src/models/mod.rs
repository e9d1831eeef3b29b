mod range;
mod user;

pub use range::{AvailabilityRange, RangeStatus, RangeUpdate};
pub use user::{UserProfile, UserRole};

use serde::{Deserialize, Serialize};

/// Property-level status (`estado`) as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyStatus {
    Available,
    Unavailable,
    Reserved,
    Occupied,
    Other(String),
}

impl PropertyStatus {
    /// Fold a raw `estado` into a status. Missing or blank means available.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Available;
        };

        if raw.eq_ignore_ascii_case("no disponible") {
            return Self::Unavailable;
        }

        match RangeStatus::normalize(raw) {
            Some(RangeStatus::Available) => Self::Available,
            Some(RangeStatus::Reserved) => Self::Reserved,
            Some(RangeStatus::Occupied) => Self::Occupied,
            None => Self::Other(raw.to_lowercase()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Available => "disponible",
            Self::Unavailable => "no disponible",
            Self::Reserved => "reservado_temp",
            Self::Occupied => "ocupado_temp",
            Self::Other(raw) => raw,
        }
    }
}

/// A temporary-rental unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    /// Maximum number of guests
    pub capacity: u32,
    pub min_stay_nights: u32,
    pub check_in_time: String,
    pub check_out_time: String,
    pub currency: String,
    pub price_per_night: f64,
    pub price_per_week: f64,
    pub price_per_month: f64,
    pub status: PropertyStatus,
    pub availability: Vec<AvailabilityRange>,
}

/// A property's calendar as last reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySnapshot {
    pub status: PropertyStatus,
    pub ranges: Vec<AvailabilityRange>,
}

impl Default for AvailabilitySnapshot {
    fn default() -> Self {
        Self {
            status: PropertyStatus::Available,
            ranges: Vec::new(),
        }
    }
}
