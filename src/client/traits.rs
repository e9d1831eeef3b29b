use crate::client::errors::ApiError;
use crate::client::types::SearchParams;
use crate::models::{AvailabilitySnapshot, Property, RangeUpdate};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Remote persistence of a property's availability calendar.
///
/// Implemented by the HTTP client; tests swap in an in-memory backend.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Current calendar of a property
    async fn fetch_availability(&self, property_id: &str) -> Result<AvailabilitySnapshot, ApiError>;

    /// Merge `update` into the property's calendar and return the result
    async fn upsert_range(
        &self,
        property_id: &str,
        update: &RangeUpdate,
    ) -> Result<AvailabilitySnapshot, ApiError>;

    /// Remove one range by id
    async fn delete_range(&self, property_id: &str, range_id: &str) -> Result<(), ApiError>;

    /// Flip one calendar day between booked and not booked
    async fn toggle_day(
        &self,
        property_id: &str,
        date: NaiveDate,
    ) -> Result<AvailabilitySnapshot, ApiError>;
}

/// Source of property listings
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Properties matching the given filters
    async fn search(&self, params: &SearchParams) -> Result<Vec<Property>, ApiError>;

    /// A single property by id
    async fn property(&self, property_id: &str) -> Result<Property, ApiError>;
}
