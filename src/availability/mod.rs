//! Temporary-rental availability: per-day classification, booking
//! validation, the synchronized calendar store and the booking workflow.

pub mod classifier;
pub mod errors;
pub mod store;
pub mod validator;
pub mod workflow;

pub use classifier::{DayFlags, DayStatus};
pub use errors::{BookingError, StoreError};
pub use store::AvailabilityStore;
pub use validator::{DateSelection, Intent};
pub use workflow::{BookingForm, BookingWorkflow};
