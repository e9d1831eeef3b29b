use crate::client::ApiError;

/// Failures of the availability store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no property is open")]
    NoPropertySelected,
    #[error("range {0} not found")]
    RangeNotFound(String),
    #[error("another change is still being saved")]
    Busy,
    /// The view changed while the request was in flight; its response was dropped
    #[error("response dropped for a superseded request")]
    Superseded,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Reasons a booking action is refused or fails
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Please select a date range.")]
    NoDatesSelected,
    #[error("The start date must not be after the end date.")]
    InvalidRange,
    #[error("Please fill in the client name and the number of guests.")]
    MissingClientDetails,
    #[error("The deposit cannot be negative.")]
    InvalidDeposit,
    #[error("The number of guests ({requested}) exceeds the property's capacity ({capacity}).")]
    ExceedsCapacity { requested: u32, capacity: u32 },
    #[error("The selected range overlaps dates that are already reserved or occupied.")]
    OverlapsBooking,
    #[error("Only dates explicitly marked as available can be reserved.")]
    NotFullyAvailable,
    #[error("The selected range overlaps dates that are already occupied.")]
    AlreadyOccupied,
    #[error("Only dates marked as available or reserved can be occupied.")]
    NotOpenForOccupancy,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Detected locally, before anything was sent
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

impl From<ApiError> for BookingError {
    fn from(err: ApiError) -> Self {
        Self::Store(StoreError::Api(err))
    }
}
