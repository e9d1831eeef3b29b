pub mod errors;
pub mod http;
pub mod json;
pub mod traits;
pub mod types;
pub mod wire;

pub use errors::ApiError;
pub use http::RentalClient;
pub use traits::{AvailabilityService, PropertySource};
pub use types::SearchParams;
