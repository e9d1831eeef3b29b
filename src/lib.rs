//! Back-office client for temporary-rental availability: loads a property's
//! booking calendar from the brokerage REST API, validates reservations and
//! occupancies against it, and writes changes back.

pub mod availability;
pub mod client;
pub mod config;
pub mod logging;
pub mod models;
pub mod notify;
pub mod session;
