//! Domain layer for the scan session store
//!
//! This module contains core business logic, domain models and the port
//! traits that storage and backend adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
