//! Infrastructure layer module
//!
//! Configuration loading, logging setup and project initialization.
//! Storage and HTTP implementations of the domain ports live in `adapters`.

pub mod config;
pub mod logging;
pub mod setup;
