//! Subcommand implementations.

pub mod init;
pub mod session;
pub mod sync;
