//! HTTP adapters for the imaging backend.

pub mod scan_api_client;

pub use scan_api_client::HttpScanApiClient;
