//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reqwest client for the imaging service
//! - `sanitize`: PII filtering for logs

pub mod http;
pub mod sanitize;

pub use http::HttpImagingApi;
