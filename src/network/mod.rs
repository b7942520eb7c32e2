//! HTTP networking module
//!
//! Provides the HTTP client and the process-wide rate limiter that gates
//! every request to the breach search API.

mod client;
mod limiter;

pub use client::{ApiResponse, HttpClient};
pub use limiter::{RateLimiter, RequestGate};
