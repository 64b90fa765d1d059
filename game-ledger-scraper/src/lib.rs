//! HTTP client core and source adapters.
//!
//! [`HttpClient`] wraps `reqwest` with per-source rate limiting, retry
//! backoff, a response cache, optional browser-header spoofing and an
//! immediate-stop policy. [`SourceAdapter`] is the contract every external
//! source implements on top of it.

pub mod adapter;
pub mod adapters;
pub mod backoff;
pub mod cache;
pub mod client;
pub mod credentials;
pub mod error;
pub mod headers;
pub mod rate_limit;

pub use adapter::{AdapterRegistry, SourceAdapter};
pub use adapters::{build_adapter, build_registry};
pub use backoff::{Backoff, BackoffPolicy, FailureReason};
pub use cache::Payload;
pub use client::{ClientConfig, HttpClient, Request};
pub use credentials::{ApiKey, ApiKeys, KeySource};
pub use error::ScrapeError;
pub use rate_limit::{RateLimit, RateLimiter, RequestBudget, TimeUnit};
