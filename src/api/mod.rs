//! Reader server API client.
//!
//! One request per operation, no retries, no cancellation. The server's
//! `success` field is the only application-level error signal; transport
//! failures surface as [`ApiError`] and are handled (or deliberately not
//! handled) by the caller.

mod client;
mod types;

pub use client::{ApiClient, ApiError, Flag};
pub use types::{FeedMoreResponse, FeedQuery, ReadAllRequest, ToggleResponse};
