//! Fare-search provider: request payloads, the HTTP client and the
//! on-disk store of raw responses.

pub mod batch;
pub mod client;
pub mod store;
pub mod types;

pub use batch::{execute, BatchOutcome};
pub use client::{FareSearch, QpxClient, DEFAULT_ENDPOINT};
pub use store::ResponseStore;
pub use types::{FareError, FareRequest, FareResponse, DEFAULT_SOLUTIONS};
