//! Resilience helpers for calls to external services
//!
//! Every inference call is bounded by a deadline. Retries are left to the
//! caller, which already degrades to fallback text.

pub mod timeout;

pub use timeout::{within_deadline, Bounded, DeadlineExceeded};
