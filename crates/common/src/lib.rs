//! Shared types for the scan-to-pay checkout service.

pub mod types;

pub use types::{Money, TransactionId};
