//! Checkout error types.

use common::{Money, TransactionId};
use thiserror::Error;

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The transaction id was never created.
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(TransactionId),

    /// The cart collaborator handed over a negative total.
    #[error("Invalid price: {0}")]
    InvalidPrice(Money),

    /// The timeout sweeper stopped; no job will expire from now on.
    #[error("Timeout sweeper terminated: {0}")]
    SweeperFatal(String),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
