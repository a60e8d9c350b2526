//! Checkout job registry for scan-to-pay transactions.
//!
//! The checkout page creates a job per transaction and polls it; a separate
//! validating party (e.g. a point-of-sale terminal) finalizes it. A background
//! sweeper expires jobs that are never finalized:
//! - [`Job`] and [`JobStatus`]: per-transaction state machine
//! - [`JobRegistry`]: lock-protected table of jobs
//! - [`Sweeper`]: cancellable periodic expiry task
//! - [`ValidationProtocol`]: poll and finalize operations
//!
//! Jobs are kept in memory only and never evicted.

pub mod error;
pub mod job;
pub mod protocol;
pub mod registry;
pub mod sweeper;

pub use error::{CheckoutError, Result};
pub use job::{Job, JobStatus, Transition};
pub use protocol::{ProtocolResponse, ProtocolStatus, ValidationProtocol};
pub use registry::{
    DEFAULT_BUDGET, DEFAULT_STORE_LABEL, JobRegistry, RegistryConfig, SweepReport,
};
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, Sweeper, SweeperHandle, SweeperStatus};
