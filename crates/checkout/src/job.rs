//! Checkout job and its state machine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{Money, TransactionId};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// The status of a checkout job.
///
/// State transitions:
/// ```text
/// Waiting ──┬──► Completed
///           └──► TimedOut
/// ```
/// Both terminal states are final: a late completion never revives a timed
/// out job, and a sweep never expires a completed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    /// Waiting for the validating party to finalize.
    #[default]
    Waiting,

    /// Payment was finalized (terminal state).
    Completed,

    /// The time budget ran out before finalization (terminal state).
    TimedOut,
}

impl JobStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::TimedOut)
    }

    /// Returns the status as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Completed => "completed",
            JobStatus::TimedOut => "timedOut",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a state machine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The job moved to the requested state.
    Applied,
    /// The job was already in the requested state.
    Unchanged,
    /// The job sits in the other terminal state and was left alone.
    Refused,
}

/// One in-flight checkout transaction.
#[derive(Debug, Clone)]
pub struct Job {
    id: TransactionId,
    price: Money,
    status: JobStatus,
    remaining: Duration,
    store_label: Arc<str>,
    created_at: DateTime<Utc>,
    last_decay: Instant,
}

impl Job {
    /// Creates a waiting job with a full time budget.
    pub fn new(
        id: TransactionId,
        price: Money,
        budget: Duration,
        store_label: Arc<str>,
        now: Instant,
    ) -> Self {
        Self {
            id,
            price,
            status: JobStatus::Waiting,
            remaining: budget,
            store_label,
            created_at: Utc::now(),
            last_decay: now,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Remaining time before the job is eligible for expiry.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn store_label(&self) -> &str {
        &self.store_label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the job as paid. No-op once the job has timed out.
    pub fn mark_completed(&mut self) -> Transition {
        match self.status {
            JobStatus::Waiting => {
                self.status = JobStatus::Completed;
                Transition::Applied
            }
            JobStatus::Completed => Transition::Unchanged,
            JobStatus::TimedOut => Transition::Refused,
        }
    }

    /// Expires the job and zeroes its remaining time. No-op once completed.
    pub fn mark_timed_out(&mut self) -> Transition {
        match self.status {
            JobStatus::Waiting => {
                self.status = JobStatus::TimedOut;
                self.remaining = Duration::ZERO;
                Transition::Applied
            }
            JobStatus::TimedOut => Transition::Unchanged,
            JobStatus::Completed => Transition::Refused,
        }
    }

    /// Subtracts `amount` from the remaining time, flooring at zero.
    pub fn decay(&mut self, amount: Duration) {
        self.remaining = self.remaining.saturating_sub(amount);
    }

    /// Decays by the time elapsed since the previous decay and records `now`.
    ///
    /// An instant earlier than the last decay counts as zero elapsed time.
    pub(crate) fn decay_until(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_decay);
        self.decay(elapsed);
        if now > self.last_decay {
            self.last_decay = now;
        }
    }

    /// Returns true if the budget is spent while the job is still waiting.
    pub fn is_expired(&self) -> bool {
        self.status == JobStatus::Waiting && self.remaining.is_zero()
    }
}
