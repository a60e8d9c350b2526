//! Shared registry of in-flight checkout jobs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{Money, TransactionId};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{CheckoutError, Result};
use crate::job::{Job, Transition};

/// Nominal time budget of a transaction when nothing else is configured.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(40);

/// Label shown to the validating party when nothing else is configured.
pub const DEFAULT_STORE_LABEL: &str = "MyStoreQR";

/// Settings applied to every job the registry creates.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub budget: Duration,
    pub store_label: Arc<str>,
}

impl RegistryConfig {
    pub fn new(budget: Duration, store_label: impl Into<Arc<str>>) -> Self {
        Self {
            budget,
            store_label: store_label.into(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET, DEFAULT_STORE_LABEL)
    }
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of jobs visited.
    pub scanned: usize,
    /// Number of jobs moved to `TimedOut` by this pass.
    pub timed_out: usize,
}

/// Thread-safe mapping from transaction id to job.
///
/// Every operation takes the same exclusive lock for its whole
/// read-modify-write, so a job's status and remaining time are always
/// observed together. Jobs are never removed: the table grows for the life
/// of the process and `len` is exported as a gauge so the growth stays
/// visible.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<TransactionId, Job>>>,
    config: RegistryConfig,
}

impl JobRegistry {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Inserts a waiting job with a full budget, replacing any job under the same id.
    #[tracing::instrument(skip_all, fields(id = %id, price = %price))]
    pub async fn create(&self, id: TransactionId, price: Money) -> Result<Job> {
        if price.is_negative() {
            return Err(CheckoutError::InvalidPrice(price));
        }

        let job = Job::new(
            id.clone(),
            price,
            self.config.budget,
            Arc::clone(&self.config.store_label),
            Instant::now(),
        );

        let mut jobs = self.jobs.lock().await;
        if jobs.insert(id, job.clone()).is_some() {
            tracing::warn!("transaction id reused, previous job replaced");
        }
        metrics::gauge!("checkout_jobs_tracked").set(jobs.len() as f64);
        drop(jobs);

        metrics::counter!("checkout_transactions_created").increment(1);
        tracing::info!("transaction created");
        Ok(job)
    }

    /// Mints a fresh transaction id and creates its job.
    pub async fn create_transaction(&self, price: Money) -> Result<Job> {
        self.create(TransactionId::new(), price).await
    }

    /// Returns a snapshot of the job, or `None` if the id is unknown.
    pub async fn get(&self, id: &TransactionId) -> Option<Job> {
        self.jobs.lock().await.get(id).cloned()
    }

    /// Marks the job completed.
    ///
    /// A job that already timed out stays timed out and reports
    /// [`Transition::Refused`].
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn complete(&self, id: &TransactionId) -> Result<Transition> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| CheckoutError::UnknownTransaction(id.clone()))?;
        let transition = job.mark_completed();
        drop(jobs);

        match transition {
            Transition::Applied => {
                metrics::counter!("checkout_transactions_completed").increment(1);
                tracing::info!("transaction completed");
            }
            Transition::Unchanged => tracing::debug!("transaction already completed"),
            Transition::Refused => tracing::info!("late finalize ignored, transaction timed out"),
        }
        Ok(transition)
    }

    /// Runs one sweep pass as of `now`.
    ///
    /// Each job is decayed by the time elapsed since its previous decay, and
    /// waiting jobs whose budget is spent are moved to `TimedOut`.
    pub async fn sweep(&self, now: Instant) -> SweepReport {
        let mut jobs = self.jobs.lock().await;
        let mut report = SweepReport {
            scanned: jobs.len(),
            timed_out: 0,
        };

        for job in jobs.values_mut() {
            job.decay_until(now);
            if job.is_expired() && job.mark_timed_out() == Transition::Applied {
                report.timed_out += 1;
                tracing::info!(id = %job.id(), "transaction timed out");
            }
        }
        drop(jobs);

        if report.timed_out > 0 {
            metrics::counter!("checkout_transactions_timed_out").increment(report.timed_out as u64);
        }
        report
    }

    /// Returns the number of jobs ever created (minus replaced ids).
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    fn tx(raw: &str) -> TransactionId {
        TransactionId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = JobRegistry::default();
        registry
            .create(tx("tx1"), Money::from_cents(1250))
            .await
            .unwrap();

        let job = registry.get(&tx("tx1")).await.unwrap();
        assert_eq!(job.status(), JobStatus::Waiting);
        assert_eq!(job.price(), Money::from_cents(1250));
        assert_eq!(job.remaining(), DEFAULT_BUDGET);
        assert_eq!(job.store_label(), "MyStoreQR");
    }

    #[tokio::test]
    async fn test_get_unknown_returns_none() {
        let registry = JobRegistry::default();
        assert!(registry.get(&tx("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let registry = JobRegistry::default();
        let result = registry.create(tx("tx1"), Money::from_cents(-1)).await;
        assert!(matches!(result, Err(CheckoutError::InvalidPrice(_))));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_repeat_create_replaces_job() {
        let registry = JobRegistry::default();
        registry
            .create(tx("tx1"), Money::from_cents(100))
            .await
            .unwrap();
        registry.complete(&tx("tx1")).await.unwrap();
        registry
            .create(tx("tx1"), Money::from_cents(200))
            .await
            .unwrap();

        let job = registry.get(&tx("tx1")).await.unwrap();
        assert_eq!(job.status(), JobStatus::Waiting);
        assert_eq!(job.price(), Money::from_cents(200));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_transaction_mints_distinct_ids() {
        let registry = JobRegistry::default();
        let a = registry.create_transaction(Money::zero()).await.unwrap();
        let b = registry.create_transaction(Money::zero()).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_complete_unknown_is_recoverable() {
        let registry = JobRegistry::default();
        let result = registry.complete(&tx("ghost")).await;
        assert!(matches!(result, Err(CheckoutError::UnknownTransaction(_))));
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_times_out_expired_waiting_jobs() {
        let registry = JobRegistry::new(RegistryConfig::new(Duration::from_secs(20), "Shop"));
        let start = Instant::now();
        registry.create(tx("a"), Money::zero()).await.unwrap();
        registry.create(tx("b"), Money::zero()).await.unwrap();
        registry.complete(&tx("b")).await.unwrap();

        let report = registry.sweep(start + Duration::from_secs(10)).await;
        assert_eq!(report, SweepReport { scanned: 2, timed_out: 0 });

        let report = registry.sweep(start + Duration::from_secs(20)).await;
        assert_eq!(report, SweepReport { scanned: 2, timed_out: 1 });

        assert_eq!(
            registry.get(&tx("a")).await.unwrap().status(),
            JobStatus::TimedOut
        );
        assert_eq!(
            registry.get(&tx("b")).await.unwrap().status(),
            JobStatus::Completed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_after_timeout_is_refused() {
        let registry = JobRegistry::new(RegistryConfig::new(Duration::from_secs(10), "Shop"));
        let start = Instant::now();
        registry.create(tx("a"), Money::zero()).await.unwrap();
        registry.sweep(start + Duration::from_secs(10)).await;

        let transition = registry.complete(&tx("a")).await.unwrap();
        assert_eq!(transition, Transition::Refused);
        assert_eq!(
            registry.get(&tx("a")).await.unwrap().status(),
            JobStatus::TimedOut
        );
    }
}
