//! Poll/finalize protocol spoken with the checkout page and the validating party.

use common::TransactionId;
use serde::Serialize;

use crate::error::CheckoutError;
use crate::job::{Job, JobStatus};
use crate::registry::JobRegistry;

/// Status field of a protocol response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProtocolStatus {
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "timedOut")]
    TimedOut,
    #[serde(rename = "invalid_id")]
    InvalidId,
}

impl From<JobStatus> for ProtocolStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Waiting => ProtocolStatus::Waiting,
            JobStatus::Completed => ProtocolStatus::Completed,
            JobStatus::TimedOut => ProtocolStatus::TimedOut,
        }
    }
}

/// JSON body returned by poll and finalize.
///
/// `price` and `store` are only present when a poll found the transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolResponse {
    pub status: ProtocolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl ProtocolResponse {
    pub fn invalid_id() -> Self {
        Self {
            status: ProtocolStatus::InvalidId,
            price: None,
            store: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: ProtocolStatus::Completed,
            price: None,
            store: None,
        }
    }

    pub fn from_job(job: &Job) -> Self {
        Self {
            status: job.status().into(),
            price: Some(job.price().as_decimal()),
            store: Some(job.store_label().to_string()),
        }
    }
}

/// The externally reachable surface of the registry.
#[derive(Clone)]
pub struct ValidationProtocol {
    registry: JobRegistry,
}

impl ValidationProtocol {
    pub fn new(registry: JobRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Reports the current state of a transaction. Never mutates.
    #[tracing::instrument(skip(self))]
    pub async fn poll(&self, uid: Option<&str>) -> ProtocolResponse {
        let Some(id) = uid.and_then(TransactionId::parse) else {
            return ProtocolResponse::invalid_id();
        };

        match self.registry.get(&id).await {
            Some(job) => ProtocolResponse::from_job(&job),
            None => {
                metrics::counter!("checkout_unknown_transaction").increment(1);
                tracing::debug!("poll for unknown transaction");
                ProtocolResponse::invalid_id()
            }
        }
    }

    /// Finalizes a transaction on behalf of the validating party.
    ///
    /// Repeating the call is harmless, and a job that already timed out stays
    /// timed out while the caller still gets `completed` back.
    #[tracing::instrument(skip(self))]
    pub async fn finalize(&self, uid: Option<&str>) -> ProtocolResponse {
        let Some(id) = uid.and_then(TransactionId::parse) else {
            return ProtocolResponse::invalid_id();
        };

        match self.registry.complete(&id).await {
            Ok(_) => ProtocolResponse::completed(),
            Err(CheckoutError::UnknownTransaction(_)) => {
                metrics::counter!("checkout_unknown_transaction").increment(1);
                tracing::debug!("finalize for unknown transaction");
                ProtocolResponse::invalid_id()
            }
            Err(err) => {
                tracing::error!(error = %err, "finalize failed");
                ProtocolResponse::invalid_id()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    #[test]
    fn test_invalid_id_serializes_status_only() {
        let json = serde_json::to_value(ProtocolResponse::invalid_id()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "invalid_id" }));
    }

    #[tokio::test]
    async fn test_poll_includes_price_and_store() {
        let registry = JobRegistry::default();
        let job = registry
            .create_transaction(Money::from_cents(500))
            .await
            .unwrap();
        let protocol = ValidationProtocol::new(registry);

        let response = protocol.poll(Some(job.id().as_str())).await;
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "waiting", "price": 5.0, "store": "MyStoreQR" })
        );
    }

    #[tokio::test]
    async fn test_missing_and_blank_ids_are_invalid() {
        let protocol = ValidationProtocol::new(JobRegistry::default());
        assert_eq!(protocol.poll(None).await, ProtocolResponse::invalid_id());
        assert_eq!(protocol.poll(Some("")).await, ProtocolResponse::invalid_id());
        assert_eq!(protocol.finalize(None).await, ProtocolResponse::invalid_id());
        assert_eq!(protocol.finalize(Some("  ")).await, ProtocolResponse::invalid_id());
    }

    #[tokio::test]
    async fn test_poll_does_not_mutate() {
        let registry = JobRegistry::default();
        let job = registry.create_transaction(Money::zero()).await.unwrap();
        let protocol = ValidationProtocol::new(registry.clone());

        for _ in 0..5 {
            protocol.poll(Some(job.id().as_str())).await;
        }
        let after = registry.get(job.id()).await.unwrap();
        assert_eq!(after.status(), JobStatus::Waiting);
        assert_eq!(after.remaining(), job.remaining());
    }
}
