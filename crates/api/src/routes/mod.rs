pub mod health;
pub mod metrics;
pub mod transactions;
pub mod validate;
