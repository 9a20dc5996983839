//! Credit Service (C7): pre-flight budget check and post-flight usage
//! recording, per §4.7.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CreditError {
    #[error("credit service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CreditService: Send + Sync {
    async fn has_enough_credits(&self, organization_id: &str) -> Result<bool, CreditError>;
    async fn record_usage(&self, organization_id: &str, total_cost: u64) -> Result<(), CreditError>;
}

/// An in-memory credit service, keyed by organization, for tests and for
/// hosts that haven't wired up a real billing backend.
pub struct InMemoryCreditService {
    balances: DashMap<String, u64>,
}

impl InMemoryCreditService {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    pub fn with_balance(organization_id: impl Into<String>, balance: u64) -> Self {
        let service = Self::new();
        service.balances.insert(organization_id.into(), balance);
        service
    }

    pub fn balance(&self, organization_id: &str) -> u64 {
        self.balances.get(organization_id).map(|b| *b).unwrap_or(0)
    }
}

impl Default for InMemoryCreditService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CreditService for InMemoryCreditService {
    async fn has_enough_credits(&self, organization_id: &str) -> Result<bool, CreditError> {
        Ok(self.balances.get(organization_id).map(|b| *b > 0).unwrap_or(true))
    }

    async fn record_usage(&self, organization_id: &str, total_cost: u64) -> Result<(), CreditError> {
        if let Some(mut balance) = self.balances.get_mut(organization_id) {
            *balance = balance.saturating_sub(total_cost);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_balance_refuses_the_run() {
        let service = InMemoryCreditService::with_balance("org-1", 0);
        assert!(!service.has_enough_credits("org-1").await.unwrap());
    }

    #[tokio::test]
    async fn record_usage_debits_balance() {
        let service = InMemoryCreditService::with_balance("org-1", 100);
        service.record_usage("org-1", 30).await.unwrap();
        assert_eq!(service.balance("org-1"), 70);
    }

    #[tokio::test]
    async fn unknown_organization_defaults_to_unlimited() {
        let service = InMemoryCreditService::new();
        assert!(service.has_enough_credits("org-unknown").await.unwrap());
    }
}
