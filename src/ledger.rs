//! Incentive ledger
//!
//! Per-user point balances. Increments create the record on first use;
//! decrements are conditional on the balance covering them, so a balance
//! never goes negative even under concurrent spending.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::Identity;
use crate::store::Store;
use crate::types::Result;

/// Points credited for an accepted answer
pub const ANSWER_REWARD: i64 = 10;

/// Points debited to create a question
pub const QUESTION_COST: i64 = 10;

/// Points debited to unlock other users' answers
pub const UNLOCK_COST: i64 = 5;

#[derive(Clone)]
pub struct IncentiveLedger {
    store: Arc<dyn Store>,
}

impl IncentiveLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add points, returning the new balance
    pub async fn increase(&self, user_id: &str, amount: i64) -> Result<i64> {
        let balance = self.store.credit(user_id, amount).await?;
        info!(user = user_id, amount, balance, "Incentive increased");
        Ok(balance)
    }

    /// Remove points if the balance covers them.
    ///
    /// Returns the new balance, or `None` with the balance untouched.
    pub async fn decrease(&self, user_id: &str, amount: i64) -> Result<Option<i64>> {
        let balance = self.store.debit_if_sufficient(user_id, amount).await?;
        match balance {
            Some(balance) => info!(user = user_id, amount, balance, "Incentive decreased"),
            None => debug!(user = user_id, amount, "Insufficient incentive for debit"),
        }
        Ok(balance)
    }

    /// Balance of a known user
    pub async fn balance(&self, user_id: &str) -> Result<i64> {
        self.store.balance(user_id).await
    }

    /// Caller's balance, 0 for anonymous callers
    pub async fn get(&self, identity: &Identity) -> Result<i64> {
        match identity.subject() {
            Some(user) => self.balance(user).await,
            None => Ok(0),
        }
    }
}

/// Message for a spend the balance cannot cover
pub fn insufficient_message(needed: i64, have: i64) -> String {
    format!(
        "Insufficient incentive points. Need {}, you have {} (short by {}).",
        needed,
        have,
        (needed - have).max(0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ledger() -> IncentiveLedger {
        IncentiveLedger::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_increase_creates_record() {
        let ledger = ledger();
        assert_eq!(ledger.increase("u1", ANSWER_REWARD).await.unwrap(), 10);
        assert_eq!(ledger.increase("u1", ANSWER_REWARD).await.unwrap(), 20);
        assert_eq!(ledger.get(&Identity::user("u1")).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_decrease_never_goes_negative() {
        let ledger = ledger();
        ledger.increase("u1", 7).await.unwrap();
        assert_eq!(ledger.decrease("u1", UNLOCK_COST).await.unwrap(), Some(2));
        assert_eq!(ledger.decrease("u1", UNLOCK_COST).await.unwrap(), None);
        assert_eq!(ledger.balance("u1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_balance_is_zero() {
        assert_eq!(ledger().get(&Identity::anonymous()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_debits_respect_balance() {
        let ledger = ledger();
        ledger.increase("u1", 10).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.decrease("u1", UNLOCK_COST).await.unwrap()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 2);
        assert_eq!(ledger.balance("u1").await.unwrap(), 0);
    }

    #[test]
    fn test_insufficient_message() {
        assert_eq!(
            insufficient_message(5, 4),
            "Insufficient incentive points. Need 5, you have 4 (short by 1)."
        );
    }
}
