//! Unlock gate
//!
//! A user sees other users' answers to a question only after unlocking it,
//! either by answering well or by spending incentive points.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::auth::Identity;
use crate::ledger::{insufficient_message, IncentiveLedger, UNLOCK_COST};
use crate::store::Store;
use crate::types::{IdeaMeshError, Result};

/// Result of a paid unlock attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockOutcome {
    pub success: bool,
    pub message: String,
    /// Balance after the attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
}

impl UnlockOutcome {
    fn already_unlocked(balance: i64) -> Self {
        Self {
            success: false,
            message: "Question already unlocked".to_string(),
            balance: Some(balance),
        }
    }
}

#[derive(Clone)]
pub struct UnlockGate {
    store: Arc<dyn Store>,
    ledger: IncentiveLedger,
}

impl UnlockGate {
    pub fn new(store: Arc<dyn Store>, ledger: IncentiveLedger) -> Self {
        Self { store, ledger }
    }

    /// Record an unlock. Repeats are no-ops; returns whether it was new.
    pub async fn unlock(&self, user_id: &str, question_id: &str) -> Result<bool> {
        self.store.unlock(user_id, question_id).await
    }

    pub async fn is_unlocked(&self, identity: &Identity, question_id: &str) -> Result<bool> {
        match identity.subject() {
            Some(user) => self.store.is_unlocked(user, question_id).await,
            None => Ok(false),
        }
    }

    /// Spend points to unlock a question.
    pub async fn unlock_with_incentive(
        &self,
        identity: &Identity,
        question_id: &str,
    ) -> Result<UnlockOutcome> {
        let user = identity.require()?;
        if self.store.get_question(question_id).await?.is_none() {
            return Err(IdeaMeshError::NotFound("Question not found".into()));
        }

        if self.store.is_unlocked(user, question_id).await? {
            let balance = self.ledger.balance(user).await?;
            return Ok(UnlockOutcome::already_unlocked(balance));
        }

        let Some(balance) = self.ledger.decrease(user, UNLOCK_COST).await? else {
            let have = self.ledger.balance(user).await?;
            return Ok(UnlockOutcome {
                success: false,
                message: insufficient_message(UNLOCK_COST, have),
                balance: Some(have),
            });
        };

        if !self.store.unlock(user, question_id).await? {
            // A concurrent request unlocked first; this debit bought nothing
            let balance = self.ledger.increase(user, UNLOCK_COST).await?;
            return Ok(UnlockOutcome::already_unlocked(balance));
        }

        info!(user, question_id, balance, "Question unlocked with incentive");
        Ok(UnlockOutcome {
            success: true,
            message: format!(
                "Question unlocked successfully! {} incentive points deducted.",
                UNLOCK_COST
            ),
            balance: Some(balance),
        })
    }
}
