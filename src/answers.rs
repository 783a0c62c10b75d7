//! Answer queries and the unscored create path

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::Identity;
use crate::ledger::{IncentiveLedger, ANSWER_REWARD};
use crate::model::{Answer, NewAnswer};
use crate::scoring::ScoringQueue;
use crate::store::Store;
use crate::types::{IdeaMeshError, Result};

/// Answers to a question plus whether the caller may see others' answers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswers {
    pub is_unlocked: bool,
    pub answers: Vec<Answer>,
}

#[derive(Clone)]
pub struct AnswerService {
    store: Arc<dyn Store>,
    ledger: IncentiveLedger,
    queue: ScoringQueue,
}

impl AnswerService {
    pub fn new(store: Arc<dyn Store>, ledger: IncentiveLedger, queue: ScoringQueue) -> Self {
        Self {
            store,
            ledger,
            queue,
        }
    }

    async fn require_question(&self, question_id: &str) -> Result<()> {
        match self.store.get_question(question_id).await? {
            Some(_) => Ok(()),
            None => Err(IdeaMeshError::NotFound("Question not found".into())),
        }
    }

    /// Answers newest first, with the caller's unlock state
    pub async fn answers_for_question(
        &self,
        identity: &Identity,
        question_id: &str,
    ) -> Result<QuestionAnswers> {
        let user = identity.require()?;
        self.require_question(question_id).await?;

        Ok(QuestionAnswers {
            is_unlocked: self.store.is_unlocked(user, question_id).await?,
            answers: self.store.answers_for_question(question_id).await?,
        })
    }

    /// Whether the caller has answered; false for anonymous callers
    pub async fn has_answered(&self, identity: &Identity, question_id: &str) -> Result<bool> {
        match identity.subject() {
            Some(user) => self.store.has_answered(user, question_id).await,
            None => Ok(false),
        }
    }

    pub async fn get_answer(&self, id: &str) -> Result<Answer> {
        self.store
            .get_answer(id)
            .await?
            .ok_or_else(|| IdeaMeshError::NotFound("Answer not found".into()))
    }

    /// Delete the caller's own answer. Unlocks and balances stay as they are.
    pub async fn delete_answer(&self, identity: &Identity, id: &str) -> Result<()> {
        let user = identity.require()?;
        let answer = self.get_answer(id).await?;
        if answer.user_id != user {
            return Err(IdeaMeshError::Forbidden("Only the author can delete an answer".into()));
        }
        if !self.store.delete_answer(id).await? {
            return Err(IdeaMeshError::NotFound("Answer not found".into()));
        }
        info!(answer_id = id, user, "Answer deleted");
        Ok(())
    }

    /// Store an answer without scoring it, reward the author and queue scoring.
    ///
    /// Ratings stay unset until the queued job finishes.
    pub async fn create_answer(
        &self,
        identity: &Identity,
        question_id: &str,
        content: &str,
    ) -> Result<String> {
        let user = identity.require()?;
        if content.trim().is_empty() {
            return Err(IdeaMeshError::BadRequest("Answer content is empty".into()));
        }
        self.require_question(question_id).await?;

        let answer_id = self
            .store
            .insert_answer(NewAnswer {
                question_id: question_id.to_string(),
                content: content.to_string(),
                user_id: user.to_string(),
                ratings: None,
            })
            .await?;
        self.ledger.increase(user, ANSWER_REWARD).await?;
        self.store.unlock(user, question_id).await?;

        // The answer is already stored; a full queue only delays its ratings
        if let Err(e) = self.queue.enqueue(&answer_id) {
            warn!(answer_id = %answer_id, error = %e, "Could not queue scoring job");
        }

        info!(answer_id = %answer_id, question_id, user, "Answer created, scoring deferred");
        Ok(answer_id)
    }
}
