//! Similarity and reasonableness aggregation
//!
//! [`Scorer`] turns provider replies into ratings. [`ScoringService`] applies
//! the acceptance thresholds and performs the resulting writes.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::extract::extract_score;
use super::prompts;
use crate::auth::Identity;
use crate::ledger::{insufficient_message, IncentiveLedger, ANSWER_REWARD, QUESTION_COST};
use crate::model::{NewAnswer, NewQuestion, Ratings};
use crate::provider::{CompletionRequest, ProviderRegistry, ScoringProvider};
use crate::store::Store;
use crate::types::{IdeaMeshError, Result};

/// An answer is stored only when uniqueness exceeds this
pub const ANSWER_UNIQUENESS_THRESHOLD: f64 = 0.5;

/// An answer is stored only when reasonableness exceeds this
pub const ANSWER_REASONABLENESS_THRESHOLD: f64 = 0.3;

/// A question is created only when reasonableness exceeds this
pub const QUESTION_REASONABLENESS_THRESHOLD: f64 = 0.5;

/// Mean of the scores that were obtained
fn mean(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Collapse per-call scores into ratings. An empty set rates 0.
pub fn aggregate(similarities: &[f64], reasonableness: &[f64]) -> Ratings {
    Ratings {
        uniqueness: mean(similarities).map(|s| 1.0 - s).unwrap_or(0.0),
        reasonableness: mean(reasonableness).unwrap_or(0.0),
    }
}

pub fn is_answer_accepted(ratings: &Ratings) -> bool {
    ratings.uniqueness > ANSWER_UNIQUENESS_THRESHOLD
        && ratings.reasonableness > ANSWER_REASONABLENESS_THRESHOLD
}

/// Pure scoring against the configured providers
#[derive(Clone)]
pub struct Scorer {
    store: Arc<dyn Store>,
    providers: ProviderRegistry,
}

impl Scorer {
    pub fn new(store: Arc<dyn Store>, providers: ProviderRegistry) -> Self {
        Self { store, providers }
    }

    /// Send one prompt; any failure is "no score"
    async fn ask(provider: &dyn ScoringProvider, request: CompletionRequest) -> Option<f64> {
        match provider.complete(request).await {
            Ok(reply) => {
                let score = extract_score(Some(&reply));
                if score.is_none() {
                    warn!(provider = provider.name(), reply = %reply, "No score in provider reply");
                }
                score
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Provider call failed");
                None
            }
        }
    }

    /// Rate a candidate answer to a question.
    ///
    /// Fails with `NotFound` when the question is missing or has no
    /// reference answers yet. Provider calls run one after another.
    pub async fn score_answer(&self, question_id: &str, content: &str) -> Result<Ratings> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| IdeaMeshError::NotFound("Question not found".into()))?;

        let references = self.store.ai_answers_for_question(question_id).await?;
        if references.is_empty() {
            return Err(IdeaMeshError::NotFound(
                "No AI reference answers for this question".into(),
            ));
        }

        let mut similarities = Vec::with_capacity(references.len());
        match self.providers.similarity() {
            Some(judge) => {
                for reference in &references {
                    let request = prompts::similarity(&reference.content, content);
                    if let Some(score) = Self::ask(judge.as_ref(), request).await {
                        similarities.push(score);
                    }
                }
            }
            None => warn!("No similarity provider configured"),
        }

        let mut reasonableness = Vec::new();
        for judge in self.providers.reasonableness() {
            let request = prompts::answer_reasonableness(&question.body, content);
            if let Some(score) = Self::ask(judge.as_ref(), request).await {
                reasonableness.push(score);
            }
        }

        let ratings = aggregate(&similarities, &reasonableness);
        info!(
            question_id,
            references = references.len(),
            similarity_scores = similarities.len(),
            reasonableness_scores = reasonableness.len(),
            uniqueness = ratings.uniqueness,
            reasonableness = ratings.reasonableness,
            "Answer scored"
        );
        Ok(ratings)
    }

    /// Mean reasonableness of a proposed question over all providers
    pub async fn score_question(&self, question: &NewQuestion) -> f64 {
        let category = question.category_label();
        let mut scores = Vec::new();
        for judge in self.providers.reasonableness() {
            let request =
                prompts::question_reasonableness(&question.title, &question.body, &category);
            if let Some(score) = Self::ask(judge.as_ref(), request).await {
                scores.push(score);
            }
        }
        mean(&scores).unwrap_or(0.0)
    }
}

/// Result of scoring an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub uniqueness_rating: f64,
    pub reasonableness_rating: f64,
    /// Whether the answer passed both thresholds and was stored
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_id: Option<String>,
}

/// Result of proposing a question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasonableness_rating: Option<f64>,
}

impl QuestionOutcome {
    fn failure(message: impl Into<String>, rating: Option<f64>) -> Self {
        Self {
            success: false,
            message: message.into(),
            question_id: None,
            reasonableness_rating: rating,
        }
    }
}

/// Scoring plus the writes that follow acceptance
#[derive(Clone)]
pub struct ScoringService {
    scorer: Scorer,
    store: Arc<dyn Store>,
    ledger: IncentiveLedger,
}

impl ScoringService {
    pub fn new(scorer: Scorer, store: Arc<dyn Store>, ledger: IncentiveLedger) -> Self {
        Self {
            scorer,
            store,
            ledger,
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Score an answer and store it only if it clears both thresholds.
    ///
    /// An accepted answer also unlocks the question for its author and
    /// earns the answer reward. Rejected answers leave no trace.
    pub async fn score_and_create_answer(
        &self,
        identity: &Identity,
        question_id: &str,
        content: &str,
    ) -> Result<AnswerOutcome> {
        let user = identity.require()?;
        if content.trim().is_empty() {
            return Err(IdeaMeshError::BadRequest("Answer content is empty".into()));
        }

        let ratings = self.scorer.score_answer(question_id, content).await?;
        let accepted = is_answer_accepted(&ratings);
        info!(
            question_id,
            user,
            uniqueness = ratings.uniqueness,
            reasonableness = ratings.reasonableness,
            accepted,
            "Answer threshold decision"
        );

        let mut outcome = AnswerOutcome {
            uniqueness_rating: ratings.uniqueness,
            reasonableness_rating: ratings.reasonableness,
            accepted,
            answer_id: None,
        };
        if !accepted {
            return Ok(outcome);
        }

        let answer_id = self
            .store
            .insert_answer(NewAnswer {
                question_id: question_id.to_string(),
                content: content.to_string(),
                user_id: user.to_string(),
                ratings: Some(ratings),
            })
            .await?;
        self.store.unlock(user, question_id).await?;
        self.ledger.increase(user, ANSWER_REWARD).await?;

        outcome.answer_id = Some(answer_id);
        Ok(outcome)
    }

    /// Score a proposed question and create it if reasonable enough and paid for.
    pub async fn score_and_create_question(
        &self,
        identity: &Identity,
        question: NewQuestion,
    ) -> Result<QuestionOutcome> {
        let Some(user) = identity.subject() else {
            return Ok(QuestionOutcome::failure("User not authenticated", None));
        };
        if question.title.trim().is_empty() || question.body.trim().is_empty() {
            return Err(IdeaMeshError::BadRequest("Question title and body are required".into()));
        }

        let rating = self.scorer.score_question(&question).await;
        let accepted = rating > QUESTION_REASONABLENESS_THRESHOLD;
        info!(user, reasonableness = rating, accepted, "Question threshold decision");

        if !accepted {
            return Ok(QuestionOutcome::failure(
                format!(
                    "Question rejected. Reasonableness: {:.2}. Need reasonableness > {}.",
                    rating, QUESTION_REASONABLENESS_THRESHOLD
                ),
                Some(rating),
            ));
        }

        if self.ledger.decrease(user, QUESTION_COST).await?.is_none() {
            let have = self.ledger.balance(user).await?;
            return Ok(QuestionOutcome::failure(
                insufficient_message(QUESTION_COST, have),
                Some(rating),
            ));
        }

        let question_id = match self.store.insert_question(question, Some(user)).await {
            Ok(id) => id,
            Err(e) => {
                // Give the points back; the question was never created
                self.ledger.increase(user, QUESTION_COST).await?;
                return Err(e);
            }
        };

        Ok(QuestionOutcome {
            success: true,
            message: format!(
                "Question created successfully! {} incentive points deducted.",
                QUESTION_COST
            ),
            question_id: Some(question_id),
            reasonableness_rating: Some(rating),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::model::NewAiAnswer;
    use crate::provider::MockProvider;
    use crate::store::MemoryStore;

    fn question() -> NewQuestion {
        NewQuestion {
            title: "桂林怎么玩".into(),
            body: "第一次去桂林，三天怎么安排？".into(),
            main_category: "旅行".into(),
            sub_category: "国内".into(),
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ScoringService,
        kimi: Arc<MockProvider>,
    }

    fn fixture(kimi: MockProvider, minimax: Option<MockProvider>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let kimi = Arc::new(kimi);
        let mut providers = ProviderRegistry::new(ProviderKind::Kimi)
            .with_provider(ProviderKind::Kimi, kimi.clone());
        if let Some(minimax) = minimax {
            providers = providers.with_provider(ProviderKind::Minimax, Arc::new(minimax));
        }
        let scorer = Scorer::new(store.clone(), providers);
        let ledger = IncentiveLedger::new(store.clone());
        Fixture {
            service: ScoringService::new(scorer, store.clone(), ledger),
            store,
            kimi,
        }
    }

    async fn seed_question(store: &MemoryStore, references: &[&str]) -> String {
        let id = store.insert_question(question(), None).await.unwrap();
        for (i, content) in references.iter().enumerate() {
            store
                .insert_ai_answer(NewAiAnswer {
                    question_id: id.clone(),
                    content: content.to_string(),
                    ai_name: if i % 2 == 0 { "Kimi" } else { "MiniMax" }.into(),
                })
                .await
                .unwrap();
        }
        id
    }

    #[test]
    fn test_aggregate() {
        let ratings = aggregate(&[0.2, 0.4], &[0.8]);
        assert!((ratings.uniqueness - 0.7).abs() < 1e-9);
        assert!((ratings.reasonableness - 0.8).abs() < 1e-9);

        // Each rating falls back to 0 on its own
        let ratings = aggregate(&[], &[0.9]);
        assert_eq!(ratings.uniqueness, 0.0);
        assert!((ratings.reasonableness - 0.9).abs() < 1e-9);

        let ratings = aggregate(&[], &[]);
        assert_eq!((ratings.uniqueness, ratings.reasonableness), (0.0, 0.0));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let pass = Ratings { uniqueness: 0.51, reasonableness: 0.31 };
        let edge_u = Ratings { uniqueness: 0.5, reasonableness: 0.9 };
        let edge_r = Ratings { uniqueness: 0.9, reasonableness: 0.3 };
        assert!(is_answer_accepted(&pass));
        assert!(!is_answer_accepted(&edge_u));
        assert!(!is_answer_accepted(&edge_r));
    }

    #[tokio::test]
    async fn test_accepted_answer_is_stored_unlocked_and_rewarded() {
        let f = fixture(
            MockProvider::new("Kimi").when("相似度", "0.3").when("合理性", "0.8"),
            None,
        );
        let qid = seed_question(&f.store, &["坐船游漓江"]).await;
        let alice = Identity::user("alice");

        let outcome = f
            .service
            .score_and_create_answer(&alice, &qid, "骑行十里画廊")
            .await
            .unwrap();

        assert!(outcome.accepted);
        assert!((outcome.uniqueness_rating - 0.7).abs() < 1e-9);
        let answer_id = outcome.answer_id.unwrap();
        let stored = f.store.get_answer(&answer_id).await.unwrap().unwrap();
        assert!((stored.uniqueness_rating.unwrap() - 0.7).abs() < 1e-9);
        assert_eq!(stored.reasonableness_rating, Some(0.8));
        assert!(f.store.is_unlocked("alice", &qid).await.unwrap());
        assert_eq!(f.store.balance("alice").await.unwrap(), ANSWER_REWARD);
        assert_eq!(f.kimi.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_answer_leaves_no_trace() {
        let f = fixture(
            MockProvider::new("Kimi").when("相似度", "0.9").when("合理性", "0.8"),
            None,
        );
        let qid = seed_question(&f.store, &["坐船游漓江"]).await;

        let outcome = f
            .service
            .score_and_create_answer(&Identity::user("bob"), &qid, "坐船游漓江")
            .await
            .unwrap();

        assert!(!outcome.accepted);
        assert!(outcome.answer_id.is_none());
        assert!(f.store.answers_for_question(&qid).await.unwrap().is_empty());
        assert!(!f.store.is_unlocked("bob", &qid).await.unwrap());
        assert_eq!(f.store.balance("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_similarity_per_reference_and_reasonableness_per_provider() {
        let f = fixture(
            MockProvider::new("Kimi")
                .then("0.2")
                .then("0.4")
                .when("合理性", "0.6"),
            Some(MockProvider::new("MiniMax").with_response("0.4")),
        );
        let qid = seed_question(&f.store, &["参考一", "参考二"]).await;

        let ratings = f.service.scorer().score_answer(&qid, "自驾").await.unwrap();
        assert!((ratings.uniqueness - 0.7).abs() < 1e-9);
        assert!((ratings.reasonableness - 0.5).abs() < 1e-9);

        let prompts: Vec<_> = f.kimi.requests().into_iter().map(|r| r.prompt).collect();
        assert!(prompts[0].contains("AI的标准答案：参考一"));
        assert!(prompts[1].contains("AI的标准答案：参考二"));
        assert!(prompts[2].contains("用户的回答：自驾"));
    }

    #[tokio::test]
    async fn test_failed_calls_are_excluded() {
        let f = fixture(
            MockProvider::new("Kimi").when("相似度", "not a number").fail_when("合理性"),
            Some(MockProvider::new("MiniMax").with_response("0.9")),
        );
        let qid = seed_question(&f.store, &["参考"]).await;

        let ratings = f.service.scorer().score_answer(&qid, "答").await.unwrap();
        assert_eq!(ratings.uniqueness, 0.0);
        assert!((ratings.reasonableness - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_question_or_references() {
        let f = fixture(MockProvider::new("Kimi"), None);
        let missing = crate::model::new_id();
        assert!(matches!(
            f.service.scorer().score_answer(&missing, "x").await,
            Err(IdeaMeshError::NotFound(_))
        ));

        let qid = seed_question(&f.store, &[]).await;
        assert!(matches!(
            f.service.scorer().score_answer(&qid, "x").await,
            Err(IdeaMeshError::NotFound(_))
        ));
        assert_eq!(f.kimi.call_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_requires_authentication() {
        let f = fixture(MockProvider::new("Kimi"), None);
        let qid = seed_question(&f.store, &["参考"]).await;
        assert!(matches!(
            f.service
                .score_and_create_answer(&Identity::anonymous(), &qid, "x")
                .await,
            Err(IdeaMeshError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_question_created_and_paid_for() {
        let f = fixture(MockProvider::new("Kimi").with_response("0.8"), None);
        f.store.credit("carol", 15).await.unwrap();

        let outcome = f
            .service
            .score_and_create_question(&Identity::user("carol"), question())
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(
            outcome.message,
            "Question created successfully! 10 incentive points deducted."
        );
        let qid = outcome.question_id.unwrap();
        let stored = f.store.get_question(&qid).await.unwrap().unwrap();
        assert_eq!(stored.user_id.as_deref(), Some("carol"));
        assert_eq!(f.store.balance("carol").await.unwrap(), 5);
        assert!(f.kimi.requests()[0].prompt.contains("问题分类：旅行 - 国内"));
    }

    #[tokio::test]
    async fn test_question_rejected_below_threshold() {
        let f = fixture(MockProvider::new("Kimi").with_response("0.42"), None);
        f.store.credit("carol", 15).await.unwrap();

        let outcome = f
            .service
            .score_and_create_question(&Identity::user("carol"), question())
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Question rejected. Reasonableness: 0.42. Need reasonableness > 0.5."
        );
        assert_eq!(f.store.balance("carol").await.unwrap(), 15);
        assert!(f.store.questions_by_category("旅行").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_question_needs_enough_points() {
        let f = fixture(MockProvider::new("Kimi").with_response("0.9"), None);
        f.store.credit("dave", 4).await.unwrap();

        let outcome = f
            .service
            .score_and_create_question(&Identity::user("dave"), question())
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "Insufficient incentive points. Need 10, you have 4 (short by 6)."
        );
        assert_eq!(f.store.balance("dave").await.unwrap(), 4);
        assert!(f.store.questions_by_category("旅行").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_question_is_a_structured_failure() {
        let f = fixture(MockProvider::new("Kimi").with_response("0.9"), None);
        let outcome = f
            .service
            .score_and_create_question(&Identity::anonymous(), question())
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "User not authenticated");
        assert_eq!(f.kimi.call_count(), 0);
    }
}
