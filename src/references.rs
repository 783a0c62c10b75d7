//! AI reference answers
//!
//! Each configured provider writes one short, typical answer to a question.
//! These become the baseline that user answers are compared against.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::Identity;
use crate::model::{NewAiAnswer, Question};
use crate::provider::ProviderRegistry;
use crate::scoring::prompts;
use crate::store::Store;
use crate::types::{IdeaMeshError, Result};

/// Which question to generate references for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    Question(String),
    /// The first question in this main category
    Category(String),
}

impl ReferenceTarget {
    /// Question id wins when both are given
    pub fn from_parts(question_id: Option<String>, category: Option<String>) -> Result<Self> {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        match (non_empty(question_id), non_empty(category)) {
            (Some(id), _) => Ok(Self::Question(id)),
            (None, Some(category)) => Ok(Self::Category(category)),
            (None, None) => Err(IdeaMeshError::BadRequest(
                "questionId or categoryName is required".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReferences {
    pub question_id: String,
    pub reference_ids: Vec<String>,
}

#[derive(Clone)]
pub struct ReferenceGenerator {
    store: Arc<dyn Store>,
    providers: ProviderRegistry,
}

impl ReferenceGenerator {
    pub fn new(store: Arc<dyn Store>, providers: ProviderRegistry) -> Self {
        Self { store, providers }
    }

    async fn resolve(&self, target: &ReferenceTarget) -> Result<Question> {
        match target {
            ReferenceTarget::Question(id) => self
                .store
                .get_question(id)
                .await?
                .ok_or_else(|| IdeaMeshError::NotFound("Question not found".into())),
            ReferenceTarget::Category(category) => self
                .store
                .questions_by_category(category)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    IdeaMeshError::NotFound(format!("No questions in category '{}'", category))
                }),
        }
    }

    /// Ask every generator for a reference answer and store the replies.
    ///
    /// Requires an authenticated caller. A provider that already has a
    /// reference for the question is not asked again, so repeated calls do
    /// not skew the similarity baseline. A failing provider is skipped; the
    /// others still contribute.
    pub async fn generate(
        &self,
        identity: &Identity,
        target: ReferenceTarget,
    ) -> Result<GeneratedReferences> {
        let user = identity.require()?;
        let question = self.resolve(&target).await?;
        let existing = self.store.ai_answers_for_question(&question.id).await?;
        let mut reference_ids = Vec::new();

        for provider in self.providers.generators() {
            if existing.iter().any(|r| r.ai_name == provider.name()) {
                debug!(
                    provider = provider.name(),
                    question_id = %question.id,
                    "Reference answer already present"
                );
                continue;
            }

            let reply = match provider.complete(prompts::reference_answer(&question.body)).await {
                Ok(reply) if !reply.trim().is_empty() => reply,
                Ok(_) => {
                    warn!(
                        provider = provider.name(),
                        question_id = %question.id,
                        "Empty reference answer"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        question_id = %question.id,
                        error = %e,
                        "Reference generation failed"
                    );
                    continue;
                }
            };

            let id = self
                .store
                .insert_ai_answer(NewAiAnswer {
                    question_id: question.id.clone(),
                    content: reply,
                    ai_name: provider.name().to_string(),
                })
                .await?;
            info!(
                provider = provider.name(),
                question_id = %question.id,
                reference_id = %id,
                user,
                "Reference answer stored"
            );
            reference_ids.push(id);
        }

        Ok(GeneratedReferences {
            question_id: question.id,
            reference_ids,
        })
    }
}
