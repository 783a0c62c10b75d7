//! Answer document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::model::{Answer, NewAnswer};
use crate::types::Result;

/// Collection name for user answers
pub const ANSWER_COLLECTION: &str = "answers";

/// Answer document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnswerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Question this answer belongs to
    pub question_id: String,

    pub content: String,

    /// Author subject
    pub user_id: String,

    /// Unset until scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniqueness_rating: Option<f64>,

    /// Unset until scored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasonableness_rating: Option<f64>,
}

impl AnswerDoc {
    pub fn new(answer: NewAnswer) -> Result<Self> {
        Ok(Self {
            _id: None,
            metadata: Metadata::new(),
            question_id: crate::model::canonical_id(&answer.question_id)?,
            content: answer.content,
            user_id: answer.user_id,
            uniqueness_rating: answer.ratings.map(|r| r.uniqueness),
            reasonableness_rating: answer.ratings.map(|r| r.reasonableness),
        })
    }

    pub fn into_model(self) -> Answer {
        Answer {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            question_id: self.question_id,
            created_at: self.metadata.created(),
            content: self.content,
            user_id: self.user_id,
            uniqueness_rating: self.uniqueness_rating,
            reasonableness_rating: self.reasonableness_rating,
        }
    }
}

impl IntoIndexes for AnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Answers for a question, newest first
            (
                doc! { "question_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("by_question".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "question_id": 1, "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("by_question_user".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AnswerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
