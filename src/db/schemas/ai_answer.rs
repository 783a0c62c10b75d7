//! AI reference answer document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::model::{AiAnswer, NewAiAnswer};
use crate::types::Result;

/// Collection name for AI reference answers
pub const AI_ANSWER_COLLECTION: &str = "ai_answers";

/// AI reference answer document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AiAnswerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub question_id: String,

    pub content: String,

    /// Display name of the generating provider ("Kimi", "MiniMax")
    pub ai_name: String,
}

impl AiAnswerDoc {
    pub fn new(answer: NewAiAnswer) -> Result<Self> {
        Ok(Self {
            _id: None,
            metadata: Metadata::new(),
            question_id: crate::model::canonical_id(&answer.question_id)?,
            content: answer.content,
            ai_name: answer.ai_name,
        })
    }

    pub fn into_model(self) -> AiAnswer {
        AiAnswer {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            question_id: self.question_id,
            created_at: self.metadata.created(),
            content: self.content,
            ai_name: self.ai_name,
        }
    }
}

impl IntoIndexes for AiAnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "question_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("by_question".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for AiAnswerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
