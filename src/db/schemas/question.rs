//! Question document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::model::{NewQuestion, Question};

/// Collection name for questions
pub const QUESTION_COLLECTION: &str = "questions";

/// Question document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct QuestionDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    pub body: String,

    pub main_category: String,

    pub sub_category: String,

    /// Creator subject, absent for seeded questions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl QuestionDoc {
    pub fn new(question: NewQuestion, user_id: Option<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title: question.title,
            body: question.body,
            main_category: question.main_category,
            sub_category: question.sub_category,
            user_id,
        }
    }

    pub fn into_model(self) -> Question {
        Question {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            created_at: self.metadata.created(),
            title: self.title,
            body: self.body,
            main_category: self.main_category,
            sub_category: self.sub_category,
            user_id: self.user_id,
        }
    }
}

impl IntoIndexes for QuestionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "main_category": 1 },
                Some(
                    IndexOptions::builder()
                        .name("main_category_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for QuestionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
