//! Question unlock document schema
//!
//! One document per (user, question). The unique index makes duplicate
//! unlocks impossible at the storage layer.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for unlock records
pub const UNLOCK_COLLECTION: &str = "question_unlocks";

/// Unlock record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UnlockDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: String,

    pub question_id: String,
}

impl IntoIndexes for UnlockDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "question_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_question_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UnlockDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
