//! Domain records shared by the stores, services and HTTP routes
//!
//! Identifiers are 24-character hex ObjectId strings regardless of which
//! store produced them.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// A categorized question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub title: String,
    pub body: String,
    pub main_category: String,
    pub sub_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a question about to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub title: String,
    pub body: String,
    pub main_category: String,
    pub sub_category: String,
}

impl NewQuestion {
    /// Category label used in prompts, e.g. "旅行 - 国内"
    pub fn category_label(&self) -> String {
        format!("{} - {}", self.main_category, self.sub_category)
    }
}

/// A user's answer. Ratings are absent until scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub content: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniqueness_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasonableness_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Fields for an answer about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub question_id: String,
    pub content: String,
    pub user_id: String,
    pub ratings: Option<Ratings>,
}

/// AI-generated reference answer used as a similarity baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnswer {
    pub id: String,
    pub question_id: String,
    pub content: String,
    pub ai_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a reference answer about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewAiAnswer {
    pub question_id: String,
    pub content: String,
    pub ai_name: String,
}

/// Uniqueness and reasonableness, always written together
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    pub uniqueness: f64,
    pub reasonableness: f64,
}

/// Parse a record identifier
pub fn parse_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id)?)
}

/// Canonical (lowercase hex) form of a record identifier.
///
/// Every stored reference to another record uses this form, so lookups
/// match regardless of the hex case the caller sent.
pub fn canonical_id(id: &str) -> Result<String> {
    Ok(parse_id(id)?.to_hex())
}

/// Fresh record identifier
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        let id = new_id();
        assert_eq!(id.len(), 24);
        assert_eq!(parse_id(&id).unwrap().to_hex(), id);
        assert!(parse_id("not-an-id").is_err());
    }

    #[test]
    fn test_canonical_id_lowercases() {
        let id = new_id();
        assert_eq!(canonical_id(&id.to_uppercase()).unwrap(), id);
        assert!(canonical_id("zz").is_err());
    }

    #[test]
    fn test_answer_serializes_camel_case_without_missing_ratings() {
        let answer = Answer {
            id: new_id(),
            question_id: new_id(),
            content: "坐船游漓江".into(),
            user_id: "user_1".into(),
            uniqueness_rating: None,
            reasonableness_rating: Some(0.8),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert!(json.get("questionId").is_some());
        assert!(json.get("uniquenessRating").is_none());
        assert_eq!(json["reasonablenessRating"], 0.8);
    }

    #[test]
    fn test_category_label() {
        let q = NewQuestion {
            title: "t".into(),
            body: "b".into(),
            main_category: "旅行".into(),
            sub_category: "国内".into(),
        };
        assert_eq!(q.category_label(), "旅行 - 国内");
    }
}
