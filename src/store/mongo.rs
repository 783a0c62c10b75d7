//! MongoDB-backed store

use async_trait::async_trait;
use bson::{doc, DateTime, Document};
use tracing::debug;

use super::{Store, SEARCH_LIMIT_PER_FIELD};
use crate::db::schemas::{
    AiAnswerDoc, AnswerDoc, IncentiveDoc, QuestionDoc, UnlockDoc, AI_ANSWER_COLLECTION,
    ANSWER_COLLECTION, INCENTIVE_COLLECTION, QUESTION_COLLECTION, UNLOCK_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::model::{
    canonical_id, parse_id, AiAnswer, Answer, NewAiAnswer, NewAnswer, NewQuestion, Question,
    Ratings,
};
use crate::types::{IdeaMeshError, Result};

/// Server error code for a unique index violation
const DUPLICATE_KEY: &str = "E11000";

pub struct MongoStore {
    questions: MongoCollection<QuestionDoc>,
    answers: MongoCollection<AnswerDoc>,
    ai_answers: MongoCollection<AiAnswerDoc>,
    unlocks: MongoCollection<UnlockDoc>,
    incentives: MongoCollection<IncentiveDoc>,
}

impl MongoStore {
    /// Open all collections, creating their indexes
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            questions: client.collection(QUESTION_COLLECTION).await?,
            answers: client.collection(ANSWER_COLLECTION).await?,
            ai_answers: client.collection(AI_ANSWER_COLLECTION).await?,
            unlocks: client.collection(UNLOCK_COLLECTION).await?,
            incentives: client.collection(INCENTIVE_COLLECTION).await?,
        })
    }

    async fn questions_where(&self, field: &str, keyword: &str) -> Result<Vec<Question>> {
        let filter = doc! {
            field: { "$regex": regex::escape(keyword), "$options": "i" }
        };
        let docs = self
            .questions
            .find_many(
                filter,
                Some(doc! { "metadata.created_at": -1 }),
                Some(SEARCH_LIMIT_PER_FIELD as i64),
            )
            .await?;
        Ok(docs.into_iter().map(QuestionDoc::into_model).collect())
    }

    async fn increment_balance(&self, user_id: &str, amount: i64) -> Result<Option<IncentiveDoc>> {
        let now = DateTime::now();
        self.incentives
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! {
                    "$inc": { "amount": amount },
                    "$set": { "metadata.updated_at": now },
                    "$setOnInsert": { "metadata.created_at": now },
                },
                true,
            )
            .await
    }
}

fn is_duplicate_key(err: &IdeaMeshError) -> bool {
    matches!(err, IdeaMeshError::Database(msg) if msg.contains(DUPLICATE_KEY))
}

fn by_id(id: &str) -> Result<Document> {
    Ok(doc! { "_id": parse_id(id)? })
}

#[async_trait]
impl Store for MongoStore {
    fn kind(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_question(
        &self,
        question: NewQuestion,
        user_id: Option<&str>,
    ) -> Result<String> {
        let id = self
            .questions
            .insert_one(QuestionDoc::new(question, user_id.map(str::to_string)))
            .await?;
        Ok(id.to_hex())
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>> {
        Ok(self
            .questions
            .find_one(by_id(id)?)
            .await?
            .map(QuestionDoc::into_model))
    }

    async fn questions_by_category(&self, main_category: &str) -> Result<Vec<Question>> {
        let docs = self
            .questions
            .find_many(
                doc! { "main_category": main_category },
                Some(doc! { "metadata.created_at": 1 }),
                None,
            )
            .await?;
        Ok(docs.into_iter().map(QuestionDoc::into_model).collect())
    }

    async fn search_questions(&self, keyword: &str) -> Result<Vec<Question>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let mut merged = self.questions_where("title", keyword).await?;
        for question in self.questions_where("body", keyword).await? {
            if !merged.iter().any(|m| m.id == question.id) {
                merged.push(question);
            }
        }
        Ok(merged)
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<String> {
        let id = self.answers.insert_one(AnswerDoc::new(answer)?).await?;
        Ok(id.to_hex())
    }

    async fn get_answer(&self, id: &str) -> Result<Option<Answer>> {
        Ok(self
            .answers
            .find_one(by_id(id)?)
            .await?
            .map(AnswerDoc::into_model))
    }

    async fn answers_for_question(&self, question_id: &str) -> Result<Vec<Answer>> {
        let docs = self
            .answers
            .find_many(
                doc! { "question_id": canonical_id(question_id)? },
                Some(doc! { "metadata.created_at": -1, "_id": -1 }),
                None,
            )
            .await?;
        Ok(docs.into_iter().map(AnswerDoc::into_model).collect())
    }

    async fn has_answered(&self, user_id: &str, question_id: &str) -> Result<bool> {
        Ok(self
            .answers
            .find_one(doc! { "question_id": canonical_id(question_id)?, "user_id": user_id })
            .await?
            .is_some())
    }

    async fn set_answer_ratings(&self, answer_id: &str, ratings: Ratings) -> Result<bool> {
        let result = self
            .answers
            .update_one(
                by_id(answer_id)?,
                doc! {
                    "uniqueness_rating": ratings.uniqueness,
                    "reasonableness_rating": ratings.reasonableness,
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_answer(&self, id: &str) -> Result<bool> {
        self.answers.delete_one(by_id(id)?).await
    }

    async fn insert_ai_answer(&self, answer: NewAiAnswer) -> Result<String> {
        let id = self.ai_answers.insert_one(AiAnswerDoc::new(answer)?).await?;
        Ok(id.to_hex())
    }

    async fn ai_answers_for_question(&self, question_id: &str) -> Result<Vec<AiAnswer>> {
        let docs = self
            .ai_answers
            .find_many(
                doc! { "question_id": canonical_id(question_id)? },
                Some(doc! { "metadata.created_at": 1 }),
                None,
            )
            .await?;
        Ok(docs.into_iter().map(AiAnswerDoc::into_model).collect())
    }

    async fn unlock(&self, user_id: &str, question_id: &str) -> Result<bool> {
        let question_id = canonical_id(question_id)?;
        let now = DateTime::now();
        let result = self
            .unlocks
            .upsert_one(
                doc! { "user_id": user_id, "question_id": question_id.clone() },
                doc! {
                    "$setOnInsert": {
                        "metadata": { "created_at": now, "updated_at": now }
                    }
                },
            )
            .await;

        match result {
            Ok(outcome) => Ok(outcome.upserted_id.is_some()),
            // A concurrent upsert won the unique index
            Err(e) if is_duplicate_key(&e) => {
                debug!(user_id, %question_id, "Unlock raced, record already exists");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn is_unlocked(&self, user_id: &str, question_id: &str) -> Result<bool> {
        Ok(self
            .unlocks
            .find_one(doc! { "user_id": user_id, "question_id": canonical_id(question_id)? })
            .await?
            .is_some())
    }

    async fn balance(&self, user_id: &str) -> Result<i64> {
        Ok(self
            .incentives
            .find_one(doc! { "user_id": user_id })
            .await?
            .map(|d| d.amount)
            .unwrap_or(0))
    }

    async fn credit(&self, user_id: &str, amount: i64) -> Result<i64> {
        let updated = match self.increment_balance(user_id, amount).await {
            // Two first-time credits can both try to insert; the loser retries
            // against the record the winner created.
            Err(e) if is_duplicate_key(&e) => self.increment_balance(user_id, amount).await?,
            other => other?,
        };

        updated
            .map(|d| d.amount)
            .ok_or_else(|| IdeaMeshError::Database("Upsert returned no balance".into()))
    }

    async fn debit_if_sufficient(&self, user_id: &str, amount: i64) -> Result<Option<i64>> {
        let updated = self
            .incentives
            .find_one_and_update(
                doc! { "user_id": user_id, "amount": { "$gte": amount } },
                doc! {
                    "$inc": { "amount": -amount },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
                false,
            )
            .await?;
        Ok(updated.map(|d| d.amount))
    }
}
