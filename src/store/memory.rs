//! In-memory store
//!
//! DashMap-backed [`Store`] with the same semantics as [`super::MongoStore`].
//! Per-key operations hold the shard lock, so unlocks and ledger updates are
//! atomic here too.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::warn;

use super::{Store, SEARCH_LIMIT_PER_FIELD};
use crate::model::{
    canonical_id, new_id, AiAnswer, Answer, NewAiAnswer, NewAnswer, NewQuestion, Question, Ratings,
};
use crate::types::Result;

#[derive(Default)]
pub struct MemoryStore {
    questions: DashMap<String, Question>,
    answers: DashMap<String, Answer>,
    ai_answers: DashMap<String, AiAnswer>,
    unlocks: DashMap<(String, String), chrono::DateTime<Utc>>,
    incentives: DashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        warn!("Using in-memory store; data is lost on restart");
        Self::default()
    }

    /// Number of unlock records held
    pub fn unlock_count(&self) -> usize {
        self.unlocks.len()
    }
}

/// Newest first, ObjectId order breaks timestamp ties
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, String)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn matching(
    questions: &DashMap<String, Question>,
    needle: &str,
    field: impl Fn(&Question) -> &str,
) -> Vec<Question> {
    let mut found: Vec<Question> = questions
        .iter()
        .filter(|q| field(q.value()).to_lowercase().contains(needle))
        .map(|q| q.value().clone())
        .collect();
    newest_first(&mut found, |q| (q.created_at, q.id.clone()));
    found.truncate(SEARCH_LIMIT_PER_FIELD);
    found
}

#[async_trait]
impl Store for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn insert_question(
        &self,
        question: NewQuestion,
        user_id: Option<&str>,
    ) -> Result<String> {
        let id = new_id();
        self.questions.insert(
            id.clone(),
            Question {
                id: id.clone(),
                title: question.title,
                body: question.body,
                main_category: question.main_category,
                sub_category: question.sub_category,
                user_id: user_id.map(str::to_string),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>> {
        let id = canonical_id(id)?;
        Ok(self.questions.get(&id).map(|q| q.value().clone()))
    }

    async fn questions_by_category(&self, main_category: &str) -> Result<Vec<Question>> {
        let mut found: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.main_category == main_category)
            .map(|q| q.value().clone())
            .collect();
        found.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(found)
    }

    async fn search_questions(&self, keyword: &str) -> Result<Vec<Question>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut merged = matching(&self.questions, &needle, |q| &q.title);
        for question in matching(&self.questions, &needle, |q| &q.body) {
            if !merged.iter().any(|m| m.id == question.id) {
                merged.push(question);
            }
        }
        Ok(merged)
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<String> {
        let question_id = canonical_id(&answer.question_id)?;
        let id = new_id();
        self.answers.insert(
            id.clone(),
            Answer {
                id: id.clone(),
                question_id,
                content: answer.content,
                user_id: answer.user_id,
                uniqueness_rating: answer.ratings.map(|r| r.uniqueness),
                reasonableness_rating: answer.ratings.map(|r| r.reasonableness),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_answer(&self, id: &str) -> Result<Option<Answer>> {
        let id = canonical_id(id)?;
        Ok(self.answers.get(&id).map(|a| a.value().clone()))
    }

    async fn answers_for_question(&self, question_id: &str) -> Result<Vec<Answer>> {
        let question_id = canonical_id(question_id)?;
        let mut found: Vec<Answer> = self
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .map(|a| a.value().clone())
            .collect();
        newest_first(&mut found, |a| (a.created_at, a.id.clone()));
        Ok(found)
    }

    async fn has_answered(&self, user_id: &str, question_id: &str) -> Result<bool> {
        let question_id = canonical_id(question_id)?;
        Ok(self
            .answers
            .iter()
            .any(|a| a.question_id == question_id && a.user_id == user_id))
    }

    async fn set_answer_ratings(&self, answer_id: &str, ratings: Ratings) -> Result<bool> {
        let answer_id = canonical_id(answer_id)?;
        match self.answers.get_mut(&answer_id) {
            Some(mut answer) => {
                answer.uniqueness_rating = Some(ratings.uniqueness);
                answer.reasonableness_rating = Some(ratings.reasonableness);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_answer(&self, id: &str) -> Result<bool> {
        let id = canonical_id(id)?;
        Ok(self.answers.remove(&id).is_some())
    }

    async fn insert_ai_answer(&self, answer: NewAiAnswer) -> Result<String> {
        let question_id = canonical_id(&answer.question_id)?;
        let id = new_id();
        self.ai_answers.insert(
            id.clone(),
            AiAnswer {
                id: id.clone(),
                question_id,
                content: answer.content,
                ai_name: answer.ai_name,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn ai_answers_for_question(&self, question_id: &str) -> Result<Vec<AiAnswer>> {
        let question_id = canonical_id(question_id)?;
        let mut found: Vec<AiAnswer> = self
            .ai_answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .map(|a| a.value().clone())
            .collect();
        found.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(found)
    }

    async fn unlock(&self, user_id: &str, question_id: &str) -> Result<bool> {
        let key = (user_id.to_string(), canonical_id(question_id)?);
        match self.unlocks.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Ok(true)
            }
        }
    }

    async fn is_unlocked(&self, user_id: &str, question_id: &str) -> Result<bool> {
        let key = (user_id.to_string(), canonical_id(question_id)?);
        Ok(self.unlocks.contains_key(&key))
    }

    async fn balance(&self, user_id: &str) -> Result<i64> {
        Ok(self.incentives.get(user_id).map(|b| *b).unwrap_or(0))
    }

    async fn credit(&self, user_id: &str, amount: i64) -> Result<i64> {
        let mut balance = self.incentives.entry(user_id.to_string()).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    async fn debit_if_sufficient(&self, user_id: &str, amount: i64) -> Result<Option<i64>> {
        match self.incentives.get_mut(user_id) {
            Some(mut balance) if *balance >= amount => {
                *balance -= amount;
                Ok(Some(*balance))
            }
            // No record means a zero balance
            None if amount <= 0 => Ok(Some(0)),
            _ => Ok(None),
        }
    }
}
