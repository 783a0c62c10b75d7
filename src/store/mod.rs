//! Document store collaborator
//!
//! The services only talk to storage through [`Store`]. Each method is one
//! atomic unit against the backing store; multi-step workflows built on top
//! are not transactional.
//!
//! - [`MongoStore`]: MongoDB, used in production
//! - [`MemoryStore`]: DashMap-backed, used in dev mode and tests

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;

use crate::model::{AiAnswer, Answer, NewAiAnswer, NewAnswer, NewQuestion, Question, Ratings};
use crate::types::Result;

/// Maximum keyword matches taken per searched field
pub const SEARCH_LIMIT_PER_FIELD: usize = 10;

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for health output
    fn kind(&self) -> &'static str;

    // Questions

    async fn insert_question(&self, question: NewQuestion, user_id: Option<&str>) -> Result<String>;

    async fn get_question(&self, id: &str) -> Result<Option<Question>>;

    async fn questions_by_category(&self, main_category: &str) -> Result<Vec<Question>>;

    /// Case-insensitive keyword match on title and on body, at most
    /// [`SEARCH_LIMIT_PER_FIELD`] per field, merged without duplicates
    async fn search_questions(&self, keyword: &str) -> Result<Vec<Question>>;

    // Answers

    async fn insert_answer(&self, answer: NewAnswer) -> Result<String>;

    async fn get_answer(&self, id: &str) -> Result<Option<Answer>>;

    /// Answers for a question, newest first
    async fn answers_for_question(&self, question_id: &str) -> Result<Vec<Answer>>;

    async fn has_answered(&self, user_id: &str, question_id: &str) -> Result<bool>;

    /// Overwrite both ratings. Returns false if the answer no longer exists.
    async fn set_answer_ratings(&self, answer_id: &str, ratings: Ratings) -> Result<bool>;

    /// Returns false if nothing was deleted
    async fn delete_answer(&self, id: &str) -> Result<bool>;

    // AI reference answers

    async fn insert_ai_answer(&self, answer: NewAiAnswer) -> Result<String>;

    async fn ai_answers_for_question(&self, question_id: &str) -> Result<Vec<AiAnswer>>;

    // Unlock records

    /// Record that `user_id` may see other answers to `question_id`.
    /// Returns true only if the record was newly created.
    async fn unlock(&self, user_id: &str, question_id: &str) -> Result<bool>;

    async fn is_unlocked(&self, user_id: &str, question_id: &str) -> Result<bool>;

    // Incentive balances

    /// Current balance, 0 when the user has no record
    async fn balance(&self, user_id: &str) -> Result<i64>;

    /// Atomically add `amount`, creating the record if needed. Returns the new balance.
    async fn credit(&self, user_id: &str, amount: i64) -> Result<i64>;

    /// Atomically subtract `amount` only if the balance covers it.
    /// Returns the new balance, or `None` without mutating when it does not.
    async fn debit_if_sufficient(&self, user_id: &str, amount: i64) -> Result<Option<i64>>;
}
