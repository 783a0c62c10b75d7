//! LLM-assisted scoring
//!
//! Prompt construction, score extraction, aggregation into ratings and the
//! deferred scoring queue.

pub mod aggregator;
pub mod extract;
pub mod prompts;
pub mod queue;

pub use aggregator::{
    aggregate, is_answer_accepted, AnswerOutcome, QuestionOutcome, Scorer, ScoringService,
    ANSWER_REASONABLENESS_THRESHOLD, ANSWER_UNIQUENESS_THRESHOLD,
    QUESTION_REASONABLENESS_THRESHOLD,
};
pub use extract::extract_score;
pub use queue::{QueueConfig, ScoringQueue};
