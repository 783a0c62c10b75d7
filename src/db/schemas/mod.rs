//! Database schemas for IdeaMesh
//!
//! MongoDB document structures and their conversions into domain records.

mod ai_answer;
mod answer;
mod incentive;
mod metadata;
mod question;
mod unlock;

pub use ai_answer::{AiAnswerDoc, AI_ANSWER_COLLECTION};
pub use answer::{AnswerDoc, ANSWER_COLLECTION};
pub use incentive::{IncentiveDoc, INCENTIVE_COLLECTION};
pub use metadata::Metadata;
pub use question::{QuestionDoc, QUESTION_COLLECTION};
pub use unlock::{UnlockDoc, UNLOCK_COLLECTION};
