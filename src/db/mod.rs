//! Database layer for IdeaMesh
//!
//! MongoDB storage for questions, answers, reference answers, unlock
//! records and incentive balances.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{AiAnswerDoc, AnswerDoc, IncentiveDoc, Metadata, QuestionDoc, UnlockDoc};
