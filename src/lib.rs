//! IdeaMesh - questions, answers and LLM-scored ideas
//!
//! Users answer categorized questions and propose new ones. Each answer is
//! judged by LLM providers for uniqueness (distance from AI reference
//! answers) and reasonableness; good answers earn incentive points, which
//! are spent to create questions or unlock other users' answers.
//!
//! ## Components
//!
//! - **Store**: MongoDB document store, or in-memory in dev mode
//! - **Providers**: Kimi and MiniMax behind one trait
//! - **Scoring**: prompt, extract, aggregate, threshold
//! - **Ledger / Unlock**: incentive balances and the answer-visibility gate
//! - **Server**: hyper JSON API

pub mod answers;
pub mod auth;
pub mod config;
pub mod db;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod provider;
pub mod questions;
pub mod references;
pub mod routes;
pub mod scoring;
pub mod server;
pub mod store;
pub mod types;
pub mod unlock;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{IdeaMeshError, Result};
