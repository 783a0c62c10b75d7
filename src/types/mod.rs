//! Shared types for IdeaMesh

pub mod error;

pub use error::{IdeaMeshError, Result};
