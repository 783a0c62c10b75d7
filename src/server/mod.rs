//! HTTP server for IdeaMesh

pub mod http;

pub use http::{run, AppState};
