//! Question endpoints
//!
//! - GET  /api/questions?category=.. or ?q=..
//! - POST /api/questions
//! - GET  /api/questions/{id}
//! - GET  /api/questions/{id}/ai-answers
//! - POST /api/questions/{id}/ai-answers
//! - POST /api/ai-answers/generate

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;

use super::response::{json_response, parse_json_body, BoxBody};
use crate::auth::Identity;
use crate::model::NewQuestion;
use crate::references::ReferenceTarget;
use crate::server::AppState;
use crate::types::{IdeaMeshError, Result};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl ListQuery {
    pub fn parse(query: Option<&str>) -> Result<Self> {
        serde_urlencoded::from_str(query.unwrap_or(""))
            .map_err(|e| IdeaMeshError::BadRequest(format!("Invalid query: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    question_id: Option<String>,
    category_name: Option<String>,
}

pub async fn list(state: &AppState, query: Option<&str>) -> Result<Response<BoxBody>> {
    let query = ListQuery::parse(query)?;
    let questions = match (query.category, query.q) {
        (Some(category), _) => state.questions.questions_by_category(&category).await?,
        (None, Some(keyword)) => state.questions.search_questions(&keyword).await?,
        (None, None) => {
            return Err(IdeaMeshError::BadRequest(
                "Either 'category' or 'q' is required".into(),
            ))
        }
    };
    Ok(json_response(StatusCode::OK, &questions))
}

pub async fn create(
    state: &AppState,
    identity: &Identity,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>> {
    let question: NewQuestion = parse_json_body(req).await?;
    let outcome = state.scoring.score_and_create_question(identity, question).await?;
    let status = if outcome.success {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(json_response(status, &outcome))
}

pub async fn get(state: &AppState, id: &str) -> Result<Response<BoxBody>> {
    let question = state.questions.get_question(id).await?;
    Ok(json_response(StatusCode::OK, &question))
}

pub async fn ai_answers(state: &AppState, id: &str) -> Result<Response<BoxBody>> {
    let answers = state.questions.ai_answers(id).await?;
    Ok(json_response(StatusCode::OK, &answers))
}

pub async fn generate_for(
    state: &AppState,
    identity: &Identity,
    id: &str,
) -> Result<Response<BoxBody>> {
    let generated = state
        .references
        .generate(identity, ReferenceTarget::Question(id.to_string()))
        .await?;
    Ok(json_response(StatusCode::OK, &generated))
}

pub async fn generate(
    state: &AppState,
    identity: &Identity,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>> {
    identity.require()?;
    let body: GenerateRequest = parse_json_body(req).await?;
    let target = ReferenceTarget::from_parts(body.question_id, body.category_name)?;
    let generated = state.references.generate(identity, target).await?;
    Ok(json_response(StatusCode::OK, &generated))
}
