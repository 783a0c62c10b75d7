//! Answer endpoints
//!
//! - GET    /api/questions/{id}/answers
//! - POST   /api/questions/{id}/answers            (scored, stored only if accepted)
//! - POST   /api/questions/{id}/answers/deferred   (stored now, scored later)
//! - GET    /api/questions/{id}/answered
//! - GET    /api/answers/{id}
//! - DELETE /api/answers/{id}

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::response::{json_response, parse_json_body, BoxBody};
use crate::auth::Identity;
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedAnswer {
    answer_id: String,
}

#[derive(Serialize)]
struct Answered {
    answered: bool,
}

#[derive(Serialize)]
struct Deleted {
    deleted: bool,
}

pub async fn list(
    state: &AppState,
    identity: &Identity,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let listing = state.answers.answers_for_question(identity, question_id).await?;
    Ok(json_response(StatusCode::OK, &listing))
}

pub async fn create_scored(
    state: &AppState,
    identity: &Identity,
    question_id: &str,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>> {
    identity.require()?;
    let body: AnswerRequest = parse_json_body(req).await?;
    let outcome = state
        .scoring
        .score_and_create_answer(identity, question_id, &body.content)
        .await?;
    let status = if outcome.accepted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(json_response(status, &outcome))
}

pub async fn create_deferred(
    state: &AppState,
    identity: &Identity,
    question_id: &str,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>> {
    identity.require()?;
    let body: AnswerRequest = parse_json_body(req).await?;
    let answer_id = state
        .answers
        .create_answer(identity, question_id, &body.content)
        .await?;
    Ok(json_response(StatusCode::CREATED, &CreatedAnswer { answer_id }))
}

pub async fn has_answered(
    state: &AppState,
    identity: &Identity,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let answered = state.answers.has_answered(identity, question_id).await?;
    Ok(json_response(StatusCode::OK, &Answered { answered }))
}

pub async fn get(state: &AppState, id: &str) -> Result<Response<BoxBody>> {
    let answer = state.answers.get_answer(id).await?;
    Ok(json_response(StatusCode::OK, &answer))
}

pub async fn delete(state: &AppState, identity: &Identity, id: &str) -> Result<Response<BoxBody>> {
    state.answers.delete_answer(identity, id).await?;
    Ok(json_response(StatusCode::OK, &Deleted { deleted: true }))
}
