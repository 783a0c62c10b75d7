//! HTTP route handlers
//!
//! `Route::parse` maps a method and path to an endpoint without touching
//! the request, so routing can be tested on its own. `dispatch` resolves the
//! caller and runs the handler.

pub mod answers;
pub mod health;
pub mod incentive;
pub mod questions;
pub mod response;

pub use response::{cors_preflight, error_response, from_error, json_response, BoxBody};

use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};

use crate::server::AppState;

/// A matched endpoint. Ids are passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    Preflight,
    ListQuestions,
    CreateQuestion,
    GetQuestion(String),
    ListAnswers(String),
    CreateScoredAnswer(String),
    CreateDeferredAnswer(String),
    HasAnswered(String),
    Unlock(String),
    ListAiAnswers(String),
    GenerateAiAnswersFor(String),
    GenerateAiAnswers,
    GetAnswer(String),
    DeleteAnswer(String),
    Incentive,
    /// Known path, wrong method
    MethodNotAllowed,
    NotFound,
}

impl Route {
    pub fn parse(method: &Method, path: &str) -> Self {
        if method == Method::OPTIONS {
            return Self::Preflight;
        }

        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let get = method == Method::GET;
        let post = method == Method::POST;
        let delete = method == Method::DELETE;
        let pick = |allowed: bool, route: Route| {
            if allowed {
                route
            } else {
                Route::MethodNotAllowed
            }
        };

        match segments.as_slice() {
            ["health"] | ["healthz"] => pick(get, Self::Health),

            ["api", "questions"] => match *method {
                Method::GET => Self::ListQuestions,
                Method::POST => Self::CreateQuestion,
                _ => Self::MethodNotAllowed,
            },
            ["api", "questions", id] => pick(get, Self::GetQuestion(id.to_string())),
            ["api", "questions", id, "answers"] => match *method {
                Method::GET => Self::ListAnswers(id.to_string()),
                Method::POST => Self::CreateScoredAnswer(id.to_string()),
                _ => Self::MethodNotAllowed,
            },
            ["api", "questions", id, "answers", "deferred"] => {
                pick(post, Self::CreateDeferredAnswer(id.to_string()))
            }
            ["api", "questions", id, "answered"] => pick(get, Self::HasAnswered(id.to_string())),
            ["api", "questions", id, "unlock"] => pick(post, Self::Unlock(id.to_string())),
            ["api", "questions", id, "ai-answers"] => match *method {
                Method::GET => Self::ListAiAnswers(id.to_string()),
                Method::POST => Self::GenerateAiAnswersFor(id.to_string()),
                _ => Self::MethodNotAllowed,
            },

            ["api", "ai-answers", "generate"] => pick(post, Self::GenerateAiAnswers),

            ["api", "answers", id] => {
                if get {
                    Self::GetAnswer(id.to_string())
                } else if delete {
                    Self::DeleteAnswer(id.to_string())
                } else {
                    Self::MethodNotAllowed
                }
            }

            ["api", "incentive"] => pick(get, Self::Incentive),

            _ => Self::NotFound,
        }
    }
}

/// Run the handler for a parsed route
pub async fn dispatch(
    state: Arc<AppState>,
    route: Route,
    req: Request<Incoming>,
) -> Response<BoxBody> {
    let identity = state.identity(req.headers());
    let query = req.uri().query().map(str::to_string);

    let result = match route {
        Route::Preflight => return cors_preflight(),
        Route::Health => return health::health_check(&state),
        Route::MethodNotAllowed => {
            return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        Route::NotFound => return error_response(StatusCode::NOT_FOUND, "Not found"),

        Route::ListQuestions => questions::list(&state, query.as_deref()).await,
        Route::CreateQuestion => questions::create(&state, &identity, req).await,
        Route::GetQuestion(id) => questions::get(&state, &id).await,
        Route::ListAiAnswers(id) => questions::ai_answers(&state, &id).await,
        Route::GenerateAiAnswersFor(id) => questions::generate_for(&state, &identity, &id).await,
        Route::GenerateAiAnswers => questions::generate(&state, &identity, req).await,

        Route::ListAnswers(id) => answers::list(&state, &identity, &id).await,
        Route::CreateScoredAnswer(id) => answers::create_scored(&state, &identity, &id, req).await,
        Route::CreateDeferredAnswer(id) => {
            answers::create_deferred(&state, &identity, &id, req).await
        }
        Route::HasAnswered(id) => answers::has_answered(&state, &identity, &id).await,
        Route::GetAnswer(id) => answers::get(&state, &id).await,
        Route::DeleteAnswer(id) => answers::delete(&state, &identity, &id).await,

        Route::Unlock(id) => incentive::unlock(&state, &identity, &id).await,
        Route::Incentive => incentive::balance(&state, &identity).await,
    };

    result.unwrap_or_else(from_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QID: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    #[test]
    fn test_health_routes() {
        assert_eq!(Route::parse(&Method::GET, "/health"), Route::Health);
        assert_eq!(Route::parse(&Method::GET, "/healthz/"), Route::Health);
        assert_eq!(Route::parse(&Method::POST, "/health"), Route::MethodNotAllowed);
    }

    #[test]
    fn test_question_routes() {
        assert_eq!(Route::parse(&Method::GET, "/api/questions"), Route::ListQuestions);
        assert_eq!(Route::parse(&Method::POST, "/api/questions"), Route::CreateQuestion);
        assert_eq!(
            Route::parse(&Method::GET, &format!("/api/questions/{}", QID)),
            Route::GetQuestion(QID.into())
        );
        assert_eq!(
            Route::parse(&Method::POST, &format!("/api/questions/{}/answers", QID)),
            Route::CreateScoredAnswer(QID.into())
        );
        assert_eq!(
            Route::parse(&Method::POST, &format!("/api/questions/{}/answers/deferred", QID)),
            Route::CreateDeferredAnswer(QID.into())
        );
        assert_eq!(
            Route::parse(&Method::POST, &format!("/api/questions/{}/unlock", QID)),
            Route::Unlock(QID.into())
        );
        assert_eq!(
            Route::parse(&Method::GET, &format!("/api/questions/{}/unlock", QID)),
            Route::MethodNotAllowed
        );
        assert_eq!(
            Route::parse(&Method::POST, &format!("/api/questions/{}/ai-answers", QID)),
            Route::GenerateAiAnswersFor(QID.into())
        );
    }

    #[test]
    fn test_answer_and_misc_routes() {
        assert_eq!(
            Route::parse(&Method::DELETE, &format!("/api/answers/{}", QID)),
            Route::DeleteAnswer(QID.into())
        );
        assert_eq!(
            Route::parse(&Method::PUT, &format!("/api/answers/{}", QID)),
            Route::MethodNotAllowed
        );
        assert_eq!(Route::parse(&Method::GET, "/api/incentive"), Route::Incentive);
        assert_eq!(
            Route::parse(&Method::POST, "/api/ai-answers/generate"),
            Route::GenerateAiAnswers
        );
        assert_eq!(Route::parse(&Method::OPTIONS, "/anything"), Route::Preflight);
        assert_eq!(Route::parse(&Method::GET, "/api/unknown"), Route::NotFound);
        assert_eq!(Route::parse(&Method::GET, "/"), Route::NotFound);
    }
}
