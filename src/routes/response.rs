//! JSON response and request body helpers shared by the route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::types::IdeaMeshError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty_body() -> BoxBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

fn with_cors(mut response: Response<BoxBody>) -> Response<BoxBody> {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, X-Dev-User"),
    );
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(response)
}

pub fn error_response(status: StatusCode, message: &str) -> Response<BoxBody> {
    json_response(status, &ErrorResponse { error: message })
}

/// Map a failed operation to its status and `{ "error": ... }` body
pub fn from_error(err: IdeaMeshError) -> Response<BoxBody> {
    let (status, message) = err.into_status_code_and_body();
    error_response(status, &message)
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = with_cors(Response::new(empty_body()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// Read and decode a JSON body of at most [`MAX_BODY_BYTES`]
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, IdeaMeshError> {
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<http_body_util::LengthLimitError>() {
                IdeaMeshError::BadRequest("Request body too large".into())
            } else {
                IdeaMeshError::Http(format!("Failed to read body: {}", e))
            }
        })?
        .to_bytes();

    decode_json(&bytes)
}

pub fn decode_json<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, IdeaMeshError> {
    serde_json::from_slice(bytes)
        .map_err(|e| IdeaMeshError::BadRequest(format!("Invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let response = from_error(IdeaMeshError::NotFound("Question not found".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_json_body_round_trip() {
        let response = json_response(StatusCode::OK, &serde_json::json!({ "amount": 15 }));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = decode_json(&bytes).unwrap();
        assert_eq!(value["amount"], 15);
    }

    #[test]
    fn test_preflight() {
        let response = cors_preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("DELETE"));
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let err = decode_json::<serde_json::Value>(b"{nope").unwrap_err();
        assert!(matches!(err, IdeaMeshError::BadRequest(_)));
    }
}
