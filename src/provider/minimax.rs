//! MiniMax provider (`chatcompletion_pro`).
//!
//! MiniMax speaks in bot personas rather than system messages: the request's
//! system prompt becomes the persona content and the reply comes back in the
//! top-level `reply` field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::*;

/// Bot name used when the request does not name one
pub const DEFAULT_BOT_NAME: &str = "MM智能助理";

/// Persona used when the request has no system prompt
pub const DEFAULT_BOT_PERSONA: &str = "MM智能助理是一款由MiniMax自研的，没有调用其他产品的接口的大型语言模型。MiniMax是一家中国科技公司，一直致力于进行大模型相关的研究。";

const USER_SENDER_NAME: &str = "小明";
const DEFAULT_TOKENS_TO_GENERATE: u32 = 1024;

pub struct MiniMaxProvider {
    client: Client,
    base_url: String,
    api_key: String,
    group_id: String,
    model: String,
}

impl MiniMaxProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        group_id: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            group_id: group_id.into(),
            model: model.into(),
        })
    }

    fn completion_url(&self) -> String {
        format!("{}/text/chatcompletion_pro", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ProRequest<'a> {
    model: &'a str,
    tokens_to_generate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    reply_constraints: ReplyConstraints<'a>,
    messages: Vec<ProMessage<'a>>,
    bot_setting: Vec<BotSetting<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplyConstraints<'a> {
    sender_type: &'static str,
    sender_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ProMessage<'a> {
    sender_type: &'static str,
    sender_name: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BotSetting<'a> {
    bot_name: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProResponse {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    base_resp: Option<BaseResp>,
}

#[derive(Debug, Deserialize)]
struct BaseResp {
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

#[async_trait]
impl ScoringProvider for MiniMaxProvider {
    fn name(&self) -> &str {
        "MiniMax"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let bot_name = request.assistant_name.as_deref().unwrap_or(DEFAULT_BOT_NAME);
        let persona = request.system_prompt.as_deref().unwrap_or(DEFAULT_BOT_PERSONA);

        let body = ProRequest {
            model: &self.model,
            tokens_to_generate: request.max_tokens.unwrap_or(DEFAULT_TOKENS_TO_GENERATE),
            temperature: request.temperature,
            reply_constraints: ReplyConstraints {
                sender_type: "BOT",
                sender_name: bot_name,
            },
            messages: vec![ProMessage {
                sender_type: "USER",
                sender_name: USER_SENDER_NAME,
                text: &request.prompt,
            }],
            bot_setting: vec![BotSetting {
                bot_name,
                content: persona,
            }],
        };

        let response = self
            .client
            .post(self.completion_url())
            .query(&[("GroupId", self.group_id.as_str())])
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(format!("HTTP {}: {}", status, text)));
        }

        let pro: ProResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        // MiniMax reports API-level failures with HTTP 200 and a non-zero code
        if let Some(base) = pro.base_resp.as_ref().filter(|b| b.status_code != 0) {
            return Err(ProviderError::RequestFailed(format!(
                "status {}: {}",
                base.status_code, base.status_msg
            )));
        }

        let reply = pro
            .reply
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ProviderError::ParseError("Missing reply".to_string()))?;

        debug!(provider = "minimax", reply_len = reply.len(), "Completion received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> MiniMaxProvider {
        MiniMaxProvider::new(server.uri(), "abab6-chat", "mm-key", "group-1", None).unwrap()
    }

    #[tokio::test]
    async fn test_default_persona_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/text/chatcompletion_pro"))
            .and(query_param("GroupId", "group-1"))
            .and(header("authorization", "Bearer mm-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "abab6-chat",
                "tokens_to_generate": 1024,
                "reply_constraints": { "sender_type": "BOT", "sender_name": DEFAULT_BOT_NAME },
                "messages": [{ "sender_type": "USER", "sender_name": "小明", "text": "打分" }],
                "bot_setting": [{ "bot_name": DEFAULT_BOT_NAME, "content": DEFAULT_BOT_PERSONA }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "0.6",
                "base_resp": { "status_code": 0, "status_msg": "success" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server)
            .complete(CompletionRequest::user("打分"))
            .await
            .unwrap();
        assert_eq!(reply, "0.6");
    }

    #[tokio::test]
    async fn test_custom_persona() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "reply_constraints": { "sender_name": "知乎用户" },
                "bot_setting": [{ "bot_name": "知乎用户", "content": "简洁回答" }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "坐船" })),
            )
            .mount(&server)
            .await;

        let reply = provider(&server)
            .complete(
                CompletionRequest::user("桂林怎么玩")
                    .with_system("简洁回答")
                    .with_assistant_name("知乎用户"),
            )
            .await
            .unwrap();
        assert_eq!(reply, "坐船");
    }

    #[tokio::test]
    async fn test_api_level_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "",
                "base_resp": { "status_code": 1004, "status_msg": "auth failed" }
            })))
            .mount(&server)
            .await;

        match provider(&server).complete(CompletionRequest::user("x")).await {
            Err(ProviderError::RequestFailed(msg)) => assert!(msg.contains("auth failed")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
