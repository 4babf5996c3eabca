use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ReviewError, Reviewer};
use crate::config::CompletionConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completion client for an endpoint that authenticates through a
/// custom header (e.g. Azure OpenAI's `api-key`).
#[derive(Clone)]
pub struct CompletionClient {
    http: Client,
    endpoint: String,
    key_header: HeaderName,
    key_value: HeaderValue,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, ReviewError> {
        let key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|_| ReviewError::InvalidHeader(config.api_key_header.clone()))?;
        let mut key_value = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ReviewError::InvalidHeader(config.api_key_header.clone()))?;
        key_value.set_sensitive(true);

        Ok(Self {
            http: Client::new(),
            endpoint: config.endpoint.clone(),
            key_header,
            key_value,
        })
    }
}

#[async_trait]
impl Reviewer for CompletionClient {
    #[instrument(skip(self, prompt), fields(prompt_bytes = prompt.len()))]
    async fn review(&self, prompt: &str) -> Result<String, ReviewError> {
        let request = ChatRequest {
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(self.key_header.clone(), self.key_value.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Api { status, body });
        }

        let body = response.text().await?;
        let content = extract_content(&body)?;
        debug!(response_bytes = content.len(), "received completion");
        Ok(content)
    }
}

/// Pull `choices[0].message.content` out of a completion response body.
fn extract_content(body: &str) -> Result<String, ReviewError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ReviewError::ResponseShape(format!("invalid JSON ({e}): {body}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ReviewError::ResponseShape(format!("no choices in response: {body}")))?;
    let message = choice
        .message
        .ok_or_else(|| ReviewError::ResponseShape(format!("choice has no message: {body}")))?;
    message
        .content
        .ok_or_else(|| ReviewError::ResponseShape(format!("message has no content: {body}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CompletionClient {
        CompletionClient::new(&CompletionConfig {
            endpoint: format!("{}/openai/chat", server.uri()),
            api_key: "sk-test".to_string(),
            api_key_header: "api-key".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"LGTM"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "LGTM");
    }

    #[test]
    fn test_extract_content_shape_errors() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{"finish_reason":"content_filter"}]}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"message":{"content":42}}]}"#,
            "not json",
        ] {
            let err = extract_content(body).unwrap_err();
            assert!(
                matches!(err, ReviewError::ResponseShape(_)),
                "expected shape error for {body}"
            );
        }
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        let result = CompletionClient::new(&CompletionConfig {
            endpoint: "http://localhost".to_string(),
            api_key: "sk".to_string(),
            api_key_header: "bad header".to_string(),
        });
        assert!(matches!(result, Err(ReviewError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_review_sends_prompt_with_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/chat"))
            .and(header("api-key", "sk-test"))
            .and(body_json(json!({
                "messages": [{ "role": "user", "content": "review me" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Looks fine" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).review("review me").await.unwrap();
        assert_eq!(text, "Looks fine");
    }

    #[tokio::test]
    async fn test_review_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client_for(&server).review("p").await.unwrap_err();
        assert!(matches!(&err, ReviewError::Api { status, body }
            if *status == StatusCode::TOO_MANY_REQUESTS && body == "rate limited"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_review_empty_choices_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).review("p").await.unwrap_err();
        assert!(matches!(err, ReviewError::ResponseShape(_)));
    }
}
