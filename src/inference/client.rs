//! OpenAI-compatible completion client.
//!
//! Sends one non-streaming chat completion request per call and returns the
//! first choice's text content. Status codes are classified into the
//! `CompletionError` taxonomy; interpreting the content is the normalizer's
//! job, not the client's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::config::CompanionConfig;
use super::errors::{classify_status, CompletionError};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat};
use crate::storage::credentials::Credential;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Backend trait ───────────────────────────────────────────────────────────

/// Anything that can turn a message list into completion text.
///
/// The orchestrator depends on this seam rather than on HTTP directly so
/// tests can script responses and count calls.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError>;
}

/// Run one backend call, bounded by `timeout`.
///
/// Applies to every backend, not just HTTP, so a stuck implementation can
/// never hold a caller past the limit.
pub async fn complete_within(
    backend: &dyn CompletionBackend,
    credential: &Credential,
    messages: Vec<ChatMessage>,
    timeout: Duration,
) -> Result<String, CompletionError> {
    match tokio::time::timeout(timeout, backend.complete(credential, messages)).await {
        Ok(result) => result,
        Err(_) => Err(CompletionError::Timeout {
            duration_secs: timeout.as_secs(),
        }),
    }
}

// ─── HttpCompletionClient ────────────────────────────────────────────────────

/// `reqwest`-backed client for `POST {endpoint}/chat/completions`.
pub struct HttpCompletionClient {
    http: HttpClient,
    endpoint: String,
    model: String,
    temperature: f32,
    force_json_response: bool,
    request_timeout: Duration,
}

impl HttpCompletionClient {
    /// Create a client from the companion configuration.
    ///
    /// Does NOT check connectivity — that happens on the first request.
    pub fn from_config(config: &CompanionConfig) -> Result<Self, CompletionError> {
        config.validate()?;
        let request_timeout = Duration::from_secs(config.request_timeout_secs);

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| CompletionError::ConnectionFailed {
                endpoint: config.endpoint.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            force_json_response: config.force_json_response,
            request_timeout,
        })
    }

    /// The full URL requests are sent to.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            response_format: self.force_json_response.then(|| ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        }
    }

    fn map_transport_error(&self, url: &str, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout {
                duration_secs: self.request_timeout.as_secs(),
            }
        } else {
            CompletionError::ConnectionFailed {
                endpoint: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(
        &self,
        credential: &Credential,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError> {
        let url = self.completions_url();
        let body = self.build_request(messages);

        // Metadata only; never the credential or the prompt body.
        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            json_mode = body.response_format.is_some(),
            "completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion endpoint returned error status");
            return Err(classify_status(status.as_u16(), body_text));
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&url, e))?;

        parse_completion_body(&body_text)
    }
}

/// Pull the first choice's content out of a completion response body.
pub fn parse_completion_body(body: &str) -> Result<String, CompletionError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedResponse {
            reason: format!("failed to parse completion body: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionError::MalformedResponse {
            reason: "empty choices array".into(),
        })?;

    choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(CompletionError::MalformedResponse {
            reason: "completion content is empty".into(),
        })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response on a loopback port and hand back the
    /// raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            request
        });

        (format!("http://{addr}/v1"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn client_for(endpoint: String) -> HttpCompletionClient {
        let config = CompanionConfig {
            endpoint,
            request_timeout_secs: 5,
            ..CompanionConfig::default()
        };
        HttpCompletionClient::from_config(&config).unwrap()
    }

    fn key() -> Credential {
        Credential::new("sk-test-123")
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let client = client_for("http://localhost:11434/v1/".into());
        assert_eq!(client.completions_url(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(client.model(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_build_request_json_mode() {
        let config = CompanionConfig {
            force_json_response: true,
            ..CompanionConfig::default()
        };
        let client = HttpCompletionClient::from_config(&config).unwrap();
        let req = client.build_request(vec![ChatMessage::user("hi")]);
        assert!(req.response_format.is_some());
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_completion_body_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"steps\":[]}"}}]}"#;
        assert_eq!(parse_completion_body(body).unwrap(), r#"{"steps":[]}"#);
    }

    #[test]
    fn test_parse_completion_body_failures() {
        for body in [
            "not json",
            r#"{"choices":[]}"#,
            r#"{"error":{"message":"x"}}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
        ] {
            assert!(
                matches!(
                    parse_completion_body(body),
                    Err(CompletionError::MalformedResponse { .. })
                ),
                "body {body} should be malformed"
            );
        }
    }

    #[tokio::test]
    async fn test_success_sends_bearer_and_returns_content() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"{\"steps\":[\"Stand up.\"]}"}}]}"#,
        )
        .await;
        let client = client_for(endpoint);

        let content = client
            .complete(&key(), vec![ChatMessage::user("clean my desk")])
            .await
            .unwrap();
        assert_eq!(content, r#"{"steps":["Stand up."]}"#);

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("post /v1/chat/completions"));
        assert!(request.contains("authorization: bearer sk-test-123"));
        assert!(request.contains("\"model\":\"gpt-3.5-turbo\""));
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let (endpoint, server) =
            serve_once("401 Unauthorized", r#"{"error":{"message":"bad key"}}"#).await;
        let err = client_for(endpoint)
            .complete(&key(), vec![ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Unauthorized { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limited_status() {
        let (endpoint, server) = serve_once("429 Too Many Requests", "{}").await;
        let err = client_for(endpoint)
            .complete(&key(), vec![ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::RateLimited));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "{}").await;
        let err = client_for(endpoint)
            .complete(&key(), vec![ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::ServerError { status: 500, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_choice_is_malformed() {
        let (endpoint, server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let err = client_for(endpoint)
            .complete(&key(), vec![ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse { .. }));
        server.await.unwrap();
    }
}
