//! Remote classification providers.
//!
//! Both providers take a single prompt and return the model's raw text. The
//! categorizer only sees the `Classifier` trait.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Provider, RemoteConfig};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} error: {status} {body}")]
    Status {
        provider: Provider,
        status: StatusCode,
        body: String,
    },

    #[error("{0} returned no text")]
    EmptyResponse(Provider),

    #[error("invalid API key header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("unusable classification response: {0}")]
    BadResponse(String),

    #[error("{0}")]
    Other(String),
}

/// Anything that can turn a prompt into model text.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, prompt: &str) -> Result<String, ClassifyError>;
}

/// Build the adapter for `config.provider`.
pub fn build_classifier(config: &RemoteConfig) -> Result<Arc<dyn Classifier>, ClassifyError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(|source| ClassifyError::Http {
        provider: config.provider,
        source,
    })?;

    Ok(match config.provider {
        Provider::Anthropic => Arc::new(AnthropicClassifier {
            client,
            config: config.clone(),
        }),
        Provider::OpenAI => Arc::new(OpenAiClassifier {
            client,
            config: config.clone(),
        }),
    })
}

async fn error_for_status(provider: Provider, resp: reqwest::Response) -> Result<reqwest::Response, ClassifyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClassifyError::Status {
        provider,
        status,
        body,
    })
}

/// Anthropic Messages API adapter.
pub struct AnthropicClassifier {
    client: reqwest::Client,
    config: RemoteConfig,
}

#[async_trait]
impl Classifier for AnthropicClassifier {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn classify(&self, prompt: &str) -> Result<String, ClassifyError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let provider = Provider::Anthropic;
        let body = Req {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.config.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(self.config.endpoint("/v1/messages"))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|source| ClassifyError::Http { provider, source })?;
        let resp = error_for_status(provider, resp).await?;

        let out: Resp = resp
            .json()
            .await
            .map_err(|source| ClassifyError::Http { provider, source })?;
        let text: String = out
            .content
            .into_iter()
            .filter(|b| b.t == "text")
            .filter_map(|b| b.text)
            .collect();

        let text = text.trim();
        if text.is_empty() {
            return Err(ClassifyError::EmptyResponse(provider));
        }
        Ok(text.to_string())
    }
}

/// OpenAI Chat Completions adapter.
pub struct OpenAiClassifier {
    client: reqwest::Client,
    config: RemoteConfig,
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, prompt: &str) -> Result<String, ClassifyError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let provider = Provider::OpenAI;
        let body = Req {
            model: &self.config.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .client
            .post(self.config.endpoint("/v1/chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ClassifyError::Http { provider, source })?;
        let resp = error_for_status(provider, resp).await?;

        let out: Resp = resp
            .json()
            .await
            .map_err(|source| ClassifyError::Http { provider, source })?;
        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let content = content.trim();
        if content.is_empty() {
            return Err(ClassifyError::EmptyResponse(provider));
        }
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[test]
    fn test_build_classifier_picks_adapter() {
        let anthropic = build_classifier(&RemoteConfig::new(Provider::Anthropic, "k")).unwrap();
        assert_eq!(anthropic.name(), "anthropic");
        let openai = build_classifier(&RemoteConfig::new(Provider::OpenAI, "k")).unwrap();
        assert_eq!(openai.name(), "openai");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        // Bind then drop to get a local port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap().port();
        let mut cfg = RemoteConfig::new(Provider::OpenAI, "k");
        cfg.base_url = format!("http://127.0.0.1:{port}");
        cfg.timeout = Some(Duration::from_secs(2));
        let classifier = build_classifier(&cfg).unwrap();
        let err = classifier.classify("hello").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Http { provider: Provider::OpenAI, .. }));
    }

    #[tokio::test]
    async fn test_anthropic_request_and_reply() {
        let reply = r#"{"id":"msg_1","content":[{"type":"text","text":" {\"category\": \"Dining\"} "}]}"#;
        let (base_url, request) = serve_once("200 OK", reply).await;
        let classifier = build_classifier(&config(Provider::Anthropic, "sk-ant-test", base_url)).unwrap();

        let text = classifier.classify("Merchant: Blue Bottle").await.unwrap();
        assert_eq!(text, r#"{"category": "Dining"}"#);

        let request = request.await.unwrap();
        let lower = request.to_lowercase();
        assert!(request.starts_with("POST /v1/messages "));
        assert!(lower.contains("x-api-key: sk-ant-test"));
        assert!(lower.contains("anthropic-version: 2023-06-01"));
        let body = json_body(&request);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Merchant: Blue Bottle");
    }

    #[tokio::test]
    async fn test_openai_request_and_reply() {
        let reply = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{\"category\": \"Groceries\"}"}}]}"#;
        let (base_url, request) = serve_once("200 OK", reply).await;
        let classifier = build_classifier(&config(Provider::OpenAI, "sk-test", base_url)).unwrap();

        let text = classifier.classify("Merchant: Costco").await.unwrap();
        assert_eq!(text, r#"{"category": "Groceries"}"#);

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions "));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
        let body = json_body(&request);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["content"], "Merchant: Costco");
    }

    #[tokio::test]
    async fn test_blank_replies_are_empty_response() {
        let (base_url, _req) = serve_once("200 OK", r#"{"content":[{"type":"tool_use","id":"x"}]}"#).await;
        let classifier = build_classifier(&config(Provider::Anthropic, "sk-ant-test", base_url)).unwrap();
        let err = classifier.classify("p").await.unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyResponse(Provider::Anthropic)));

        let (base_url, _req) = serve_once("200 OK", r#"{"choices":[{"message":{"content":null}}]}"#).await;
        let classifier = build_classifier(&config(Provider::OpenAI, "sk-test", base_url)).unwrap();
        let err = classifier.classify("p").await.unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyResponse(Provider::OpenAI)));

        let (base_url, _req) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let classifier = build_classifier(&config(Provider::OpenAI, "sk-test", base_url)).unwrap();
        let err = classifier.classify("p").await.unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyResponse(Provider::OpenAI)));
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let (base_url, _req) = serve_once("429 Too Many Requests", r#"{"error":"rate limited"}"#).await;
        let classifier = build_classifier(&config(Provider::OpenAI, "sk-test", base_url)).unwrap();
        match classifier.classify("p").await.unwrap_err() {
            ClassifyError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert!(body.contains("rate limited"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn config(provider: Provider, key: &str, base_url: String) -> RemoteConfig {
        let mut cfg = RemoteConfig::new(provider, key);
        cfg.model = "test-model".to_string();
        cfg.base_url = base_url;
        cfg.timeout = Some(Duration::from_secs(5));
        cfg
    }

    fn json_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    /// Answer one HTTP request with `status` and a JSON `body`; the handle
    /// yields the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some((head, rest)) = text.split_once("\r\n\r\n") {
                    let len = head
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if rest.len() >= len {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (base_url, handle)
    }
}
