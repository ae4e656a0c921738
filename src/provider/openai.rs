use super::{ProviderOutput, Runner};
use crate::config::OpenAiConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI and compatible servers
pub struct OpenAiRunner {
    client: Client,
    config: OpenAiConfig,
    api_key: String,
}

impl OpenAiRunner {
    pub fn new(config: OpenAiConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| {
            ProviderError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid API key header: {}", e),
            ))
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl Runner for OpenAiRunner {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn execute(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<ProviderOutput, ProviderError> {
        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_tokens": self.config.max_tokens,
        });

        let start = std::time::Instant::now();
        debug!("POST {} ({} byte prompt)", self.url(), prompt.len());

        let request = self
            .client
            .post(self.url())
            .headers(self.headers()?)
            .json(&body)
            .send();

        let response = tokio_timeout(timeout, request)
            .await
            .map_err(|_| ProviderError::Timeout(timeout))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(ProviderOutput {
            stdout: content,
            stderr: String::new(),
            duration: start.elapsed(),
            exit_code: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = OpenAiConfig {
            api_base: "http://localhost:5001/v1/".to_string(),
            ..OpenAiConfig::default()
        };
        let runner = OpenAiRunner::new(config, "key".to_string()).unwrap();
        assert_eq!(runner.url(), "http://localhost:5001/v1/chat/completions");
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"a\":1}"));
    }
}
