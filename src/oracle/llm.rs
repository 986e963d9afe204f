use serde::{Deserialize, Serialize};

use super::OracleError;
use crate::config;

/// Text-generation oracle, treated as a black-box function: prompt in,
/// text out. The model is fixed at construction so pipeline code stays
/// model-agnostic.
pub trait LlmClient: Send + Sync {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, OracleError>;

    /// Liveness probe for the health endpoint. Defaults to reachable so
    /// test doubles need not implement it.
    fn is_available(&self) -> bool {
        true
    }
}

/// HTTP generation client for an Ollama-compatible local inference server.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OracleError::ResponseParsing(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default local instance with the configured oracle timeout.
    pub fn default_local(model: &str) -> Result<Self, OracleError> {
        Self::new("http://localhost:11434", model, config::ORACLE_TIMEOUT_SECS)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_send_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_connect() {
            OracleError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            OracleError::Timeout(self.timeout_secs)
        } else {
            OracleError::ResponseParsing(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, OracleError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OracleError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| OracleError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Mock generation oracle for tests — returns a configured response or a
/// forced connection failure.
pub struct MockLlmClient {
    response: Result<String, String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    /// A mock whose every call fails as if the oracle were unreachable.
    pub fn unreachable() -> Self {
        Self {
            response: Err("mock oracle down".to_string()),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _prompt: &str, _system: &str) -> Result<String, OracleError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(OracleError::Connection(reason.clone())),
        }
    }

    fn is_available(&self) -> bool {
        self.response.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("ranked list");
        assert_eq!(client.generate("p", "s").unwrap(), "ranked list");
        assert!(client.is_available());
    }

    #[test]
    fn unreachable_mock_fails_with_connection_error() {
        let client = MockLlmClient::unreachable();
        let result = client.generate("p", "s");
        assert!(matches!(result, Err(OracleError::Connection(_))));
        assert!(!client.is_available());
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3", 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn default_local_uses_configured_timeout() {
        let client = OllamaClient::default_local("llama3").unwrap();
        assert_eq!(client.timeout_secs, crate::config::ORACLE_TIMEOUT_SECS);
    }
}
