use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A single chat-completion call: optional system role plus the user turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    /// Per-request override of the client's max_tokens
    pub max_tokens: Option<u32>,
    /// Per-request override of the client's temperature
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Offline client for `--dry-run` and tests. Never touches the network.
pub struct MockLlmClient {
    fixed: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            fixed: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answer with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            fixed: Some(response.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter; stays valid after the client is boxed and moved.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ref fixed) = self.fixed {
            return Ok(fixed.clone());
        }

        let prompt = request.user.as_str();
        if prompt.contains("Convert the following references to BibTeX") {
            return Ok(r#"```bibtex
@book{powers1973,
  author = {Powers, William T.},
  title = {Behavior: The Control of Perception},
  publisher = {Aldine de Gruyter},
  year = {1973}
}
```"#
                .to_string());
        }
        if prompt.contains("write a concise abstract") {
            return Ok("This report summarises the study (Powers, 1973).\n\nResults favour the controller under test.".to_string());
        }

        let first_line = prompt
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        Ok(format!("[dry-run] {}", first_line))
    }
}
