use anyhow::{bail, Result};

use super::client::{LlmClient, MockLlmClient};
use super::client_impl::{AnthropicClient, GeminiClient, OpenAIClient};
use crate::config::{Config, LlmConfig};

/// Create an LLM client from a provider section.
pub fn create_client_from_llm_config(
    llm_config: &LlmConfig,
    dry_run: bool,
) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        return Ok(Box::new(MockLlmClient::new()));
    }

    let api_key = llm_config.get_api_key()?;
    let max_tokens = llm_config.get_max_tokens();
    let timeout = llm_config.timeout_secs;
    let temperature = llm_config.temperature;

    match llm_config.provider.as_str() {
        "openai" => {
            let client = match llm_config.base_url {
                Some(ref base_url) => OpenAIClient::with_base_url(
                    api_key,
                    llm_config.model.clone(),
                    base_url.clone(),
                    max_tokens,
                    timeout,
                )?,
                None => OpenAIClient::new(api_key, llm_config.model.clone(), max_tokens, timeout)?,
            };
            Ok(Box::new(client.with_temperature(temperature)))
        }

        "openai-compatible" => {
            let base_url = llm_config
                .base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434/v1".to_string());

            Ok(Box::new(
                OpenAIClient::with_base_url(
                    api_key,
                    llm_config.model.clone(),
                    base_url,
                    max_tokens,
                    timeout,
                )?
                .with_temperature(temperature),
            ))
        }

        "anthropic" => {
            let client = match llm_config.base_url {
                Some(ref base_url) => AnthropicClient::with_base_url(
                    api_key,
                    llm_config.model.clone(),
                    base_url.clone(),
                    max_tokens,
                    timeout,
                )?,
                None => {
                    AnthropicClient::new(api_key, llm_config.model.clone(), max_tokens, timeout)?
                }
            };
            Ok(Box::new(client.with_temperature(temperature)))
        }

        "gemini" => Ok(Box::new(
            GeminiClient::new(api_key, llm_config.model.clone(), max_tokens, timeout)?
                .with_temperature(temperature),
        )),

        unknown => bail!("Unknown LLM provider: {}", unknown),
    }
}

/// Create an LLM client based on configuration
pub fn create_client(config: &Config, dry_run: bool) -> Result<Box<dyn LlmClient>> {
    create_client_from_llm_config(&config.llm, dry_run)
}
