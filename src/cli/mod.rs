pub mod report;
pub mod restyle;
pub mod rewrite;
pub mod summarize;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::llm::client::LlmClient;
use crate::llm::factory;

/// Flags accepted before the subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<String>,
    pub dry_run: bool,
}

/// Load config (explicit path, ./penwork.toml, user config dir) and apply
/// the LLM overrides every subcommand accepts.
pub(crate) fn load_config(
    global: &GlobalOpts,
    provider_override: Option<&str>,
    model_override: Option<&str>,
) -> Result<Config> {
    if let Some(ref cfg) = global.config {
        info!("Config: {}", cfg);
    }
    let mut config = Config::load_with_path(global.config.clone())?;

    if let Some(provider) = provider_override {
        info!("CLI override: provider = {}", provider);
        config.llm.provider = provider.to_string();
    }
    if let Some(model) = model_override {
        info!("CLI override: model = {}", model);
        config.llm.model = model.to_string();
    }
    Ok(config)
}

pub(crate) fn build_client(config: &Config, dry_run: bool) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        info!("Using mock LLM client");
    } else {
        info!(
            "Using {} LLM provider (model {})",
            config.llm.provider, config.llm.model
        );
    }
    factory::create_client(config, dry_run)
}
