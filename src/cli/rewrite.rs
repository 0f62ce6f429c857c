use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{build_client, load_config, GlobalOpts};
use crate::config::load_dotenv;
use crate::pipeline::rewrite::{RewriteJob, RewriteSummary, Rewriter};

#[derive(Args, Debug, Clone)]
pub struct RewriteArgs {
    /// Working directory holding system_roles/, user_roles/ and text/
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Shrink each text by this percentage (overrides rewrite.reduction)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub reduction: Option<u32>,

    /// Regenerate responses even when the inputs are unchanged
    #[arg(long)]
    pub force: bool,

    /// Override LLM model
    #[arg(long)]
    pub model: Option<String>,

    /// Override LLM provider
    #[arg(long)]
    pub provider: Option<String>,
}

pub async fn run(args: RewriteArgs, global: &GlobalOpts) -> Result<RewriteSummary> {
    load_dotenv(Some(args.dir.as_path()));
    let mut config = load_config(global, args.provider.as_deref(), args.model.as_deref())?;
    if let Some(reduction) = args.reduction {
        info!("CLI override: reduction = {}%", reduction);
        config.rewrite.reduction = reduction;
    }

    let job = RewriteJob::new(&args.dir)
        .with_reduction(config.rewrite.reduction)
        .with_force(args.force)
        .with_model(config.llm.model.clone())
        .with_dry_run(global.dry_run);
    job.prepare()?;

    let client = build_client(&config, global.dry_run)?;
    Rewriter::new(client).run(&job).await
}
