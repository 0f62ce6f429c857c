use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

use super::{build_client, load_config, GlobalOpts};
use crate::config::load_dotenv;
use crate::pipeline::summarize::{Summarizer, DEFAULT_CHUNK_CHARS};

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Articles to summarize (.txt, .md, .pdf or .docx)
    #[arg(required = true)]
    pub articles: Vec<PathBuf>,

    /// Where to write the collected summaries (.docx for Word, else Markdown)
    #[arg(short, long, default_value = "summaries.docx")]
    pub output: PathBuf,

    /// Split articles longer than this many characters
    #[arg(long, default_value_t = DEFAULT_CHUNK_CHARS)]
    pub chunk_chars: usize,

    /// Override LLM model
    #[arg(long)]
    pub model: Option<String>,

    /// Override LLM provider
    #[arg(long)]
    pub provider: Option<String>,
}

/// Returns how many articles were summarized.
pub async fn run(args: SummarizeArgs, global: &GlobalOpts) -> Result<usize> {
    load_dotenv(None);
    let config = load_config(global, args.provider.as_deref(), args.model.as_deref())?;
    let client = build_client(&config, global.dry_run)?;

    let done = Summarizer::new(client)
        .with_chunk_chars(args.chunk_chars)
        .summarize_articles(&args.articles, &args.output)
        .await?;
    if done < args.articles.len() {
        warn!(
            "{} of {} articles could not be summarized",
            args.articles.len() - done,
            args.articles.len()
        );
    }
    Ok(done)
}
