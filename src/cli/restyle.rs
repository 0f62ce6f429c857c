use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::{build_client, load_config, GlobalOpts};
use crate::config::load_dotenv;
use crate::pipeline::restyle::{RestyleJob, Restyler};

const DEFAULT_AUTHORS: &[&str] = &["Philip K Dick", "Isaac Asimov", "Dan Brown"];

#[derive(Args, Debug, Clone)]
pub struct RestyleArgs {
    /// Directory holding the chapter; responses/ is created inside it
    pub dir: PathBuf,

    /// Chapter file name inside DIR
    pub text_file: String,

    /// Author to imitate (repeatable)
    #[arg(long = "author")]
    pub authors: Vec<String>,

    /// Description of the book placed before the instruction
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// Read the book description from a file
    #[arg(long)]
    pub context_file: Option<PathBuf>,

    /// Override LLM model
    #[arg(long)]
    pub model: Option<String>,

    /// Override LLM provider
    #[arg(long)]
    pub provider: Option<String>,
}

impl RestyleArgs {
    fn book_context(&self) -> Result<String> {
        match (&self.context, &self.context_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => Ok(String::new()),
        }
    }

    fn authors(&self) -> Vec<String> {
        if self.authors.is_empty() {
            DEFAULT_AUTHORS.iter().map(|a| a.to_string()).collect()
        } else {
            self.authors.clone()
        }
    }
}

pub async fn run(args: RestyleArgs, global: &GlobalOpts) -> Result<Vec<PathBuf>> {
    load_dotenv(Some(args.dir.as_path()));
    let config = load_config(global, args.provider.as_deref(), args.model.as_deref())?;

    let job = RestyleJob {
        dir: args.dir.clone(),
        text_file: args.text_file.clone(),
        authors: args.authors(),
        book_context: args.book_context()?,
    };

    let client = build_client(&config, global.dry_run)?;
    Restyler::new(client).run(&job).await
}
