use anyhow::Result;
use clap::Args;
use std::path::Path;
use tracing::info;

use super::{build_client, load_config, GlobalOpts};
use crate::config::load_dotenv;
use crate::report::{create_sample_input_files, ReportGenerator, RunMode};

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Directory containing the section notes (default: input)
    #[arg(long)]
    pub input_dir: Option<String>,

    /// Directory for generated output files (default: output)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Environment name used in the title and prompts (default: OpenAI Gym)
    #[arg(long)]
    pub environment: Option<String>,

    /// Regenerate every section, ignoring change detection
    #[arg(long)]
    pub force: bool,

    /// Render from existing outputs only (no section generation)
    #[arg(long)]
    pub pdf_only: bool,

    /// Also write LaTeX and compile it to PDF (requires pdflatex)
    #[arg(long)]
    pub latex: bool,

    /// Only compile the existing LaTeX file to PDF
    #[arg(long)]
    pub compile_latex_only: bool,

    /// Only concatenate the notes into a single file
    #[arg(long)]
    pub concatenate_only: bool,

    /// Create template notes for every section and exit
    #[arg(long)]
    pub create_samples: bool,

    /// Override LLM model
    #[arg(long)]
    pub model: Option<String>,

    /// Override LLM provider (openai, anthropic, gemini, openai-compatible)
    #[arg(long)]
    pub provider: Option<String>,
}

impl ReportArgs {
    /// The narrowest mode wins when several are given.
    pub fn mode(&self) -> RunMode {
        if self.compile_latex_only {
            RunMode::CompileLatexOnly
        } else if self.concatenate_only {
            RunMode::ConcatenateOnly
        } else if self.pdf_only {
            RunMode::PdfOnly { latex: self.latex }
        } else {
            RunMode::Full {
                force: self.force,
                latex: self.latex,
            }
        }
    }
}

/// Returns whether the report run succeeded.
pub async fn run(args: ReportArgs, global: &GlobalOpts) -> Result<bool> {
    let mut config = load_config(global, args.provider.as_deref(), args.model.as_deref())?;

    if let Some(ref dir) = args.input_dir {
        info!("CLI override: input_dir = {}", dir);
        config.report.input_dir = dir.clone();
    }
    if let Some(ref dir) = args.output_dir {
        info!("CLI override: output_dir = {}", dir);
        config.report.output_dir = dir.clone();
    }

    let input_parent = Path::new(&config.report.input_dir)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);
    load_dotenv(input_parent.as_deref());
    config.report.apply_env();

    if let Some(ref env) = args.environment {
        info!("CLI override: environment = {}", env);
        config.report.environment = env.clone();
    }

    if args.create_samples {
        create_sample_input_files(Path::new(&config.report.input_dir))?;
        return Ok(true);
    }

    let mode = args.mode();
    // These modes never call the LLM and need no API key
    let offline = matches!(
        mode,
        RunMode::CompileLatexOnly | RunMode::ConcatenateOnly | RunMode::PdfOnly { latex: false }
    );
    let mock = global.dry_run || offline;
    let client = build_client(&config, mock)?;

    let mut generator = ReportGenerator::new(client, config.report)?.with_dry_run(mock);
    let success = generator.run(mode).await?;
    if success {
        info!("[OK] Report generation completed successfully!");
    } else {
        tracing::error!("[ERROR] Report generation failed.");
    }
    Ok(success)
}
