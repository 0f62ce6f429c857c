use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use penwork::cli::{self, GlobalOpts};

#[derive(Parser)]
#[command(name = "penwork", version)]
#[command(about = "LLM-assisted rewriting, report generation and summaries", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./penwork.toml or ~/.config/penwork/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Use mock LLM client instead of a real provider
    #[arg(long, global = true)]
    dry_run: bool,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every text under every system/user role pair
    Rewrite(cli::rewrite::RewriteArgs),

    /// Generate the technical report from section notes
    Report(cli::report::ReportArgs),

    /// Summarize articles into one Markdown document
    Summarize(cli::summarize::SummarizeArgs),

    /// Rewrite a chapter in the style of other authors
    Restyle(cli::restyle::RestyleArgs),

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn setup_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("penwork=info"),
        1 => EnvFilter::new("penwork=debug"),
        _ => EnvFilter::new("penwork=trace"),
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let global = GlobalOpts {
        config: cli.config,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Rewrite(args) => {
            let summary = cli::rewrite::run(args, &global).await?;
            info!(
                "Rewrite finished: {} generated, {} cached, {} failed",
                summary.generated, summary.skipped, summary.failed
            );
        }
        Commands::Report(args) => {
            if !cli::report::run(args, &global).await? {
                std::process::exit(1);
            }
        }
        Commands::Summarize(args) => {
            cli::summarize::run(args, &global).await?;
        }
        Commands::Restyle(args) => {
            let written = cli::restyle::run(args, &global).await?;
            info!("Restyle finished: {} response(s) written", written.len());
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "penwork", &mut io::stdout());
        }
    }

    Ok(())
}
