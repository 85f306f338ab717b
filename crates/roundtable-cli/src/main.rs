//! Roundtable - turn-managed group chat CLI
//!
//! ## Commands
//!
//! - `run`: bootstrap a session from a config file (or the built-in preset)
//!   and run it to completion, writing transcript artifacts
//! - `preset`: print the built-in code-translation session config
//! - `validate`: load and validate a session config
//! - `render`: verify a `transcript.json` artifact and render it as Markdown

mod bootstrap;
mod console;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use roundtable_core::{
    code_translation_session, read_transcript_artifact, render_transcript_md,
    write_transcript_json, write_transcript_md, AutoApprove, ConfirmationChannel, LogOptions,
    Orchestrator, SessionConfig, TranscriptArtifact,
};

use crate::bootstrap::{build_roster, Replies};
use crate::console::ConsoleConfirmation;

#[derive(Parser)]
#[command(name = "roundtable")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn-managed group chat for role-playing agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "ROUNDTABLE_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session to completion
    Run {
        /// Session config (.toml or .json); defaults to the code-translation preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Canned replies for scripted participants (.toml or .json)
        #[arg(short, long)]
        replies: Option<PathBuf>,

        /// Directory for transcript.json and transcript.md
        #[arg(long, default_value = "roundtable-out")]
        artifacts_dir: PathBuf,

        /// Approve every confirmation instead of asking on the console
        #[arg(long)]
        auto_approve: bool,

        /// Override the configured round ceiling
        #[arg(long)]
        max_rounds: Option<u32>,
    },

    /// Print the built-in code-translation session config
    Preset {
        #[arg(short, long, value_enum, default_value_t = Format::Toml)]
        format: Format,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a session config
    Validate {
        config: PathBuf,
    },

    /// Verify a transcript.json artifact and render it as Markdown
    Render {
        artifact: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Toml,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_options = if cli.verbose {
        LogOptions::verbose(cli.json)
    } else {
        LogOptions {
            json: cli.json,
            ..LogOptions::default()
        }
    };
    roundtable_core::init_tracing(log_options);

    match cli.command {
        Commands::Run {
            config,
            replies,
            artifacts_dir,
            auto_approve,
            max_rounds,
        } => {
            cmd_run(
                config.as_deref(),
                replies.as_deref(),
                &artifacts_dir,
                auto_approve,
                max_rounds,
            )
            .await
        }
        Commands::Preset { format, output } => cmd_preset(format, output.as_deref()),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Render { artifact, output } => cmd_render(&artifact, output.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => {
            SessionConfig::from_path(path).with_context(|| format!("load session {:?}", path))
        }
        None => {
            let config = code_translation_session();
            config.validate().context("validate built-in preset")?;
            Ok(config)
        }
    }
}

async fn cmd_run(
    config_path: Option<&Path>,
    replies_path: Option<&Path>,
    artifacts_dir: &Path,
    auto_approve: bool,
    max_rounds: Option<u32>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(rounds) = max_rounds {
        config.round_ceiling = rounds;
        config.validate().context("validate round ceiling override")?;
    }

    let replies = match replies_path {
        Some(path) => Replies::from_path(path)?,
        None => Replies::default(),
    };
    let confirmation: Arc<dyn ConfirmationChannel> = if auto_approve {
        Arc::new(AutoApprove)
    } else {
        Arc::new(ConsoleConfirmation::new())
    };

    let roster = build_roster(&config, replies, confirmation)?;
    let mut orchestrator =
        Orchestrator::from_config(&config, roster).context("build orchestrator")?;

    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling session");
            cancel.cancel();
        }
    });

    info!(
        session_id = %orchestrator.session_id(),
        participants = config.participants.len(),
        "starting session"
    );
    let outcome = orchestrator
        .start(config.seed_message.clone(), &config.seed_author)
        .await
        .context("run session")?;

    std::fs::create_dir_all(artifacts_dir)
        .with_context(|| format!("create {:?}", artifacts_dir))?;
    let artifact = TranscriptArtifact::from_outcome(&outcome)?;
    let json_path = artifacts_dir.join("transcript.json");
    let md_path = artifacts_dir.join("transcript.md");
    write_transcript_json(&json_path, &artifact)
        .with_context(|| format!("write {:?}", json_path))?;
    write_transcript_md(&md_path, &artifact).with_context(|| format!("write {:?}", md_path))?;

    println!("Session:  {}", outcome.session_id);
    println!("Status:   {}", outcome.status);
    println!("Rounds:   {}", outcome.rounds);
    println!("Messages: {}", outcome.transcript.len());
    println!("Digest:   {}", artifact.digest);
    println!("Artifacts written to {:?}", artifacts_dir);

    if outcome.status.is_failure() {
        bail!("session failed: {}", outcome.status);
    }
    Ok(())
}

fn cmd_preset(format: Format, output: Option<&Path>) -> Result<()> {
    let config = code_translation_session();
    let rendered = match format {
        Format::Toml => config.to_toml_string()?,
        Format::Json => serde_json::to_string_pretty(&config).context("serialize preset")?,
    };
    match output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("write {:?}", path))?;
            println!("Preset written to {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    println!(
        "{:?} is valid: {} participants, ceiling {}, selection {}",
        path,
        config.participants.len(),
        config.round_ceiling,
        config.selection.name()
    );
    for p in &config.participants {
        let mut traits = Vec::new();
        if p.execution_enabled {
            traits.push("executes code");
        }
        if p.human_confirmation {
            traits.push("human confirmation");
        }
        println!("  - {} ({}) {}", p.name, p.role, traits.join(", "));
    }
    Ok(())
}

fn cmd_render(path: &Path, output: Option<&Path>) -> Result<()> {
    let artifact =
        read_transcript_artifact(path).with_context(|| format!("read artifact {:?}", path))?;
    let md = render_transcript_md(&artifact);
    match output {
        Some(out) => {
            std::fs::write(out, md).with_context(|| format!("write {:?}", out))?;
            println!("Digest verified: {}", artifact.digest);
        }
        None => print!("{}", md),
    }
    Ok(())
}
