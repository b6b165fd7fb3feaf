use std::path::{Path, PathBuf};
use std::process::ExitCode;

use callboard::canvas::{CanvasClient, MemoryCanvas, MiroClient};
use callboard::config::{CanvasConfig, ConfigError, RuleSet, load_rules};
use callboard::graph::{MalformedLinePolicy, ParseOptions};
use callboard::plan::plan_from_source;
use callboard::source::FileSource;
use callboard::{ErrorCode, Plan, PlanError, PublishError, publish};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Canvas(#[from] callboard::canvas::CanvasError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Plan(e) => e.error_code(),
            Self::Publish(e) => e.error_code(),
            Self::Canvas(e) => e.error_code(),
            Self::Encode(_) => "E_OUTPUT_ENCODE",
            Self::Write { .. } => "E_OUTPUT_WRITE",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "callboard", about = "Lay out a call graph as frames, notes and connectors on a canvas board")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the layout and print it as JSON.
    Plan(PlanArgs),
    /// Compute the layout and create it on a board.
    Publish(PublishArgs),
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Graph description (`digraph { "a" -> "b" ... }`).
    #[arg(long, env = "CALLBOARD_INPUT")]
    input: PathBuf,

    /// YAML rules file; defaults to a single gray catch-all group.
    #[arg(long, env = "CALLBOARD_RULES")]
    rules: Option<PathBuf>,

    /// Fail on the first malformed line instead of skipping it.
    #[arg(long)]
    strict: bool,

    /// Collapse repeated edges into one connector.
    #[arg(long)]
    dedupe_edges: bool,

    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PublishArgs {
    #[command(flatten)]
    plan: PlanArgs,

    #[arg(long, env = "CALLBOARD_BOARD_ID")]
    board_id: String,

    /// Record requests in memory instead of calling the canvas API.
    #[arg(long)]
    dry_run: bool,
}

impl PlanArgs {
    fn parse_options(&self) -> ParseOptions {
        let on_malformed = if self.strict { MalformedLinePolicy::Abort } else { MalformedLinePolicy::Skip };
        ParseOptions { on_malformed, dedupe_edges: self.dedupe_edges }
    }

    fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        match &self.rules {
            Some(path) => load_rules(path),
            None => Ok(RuleSet::default()),
        }
    }

    fn build(&self) -> Result<(Plan, RuleSet), CliError> {
        let rule_set = self.rule_set()?;
        let plan = plan_from_source(&FileSource, &self.input, &rule_set.rules, &self.parse_options())?;
        Ok((plan, rule_set))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Plan(args) => run_plan(&args),
        Command::Publish(args) => run_publish(&args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.error_code(), error = %e, "callboard failed");
            ExitCode::FAILURE
        }
    }
}

fn run_plan(args: &PlanArgs) -> Result<(), CliError> {
    let (plan, _rules) = args.build()?;
    emit(&plan, args.output.as_deref())
}

async fn run_publish(args: &PublishArgs) -> Result<(), CliError> {
    let (plan, rule_set) = args.plan.build()?;

    let client: Box<dyn CanvasClient> = if args.dry_run {
        info!("dry run: recording canvas requests in memory");
        Box::new(MemoryCanvas::new())
    } else {
        let config = CanvasConfig::from_env()?;
        info!(base_url = %config.base_url, rate_limit = config.rate_limit.limit, "canvas client configured");
        Box::new(MiroClient::new(&config)?)
    };

    let report = publish(client.as_ref(), &args.board_id, &plan, &rule_set.palette).await?;
    info!(
        board_id = %report.board_id,
        frames = report.frame_count(),
        notes = report.note_count(),
        connectors = report.connector_count(),
        "publish complete"
    );
    emit(&report, args.plan.output.as_deref())
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json).map_err(|source| CliError::Write { path: path.to_path_buf(), source }),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
