//! httpflow CLI - run a dependency-ordered HTTP task flow

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::FalseyValueParser;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use httpflow::util::FETCH_TIMEOUT;
use httpflow::{
    load_definition, parse_exclusions, Environment, FixSuggestion, FlowError, PathBackendKind,
    RunConfig, Runner, TaskExecutor,
};

#[derive(Parser)]
#[command(name = "httpflow")]
#[command(about = "httpflow - run dependency-ordered HTTP tasks")]
#[command(version)]
struct Cli {
    /// Path to the definition file (JSON array of tasks, or .yaml)
    #[arg(short = 'p', long = "path", env = "DEBUG_PATH")]
    path: PathBuf,

    /// Run only this task and its transitive dependencies
    #[arg(short = 't', long = "task", env = "DEBUG_TASK")]
    task: Option<String>,

    /// Task ids to leave out, comma-separated (-e task1,task2)
    #[arg(short = 'e', long = "exclude", env = "DEBUG_EXCLUDE")]
    exclude: Option<String>,

    /// Print requests, responses and the final flow variables
    #[arg(short = 'd', long = "debug", env = "DEBUG_DEBUG", value_parser = FalseyValueParser::new())]
    debug: bool,

    /// Proxy for every request (socks5://host:port, http://host:port)
    #[arg(long, env = "SOCKS5_PROXY")]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = FETCH_TIMEOUT.as_secs())]
    timeout: u64,

    /// Evaluator for display and export paths
    #[arg(long, value_enum, default_value_t = PathBackendKind::Builtin)]
    path_backend: PathBackendKind,

    /// jq binary for --path-backend jq
    #[arg(long, env = "JQ_PATH", default_value = "jq")]
    jq_path: String,
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries progress lines only
fn init_tracing(debug: bool) {
    let default_directive = if debug { "info,httpflow=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), FlowError> {
    let config = RunConfig {
        proxy: cli.proxy,
        timeout: Duration::from_secs(cli.timeout),
        path_backend: cli.path_backend,
        jq_path: cli.jq_path,
    };
    config.validate()?;

    let tasks = load_definition(&cli.path).await?;

    // Snapshot after .env loading
    let environment = Arc::new(Environment::capture());
    let executor = TaskExecutor::new(config.http_client()?, environment);

    let excludes = cli
        .exclude
        .as_deref()
        .map(parse_exclusions)
        .unwrap_or_default();

    let report = Runner::new(tasks, executor, config.path_backend())
        .with_target(cli.task.clone())
        .with_excludes(excludes)
        .run()
        .await?;

    if cli.debug {
        if let (Some(task), Some(result)) = (&cli.task, &report.target_result) {
            println!(
                "{} {} target result {}",
                "[DEBUG]".dimmed(),
                task,
                serde_json::to_string(&result.to_json())?
            );
        }
        println!(
            "{} flow variables {}",
            "[DEBUG]".dimmed(),
            serde_json::to_string(&report.variables.to_json())?
        );
    }

    println!("{}", "done".green());
    Ok(())
}
