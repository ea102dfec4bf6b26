use backlog::{CliResult, Command};
use backlog_db::Database;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable name for the database path
const BKL_DB_PATH_ENV: &str = "BKL_DB_PATH";

/// Environment variable holding the log filter
const BKL_LOG_ENV: &str = "BKL_LOG";

/// Backlog - organizations, projects, members and tasks from the command line
#[derive(Parser)]
#[command(name = "bkl")]
#[command(version)]
#[command(about = "A multi-tenant project and task backlog", long_about = None)]
struct Args {
    /// Path to the database directory (can also be set via BKL_DB_PATH env var)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Get the database path from command line, environment variable, or default.
///
/// Priority:
/// 1. Command line --db argument
/// 2. BKL_DB_PATH environment variable (if non-empty)
/// 3. Default path (`<git root>/.backlog/data`)
fn resolve_db_path(cli_db: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_db {
        return path;
    }

    if let Ok(env_path) = std::env::var(BKL_DB_PATH_ENV)
        && !env_path.is_empty()
    {
        return PathBuf::from(env_path);
    }

    Database::default_path()
}

/// Initialize logging from `BKL_LOG` (e.g. `BKL_LOG=backlog_db=debug`).
/// Logs go to stderr so command output stays clean.
fn init_logging() {
    let env_filter =
        EnvFilter::try_from_env(BKL_LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let args = Args::parse();
    match run_with_args(&args).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("error: {}", e.full_message());
            process::exit(1);
        }
    }
}

/// Run the application with the given arguments and return the text to print
async fn run_with_args(args: &Args) -> CliResult<String> {
    let Some(cmd) = &args.command else {
        return Ok("Welcome to Backlog!\nUse 'bkl --help' for usage information.".to_string());
    };

    let db_path = resolve_db_path(args.db.clone());
    let db = Database::connect(&db_path).await?;
    db.init().await?;

    cmd.execute(&db).await
}
