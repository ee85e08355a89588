use clap::Parser;
use unfacade_core::error::{ConfigError, RuleError, UnfacadeError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "unfacade",
    version,
    about = "Inline deprecated facade helpers in TypeScript projects"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success, nothing found
///   1 — facade calls found, or a general error
///   2 — configuration error
///   3 — a rule hit an unsupported call
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<ConfigError>() {
            return 2;
        }
        if cause.is::<RuleError>() {
            return 3;
        }
        match cause.downcast_ref::<UnfacadeError>() {
            Some(UnfacadeError::Config(_)) => return 2,
            Some(UnfacadeError::Rule(_)) => return 3,
            _ => {}
        }
    }
    1
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command) {
        Ok(commands::Outcome::Clean) => std::process::exit(0),
        Ok(commands::Outcome::Findings) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
