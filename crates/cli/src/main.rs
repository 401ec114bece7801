// bumpwatch CLI - watch a release feed, keep CI build matrices current

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bumpwatch_cli::dispatch::{DeliveryOutcome, DispatchReport, Dispatcher};
use bumpwatch_cli::exit_codes::{
    EXIT_CHECK_DIFFERS, EXIT_DISPATCH_FAILURES, EXIT_INTERNAL, EXIT_KEYCHAIN_ERR, EXIT_SUCCESS,
};
use bumpwatch_cli::feed::{FeedSource, FileFeed, PypiFeed};
use bumpwatch_cli::targets::{GitOpsTarget, LoggingTarget, TargetOutcome};
use bumpwatch_cli::{logging, CliError};
use bumpwatch_config::{TargetKind, WatchConfig};
use bumpwatch_github::GithubClient;
use bumpwatch_matrix::{canonicalize, reconcile_document, CiDocument, DocumentOutcome};

#[derive(Parser)]
#[command(name = "bumpwatch")]
#[command(about = "Keep CI build matrices in sync with new package releases")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the release feed once and update every watched CI file
    #[command(after_help = "\
Exit code 60 means a github target is configured but no token was found.
Exit code 30 means at least one target failed; the others still ran.

Examples:
  bumpwatch watch
  bumpwatch watch --config ./watchlist.toml --dry-run
  bumpwatch watch --feed-file saved-updates.xml --json")]
    Watch {
        /// Watchlist file (default: <config dir>/bumpwatch/watchlist.toml)
        #[arg(long, short = 'c', env = "BUMPWATCH_CONFIG")]
        config: Option<PathBuf>,

        /// Read the feed from a local RSS file instead of the network
        #[arg(long, value_name = "PATH")]
        feed_file: Option<PathBuf>,

        /// Reconcile but do not commit
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a release to a local CI file's matrix
    #[command(after_help = "\
Examples:
  bumpwatch bump .travis.yml --package PyYAML --version 3.12
  bumpwatch bump .travis.yml -p PyGithub --version 1.27.1 --write")]
    Bump {
        /// CI file carrying an `env:` matrix
        file: PathBuf,

        /// Package name as published (e.g. PyYAML → _PYYAML)
        #[arg(long, short = 'p')]
        package: String,

        /// Released version
        #[arg(long = "version", value_name = "VERSION")]
        release: String,

        /// Rewrite FILE in place instead of printing to stdout
        #[arg(long, short = 'w')]
        write: bool,
    },

    /// Verify a CI file's matrix is complete and in canonical order (exit 1 if not)
    Check {
        /// CI file carrying an `env:` matrix
        file: PathBuf,
    },

    /// Store a GitHub token in the system keychain
    Login {
        /// Token to store (read from stdin if omitted)
        #[arg(long)]
        token: Option<String>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("BUMPWATCH_COMMIT"), ")",
        "\ntarget:  ", env!("BUMPWATCH_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let result = match cli.command {
        Commands::Watch { config, feed_file, dry_run, json } => {
            cmd_watch(config, feed_file, dry_run, json)
        }
        Commands::Bump { file, package, release, write } => cmd_bump(file, package, release, write),
        Commands::Check { file } => cmd_check(file),
        Commands::Login { token } => cmd_login(token),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// watch
// ============================================================================

fn cmd_watch(
    config_path: Option<PathBuf>,
    feed_file: Option<PathBuf>,
    dry_run: bool,
    json: bool,
) -> Result<(), CliError> {
    let config_path = config_path.unwrap_or_else(WatchConfig::default_path);
    let config = WatchConfig::load(&config_path).map_err(CliError::config)?;
    tracing::debug!(path = %config_path.display(), packages = config.packages.len(), "loaded watchlist");

    let mut dispatcher = Dispatcher::new(&config);
    dispatcher.register(TargetKind::Log, Box::new(LoggingTarget));

    // Credentials are checked before the feed is fetched.
    if config.needs_github() {
        let lookup = bumpwatch_config::github_token();
        tracing::debug!(source = lookup.source.as_str(), "GitHub token lookup");
        let client = GithubClient::from_token(&config.github.api_base, lookup.token)
            .map_err(CliError::github)?;
        dispatcher.register(
            TargetKind::Github,
            Box::new(GitOpsTarget::new(client).dry_run(dry_run)),
        );
    }

    let entries = match feed_file {
        Some(path) => FileFeed::new(path).poll(),
        None => PypiFeed::new(&config.feed.url, config.feed.timeout_secs).and_then(|feed| feed.poll()),
    }
    .map_err(CliError::feed)?;

    let report = dispatcher.dispatch(entries);

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_INTERNAL, e.to_string()))?;
        println!("{}", out);
    } else {
        print_report(&report);
    }

    let failures = report.failures();
    if failures > 0 {
        return Err(CliError::new(
            EXIT_DISPATCH_FAILURES,
            format!("{} of {} targets failed", failures, report.deliveries.len()),
        ));
    }
    Ok(())
}

fn print_report(report: &DispatchReport) {
    for d in &report.deliveries {
        println!("{} {} -> {}: {}", d.package, d.version, d.target, describe(&d.outcome));
    }
    println!(
        "{} feed entries ({} malformed, {} not watched), {} targets: {} committed, {} rejected, {} failed",
        report.entries,
        report.malformed,
        report.ignored,
        report.deliveries.len(),
        report.committed(),
        report.rejected(),
        report.failures(),
    );
}

fn describe(outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Done(TargetOutcome::Unchanged) => "unchanged".to_string(),
        DeliveryOutcome::Done(TargetOutcome::Untracked) => "no matching matrix variable".to_string(),
        DeliveryOutcome::Done(TargetOutcome::Committed { commit }) => format!("committed {}", commit),
        DeliveryOutcome::Done(TargetOutcome::Rejected { reason }) => format!("rejected ({})", reason),
        DeliveryOutcome::Done(TargetOutcome::DryRun { lines }) => {
            format!("would commit {} matrix lines", lines.len())
        }
        DeliveryOutcome::Failed { error } => format!("failed ({})", error),
    }
}

// ============================================================================
// bump
// ============================================================================

fn cmd_bump(file: PathBuf, package: String, version: String, write: bool) -> Result<(), CliError> {
    let origin = file.display().to_string();
    let text = std::fs::read_to_string(&file)
        .map_err(|e| CliError::io(format!("{}: {}", origin, e)))?;

    let reconciliation =
        reconcile_document(&text, &package, &version).map_err(|e| CliError::matrix(&origin, e))?;

    match reconciliation.outcome {
        DocumentOutcome::Unchanged => {
            if reconciliation.tracked {
                eprintln!("{}: already covers {} {}", origin, package, version);
            } else {
                eprintln!(
                    "{}: no {} variable in the matrix, nothing to do",
                    origin, reconciliation.variable
                );
            }
            if !write {
                print!("{}", text);
            }
        }
        DocumentOutcome::Updated { text: updated, lines, change } => {
            if write {
                std::fs::write(&file, &updated)
                    .map_err(|e| CliError::io(format!("{}: {}", origin, e)))?;
            } else {
                print!("{}", updated);
            }
            eprintln!("{}: {} ({} matrix lines)", origin, change, lines.len());
        }
    }
    Ok(())
}

// ============================================================================
// check
// ============================================================================

fn cmd_check(file: PathBuf) -> Result<(), CliError> {
    let origin = file.display().to_string();
    let text = std::fs::read_to_string(&file)
        .map_err(|e| CliError::io(format!("{}: {}", origin, e)))?;

    let lines = CiDocument::from_yaml(&text)
        .and_then(|doc| doc.env_lines())
        .map_err(|e| CliError::matrix(&origin, e))?;
    let canonical = canonicalize(&lines).map_err(|e| CliError::matrix(&origin, e))?;

    if canonical == lines {
        eprintln!("{}: matrix is canonical ({} lines)", origin, lines.len());
        return Ok(());
    }

    for line in &canonical {
        println!("{}", line);
    }
    Err(CliError::new(EXIT_CHECK_DIFFERS, format!("{}: matrix is not canonical", origin))
        .with_hint("the lines above are the complete matrix in canonical order"))
}

// ============================================================================
// login
// ============================================================================

fn cmd_login(token: Option<String>) -> Result<(), CliError> {
    let token = match token {
        Some(token) => token,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|e| CliError::io(e.to_string()))?;
            line
        }
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::args("empty token"));
    }

    bumpwatch_config::set_github_token(token)
        .map_err(|e| CliError::new(EXIT_KEYCHAIN_ERR, e))?;
    eprintln!("GitHub token stored in the system keychain");
    Ok(())
}
