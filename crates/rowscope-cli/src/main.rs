//! Rowscope CLI - inspect the statements a console runs to count table rows.
//!
//! Nothing here connects to a database. The CLI prints the statement for a
//! request, explains which counting branch it takes for a given catalog
//! estimate, and shows the role-impersonated batch.

mod commands;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use rowscope_core::THRESHOLD_COUNT;

/// Rowscope row-count statement tool.
///
/// Builds the exact or estimated count statements a database console issues
/// when browsing a table.
#[derive(Parser)]
#[command(name = "rowscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Suppress info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Output format options.
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Where a count request comes from.
#[derive(Args, Clone, Default)]
struct RequestArgs {
    /// Read the request from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["table_id", "table", "schema", "filter", "exact"])]
    request: Option<PathBuf>,

    /// Table oid
    #[arg(long)]
    table_id: Option<u32>,

    /// Table name
    #[arg(long)]
    table: Option<String>,

    /// Table schema (unqualified when omitted)
    #[arg(long)]
    schema: Option<String>,

    /// Filter as "column operator value", may be repeated
    #[arg(long)]
    filter: Vec<String>,

    /// Always count exactly
    #[arg(long)]
    exact: bool,

    /// Row count above which counts are estimated
    #[arg(long, default_value_t = THRESHOLD_COUNT)]
    threshold: u64,
}

/// Role selector for `impersonate`.
#[derive(Clone, Copy, ValueEnum)]
enum RoleKind {
    /// Unauthenticated API role
    Anon,
    /// API role that bypasses row level security
    ServiceRole,
    /// A signed-in user (needs --user-id)
    Authenticated,
    /// Any other role (needs --custom-role)
    Custom,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the count statement for a request
    Sql {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Show which counting branch a request takes
    Strategy {
        #[command(flatten)]
        request: RequestArgs,

        /// Catalog estimate (pg_class.reltuples), -1 if never analyzed
        #[arg(long, allow_hyphen_values = true)]
        estimate: f64,
    },

    /// Print the count statement wrapped to run as a role
    Impersonate {
        #[command(flatten)]
        request: RequestArgs,

        /// Role to run as
        #[arg(long)]
        role: RoleKind,

        /// User id for the authenticated role
        #[arg(long)]
        user_id: Option<String>,

        /// Role name for a custom role
        #[arg(long)]
        custom_role: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else if !cli.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Sql { request } => commands::sql::run(&request, cli.format, cli.quiet),
        Commands::Strategy { request, estimate } => {
            commands::strategy::run(&request, estimate, cli.format, cli.quiet)
        }
        Commands::Impersonate {
            request,
            role,
            user_id,
            custom_role,
        } => commands::impersonate::run(
            &request,
            role,
            user_id,
            custom_role,
            cli.format,
            cli.quiet,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
