//! Costeo CLI - Recipe costing and pricing reports.
//!
//! # Usage
//!
//! ```bash
//! # Cost analysis for every active product (live data)
//! costeo analyze
//!
//! # Pricing issues from an exported file, as JSON
//! costeo --snapshot data.json --json issues
//!
//! # Try a new price
//! costeo simulate --product p1 --price 5.20
//! ```
//!
//! # Commands
//!
//! - `analyze` - Cost analysis per product
//! - `issues` - Products losing money, under target, or without a recipe
//! - `top` - Highest-impact inputs, labor roles or overheads
//! - `dashboard` - Counters, overhead and the most severe issues
//! - `simulate` - Margin at a candidate price
//! - `preview` - Line-by-line direct cost of a recipe
//! - `validate` - Dangling references and invalid entities
//! - `export` - Save the current data to a file
//! - `watch` - Re-render the dashboard on every change
//!
//! # Configuration
//!
//! Without `--snapshot`, data comes from the realtime database configured by
//! `COSTEO_DATABASE_URL` (plus optional `COSTEO_AUTH_TOKEN`,
//! `COSTEO_ROOT_PATH`, `COSTEO_POLL_INTERVAL_SECS`,
//! `COSTEO_READY_TIMEOUT_SECS`, `COSTEO_REQUEST_TIMEOUT_SECS`). Logs go to stderr; set `RUST_LOG` to filter
//! and `COSTEO_LOG_FORMAT=json` for JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use costeo_core::engine::DEFAULT_TOP_N;
use costeo_core::{CostingSnapshot, ProductId, RecipeId};
use costeo_store::{Backend, Store};
use rust_decimal::Decimal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use commands::report::TopKind;
use commands::{CommandError, Format};

mod commands;

#[derive(Parser)]
#[command(name = "costeo")]
#[command(author, version, about = "Recipe costing and pricing tools")]
struct Cli {
    /// Read data from a JSON or YAML export instead of the realtime database
    #[arg(short, long, global = true, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Write reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Report(ReportCommand),
    /// Save the current data to a file (YAML for .yaml/.yml, JSON otherwise)
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Re-render the dashboard every time the data changes
    Watch,
}

/// Commands that read one snapshot and write one report.
#[derive(Subcommand)]
enum ReportCommand {
    /// Cost analysis for every active product
    Analyze,
    /// Products with pricing issues, most severe first
    Issues {
        /// Show at most this many issues
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Highest-impact cost drivers
    Top {
        #[arg(value_enum)]
        kind: TopKind,

        /// Number of entries
        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
        limit: usize,
    },
    /// Counters, overhead and the most severe issues
    Dashboard,
    /// Margin a product would have at a new price
    Simulate {
        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Candidate selling price
        #[arg(long)]
        price: Decimal,
    },
    /// Line-by-line direct cost of a recipe
    Preview {
        /// Recipe ID
        recipe: String,
    },
    /// Check for dangling references and invalid entities
    Validate,
}

impl ReportCommand {
    fn run(
        self,
        out: &mut impl io::Write,
        snapshot: &CostingSnapshot,
        format: Format,
    ) -> Result<(), CommandError> {
        match self {
            Self::Analyze => commands::report::analyze(out, snapshot, format),
            Self::Issues { limit } => commands::report::issues(out, snapshot, limit, format),
            Self::Top { kind, limit } => commands::report::top(out, snapshot, kind, limit, format),
            Self::Dashboard => commands::report::dashboard(out, snapshot, format),
            Self::Simulate { product, price } => {
                commands::simulate::run(out, snapshot, &ProductId::new(product), price, format)
            }
            Self::Preview { recipe } => {
                commands::preview::run(out, snapshot, &RecipeId::new(recipe), format)
            }
            Self::Validate => commands::validate::run(out, snapshot, format),
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "costeo=info,costeo_store=info".into());

    let is_json = std::env::var("COSTEO_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(io::stderr)
    });
    let text_layer = (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format = if cli.json { Format::Json } else { Format::Text };

    if let Some(path) = &cli.snapshot {
        let store = Store::new(commands::source::file_backend(path).await?);
        execute(&store, cli.command, format).await?;
    } else {
        let store = Store::new(commands::source::realtime_backend()?);
        store.ready().await?;
        execute(&store, cli.command, format).await?;
    }
    Ok(())
}

async fn execute<B: Backend>(
    store: &Store<B>,
    command: Commands,
    format: Format,
) -> Result<(), CommandError> {
    match command {
        Commands::Report(command) => {
            let snapshot = store.load_snapshot().await?;
            command.run(&mut io::stdout().lock(), &snapshot, format)
        }
        Commands::Export { output } => {
            let snapshot = store.load_snapshot().await?;
            commands::export::run(&snapshot, &output).await
        }
        Commands::Watch => commands::watch::run(store, format).await,
    }
}
