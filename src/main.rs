//! # Chroma Harness CLI (`chroma-harness`)
//!
//! Seeds the demo collection on a Chroma server, runs the query battery and
//! prints a heuristic evaluation of each result set.
//!
//! ## Usage
//!
//! ```bash
//! chroma-harness [--reset] [--env-file .env] [--corpus corpus.toml] [--format text|json]
//! ```
//!
//! Connection settings come from `CHROMA_HOST` / `CHROMA_PORT` (and friends),
//! looked up in the environment first, then in the `.env` file, then in the
//! built-in defaults (`localhost:8000`).
//!
//! ## Examples
//!
//! ```bash
//! # Seed and evaluate against a local server
//! chroma-harness
//!
//! # Start from an empty server (requires ALLOW_RESET=TRUE on the server)
//! chroma-harness --reset
//!
//! # No server at all: in-memory store, JSON lines on stdout
//! chroma-harness --in-memory --format json
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chroma_harness::config::{self, Config};
use chroma_harness::corpus::Corpus;
use chroma_harness::runner::{self, RunOptions};
use chroma_harness::store::chroma::ChromaStore;
use chroma_harness::store::memory::InMemoryStore;
use chroma_harness::store::VectorStore;

/// HTTP client for ChromaDB: seeds a themed collection and evaluates
/// semantic queries with a keyword heuristic.
#[derive(Parser)]
#[command(
    name = "chroma-harness",
    about = "HTTP client for ChromaDB that seeds a demo collection and scores semantic queries",
    version
)]
struct Cli {
    /// Clear the remote database before inserting documents.
    #[arg(long)]
    reset: bool,

    /// Path to a `KEY=VALUE` settings file. A missing file is ignored.
    ///
    /// The default is resolved against the current working directory, so run
    /// from the project root or pass an explicit path.
    #[arg(long, default_value = config::DEFAULT_ENV_PATH)]
    env_file: PathBuf,

    /// Alternate corpus and query battery (TOML). Defaults to the built-in set.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Output format for the evaluation reports.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Use an in-memory store instead of a Chroma server.
    #[arg(long)]
    in_memory: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable blocks.
    #[default]
    Text,
    /// One JSON object per query.
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error running the client: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chroma_harness=debug,info"
    } else {
        "chroma_harness=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = Config::load(&cli.env_file);

    let corpus = match &cli.corpus {
        Some(path) => Corpus::load(path)?,
        None => Corpus::builtin()?,
    };
    tracing::debug!(
        "corpus v{}: {} documents, {} topics, {} queries",
        corpus.version,
        corpus.documents.len(),
        corpus.topics().len(),
        corpus.queries.len()
    );

    let store: Box<dyn VectorStore> = if cli.in_memory {
        Box::new(InMemoryStore::new())
    } else {
        Box::new(ChromaStore::new(&cfg)?)
    };
    tracing::debug!("using {}", store.describe());

    let mut options = RunOptions::new(&cfg.collection);
    options.reset = cli.reset;

    let format = cli.format;
    runner::run(store.as_ref(), &corpus, &options, |report| {
        match format {
            OutputFormat::Text => println!("\n{}", report),
            OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        }
        Ok(())
    })
    .await?;

    if format == OutputFormat::Text {
        println!("\nEvaluation complete. Review the results above for a heuristic analysis.");
    }

    Ok(())
}
