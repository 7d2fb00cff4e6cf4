//! # SWAPI Proxy CLI (`swapi`)
//!
//! ## Usage
//!
//! ```bash
//! swapi --config ./config/swapi.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `swapi init` | Create the SQLite database and run schema migrations |
//! | `swapi serve` | Start the HTTP server and the metrics scheduler |
//! | `swapi search <type> "<query>"` | Search people or films |
//! | `swapi person <id>` | Person details with film titles |
//! | `swapi film <id>` | Film details with character names |
//! | `swapi metrics` | Print the current metrics snapshot |
//!
//! Log verbosity follows `RUST_LOG` (default `swapi_proxy=info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swapi_proxy::config;
use swapi_proxy::context::AppContext;
use swapi_proxy::migrate;
use swapi_proxy::search::{self, SearchParams};
use swapi_proxy::server;

/// SWAPI Proxy CLI: search, detail and metrics over the Star Wars API.
#[derive(Parser)]
#[command(
    name = "swapi",
    about = "SWAPI Proxy — a caching search-and-detail proxy for the Star Wars API",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Falls back to built-in defaults when the file does not exist.
    #[arg(long, global = true, default_value = "./config/swapi.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server.
    Serve,

    /// Search people or films by name.
    Search {
        /// `people` or `films`.
        search_type: String,

        /// Search text (1–100 characters).
        query: String,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Show a person with resolved film titles.
    Person { id: String },

    /// Show a film with resolved character names.
    Film { id: String },

    /// Show the metrics snapshot.
    Metrics {
        /// Recompute before printing instead of reading the stored snapshot.
        #[arg(long)]
        recompute: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swapi_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(AppContext::open(&cfg).await?).await?;
        }
        Commands::Search {
            search_type,
            query,
            page,
            per_page,
        } => {
            let request = SearchParams {
                search_type: Some(search_type),
                query: Some(query),
                page,
                per_page,
            }
            .validate()?;
            let services = AppContext::open(&cfg).await?.request_services();
            print_json(&search::run_search(&services, &request).await?)?;
        }
        Commands::Person { id } => {
            let id = search::validate_id(&id)?;
            let services = AppContext::open(&cfg).await?.request_services();
            print_json(&services.people.get_details(id).await?)?;
        }
        Commands::Film { id } => {
            let id = search::validate_id(&id)?;
            let services = AppContext::open(&cfg).await?.request_services();
            print_json(&services.films.get_details(id).await?)?;
        }
        Commands::Metrics { recompute } => {
            let ctx = AppContext::open(&cfg).await?;
            if recompute {
                print_json(&ctx.metrics.recompute().await?)?;
            } else {
                print_json(&ctx.metrics.latest().await?)?;
            }
        }
    }

    Ok(())
}
