// Copyright 2026 Book Search Contributors
// SPDX-License-Identifier: MIT

//! book-search — entry point.

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use book_search::{normalize_query, HttpClient, SiteRegistry, SiteSearcher};
use book_search_server::config::{self, ServerConfig};
use book_search_server::fanout::{search_local, FanOutClient, FanOutState};
use book_search_server::{api, render};

#[derive(Parser)]
#[command(
    name = "book-search",
    about = "Search book titles across several novel sites at once",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Output results as JSON (machine-readable).
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP search API.
    Serve {
        /// Listen address (host:port). Also reads BOOK_SEARCH_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// Shared cache lifetime in seconds for search responses; 0 disables.
        /// Also reads BOOK_SEARCH_CACHE_MAX_AGE.
        #[arg(long)]
        cache_max_age: Option<u64>,

        /// Upstream request timeout in milliseconds. Also reads BOOK_SEARCH_TIMEOUT_MS.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// User-Agent sent to upstream sites. Also reads BOOK_SEARCH_USER_AGENT.
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Search every site for a title and print one panel per site.
    Search {
        /// Title (or part of a title) to look for.
        query: String,

        /// Base URL of a running API to fan out through.
        /// Also reads BOOK_SEARCH_SERVER; searches in-process when unset.
        #[arg(long)]
        server: Option<String>,

        /// Upstream request timeout in milliseconds (in-process mode).
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// List the configured sites, with direct search links for a query.
    Sites {
        /// Query to build each site's own search link for.
        #[arg(long)]
        query: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            addr,
            cache_max_age,
            timeout_ms,
            user_agent,
        } => {
            let config = ServerConfig::resolve(
                addr.as_deref(),
                cache_max_age,
                timeout_ms,
                user_agent.as_deref(),
            );
            tracing::info!("book-search v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Sites: {}", SiteRegistry::builtin().len());
            tracing::info!("Cache-Control: {}", config.cache_control());
            api::start(config).await?;
        }

        Commands::Search {
            query,
            server,
            timeout_ms,
        } => {
            if normalize_query(&query).is_empty() {
                bail!("query is empty after removing whitespace");
            }

            let progress = |state: &FanOutState| {
                if state.searching {
                    tracing::debug!("{} site(s) settled", state.results.len());
                }
            };

            let (sites, state) = match config::resolve_server(server.as_deref()) {
                Some(base_url) => {
                    let client = FanOutClient::new(&base_url);
                    let sites = client.site_names().await;
                    let state = client.search_all(&sites, &query, progress).await;
                    (sites, state)
                }
                None => {
                    let client = HttpClient::new(
                        &config::resolve_user_agent(None),
                        config::resolve_timeout_ms(timeout_ms),
                    );
                    let searcher = SiteSearcher::builtin(client);
                    let state = search_local(&searcher, &query, progress).await;
                    (searcher.registry().names(), state)
                }
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print!("{}", render::render_state(&sites, &state));
            }
        }

        Commands::Sites { query } => {
            let registry = SiteRegistry::builtin();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&registry.summaries())?);
            } else {
                for summary in registry.summaries() {
                    println!(
                        "{:>2}  {}  ({:?}, {:?})",
                        summary.index, summary.site, summary.encoding, summary.kind
                    );
                }
                if let Some(query) = query {
                    println!();
                    print!("{}", render::render_links(registry, &query));
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "book-search", &mut std::io::stdout());
        }
    }

    Ok(())
}
