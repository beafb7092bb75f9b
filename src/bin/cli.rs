//! Pathwise CLI
//!
//! Loads career content through the fallback chain and drives the auth and
//! assistant services from the terminal.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures::future::join_all;
use pathwise::{
    config::{load_config, read_config},
    error::Result,
    filter::ContentFilter,
    loader::Catalog,
    models::{Config, ContentItem, ContentKind, LoadResult},
    services::{AuthService, ChatService, check_health},
    utils::http,
};

/// Pathwise - STEM career guidance client
#[derive(Parser, Debug)]
#[command(name = "pathwise", version, about = "Pathwise career content client")]
struct Cli {
    /// Path to a TOML config file (default: ./pathwise.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load one content kind through the fallback chain
    Load {
        /// careers, resources, practice-problems or interview-prep
        kind: ContentKind,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        career: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Filter locally even when the backend already applied the filters
        #[arg(long)]
        filter_locally: bool,
    },

    /// Ask the career assistant
    Chat {
        message: String,

        /// Extra JSON context passed to the assistant
        #[arg(long)]
        context: Option<String>,
    },

    /// Sign in and store the session
    Login {
        email: String,

        /// Read from stdin when omitted
        #[arg(long, env = "PATHWISE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and store the session
    Signup {
        email: String,

        #[arg(long)]
        name: Option<String>,

        /// Read from stdin when omitted
        #[arg(long, env = "PATHWISE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Validate configuration
    Validate,

    /// Show configuration, backend health and content sources
    Info,
}

/// Initialize logging before the config is read so load warnings surface.
///
/// `RUST_LOG` wins when set. Otherwise the logger accepts everything and
/// the global max level does the filtering, so the configured level can be
/// applied once the config is known.
fn init_logging(verbose: bool) {
    let from_env = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format_timestamp_secs()
        .init();
    if !from_env {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
    }
}

/// Apply `[logging] level` unless `--verbose` or `RUST_LOG` already decided.
fn apply_configured_level(verbose: bool, configured: &str) {
    if verbose || std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some() {
        return;
    }
    match configured_level(configured) {
        Some(level) => log::set_max_level(level),
        None => log::warn!("Unknown logging.level {configured:?}; keeping warn"),
    }
}

fn configured_level(level: &str) -> Option<log::LevelFilter> {
    level.trim().parse().ok()
}

/// Read the config without the implicit validation of `load_config`.
fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = read_config(path)?;
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    println!("✓ Config OK");
    Ok(())
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_items(result: &LoadResult<ContentItem>) {
    for item in &result.items {
        if item.category().is_empty() {
            println!("- {}", item.display_name());
        } else {
            println!("- {} [{}]", item.display_name(), item.category());
        }
    }
    println!(
        "{} items from {}{}",
        result.items.len(),
        result.source,
        if result.partial { " (partial)" } else { "" }
    );
}

async fn run_load(
    config: &Config,
    kind: ContentKind,
    filters: [(&str, Option<String>); 4],
    json: bool,
    filter_locally: bool,
) -> Result<()> {
    let catalog = Catalog::from_config(config)?;
    let query = filters
        .into_iter()
        .fold(catalog.query(kind), |query, (key, value)| match value {
            Some(value) => query.with_filter(key, value),
            None => query,
        });

    let mut result = catalog.load(&query).await;
    // Static assets and defaults never saw the filters.
    if filter_locally || result.is_degraded() {
        let filter = ContentFilter::from_query(&query);
        if !filter.is_empty() {
            result.items = filter.apply_items(result.items);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_items(&result);
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if matches!(cli.command, Command::Validate) {
        return validate_config(cli.config.as_deref());
    }
    let config = load_config(cli.config.as_deref())?;
    apply_configured_level(cli.verbose, &config.logging.level);
    log::debug!("Using backend {}", config.api.base_url);

    match cli.command {
        Command::Load {
            kind,
            category,
            search,
            career,
            limit,
            json,
            filter_locally,
        } => {
            let filters = [
                ("category", category),
                ("search", search),
                ("career", career),
                ("limit", limit.map(|l| l.to_string())),
            ];
            run_load(&config, kind, filters, json, filter_locally).await?;
        }

        Command::Chat { message, context } => {
            let context = context
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()?;
            let chat = ChatService::from_config(&config)?;
            let reply = chat.send(&message, context.as_ref()).await?;

            println!("{}", reply.response);
            if !reply.recommended_careers.is_empty() {
                println!("\nSuggested careers: {}", reply.recommended_careers.join(", "));
            }
            if reply.degraded {
                println!("\n(assistant unavailable; showing an offline answer)");
            }
        }

        Command::Login { email, password } => {
            let auth = AuthService::from_config(&config)?;
            let password = read_password(password)?;
            let session = auth.login(&email, &password).await?;
            println!("Signed in as {}", session.user.display_name());
        }

        Command::Signup {
            email,
            name,
            password,
        } => {
            let auth = AuthService::from_config(&config)?;
            let password = read_password(password)?;
            let session = auth.sign_up(&email, &password, name.as_deref()).await?;
            println!("Welcome, {}!", session.user.display_name());
        }

        Command::Logout => {
            AuthService::from_config(&config)?.logout().await?;
            println!("Signed out");
        }

        Command::Whoami => {
            let auth = AuthService::from_config(&config)?;
            match auth.current_user().await? {
                Some(user) => println!("{} <{}>", user.display_name(), user.email),
                None => {
                    if auth.session().await?.is_some() {
                        println!("Session expired; sign in again");
                    } else {
                        println!("Not signed in");
                    }
                }
            }
        }

        // Handled before the config is loaded.
        Command::Validate => {}

        Command::Info => {
            println!("Backend:      {}", config.api.base_url);
            println!("Static base:  {}", config.api.static_base);
            println!("Timeout:      {} ms", config.api.timeout_ms);
            println!("Session file: {}", config.auth.session_file);
            println!(
                "Auth:         {}",
                if config.auth.provider_url.is_some() {
                    "identity provider + backend fallback"
                } else {
                    "backend"
                }
            );

            let client = http::create_async_client(&config.api)?;
            match check_health(&client, &config.api.base_url, config.api.timeout()).await {
                Ok(health) => println!(
                    "Health:       {}{}",
                    health.status,
                    health
                        .version
                        .map(|v| format!(" (v{v})"))
                        .unwrap_or_default()
                ),
                Err(e) => println!("Health:       unreachable ({e})"),
            }

            let catalog = Catalog::from_config(&config)?;
            let loads = ContentKind::ALL.map(|kind| {
                let query = catalog.query(kind);
                let catalog = &catalog;
                async move { (kind, catalog.load(&query).await) }
            });
            for (kind, result) in join_all(loads).await {
                println!(
                    "{:<13} {:>3} items from {}",
                    format!("{kind}:"),
                    result.items.len(),
                    result.source
                );
            }
        }
    }

    Ok(())
}
