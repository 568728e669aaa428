//! CLI administration tool for rZer0.
//!
//! Inspects and maintains the shared rate limit counters without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Check counter store connection
//! cargo run --bin admin -- store ping
//!
//! # Show the resolved policy table
//! cargo run --bin admin -- policies
//!
//! # Show a client's current window without counting a request
//! cargo run --bin admin -- inspect --scope api:default --ip 203.0.113.9
//!
//! # Delete every counter under the key prefix
//! cargo run --bin admin -- flush
//! ```
//!
//! # Environment Variables
//!
//! Reads the same variables as the server. `REDIS_URL` (or `REDIS_HOST`) is
//! required for store commands, since in-memory counters live inside the
//! server process.

use rzero::application::services::RateLimiter;
use rzero::config::{self, Config, mask_connection_string};
use rzero::domain::policy::Scope;
use rzero::domain::store::CounterStore;
use rzero::infrastructure::store::RedisCounterStore;
use rzero::server::build_state;

use anyhow::{Context, Result};
use axum::http::HeaderMap;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::net::IpAddr;
use std::sync::Arc;

/// CLI tool for managing rZer0 rate limit counters.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Counter store operations
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Show the resolved rate limit policies
    Policies,

    /// Show a client's current window without counting a request
    Inspect {
        /// Rate limit scope (e.g. "api:default")
        #[arg(short, long, default_value = Scope::DEFAULT)]
        scope: String,

        /// Client IP address as the server would resolve it
        #[arg(short, long)]
        ip: IpAddr,
    },

    /// Delete every counter under the configured key prefix
    Flush {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Counter store subcommands.
#[derive(Subcommand)]
enum StoreAction {
    /// Check counter store connection
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Store { action } => handle_store_action(action, &config).await?,
        Commands::Policies => show_policies(&config)?,
        Commands::Inspect { scope, ip } => inspect(&config, Scope::new(scope), ip).await?,
        Commands::Flush { yes } => flush(&config, yes).await?,
    }

    Ok(())
}

/// Connects to the shared counter store.
async fn connect(config: &Config) -> Result<Arc<dyn CounterStore>> {
    let redis_url = config
        .redis_url
        .as_deref()
        .context("REDIS_URL must be set; in-memory counters are not reachable from outside the server")?;

    let store = RedisCounterStore::connect(redis_url)
        .await
        .with_context(|| format!("Failed to connect to {}", mask_connection_string(redis_url)))?;

    Ok(Arc::new(store))
}

async fn limiter(config: &Config) -> Result<Arc<RateLimiter>> {
    let store = connect(config).await?;
    Ok(build_state(config, store)?.limiter)
}

/// Handles counter store diagnostic commands.
async fn handle_store_action(action: StoreAction, config: &Config) -> Result<()> {
    match action {
        StoreAction::Ping => {
            println!("{}", "🔍 Checking counter store connection...".bright_blue());

            let store = connect(config).await?;
            if !store.health_check().await {
                anyhow::bail!("Counter store did not answer PING");
            }

            println!("{}", "✅ Counter store connection OK".green().bold());
        }
    }

    Ok(())
}

/// Prints the default policy and every scope override.
///
/// # Output Format
///
/// ```text
/// 📋 Rate Limit Policies
///
///   Scope                          Policy
///   ──────────────────────────────────────────────
///   (default)                      100/60s
///   api:auth                       5/60s
/// ```
fn show_policies(config: &Config) -> Result<()> {
    let table = config.policy_table()?;

    println!("{}", "📋 Rate Limit Policies".bright_blue().bold());
    println!();

    if !config.rate_limit_enabled {
        println!("{}", "  ⚠️  Rate limiting is disabled (RATE_LIMIT_ENABLED=false)".yellow());
        println!();
    }

    println!(
        "  {:<30} {}",
        "Scope".bright_white().bold(),
        "Policy".bright_white().bold()
    );
    println!("  {}", "─".repeat(46).bright_black());
    println!(
        "  {:<30} {}",
        "(default)".bright_black(),
        table.default_policy().to_string().bright_green()
    );

    for (scope, policy) in table.overrides() {
        println!(
            "  {:<30} {}",
            scope.cyan(),
            policy.to_string().bright_green()
        );
    }

    println!();
    println!("  Fail mode: {}", config.fail_mode.to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Shows the window a request from `ip` would currently be judged against.
async fn inspect(config: &Config, scope: Scope, ip: IpAddr) -> Result<()> {
    let limiter = limiter(config).await?;
    let identity = limiter.identify(Some(ip), &HeaderMap::new());

    let inspection = limiter
        .inspect(&scope, &identity)
        .await
        .context("Failed to read counters")?;

    println!("{}", "🔎 Rate Limit Window".bright_blue().bold());
    println!();
    println!("  Key:       {}", inspection.key.as_str().cyan());
    println!("  Policy:    {}", inspection.policy.to_string().bright_white());
    println!(
        "  Current:   {}",
        inspection.estimate.current.to_string().bright_white()
    );
    println!(
        "  Previous:  {}",
        inspection.estimate.previous.to_string().bright_black()
    );
    println!(
        "  Estimate:  {:.2}",
        inspection.estimate.estimated_count
    );
    println!(
        "  Remaining: {}",
        inspection.decision.remaining.to_string().bright_white().bold()
    );
    println!("  Reset in:  {}s", inspection.decision.reset_seconds);

    let status = if inspection.decision.allowed {
        "ALLOWED".green().bold()
    } else {
        "LIMITED".red().bold()
    };
    println!("  Next:      {}", status);
    println!();

    Ok(())
}

/// Deletes every key under the prefix after confirmation.
///
/// # Safety
///
/// - Requires confirmation (default: No) unless `--yes`
/// - Resets every client's quota in every scope at once
async fn flush(config: &Config, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Flush Rate Limit Counters".bright_blue().bold());
    println!();
    println!("  Prefix: {}", config.key_prefix.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete every counter under this prefix?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let store = connect(config).await?;
    let deleted = flush_counters(store.as_ref(), &config.key_prefix).await?;

    println!();
    println!(
        "{} {} keys deleted",
        "✅".green(),
        deleted.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn flush_counters(store: &dyn CounterStore, prefix: &str) -> Result<u64> {
    store
        .flush(prefix)
        .await
        .context("Failed to flush counters")
}
