//! campdash binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! cache, registers the configured tenants, and then either serves the JSON
//! API or runs a single sync from the command line.
//!
//! # Password hash generation
//!
//! ```
//! cargo run -p campdash-server --bin campdash -- hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use campdash_api::AppState;
use campdash_core::window::{DateRange, parse_date};
use campdash_server::{ServerConfig, scheduler};
use campdash_store_sqlite::SqliteStore;
use campdash_sync::{Dashboard, SyncService};
use campdash_upstream::{LeadpierClient, PinpointeClient};
use clap::{Parser, Subcommand};
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

type Service = SyncService<SqliteStore, PinpointeClient, LeadpierClient>;

#[derive(Parser)]
#[command(author, version, about = "Campaign dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,
  /// Sync campaigns and revenue for a date range, then print the report.
  Sync {
    /// First day, `YYYY-MM-DD`. Defaults to today.
    #[arg(long)]
    start: Option<String>,
    /// Last day, `YYYY-MM-DD`. Defaults to `--start`.
    #[arg(long)]
    end:   Option<String>,
  },
  /// Refresh revenue for one day.
  SyncRevenue {
    /// `YYYY-MM-DD`. Defaults to today.
    #[arg(long)]
    date:  Option<String>,
    /// Ignore the revenue cache window.
    #[arg(long)]
    force: bool,
  },
  /// Delete cached data older than the retention window.
  Cleanup {
    /// Overrides `retention_days`.
    #[arg(long)]
    days: Option<u32>,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let command = cli.command.unwrap_or(Command::Serve);

  if let Command::HashPassword = command {
    let password = rpassword_or_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = load_config(&cli.config)?;
  let service = Arc::new(build_service(&server_cfg).await?);

  let registered = service
    .reconcile_tenants()
    .await
    .context("failed to register configured tenants")?;
  tracing::info!(tenants = registered, "configured tenants registered");

  match command {
    Command::Serve => serve(service, &server_cfg).await,
    Command::Sync { start, end } => {
      let start = match start {
        Some(s) => parse_date(&s)?,
        None => service.today(),
      };
      let end = match end {
        Some(e) => parse_date(&e)?,
        None => start,
      };
      let range = DateRange::new(start, end)?;
      let report = service.sync_campaigns(range).await?;
      print_json(&report)?;
      print_json(&service.sync_revenue_range(range, true).await)
    }
    Command::SyncRevenue { date, force } => {
      let date = match date {
        Some(d) => parse_date(&d)?,
        None => service.today(),
      };
      print_json(&service.sync_revenue(date, force).await)
    }
    Command::Cleanup { days } => {
      let counts = service
        .cleanup(days.unwrap_or(server_cfg.retention_days))
        .await?;
      print_json(&counts)
    }
    Command::HashPassword => Ok(()),
  }
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("CAMPDASH")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

async fn build_service(cfg: &ServerConfig) -> anyhow::Result<Service> {
  let settings = cfg.sync_settings()?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mut leadpier = cfg.leadpier();
  leadpier.token_file = leadpier.token_file.as_deref().map(expand_tilde);

  let campaigns = PinpointeClient::new(settings.timezone, cfg.max_concurrent_details)
    .context("failed to build campaign client")?;
  let revenue = LeadpierClient::new(leadpier)
    .await
    .context("failed to build revenue client")?;

  Ok(SyncService::new(Arc::new(store), campaigns, revenue, settings))
}

async fn serve(service: Arc<Service>, cfg: &ServerConfig) -> anyhow::Result<()> {
  if cfg.users.is_empty() {
    tracing::warn!("no users configured; every authenticated route will answer 401");
  }

  tokio::spawn(scheduler::cleanup_loop(
    Arc::clone(&service),
    cfg.cleanup_hour,
    cfg.retention_days,
  ));

  let state = AppState {
    dashboard:      service,
    auth:           Arc::new(cfg.auth()),
    retention_days: cfg.retention_days,
  };
  let app = campdash_api::api_router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Read a password from stdin (no echo).
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/") {
    if let Ok(home) = std::env::var("HOME") {
      return PathBuf::from(home).join(rest);
    }
  }
  path.to_path_buf()
}
