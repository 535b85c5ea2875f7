use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::TimeDelta;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "blivalley", version, about = "Project and work-session tracker")]
pub struct Args {
    /// SQLite database URL or file path.
    #[arg(long, env = "BLIVALLEY_DB_URL", default_value = "sqlite://blivalley.sqlite3")]
    pub db_url: String,

    /// Address the HTTP server binds to.
    #[arg(long, env = "BLIVALLEY_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Secret used to sign bearer tokens. A random one is generated when unset.
    #[arg(long, env = "BLIVALLEY_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Bearer token lifetime in hours.
    #[arg(long, env = "BLIVALLEY_TOKEN_TTL_HOURS", default_value_t = services::DEFAULT_TOKEN_TTL_HOURS)]
    pub token_ttl_hours: i64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Create a demo account with a sample project.
    Seed {
        #[arg(long, default_value = "demo@blivalley.local")]
        email: String,
        #[arg(long, default_value = "demo-password")]
        password: String,
    },
}

impl Args {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Token lifetime from `--token-ttl-hours`.
///
/// # Errors
///
/// Fails for non-positive values and for values too large to represent.
pub fn token_ttl(hours: i64) -> anyhow::Result<TimeDelta> {
    if hours <= 0 {
        bail!("--token-ttl-hours must be positive, got {hours}");
    }
    TimeDelta::try_hours(hours)
        .with_context(|| format!("--token-ttl-hours {hours} is out of range"))
}

/// Turns a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file and its parent directories so the pool can open it.
///
/// # Errors
///
/// Fails for URLs without a file path or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() {
        bail!("database url has no file path: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}
