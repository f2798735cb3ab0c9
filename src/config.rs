//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser};

use crate::db::Database;
use crate::models::TaskStatus;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_LOG_FILTER: &str = "taskboard=debug,taskboard_core=debug,tower_http=debug";

/// Settings for `taskboard serve`.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind the HTTP API to
    #[arg(long, env = "TASKBOARD_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port for HTTP API
    #[arg(short, long, env = "TASKBOARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file [default: platform data directory]
    #[arg(long, env = "TASKBOARD_DATABASE")]
    pub database: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            database: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `TASKBOARD_*` environment variables only.
    /// Fails on values `taskboard serve` would also reject.
    pub fn from_env() -> anyhow::Result<Self> {
        #[derive(Parser)]
        struct EnvOnly {
            #[command(flatten)]
            config: ServerConfig,
        }

        let parsed = EnvOnly::try_parse_from(["taskboard"])
            .context("Invalid TASKBOARD_* server environment")?;
        Ok(parsed.config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Database::default_path(),
        }
    }

    /// Open and migrate the configured database.
    pub fn open_database(&self) -> anyhow::Result<Database> {
        let db = Database::open(self.database_path()?)?;
        db.migrate()?;
        Ok(db)
    }
}

/// Value parser for `--status` flags that must name a real status.
pub fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_str(raw).ok_or_else(|| {
        let known: Vec<&str> = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown status '{}', expected one of: {}", raw, known.join(", "))
    })
}
