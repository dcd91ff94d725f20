//! The external dev server the configuration is handed to.

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::server::shutdown_signal;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{info, warn};

/// Environment variable carrying the path of the rendered config file
pub const CONFIG_PATH_VAR: &str = "DEV_SERVER_CONFIG";

/// A dev server that accepts a configuration and begins serving.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DevServerHost: Send + Sync {
    /// Serve with `config` until the server stops.
    async fn serve(&self, config: &ServerConfig) -> AppResult<()>;
}

/// Runs the dev server as a child process.
///
/// The config is written as JSON in the tool's schema and its location is
/// passed to the child in `DEV_SERVER_CONFIG` alongside `DEV_SERVER_HOST` and
/// `DEV_SERVER_PORT`. Without an explicit path the file is a fresh temp file
/// that is removed when `serve` returns.
#[derive(Debug, Clone)]
pub struct ProcessHost {
    program: String,
    args: Vec<String>,
    config_path: Option<PathBuf>,
}

impl ProcessHost {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Explicit config path, if one was set
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write the rendered config, returning its path and, for a temp file,
    /// the guard that deletes it on drop.
    async fn write_config(
        &self,
        config: &ServerConfig,
    ) -> AppResult<(PathBuf, Option<NamedTempFile>)> {
        let json = config.to_json_pretty()?;

        match &self.config_path {
            Some(path) => {
                tokio::fs::write(path, json).await?;
                Ok((path.clone(), None))
            }
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix("devproxy-")
                    .suffix(".json")
                    .tempfile()?;
                file.write_all(json.as_bytes())?;
                file.flush()?;
                Ok((file.path().to_path_buf(), Some(file)))
            }
        }
    }

    fn command(&self, config: &ServerConfig, config_path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(CONFIG_PATH_VAR, config_path)
            .env("DEV_SERVER_HOST", config.host())
            .env("DEV_SERVER_PORT", config.port().to_string())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl DevServerHost for ProcessHost {
    async fn serve(&self, config: &ServerConfig) -> AppResult<()> {
        let (config_path, _temp_file) = self.write_config(config).await?;
        info!("Wrote dev server config to {}", config_path.display());

        let mut child = self.command(config, &config_path).spawn().map_err(|e| {
            AppError::Internal(format!("Failed to start {}: {}", self.program, e))
        })?;
        info!("Started {} (pid {:?})", self.program, child.id());

        let exited = tokio::select! {
            status = child.wait() => Some(status?),
            _ = shutdown_signal() => None,
        };

        match exited {
            Some(status) if status.success() => {
                info!("Dev server exited");
                Ok(())
            }
            // killed by a signal, e.g. the terminal's Ctrl+C reaching it first
            Some(status) if status.code().is_none() => {
                info!("Dev server stopped by {}", status);
                Ok(())
            }
            Some(status) => {
                warn!("Dev server exited with {}", status);
                Err(AppError::HostExited(status.code().unwrap_or(-1)))
            }
            None => {
                info!("Shutdown signal received, stopping dev server");
                child.kill().await?;
                Ok(())
            }
        }
    }
}
