//! Command handlers for inspecting a configuration.
//!
//! These never start the dev server: they validate the configuration,
//! print it in the tool's schema, or show how a request path is routed.

use crate::config::ServerConfig;
use crate::error::AppResult;
use crate::routing::Route;
use crate::server::log_plan;
use clap::Subcommand;
use tracing::info;

/// Configuration inspection commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate the configuration and log a summary
    Check,

    /// Print the configuration as JSON in the dev server's schema
    Show,

    /// Show where a request path would be sent
    Route {
        /// Request path and optional query, e.g. /api/user?id=1
        path: String,
    },
}

/// Run an inspection command against an already validated configuration.
pub fn run(config: &ServerConfig, command: ConfigCommands) -> AppResult<()> {
    match command {
        ConfigCommands::Check => check(config),
        ConfigCommands::Show => show(config),
        ConfigCommands::Route { path } => {
            for line in format_route(&config.route(&path)) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

fn check(config: &ServerConfig) -> AppResult<()> {
    log_plan(config);
    info!(
        "Configuration OK ({} proxy rule(s))",
        config.proxy_rules().len()
    );
    Ok(())
}

fn show(config: &ServerConfig) -> AppResult<()> {
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

/// Human-readable lines describing a routing decision.
pub fn format_route(route: &Route) -> Vec<String> {
    match route {
        Route::Fallthrough => vec!["fallthrough".to_string()],
        Route::Forward(plan) => {
            let mut lines = vec![
                format!("forward {}", plan.url),
                format!("  rule: {}", plan.match_prefix),
            ];
            if let Some(host) = &plan.host_header {
                lines.push(format!("  Host: {}", host));
            }
            if let Some(origin) = &plan.origin_header {
                lines.push(format!("  Origin: {}", origin));
            }
            lines
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_forward() {
        let config = ServerConfig::from_defaults().unwrap();
        let lines = format_route(&config.route("/api/user"));

        assert_eq!(
            lines,
            vec![
                "forward http://localhost:8001/api/user",
                "  rule: /api",
                "  Host: localhost:8001",
                "  Origin: http://localhost:8001",
            ]
        );
    }

    #[test]
    fn test_format_fallthrough() {
        let config = ServerConfig::from_defaults().unwrap();
        assert_eq!(format_route(&config.route("/home")), vec!["fallthrough"]);
    }
}
