use clap::{Parser, Subcommand};
use devproxy::commands::{self, ConfigCommands};
use devproxy::config::{self, ServerConfig};
use devproxy::error::AppResult;
use devproxy::host::ProcessHost;
use devproxy::server;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// devproxy - Development server proxy configuration
#[derive(Parser, Debug)]
#[command(name = "devproxy")]
#[command(version = "1.0.0")]
#[command(about = "Validated dev server proxy configuration", long_about = None)]
struct Cli {
    /// JSON config file in the dev server's schema (defaults are used if omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the dev server with the validated configuration
    Serve {
        /// Host to bind to (overrides DEV_SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides DEV_SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,

        /// Where to write the rendered config for the dev server
        #[arg(long)]
        config_out: Option<PathBuf>,

        /// Dev server command and its arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    #[command(flatten)]
    Inspect(ConfigCommands),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        )
        .init();

    // Load configuration
    let mut raw = config::load_raw(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            config_out,
            command,
        } => {
            // Override config with CLI args if provided
            if let Some(host) = host {
                raw.host = host;
            }
            if let Some(port) = port {
                raw.port = i64::from(port);
            }
            let (program, args) = command.split_first().map_or_else(
                || (String::new(), Vec::new()),
                |(program, args)| (program.clone(), args.to_vec()),
            );
            let mut dev_server = ProcessHost::new(program, args);
            if let Some(path) = config_out {
                dev_server = dev_server.with_config_path(path);
            }

            server::serve(raw, &dev_server).await
        }
        Commands::Inspect(command) => {
            let config = ServerConfig::try_from(raw)?;
            commands::run(&config, command)
        }
    }
}
