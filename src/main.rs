// Copyright 2025 The Shelf Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Allow println! in main.rs for CLI user-facing output (validate, init)
#![allow(clippy::print_stdout)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use shelf_server::config::StoreConfig;
use shelf_server::{load_config_file, save_config_file, ShelfServer, ShelfServerConfig};

mod init;

#[derive(Parser)]
#[command(name = "shelf-server")]
#[command(about = "Standalone REST server for schema-validated record collections")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nrustc: ",
    env!("SHELF_RUSTC_VERSION"),
))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config/server.yaml", global = true)]
    config: PathBuf,

    /// Override the server port
    #[arg(short, long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (default if no subcommand specified)
    Run {
        /// Path to the configuration file
        #[arg(short, long, default_value = "config/server.yaml")]
        config: PathBuf,

        /// Override the server port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate a configuration file without starting the server
    Validate {
        /// Path to the configuration file to validate
        #[arg(short, long, default_value = "config/server.yaml")]
        config: PathBuf,

        /// Show resolved configuration with environment variables expanded
        #[arg(long)]
        show_resolved: bool,
    },

    /// Initialize a new configuration file interactively
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "config/server.yaml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { config, port }) => run_server(config, port).await,
        Some(Commands::Validate {
            config,
            show_resolved,
        }) => validate_config(config, show_resolved),
        Some(Commands::Init { output, force }) => init::run_init(output, force),
        None => {
            // Default behavior: run the server
            run_server(cli.config, cli.port).await
        }
    }
}

/// Run the Shelf Server
async fn run_server(config_path: PathBuf, port_override: Option<u16>) -> Result<()> {
    // Load .env from the config directory if present (feeds interpolation)
    let env_file_loaded = match config_path.parent() {
        Some(config_dir) => {
            let env_file = config_dir.join(".env");
            if env_file.exists() {
                match dotenvy::from_path(&env_file) {
                    Ok(_) => true,
                    Err(e) => {
                        eprintln!("Warning: Failed to load .env file: {e}");
                        false
                    }
                }
            } else {
                false
            }
        }
        None => false,
    };

    // Create a default config when the file is missing
    let config = if !config_path.exists() {
        init_logging("info");

        warn!(
            "Config file '{}' not found. Creating default configuration.",
            config_path.display()
        );

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut default_config = ShelfServerConfig::default();
        if let Some(port) = port_override {
            default_config.port = port;
            info!("Using command line port {port} in default configuration");
        }

        save_config_file(&default_config, &config_path)?;
        info!(
            "Default configuration created at: {}",
            config_path.display()
        );
        info!("Please edit the configuration file to adjust collections and stores.");

        default_config
    } else {
        let config = load_config_file(&config_path)?;
        init_logging(&config.log_level);
        config
    };

    info!("Starting Shelf Server");
    if env_file_loaded {
        info!("Loaded environment variables from .env file");
    }
    info!("Config file: {}", config_path.display());

    let final_port = port_override.unwrap_or(config.port);
    info!("Port: {final_port}");

    let server = ShelfServer::new(config_path, Some(final_port))?;
    server.run().await?;

    Ok(())
}

/// Initialize the logger, honoring an explicit RUST_LOG over the config level.
fn init_logging(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Validate a configuration file
fn validate_config(config_path: PathBuf, show_resolved: bool) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[ERROR] Configuration file not found: {}",
            config_path.display()
        );
        std::process::exit(1);
    }

    match load_config_file(&config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid");
            println!();

            println!("Summary:");
            println!("  Collections: {}", config.collections.len());
            for collection in &config.collections {
                let store = match &collection.store {
                    StoreConfig::JsonFile { path } => format!("jsonFile ({})", path.display()),
                    StoreConfig::Memory { seed } => format!("memory ({} seed rows)", seed.len()),
                };
                println!("  - {} [{:?}] -> {store}", collection.name, collection.schema);
            }

            if show_resolved {
                println!();
                println!("Resolved server settings:");
                println!("  Host: {}", config.host);
                println!("  Port: {}", config.port);
                println!("  Log Level: {}", config.log_level);
                println!(
                    "  Write token: {}",
                    if config.api_token.as_deref().is_some_and(|t| !t.is_empty()) {
                        "configured"
                    } else {
                        "none"
                    }
                );
                match &config.rate_limit {
                    Some(limit) => println!(
                        "  Rate limit: {} requests / {}s",
                        limit.max_requests, limit.window_secs
                    ),
                    None => println!("  Rate limit: none"),
                }
            }

            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Configuration is invalid:");
            println!("  {e}");
            std::process::exit(1);
        }
    }
}
