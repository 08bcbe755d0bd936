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

//! Interactive configuration initialization.

use std::path::PathBuf;

use anyhow::Result;
use inquire::{Confirm, MultiSelect, Select, Text};

use shelf_server::config::{CollectionConfig, RateLimitConfig, StoreConfig};
use shelf_server::{save_config_file, SchemaKind, ShelfServerConfig};

/// Collection selection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionChoice {
    Customers,
    Employees,
    Books,
    Products,
}

impl CollectionChoice {
    const ALL: [CollectionChoice; 4] = [
        CollectionChoice::Customers,
        CollectionChoice::Employees,
        CollectionChoice::Books,
        CollectionChoice::Products,
    ];

    fn name(self) -> &'static str {
        match self {
            CollectionChoice::Customers => "customers",
            CollectionChoice::Employees => "employees",
            CollectionChoice::Books => "books",
            CollectionChoice::Products => "products",
        }
    }

    fn schema(self) -> SchemaKind {
        match self {
            CollectionChoice::Customers => SchemaKind::Customers,
            CollectionChoice::Employees => SchemaKind::Employees,
            CollectionChoice::Books => SchemaKind::Books,
            CollectionChoice::Products => SchemaKind::Products,
        }
    }
}

impl std::fmt::Display for CollectionChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionChoice::Customers => {
                write!(f, "customers - unique email/phone, photo attachments")
            }
            CollectionChoice::Employees => write!(f, "employees - name and salary records"),
            CollectionChoice::Books => write!(f, "books - title/author/publisher records"),
            CollectionChoice::Products => write!(f, "products - in-memory demo collection"),
        }
    }
}

/// Create a configuration file from interactive prompts.
pub fn run_init(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file '{}' already exists. Use --force to overwrite.",
            output.display()
        );
    }

    println!("Shelf Server Configuration");
    println!("--------------------------");

    let host = Text::new("Server host:")
        .with_default("0.0.0.0")
        .with_help_message("IP address to bind to (0.0.0.0 for all interfaces)")
        .prompt()?;

    let port: u16 = Text::new("Server port:")
        .with_default("8080")
        .prompt()?
        .parse()?;

    let log_level = Select::new(
        "Log level:",
        vec!["error", "warn", "info", "debug", "trace"],
    )
    .with_starting_cursor(2)
    .prompt()?
    .to_string();

    let data_dir = Text::new("Data directory:")
        .with_default("./data")
        .with_help_message("Where JSON store files and uploads are kept")
        .prompt()?;

    let selected = MultiSelect::new("Collections to serve:", CollectionChoice::ALL.to_vec())
        .with_all_selected_by_default()
        .prompt()?;

    let api_token = Text::new("Write token (leave empty to keep mutations open):")
        .with_default("")
        .prompt()?;

    let rate_limit = if Confirm::new("Enable per-client rate limiting?")
        .with_default(false)
        .prompt()?
    {
        let max_requests: u32 = Text::new("Requests per window:")
            .with_default("100")
            .prompt()?
            .parse()?;
        let window_secs: u64 = Text::new("Window length (seconds):")
            .with_default("3600")
            .prompt()?
            .parse()?;
        Some(RateLimitConfig {
            max_requests,
            window_secs,
        })
    } else {
        None
    };

    let collections = selected
        .into_iter()
        .map(|choice| {
            let store = match choice {
                CollectionChoice::Products => StoreConfig::Memory { seed: Vec::new() },
                other => StoreConfig::JsonFile {
                    path: PathBuf::from(format!("{data_dir}/{}.json", other.name())),
                },
            };
            CollectionConfig {
                name: choice.name().to_string(),
                schema: choice.schema(),
                store,
            }
        })
        .collect();

    let config = ShelfServerConfig {
        host,
        port,
        log_level,
        api_token: (!api_token.is_empty()).then_some(api_token),
        uploads_dir: PathBuf::from(format!("{data_dir}/uploads")),
        rate_limit,
        collections,
    };
    config.validate()?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_config_file(&config, &output)?;

    println!();
    println!("[OK] Configuration written to {}", output.display());
    println!("Start the server with: shelf-server run --config {}", output.display());

    Ok(())
}
