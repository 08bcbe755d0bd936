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

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use indexmap::IndexMap;
use log::{error, info};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{self, ApiDoc, ApiToken, RateLimiter};
use crate::collection::CollectionManager;
use crate::config::{load_config_file, ShelfServerConfig, StoreConfig};
use crate::registry::CollectionRegistry;
use crate::store::{CollectionStore, JsonFileStore, MemoryStore};
use crate::uploads::AttachmentStore;

pub struct ShelfServer {
    config: ShelfServerConfig,
    config_file_path: Option<String>,
    port: u16,
}

impl ShelfServer {
    /// Create a new ShelfServer from a configuration file.
    pub fn new(config_path: PathBuf, port_override: Option<u16>) -> Result<Self> {
        let config = load_config_file(&config_path)?;
        let port = port_override.unwrap_or(config.port);

        Ok(Self {
            config,
            config_file_path: Some(config_path.to_string_lossy().to_string()),
            port,
        })
    }

    /// Create a ShelfServer from an in-memory configuration (programmatic
    /// and test use; no config file involved).
    pub fn from_config(config: ShelfServerConfig) -> Result<Self> {
        config.validate()?;
        let port = config.port;
        Ok(Self {
            config,
            config_file_path: None,
            port,
        })
    }

    #[allow(clippy::print_stdout)]
    pub async fn run(self) -> Result<()> {
        println!("Starting Shelf Server");
        if let Some(config_file) = &self.config_file_path {
            println!("  Config file: {config_file}");
        }
        println!("  API Port: {}", self.port);
        println!(
            "  Log level: {}",
            std::env::var("RUST_LOG").unwrap_or_else(|_| self.config.log_level.clone())
        );
        info!("Initializing Shelf Server");

        let registry = build_registry(&self.config).await?;
        if registry.is_empty() {
            return Err(anyhow::anyhow!(
                "No collections configured for this server"
            ));
        }

        let app = build_app(&self.config, registry)?;

        let addr = format!("{}:{}", self.config.host, self.port);
        info!("Starting web API on {addr}");
        info!("API available at http://{addr}/api/");
        info!("Swagger UI available at http://{addr}/api/docs/");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                error!("Web API server error: {e}");
            }
        });

        info!("Shelf Server started successfully on port {}", self.port);

        // Wait for shutdown signal
        tokio::signal::ctrl_c().await?;
        info!("Shutting down Shelf Server");

        Ok(())
    }
}

/// Open every configured collection against its backing store.
pub async fn build_registry(config: &ShelfServerConfig) -> Result<CollectionRegistry> {
    let mut managers: IndexMap<String, Arc<CollectionManager>> = IndexMap::new();

    info!(
        "Loading {} collection(s) from configuration",
        config.collections.len()
    );
    for entry in &config.collections {
        let store: Box<dyn CollectionStore> = match &entry.store {
            StoreConfig::JsonFile { path } => Box::new(JsonFileStore::new(path.clone())),
            StoreConfig::Memory { seed } => Box::new(MemoryStore::seeded(seed.clone())),
        };

        let manager = CollectionManager::open(entry.name.clone(), entry.schema.schema(), store)
            .await
            .with_context(|| format!("failed to load collection '{}'", entry.name))?;

        managers.insert(entry.name.clone(), Arc::new(manager));
    }

    Ok(CollectionRegistry::from_map(managers))
}

/// Assemble the full application router: record API, middleware, Swagger UI,
/// and a permissive CORS layer.
pub fn build_app(config: &ShelfServerConfig, registry: CollectionRegistry) -> Result<Router> {
    let attachments = AttachmentStore::new(config.uploads_dir.clone());
    let api_token = ApiToken::new(config.api_token.clone().filter(|t| !t.is_empty()));
    let rate_limiter = config
        .rate_limit
        .map(|limit| RateLimiter::new(limit.max_requests, Duration::from_secs(limit.window_secs)));

    let router = api::build_router(registry, attachments, api_token, rate_limiter)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    Ok(router)
}
