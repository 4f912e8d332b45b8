// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Portal runtime: configuration, state assembly, and the server lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use portal_api::{ApiServer, AppState, RateLimiter};
use portal_config::{ConfigLoader, Environment, PortalConfig, SecretValue};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BinError, BinResult};
use crate::seed::SeedData;
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// PortalRuntime
// =============================================================================

/// A configured portal ready to serve.
pub struct PortalRuntime {
    config: PortalConfig,
    seed: Option<SeedData>,
    shutdown: ShutdownCoordinator,
}

impl PortalRuntime {
    /// Creates a runtime for a validated configuration.
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            seed: None,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Loads fixtures into the store before serving.
    pub fn with_seed(mut self, seed: SeedData) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Returns a handle that can stop the runtime.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs on the configured address until a shutdown signal arrives.
    pub async fn run(self) -> BinResult<()> {
        let addr = self.config.server.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BinError::bind(addr, e))?;

        let signals = self.shutdown.clone();
        tokio::spawn(async move { signals.wait_for_shutdown().await });

        self.serve(listener).await
    }

    /// Serves on an already bound listener until [`shutdown_handle`](Self::shutdown_handle)
    /// is triggered.
    pub async fn serve(self, listener: TcpListener) -> BinResult<()> {
        info!(
            version = portal_core::VERSION,
            environment = self.config.server.environment.as_str(),
            "Starting portal"
        );

        let state = AppState::builder().config(self.config.clone()).build()?;

        if let Some(seed) = &self.seed {
            seed.apply(&state.accounts).await?;
        }

        self.log_startup(&state);
        spawn_rate_limit_purge(state.rate_limiter.clone(), &self.shutdown);

        let server = ApiServer::new(state);
        let result = server
            .serve(listener, self.shutdown.shutdown_signal().wait())
            .await;

        // Stop background tasks even when the server failed.
        self.shutdown.initiate_shutdown();
        info!("Portal shutdown complete");

        result.map_err(BinError::from)
    }

    fn log_startup(&self, state: &AppState) {
        for warning in self.config.warnings() {
            warn!("{}", warning);
        }
        info!(
            sso = state.sso.is_some(),
            ai_proxy = self.config.ai.enabled,
            rate_limit = self.config.security.rate_limit.enabled,
            audit_logger = state.audit().name(),
            "Portal components initialized"
        );
    }
}

/// Drops expired rate-limit windows once per window until shutdown.
fn spawn_rate_limit_purge(limiter: Arc<RateLimiter>, shutdown: &ShutdownCoordinator) {
    let period = Duration::from_secs(limiter.window_secs().max(1));
    let stop = shutdown.shutdown_signal();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        let stop = stop.wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => limiter.purge_expired(),
            }
        }
    });
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the portal runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<PortalConfig>,
    seed_path: Option<PathBuf>,
    port: Option<u16>,
    dev_mode: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets a seed file.
    pub fn seed_path(mut self, path: Option<PathBuf>) -> Self {
        self.seed_path = path;
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Enables development mode.
    ///
    /// Development mode runs without a config file, generates a session
    /// secret when none is set, and switches the environment to development.
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Resolves and validates the configuration.
    pub fn resolve_config(&self) -> BinResult<PortalConfig> {
        let mut config = match (&self.config, &self.config_path) {
            (Some(config), _) => config.clone(),
            (None, Some(path)) if path.exists() => ConfigLoader::new()
                .load_unvalidated(path)
                .map_err(|e| BinError::from(e).with_context(format!("Failed to load {}", path.display())))?,
            (None, Some(path)) if self.dev_mode => {
                warn!(path = %path.display(), "Configuration file not found, using defaults");
                PortalConfig::default()
            }
            (None, Some(path)) => {
                return Err(BinError::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )))
            }
            (None, None) if self.dev_mode => PortalConfig::default(),
            (None, None) => return Err(BinError::config("No configuration provided")),
        };

        if self.dev_mode {
            config.server.environment = Environment::Development;
            if config.security.jwt.secret.is_none() {
                warn!("No session secret configured, generated an ephemeral one");
                config.security.jwt.secret = Some(ephemeral_secret());
            }
        }

        if let Some(port) = self.port {
            config.server.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<PortalRuntime> {
        let config = self.resolve_config()?;
        let runtime = PortalRuntime::new(config);

        Ok(match &self.seed_path {
            Some(path) => runtime.with_seed(SeedData::load(path)?),
            None => runtime,
        })
    }
}

/// Random session secret valid for this process only.
fn ephemeral_secret() -> SecretValue {
    SecretValue::new(format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    ))
}

// =============================================================================
// Tests
// =============================================================================
