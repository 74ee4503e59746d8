// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Loads the persisted configuration, picks the
// platform bridge and storage backend, and hands out screen controllers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use snaplift_bridge::{PlatformBridge, platform_bridge};
use snaplift_core::AppConfig;
use snaplift_core::error::Result;
use snaplift_storage::{MemoryObjectStore, ObjectStore, open_store};
use tracing::{info, warn};

use super::data_dir;
use crate::controller::ScreenController;

/// Shared application services, provided to the UI through
/// `use_context::<AppServices>()`.
///
/// All fields are Arc-wrapped so the struct clones cheaply into closures.
#[derive(Clone)]
pub struct AppServices {
    bridge: Arc<dyn PlatformBridge>,
    store: Arc<dyn ObjectStore>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services. Call once at app startup.
    pub fn init() -> Result<Self> {
        Self::init_in(data_dir::data_dir())
    }

    /// Initialise with `dir` as the data directory.
    pub fn init_in(dir: PathBuf) -> Result<Self> {
        info!(path = %dir.display(), "initialising app services");

        let config = match load_config(&dir) {
            Some(config) => config,
            None => {
                let config = AppConfig::default();
                if let Err(e) = persist_config(&dir, &config) {
                    warn!(error = %e, "could not write default config");
                }
                config
            }
        };
        config.validate()?;

        let store = open_store(&config.storage, &dir)?;
        let bridge: Arc<dyn PlatformBridge> = Arc::from(platform_bridge(&config, &dir));
        info!(
            platform = bridge.platform_name(),
            backend = store.name(),
            "app services initialised"
        );

        Ok(Self {
            bridge,
            store,
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        })
    }

    /// Default configuration with an in-memory bucket, for when the data
    /// directory or the configured backend is unusable.
    pub fn fallback() -> Self {
        let dir = std::env::temp_dir().join("snaplift");
        let config = AppConfig::default();
        let bridge: Arc<dyn PlatformBridge> = Arc::from(platform_bridge(&config, &dir));
        Self {
            bridge,
            store: Arc::new(MemoryObjectStore::new()),
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    /// A fresh controller for the screen.
    pub fn controller(&self) -> ScreenController {
        ScreenController::new(
            Arc::clone(&self.bridge),
            Arc::clone(&self.store),
            self.config(),
        )
    }

    // -- Config Persistence --------------------------------------------------

    /// Get a clone of the current config.
    pub fn config(&self) -> AppConfig {
        match self.config.lock() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Validate, update, and persist the config. Takes effect for
    /// controllers created afterwards.
    #[allow(dead_code)]
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        match self.config.lock() {
            Ok(mut current) => *current = config.clone(),
            Err(poisoned) => *poisoned.into_inner() = config.clone(),
        }
        persist_config(&self.data_dir, config)
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }
}

// -- Config file persistence -------------------------------------------------

const CONFIG_FILE: &str = "config.json";

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
