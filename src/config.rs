//! Configuration management for nes-tracer.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (NES_TRACE_FILE, etc.)
//! 2. Project-local config file (`./nes-tracer.toml`)
//! 3. User config file (`~/.config/nes-tracer/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # nes-tracer.toml
//!
//! # Where trace sessions are written
//! trace_file = "/tmp/trace.txt"
//!
//! # Rows kept in memory for the debugger window
//! ring_capacity = 30000
//!
//! [options]
//! show_byte_code = true
//! status_format = "text"
//! condition = "a == $10"
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::trace::{TraceOptions, DEFAULT_CAPACITY};

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// nes-tracer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Path of the trace file written by a logging session.
    pub trace_file: Option<String>,

    /// Number of rows kept in the in-memory history.
    pub ring_capacity: Option<usize>,

    /// Row layout and condition.
    pub options: Option<TraceOptions>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `nes-tracer.toml`
    /// 3. User config `~/.config/nes-tracer/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Trace file path, with fallback to `trace.txt` in the working directory.
    pub fn trace_file(&self) -> String {
        self.trace_file
            .clone()
            .unwrap_or_else(|| "trace.txt".to_string())
    }

    /// History size, with fallback to the default capacity.
    pub fn ring_capacity(&self) -> usize {
        self.ring_capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    /// Trace options, with fallback to the defaults.
    pub fn trace_options(&self) -> TraceOptions {
        self.options.clone().unwrap_or_default()
    }

    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    fn load_local_config() -> Option<Self> {
        let local_path = Path::new("nes-tracer.toml");
        if let Some(config) = Self::load_from_file(local_path) {
            return Some(config);
        }

        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let project_path = Path::new(&manifest_dir).join("nes-tracer.toml");
            if let Some(config) = Self::load_from_file(&project_path) {
                return Some(config);
            }
        }

        None
    }

    /// Load a config file, logging and skipping it if unreadable.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                log::warn!("{:#}", e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.trace_file.is_some() {
            self.trace_file = other.trace_file;
        }
        if other.ring_capacity.is_some() {
            self.ring_capacity = other.ring_capacity;
        }
        if other.options.is_some() {
            self.options = other.options;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NES_TRACE_FILE") {
            log::info!("Using NES_TRACE_FILE from environment: {}", path);
            self.trace_file = Some(path);
        }
        if let Ok(value) = std::env::var("NES_TRACE_CAPACITY") {
            match value.parse() {
                Ok(capacity) => self.ring_capacity = Some(capacity),
                Err(e) => log::warn!("Ignoring NES_TRACE_CAPACITY={:?}: {}", value, e),
            }
        }
        if let Ok(condition) = std::env::var("NES_TRACE_CONDITION") {
            log::info!("Using NES_TRACE_CONDITION from environment: {}", condition);
            let mut options = self.options.take().unwrap_or_default();
            options.condition = condition;
            self.options = Some(options);
        }
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("nes-tracer").join("config.toml"))
    }

    /// Sample config file listing every key.
    #[cfg(test)]
    fn sample_config() -> String {
        r#"# nes-tracer configuration
# Place this file at ~/.config/nes-tracer/config.toml or ./nes-tracer.toml

# Trace file written while logging is on
# trace_file = "trace.txt"

# Rows kept in memory for the debugger's trace window
# ring_capacity = 30000

[options]
show_byte_code = true
indent_code = false
show_registers = true
show_ppu_cycles = true
show_ppu_scanline = true
show_ppu_frames = false
show_cpu_cycles = false
# hexadecimal, text or abbreviated
status_format = "hexadecimal"
use_labels = false
show_extra_info = false
condition = ""
"#
        .to_string()
    }
}
