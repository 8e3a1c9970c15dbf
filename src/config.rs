//! Server configuration.
//!
//! Read from the YAML file named by `BURROW_CONFIG` when set, otherwise
//! defaults; then `LISTEN` and `FILES_ROOT` override the file.
//!
//! ```yaml
//! server:
//!   listen_addr: 0.0.0.0:4221
//!   max_requests_per_connection: 100
//!   max_header_bytes: 8192
//! files:
//!   root: /srv/files
//! compression:
//!   encodings: [gzip, deflate]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::compression;
use crate::http::connection::SessionLimits;

pub const CONFIG_ENV: &str = "BURROW_CONFIG";
pub const LISTEN_ENV: &str = "LISTEN";
pub const FILES_ROOT_ENV: &str = "FILES_ROOT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub max_requests_per_connection: usize,
    pub max_header_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Encodings to offer, in preference order.
    pub encodings: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            listen_addr: "127.0.0.1:4221".to_string(),
            max_requests_per_connection: limits.max_requests,
            max_header_bytes: limits.max_header_bytes,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            encodings: vec!["gzip".to_string(), "deflate".to_string()],
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading variables through `lookup`.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(addr) = lookup(LISTEN_ENV) {
            cfg.server.listen_addr = addr;
        }
        if let Some(root) = lookup(FILES_ROOT_ENV) {
            cfg.files.root = PathBuf::from(root);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_requests_per_connection == 0 {
            bail!("server.max_requests_per_connection must be at least 1");
        }
        if self.server.max_header_bytes == 0 {
            bail!("server.max_header_bytes must be at least 1");
        }
        for name in &self.compression.encodings {
            if compression::builtin(name).is_none() {
                bail!("unknown compression encoding {name:?}");
            }
        }
        self.files
            .root
            .canonicalize()
            .with_context(|| format!("files.root {} is not accessible", self.files.root.display()))?;
        Ok(())
    }

    pub fn limits(&self) -> SessionLimits {
        SessionLimits {
            max_requests: self.server.max_requests_per_connection,
            max_header_bytes: self.server.max_header_bytes,
        }
    }
}
