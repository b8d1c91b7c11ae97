//! Application configuration.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. `DUPESCAN_*` environment variables (e.g. `DUPESCAN_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! ```toml
//! io_threads = 8
//! store = "sqlite"
//! output = "json"
//! skip_hidden = true
//! ignore_patterns = ["*.tmp", "node_modules"]
//! ```

use anyhow::Result;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::StoreKind;
use crate::cli::Cli;
use crate::output::OutputFormat;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing thread count.
    pub io_threads: usize,
    /// Catalog backend.
    pub store: StoreKind,
    /// Report format.
    pub output: OutputFormat,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from the scan.
    pub ignore_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            store: StoreKind::Memory,
            output: OutputFormat::Text,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// `path` replaces the default file location. A missing file is fine; a
    /// malformed one is logged and the defaults are used.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let file = path.map(Path::to_path_buf).or_else(|| Self::default_path().ok());

        match Self::figment(file.as_deref()).extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// The provider stack behind [`Config::load`].
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            log::debug!("Reading config from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Apply command-line flags on top of the loaded configuration.
    #[must_use]
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if let Some(store) = cli.store {
            self.store = store;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if cli.skip_hidden {
            self.skip_hidden = true;
        }
        self.ignore_patterns
            .extend(cli.ignore_patterns.iter().cloned());
        self
    }

    /// Default platform-specific configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "dupescan", "dupescan")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
