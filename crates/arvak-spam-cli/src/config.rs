//! Correction defaults for the CLI.
//!
//! Values are resolved with the following precedence (highest first):
//! 1. Command-line flags
//! 2. Environment variables (`ARVAK_SPAM_METHOD`, `ARVAK_SPAM_TOL`,
//!    `ARVAK_SPAM_MAX_ITERATIONS`)
//! 3. Configuration file (YAML, `--config` or `~/.arvak/spam.yaml`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use arvak_spam::{CorrectionMethod, CorrectionOptions};

/// Name of the default configuration file inside `~/.arvak/`.
pub const DEFAULT_CONFIG_FILE: &str = "spam.yaml";

/// Correction settings read from file and environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpamConfig {
    /// Correction method.
    #[serde(default)]
    pub method: CorrectionMethod,

    /// Bayesian convergence threshold.
    #[serde(default)]
    pub tol: Option<f64>,

    /// Bayesian iteration cap.
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

impl SpamConfig {
    /// Parse a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: SpamConfig = serde_yaml_ng::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file given on the command line, or the default file if it
    /// exists, then apply environment overrides.
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };
        config.merge_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment variables looked up through `var`.
    pub fn merge_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = var("ARVAK_SPAM_METHOD") {
            self.method = v
                .parse()
                .with_context(|| "Invalid ARVAK_SPAM_METHOD".to_string())?;
        }
        if let Some(v) = var("ARVAK_SPAM_TOL") {
            self.tol = Some(
                v.parse()
                    .with_context(|| format!("Invalid ARVAK_SPAM_TOL: '{v}'"))?,
            );
        }
        if let Some(v) = var("ARVAK_SPAM_MAX_ITERATIONS") {
            self.max_iterations = Some(
                v.parse()
                    .with_context(|| format!("Invalid ARVAK_SPAM_MAX_ITERATIONS: '{v}'"))?,
            );
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(tol) = self.tol {
            if !(tol.is_finite() && tol > 0.0) {
                anyhow::bail!("tol must be a positive number, got {tol}");
            }
        }
        Ok(())
    }

    /// Apply command-line overrides and produce library options.
    pub fn resolve(
        &self,
        method: Option<&str>,
        tol: Option<f64>,
        max_iterations: Option<usize>,
    ) -> Result<(CorrectionMethod, CorrectionOptions)> {
        let method = match method {
            Some(name) => name.parse()?,
            None => self.method,
        };
        let options = CorrectionOptions {
            tol: tol.or(self.tol),
            max_iterations: max_iterations.or(self.max_iterations),
        };
        Ok((method, options))
    }
}

/// `~/.arvak/spam.yaml`, if a home directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".arvak").join(DEFAULT_CONFIG_FILE))
}
