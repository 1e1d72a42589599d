//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use burr_core::error::BurrError;
use burr_install::DEFAULT_CONCURRENCY;
use burr_registry::{DEFAULT_MAX_RETRIES, DEFAULT_REGISTRY, DEFAULT_TIMEOUT};
use burr_resolver::DEFAULT_MAX_PASSES;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::toml::{load_from_file, BurrToml};
use crate::ConfigResult;

/// Project configuration file name, searched for from the working directory upwards
pub const PROJECT_CONFIG_FILE: &str = "burr.toml";

const DEFAULT_INSTALL_DIR: &str = "node_modules";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub registry_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Absolute destination root
    pub install_dir: Utf8PathBuf,
    pub concurrency: usize,
    pub upgrade_insecure_urls: bool,
    pub max_passes: usize,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load every layer and produce validated settings
    pub async fn load(&self, cli_overrides: HashMap<String, String>) -> ConfigResult<Settings> {
        let global_config = self.load_global_config().await?;
        let project_config = self.load_project_config().await?;
        let env_overrides = ConfigLayering::collect_env_overrides();

        let merged = ConfigLayering::merge_configs(
            global_config,
            project_config,
            env_overrides,
            cli_overrides,
        )?;
        Settings::from_config(&merged, &self.cwd)
    }

    /// Load the nearest `burr.toml`, if any
    pub async fn load_project_config(&self) -> ConfigResult<Option<BurrToml>> {
        let path = self.resolve_config_path(PROJECT_CONFIG_FILE)?;
        if path.exists() {
            debug!("Loading project configuration from {}", path);
            Ok(Some(load_from_file(&path).await?))
        } else {
            Ok(None)
        }
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> ConfigResult<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Ok(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Path in the working directory even if it doesn't exist
        Ok(self.cwd.join(filename))
    }

    /// Load global configuration
    pub async fn load_global_config(&self) -> ConfigResult<Option<BurrToml>> {
        let Some(home_dir) = dirs::home_dir() else {
            debug!("No home directory, skipping global configuration");
            return Ok(None);
        };

        let global_config_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| BurrError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })?
            .join(".burr")
            .join("config.toml");

        if global_config_path.exists() {
            debug!("Loading global configuration from {}", global_config_path);
            Ok(Some(load_from_file(&global_config_path).await?))
        } else {
            Ok(None)
        }
    }
}

impl ConfigLayering {
    /// Merge configuration layers, lowest priority first
    pub fn merge_configs(
        global_config: Option<BurrToml>,
        project_config: Option<BurrToml>,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<BurrToml> {
        let mut merged = match (project_config, global_config) {
            (Some(project), Some(global)) => project.layer_over(global),
            (project, global) => project.or(global).unwrap_or_default(),
        };

        // Environment variables
        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        // CLI flags (highest priority)
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut BurrToml,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "BURR_REGISTRY" => config.registry_mut().url = Some(value.clone()),
                "BURR_TIMEOUT_SECS" => {
                    config.registry_mut().timeout_secs = Some(parse_value(key, value)?);
                }
                "BURR_MAX_RETRIES" => {
                    config.registry_mut().max_retries = Some(parse_value(key, value)?);
                }
                "BURR_INSTALL_DIR" => config.install_mut().dir = Some(value.clone()),
                "BURR_CONCURRENCY" => {
                    config.install_mut().concurrency = Some(parse_value(key, value)?);
                }
                "BURR_MAX_PASSES" => {
                    config.resolver_mut().max_passes = Some(parse_value(key, value)?);
                }
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(
        config: &mut BurrToml,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "registry" => config.registry_mut().url = Some(value.clone()),
                "dir" => config.install_mut().dir = Some(value.clone()),
                "concurrency" => {
                    config.install_mut().concurrency = Some(parse_value("--concurrency", value)?);
                }
                "max-passes" => {
                    config.resolver_mut().max_passes = Some(parse_value("--max-passes", value)?);
                }
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("BURR_"))
            .collect()
    }
}

fn parse_value<T>(field: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| BurrError::ConfigValidation {
        field: field.to_string(),
        reason: format!("'{}' is not a valid value: {}", value, e),
    })
}

impl Settings {
    /// Fill defaults, resolve the install dir against `cwd`, and validate
    pub fn from_config(config: &BurrToml, cwd: &Utf8Path) -> ConfigResult<Self> {
        let registry = config.registry.clone().unwrap_or_default();
        let install = config.install.clone().unwrap_or_default();
        let resolver = config.resolver.clone().unwrap_or_default();

        let install_dir = Utf8PathBuf::from(install.dir.as_deref().unwrap_or(DEFAULT_INSTALL_DIR));
        let install_dir = if install_dir.is_absolute() {
            install_dir
        } else {
            cwd.join(install_dir)
        };

        let settings = Self {
            registry_url: registry
                .url
                .unwrap_or_else(|| DEFAULT_REGISTRY.to_string()),
            timeout_secs: registry.timeout_secs.unwrap_or(DEFAULT_TIMEOUT.as_secs()),
            max_retries: registry.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            install_dir,
            concurrency: install.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            upgrade_insecure_urls: install.upgrade_insecure_urls.unwrap_or(true),
            max_passes: resolver.max_passes.unwrap_or(DEFAULT_MAX_PASSES),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.registry_url.trim();
        if url.is_empty() {
            return Err(invalid("registry.url", "must not be empty"));
        }
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(invalid(
                    "registry.url",
                    &format!("unsupported scheme '{}', expected http or https", parsed.scheme()),
                ));
            }
            Err(e) => return Err(invalid("registry.url", &e.to_string())),
        }

        if self.timeout_secs == 0 {
            return Err(invalid("registry.timeout-secs", "must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(invalid("install.concurrency", "must be at least 1"));
        }
        if self.max_passes == 0 {
            return Err(invalid("resolver.max-passes", "must be at least 1"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn invalid(field: &str, reason: &str) -> BurrError {
    BurrError::ConfigValidation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
