//! burr.toml parsing and the file-level configuration model

use burr_core::error::BurrError;
use camino::Utf8Path;
use serde::Deserialize;

use crate::ConfigResult;

/// Contents of one `burr.toml` or `~/.burr/config.toml` file.
///
/// Every key is optional; a missing key falls through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BurrToml {
    pub registry: Option<RegistrySection>,
    pub install: Option<InstallSection>,
    pub resolver: Option<ResolverSection>,
}

/// `[registry]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistrySection {
    /// Base URL of the npm registry
    pub url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Retries for transient metadata failures
    pub max_retries: Option<u32>,
}

/// `[install]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InstallSection {
    /// Destination root, relative paths resolve against the working directory
    pub dir: Option<String>,
    /// Maximum simultaneous package downloads
    pub concurrency: Option<usize>,
    /// Rewrite `http:` tarball URLs to `https:`
    pub upgrade_insecure_urls: Option<bool>,
}

/// `[resolver]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResolverSection {
    /// Upper bound on resolution passes
    pub max_passes: Option<usize>,
}

impl BurrToml {
    /// Layer `self` over `base`: keys set here win, unset keys come from `base`.
    pub fn layer_over(self, base: BurrToml) -> BurrToml {
        BurrToml {
            registry: merge_section(self.registry, base.registry, |top, base| RegistrySection {
                url: top.url.or(base.url),
                timeout_secs: top.timeout_secs.or(base.timeout_secs),
                max_retries: top.max_retries.or(base.max_retries),
            }),
            install: merge_section(self.install, base.install, |top, base| InstallSection {
                dir: top.dir.or(base.dir),
                concurrency: top.concurrency.or(base.concurrency),
                upgrade_insecure_urls: top.upgrade_insecure_urls.or(base.upgrade_insecure_urls),
            }),
            resolver: merge_section(self.resolver, base.resolver, |top, base| ResolverSection {
                max_passes: top.max_passes.or(base.max_passes),
            }),
        }
    }

    /// Mutable access to `[registry]`, created on first use
    pub fn registry_mut(&mut self) -> &mut RegistrySection {
        self.registry.get_or_insert_with(RegistrySection::default)
    }

    /// Mutable access to `[install]`, created on first use
    pub fn install_mut(&mut self) -> &mut InstallSection {
        self.install.get_or_insert_with(InstallSection::default)
    }

    /// Mutable access to `[resolver]`, created on first use
    pub fn resolver_mut(&mut self) -> &mut ResolverSection {
        self.resolver.get_or_insert_with(ResolverSection::default)
    }
}

fn merge_section<T>(top: Option<T>, base: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (top, base) {
        (Some(top), Some(base)) => Some(merge(top, base)),
        (top, base) => top.or(base),
    }
}

/// Parse TOML text into a `BurrToml`
pub fn parse_burr_toml(content: &str) -> ConfigResult<BurrToml> {
    // toml_edit first for syntax errors with positions
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| parse_error(content, e.message(), e.span()))?;

    // Then serde for the typed model
    toml::from_str(content).map_err(|e| parse_error(content, e.message(), e.span()))
}

/// Load and parse a configuration file
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<BurrToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BurrError::io(format!("Failed to read {}", path), e))?;

    parse_burr_toml(&content).map_err(|e| match e {
        BurrError::TomlParse {
            message,
            line,
            column,
        } => BurrError::TomlParse {
            message: format!("{} (in {})", message, path),
            line,
            column,
        },
        other => other,
    })
}

fn parse_error(content: &str, message: &str, span: Option<std::ops::Range<usize>>) -> BurrError {
    let offset = span.map_or(0, |span| span.start);
    let (line, column) = line_column(content, offset);
    BurrError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let prefix = content.get(..offset).unwrap_or(content);
    let line = prefix.matches('\n').count() + 1;
    let column = prefix.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
    (line, column)
}
