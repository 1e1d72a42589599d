//! `burr install` command implementation.
//!
//! Resolves one root package against the registry, then downloads and
//! extracts every resolved package into the destination directory.

use std::collections::HashMap;

use burr_config::{ConfigLoader, Settings};
use burr_core::error::BurrResult;
use burr_core::PackageSpec;
use burr_install::{HttpTarballFetcher, InstallReport, Installer, PackageFetcher};
use burr_registry::{ClientConfig, MetadataProvider, RegistryClient, RetryConfig};
use burr_resolver::{ResolveOptions, Session};
use clap::Args;
use tracing::debug;

use super::CommandContext;

/// Arguments of `burr install`
#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Package to install, as `name` or `name@range`
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Destination directory
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,

    /// Registry base URL
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Maximum simultaneous downloads
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Upper bound on resolution passes
    #[arg(long, value_name = "N")]
    pub max_passes: Option<usize>,
}

impl InstallArgs {
    /// Flags as configuration overrides, keyed like the config layer expects
    pub fn cli_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(dir) = &self.dir {
            overrides.insert("dir".to_string(), dir.clone());
        }
        if let Some(registry) = &self.registry {
            overrides.insert("registry".to_string(), registry.clone());
        }
        if let Some(concurrency) = self.concurrency {
            overrides.insert("concurrency".to_string(), concurrency.to_string());
        }
        if let Some(max_passes) = self.max_passes {
            overrides.insert("max-passes".to_string(), max_passes.to_string());
        }
        overrides
    }
}

/// Execute the `burr install` command
pub async fn execute(args: InstallArgs, ctx: &CommandContext) -> BurrResult<()> {
    let spec = PackageSpec::parse(&args.package)?;

    let settings = ConfigLoader::new(ctx.cwd.clone())
        .load(args.cli_overrides())
        .await?;
    debug!(?settings, "effective settings");

    let client = RegistryClient::with_config(ClientConfig {
        base_url: settings.registry_url.clone(),
        timeout: settings.timeout(),
        retry: RetryConfig {
            max_retries: settings.max_retries,
            ..RetryConfig::default()
        },
    })?;
    let fetcher = HttpTarballFetcher::new(settings.timeout(), settings.upgrade_insecure_urls)?;

    install_package(&spec, client, fetcher, &settings, ctx).await?;
    Ok(())
}

/// Resolve `spec` through `provider` and install the result with `fetcher`
pub async fn install_package<P, F>(
    spec: &PackageSpec,
    provider: P,
    fetcher: F,
    settings: &Settings,
    ctx: &CommandContext,
) -> BurrResult<InstallReport>
where
    P: MetadataProvider,
    F: PackageFetcher,
{
    ctx.output.step("🔍", &format!("Resolving {}", spec));

    let mut session = Session::new(
        provider,
        ResolveOptions {
            max_passes: settings.max_passes,
        },
    );
    let resolution = session.resolve(&spec.name, &spec.range).await?;

    ctx.output.info(&format!(
        "Resolved {} packages in {} pass(es) ({} ms)",
        resolution.packages.len(),
        resolution.passes,
        resolution.resolution_time_ms
    ));
    for package in &resolution.packages {
        debug!("  {}", package);
    }

    ctx.output
        .step("📦", &format!("Installing into {}", settings.install_dir));
    let installer = Installer::new(fetcher, settings.install_dir.as_std_path())
        .with_concurrency(settings.concurrency);
    let report = installer.install(&resolution.packages).await?;

    ctx.output.packages(&report.installed);
    ctx.output.success(&format!(
        "Installed {} packages in {:.2}s",
        report.installed.len(),
        report.elapsed_ms as f64 / 1000.0
    ));

    Ok(report)
}
