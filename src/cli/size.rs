//! Size command implementation for estimating backup sources.

use crate::config::SettingsStore;
use crate::pattern::ExcludeSet;
use crate::scanner::{DatasizeScanner, SourcesSummary};
use crate::units::{find_best_unit_for_sizes, pretty_bytes};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the size command
#[derive(Args)]
pub struct SizeArgs {
    /// Files or directories to measure
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Exclusion pattern (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Read exclusion patterns from a file, one per line
    #[arg(long)]
    pub exclude_from: Option<PathBuf>,

    /// Skip the default exclusions from the settings file
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Use powers of 1024 (KiB, MiB, ...)
    #[arg(long)]
    pub binary: bool,

    /// Decimal digits to show
    #[arg(short, long)]
    pub precision: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the size command
pub async fn run(args: SizeArgs) -> Result<()> {
    let store = SettingsStore::load_default().context("loading settings")?;
    let settings = store.settings().clone();

    let mut excludes = ExcludeSet::new(args.exclude.iter().cloned());
    if let Some(path) = &args.exclude_from {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        excludes.extend(ExcludeSet::parse(&text).patterns().iter().cloned());
    }
    if !args.no_default_excludes {
        excludes.extend(settings.exclude_defaults.iter().cloned());
    }

    info!(
        "Measuring {} source(s) with {} exclusion(s)",
        args.paths.len(),
        excludes.patterns().len()
    );

    let paths = args.paths.clone();
    let summary = tokio::task::spawn_blocking(move || {
        DatasizeScanner::new(excludes).scan_all(&paths[..])
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let metric = settings.metric_units && !args.binary;
    let precision = args.precision.unwrap_or(settings.size_precision);
    for line in render(&summary, metric, precision, settings.fixed_units) {
        println!("{}", line);
    }
    Ok(())
}

/// Table lines for a summary, one per source plus a total
pub fn render(
    summary: &SourcesSummary,
    metric: bool,
    precision: usize,
    fixed_units: bool,
) -> Vec<String> {
    let fixed_unit = fixed_units.then(|| {
        find_best_unit_for_sizes(
            summary.sources.iter().filter_map(|s| s.size).map(|s| s.bytes),
            metric,
            precision,
        )
    });

    let mut lines = Vec::with_capacity(summary.sources.len() + 1);
    for source in &summary.sources {
        let line = match (&source.size, &source.error) {
            (Some(size), _) => format!(
                "{:>14} {:>8} files  {}",
                pretty_bytes(size.bytes, metric, precision, fixed_unit),
                size.files,
                source.path.display()
            ),
            (None, Some(error)) => format!(
                "{:>14} {:>8}        {} ({})",
                "-",
                "-",
                source.path.display(),
                error
            ),
            (None, None) => format!("{:>14} {:>8}        {}", "-", "-", source.path.display()),
        };
        lines.push(line);
    }
    lines.push(format!(
        "{:>14} {:>8} files  total",
        pretty_bytes(summary.total.bytes, metric, precision, fixed_unit),
        summary.total.files
    ));
    lines
}
