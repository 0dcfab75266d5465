use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use bincache_core::cache::BinaryCache;
use bincache_core::services::adb::AdbBridge;
use bincache_core::services::builder::{BinaryCacheBuilder, BuildReport};
use bincache_core::services::report_sample::ReportSampleReader;
use clap::Args;
use log::info;

use crate::commands::util::{make_inspector, resolve_config, CommonArgs};

/// Default trace location when `-i` is not given.
pub const DEFAULT_PERF_DATA: &str = "perf.data";

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Profiling record (or report-sample text) to scan. Defaults to `perf.data`.
    #[arg(short = 'i', long = "perf-data-path")]
    pub perf_data_path: Option<PathBuf>,

    /// Local directories searched for unstripped copies. Repeatable.
    #[arg(short = 'l', long = "lib", num_args = 1..)]
    pub lib_dirs: Vec<PathBuf>,

    /// Never run `adb root`, even on debuggable builds.
    #[arg(long, default_value_t = false)]
    pub disable_adb_root: bool,

    /// Explicit adb executable.
    #[arg(long)]
    pub adb: Option<PathBuf>,

    /// Explicit simpleperf executable for binary record files.
    #[arg(long)]
    pub simpleperf: Option<PathBuf>,

    /// Emit the build report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Build (or refresh) a binary cache for one trace.
pub fn build_cache_command(args: &BuildArgs) -> Result<BuildReport> {
    let mut config = resolve_config(&args.common)?;
    config.search_dirs.extend(args.lib_dirs.iter().cloned());
    if args.disable_adb_root {
        config.disable_adb_root = true;
    }
    if let Some(adb) = &args.adb {
        config.adb_path = Some(adb.clone());
    }
    if let Some(simpleperf) = &args.simpleperf {
        config.simpleperf_path = Some(simpleperf.clone());
    }

    let trace_path =
        args.perf_data_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_PERF_DATA));
    if !trace_path.is_file() {
        return Err(anyhow!("Trace file does not exist: {}", trace_path.display()));
    }

    let inspector = make_inspector(&config)?;
    let device = AdbBridge::locate(config.adb_path.as_deref(), !config.disable_adb_root);
    let mut reader = ReportSampleReader::new(config.simpleperf_path.clone());
    let cache = BinaryCache::new(&config.cache_dir);
    info!("building {} with {} inspector", cache.root().display(), inspector.name());

    let mut builder = BinaryCacheBuilder::new(inspector.as_ref(), &device, cache);
    let report = builder
        .build(&mut reader, &trace_path, &config.search_dirs)
        .with_context(|| format!("Failed to build binary cache for {}", trace_path.display()))?;

    if args.json {
        let serialized = serde_json::to_string_pretty(&report)
            .context("Failed to serialize build report to JSON")?;
        println!("{}", serialized);
    } else {
        print_build_summary(&report);
    }
    Ok(report)
}

fn print_build_summary(report: &BuildReport) {
    println!("binary-cache-builder v{}", bincache_core::version());
    println!("Binary cache: {}", report.cache_dir);
    println!("  Trace: {}", report.trace_path);
    println!("  Binaries used: {}", report.binaries.len());
    for source in &report.sources {
        println!(
            "  [{}] collected={} reused={} failed={}{}",
            source.source,
            source.collected.len(),
            source.reused.len(),
            source.failed.len(),
            if source.kernel_symbols { " kallsyms" } else { "" }
        );
    }
    println!("  Indexed: {}", report.index_entries);
}
