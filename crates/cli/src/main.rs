use anyhow::Result;
use binary_cache_builder::commands::{
    build_cache_command, list_index_command, lookup_build_id_command, rebuild_index_command,
    BuildArgs, CommonArgs,
};
use binary_cache_builder::init_logging;
use clap::{Parser, Subcommand};

/// Collect the binaries a profiling trace references into a local cache.
///
/// This CLI is a thin wrapper around `bincache-core`. All substantive logic
/// lives in the library so it can be tested thoroughly and reused from other
/// frontends.
#[derive(Parser, Debug)]
#[command(
    name = "binary-cache-builder",
    version,
    about = "Build a binary cache for symbolizing profiling traces",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Log filter (e.g. `debug`, `bincache_core=trace`). `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Arguments for the default `build` command.
    #[command(flatten)]
    build: BuildArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect every binary used by a trace into the cache and index it.
    ///
    /// Local library directories are searched first; anything still missing
    /// is pulled from a connected device.
    Build(BuildArgs),

    /// Regenerate `build_id_list` for an existing cache.
    Index {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the cache-relative path recorded for a build-id.
    Lookup {
        /// Build-id to look up (normalized when not found verbatim).
        build_id: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List all entries of `build_id_list`.
    List {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    // Default to the Build command if none is provided.
    match cli.command.unwrap_or(Command::Build(cli.build)) {
        Command::Build(args) => {
            build_cache_command(&args)?;
        }
        Command::Index { common } => {
            rebuild_index_command(&common)?;
        }
        Command::Lookup { build_id, common } => {
            lookup_build_id_command(&common, &build_id)?;
        }
        Command::List { json, common } => {
            list_index_command(&common, json)?;
        }
    }

    Ok(())
}
