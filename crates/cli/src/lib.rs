pub mod commands;

use env_logger::Env;

/// Initialize `env_logger` once.
///
/// `RUST_LOG` wins over `level`; `level` wins over the `info` default. Repeated
/// calls (as in tests) are ignored.
pub fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if std::env::var_os("RUST_LOG").is_none() {
        if let Some(level) = level {
            builder.parse_filters(level);
        }
    }
    let _ = builder.format_timestamp(None).try_init();
}
