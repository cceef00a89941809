//! Logging setup for the krkrtools binary
//!
//! Library crates only use the `log` facade; this module installs
//! `env_logger` behind it.
//!
//! # Log Levels
//!
//! - `warn!` - problems with the environment (config, files)
//! - `info!` - one line per command
//! - `debug!` - pipeline phases with counts (preprocess, parse)
//! - `trace!` - per-directive and per-recovery details
//!
//! # Environment Variable
//!
//! ```bash
//! RUST_LOG=debug krkrtools check main.tjs
//! RUST_LOG=parser::tjs_parser=trace krkrtools check main.tjs
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging at Warn level.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level; later calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {}:{} - {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize from `RUST_LOG`, defaulting to warn.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Test-friendly logger; safe to call from every test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
    }

    #[test]
    fn test_pipeline_logs_do_not_panic() {
        init_test();
        let analysis = parser::parse_document("log.tjs", "@set(A=1)\nvar a;", &parser::DefineList::new());
        assert!(analysis.diagnostics().is_empty());
    }
}
