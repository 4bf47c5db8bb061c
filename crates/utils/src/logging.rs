//! Tracing setup for the chronos binary.
//!
//! Diagnostics default to stderr so report output on stdout stays
//! machine-readable. `CHRONOS_LOG_PATH` diverts them to a file,
//! `CHRONOS_LOG_LEVEL` takes a tracing filter directive, and
//! `CHRONOS_ENABLE_LOG=off` silences everything.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

// The appender's writer thread flushes on guard drop; parking the guard
// in a static keeps it alive until process exit.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn filter_from_env() -> EnvFilter {
    match env::var("CHRONOS_ENABLE_LOG").as_deref() {
        Ok("off") | Ok("0") | Ok("false") => EnvFilter::new("off"),
        _ => EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .with_env_var("CHRONOS_LOG_LEVEL")
            .from_env_lossy(),
    }
}

/// Install the global subscriber.
pub fn init() {
    let filter = filter_from_env();

    match env::var_os("CHRONOS_LOG_PATH") {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let file = path
                .file_name()
                .unwrap_or_else(|| OsStr::new("chronos.log"));

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
            let _ = FILE_GUARD.set(guard);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(false),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .init();
        }
    }
}
