use once_cell::sync::OnceCell;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "logs/freelook.log";

/// Splits a log path into the rolling appender's directory and file prefix.
pub fn log_file_parts(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file = path.file_name().unwrap_or(std::ffi::OsStr::new("freelook.log"));
    (dir.to_path_buf(), PathBuf::from(file))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Console plus daily-rolling file logging. `RUST_LOG` filters,
/// `RUST_LOG_FILE` moves the file. Safe to call more than once.
pub fn init() {
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    let log_path = env::var("RUST_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (dir, file) = log_file_parts(Path::new(&log_path));
    let (nb_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file));

    let file_layer = fmt::layer()
        .with_writer(nb_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();
    if !installed {
        return;
    }
    let _ = FILE_GUARD.set(guard);

    std::panic::set_hook(Box::new(|info| {
        let mut msg = String::new();
        if let Some(loc) = info.location() {
            msg.push_str(&format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()));
        }
        if let Some(s) = info.payload().downcast_ref::<&str>() { msg.push_str(s); }
        else if let Some(s) = info.payload().downcast_ref::<String>() { msg.push_str(s); }
        else { msg.push_str("<non-string panic>"); }
        let bt = std::backtrace::Backtrace::force_capture();
        tracing::error!("{}\nBacktrace:\n{:?}", msg, bt);
    }));
    tracing::info!(log_file = %log_path, "logging initialised");
}
