//! Gallery viewer logging and crash reporting
//!
//! Console plus daily-rolling JSON file logs, and crash reports in the same directory.

mod logging;
mod panic_hook;

pub use logging::{cleanup_old_logs, init_logging, LogGuard};
pub use panic_hook::init_panic_hook;

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "GalleryViewer", "GalleryViewer")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize logging and the panic hook. Keep the returned guard alive
/// for as long as file logging should be flushed.
pub fn init(level: &str, to_file: bool) -> anyhow::Result<LogGuard> {
    let dir = log_dir();
    let guard = init_logging(level, to_file.then_some(dir.as_path()))?;
    init_panic_hook(dir);
    Ok(guard)
}
