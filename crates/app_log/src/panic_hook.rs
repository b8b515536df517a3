//! Panic hook writing crash reports next to the logs

use backtrace::Backtrace;
use chrono::Local;
use std::any::Any;
use std::panic::PanicHookInfo;
use std::path::PathBuf;

/// Install the hook. Reports go to `crash_dir`, or the temp dir if it cannot be created.
pub fn init_panic_hook(crash_dir: PathBuf) {
    std::panic::set_hook(Box::new(move |info| {
        let report = crash_report(info, &Backtrace::new());
        eprintln!("{}", report);
        tracing::error!("{}", report);

        let dir = match std::fs::create_dir_all(&crash_dir) {
            Ok(()) => crash_dir.clone(),
            Err(_) => std::env::temp_dir(),
        };
        let path = dir.join(format!("crash_{}.txt", Local::now().format("%Y%m%d_%H%M%S")));
        if let Err(e) = std::fs::write(&path, &report) {
            eprintln!("Failed to write crash report {}: {}", path.display(), e);
        }
    }));
    tracing::debug!("Panic hook installed");
}

fn crash_report(info: &PanicHookInfo, backtrace: &Backtrace) -> String {
    let thread = std::thread::current();
    format!(
        "=== gallery_viewer {} crashed ===\n\
         Time: {}\n\
         Thread: {}\n\
         Location: {}\n\
         Message: {}\n\n\
         {:?}",
        env!("CARGO_PKG_VERSION"),
        Local::now().to_rfc3339(),
        thread.name().unwrap_or("<unnamed>"),
        info.location().map(|l| l.to_string()).unwrap_or_else(|| "<unknown>".into()),
        panic_message(info.payload()),
        backtrace
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
