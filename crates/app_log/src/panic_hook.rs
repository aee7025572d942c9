//! Panic hook for crash reporting

use backtrace::Backtrace;
use chrono::Local;
use std::panic::PanicHookInfo;

/// Initialize the panic hook for crash reporting
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(panic_handler));
    tracing::debug!("Panic hook initialized");
}

fn panic_handler(info: &PanicHookInfo) {
    let report = crash_report(info);

    eprintln!("{}", report);
    tracing::error!("{}", report);

    let dump_filename = format!(
        "cloud_drive_crash_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let dump_path = std::env::temp_dir().join(&dump_filename);

    if let Err(e) = std::fs::write(&dump_path, &report) {
        eprintln!("Failed to write crash dump: {}", e);
    } else {
        eprintln!("Crash report written to {}", dump_path.display());
    }
}

fn crash_report(info: &PanicHookInfo) -> String {
    let backtrace = Backtrace::new();
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");

    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<unknown>".to_string());

    format!(
        "=== CRITICAL PANIC ===\n\
         Timestamp: {}\n\
         Thread: {}\n\
         Location: {:?}\n\
         Payload: {}\n\n\
         Stack Trace:\n{:?}",
        Local::now().to_rfc3339(),
        thread_name,
        info.location(),
        payload,
        backtrace
    )
}
