//! CloudDrive logging & observability
//!
//! Structured logging to console and a rolling JSON file, log retention,
//! crash reports on panic and a debug-build deadlock detector.

mod panic_hook;
mod logging;

pub use panic_hook::init_panic_hook;
pub use logging::{init_logging, cleanup_old_logs, cleanup_logs_in, LogGuard};

use std::path::PathBuf;
use directories::ProjectDirs;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "CloudDrive", "CloudDrive")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize all observability features.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process.
pub fn init() -> anyhow::Result<LogGuard> {
    let guard = init_logging()?;
    init_panic_hook();

    #[cfg(debug_assertions)]
    init_deadlock_detector();

    Ok(guard)
}

#[cfg(debug_assertions)]
fn init_deadlock_detector() {
    use std::thread;
    use std::time::Duration;

    thread::spawn(|| {
        loop {
            thread::sleep(Duration::from_secs(10));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                tracing::error!("Deadlock detected!");
                for (i, threads) in deadlocks.iter().enumerate() {
                    tracing::error!("Deadlock #{}", i);
                    for t in threads {
                        tracing::error!("Thread Id {:#?}", t.thread_id());
                        tracing::error!("{:#?}", t.backtrace());
                    }
                }
            }
        }
    });
}
