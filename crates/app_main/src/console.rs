//! Terminal rendering of listing screens

use app_api::FileEntry;
use app_core::{format_created, format_file_size, AppError, ListingView};
use parking_lot::Mutex;

/// Prints each pushed snapshot, skipping rows already printed
#[derive(Default)]
pub struct ConsoleView {
    printed: Mutex<Vec<String>>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, heading: &str, items: &[FileEntry]) {
        let mut printed = self.printed.lock();

        // A snapshot that does not extend what is on screen is a fresh listing
        let extends = items.len() >= printed.len()
            && items.iter().zip(printed.iter()).all(|(item, path)| item.path == *path);
        if !extends {
            printed.clear();
            println!("== {} ({} items)", heading, items.len());
        }

        for item in &items[printed.len()..] {
            println!("{}", row(item));
            printed.push(item.path.clone());
        }
    }
}

fn row(entry: &FileEntry) -> String {
    if entry.is_dir() {
        format!("[dir]  {:<40} {}", entry.name, format_created(&entry.created))
    } else {
        format!(
            "       {:<40} {:>12}  {}",
            entry.name,
            format_file_size(entry.size),
            format_created(&entry.created)
        )
    }
}

impl ListingView for ConsoleView {
    fn show_loading(&self) {
        tracing::debug!("Loading...");
    }

    fn hide_loading(&self) {
        tracing::debug!("Loading done");
    }

    fn show_items(&self, items: &[FileEntry]) {
        self.render("listing", items);
    }

    fn show_folder_items(&self, items: &[FileEntry]) {
        self.render("folder", items);
    }

    fn show_error(&self, error: &AppError) {
        tracing::error!("{}", error);
        eprintln!("error: {}", error.user_message());
    }

    fn show_offline_banner(&self, message: &str) {
        tracing::warn!("{}", message);
        eprintln!("{}", message);
    }
}
