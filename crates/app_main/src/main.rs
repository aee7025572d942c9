//! CloudDrive - command line client for a remote disk
//!
//! Main entry point.

mod console;

use anyhow::Result;
use app_api::{Bucket, EntryKind, FileEntry, PublishSettings};
use app_core::{AppConfig, AppState, ListingContext, PaginatedListingController};
use clap::{Parser, Subcommand};
use console::ConsoleView;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "drive", version, about = "Browse and manage files on a remote disk")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a screen: all_files, published_files or last_uploaded
    List {
        bucket: Bucket,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// List the contents of a folder
    Folder {
        path: String,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Publish a file and print its public link
    Publish { path: String },
    /// Remove a public link and reload the published screen
    Unpublish { path: String },
    Rename { path: String, new_name: String },
    Delete {
        path: String,
        /// Skip the trash
        #[arg(long)]
        permanently: bool,
    },
    /// Download into the configured download directory
    Download { path: String },
    /// Download to a temporary file and print where it landed
    Preview { path: String },
    /// Show quota usage
    Disk,
    /// Clear cached listings and the stored token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("CloudDrive starting...");

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Invalid configuration, using defaults: {}", e);
        AppConfig::default()
    });

    let state = AppState::new(config)?;
    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::List { bucket, pages } => {
            let (context, limit) = state.bucket_listing(bucket);
            let controller = controller(state);
            controller.start_listing(context, limit).await;
            load_pages(&controller, pages).await;
        }
        Command::Folder { path, pages } => {
            let limit = state.config.read().listing.page_size.max(1);
            let controller = controller(state);
            controller
                .start_listing(ListingContext::folder(Bucket::AllFiles, path), limit)
                .await;
            load_pages(&controller, pages).await;
        }
        Command::Publish { path } => {
            let url = state.actions.publish(&path, &PublishSettings::default()).await?;
            println!("{}", url);
        }
        Command::Unpublish { path } => {
            let (context, limit) = state.bucket_listing(Bucket::Published);
            let controller = controller(state);
            controller.start_listing(context, limit).await;
            controller.unpublish(&path).await?;
        }
        Command::Rename { path, new_name } => {
            let entry = FileEntry::new(app_api::file_name(&path), path.as_str(), EntryKind::File);
            let renamed = state.actions.rename(&entry, &new_name).await?;
            println!("{}", renamed.path);
        }
        Command::Delete { path, permanently } => {
            state.actions.delete(&path, permanently).await?;
        }
        Command::Download { path } => {
            let local = state.actions.download(&path).await?;
            println!("{}", local.display());
        }
        Command::Preview { path } => {
            let entry = FileEntry::new(app_api::file_name(&path), path.as_str(), EntryKind::File);
            let preview = state.actions.download_for_preview(&entry).await?;
            println!("{} ({:?})", preview.path.display(), preview.kind);
        }
        Command::Disk => {
            let info = state.actions.disk_info().await?;
            println!(
                "{} of {} used ({:.0}%), {} free, {} in trash",
                app_core::format_file_size(Some(info.used_space)),
                app_core::format_file_size(Some(info.total_space)),
                info.used_fraction() * 100.0,
                app_core::format_file_size(Some(info.free_space())),
                app_core::format_file_size(Some(info.trash_size)),
            );
        }
        Command::Logout => {
            state.logout()?;
            println!("Logged out");
        }
    }
    Ok(())
}

fn controller(state: &AppState) -> PaginatedListingController {
    state.listing(Arc::new(ConsoleView::new()))
}

async fn load_pages(controller: &PaginatedListingController, pages: usize) {
    for _ in 1..pages {
        if controller.is_exhausted() {
            break;
        }
        controller.load_next_page().await;
    }
}
