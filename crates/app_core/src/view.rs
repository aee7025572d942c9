//! Display surface the listing controller reports to

use crate::AppError;
use app_api::FileEntry;

/// Passive view of a listing screen.
///
/// The controller owns all listing state and pushes complete snapshots;
/// implementations only render what they are handed.
pub trait ListingView: Send + Sync {
    /// A fetch for the active context started
    fn show_loading(&self);

    /// No fetch for the active context is in flight any more
    fn hide_loading(&self);

    /// Full accumulated listing of a bucket screen
    fn show_items(&self, items: &[FileEntry]);

    /// Full accumulated listing of an open folder
    fn show_folder_items(&self, items: &[FileEntry]);

    fn show_error(&self, error: &AppError);

    fn show_offline_banner(&self, message: &str);
}
