//! Display formatting for listing rows

use chrono::DateTime;

/// Format file size for display
pub fn format_file_size(size: Option<u64>) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    let Some(bytes) = size else {
        return "Unknown size".to_string();
    };

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    }
}

/// Server timestamp as `dd.mm.yyyy hh:mm`, in the timestamp's own offset
pub fn format_created(created: &str) -> String {
    let parsed = DateTime::parse_from_rfc3339(created)
        .or_else(|_| DateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S%z"));

    match parsed {
        Ok(date) => date.format("%d.%m.%Y %H:%M").to_string(),
        Err(_) => "Unknown date".to_string(),
    }
}
