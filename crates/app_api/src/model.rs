//! Remote resource model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node type on the remote disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Dir,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(EntryKind::File),
            "dir" => Ok(EntryKind::Dir),
            other => Err(format!("unknown entry kind: {}", other)),
        }
    }
}

/// One remote file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Stable key for cache, publish and delete
    pub path: String,
    pub size: Option<u64>,
    /// ISO-8601 creation timestamp as sent by the server
    pub created: String,
    pub kind: EntryKind,
    pub media_type: Option<String>,
    pub mime_type: Option<String>,
    pub file_url: Option<String>,
    pub preview_url: Option<String>,
    pub public_url: Option<String>,
}

/// How a downloaded file should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Pdf,
    Document,
    Other,
}

impl FileEntry {
    /// Minimal entry, mostly for tests and fixtures
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size: None,
            created: String::new(),
            kind,
            media_type: None,
            mime_type: None,
            file_url: None,
            preview_url: None,
            public_url: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// Directories never carry content URLs
    pub fn normalized(mut self) -> Self {
        if self.is_dir() {
            self.file_url = None;
            self.preview_url = None;
        }
        self
    }

    /// Entry for the same node after a move; the original is left untouched
    pub fn renamed(&self, new_path: &str, created: Option<&str>) -> Self {
        let mut entry = self.clone();
        entry.path = new_path.to_string();
        entry.name = file_name(new_path).to_string();
        if let Some(created) = created {
            entry.created = created.to_string();
        }
        entry
    }

    /// Lowercased extension of the entry name
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    pub fn preview_kind(&self) -> PreviewKind {
        match self.extension().as_deref() {
            Some("jpg" | "jpeg" | "png" | "gif") => PreviewKind::Image,
            Some("pdf") => PreviewKind::Pdf,
            Some("doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt") => PreviewKind::Document,
            _ => PreviewKind::Other,
        }
    }
}

/// Last component of a remote path (`disk:/a/b.txt` -> `b.txt`)
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("disk:").unwrap_or(trimmed);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Parent of a remote path, keeping the `disk:` scheme
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) if trimmed[..idx].ends_with(':') => &trimmed[..=idx],
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None => "",
    }
}

/// Named listing screen, also the cache partition key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "all_files")]
    AllFiles,
    #[serde(rename = "published_files")]
    Published,
    #[serde(rename = "last_uploaded")]
    LastUploaded,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::AllFiles, Bucket::Published, Bucket::LastUploaded];

    pub fn cache_key(self) -> &'static str {
        match self {
            Bucket::AllFiles => "all_files",
            Bucket::Published => "published_files",
            Bucket::LastUploaded => "last_uploaded",
        }
    }

    /// How one page of this bucket is fetched
    pub fn page_request(self) -> PageRequest {
        match self {
            // The root listing ignores `type` and windows over all children
            Bucket::AllFiles => PageRequest::Mixed,
            Bucket::Published => PageRequest::PerKind(&[EntryKind::Dir, EntryKind::File]),
            // The last-uploaded feed only ever contains files
            Bucket::LastUploaded => PageRequest::PerKind(&[EntryKind::File]),
        }
    }
}

/// Shape of the requests behind one bucket page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// One request whose window holds both kinds
    Mixed,
    /// One request per kind, dirs first, each with its own window
    PerKind(&'static [EntryKind]),
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_key())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all_files" | "all-files" | "files" => Ok(Bucket::AllFiles),
            "published_files" | "published" => Ok(Bucket::Published),
            "last_uploaded" | "last-uploaded" | "last" => Ok(Bucket::LastUploaded),
            other => Err(format!("unknown bucket: {}", other)),
        }
    }
}

/// Options sent with a publish request
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishSettings {
    #[serde(skip)]
    pub allow_address_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Unix timestamp after which the link stops working
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_until: Option<i64>,
}

/// Disk quota as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total_space: u64,
    pub used_space: u64,
    #[serde(default)]
    pub trash_size: u64,
}

impl DiskInfo {
    pub fn free_space(&self) -> u64 {
        self.total_space.saturating_sub(self.used_space)
    }

    /// Used share of the quota in `0.0..=1.0`
    pub fn used_fraction(&self) -> f64 {
        if self.total_space == 0 {
            return 0.0;
        }
        (self.used_space as f64 / self.total_space as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_drops_content_urls() {
        let mut dir = FileEntry::new("Photos", "disk:/Photos", EntryKind::Dir);
        dir.file_url = Some("https://example/file".into());
        dir.preview_url = Some("https://example/preview".into());
        let dir = dir.normalized();
        assert!(dir.file_url.is_none());
        assert!(dir.preview_url.is_none());

        let mut file = FileEntry::new("a.png", "disk:/a.png", EntryKind::File);
        file.file_url = Some("https://example/file".into());
        assert!(file.normalized().file_url.is_some());
    }

    #[test]
    fn test_renamed_keeps_original() {
        let mut original = FileEntry::new("old.txt", "disk:/docs/old.txt", EntryKind::File);
        original.size = Some(42);
        original.created = "2024-01-01T10:00:00+00:00".into();

        let renamed = original.renamed("disk:/docs/new.txt", Some("2024-02-02T10:00:00+00:00"));
        assert_eq!(renamed.name, "new.txt");
        assert_eq!(renamed.path, "disk:/docs/new.txt");
        assert_eq!(renamed.created, "2024-02-02T10:00:00+00:00");
        assert_eq!(renamed.size, Some(42));
        assert_eq!(original.name, "old.txt");
    }

    #[test]
    fn test_paths() {
        assert_eq!(file_name("disk:/docs/report.pdf"), "report.pdf");
        assert_eq!(file_name("disk:/Photos/"), "Photos");
        assert_eq!(parent_path("disk:/docs/report.pdf"), "disk:/docs");
        assert_eq!(parent_path("disk:/report.pdf"), "disk:/");
        assert_eq!(parent_path("/a/b"), "/a");
    }

    #[test]
    fn test_preview_kind() {
        let kind = |name: &str| FileEntry::new(name, format!("disk:/{}", name), EntryKind::File).preview_kind();
        assert_eq!(kind("IMG_001.JPG"), PreviewKind::Image);
        assert_eq!(kind("book.pdf"), PreviewKind::Pdf);
        assert_eq!(kind("table.xlsx"), PreviewKind::Document);
        assert_eq!(kind("archive.zip"), PreviewKind::Other);
        assert_eq!(kind(".bashrc"), PreviewKind::Other);
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!("published".parse::<Bucket>().unwrap(), Bucket::Published);
        assert_eq!("Last-Uploaded".parse::<Bucket>().unwrap(), Bucket::LastUploaded);
        assert!("all".parse::<Bucket>().is_err());
        assert_eq!(Bucket::LastUploaded.page_request(), PageRequest::PerKind(&[EntryKind::File]));
        assert_eq!(Bucket::AllFiles.page_request(), PageRequest::Mixed);
    }

    #[test]
    fn test_disk_info() {
        let info = DiskInfo { total_space: 100, used_space: 25, trash_size: 0 };
        assert_eq!(info.free_space(), 75);
        assert!((info.used_fraction() - 0.25).abs() < f64::EPSILON);
        let empty = DiskInfo { total_space: 0, used_space: 0, trash_size: 0 };
        assert_eq!(empty.used_fraction(), 0.0);
    }
}
