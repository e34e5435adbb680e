//! A directory of photos and videos standing in for the device gallery

use super::{DeleteOutcome, ItemSource, Page};
use crate::domain::{ItemId, MediaItem, MediaKind, PageCursor};
use crate::error::{Result, TriageError};
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Items per page when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanOrder {
    /// Most recently modified first, like a camera roll
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Options for scanning the directory
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Media kinds to include (None = photos and videos)
    pub kinds: Option<Vec<MediaKind>>,
    /// Include files starting with '.'
    pub show_hidden: bool,
    /// Minimum file size in bytes
    pub min_size: Option<u64>,
    /// Maximum file size in bytes
    pub max_size: Option<u64>,
    pub order: ScanOrder,
}

/// Pages through the media files of one directory and deletes them by moving
/// them to the system trash.
///
/// Requesting the first page rescans the directory. Later continuation tokens
/// are offsets into that scan, so deletions never shift pages still to come.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    options: ScanOptions,
    page_size: usize,
    dry_run: bool,
    listing: Mutex<Vec<PathBuf>>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            options,
            page_size: DEFAULT_PAGE_SIZE,
            dry_run: false,
            listing: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// In dry-run mode deletions are reported as successful but no file is touched
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn rescan(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || scan_directory(&root, &options))
            .await
            .map_err(|e| TriageError::SourceUnavailable(format!("Scan task failed: {}", e)))?
            .map_err(|e| {
                TriageError::SourceUnavailable(format!(
                    "Cannot read {}: {}",
                    self.root.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl ItemSource for DirectorySource {
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<Page> {
        let offset = match cursor {
            None => {
                let paths = self.rescan().await?;
                info!(root = %self.root.display(), files = paths.len(), "directory scanned");
                *self.listing.lock().await = paths;
                0
            }
            Some(token) => token
                .as_str()
                .parse::<usize>()
                .map_err(|_| TriageError::InvalidCursor(token.to_string()))?,
        };

        let (paths, total) = {
            let listing = self.listing.lock().await;
            let start = offset.min(listing.len());
            let end = (offset + self.page_size).min(listing.len());
            (listing[start..end].to_vec(), listing.len())
        };

        let items = tokio::task::spawn_blocking(move || {
            paths
                .iter()
                // Files removed since the scan are skipped
                .filter_map(|path| MediaItem::from_path(path).ok())
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| TriageError::SourceUnavailable(format!("Metadata task failed: {}", e)))?;

        let next = offset + self.page_size;
        let has_more = next < total;
        debug!(offset, returned = items.len(), has_more, "page built");

        Ok(Page {
            items,
            next_cursor: has_more.then(|| PageCursor(next.to_string())),
            has_more,
            total_count: Some(total),
        })
    }

    async fn delete_items(&self, ids: &[ItemId]) -> Result<DeleteOutcome> {
        if self.dry_run {
            info!(count = ids.len(), "dry run, not deleting");
            return Ok(DeleteOutcome::all_deleted(ids));
        }

        let root = self.root.clone();
        let ids = ids.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut outcome = DeleteOutcome::default();
            for id in ids {
                let path = PathBuf::from(id.as_str());
                if !path.starts_with(&root) {
                    warn!(%id, "refusing to delete outside the reviewed directory");
                    outcome.failed_ids.insert(id);
                    continue;
                }
                match trash::delete(&path) {
                    Ok(()) => {
                        outcome.deleted_ids.insert(id);
                    }
                    Err(e) => {
                        warn!(%id, error = %e, "could not move to trash");
                        outcome.failed_ids.insert(id);
                    }
                }
            }
            outcome
        })
        .await
        .map_err(|e| TriageError::SourceUnavailable(format!("Delete task failed: {}", e)))
    }
}

/// Lists the media files directly inside `dir_path`, filtered and ordered
/// according to `options`.
///
/// - Does not recurse into subdirectories
/// - Skips non-media files and, unless requested, hidden files
/// - Skips entries that cannot be read (permission errors, races)
pub fn scan_directory(dir_path: &Path, options: &ScanOptions) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<(PathBuf, SystemTime)> = Vec::new();

    for entry_result in fs::read_dir(dir_path)? {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };

        if !options.show_hidden && file_name.starts_with('.') {
            continue;
        }

        let kind = match path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaKind::from_extension)
        {
            Some(kind) => kind,
            None => continue,
        };

        if let Some(ref kinds) = options.kinds {
            if !kinds.contains(&kind) {
                continue;
            }
        }

        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };

        if !metadata.is_file() {
            continue;
        }

        if let Some(min_size) = options.min_size {
            if metadata.len() < min_size {
                continue;
            }
        }

        if let Some(max_size) = options.max_size {
            if metadata.len() > max_size {
                continue;
            }
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, modified));
    }

    files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    if options.order == ScanOrder::NewestFirst {
        files.reverse();
    }

    Ok(files.into_iter().map(|(path, _)| path).collect())
}
