pub mod decision_engine;
pub mod deletion_batch;
pub mod page_loader;
pub mod review_queue;
pub mod undo_stack;

pub use decision_engine::{
    DecisionEngine, FinishRequest, FinishStart, FinishTicket, UndoResult, DEFAULT_SWIPE_THRESHOLD,
};
pub use deletion_batch::DeletionBatch;
pub use page_loader::{FetchRequest, FetchTicket, PageLoader};
pub use review_queue::{Current, QueueState, ReviewQueue, DEFAULT_PREFETCH_PERCENT};
pub use undo_stack::UndoStack;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Source-assigned identity of a media item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque continuation token handed out by an item source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(pub String);

impl PageCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classifies a file extension, `None` when it is not a media file
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tif" | "tiff" | "heic" | "heif"
            | "avif" | "dng" => Some(MediaKind::Photo),

            "mp4" | "mov" | "m4v" | "mkv" | "avi" | "webm" | "3gp" | "mts" => {
                Some(MediaKind::Video)
            }

            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => f.write_str("photo"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// One photo or video from the library. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: ItemId,
    pub uri: String,
    /// Locally resolved copy of `uri`, when the source has one
    pub local_uri: Option<String>,
    pub kind: MediaKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaItem {
    /// Builds an item from a file on disk. Photo dimensions are read from the
    /// image header; unreadable headers leave them unset.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let kind = MediaKind::from_extension(extension).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a media file: {:?}", path),
            )
        })?;

        let metadata = fs::metadata(path)?;
        let created_at: DateTime<Utc> = metadata.modified()?.into();

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let (width, height) = match kind {
            MediaKind::Photo => match image::image_dimensions(path) {
                Ok((w, h)) => (Some(w), Some(h)),
                Err(_) => (None, None),
            },
            MediaKind::Video => (None, None),
        };

        let local = path.to_string_lossy().to_string();

        Ok(MediaItem {
            id: ItemId(local.clone()),
            uri: format!("file://{}", local),
            local_uri: Some(local),
            kind,
            name,
            created_at,
            size_bytes: metadata.len(),
            width,
            height,
        })
    }

    /// The reference a viewer should load, preferring the local copy
    pub fn display_uri(&self) -> &str {
        self.local_uri.as_deref().unwrap_or(&self.uri)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    Keep,
    Delete,
}

/// A committed decision. The id is captured by value so later list
/// mutation cannot change which item it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub item_index: usize,
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub decision: Decision,
    pub previous_cursor: usize,
}

/// Outcome of a finish call that reached the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub deleted: Vec<ItemId>,
    pub failed: Vec<ItemId>,
}

impl DeletionReport {
    pub fn requested(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Counts derived from the undo stack, so undo un-counts a decision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionStatistics {
    pub loaded: usize,
    pub reviewed: usize,
    pub kept: usize,
    pub marked_for_deletion: usize,
    pub total_count: Option<usize>,
}

/// Three-way classification of a horizontal swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Keep,
    Delete,
    Cancel,
}

impl SwipeOutcome {
    /// `d <= -threshold` deletes, `d >= threshold` keeps, anything else
    /// (including NaN) snaps back
    pub fn classify(displacement: f32, threshold: f32) -> Self {
        let threshold = threshold.abs();
        if displacement <= -threshold {
            SwipeOutcome::Delete
        } else if displacement >= threshold {
            SwipeOutcome::Keep
        } else {
            SwipeOutcome::Cancel
        }
    }

    pub fn decision_kind(self) -> Option<DecisionKind> {
        match self {
            SwipeOutcome::Keep => Some(DecisionKind::Keep),
            SwipeOutcome::Delete => Some(DecisionKind::Delete),
            SwipeOutcome::Cancel => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn item(id: &str) -> MediaItem {
        MediaItem {
            id: ItemId::from(id),
            uri: format!("media://{}", id),
            local_uri: None,
            kind: MediaKind::Photo,
            name: format!("{}.jpg", id),
            created_at: Utc::now(),
            size_bytes: 1024,
            width: Some(4032),
            height: Some(3024),
        }
    }

    pub fn items(count: usize) -> Vec<MediaItem> {
        (0..count).map(|i| item(&format!("IMG_{:04}", i))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod media_kind_tests {
        use super::*;

        #[test]
        fn test_media_kind_photo() {
            assert_eq!(MediaKind::from_extension("jpg"), Some(MediaKind::Photo));
            assert_eq!(MediaKind::from_extension("jpeg"), Some(MediaKind::Photo));
            assert_eq!(MediaKind::from_extension("png"), Some(MediaKind::Photo));
            assert_eq!(MediaKind::from_extension("heic"), Some(MediaKind::Photo));
        }

        #[test]
        fn test_media_kind_video() {
            assert_eq!(MediaKind::from_extension("mp4"), Some(MediaKind::Video));
            assert_eq!(MediaKind::from_extension("mov"), Some(MediaKind::Video));
        }

        #[test]
        fn test_media_kind_case_insensitive() {
            assert_eq!(MediaKind::from_extension("JPG"), Some(MediaKind::Photo));
            assert_eq!(MediaKind::from_extension("MoV"), Some(MediaKind::Video));
        }

        #[test]
        fn test_media_kind_non_media() {
            assert_eq!(MediaKind::from_extension("txt"), None);
            assert_eq!(MediaKind::from_extension("pdf"), None);
            assert_eq!(MediaKind::from_extension(""), None);
        }
    }

    mod media_item_tests {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn test_media_item_from_png() {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("tiny.png");
            image::RgbImage::new(3, 2).save(&path).unwrap();

            let item = MediaItem::from_path(&path).unwrap();

            assert_eq!(item.kind, MediaKind::Photo);
            assert_eq!(item.name, "tiny.png");
            assert_eq!(item.dimensions(), Some((3, 2)));
            assert!(item.size_bytes > 0);
            assert_eq!(item.display_uri(), path.to_string_lossy());
            assert!(item.uri.starts_with("file://"));
        }

        #[test]
        fn test_media_item_unreadable_photo_has_no_dimensions() {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("broken.jpg");
            fs::write(&path, b"not really a jpeg").unwrap();

            let item = MediaItem::from_path(&path).unwrap();
            assert_eq!(item.dimensions(), None);
            assert_eq!(item.size_bytes, 17);
        }

        #[test]
        fn test_media_item_rejects_non_media() {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("notes.txt");
            fs::write(&path, b"hello").unwrap();

            assert!(MediaItem::from_path(&path).is_err());
        }

        #[test]
        fn test_media_item_nonexistent_file() {
            assert!(MediaItem::from_path(Path::new("/nonexistent/clip.mp4")).is_err());
        }

        #[test]
        fn test_display_uri_falls_back_to_uri() {
            let mut item = test_support::item("a");
            assert_eq!(item.display_uri(), "media://a");

            item.local_uri = Some("/cache/a.jpg".to_string());
            assert_eq!(item.display_uri(), "/cache/a.jpg");
        }
    }

    mod swipe_tests {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn test_swipe_boundaries() {
            assert_eq!(SwipeOutcome::classify(50.0, 50.0), SwipeOutcome::Keep);
            assert_eq!(SwipeOutcome::classify(-50.0, 50.0), SwipeOutcome::Delete);
            assert_eq!(SwipeOutcome::classify(49.9, 50.0), SwipeOutcome::Cancel);
            assert_eq!(SwipeOutcome::classify(-49.9, 50.0), SwipeOutcome::Cancel);
            assert_eq!(SwipeOutcome::classify(0.0, 50.0), SwipeOutcome::Cancel);
        }

        #[test]
        fn test_swipe_nan_cancels() {
            assert_eq!(SwipeOutcome::classify(f32::NAN, 8.0), SwipeOutcome::Cancel);
        }

        #[test]
        fn test_swipe_decision_kind() {
            assert_eq!(SwipeOutcome::Keep.decision_kind(), Some(DecisionKind::Keep));
            assert_eq!(
                SwipeOutcome::Delete.decision_kind(),
                Some(DecisionKind::Delete)
            );
            assert_eq!(SwipeOutcome::Cancel.decision_kind(), None);
        }

        proptest! {
            #[test]
            fn swipe_classification_is_total(d in -1000.0f32..1000.0, t in 1.0f32..200.0) {
                let outcome = SwipeOutcome::classify(d, t);
                let expected = if d <= -t {
                    SwipeOutcome::Delete
                } else if d >= t {
                    SwipeOutcome::Keep
                } else {
                    SwipeOutcome::Cancel
                };
                prop_assert_eq!(outcome, expected);
            }
        }
    }
}
