//! Mswp - swipe-style review of a photo and video library
//!
//! The core is a synchronous [`DecisionEngine`] that walks a paginated queue
//! of media items, records keep/delete decisions with undo, and batches the
//! deletions until the user finishes. [`ReviewSession`] drives it
//! against an asynchronous [`ItemSource`] with background prefetching.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod feedback;
pub mod session;
pub mod source;
pub mod tui;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use domain::{
    Current, Decision, DecisionEngine, DecisionKind, DecisionStatistics, DeletionReport, ItemId,
    MediaItem, MediaKind, PageCursor, QueueState, SwipeOutcome,
};
pub use error::{Result, TriageError};
pub use session::{FinishOutcome, LoadOutcome, QueueSnapshot, ReviewEvent, ReviewSession};
pub use source::{DeleteOutcome, DirectorySource, ItemSource, MemorySource, Page};
