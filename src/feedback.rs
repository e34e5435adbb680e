//! Short-lived status messages for review events
//!
//! The engine only emits events. Turning them into a message and clearing it
//! after a while belongs to whoever draws the screen, via [`FeedbackSlot`].

use crate::domain::DecisionKind;
use crate::session::ReviewEvent;
use std::time::{Duration, Instant};

/// How long decision and undo messages stay up
pub const DEFAULT_FEEDBACK_DURATION: Duration = Duration::from_millis(1000);
/// How long finish results stay up
pub const DEFAULT_FINISH_FEEDBACK_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub tone: Tone,
    pub duration: Duration,
}

/// Display durations, usually taken from user configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackDurations {
    pub decision: Duration,
    pub finish: Duration,
}

impl Default for FeedbackDurations {
    fn default() -> Self {
        Self {
            decision: DEFAULT_FEEDBACK_DURATION,
            finish: DEFAULT_FINISH_FEEDBACK_DURATION,
        }
    }
}

impl Feedback {
    /// Message for an event, `None` for events that need no feedback
    pub fn from_event(event: &ReviewEvent, durations: FeedbackDurations) -> Option<Self> {
        let (message, tone, duration) = match event {
            ReviewEvent::Decided(decision) => match decision.kind {
                DecisionKind::Keep => ("Kept".to_string(), Tone::Positive, durations.decision),
                DecisionKind::Delete => (
                    "Marked for deletion".to_string(),
                    Tone::Negative,
                    durations.decision,
                ),
            },
            ReviewEvent::Undone(_) => ("Undone".to_string(), Tone::Neutral, durations.decision),
            ReviewEvent::NothingToUndo => (
                "Nothing to undo".to_string(),
                Tone::Neutral,
                durations.decision,
            ),
            ReviewEvent::Reset => (
                "Starting over".to_string(),
                Tone::Neutral,
                durations.decision,
            ),
            ReviewEvent::FinishStarted { count } => (
                format!("Deleting {} item(s)...", count),
                Tone::Neutral,
                durations.finish,
            ),
            ReviewEvent::NothingToDelete => (
                "Nothing marked for deletion".to_string(),
                Tone::Neutral,
                durations.finish,
            ),
            ReviewEvent::Finished(report) => (
                format!("Deleted {} item(s)", report.deleted.len()),
                Tone::Positive,
                durations.finish,
            ),
            ReviewEvent::FinishPartial(report) => (
                format!(
                    "Deleted {}, {} could not be deleted",
                    report.deleted.len(),
                    report.failed.len()
                ),
                Tone::Negative,
                durations.finish,
            ),
            ReviewEvent::FinishFailed { message } => (
                format!("Error deleting items: {}", message),
                Tone::Negative,
                durations.finish,
            ),
            ReviewEvent::PageFailed { message } => (
                format!("Could not load more: {}", message),
                Tone::Negative,
                durations.finish,
            ),
            ReviewEvent::PageLoaded { .. } | ReviewEvent::Reloaded => return None,
        };

        Some(Feedback {
            message,
            tone,
            duration,
        })
    }
}

/// Holds at most one message and drops it once its duration has passed
#[derive(Debug, Default)]
pub struct FeedbackSlot {
    current: Option<(Feedback, Instant)>,
}

impl FeedbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever is showing
    pub fn show(&mut self, feedback: Feedback, now: Instant) {
        let expires = now + feedback.duration;
        self.current = Some((feedback, expires));
    }

    pub fn current(&mut self, now: Instant) -> Option<&Feedback> {
        if let Some((_, expires)) = &self.current {
            if now >= *expires {
                self.current = None;
            }
        }
        self.current.as_ref().map(|(feedback, _)| feedback)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
