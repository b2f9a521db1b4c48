//! Mediates user drag-seeking against live playback updates.
//!
//! While a drag is in progress every consumer of "current position" reads the
//! preview value, so the displayed time and lyric never snap back to the
//! pre-drag position mid-gesture. The transport receives no seeks until the
//! drag is released, and then exactly one.

use crate::error::Result;
use crate::playback::{PlaybackPosition, TimeSource};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrubState {
    Idle,
    Scrubbing { preview_ms: i64 },
}

/// Coordinator for drag-scrub gestures on the position control.
///
/// This is the only component allowed to issue `seek()` on the time source.
pub struct ScrubCoordinator {
    source: Arc<dyn TimeSource>,
    state: Mutex<ScrubState>,
}

impl ScrubCoordinator {
    #[must_use]
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            state: Mutex::new(ScrubState::Idle),
        }
    }

    /// Enter the scrubbing state, seeding the preview with the live position.
    /// Re-entering while already scrubbing keeps the current preview.
    pub fn begin_scrub(&self) {
        let mut state = self.lock_state();
        if matches!(*state, ScrubState::Idle) {
            let live = self.source.position();
            *state = ScrubState::Scrubbing {
                preview_ms: live.current_time_ms,
            };
            debug!("Scrub started at {} ms", live.current_time_ms);
        }
    }

    /// Update the drag preview. Does not touch the transport. Ignored when
    /// no drag is in progress.
    pub fn update_scrub_preview(&self, position_ms: i64) {
        let mut state = self.lock_state();
        if matches!(*state, ScrubState::Scrubbing { .. }) {
            *state = ScrubState::Scrubbing {
                preview_ms: position_ms,
            };
        }
    }

    /// Release the drag: issue exactly one seek with the final value and
    /// resume trusting the live transport position.
    ///
    /// The state returns to idle before the seek is issued, so a tick that
    /// runs afterwards can never read a stale preview as the live position.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaybackError`](crate::CoreError::PlaybackError)
    /// if the transport rejects the seek.
    pub fn commit_scrub(&self, position_ms: i64) -> Result<()> {
        {
            let mut state = self.lock_state();
            if matches!(*state, ScrubState::Idle) {
                return Ok(());
            }
            *state = ScrubState::Idle;
        }
        debug!("Scrub committed at {} ms", position_ms);
        self.source.seek(position_ms)
    }

    /// Abandon the drag without seeking; the live position takes over again.
    pub fn cancel_scrub(&self) {
        *self.lock_state() = ScrubState::Idle;
    }

    /// Whether a drag is currently in progress.
    #[must_use]
    pub fn is_scrubbing(&self) -> bool {
        matches!(*self.lock_state(), ScrubState::Scrubbing { .. })
    }

    /// The position every consumer must display: the drag preview while
    /// scrubbing, otherwise the live transport value.
    #[must_use]
    pub fn display_position(&self, live_position_ms: i64) -> i64 {
        match *self.lock_state() {
            ScrubState::Idle => live_position_ms,
            ScrubState::Scrubbing { preview_ms } => preview_ms,
        }
    }

    /// Transport snapshot with the scrub gate applied. `is_seeking` is set
    /// iff a drag is in progress.
    #[must_use]
    pub fn gated_position(&self) -> PlaybackPosition {
        let mut position = self.source.position();
        if let ScrubState::Scrubbing { preview_ms } = *self.lock_state() {
            position.current_time_ms = preview_ms;
            position.is_seeking = true;
        }
        position
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScrubState> {
        // The lock is only held for field reads/writes; poisoning would mean
        // a panic in one of those, which the lint policy already forbids.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
