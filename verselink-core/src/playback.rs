//! Time source adapter: the single abstraction over the audio transport.
//!
//! One bounded-rate tick loop reads the transport and feeds the sync engine.
//! There are deliberately no competing timers or frame loops racing to update
//! the same state.

use crate::error::Result;
use crate::scrub::ScrubCoordinator;
use crate::sync::SyncEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default tick interval: 100 ms (10 Hz), balancing display smoothness
/// against render cost.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// A snapshot of the transport position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    pub current_time_ms: i64,
    /// Total duration; `<= 0` means the transport has not resolved it yet.
    pub duration_ms: i64,
    /// Set exclusively by the scrub coordinator while a drag is in progress.
    pub is_seeking: bool,
}

impl PlaybackPosition {
    /// Whether the transport has resolved a usable duration.
    #[must_use]
    pub const fn duration_known(&self) -> bool {
        self.duration_ms > 0
    }

    /// Fractional progress through the track, clamped to `0.0..=1.0`.
    ///
    /// Returns `None` while the duration is unknown; callers must not divide
    /// by an unresolved duration themselves.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> Option<f64> {
        if !self.duration_known() {
            return None;
        }
        let fraction = self.current_time_ms as f64 / self.duration_ms as f64;
        Some(fraction.clamp(0.0, 1.0))
    }
}

/// Abstraction over the underlying audio transport.
///
/// All operations run to completion synchronously; transport failures surface
/// as [`CoreError::PlaybackError`](crate::CoreError::PlaybackError) to the
/// caller instead of escaping across the tick callback boundary.
///
/// Only the scrub coordinator may call `seek`; only the playback control
/// surface may call `play`/`pause`. The sync engine is a pure reader.
pub trait TimeSource: Send + Sync {
    /// Current transport position snapshot.
    fn position(&self) -> PlaybackPosition;

    /// Whether the transport is currently playing.
    fn is_playing(&self) -> bool;

    /// Start playback.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaybackError`](crate::CoreError::PlaybackError)
    /// if the transport fails to start.
    fn play(&self) -> Result<()>;

    /// Pause playback.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaybackError`](crate::CoreError::PlaybackError)
    /// if the transport rejects the request.
    fn pause(&self) -> Result<()>;

    /// Move the transport to `position_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PlaybackError`](crate::CoreError::PlaybackError)
    /// if the transport rejects the seek.
    fn seek(&self, position_ms: i64) -> Result<()>;
}

/// Bounded-rate tick loop driving the sync engine from the transport clock.
///
/// Ticks fire only while playing and are applied one at a time; the display
/// position is gated through the scrub coordinator so the engine sees the
/// drag preview instead of the live position mid-gesture.
pub struct PositionTicker {
    source: Arc<dyn TimeSource>,
    engine: Arc<SyncEngine>,
    scrub: Arc<ScrubCoordinator>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
}

impl PositionTicker {
    #[must_use]
    pub fn new(
        source: Arc<dyn TimeSource>,
        engine: Arc<SyncEngine>,
        scrub: Arc<ScrubCoordinator>,
        tick_interval_ms: u64,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            source,
            engine,
            scrub,
            tick_interval: Duration::from_millis(tick_interval_ms.max(1)),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start the tick loop in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(
            "Starting position ticker at {} ms interval",
            self.tick_interval.as_millis()
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Position ticker shutting down");
                    break;
                }
                () = tokio::time::sleep(self.tick_interval) => {
                    if !self.source.is_playing() {
                        continue;
                    }
                    self.tick_once().await;
                }
            }
        }
    }

    /// Apply a single tick. Each tick runs to completion before the next one
    /// begins.
    pub async fn tick_once(&self) {
        let live = self.source.position();
        let display_ms = self.scrub.display_position(live.current_time_ms);
        let state = self.engine.apply_tick(display_ms).await;
        if state.is_transitioning {
            debug!(
                "Line transition at {} ms -> index {:?}",
                display_ms, state.active_index
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeTimeSource;
    use super::*;
    use crate::error::CoreError;
    use crate::lines::LyricSet;

    /// Transport that rejects every request, for error-surface tests.
    struct BrokenTimeSource;

    impl TimeSource for BrokenTimeSource {
        fn position(&self) -> PlaybackPosition {
            PlaybackPosition::default()
        }

        fn is_playing(&self) -> bool {
            false
        }

        fn play(&self) -> crate::error::Result<()> {
            Err(CoreError::PlaybackError {
                reason: "failed to start playback".to_string(),
            })
        }

        fn pause(&self) -> crate::error::Result<()> {
            Ok(())
        }

        fn seek(&self, _position_ms: i64) -> crate::error::Result<()> {
            Err(CoreError::PlaybackError {
                reason: "seek rejected".to_string(),
            })
        }
    }

    #[test]
    fn test_unknown_duration_has_no_progress() {
        let position = PlaybackPosition {
            current_time_ms: 5000,
            duration_ms: 0,
            is_seeking: false,
        };
        assert!(!position.duration_known());
        assert!(position.progress().is_none());

        let negative = PlaybackPosition {
            current_time_ms: 5000,
            duration_ms: -1,
            is_seeking: false,
        };
        assert!(negative.progress().is_none());
    }

    #[test]
    fn test_progress_is_clamped() {
        let position = PlaybackPosition {
            current_time_ms: 200_000,
            duration_ms: 180_000,
            is_seeking: false,
        };
        assert!((position.progress().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transport_errors_are_values_not_panics() {
        let source = BrokenTimeSource;
        assert!(matches!(
            source.play(),
            Err(CoreError::PlaybackError { .. })
        ));
        assert!(matches!(
            source.seek(1000),
            Err(CoreError::PlaybackError { .. })
        ));
    }

    #[tokio::test]
    async fn test_tick_drives_engine_from_transport_clock() {
        let source = Arc::new(FakeTimeSource::at(7000));
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine
            .set_lyrics_for(1, {
                let raw = [
                    crate::lines::RawSyncedLine {
                        text: Some("a".to_string()),
                        start_time_ms: 0,
                        end_time_ms: None,
                    },
                    crate::lines::RawSyncedLine {
                        text: Some("b".to_string()),
                        start_time_ms: 5000,
                        end_time_ms: None,
                    },
                ];
                LyricSet::from_synced_payload(&raw)
            })
            .await;
        let scrub = Arc::new(ScrubCoordinator::new(
            Arc::clone(&source) as Arc<dyn TimeSource>
        ));

        let ticker = PositionTicker::new(source, Arc::clone(&engine), scrub, 100, None);
        ticker.tick_once().await;

        assert_eq!(engine.active_line().await.active_index, Some(1));
    }
}
