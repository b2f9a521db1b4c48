//! Engine that keeps the lyric display aligned with playback time.
//!
//! Resolution runs a full binary search on every tick and assumes nothing
//! about time moving forward, so backward seeks land on the correct earlier
//! line. Line-change events are emitted exactly once per distinct resolved
//! index, no matter how fast ticks arrive.

use crate::lines::{LyricLine, LyricSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Resolve the active line for a playback position.
///
/// Returns the index of the rightmost line whose `start_time_ms` does not
/// exceed `current_time_ms`, or `None` if the slice is empty or the position
/// precedes the first line (negative positions included). Requires `lines`
/// sorted ascending by `(start_time_ms, sequence_index)`; among duplicate
/// start times the later line in original order wins.
#[must_use]
pub fn resolve_active_line(lines: &[LyricLine], current_time_ms: i64) -> Option<usize> {
    let first_after = lines.partition_point(|line| line.start_time_ms <= current_time_ms);
    first_after.checked_sub(1)
}

/// Derived per-tick state of the lyric display. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveLineState {
    /// Index of the active line, `None` while no line has started.
    pub active_index: Option<usize>,
    /// True only on the tick that moved onto a new line.
    pub is_transitioning: bool,
}

/// Events emitted by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The loaded track changed; lyrics were cleared atomically.
    TrackChanged { track_id: u64 },
    /// Playback view closed or no track loaded anymore.
    TrackCleared,
    /// Lyrics were loaded for the current track.
    LyricsLoaded { set: Arc<LyricSet> },
    /// No lyrics exist for the current track (not an error).
    LyricsNotFound,
    /// Lyrics were cleared without a replacement.
    LyricsCleared,
    /// The active line moved to a new index.
    LineChanged { index: usize },
    /// A non-fatal error occurred somewhere in the pipeline.
    Error { message: String },
}

struct SyncEngineInner {
    track_id: Option<u64>,
    lyrics: Option<Arc<LyricSet>>,
    active: ActiveLineState,
}

/// Engine that owns the active-line state machine for the loaded track.
///
/// States are `NO_LINE` (`active_index == None`) and `LINE_ACTIVE(i)`. The
/// engine only ever reads playback time; it never touches the transport.
pub struct SyncEngine {
    inner: RwLock<SyncEngineInner>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Subscribe to sync events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Load a track, atomically discarding the previous lyric set and
    /// resetting the active line. A tick never observes old lines with the
    /// new track or vice versa.
    pub async fn set_track(&self, track_id: Option<u64>) {
        let mut inner = self.inner.write().await;
        if inner.track_id == track_id {
            return;
        }

        inner.track_id = track_id;
        inner.lyrics = None;
        inner.active = ActiveLineState::default();

        match track_id {
            Some(track_id) => {
                let _ = self.event_tx.send(SyncEvent::TrackChanged { track_id });
            }
            None => {
                let _ = self.event_tx.send(SyncEvent::TrackCleared);
            }
        }
    }

    /// Install lyrics fetched for `track_id`.
    ///
    /// Returns false and discards the set when the engine has since moved to
    /// a different track, so a stale fetch can never overwrite the lyrics of
    /// the track that replaced it.
    pub async fn set_lyrics_for(&self, track_id: u64, set: LyricSet) -> bool {
        let mut inner = self.inner.write().await;
        if inner.track_id != Some(track_id) {
            return false;
        }

        let set = Arc::new(set);
        inner.lyrics = Some(Arc::clone(&set));
        inner.active = ActiveLineState::default();
        let _ = self.event_tx.send(SyncEvent::LyricsLoaded { set });
        true
    }

    /// Record that no lyrics exist for `track_id`. Stale results are dropped
    /// the same way as in [`Self::set_lyrics_for`].
    pub async fn mark_no_lyrics_for(&self, track_id: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.track_id != Some(track_id) {
            return false;
        }

        inner.lyrics = None;
        inner.active = ActiveLineState::default();
        let _ = self.event_tx.send(SyncEvent::LyricsNotFound);
        true
    }

    /// Clear lyrics and reset to `NO_LINE`.
    pub async fn clear_lyrics(&self) {
        let mut inner = self.inner.write().await;
        inner.lyrics = None;
        inner.active = ActiveLineState::default();
        let _ = self.event_tx.send(SyncEvent::LyricsCleared);
    }

    /// Apply one position tick.
    ///
    /// Resolves the active line from scratch and emits
    /// [`SyncEvent::LineChanged`] iff the resolved index differs from the
    /// current one. A `None` resolution (position before the first line)
    /// keeps the current line: only clearing or replacing the set returns
    /// the engine to `NO_LINE`. Ticks are serialized by the write lock.
    pub async fn apply_tick(&self, position_ms: i64) -> ActiveLineState {
        let mut inner = self.inner.write().await;

        let resolved = {
            let Some(lyrics) = inner.lyrics.as_ref().filter(|set| set.has_synced_lyrics) else {
                // Common case for tracks without (synced) lyrics; nothing to do.
                return inner.active;
            };
            resolve_active_line(&lyrics.lines, position_ms)
        };
        match resolved {
            Some(index) if inner.active.active_index != Some(index) => {
                inner.active = ActiveLineState {
                    active_index: Some(index),
                    is_transitioning: true,
                };
                let _ = self.event_tx.send(SyncEvent::LineChanged { index });
            }
            _ => {
                inner.active.is_transitioning = false;
            }
        }

        inner.active
    }

    /// Get the currently loaded track id
    pub async fn current_track(&self) -> Option<u64> {
        self.inner.read().await.track_id
    }

    /// Get the current lyric set
    pub async fn lyrics(&self) -> Option<Arc<LyricSet>> {
        self.inner.read().await.lyrics.clone()
    }

    /// Get the current active-line state
    pub async fn active_line(&self) -> ActiveLineState {
        self.inner.read().await.active
    }

    /// Emit an error event
    pub fn emit_error(&self, message: String) {
        let _ = self.event_tx.send(SyncEvent::Error { message });
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(SyncEngineInner {
                track_id: None,
                lyrics: None,
                active: ActiveLineState::default(),
            }),
            event_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, start_time_ms: i64, sequence_index: usize) -> LyricLine {
        LyricLine {
            text: text.to_string(),
            start_time_ms,
            end_time_ms: None,
            sequence_index,
        }
    }

    fn three_lines() -> Vec<LyricLine> {
        vec![line("a", 0, 0), line("b", 5000, 1), line("c", 12000, 2)]
    }

    fn synced_set(lines: Vec<LyricLine>) -> LyricSet {
        LyricSet {
            has_synced_lyrics: true,
            has_static_lyrics: false,
            lines,
            source_url: None,
        }
    }

    #[test]
    fn test_resolve_scenario_a() {
        let lines = three_lines();
        assert_eq!(resolve_active_line(&lines, 7000), Some(1));
        assert_eq!(resolve_active_line(&lines, 0), Some(0));
        assert_eq!(resolve_active_line(&lines, -1), None);
    }

    #[test]
    fn test_resolve_empty_set_scenario_b() {
        assert_eq!(resolve_active_line(&[], 0), None);
        assert_eq!(resolve_active_line(&[], 999_999), None);
        assert_eq!(resolve_active_line(&[], i64::MIN), None);
    }

    #[test]
    fn test_resolve_greatest_index_property() {
        let lines = three_lines();
        for t in [-5, 0, 1, 4999, 5000, 5001, 11999, 12000, 1_000_000] {
            let expected = lines
                .iter()
                .enumerate()
                .rev()
                .find(|(_, l)| l.start_time_ms <= t)
                .map(|(i, _)| i);
            assert_eq!(resolve_active_line(&lines, t), expected, "t = {t}");
        }
    }

    #[test]
    fn test_resolve_duplicate_start_times_prefers_later_line() {
        let lines = vec![line("a", 5000, 0), line("b", 5000, 1), line("c", 9000, 2)];
        assert_eq!(resolve_active_line(&lines, 5000), Some(1));
        assert_eq!(resolve_active_line(&lines, 8000), Some(1));
    }

    #[test]
    fn test_resolve_exact_boundary() {
        let lines = three_lines();
        assert_eq!(resolve_active_line(&lines, 5000), Some(1));
        assert_eq!(resolve_active_line(&lines, 12000), Some(2));
    }

    #[tokio::test]
    async fn test_backward_seek_resolves_earlier_line() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine.set_lyrics_for(1, synced_set(three_lines())).await;

        let state = engine.apply_tick(13_000).await;
        assert_eq!(state.active_index, Some(2));

        // Seek backward: no stale-forward bias
        let state = engine.apply_tick(1_000).await;
        assert_eq!(state.active_index, Some(0));
    }

    #[tokio::test]
    async fn test_line_changed_emitted_once_per_index() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        let mut rx = engine.subscribe();
        engine.set_lyrics_for(1, synced_set(three_lines())).await;

        // Repeated ticks within the same line must be idempotent
        engine.apply_tick(6000).await;
        engine.apply_tick(6100).await;
        engine.apply_tick(6200).await;
        engine.apply_tick(12_500).await;

        let mut changes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SyncEvent::LineChanged { index } = event {
                changes.push(index);
            }
        }
        assert_eq!(changes, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_transitioning_flag_clears_on_repeat_tick() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine.set_lyrics_for(1, synced_set(three_lines())).await;

        let state = engine.apply_tick(6000).await;
        assert!(state.is_transitioning);
        let state = engine.apply_tick(6100).await;
        assert!(!state.is_transitioning);
        assert_eq!(state.active_index, Some(1));
    }

    #[tokio::test]
    async fn test_time_decrease_never_returns_to_no_line() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine.set_lyrics_for(1, synced_set(three_lines())).await;

        engine.apply_tick(6000).await;
        // Seek to before the first line: the current line stays active
        let state = engine.apply_tick(-100).await;
        assert_eq!(state.active_index, Some(1));
    }

    #[tokio::test]
    async fn test_track_change_resets_active_state() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine.set_lyrics_for(1, synced_set(three_lines())).await;
        engine.apply_tick(6000).await;

        engine.set_track(Some(2)).await;
        assert_eq!(engine.active_line().await, ActiveLineState::default());
        assert!(engine.lyrics().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_lyrics_discarded_scenario_d() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine.set_track(Some(2)).await;
        engine
            .set_lyrics_for(2, synced_set(vec![line("current", 0, 0)]))
            .await;

        // Track A's fetch resolves late; it must not overwrite track B's set
        let applied = engine
            .set_lyrics_for(1, synced_set(vec![line("stale", 0, 0)]))
            .await;
        assert!(!applied);
        let lyrics = engine.lyrics().await.unwrap();
        assert_eq!(lyrics.lines[0].text, "current");
    }

    #[tokio::test]
    async fn test_static_set_never_activates_a_line() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        engine
            .set_lyrics_for(1, LyricSet::from_static_text("one\ntwo"))
            .await;

        let state = engine.apply_tick(60_000).await;
        assert_eq!(state.active_index, None);
    }

    #[tokio::test]
    async fn test_tick_without_lyrics_is_no_line() {
        let engine = SyncEngine::new();
        engine.set_track(Some(1)).await;
        let state = engine.apply_tick(10_000).await;
        assert_eq!(state.active_index, None);
        assert!(!state.is_transitioning);
    }
}
