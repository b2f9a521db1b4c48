//! Lyrics fetcher that reacts to track changes.
//!
//! Every fetch is tagged with the track id it was issued for; a response
//! arriving after the track moved on is silently dropped, never shown.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::LyricsCache;
use crate::lines::LyricSet;
use crate::store::LyricsStore;
use crate::sync::{SyncEngine, SyncEvent};

/// Fetcher that listens for track changes and loads lyrics for them.
pub struct LyricsFetcher {
    sync_engine: Arc<SyncEngine>,
    cache: Arc<LyricsCache>,
    store: Arc<dyn LyricsStore>,
    cancel_token: CancellationToken,
}

impl LyricsFetcher {
    /// Create a new lyrics fetcher
    ///
    /// # Arguments
    /// * `sync_engine` - Sync engine to listen for track changes
    /// * `cache` - Per-track lyrics cache
    /// * `store` - Remote lyrics store
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        sync_engine: Arc<SyncEngine>,
        cache: Arc<LyricsCache>,
        store: Arc<dyn LyricsStore>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            sync_engine,
            cache,
            store,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start the lyrics fetcher in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the lyrics fetching loop
    async fn run(&self) {
        info!("Initializing lyrics fetching handler");

        let mut rx = self.sync_engine.subscribe();

        // A track may already be loaded when the fetcher starts
        if let Some(track_id) = self.sync_engine.current_track().await {
            if self.sync_engine.lyrics().await.is_none() {
                self.fetch_for_track(track_id).await;
            }
        }

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Lyrics fetcher shutting down");
                    break;
                }
                event = rx.recv() => {
                    match event {
                        Ok(SyncEvent::TrackChanged { track_id }) => {
                            self.fetch_for_track(track_id).await;
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            break;
                        }
                        _ => {
                            // Missed some events (Lagged) or other event types, continue
                        }
                    }
                }
            }
        }
    }

    /// Fetch lyrics for a track, consulting the cache first.
    ///
    /// The engine rechecks the track id when the result is applied, so a
    /// fetch that resolves after another track change is discarded.
    pub async fn fetch_for_track(&self, track_id: u64) {
        if let Some(cached) = self.cache.get(track_id) {
            debug!("Using cached lyrics for track {}", track_id);
            self.sync_engine
                .set_lyrics_for(track_id, (*cached).clone())
                .await;
            return;
        }

        info!("Fetching lyrics for track {}", track_id);
        match self.store.load(track_id).await {
            Ok(Some(payload)) => {
                let set = LyricSet::from_payload(&payload);
                if set.is_empty() {
                    self.sync_engine.mark_no_lyrics_for(track_id).await;
                    return;
                }

                let set = Arc::new(set);
                self.cache.insert(track_id, Arc::clone(&set));
                let applied = self
                    .sync_engine
                    .set_lyrics_for(track_id, (*set).clone())
                    .await;
                if applied {
                    info!(
                        "Loaded {} lyric lines for track {} (synced: {})",
                        set.len(),
                        track_id,
                        set.has_synced_lyrics
                    );
                } else {
                    debug!("Discarding stale lyrics response for track {}", track_id);
                }
            }
            Ok(None) => {
                // Tracks without lyrics are the common case, not a failure
                self.sync_engine.mark_no_lyrics_for(track_id).await;
            }
            Err(e) => {
                warn!("Lyrics fetch failed for track {}: {}", track_id, e);
                if self.sync_engine.current_track().await == Some(track_id) {
                    self.sync_engine.emit_error(e.to_string());
                }
            }
        }
    }

    /// Invalidate the cached entry for a track, e.g. after its lyrics were
    /// edited and saved, and refetch if it is still current.
    pub async fn refresh_track(&self, track_id: u64) {
        self.cache.remove(track_id);
        if self.sync_engine.current_track().await == Some(track_id) {
            self.fetch_for_track(track_id).await;
        }
    }
}
