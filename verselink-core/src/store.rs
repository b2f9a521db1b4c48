//! Contract between the core and the remote lyrics store.
//!
//! The core only ever sees these shapes; transport, endpoints and retries
//! live behind the trait.

use crate::error::CoreError;
use crate::lines::LyricsPayload;
use async_trait::async_trait;

/// Source tag recorded when lyrics are saved from the editor.
pub const MANUAL_SOURCE_TAG: &str = "manually_added";

/// Result of saving edited lyric text.
///
/// A save can succeed and still carry a non-fatal server warning (e.g.
/// "saved but formatting looks off"); the warning must be surfaced without
/// blocking success handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub warning: Option<String>,
}

/// Result of uploading a time-coded file.
///
/// `sync_recognized == false` is a soft warning, not a failure: the server
/// accepted the file but parsed it as static text only. Never promote it to
/// a hard error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub sync_recognized: bool,
    pub warning: Option<String>,
}

/// Remote lyrics store for one platform backend.
#[async_trait]
pub trait LyricsStore: Send + Sync {
    /// Fetch the lyrics payload for a track.
    ///
    /// `Ok(None)` means no lyrics exist — the common case, rendered as "no
    /// lyrics" rather than a failure.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NetworkError`] or [`CoreError::ServerError`]
    /// when the request itself fails.
    async fn load(&self, track_id: u64) -> Result<Option<LyricsPayload>, CoreError>;

    /// Save raw lyric text for a track.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyLyrics`] for blank text (rejected before
    /// any network call), [`CoreError::ServerError`] for a server-side
    /// validation failure, or [`CoreError::NetworkError`].
    async fn save(
        &self,
        track_id: u64,
        raw_text: &str,
        source_tag: &str,
    ) -> Result<SaveOutcome, CoreError>;

    /// Upload a time-coded file (`.lrc` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedSyncFile`] for any other extension
    /// (rejected before any network call), [`CoreError::ServerError`] or
    /// [`CoreError::NetworkError`] for transport failures.
    async fn upload_sync_file(
        &self,
        track_id: u64,
        file_name: &str,
        content: &str,
    ) -> Result<UploadOutcome, CoreError>;
}
