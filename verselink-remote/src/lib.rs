//! HTTP lyrics store talking to the platform's music API.
//!
//! Implements [`LyricsStore`] against the `/api/music/{track_id}/lyrics`
//! endpoints: load, save edited text, and upload time-coded files.

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use verselink_core::config::ApiConfig;
use verselink_core::lrc;
use verselink_core::{CoreError, LyricsPayload, LyricsStore, SaveOutcome, UploadOutcome};

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Lyrics store backed by the platform HTTP API.
pub struct HttpLyricsStore {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Mutation response shared by the save and upload endpoints.
/// The server returns additional fields we don't use; serde ignores
/// unknown fields by default.
#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    warning: Option<String>,
}

impl HttpLyricsStore {
    /// Create a new store with default 10-second timeout and 3 retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoreError> {
        Self::with_settings(base_url, DEFAULT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES)
    }

    /// Create a store from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &ApiConfig) -> Result<Self, CoreError> {
        Self::with_settings(&config.base_url, config.timeout_secs, config.max_retries)
    }

    fn with_settings(
        base_url: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, CoreError> {
        // Base client with timeout
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("Verselink/1.0")
            .build()?;

        // Wrap with retry middleware (exponential backoff)
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let base_url = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn lyrics_url(&self, track_id: u64) -> String {
        format!("{}/api/music/{}/lyrics", self.base_url, track_id)
    }

    fn upload_url(&self, track_id: u64) -> String {
        format!("{}/api/music/{}/lyrics/upload", self.base_url, track_id)
    }

    /// Extract a server error message from a mutation response body, falling
    /// back to the given default when the body carries none.
    async fn mutation_outcome(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<Option<String>, CoreError> {
        let status = response.status();
        let body: MutationResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(CoreError::NetworkError(e)),
            Err(_) => {
                return Err(CoreError::ServerError {
                    message: format!("{fallback} (status {status})"),
                })
            }
        };

        if !status.is_success() || !body.success {
            return Err(CoreError::ServerError {
                message: body.error.unwrap_or_else(|| fallback.to_string()),
            });
        }
        Ok(body.warning)
    }
}

#[async_trait]
impl LyricsStore for HttpLyricsStore {
    async fn load(&self, track_id: u64) -> Result<Option<LyricsPayload>, CoreError> {
        let url = self.lyrics_url(track_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("No lyrics stored for track {}", track_id);
            return Ok(None);
        }

        if !response.status().is_success() {
            warn!(
                "Lyrics load for track {} returned status {}",
                track_id,
                response.status()
            );
            return Err(CoreError::ServerError {
                message: format!("lyrics request returned status {}", response.status()),
            });
        }

        let payload: LyricsPayload = response.json().await?;
        if !payload.has_lyrics && !payload.has_synced_lyrics {
            return Ok(None);
        }
        Ok(Some(payload))
    }

    async fn save(
        &self,
        track_id: u64,
        raw_text: &str,
        source_tag: &str,
    ) -> Result<SaveOutcome, CoreError> {
        if raw_text.trim().is_empty() {
            return Err(CoreError::EmptyLyrics);
        }

        let url = self.lyrics_url(track_id);
        info!("Saving lyrics for track {}", track_id);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "lyrics": raw_text,
                "source_url": source_tag,
            }))
            .send()
            .await?;

        let warning = Self::mutation_outcome(response, "Failed to save lyrics").await?;
        Ok(SaveOutcome { warning })
    }

    async fn upload_sync_file(
        &self,
        track_id: u64,
        file_name: &str,
        content: &str,
    ) -> Result<UploadOutcome, CoreError> {
        let lower = file_name.to_lowercase();
        let is_lrc = lower.ends_with(".lrc");
        let is_json = lower.ends_with(".json");
        if !is_lrc && !is_json {
            return Err(CoreError::UnsupportedSyncFile {
                file_name: file_name.to_string(),
            });
        }

        // Local validation before any network traffic
        if is_json {
            lrc::parse_json_lines(content)?;
        } else if !lrc::has_time_tags(content) {
            warn!(
                "Uploading {} without recognizable time tags for track {}",
                file_name, track_id
            );
        }

        let url = self.upload_url(track_id);
        info!("Uploading sync file {} for track {}", file_name, track_id);

        let part = reqwest::multipart::Part::text(content.to_string())
            .file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let warning = Self::mutation_outcome(response, "Failed to upload sync file").await?;

        // The server may accept the file yet parse it as static text only;
        // reload to see whether synced lyrics actually landed.
        Ok(resolve_upload_outcome(self.load(track_id).await, warning))
    }
}

/// Combine the server's upload warning with the post-upload reload into the
/// final outcome. "Accepted but parsed as static text" stays a success with
/// `sync_recognized == false` and a warning; a failed reload must not revoke
/// the accepted upload either, so it also degrades to a warning.
fn resolve_upload_outcome(
    reload: Result<Option<LyricsPayload>, CoreError>,
    warning: Option<String>,
) -> UploadOutcome {
    match reload {
        Ok(payload) => {
            let sync_recognized = payload.is_some_and(|p| p.has_synced_lyrics);
            let warning = if sync_recognized {
                warning
            } else {
                warning.or_else(|| {
                    Some("File uploaded, but no synchronized lyrics were recognized".to_string())
                })
            };
            UploadOutcome {
                sync_recognized,
                warning,
            }
        }
        Err(e) => {
            warn!("Post-upload lyrics reload failed: {}", e);
            UploadOutcome {
                sync_recognized: false,
                warning: warning
                    .or_else(|| Some(format!("File uploaded, but verifying synchronization failed: {e}"))),
            }
        }
    }
}
