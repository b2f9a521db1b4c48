use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Lyrics validation errors (rejected before any network call)
    #[error("Lyrics text must not be empty")]
    EmptyLyrics,

    #[error("Unsupported sync file \"{file_name}\": only .lrc and .json files are accepted")]
    UnsupportedSyncFile { file_name: String },

    #[error("Failed to parse LRC: {reason}")]
    LrcParseError { reason: String },

    #[error("Failed to parse line list: {0}")]
    JsonError(#[from] serde_json::Error),

    // Remote store errors
    #[error("Lyrics server error: {message}")]
    ServerError { message: String },

    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Network request failed: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    // Playback transport errors
    #[error("Playback transport error: {reason}")]
    PlaybackError { reason: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
