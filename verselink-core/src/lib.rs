pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lines;
pub mod lrc;
pub mod paths;
pub mod playback;
pub mod scrub;
pub mod store;
pub mod sync;
pub mod time;

pub use cache::LyricsCache;
pub use config::{build_config_template, ApiConfig, Config, LyricsConfig, PlaybackConfig};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::CoreError;
pub use fetcher::LyricsFetcher;
pub use lines::{LyricLine, LyricSet, LyricsPayload, RawSyncedLine};
pub use lrc::{LrcDocument, LrcEntry, LrcMetadata};
pub use paths::{config_dir, config_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::{PlaybackPosition, PositionTicker, TimeSource};
pub use scrub::ScrubCoordinator;
pub use store::{LyricsStore, SaveOutcome, UploadOutcome, MANUAL_SOURCE_TAG};
pub use sync::{resolve_active_line, ActiveLineState, SyncEngine, SyncEvent};
pub use time::DurationExt;
