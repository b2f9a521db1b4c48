//! The lyric line index: normalizes raw lyric payloads (time-coded or static)
//! into an ordered, searchable sequence of display lines.

use serde::{Deserialize, Serialize};

/// A single display line with its timing.
///
/// `sequence_index` is assigned at normalization time from the input order and
/// stays stable for the lifetime of one loaded set. Static lyrics carry
/// `start_time_ms == 0` on every line; their ordering is display order only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub text: String,
    pub start_time_ms: i64,
    pub end_time_ms: Option<i64>,
    pub sequence_index: usize,
}

/// A raw time-coded line as delivered by the lyrics API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSyncedLine {
    pub text: Option<String>,
    #[serde(rename = "startTimeMs")]
    pub start_time_ms: i64,
    #[serde(rename = "endTimeMs", default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<i64>,
}

/// The lyrics payload delivered by the remote store for one track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricsPayload {
    #[serde(default)]
    pub has_lyrics: bool,
    #[serde(default)]
    pub has_synced_lyrics: bool,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub synced_lyrics: Option<Vec<RawSyncedLine>>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// An immutable set of display lines for one track.
///
/// Replaced wholesale when the track changes or an edit is saved, never
/// mutated in place. Within a time-coded set the lines are sorted ascending by
/// `start_time_ms` with `sequence_index` as a stable tiebreaker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricSet {
    pub has_synced_lyrics: bool,
    pub has_static_lyrics: bool,
    pub lines: Vec<LyricLine>,
    pub source_url: Option<String>,
}

impl LyricSet {
    /// Build a time-coded set from a raw API payload.
    ///
    /// Entries with missing or empty text are dropped. `sequence_index` is
    /// assigned in input order before sorting, so ties on `start_time_ms`
    /// resolve to the later line in original order.
    #[must_use]
    pub fn from_synced_payload(raw: &[RawSyncedLine]) -> Self {
        let mut lines: Vec<LyricLine> = raw
            .iter()
            .filter_map(|entry| entry.text.as_deref().map(|text| (text, entry)))
            .filter(|(text, _)| !text.is_empty())
            .enumerate()
            .map(|(sequence_index, (text, entry))| LyricLine {
                text: text.to_string(),
                start_time_ms: entry.start_time_ms,
                end_time_ms: entry.end_time_ms,
                sequence_index,
            })
            .collect();

        // Input order is not guaranteed sorted.
        lines.sort_by_key(|line| (line.start_time_ms, line.sequence_index));

        Self {
            has_synced_lyrics: !lines.is_empty(),
            has_static_lyrics: false,
            lines,
            source_url: None,
        }
    }

    /// Build a static (non-time-coded) set from raw text.
    ///
    /// Splits on line breaks, trims, drops blank lines. Every line gets
    /// `start_time_ms = 0`; display order is preserved via `sequence_index`.
    #[must_use]
    pub fn from_static_text(text: &str) -> Self {
        let lines: Vec<LyricLine> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(sequence_index, line)| LyricLine {
                text: line.to_string(),
                start_time_ms: 0,
                end_time_ms: None,
                sequence_index,
            })
            .collect();

        Self {
            has_synced_lyrics: false,
            has_static_lyrics: !lines.is_empty(),
            lines,
            source_url: None,
        }
    }

    /// Build the display set from a fetched payload, preferring time-coded
    /// data when the payload carries it.
    #[must_use]
    pub fn from_payload(payload: &LyricsPayload) -> Self {
        let mut set = match (&payload.synced_lyrics, &payload.lyrics) {
            (Some(synced), _) if payload.has_synced_lyrics && !synced.is_empty() => {
                Self::from_synced_payload(synced)
            }
            (_, Some(text)) => Self::from_static_text(text),
            _ => Self::default(),
        };
        set.source_url = payload.source_url.clone();
        set
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, start_time_ms: i64) -> RawSyncedLine {
        RawSyncedLine {
            text: Some(text.to_string()),
            start_time_ms,
            end_time_ms: None,
        }
    }

    #[test]
    fn test_synced_payload_sorted_by_start_time() {
        let set = LyricSet::from_synced_payload(&[
            raw("third", 12000),
            raw("first", 0),
            raw("second", 5000),
        ]);
        assert!(set.has_synced_lyrics);
        assert_eq!(
            set.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );
        assert_eq!(
            set.lines.iter().map(|l| l.start_time_ms).collect::<Vec<_>>(),
            vec![0, 5000, 12000]
        );
    }

    #[test]
    fn test_synced_payload_drops_malformed_entries() {
        let mut entries = vec![raw("kept", 1000)];
        entries.push(RawSyncedLine {
            text: None,
            start_time_ms: 2000,
            end_time_ms: None,
        });
        entries.push(RawSyncedLine {
            text: Some(String::new()),
            start_time_ms: 3000,
            end_time_ms: None,
        });
        let set = LyricSet::from_synced_payload(&entries);
        assert_eq!(set.len(), 1);
        assert_eq!(set.lines[0].text, "kept");
    }

    #[test]
    fn test_synced_payload_tie_break_keeps_input_order() {
        let set = LyricSet::from_synced_payload(&[raw("a", 5000), raw("b", 5000)]);
        assert_eq!(set.lines[0].text, "a");
        assert_eq!(set.lines[1].text, "b");
        assert_eq!(set.lines[0].sequence_index, 0);
        assert_eq!(set.lines[1].sequence_index, 1);
    }

    #[test]
    fn test_sequence_indices_are_unique() {
        let set = LyricSet::from_synced_payload(&[
            raw("a", 3000),
            raw("b", 1000),
            raw("c", 2000),
        ]);
        let mut indices: Vec<_> = set.lines.iter().map(|l| l.sequence_index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), set.len());
    }

    #[test]
    fn test_static_text_round_trip() {
        let text = "First line\n\n  Second line  \nThird line\n";
        let set = LyricSet::from_static_text(text);
        assert!(set.has_static_lyrics);
        assert!(!set.has_synced_lyrics);
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(),
            vec!["First line", "Second line", "Third line"]
        );
        assert!(set.lines.iter().all(|l| l.start_time_ms == 0));
    }

    #[test]
    fn test_static_text_blank_only_is_empty() {
        let set = LyricSet::from_static_text("  \n\n   \n");
        assert!(set.is_empty());
        assert!(!set.has_static_lyrics);
    }

    #[test]
    fn test_from_payload_prefers_synced() {
        let payload = LyricsPayload {
            has_lyrics: true,
            has_synced_lyrics: true,
            lyrics: Some("static fallback".to_string()),
            synced_lyrics: Some(vec![raw("timed", 1000)]),
            source_url: Some("manually_added".to_string()),
        };
        let set = LyricSet::from_payload(&payload);
        assert!(set.has_synced_lyrics);
        assert_eq!(set.lines[0].text, "timed");
        assert_eq!(set.source_url.as_deref(), Some("manually_added"));
    }

    #[test]
    fn test_from_payload_falls_back_to_static() {
        let payload = LyricsPayload {
            has_lyrics: true,
            has_synced_lyrics: false,
            lyrics: Some("one\ntwo".to_string()),
            synced_lyrics: None,
            source_url: None,
        };
        let set = LyricSet::from_payload(&payload);
        assert!(set.has_static_lyrics);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_raw_line_wire_names() {
        let line: RawSyncedLine =
            serde_json::from_str(r#"{"text":"hello","startTimeMs":1200,"endTimeMs":3400}"#)
                .unwrap();
        assert_eq!(line.text.as_deref(), Some("hello"));
        assert_eq!(line.start_time_ms, 1200);
        assert_eq!(line.end_time_ms, Some(3400));
    }
}
