//! LRC format support: parsing timestamp-tagged lyric files, detecting
//! whether a file carries usable time tags, reading the structured JSON
//! line-list format, and exporting a zero-stamped template for manual
//! re-synchronization.

use crate::error::{CoreError, Result};
use crate::lines::{LyricSet, RawSyncedLine};

/// Parsed LRC document: ID-tag metadata plus time-coded lines.
#[derive(Debug, Clone, Default)]
pub struct LrcDocument {
    pub metadata: LrcMetadata,
    pub lines: Vec<LrcEntry>,
}

/// LRC metadata from ID tags
#[derive(Debug, Clone, Default)]
pub struct LrcMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    /// Global offset in milliseconds, can be negative
    pub offset_ms: i64,
}

/// A single time-coded line from an LRC document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcEntry {
    pub start_time_ms: i64,
    pub text: String,
}

impl LrcDocument {
    /// Parse an LRC string.
    ///
    /// Recognizes `[mm:ss.xx]`, `[mm:ss]` and `[mm:ss:xx]` timestamps,
    /// multi-timestamp lines, and the common ID tags. Lines without a
    /// recognizable timestamp are ignored; the result may legitimately
    /// contain zero time-coded lines (a static-text file).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LrcParseError`] when the input holds no content
    /// at all.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(CoreError::LrcParseError {
                reason: "input is empty".to_string(),
            });
        }

        let mut metadata = LrcMetadata::default();
        let mut lines = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((tag, value)) = parse_id_tag(line) {
                match tag.to_lowercase().as_str() {
                    "ti" => metadata.title = Some(value),
                    "ar" => metadata.artist = Some(value),
                    "al" => metadata.album = Some(value),
                    "au" | "by" => metadata.author = Some(value),
                    "offset" => {
                        if let Ok(offset) = value.parse::<i64>() {
                            metadata.offset_ms = offset;
                        }
                    }
                    _ => {} // Ignore unknown tags
                }
                continue;
            }

            if let Some(parsed) = parse_lyric_line(line) {
                lines.extend(parsed);
            }
        }

        if metadata.offset_ms != 0 {
            for entry in &mut lines {
                entry.start_time_ms = (entry.start_time_ms + metadata.offset_ms).max(0);
            }
        }

        lines.sort_by_key(|entry| entry.start_time_ms);

        Ok(Self { metadata, lines })
    }

    /// Convert the time-coded lines into a display [`LyricSet`].
    #[must_use]
    pub fn to_lyric_set(&self) -> LyricSet {
        let raw: Vec<RawSyncedLine> = self
            .lines
            .iter()
            .map(|entry| RawSyncedLine {
                text: Some(entry.text.clone()),
                start_time_ms: entry.start_time_ms,
                end_time_ms: None,
            })
            .collect();
        LyricSet::from_synced_payload(&raw)
    }
}

/// Whether the content carries at least one `[mm:ss.xx]`-style time tag.
///
/// This is the pre-upload check that drives the "synchronization not
/// recognized" warning: a file without tags is still accepted, as static
/// text.
#[must_use]
pub fn has_time_tags(content: &str) -> bool {
    content.lines().any(|line| {
        let line = line.trim();
        line.strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .and_then(|(tag, _)| parse_timestamp(tag))
            .is_some()
    })
}

/// Parse the structured line-list format: a JSON array of
/// `{"text": ..., "startTimeMs": ...}` entries.
///
/// # Errors
///
/// Returns [`CoreError::JsonError`] when the content is not a valid line
/// list.
pub fn parse_json_lines(content: &str) -> Result<Vec<RawSyncedLine>> {
    let lines: Vec<RawSyncedLine> = serde_json::from_str(content)?;
    Ok(lines)
}

/// Build a downloadable LRC template from raw lyric text.
///
/// Every non-blank trimmed line is stamped with a placeholder `[00:00.00]`
/// timestamp: this is a skeleton for a human to fill in externally, not a
/// real alignment.
#[must_use]
pub fn export_template(title: &str, artist: &str, album: &str, raw_text: &str) -> String {
    let mut content = String::new();
    content.push_str(&format!("[ti:{}]\n", non_empty_or(title, "Unknown Title")));
    content.push_str(&format!("[ar:{}]\n", non_empty_or(artist, "Unknown Artist")));
    content.push_str(&format!("[al:{}]\n", non_empty_or(album, "Unknown Album")));
    content.push_str("[by:verselink LRC template]\n\n");

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        content.push_str("[00:00.00]");
        content.push_str(line);
        content.push('\n');
    }

    content
}

/// File name for an exported template: `"{artist} - {title}.lrc"`.
#[must_use]
pub fn template_file_name(artist: &str, title: &str) -> String {
    format!(
        "{} - {}.lrc",
        non_empty_or(artist, "Unknown Artist"),
        non_empty_or(title, "Unknown Title")
    )
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Parse an ID tag like [ti:Title] or [ar:Artist]
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix('[')?;
    let (content, _) = rest.split_once(']')?;
    let (tag, value) = content.split_once(':')?;

    // If the tag part is all digits this is a timestamp, not an ID tag
    if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some((tag.to_string(), value.trim().to_string()))
}

/// Parse a lyric line like `[00:12.34]Hello` or `[00:12.34][00:15.67]Same`.
fn parse_lyric_line(line: &str) -> Option<Vec<LrcEntry>> {
    let mut timestamps = Vec::new();
    let mut remaining = line;

    while let Some(rest) = remaining.strip_prefix('[') {
        let Some((bracket, after)) = rest.split_once(']') else {
            break;
        };
        let Some(time_ms) = parse_timestamp(bracket) else {
            break;
        };
        timestamps.push(time_ms);
        remaining = after;
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = remaining.trim();
    Some(
        timestamps
            .into_iter()
            .map(|start_time_ms| LrcEntry {
                start_time_ms,
                text: text.to_string(),
            })
            .collect(),
    )
}

/// Parse a timestamp like "00:12.34", "00:12" or "00:12:34" to milliseconds.
fn parse_timestamp(s: &str) -> Option<i64> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.as_slice() {
        [minutes, seconds] => {
            let minutes: i64 = parse_digits(minutes)?;
            let (secs, frac_ms) = match seconds.split_once('.') {
                Some((secs, frac)) => (parse_digits(secs)?, parse_fraction_ms(frac)?),
                None => (parse_digits(seconds)?, 0),
            };
            if secs >= 60 {
                return None;
            }
            Some(minutes * 60_000 + secs * 1000 + frac_ms)
        }
        [minutes, seconds, hundredths] => {
            // mm:ss:xx (hundredths)
            let minutes: i64 = parse_digits(minutes)?;
            let secs: i64 = parse_digits(seconds)?;
            let hundredths: i64 = parse_digits(hundredths)?;
            if secs >= 60 {
                return None;
            }
            Some(minutes * 60_000 + secs * 1000 + hundredths * 10)
        }
        _ => None,
    }
}

fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Convert a fractional-seconds suffix to milliseconds: "3" -> 300,
/// "34" -> 340, "345" -> 345. Extra precision is truncated.
fn parse_fraction_ms(frac: &str) -> Option<i64> {
    if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = frac.chars().take(3).collect();
    let value: i64 = digits.parse().ok()?;
    Some(match digits.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    })
}
