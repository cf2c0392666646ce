//! Normalization of extractor payloads into catalog songs.
//!
//! Tag extraction itself happens outside this crate; the extractor hands back
//! one JSON document per file. Everything numeric is coerced here so the
//! library core never sees a parse failure.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::song::{song_id_for_path, FavorRating, Song};

const SUPPORTED_AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "ogg", "aac", "flac", "wav", "m4a"];

/// Cover-art details reported by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VisualInfo {
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Raw per-file metadata document produced by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataPayload {
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sample_rate: String,
    /// Free-form tag map keyed by tag name (`TrackTitle`, `Album`, ...).
    #[serde(default)]
    pub meta_tags: HashMap<String, String>,
    #[serde(default)]
    pub visual_info: Option<VisualInfo>,
}

impl MetadataPayload {
    fn tag(&self, key: &str) -> String {
        self.meta_tags
            .get(key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }

    fn numeric_tag(&self, key: &str) -> u32 {
        parse_tag_u32(self.meta_tags.get(key).map(String::as_str).unwrap_or(""))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => number.to_string(),
        _ => String::new(),
    })
}

/// Parses the leading integer of a string, ignoring anything after it.
///
/// `"3/12"` -> 3, `"1998-10-31"` -> 1998, `"  -4x"` -> -4, `"abc"` -> 0.
pub fn parse_leading_int(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Leading-integer parse clamped into `u32`; negatives and garbage become 0.
pub fn parse_tag_u32(text: &str) -> u32 {
    u32::try_from(parse_leading_int(text).max(0)).unwrap_or(u32::MAX)
}

/// Returns true when the file name carries an audio extension the library indexes.
pub fn is_supported_audio_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Parses one extractor JSON document.
pub fn parse_metadata_payload(json: &str) -> Result<MetadataPayload, String> {
    if json.trim().is_empty() {
        return Err("empty metadata payload".to_string());
    }
    serde_json::from_str(json).map_err(|err| format!("invalid metadata payload: {}", err))
}

/// Builds a catalog song from an extractor payload.
pub fn song_from_metadata(
    path: &str,
    file: &str,
    payload: &MetadataPayload,
    date_added: String,
) -> Song {
    Song {
        id: song_id_for_path(path),
        path: path.to_string(),
        file: file.to_string(),
        title: payload.tag("TrackTitle"),
        album: payload.tag("Album"),
        artist: payload.tag("Artist"),
        genre: payload.tag("Genre"),
        date: payload.tag("Date"),
        encoder: payload.tag("Encoder"),
        codec: payload.codec.clone(),
        sample_rate: payload.sample_rate.clone(),
        duration: payload.duration.clone(),
        track_number: payload.numeric_tag("TrackNumber"),
        track_total: payload.numeric_tag("TrackTotal"),
        side: payload.numeric_tag("Side"),
        compilation: payload.numeric_tag("Compilation"),
        bpm: payload.numeric_tag("Bpm"),
        favor_rating: FavorRating::Unrated,
        date_added,
        start_time: 0,
        visuals_path: payload
            .visual_info
            .as_ref()
            .and_then(|info| info.image_path.clone())
            .filter(|image_path| !image_path.trim().is_empty()),
    }
}

/// Parses a payload and builds the song, or `None` when the candidate must be skipped.
pub fn song_from_metadata_json(
    path: &str,
    file: &str,
    json: &str,
    date_added: String,
) -> Option<Song> {
    if !is_supported_audio_file(file) {
        return None;
    }
    let payload = parse_metadata_payload(json).ok()?;
    Some(song_from_metadata(path, file, &payload, date_added))
}
