//! Catalog entity shared by every library component.
//!
//! A `Song` is produced at the metadata boundary (see `metadata_tags`) and is
//! treated as a plain bag of data by the insertion, sort, search and tree code.

use chrono::{SecondsFormat, Utc};

/// Tri-state user rating. Cycles `Unrated -> Liked -> Loved -> Unrated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FavorRating {
    #[default]
    Unrated,
    Liked,
    Loved,
}

impl FavorRating {
    /// Next rating in the 0 -> 1 -> 2 -> 0 cycle.
    pub fn cycle(self) -> Self {
        match self {
            FavorRating::Unrated => FavorRating::Liked,
            FavorRating::Liked => FavorRating::Loved,
            FavorRating::Loved => FavorRating::Unrated,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FavorRating::Unrated => 0,
            FavorRating::Liked => 1,
            FavorRating::Loved => 2,
        }
    }

    /// Lenient conversion used when reading stored rows; unknown values map to `Unrated`.
    pub fn from_u8_lossy(value: i64) -> Self {
        u8::try_from(value)
            .ok()
            .and_then(|value| Self::try_from(value).ok())
            .unwrap_or_default()
    }
}

impl TryFrom<u8> for FavorRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FavorRating::Unrated),
            1 => Ok(FavorRating::Liked),
            2 => Ok(FavorRating::Loved),
            other => Err(format!("favor rating must be 0, 1 or 2, got {}", other)),
        }
    }
}

impl From<FavorRating> for u8 {
    fn from(rating: FavorRating) -> Self {
        rating.as_u8()
    }
}

/// One audio file known to the library.
///
/// Serialized field names follow the camelCase row contract used by the
/// extractor payloads and the persisted `songs` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Song {
    /// md5 of `path`; see [`song_id_for_path`].
    pub id: String,
    pub path: String,
    /// Basename of `path`.
    pub file: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub genre: String,
    /// Free text, not guaranteed to be numeric.
    pub date: String,
    pub encoder: String,
    pub codec: String,
    pub sample_rate: String,
    pub duration: String,
    pub track_number: u32,
    pub track_total: u32,
    pub side: u32,
    pub compilation: u32,
    pub bpm: u32,
    pub favor_rating: FavorRating,
    /// ISO-8601 instant of first insertion. Kept across rescans.
    pub date_added: String,
    /// Playback resume offset in seconds.
    pub start_time: u64,
    pub visuals_path: Option<String>,
}

impl Song {
    /// Creates a song with identity fields derived from `path` and everything else defaulted.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: song_id_for_path(&path),
            file: file_name_of(&path).to_string(),
            path,
            ..Self::default()
        }
    }
}

/// Content-derived id for a song path.
pub fn song_id_for_path(path: &str) -> String {
    format!("{:x}", md5::compute(path.as_bytes()))
}

/// Last non-empty `/`-separated segment of a path.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

/// Current instant formatted like the `dateAdded` column (`2024-01-31T10:00:00.000Z`).
pub fn now_iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::{file_name_of, song_id_for_path, FavorRating, Song};

    #[test]
    fn test_song_id_is_stable_for_same_path() {
        let first = song_id_for_path("/Music/ArtistX/AlbumY/01 Song.mp3");
        let second = song_id_for_path("/Music/ArtistX/AlbumY/01 Song.mp3");
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert_ne!(first, song_id_for_path("/Music/ArtistX/AlbumY/02 Song.mp3"));
    }

    #[test]
    fn test_new_song_derives_identity_from_path() {
        let song = Song::new("/Music/ArtistX/AlbumY/01 Song.mp3");
        assert_eq!(song.file, "01 Song.mp3");
        assert_eq!(song.id, song_id_for_path("/Music/ArtistX/AlbumY/01 Song.mp3"));
        assert_eq!(song.track_number, 0);
        assert_eq!(song.favor_rating, FavorRating::Unrated);
    }

    #[test]
    fn test_file_name_ignores_trailing_separator() {
        assert_eq!(file_name_of("/a/b/"), "b");
        assert_eq!(file_name_of(""), "");
    }

    #[test]
    fn test_favor_rating_cycles_through_three_states() {
        let rating = FavorRating::Unrated;
        assert_eq!(rating.cycle(), FavorRating::Liked);
        assert_eq!(rating.cycle().cycle(), FavorRating::Loved);
        assert_eq!(rating.cycle().cycle().cycle(), FavorRating::Unrated);
    }

    #[test]
    fn test_favor_rating_serializes_as_integer() {
        let mut song = Song::new("/a.mp3");
        song.favor_rating = FavorRating::Loved;
        let json = serde_json::to_value(&song).expect("song should serialize");
        assert_eq!(json["favorRating"], 2);
        assert_eq!(json["trackNumber"], 0);

        let bad = r#"{"id":"x","favorRating":7}"#;
        assert!(serde_json::from_str::<Song>(bad).is_err());
    }

    #[test]
    fn test_lossy_rating_conversion_defaults_unknown_values() {
        assert_eq!(FavorRating::from_u8_lossy(1), FavorRating::Liked);
        assert_eq!(FavorRating::from_u8_lossy(9), FavorRating::Unrated);
        assert_eq!(FavorRating::from_u8_lossy(-1), FavorRating::Unrated);
    }
}
