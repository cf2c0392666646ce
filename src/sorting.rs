//! Sort engine for list views.
//!
//! Every field has a canonical comparator used for the `desc` direction,
//! carrying the full tie-break chain. The `asc` direction is a reversed
//! compare on the primary field only unless [`AscendingMode::Mirrored`] is
//! selected. All sorts are stable.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;

use crate::metadata_tags::parse_leading_int;
use crate::song::Song;

/// Column a list view can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Title,
    Artist,
    Album,
    Track,
    /// Sample rate.
    Hertz,
    Date,
    /// Favor rating.
    Fave,
    DateAdded,
}

impl SortField {
    pub const ALL: [SortField; 8] = [
        SortField::Title,
        SortField::Artist,
        SortField::Album,
        SortField::Track,
        SortField::Hertz,
        SortField::Date,
        SortField::Fave,
        SortField::DateAdded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Artist => "artist",
            SortField::Album => "album",
            SortField::Track => "track",
            SortField::Hertz => "hertz",
            SortField::Date => "date",
            SortField::Fave => "fave",
            SortField::DateAdded => "dateAdded",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort selection for list views. Round-trips through strings like `"artist-desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortKey {
    /// Catalog order, untouched.
    #[default]
    Default,
    By {
        field: SortField,
        direction: SortDirection,
    },
}

impl SortKey {
    pub fn desc(field: SortField) -> Self {
        SortKey::By {
            field,
            direction: SortDirection::Desc,
        }
    }

    pub fn asc(field: SortField) -> Self {
        SortKey::By {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Header-click transition: `desc` on the same field flips to `asc`, anything else starts at `desc`.
    pub fn toggled_for(self, field: SortField) -> Self {
        if self == SortKey::desc(field) {
            SortKey::asc(field)
        } else {
            SortKey::desc(field)
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Default => f.write_str("default"),
            SortKey::By { field, direction } => {
                let direction = match direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                write!(f, "{}-{}", field.as_str(), direction)
            }
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text == "default" {
            return Ok(SortKey::Default);
        }
        let (field, direction) = text
            .rsplit_once('-')
            .ok_or_else(|| format!("invalid sort key '{}'", text))?;
        let field = SortField::parse(field)
            .ok_or_else(|| format!("unknown sort field '{}' in '{}'", field, text))?;
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(format!("unknown sort direction '{}' in '{}'", other, text)),
        };
        Ok(SortKey::By { field, direction })
    }
}

impl TryFrom<String> for SortKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

/// How the `asc` direction is derived from a field's canonical comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AscendingMode {
    /// Reverse compare on the primary field only; ties keep their current order.
    #[default]
    PrimaryOnly,
    /// Exact reverse of the canonical comparator, tie-breaks included.
    Mirrored,
}

type SongComparator = fn(&Song, &Song) -> Ordering;

/// Comparators registered for one sort field.
struct FieldComparators {
    /// Full tie-break chain, used for `desc`.
    canonical: SongComparator,
    /// Primary field only.
    primary: SongComparator,
}

fn comparators_for(field: SortField) -> FieldComparators {
    match field {
        SortField::Title => FieldComparators {
            canonical: compare_title,
            primary: compare_title,
        },
        SortField::Artist => FieldComparators {
            canonical: compare_artist_chain,
            primary: compare_artist,
        },
        SortField::Album | SortField::Track => FieldComparators {
            canonical: compare_album_chain,
            primary: compare_album,
        },
        SortField::Hertz => FieldComparators {
            canonical: compare_hertz,
            primary: compare_hertz,
        },
        SortField::Date => FieldComparators {
            canonical: compare_date,
            primary: compare_date,
        },
        SortField::Fave => FieldComparators {
            canonical: compare_fave,
            primary: compare_fave,
        },
        SortField::DateAdded => FieldComparators {
            canonical: compare_date_added,
            primary: compare_date_added,
        },
    }
}

/// Case-folded compare with a raw compare as tie-break, so the order is total.
fn collate(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
        .then_with(|| left.cmp(right))
}

fn compare_title(left: &Song, right: &Song) -> Ordering {
    collate(&left.title, &right.title)
}

fn compare_artist(left: &Song, right: &Song) -> Ordering {
    left.artist.cmp(&right.artist)
}

fn compare_album(left: &Song, right: &Song) -> Ordering {
    left.album.cmp(&right.album)
}

fn compare_album_chain(left: &Song, right: &Song) -> Ordering {
    compare_album(left, right).then_with(|| left.track_number.cmp(&right.track_number))
}

fn compare_artist_chain(left: &Song, right: &Song) -> Ordering {
    compare_artist(left, right).then_with(|| compare_album_chain(left, right))
}

fn compare_hertz(left: &Song, right: &Song) -> Ordering {
    parse_leading_int(&left.sample_rate).cmp(&parse_leading_int(&right.sample_rate))
}

fn compare_date(left: &Song, right: &Song) -> Ordering {
    parse_leading_int(&left.date).cmp(&parse_leading_int(&right.date))
}

fn compare_fave(left: &Song, right: &Song) -> Ordering {
    left.favor_rating.cmp(&right.favor_rating)
}

fn compare_date_added(left: &Song, right: &Song) -> Ordering {
    date_added_millis(&left.date_added).cmp(&date_added_millis(&right.date_added))
}

/// Milliseconds since the epoch for an RFC 3339 timestamp; unparsable values count as 0.
pub fn date_added_millis(text: &str) -> i64 {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|instant| instant.timestamp_millis())
        .unwrap_or(0)
}

/// Compares two songs under `key`.
pub fn compare_songs(left: &Song, right: &Song, key: SortKey, mode: AscendingMode) -> Ordering {
    let SortKey::By { field, direction } = key else {
        return Ordering::Equal;
    };
    let comparators = comparators_for(field);
    match (direction, mode) {
        (SortDirection::Desc, _) => (comparators.canonical)(left, right),
        (SortDirection::Asc, AscendingMode::PrimaryOnly) => (comparators.primary)(right, left),
        (SortDirection::Asc, AscendingMode::Mirrored) => (comparators.canonical)(right, left),
    }
}

/// Stable in-place sort with the default ascending behavior.
pub fn sort_songs<S: Borrow<Song>>(songs: &mut [S], key: SortKey) {
    sort_songs_with(songs, key, AscendingMode::default());
}

/// Stable in-place sort. `SortKey::Default` leaves the slice untouched.
pub fn sort_songs_with<S: Borrow<Song>>(songs: &mut [S], key: SortKey, mode: AscendingMode) {
    if key == SortKey::Default {
        return;
    }
    songs.sort_by(|left, right| compare_songs(left.borrow(), right.borrow(), key, mode));
}

#[cfg(test)]
mod tests {
    use super::{
        date_added_millis, sort_songs, sort_songs_with, AscendingMode, SortDirection, SortField,
        SortKey,
    };
    use crate::song::{FavorRating, Song};

    fn titled(id: &str, title: &str) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            ..Song::default()
        }
    }

    fn tracked(id: &str, artist: &str, album: &str, track_number: u32) -> Song {
        Song {
            id: id.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            track_number,
            ..Song::default()
        }
    }

    fn ids(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|song| song.id.as_str()).collect()
    }

    #[test]
    fn test_sort_key_string_round_trip() {
        for field in SortField::ALL {
            for key in [SortKey::desc(field), SortKey::asc(field)] {
                assert_eq!(key.to_string().parse::<SortKey>(), Ok(key));
            }
        }
        assert_eq!("default".parse::<SortKey>(), Ok(SortKey::Default));
        assert_eq!(
            "dateAdded-asc".parse::<SortKey>(),
            Ok(SortKey::By {
                field: SortField::DateAdded,
                direction: SortDirection::Asc
            })
        );
        assert!("title-sideways".parse::<SortKey>().is_err());
        assert!("genre-desc".parse::<SortKey>().is_err());
        assert!("title".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_toggle_alternates_desc_and_asc() {
        let key = SortKey::Default.toggled_for(SortField::Title);
        assert_eq!(key, SortKey::desc(SortField::Title));
        let key = key.toggled_for(SortField::Title);
        assert_eq!(key, SortKey::asc(SortField::Title));
        assert_eq!(key.toggled_for(SortField::Title), SortKey::desc(SortField::Title));
        assert_eq!(key.toggled_for(SortField::Artist), SortKey::desc(SortField::Artist));
    }

    #[test]
    fn test_title_desc_is_alphabetical() {
        let mut songs = vec![titled("b", "B"), titled("a", "A"), titled("c", "C")];
        sort_songs(&mut songs, SortKey::desc(SortField::Title));
        assert_eq!(ids(&songs), vec!["a", "b", "c"]);

        sort_songs(&mut songs, SortKey::asc(SortField::Title));
        assert_eq!(ids(&songs), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_title_compare_folds_case() {
        let mut songs = vec![titled("upper", "Beta"), titled("lower", "alpha")];
        sort_songs(&mut songs, SortKey::desc(SortField::Title));
        assert_eq!(ids(&songs), vec!["lower", "upper"]);
    }

    #[test]
    fn test_artist_desc_uses_album_and_track_tie_breaks() {
        let mut songs = vec![
            tracked("b2", "Band", "Second", 2),
            tracked("a1", "Act", "Only", 1),
            tracked("b1", "Band", "First", 1),
            tracked("b3", "Band", "Second", 1),
        ];
        sort_songs(&mut songs, SortKey::desc(SortField::Artist));
        assert_eq!(ids(&songs), vec!["a1", "b1", "b3", "b2"]);
    }

    #[test]
    fn test_artist_asc_only_reverses_primary_field() {
        let mut songs = vec![
            tracked("b2", "Band", "Second", 2),
            tracked("a1", "Act", "Only", 1),
            tracked("b1", "Band", "First", 1),
        ];
        sort_songs(&mut songs, SortKey::asc(SortField::Artist));
        // Ties within "Band" keep their input order.
        assert_eq!(ids(&songs), vec!["b2", "b1", "a1"]);
    }

    #[test]
    fn test_mirrored_ascending_reverses_full_chain() {
        let mut songs = vec![
            tracked("b1", "Band", "First", 1),
            tracked("a1", "Act", "Only", 1),
            tracked("b2", "Band", "Second", 2),
        ];
        sort_songs_with(
            &mut songs,
            SortKey::asc(SortField::Artist),
            AscendingMode::Mirrored,
        );
        assert_eq!(ids(&songs), vec!["b2", "b1", "a1"]);
    }

    #[test]
    fn test_track_and_album_share_album_chain() {
        let mut songs = vec![
            tracked("x2", "", "X", 2),
            tracked("w9", "", "W", 9),
            tracked("x1", "", "X", 1),
        ];
        let mut by_album = songs.clone();
        sort_songs(&mut songs, SortKey::desc(SortField::Track));
        sort_songs(&mut by_album, SortKey::desc(SortField::Album));
        assert_eq!(ids(&songs), vec!["w9", "x1", "x2"]);
        assert_eq!(ids(&songs), ids(&by_album));
    }

    #[test]
    fn test_hertz_and_date_treat_garbage_as_zero() {
        let mut songs = vec![
            Song {
                id: "48k".to_string(),
                sample_rate: "48000".to_string(),
                ..Song::default()
            },
            Song {
                id: "bad".to_string(),
                sample_rate: "n/a".to_string(),
                ..Song::default()
            },
            Song {
                id: "44k".to_string(),
                sample_rate: "44100".to_string(),
                ..Song::default()
            },
        ];
        sort_songs(&mut songs, SortKey::desc(SortField::Hertz));
        assert_eq!(ids(&songs), vec!["bad", "44k", "48k"]);

        let mut dated = vec![
            Song {
                id: "full".to_string(),
                date: "1998-10-31".to_string(),
                ..Song::default()
            },
            Song {
                id: "year".to_string(),
                date: "1997".to_string(),
                ..Song::default()
            },
            Song {
                id: "text".to_string(),
                date: "unknown".to_string(),
                ..Song::default()
            },
        ];
        sort_songs(&mut dated, SortKey::desc(SortField::Date));
        assert_eq!(ids(&dated), vec!["text", "year", "full"]);
    }

    #[test]
    fn test_fave_and_date_added_order() {
        let mut songs = vec![
            Song {
                id: "loved".to_string(),
                favor_rating: FavorRating::Loved,
                date_added: "2024-03-01T00:00:00.000Z".to_string(),
                ..Song::default()
            },
            Song {
                id: "plain".to_string(),
                date_added: "2024-01-01T00:00:00.000Z".to_string(),
                ..Song::default()
            },
            Song {
                id: "liked".to_string(),
                favor_rating: FavorRating::Liked,
                date_added: "2024-02-01T05:00:00+05:00".to_string(),
                ..Song::default()
            },
        ];
        sort_songs(&mut songs, SortKey::desc(SortField::Fave));
        assert_eq!(ids(&songs), vec!["plain", "liked", "loved"]);

        sort_songs(&mut songs, SortKey::asc(SortField::DateAdded));
        assert_eq!(ids(&songs), vec!["loved", "liked", "plain"]);
    }

    #[test]
    fn test_date_added_millis_defaults_to_zero() {
        assert_eq!(date_added_millis("not a date"), 0);
        assert_eq!(date_added_millis("1970-01-01T00:00:01.000Z"), 1_000);
    }

    #[test]
    fn test_equal_keys_keep_input_order_for_every_key() {
        let songs: Vec<Song> = (0..6).map(|index| titled(&index.to_string(), "")).collect();
        let mut keys = vec![SortKey::Default];
        for field in SortField::ALL {
            keys.push(SortKey::desc(field));
            keys.push(SortKey::asc(field));
        }
        for key in keys {
            let mut sorted = songs.clone();
            sort_songs(&mut sorted, key);
            assert_eq!(ids(&sorted), ids(&songs), "unstable for {}", key);
        }
    }

    #[test]
    fn test_sort_accepts_borrowed_songs_and_empty_input() {
        let owned = vec![titled("b", "B"), titled("a", "A")];
        let mut borrowed: Vec<&Song> = owned.iter().collect();
        sort_songs(&mut borrowed, SortKey::desc(SortField::Title));
        assert_eq!(borrowed[0].id, "a");

        let mut empty: Vec<Song> = Vec::new();
        sort_songs(&mut empty, SortKey::desc(SortField::Artist));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_sort_key_serde_uses_string_form() {
        let json = serde_json::to_string(&SortKey::desc(SortField::Hertz)).expect("serialize");
        assert_eq!(json, "\"hertz-desc\"");
        let parsed: SortKey = serde_json::from_str("\"album-asc\"").expect("deserialize");
        assert_eq!(parsed, SortKey::asc(SortField::Album));
    }
}
