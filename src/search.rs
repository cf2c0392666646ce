//! Substring search over title, artist and album.

use std::borrow::Cow;

use crate::song::Song;

/// Lowercases and trims a raw search box value.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

pub fn song_matches(song: &Song, normalized_query: &str) -> bool {
    song.title.to_lowercase().contains(normalized_query)
        || song.artist.to_lowercase().contains(normalized_query)
        || song.album.to_lowercase().contains(normalized_query)
}

/// Songs whose title, artist or album contains `query`, in catalog order.
///
/// A blank query borrows the whole catalog instead of copying it.
pub fn filter_songs<'a>(catalog: &'a [Song], query: &str) -> Cow<'a, [Song]> {
    let normalized_query = normalize_query(query);
    if normalized_query.is_empty() {
        return Cow::Borrowed(catalog);
    }
    Cow::Owned(
        catalog
            .iter()
            .filter(|song| song_matches(song, &normalized_query))
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{filter_songs, normalize_query};
    use crate::song::Song;

    fn song(id: &str, title: &str, artist: &str, album: &str) -> Song {
        Song {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            ..Song::default()
        }
    }

    fn catalog() -> Vec<Song> {
        vec![
            song("1", "Abcdef", "Someone", "Records"),
            song("2", "Other", "The ABC Band", "Live"),
            song("3", "Tune", "Nobody", "abc sessions"),
            song("4", "Quiet", "Nobody", "Nothing"),
        ]
    }

    fn ids(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|song| song.id.as_str()).collect()
    }

    #[test]
    fn test_normalize_query_trims_and_lowercases() {
        assert_eq!(normalize_query("  MiXeD Case \t"), "mixed case");
    }

    #[test]
    fn test_blank_query_borrows_full_catalog() {
        let songs = catalog();
        for query in ["", "   "] {
            let filtered = filter_songs(&songs, query);
            assert!(matches!(filtered, Cow::Borrowed(_)));
            assert_eq!(filtered.len(), songs.len());
        }
    }

    #[test]
    fn test_matches_any_of_title_artist_album() {
        let songs = catalog();
        assert_eq!(ids(&filter_songs(&songs, "abc")), vec!["1", "2", "3"]);
        assert!(filter_songs(&songs, "zzz").is_empty());
    }

    #[test]
    fn test_filter_is_case_insensitive_and_trims() {
        let songs = catalog();
        let upper = filter_songs(&songs, "ABC").into_owned();
        let lower = filter_songs(&songs, "abc").into_owned();
        let padded = filter_songs(&songs, " abc ").into_owned();
        assert_eq!(upper, lower);
        assert_eq!(lower, padded);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let songs = catalog();
        let once = filter_songs(&songs, "nobody").into_owned();
        let twice = filter_songs(&once, "nobody").into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_on_empty_catalog() {
        let songs: Vec<Song> = Vec::new();
        assert!(filter_songs(&songs, "abc").is_empty());
        assert!(filter_songs(&songs, "").is_empty());
    }
}
