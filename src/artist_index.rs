//! Artist -> album -> track grouping for the artist browser.

use std::collections::HashMap;

use crate::song::Song;

/// Label used for songs with an empty artist or album tag.
pub const MISSING_LABEL: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumGroup {
    pub title: String,
    pub tracks: Vec<Song>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistGroup {
    pub name: String,
    pub albums: Vec<AlbumGroup>,
}

impl ArtistGroup {
    pub fn track_count(&self) -> usize {
        self.albums.iter().map(|album| album.tracks.len()).sum()
    }

    /// Every track of the artist, album by album.
    pub fn all_tracks(&self) -> impl Iterator<Item = &Song> {
        self.albums.iter().flat_map(|album| album.tracks.iter())
    }
}

fn label(value: &str) -> &str {
    if value.is_empty() {
        MISSING_LABEL
    } else {
        value
    }
}

/// Groups songs by artist, then album. Groups and tracks keep first-seen order.
pub fn group_by_artist<'a, I>(songs: I) -> Vec<ArtistGroup>
where
    I: IntoIterator<Item = &'a Song>,
{
    let mut artists: Vec<ArtistGroup> = Vec::new();
    let mut artist_slots: HashMap<String, usize> = HashMap::new();
    let mut album_slots: HashMap<(usize, String), usize> = HashMap::new();

    for song in songs {
        let artist_name = label(&song.artist);
        let artist_slot = *artist_slots
            .entry(artist_name.to_string())
            .or_insert_with(|| {
                artists.push(ArtistGroup {
                    name: artist_name.to_string(),
                    albums: Vec::new(),
                });
                artists.len() - 1
            });

        let album_title = label(&song.album);
        let albums = &mut artists[artist_slot].albums;
        let album_slot = *album_slots
            .entry((artist_slot, album_title.to_string()))
            .or_insert_with(|| {
                albums.push(AlbumGroup {
                    title: album_title.to_string(),
                    tracks: Vec::new(),
                });
                albums.len() - 1
            });
        albums[album_slot].tracks.push(song.clone());
    }

    artists
}

#[cfg(test)]
mod tests {
    use super::{group_by_artist, MISSING_LABEL};
    use crate::song::Song;

    fn song(id: &str, artist: &str, album: &str) -> Song {
        Song {
            id: id.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let songs = vec![
            song("1", "Zed", "Later"),
            song("2", "Amy", "First"),
            song("3", "Zed", "Earlier"),
            song("4", "Zed", "Later"),
        ];
        let groups = group_by_artist(&songs);
        let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Amy"]);

        let zed = &groups[0];
        let albums: Vec<&str> = zed.albums.iter().map(|album| album.title.as_str()).collect();
        assert_eq!(albums, vec!["Later", "Earlier"]);
        let later: Vec<&str> = zed.albums[0]
            .tracks
            .iter()
            .map(|track| track.id.as_str())
            .collect();
        assert_eq!(later, vec!["1", "4"]);
        assert_eq!(zed.track_count(), 3);
        assert_eq!(zed.all_tracks().count(), 3);
    }

    #[test]
    fn test_missing_tags_use_placeholder() {
        let songs = vec![song("1", "", "")];
        let groups = group_by_artist(&songs);
        assert_eq!(groups[0].name, MISSING_LABEL);
        assert_eq!(groups[0].albums[0].title, MISSING_LABEL);
    }

    #[test]
    fn test_same_album_name_under_different_artists_stays_separate() {
        let songs = vec![song("1", "A", "Greatest Hits"), song("2", "B", "Greatest Hits")];
        let groups = group_by_artist(&songs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].albums.len(), 1);
        assert_eq!(groups[1].albums.len(), 1);
    }
}
