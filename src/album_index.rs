//! Album grouping for the album browser.

use std::collections::HashMap;

use crate::song::Song;

/// One album card: title, lead artist, newest date and its songs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumSummary {
    pub title: String,
    /// Artist of the first song seen on the album.
    pub artist: String,
    /// Largest `date` tag among the album's songs, by string order.
    pub date: String,
    pub songs: Vec<Song>,
}

/// Groups songs by album title. Albums and their songs keep first-seen order.
pub fn group_by_album<'a, I>(songs: I) -> Vec<AlbumSummary>
where
    I: IntoIterator<Item = &'a Song>,
{
    let mut albums: Vec<AlbumSummary> = Vec::new();
    let mut slots: HashMap<&'a str, usize> = HashMap::new();

    for song in songs {
        match slots.get(song.album.as_str()) {
            Some(&slot) => {
                let album = &mut albums[slot];
                if album.date < song.date {
                    album.date = song.date.clone();
                }
                album.songs.push(song.clone());
            }
            None => {
                slots.insert(song.album.as_str(), albums.len());
                albums.push(AlbumSummary {
                    title: song.album.clone(),
                    artist: song.artist.clone(),
                    date: song.date.clone(),
                    songs: vec![song.clone()],
                });
            }
        }
    }

    albums
}

#[cfg(test)]
mod tests {
    use super::group_by_album;
    use crate::song::Song;

    fn song(id: &str, album: &str, artist: &str, date: &str) -> Song {
        Song {
            id: id.to_string(),
            album: album.to_string(),
            artist: artist.to_string(),
            date: date.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn test_album_date_is_latest_seen() {
        let songs = vec![
            song("1", "Live", "Band", "1998"),
            song("2", "Live", "Guest", "2003-05-01"),
            song("3", "Live", "Band", "2001"),
        ];
        let albums = group_by_album(&songs);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].date, "2003-05-01");
        assert_eq!(albums[0].artist, "Band");
        let ids: Vec<&str> = albums[0].songs.iter().map(|song| song.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_albums_keep_first_seen_order() {
        let songs = vec![
            song("1", "Zeta", "A", ""),
            song("2", "Alpha", "B", "1990"),
            song("3", "Zeta", "A", "1985"),
        ];
        let titles: Vec<String> = group_by_album(&songs)
            .into_iter()
            .map(|album| album.title)
            .collect();
        assert_eq!(titles, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_empty_input_yields_no_albums() {
        assert!(group_by_album(&Vec::<Song>::new()).is_empty());
    }
}
