//! Ordered insertion into the master catalog.
//!
//! The catalog's durable order is album ascending, then track number ascending.
//! It is maintained one song at a time and never re-derived with a full sort.

use std::collections::HashSet;

use crate::song::{FavorRating, Song};

/// Where an upserted song ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New id, spliced at the ordered position.
    Inserted { index: usize },
    /// Known id, content replaced at its existing slot.
    Updated { index: usize },
}

impl UpsertOutcome {
    pub fn index(self) -> usize {
        match self {
            UpsertOutcome::Inserted { index } | UpsertOutcome::Updated { index } => index,
        }
    }
}

/// Position at which `song` keeps the catalog in album/track order.
///
/// Albums compare by raw string order (case-sensitive); ties fall through to
/// the track number. A song with the same key as existing entries lands in
/// front of them.
pub fn insertion_index(catalog: &[Song], song: &Song) -> usize {
    let mut cursor = 0;
    while cursor < catalog.len() && catalog[cursor].album < song.album {
        cursor += 1;
    }
    while cursor < catalog.len()
        && catalog[cursor].album == song.album
        && catalog[cursor].track_number < song.track_number
    {
        cursor += 1;
    }
    cursor
}

/// Splices `song` in at its ordered position and returns that position.
pub fn insert_in_order(catalog: &mut Vec<Song>, song: Song) -> usize {
    let index = insertion_index(catalog, &song);
    catalog.insert(index, song);
    index
}

pub fn position_of(catalog: &[Song], id: &str) -> Option<usize> {
    catalog.iter().position(|existing| existing.id == id)
}

/// Inserts a new song, or replaces the content of an existing one in place.
///
/// An existing entry keeps its slot and its original `date_added`.
pub fn upsert(catalog: &mut Vec<Song>, mut song: Song) -> UpsertOutcome {
    match position_of(catalog, &song.id) {
        Some(index) => {
            let existing = &mut catalog[index];
            song.date_added = std::mem::take(&mut existing.date_added);
            *existing = song;
            UpsertOutcome::Updated { index }
        }
        None => UpsertOutcome::Inserted {
            index: insert_in_order(catalog, song),
        },
    }
}

/// Moves an existing song so its slot reflects its current album/track.
///
/// Only called when the caller explicitly wants repositioning after an update.
pub fn reposition(catalog: &mut Vec<Song>, id: &str) -> Option<usize> {
    let index = position_of(catalog, id)?;
    let song = catalog.remove(index);
    Some(insert_in_order(catalog, song))
}

/// Drops every song whose id is in `ids`, keeping survivors in order.
pub fn remove_songs(catalog: &mut Vec<Song>, ids: &HashSet<String>) -> usize {
    let before = catalog.len();
    catalog.retain(|song| !ids.contains(&song.id));
    before - catalog.len()
}

/// Advances a song's favor rating in place and returns the new value.
pub fn cycle_favor_rating(catalog: &mut [Song], id: &str) -> Option<FavorRating> {
    let song = catalog.iter_mut().find(|song| song.id == id)?;
    song.favor_rating = song.favor_rating.cycle();
    Some(song.favor_rating)
}
