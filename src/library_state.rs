//! Owned library state: the master catalog plus every view derived from it.
//!
//! All writes go through [`LibraryState`]. After each write the derived views
//! are recomputed in a fixed order: filter, sort, tree build, flatten.

use std::collections::HashSet;

use log::debug;

use crate::album_index::{group_by_album, AlbumSummary};
use crate::artist_index::{group_by_artist, ArtistGroup};
use crate::catalog::{self, UpsertOutcome};
use crate::cursor::RowCursor;
use crate::file_tree::FileTree;
use crate::protocol::{CatalogStats, TreeRow};
use crate::search::{filter_songs, normalize_query};
use crate::song::{FavorRating, Song};
use crate::sorting::{sort_songs_with, AscendingMode, SortKey};
use crate::tree_index::TreeIndex;

/// What happens to folder collapse state when the tree is rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeRebuildPolicy {
    /// Every rebuild starts fully expanded.
    #[default]
    Discard,
    /// Folders closed before a rebuild stay closed when their path still exists.
    PreserveClosedPaths,
}

impl TreeRebuildPolicy {
    pub fn from_flag(preserve_closed_folders: bool) -> Self {
        if preserve_closed_folders {
            TreeRebuildPolicy::PreserveClosedPaths
        } else {
            TreeRebuildPolicy::Discard
        }
    }
}

/// Cursor movement requested by a list or tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    First,
    Last,
}

/// Result counts of a batch import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone)]
pub struct LibraryState {
    catalog: Vec<Song>,
    query: String,
    sort_key: SortKey,
    ascending_mode: AscendingMode,
    rebuild_policy: TreeRebuildPolicy,
    displayed: Vec<Song>,
    tree: FileTree,
    tree_index: TreeIndex,
    list_cursor: RowCursor,
    tree_cursor: RowCursor,
}

impl LibraryState {
    pub fn new(
        sort_key: SortKey,
        ascending_mode: AscendingMode,
        rebuild_policy: TreeRebuildPolicy,
    ) -> Self {
        let mut state = Self {
            catalog: Vec::new(),
            query: String::new(),
            sort_key,
            ascending_mode,
            rebuild_policy,
            displayed: Vec::new(),
            tree: FileTree::default(),
            tree_index: TreeIndex::default(),
            list_cursor: RowCursor::default(),
            tree_cursor: RowCursor::default(),
        };
        state.recompute();
        state
    }

    /// Replaces the catalog with `songs`, ordering them by album and track.
    pub fn load_catalog<I>(&mut self, songs: I)
    where
        I: IntoIterator<Item = Song>,
    {
        self.catalog.clear();
        for song in songs {
            catalog::upsert(&mut self.catalog, song);
        }
        self.recompute();
    }

    pub fn insert_song(&mut self, song: Song) -> UpsertOutcome {
        let outcome = catalog::upsert(&mut self.catalog, song);
        self.recompute();
        outcome
    }

    /// Upserts a batch and recomputes the views once.
    pub fn import_songs<I>(&mut self, songs: I) -> ImportSummary
    where
        I: IntoIterator<Item = Song>,
    {
        let mut summary = ImportSummary::default();
        for song in songs {
            match catalog::upsert(&mut self.catalog, song) {
                UpsertOutcome::Inserted { .. } => summary.inserted += 1,
                UpsertOutcome::Updated { .. } => summary.updated += 1,
            }
        }
        self.recompute();
        summary
    }

    /// Moves a song so its slot reflects its current album and track.
    pub fn reposition_song(&mut self, id: &str) -> Option<usize> {
        let index = catalog::reposition(&mut self.catalog, id)?;
        self.recompute();
        Some(index)
    }

    /// Empties the catalog and resets both cursors. Returns how many songs were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.catalog.len();
        self.catalog.clear();
        self.list_cursor = RowCursor::default();
        self.tree_cursor = RowCursor::default();
        self.recompute();
        removed
    }

    pub fn remove_songs(&mut self, ids: &HashSet<String>) -> usize {
        let removed = catalog::remove_songs(&mut self.catalog, ids);
        if removed > 0 {
            self.recompute();
        }
        removed
    }

    pub fn cycle_favor_rating(&mut self, id: &str) -> Option<FavorRating> {
        let rating = catalog::cycle_favor_rating(&mut self.catalog, id)?;
        self.recompute();
        Some(rating)
    }

    pub fn set_search_query(&mut self, query: &str) {
        let normalized = normalize_query(query);
        if normalized == self.query {
            return;
        }
        self.query = normalized;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
        self.recompute();
    }

    pub fn set_ascending_mode(&mut self, ascending_mode: AscendingMode) {
        if self.ascending_mode != ascending_mode {
            self.ascending_mode = ascending_mode;
            self.recompute();
        }
    }

    pub fn set_rebuild_policy(&mut self, rebuild_policy: TreeRebuildPolicy) {
        self.rebuild_policy = rebuild_policy;
    }

    /// Opens or closes the directory shown at `row`. Returns the new closed state.
    ///
    /// Leaf rows and out-of-range rows are ignored. A song node that also has
    /// children collapses like a folder.
    pub fn toggle_node(&mut self, row: usize) -> Option<bool> {
        let id = self.tree_index.node_at(row)?;
        if self.tree.node(id)?.children.is_empty() {
            return None;
        }
        let is_closed = self.tree.toggle_closed(id)?;
        self.tree_index = TreeIndex::flatten_into(&mut self.tree);
        self.tree_cursor.clamp(self.tree_index.node_count());
        Some(is_closed)
    }

    /// Songs at or below the node shown at `row`, in tree order.
    pub fn folder_songs(&self, row: usize) -> Vec<Song> {
        self.tree_index
            .node_at(row)
            .map(|id| self.tree.songs_under(id).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn artists(&self) -> Vec<ArtistGroup> {
        group_by_artist(&self.displayed)
    }

    pub fn albums(&self) -> Vec<AlbumSummary> {
        group_by_album(&self.displayed)
    }

    /// Visible tree rows in display order.
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        self.tree_index
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(row, id)| {
                let node = self.tree.node(*id)?;
                Some(TreeRow {
                    row,
                    node: *id,
                    name: node.name.clone(),
                    path: self.tree.node_path(*id)?,
                    level: node.level,
                    is_closed: node.is_closed,
                    song_id: node.song.as_ref().map(|song| song.id.clone()),
                })
            })
            .collect()
    }

    pub fn move_list_cursor(&mut self, movement: CursorMove) -> usize {
        let len = self.displayed.len();
        apply_cursor_move(&mut self.list_cursor, movement, len)
    }

    pub fn move_tree_cursor(&mut self, movement: CursorMove) -> usize {
        let len = self.tree_index.node_count();
        apply_cursor_move(&mut self.tree_cursor, movement, len)
    }

    /// Song under the list cursor.
    pub fn highlighted_song(&self) -> Option<&Song> {
        self.displayed.get(self.list_cursor.index())
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        catalog::position_of(&self.catalog, id).map(|index| &self.catalog[index])
    }

    pub fn catalog(&self) -> &[Song] {
        &self.catalog
    }

    pub fn displayed_songs(&self) -> &[Song] {
        &self.displayed
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn tree_index(&self) -> &TreeIndex {
        &self.tree_index
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn list_cursor(&self) -> RowCursor {
        self.list_cursor
    }

    pub fn tree_cursor(&self) -> RowCursor {
        self.tree_cursor
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total: self.catalog.len(),
            displayed: self.displayed.len(),
            tree_rows: self.tree_index.node_count(),
        }
    }

    fn recompute(&mut self) {
        let closed_paths = match self.rebuild_policy {
            TreeRebuildPolicy::Discard => None,
            TreeRebuildPolicy::PreserveClosedPaths => Some(self.tree.closed_paths()),
        };

        let mut displayed = filter_songs(&self.catalog, &self.query).into_owned();
        sort_songs_with(&mut displayed, self.sort_key, self.ascending_mode);

        let mut tree = FileTree::build(&displayed);
        if let Some(closed_paths) = closed_paths {
            let applied = tree.apply_closed_paths(&closed_paths);
            debug!(
                "LibraryState: restored {} of {} closed folder(s)",
                applied,
                closed_paths.len()
            );
        }
        self.tree_index = TreeIndex::flatten_into(&mut tree);
        self.tree = tree;
        self.displayed = displayed;

        self.list_cursor.clamp(self.displayed.len());
        self.tree_cursor.clamp(self.tree_index.node_count());
    }
}

impl Default for LibraryState {
    fn default() -> Self {
        Self::new(
            SortKey::Default,
            AscendingMode::default(),
            TreeRebuildPolicy::default(),
        )
    }
}

fn apply_cursor_move(cursor: &mut RowCursor, movement: CursorMove, len: usize) -> usize {
    match movement {
        CursorMove::Up => cursor.move_up(len),
        CursorMove::Down => cursor.move_down(len),
        CursorMove::First => cursor.jump_first(),
        CursorMove::Last => cursor.jump_last(len),
    }
}
