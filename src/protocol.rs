//! Event-bus protocol shared by the runtime components.
//!
//! Commands are consumed by the library manager, which answers with
//! notifications on the same bus.

use crate::album_index::AlbumSummary;
use crate::artist_index::ArtistGroup;
use crate::config::Config;
use crate::file_tree::NodeId;
use crate::library_state::CursorMove;
use crate::song::{FavorRating, Song};
use crate::sorting::SortKey;

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Library(LibraryMessage),
    Config(ConfigMessage),
}

/// One visible row of the storage tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Row index in the flattened view.
    pub row: usize,
    pub node: NodeId,
    pub name: String,
    /// Absolute path of the node; the root is `/`.
    pub path: String,
    pub level: usize,
    pub is_closed: bool,
    /// Id of the song held by a file row.
    pub song_id: Option<String>,
}

impl TreeRow {
    pub fn is_file(&self) -> bool {
        self.song_id.is_some()
    }
}

/// View whose highlight cursor a command moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorView {
    SongList,
    StorageTree,
}

/// Catalog size summary published after every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub displayed: usize,
    pub tree_rows: usize,
}

/// Library-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum LibraryMessage {
    /// Upserts scanned songs. Known ids keep their slot and `date_added`.
    InsertSongs(Vec<Song>),
    /// Drops songs by id from the catalog and the database.
    RemoveSongs(Vec<String>),
    /// Deletes every song from the database, then empties the catalog.
    ClearLibrary,
    /// Moves a retagged song to the slot matching its album and track.
    RepositionSong(String),
    SetSearchQuery(String),
    SetSort(SortKey),
    /// Cycles the favourite rating of the song with this id.
    CycleFavorite(String),
    /// Opens or closes the directory at a tree row.
    ToggleNode(usize),
    MoveCursor {
        view: CursorView,
        movement: CursorMove,
    },
    RequestSongs,
    RequestTree,
    RequestArtists,
    RequestAlbums,
    /// Asks for every song at or below a tree row.
    RequestFolderSongs(usize),
    Shutdown,

    SongsResult(Vec<Song>),
    TreeResult(Vec<TreeRow>),
    ArtistsResult(Vec<ArtistGroup>),
    AlbumsResult(Vec<AlbumSummary>),
    FolderSongsResult {
        row: usize,
        songs: Vec<Song>,
    },
    FavoriteChanged {
        id: String,
        rating: FavorRating,
    },
    NodeToggled {
        row: usize,
        is_closed: bool,
    },
    CursorMoved {
        view: CursorView,
        index: usize,
    },
    CatalogChanged(CatalogStats),
    OperationFailed(String),
}

/// Runtime configuration notifications.
#[derive(Debug, Clone)]
pub enum ConfigMessage {
    ConfigChanged(Config),
}
