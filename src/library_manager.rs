//! Library runtime component.
//!
//! This manager is the single writer of the catalog. It applies bus commands
//! one at a time to its [`LibraryState`], mirrors writes into the database and
//! publishes the resulting views as notifications.

use std::collections::HashSet;

use log::{debug, error, info, warn};
use tokio::sync::broadcast::{Receiver, Sender};

use crate::config::Config;
use crate::db_manager::DbManager;
use crate::library_state::{CursorMove, LibraryState, TreeRebuildPolicy};
use crate::protocol::{self, CursorView, LibraryMessage, Message};
use crate::song::Song;

/// Owns the library state and serves commands from the bus.
pub struct LibraryManager {
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    db_manager: Option<DbManager>,
    state: LibraryState,
}

impl LibraryManager {
    /// Creates a manager and loads the stored catalog when a database is given.
    pub fn new(
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
        db_manager: Option<DbManager>,
        config: &Config,
    ) -> Self {
        let mut state = LibraryState::new(
            config.library.default_sort,
            config.library.ascending_mode,
            TreeRebuildPolicy::from_flag(config.library.preserve_closed_folders),
        );

        if let Some(db_manager) = db_manager.as_ref() {
            match db_manager.get_all_songs() {
                Ok(songs) => {
                    info!("LibraryManager: loaded {} song(s) from database", songs.len());
                    state.load_catalog(songs);
                }
                Err(err) => {
                    error!("LibraryManager: failed to load catalog: {}", err);
                }
            }
        }

        Self {
            bus_consumer,
            bus_producer,
            db_manager,
            state,
        }
    }

    fn publish(&self, message: LibraryMessage) {
        if let Err(err) = self.bus_producer.send(Message::Library(message)) {
            debug!("LibraryManager: no subscribers for notification: {}", err);
        }
    }

    fn publish_failure(&self, context: &str, err: impl std::fmt::Display) {
        let message = format!("{}: {}", context, err);
        warn!("LibraryManager: {}", message);
        self.publish(LibraryMessage::OperationFailed(message));
    }

    fn publish_catalog_changed(&self) {
        self.publish(LibraryMessage::CatalogChanged(self.state.stats()));
    }

    fn insert_songs(&mut self, songs: Vec<Song>) {
        if songs.is_empty() {
            return;
        }
        if let Some(db_manager) = self.db_manager.as_mut() {
            if let Err(err) = db_manager.upsert_songs(&songs) {
                self.publish_failure("Failed to store songs", err);
                return;
            }
        }
        let summary = self.state.import_songs(songs);
        info!(
            "LibraryManager: imported songs inserted={} updated={}",
            summary.inserted, summary.updated
        );
        self.publish_catalog_changed();
    }

    fn remove_songs(&mut self, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        if let Some(db_manager) = self.db_manager.as_mut() {
            if let Err(err) = db_manager.delete_songs(&ids) {
                self.publish_failure("Failed to delete songs", err);
                return;
            }
        }
        let ids: HashSet<String> = ids.into_iter().collect();
        let removed = self.state.remove_songs(&ids);
        info!("LibraryManager: removed {} song(s)", removed);
        self.publish_catalog_changed();
    }

    fn clear_library(&mut self) {
        if let Some(db_manager) = self.db_manager.as_ref() {
            if let Err(err) = db_manager.clear_songs() {
                self.publish_failure("Failed to clear library", err);
                return;
            }
        }
        let removed = self.state.clear();
        info!("LibraryManager: cleared {} song(s)", removed);
        self.publish_catalog_changed();
    }

    fn reposition_song(&mut self, id: String) {
        match self.state.reposition_song(&id) {
            Some(index) => {
                debug!("LibraryManager: song {} moved to slot {}", id, index);
                self.publish_catalog_changed();
            }
            None => self.publish_failure("Failed to reposition song", format!("unknown id {}", id)),
        }
    }

    fn move_cursor(&mut self, view: CursorView, movement: CursorMove) {
        let index = match view {
            CursorView::SongList => self.state.move_list_cursor(movement),
            CursorView::StorageTree => self.state.move_tree_cursor(movement),
        };
        self.publish(LibraryMessage::CursorMoved { view, index });
    }

    fn cycle_favorite(&mut self, id: String) {
        let Some(next_rating) = self.state.song(&id).map(|song| song.favor_rating.cycle()) else {
            self.publish_failure("Failed to rate song", format!("unknown id {}", id));
            return;
        };
        if let Some(db_manager) = self.db_manager.as_ref() {
            if let Err(err) = db_manager.update_favor_rating(&id, next_rating) {
                self.publish_failure("Failed to store rating", err);
                return;
            }
        }
        if let Some(rating) = self.state.cycle_favor_rating(&id) {
            self.publish(LibraryMessage::FavoriteChanged { id, rating });
        }
    }

    fn toggle_node(&mut self, row: usize) {
        match self.state.toggle_node(row) {
            Some(is_closed) => {
                self.publish(LibraryMessage::NodeToggled { row, is_closed });
            }
            None => debug!("LibraryManager: row {} is not a toggleable folder", row),
        }
    }

    fn apply_config(&mut self, config: &Config) {
        self.state.set_ascending_mode(config.library.ascending_mode);
        self.state
            .set_rebuild_policy(TreeRebuildPolicy::from_flag(
                config.library.preserve_closed_folders,
            ));
    }

    /// Starts the blocking event loop for library commands.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => match message {
                    Message::Config(protocol::ConfigMessage::ConfigChanged(config)) => {
                        self.apply_config(&config);
                    }
                    Message::Library(LibraryMessage::InsertSongs(songs)) => {
                        self.insert_songs(songs);
                    }
                    Message::Library(LibraryMessage::RemoveSongs(ids)) => {
                        self.remove_songs(ids);
                    }
                    Message::Library(LibraryMessage::ClearLibrary) => {
                        self.clear_library();
                    }
                    Message::Library(LibraryMessage::RepositionSong(id)) => {
                        self.reposition_song(id);
                    }
                    Message::Library(LibraryMessage::SetSearchQuery(query)) => {
                        self.state.set_search_query(&query);
                        self.publish_catalog_changed();
                    }
                    Message::Library(LibraryMessage::SetSort(sort_key)) => {
                        debug!("LibraryManager: sort set to {}", sort_key);
                        self.state.set_sort(sort_key);
                        self.publish_catalog_changed();
                    }
                    Message::Library(LibraryMessage::CycleFavorite(id)) => {
                        self.cycle_favorite(id);
                    }
                    Message::Library(LibraryMessage::ToggleNode(row)) => {
                        self.toggle_node(row);
                    }
                    Message::Library(LibraryMessage::RequestSongs) => {
                        self.publish(LibraryMessage::SongsResult(
                            self.state.displayed_songs().to_vec(),
                        ));
                    }
                    Message::Library(LibraryMessage::RequestTree) => {
                        self.publish(LibraryMessage::TreeResult(self.state.tree_rows()));
                    }
                    Message::Library(LibraryMessage::RequestArtists) => {
                        self.publish(LibraryMessage::ArtistsResult(self.state.artists()));
                    }
                    Message::Library(LibraryMessage::MoveCursor { view, movement }) => {
                        self.move_cursor(view, movement);
                    }
                    Message::Library(LibraryMessage::RequestAlbums) => {
                        self.publish(LibraryMessage::AlbumsResult(self.state.albums()));
                    }
                    Message::Library(LibraryMessage::RequestFolderSongs(row)) => {
                        self.publish(LibraryMessage::FolderSongsResult {
                            row,
                            songs: self.state.folder_songs(row),
                        });
                    }
                    Message::Library(LibraryMessage::Shutdown) => {
                        debug!("LibraryManager: shutting down");
                        break;
                    }
                    _ => {}
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "LibraryManager lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
