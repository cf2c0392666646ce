//! Music library indexing core: catalog ordering, sorting, search and the
//! storage-browser tree, plus the runtime and persistence around them.

pub mod album_index;
pub mod artist_index;
pub mod catalog;
pub mod config;
pub mod config_persistence;
pub mod cursor;
pub mod db_manager;
pub mod file_tree;
pub mod library_manager;
pub mod library_state;
pub mod metadata_tags;
pub mod protocol;
pub mod search;
pub mod song;
pub mod sorting;
pub mod tree_index;
