use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};

use tunedex::album_index::AlbumSummary;
use tunedex::artist_index::ArtistGroup;
use tunedex::config::{default_config_path, Config};
use tunedex::config_persistence::load_config_file;
use tunedex::db_manager::DbManager;
use tunedex::library_manager::LibraryManager;
use tunedex::metadata_tags::song_from_metadata_json;
use tunedex::protocol::{CatalogStats, LibraryMessage, Message, TreeRow};
use tunedex::song::{file_name_of, now_iso_timestamp, FavorRating, Song};
use tunedex::sorting::SortKey;

const BUS_CAPACITY: usize = 1024;

/// Index, sort and browse a music library catalog.
#[derive(Parser)]
#[command(name = "tunedex")]
struct Cli {
    /// Config file to use instead of the per-user default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog database; overrides `[database] path`.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import extractor output: a JSON object mapping absolute file paths to metadata payloads.
    Import { manifest: PathBuf },
    /// Print the song list.
    List {
        #[arg(long)]
        query: Option<String>,
        /// Sort key such as `title-desc`, `dateAdded-asc` or `default`.
        #[arg(long)]
        sort: Option<SortKey>,
    },
    /// Print the storage tree.
    Tree {
        #[arg(long)]
        query: Option<String>,
        /// Folder path to show collapsed. May be repeated.
        #[arg(long)]
        collapse: Vec<String>,
    },
    /// Print songs grouped by artist and album.
    Artists {
        #[arg(long)]
        query: Option<String>,
    },
    /// Print songs grouped by album.
    Albums {
        #[arg(long)]
        query: Option<String>,
    },
    /// Cycle the favourite rating of a song.
    Fave { id: String },
    /// Drop songs whose files no longer exist.
    Prune,
    /// Delete every song from the catalog.
    Clear,
}

/// Bus endpoint driving a [`LibraryManager`] on its own thread.
struct LibraryClient {
    bus_sender: Sender<Message>,
    receiver: Receiver<Message>,
    manager_thread: Option<thread::JoinHandle<()>>,
}

impl LibraryClient {
    fn start(db_manager: DbManager, config: &Config) -> Self {
        let (bus_sender, _) = broadcast::channel(BUS_CAPACITY);
        let manager_bus_sender = bus_sender.clone();
        let manager_receiver = bus_sender.subscribe();
        let receiver = bus_sender.subscribe();
        let config = config.clone();

        let manager_thread = thread::spawn(move || {
            let mut manager = LibraryManager::new(
                manager_receiver,
                manager_bus_sender,
                Some(db_manager),
                &config,
            );
            manager.run();
        });

        Self {
            bus_sender,
            receiver,
            manager_thread: Some(manager_thread),
        }
    }

    fn send(&self, message: LibraryMessage) -> Result<(), String> {
        self.bus_sender
            .send(Message::Library(message))
            .map(|_| ())
            .map_err(|err| format!("Failed to send library command: {}", err))
    }

    /// Blocks until `extract` accepts a notification. A failure report ends the wait.
    fn wait_for<T, F>(&mut self, mut extract: F) -> Result<T, String>
    where
        F: FnMut(LibraryMessage) -> Option<T>,
    {
        loop {
            match self.receiver.blocking_recv() {
                Ok(Message::Library(LibraryMessage::OperationFailed(reason))) => return Err(reason),
                Ok(Message::Library(message)) => {
                    if let Some(value) = extract(message) {
                        return Ok(value);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("CLI lagged on library bus, skipped {} message(s)", skipped);
                }
                Err(RecvError::Closed) => return Err("library bus closed".to_string()),
            }
        }
    }

    fn apply_query(&self, query: Option<String>) -> Result<(), String> {
        match query {
            Some(query) => self.send(LibraryMessage::SetSearchQuery(query)),
            None => Ok(()),
        }
    }

    fn catalog_changed(&mut self) -> Result<CatalogStats, String> {
        self.wait_for(|message| match message {
            LibraryMessage::CatalogChanged(stats) => Some(stats),
            _ => None,
        })
    }

    fn songs(&mut self) -> Result<Vec<Song>, String> {
        self.send(LibraryMessage::RequestSongs)?;
        self.wait_for(|message| match message {
            LibraryMessage::SongsResult(songs) => Some(songs),
            _ => None,
        })
    }

    fn tree(&mut self) -> Result<Vec<TreeRow>, String> {
        self.send(LibraryMessage::RequestTree)?;
        self.wait_for(|message| match message {
            LibraryMessage::TreeResult(rows) => Some(rows),
            _ => None,
        })
    }

    fn artists(&mut self) -> Result<Vec<ArtistGroup>, String> {
        self.send(LibraryMessage::RequestArtists)?;
        self.wait_for(|message| match message {
            LibraryMessage::ArtistsResult(groups) => Some(groups),
            _ => None,
        })
    }

    fn albums(&mut self) -> Result<Vec<AlbumSummary>, String> {
        self.send(LibraryMessage::RequestAlbums)?;
        self.wait_for(|message| match message {
            LibraryMessage::AlbumsResult(albums) => Some(albums),
            _ => None,
        })
    }

    fn shutdown(mut self) {
        if let Err(err) = self.send(LibraryMessage::Shutdown) {
            warn!("{}", err);
        }
        if let Some(manager_thread) = self.manager_thread.take() {
            if manager_thread.join().is_err() {
                warn!("Library manager thread panicked");
            }
        }
    }
}

/// True when `path` lies under one of `folders`. An empty list accepts everything.
fn within_library_folders(path: &str, folders: &[String]) -> bool {
    folders.is_empty()
        || folders
            .iter()
            .any(|folder| Path::new(path).starts_with(Path::new(folder)))
}

/// Builds songs from an extractor manifest, skipping entries outside `folders`
/// and unsupported or unparsable ones.
fn songs_from_manifest(
    manifest_text: &str,
    folders: &[String],
    date_added: &str,
) -> Result<Vec<Song>, String> {
    let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(manifest_text)
        .map_err(|err| format!("Failed to parse import manifest: {}", err))?;

    let mut songs = Vec::with_capacity(entries.len());
    for (path, payload) in entries {
        if !within_library_folders(&path, folders) {
            debug!("Skipping {} outside library folders", path);
            continue;
        }
        let file = file_name_of(&path);
        match song_from_metadata_json(&path, file, &payload.to_string(), date_added.to_string()) {
            Some(song) => songs.push(song),
            None => debug!("Skipping import candidate {}", path),
        }
    }
    Ok(songs)
}

fn rating_marker(rating: FavorRating) -> &'static str {
    match rating {
        FavorRating::Unrated => "  ",
        FavorRating::Liked => "+ ",
        FavorRating::Loved => "++",
    }
}

fn print_songs(songs: &[Song]) {
    for song in songs {
        println!(
            "{} {:>3}  {}  |  {}  |  {}  [{}]",
            rating_marker(song.favor_rating),
            song.track_number,
            song.title,
            song.artist,
            song.album,
            song.id
        );
    }
}

fn print_tree(rows: &[TreeRow]) {
    for row in rows {
        let marker = if row.is_file() {
            "   "
        } else if row.is_closed {
            "[+]"
        } else {
            "[-]"
        };
        println!("{}{} {}", "  ".repeat(row.level), marker, row.name);
    }
}

fn print_artists(groups: &[ArtistGroup]) {
    for group in groups {
        println!("{} ({} tracks)", group.name, group.track_count());
        for album in &group.albums {
            println!("  {}", album.title);
            for track in &album.tracks {
                println!("    {:>3}  {}", track.track_number, track.title);
            }
        }
    }
}

fn print_albums(albums: &[AlbumSummary]) {
    for album in albums {
        let date: &str = if album.date.is_empty() { "-" } else { &album.date };
        println!("{}  |  {}  |  {}", album.title, album.artist, date);
        for song in &album.songs {
            println!("    {:>3}  {}", song.track_number, song.title);
        }
    }
}

fn collapse_folders(client: &mut LibraryClient, paths: &[String]) -> Result<(), String> {
    for path in paths {
        let rows = client.tree()?;
        let Some(row) = rows
            .iter()
            .find(|row| !row.is_file() && !row.is_closed && row.path == *path)
        else {
            warn!("No open folder at {}", path);
            continue;
        };
        client.send(LibraryMessage::ToggleNode(row.row))?;
    }
    Ok(())
}

fn run_command(
    client: &mut LibraryClient,
    config: &Config,
    command: Command,
) -> Result<(), String> {
    match command {
        Command::Import { manifest } => {
            let manifest_text = std::fs::read_to_string(&manifest)
                .map_err(|err| format!("Failed to read {}: {}", manifest.display(), err))?;
            let songs = songs_from_manifest(
                &manifest_text,
                &config.library.folders,
                &now_iso_timestamp(),
            )?;
            if songs.is_empty() {
                println!("Nothing to import");
                return Ok(());
            }
            let candidates = songs.len();
            client.send(LibraryMessage::InsertSongs(songs))?;
            let stats = client.catalog_changed()?;
            println!(
                "Imported {} song(s); catalog holds {}",
                candidates, stats.total
            );
        }
        Command::List { query, sort } => {
            client.apply_query(query)?;
            if let Some(sort) = sort {
                client.send(LibraryMessage::SetSort(sort))?;
            }
            print_songs(&client.songs()?);
        }
        Command::Tree { query, collapse } => {
            client.apply_query(query)?;
            collapse_folders(client, &collapse)?;
            print_tree(&client.tree()?);
        }
        Command::Artists { query } => {
            client.apply_query(query)?;
            print_artists(&client.artists()?);
        }
        Command::Albums { query } => {
            client.apply_query(query)?;
            print_albums(&client.albums()?);
        }
        Command::Fave { id } => {
            client.send(LibraryMessage::CycleFavorite(id))?;
            let (id, rating) = client.wait_for(|message| match message {
                LibraryMessage::FavoriteChanged { id, rating } => Some((id, rating)),
                _ => None,
            })?;
            println!("{} rated {}", id, rating.as_u8());
        }
        Command::Prune => {
            let missing: Vec<String> = client
                .songs()?
                .into_iter()
                .filter(|song| !Path::new(&song.path).exists())
                .map(|song| song.id)
                .collect();
            if missing.is_empty() {
                println!("No missing files");
                return Ok(());
            }
            let count = missing.len();
            client.send(LibraryMessage::RemoveSongs(missing))?;
            let stats = client.catalog_changed()?;
            println!("Removed {} song(s); catalog holds {}", count, stats.total);
        }
        Command::Clear => {
            client.send(LibraryMessage::ClearLibrary)?;
            let stats = client.catalog_changed()?;
            println!("Catalog cleared; {} song(s) remain", stats.total);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();
    log::set_max_level(log::LevelFilter::Info);

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(default_config_path) {
        Some(config_path) => load_config_file(&config_path),
        None => {
            warn!("No config directory available. Using defaults.");
            Config::default()
        }
    };
    log::set_max_level(config.logging.level.to_level_filter());

    let db_path = cli
        .database
        .clone()
        .or_else(|| config.database.resolved_path())
        .ok_or("Could not determine the catalog database path")?;
    info!("Opening catalog database at {}", db_path.display());
    let db_manager = DbManager::new(&db_path)
        .map_err(|err| format!("Failed to open {}: {}", db_path.display(), err))?;

    let mut client = LibraryClient::start(db_manager, &config);
    let result = run_command(&mut client, &config, cli.command);
    client.shutdown();
    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{songs_from_manifest, within_library_folders};

    #[test]
    fn test_manifest_skips_unsupported_and_broken_entries() {
        let manifest = r#"{
            "/music/a/01 Intro.flac": {
                "codec": "flac",
                "duration": "0:03:00",
                "sample_rate": "44100",
                "meta_tags": { "TrackTitle": "Intro", "Album": "A", "TrackNumber": "1/9" }
            },
            "/music/a/cover.jpg": { "codec": "jpeg" },
            "/music/a/02.mp3": "not a payload"
        }"#;
        let songs = songs_from_manifest(manifest, &[], "2024-01-01T00:00:00.000Z")
            .expect("manifest should parse");
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Intro");
        assert_eq!(songs[0].file, "01 Intro.flac");
        assert_eq!(songs[0].track_number, 1);
        assert_eq!(songs[0].date_added, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_manifest_must_be_an_object() {
        assert!(songs_from_manifest("[]", &[], "2024-01-01T00:00:00.000Z").is_err());
    }

    #[test]
    fn test_manifest_keeps_only_configured_folders() {
        let manifest = r#"{
            "/music/a/1.mp3": { "meta_tags": { "TrackTitle": "Kept" } },
            "/musicals/b/1.mp3": { "meta_tags": { "TrackTitle": "Sibling" } },
            "/tmp/c/1.mp3": { "meta_tags": { "TrackTitle": "Elsewhere" } }
        }"#;
        let folders = vec!["/music".to_string()];
        let songs = songs_from_manifest(manifest, &folders, "2024-01-01T00:00:00.000Z")
            .expect("manifest should parse");
        let titles: Vec<&str> = songs.iter().map(|song| song.title.as_str()).collect();
        assert_eq!(titles, vec!["Kept"]);
    }

    #[test]
    fn test_empty_folder_list_accepts_any_path() {
        assert!(within_library_folders("/anywhere/x.mp3", &[]));
        assert!(within_library_folders("/music/x.mp3", &["/music".to_string()]));
        assert!(!within_library_folders("/musicals/x.mp3", &["/music".to_string()]));
    }
}
