use std::path::Path;

use log::warn;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::song::{FavorRating, Song};

const DELETE_CHUNK_SIZE: usize = 200;

const SONG_COLUMNS: &str = "id, path, file, title, album, artist, genre, bpm, compilation, date, \
     encoder, trackTotal, trackNumber, codec, duration, sampleRate, side, startTime, \
     favorRating, dateAdded, visualsPath";

/// SQLite-backed store of catalog rows keyed by song id.
pub struct DbManager {
    conn: Connection,
}

impl DbManager {
    pub fn new(db_path: &Path) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    warn!(
                        "Could not create database directory {}: {}",
                        parent.display(),
                        err
                    );
                }
            }
        }

        let conn = Connection::open(db_path)?;
        let db_manager = Self { conn };
        db_manager.initialize_schema()?;
        Ok(db_manager)
    }

    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let db_manager = Self { conn };
        db_manager.initialize_schema()?;
        Ok(db_manager)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS songs (
                id TEXT PRIMARY KEY,
                path TEXT,
                file TEXT,
                title TEXT,
                album TEXT,
                artist TEXT,
                genre TEXT,
                bpm INTEGER,
                compilation INTEGER,
                date TEXT,
                encoder TEXT,
                trackTotal INTEGER,
                trackNumber INTEGER,
                codec TEXT,
                duration TEXT,
                sampleRate TEXT,
                side INTEGER,
                startTime INTEGER,
                favorRating INTEGER CHECK (favorRating IN (0, 1, 2)),
                dateAdded TEXT,
                visualsPath TEXT
            )",
            [],
        )?;
        Ok(())
    }

    fn upsert_song_with(conn: &Connection, song: &Song) -> Result<(), rusqlite::Error> {
        // dateAdded is written once; conflicts keep the stored value.
        conn.execute(
            &format!(
                "INSERT INTO songs ({SONG_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21) \
                 ON CONFLICT(id) DO UPDATE SET \
                 path=excluded.path, file=excluded.file, title=excluded.title, \
                 album=excluded.album, artist=excluded.artist, genre=excluded.genre, \
                 bpm=excluded.bpm, compilation=excluded.compilation, date=excluded.date, \
                 encoder=excluded.encoder, trackTotal=excluded.trackTotal, \
                 trackNumber=excluded.trackNumber, codec=excluded.codec, \
                 duration=excluded.duration, sampleRate=excluded.sampleRate, \
                 side=excluded.side, startTime=excluded.startTime, \
                 favorRating=excluded.favorRating, visualsPath=excluded.visualsPath, \
                 dateAdded=songs.dateAdded"
            ),
            params![
                song.id,
                song.path,
                song.file,
                song.title,
                song.album,
                song.artist,
                song.genre,
                song.bpm,
                song.compilation,
                song.date,
                song.encoder,
                song.track_total,
                song.track_number,
                song.codec,
                song.duration,
                song.sample_rate,
                song.side,
                i64::try_from(song.start_time).unwrap_or(i64::MAX),
                song.favor_rating.as_u8(),
                song.date_added,
                song.visuals_path,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_song(&self, song: &Song) -> Result<(), rusqlite::Error> {
        Self::upsert_song_with(&self.conn, song)
    }

    /// Upserts a batch inside one transaction.
    pub fn upsert_songs(&mut self, songs: &[Song]) -> Result<(), rusqlite::Error> {
        let tx = self.conn.transaction()?;
        for song in songs {
            Self::upsert_song_with(&tx, song)?;
        }
        tx.commit()
    }

    fn song_from_row(row: &Row<'_>) -> Result<Song, rusqlite::Error> {
        Ok(Song {
            id: row.get(0)?,
            path: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            file: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            album: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            artist: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            genre: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            bpm: row.get::<_, Option<u32>>(7)?.unwrap_or_default(),
            compilation: row.get::<_, Option<u32>>(8)?.unwrap_or_default(),
            date: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            encoder: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
            track_total: row.get::<_, Option<u32>>(11)?.unwrap_or_default(),
            track_number: row.get::<_, Option<u32>>(12)?.unwrap_or_default(),
            codec: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
            duration: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
            sample_rate: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
            side: row.get::<_, Option<u32>>(16)?.unwrap_or_default(),
            start_time: row
                .get::<_, Option<i64>>(17)?
                .map(|value| value.max(0) as u64)
                .unwrap_or_default(),
            favor_rating: FavorRating::from_u8_lossy(
                row.get::<_, Option<i64>>(18)?.unwrap_or_default(),
            ),
            date_added: row.get::<_, Option<String>>(19)?.unwrap_or_default(),
            visuals_path: row.get(20)?,
        })
    }

    /// Every stored song in insertion (rowid) order.
    pub fn get_all_songs(&self) -> Result<Vec<Song>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SONG_COLUMNS} FROM songs ORDER BY rowid ASC"))?;
        let song_iter = stmt.query_map([], Self::song_from_row)?;

        let mut songs = Vec::new();
        for song in song_iter {
            songs.push(song?);
        }
        Ok(songs)
    }

    pub fn get_song(&self, id: &str) -> Result<Option<Song>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id], Self::song_from_row)?;
        let song = rows.next().transpose()?;
        Ok(song)
    }

    pub fn count_songs(&self) -> Result<usize, rusqlite::Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    pub fn update_favor_rating(&self, id: &str, rating: FavorRating) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "UPDATE songs SET favorRating = ?1 WHERE id = ?2",
            params![rating.as_u8(), id],
        )?;
        Ok(())
    }

    /// Deletes every row. Returns the number of rows removed.
    pub fn clear_songs(&self) -> Result<usize, rusqlite::Error> {
        self.conn.execute("DELETE FROM songs", [])
    }

    /// Deletes rows by id in fixed-size chunks. Returns the number of rows removed.
    pub fn delete_songs(&mut self, ids: &[String]) -> Result<usize, rusqlite::Error> {
        let tx = self.conn.transaction()?;
        let mut removed = 0usize;
        for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = (1..=chunk.len())
                .map(|index| format!("?{}", index))
                .collect::<Vec<_>>()
                .join(", ");
            removed += tx.execute(
                &format!("DELETE FROM songs WHERE id IN ({})", placeholders),
                params_from_iter(chunk.iter()),
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }
}
