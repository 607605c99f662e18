//! # SQLite catalog
//!
//! Tracks live in a single `tracks` table. Every searchable text column has
//! a lowercased `*_key` twin written at insert time, so case-insensitive
//! substring matches are plain `instr(key, needle) > 0` tests and folding
//! covers non-ASCII letters (`Clásica`, `ÉPICO`). Id lists are bound as one
//! JSON array parameter and expanded with `json_each`.

use crate::catalog::Catalog;
use crate::track::{NewTrack, Track, TrackId};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tracks (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        title      TEXT    NOT NULL,
        artist     TEXT    NOT NULL,
        genre      TEXT    NOT NULL,
        mood       TEXT    NOT NULL,
        duration   INTEGER NOT NULL DEFAULT 0 CHECK (duration >= 0),
        plays      INTEGER NOT NULL DEFAULT 0 CHECK (plays >= 0),
        likes      INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
        title_key  TEXT    NOT NULL,
        artist_key TEXT    NOT NULL,
        genre_key  TEXT    NOT NULL,
        mood_key   TEXT    NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_tracks_mood ON tracks(mood_key);
    CREATE INDEX IF NOT EXISTS idx_tracks_genre ON tracks(genre_key);
    CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks(artist_key);

    CREATE TABLE IF NOT EXISTS playlists (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        mood        TEXT NOT NULL DEFAULT '',
        prompt      TEXT NOT NULL DEFAULT '',
        created_at  DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS playlist_tracks (
        playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        position    INTEGER NOT NULL,
        track_id    INTEGER NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
        PRIMARY KEY (playlist_id, position)
    );

    CREATE TABLE IF NOT EXISTS favorites (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        track_id INTEGER NOT NULL UNIQUE REFERENCES tracks(id) ON DELETE CASCADE,
        liked_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
";

pub(crate) const TRACK_COLUMNS: &str = "id, title, artist, genre, mood, duration, plays, likes";

/// Browse filter. Text filters are case-insensitive substrings; `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFilter {
    pub genre: Option<String>,
    pub mood: Option<String>,
    /// Matched against title, artist and genre.
    pub search: Option<String>,
    pub page: usize,
    pub limit: usize,
}

impl Default for TrackFilter {
    fn default() -> Self {
        Self {
            genre: None,
            mood: None,
            search: None,
            page: 1,
            limit: 20,
        }
    }
}

/// One page of browse results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPage {
    pub tracks: Vec<Track>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Catalog database handle.
pub struct Database {
    conn: Mutex<Connection>,
    rng: Mutex<StdRng>,
}

impl Database {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("SQLite connection refused. DB location: {}", path.display()))?;
        debug!("Opened catalog database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Private, throwaway database. Used by tests and benchmarks.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        conn.execute_batch(SCHEMA)
            .context("Invalid SQL when creating catalog schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Make random sampling reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Catalog connection lock poisoned"))?;
        f(&mut conn)
    }

    /// Insert `tracks` in one transaction. Returns the new ids in input order.
    pub fn insert_tracks(&self, tracks: &[NewTrack]) -> Result<Vec<TrackId>> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(tracks.len());

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO tracks (title, artist, genre, mood, duration, plays, likes,
                                         title_key, artist_key, genre_key, mood_key)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )?;

                for track in tracks {
                    stmt.execute(params![
                        track.title,
                        track.artist,
                        track.genre,
                        track.mood,
                        track.duration,
                        track.plays,
                        track.likes,
                        track.title.to_lowercase(),
                        track.artist.to_lowercase(),
                        track.genre.to_lowercase(),
                        track.mood.to_lowercase(),
                    ])
                    .with_context(|| format!("Failed to INSERT track {track:?}"))?;
                    ids.push(tx.last_insert_rowid());
                }
            }

            tx.commit().context("Committing SQL transaction failed")?;
            info!("Inserted {} tracks", ids.len());
            Ok(ids)
        })
    }

    /// Load a JSON array of [`NewTrack`] records from `path` and insert them.
    pub fn import_json(&self, path: &Path) -> Result<Vec<TrackId>> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read import file {}", path.display()))?;
        let tracks: Vec<NewTrack> = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a JSON array of tracks", path.display()))?;
        self.insert_tracks(&tracks)
    }

    /// Remove every track together with the playlists and favorites that point at them.
    pub fn clear_tracks(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "DELETE FROM playlist_tracks;
                 DELETE FROM playlists;
                 DELETE FROM favorites;
                 DELETE FROM tracks;",
            )
            .context("Failed to clear catalog")?;
            Ok(())
        })
    }

    pub fn count_tracks(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))
                .context("Could not count catalog entries")?;
            Ok(usize::try_from(count)?)
        })
    }

    pub fn get_track(&self, id: TrackId) -> Result<Option<Track>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?1"),
                [id],
                track_from_row,
            )
            .optional()
            .with_context(|| format!("Failed to query track {id}"))
        })
    }

    /// Filtered, paginated listing in catalog order.
    pub fn list_tracks(&self, filter: &TrackFilter) -> Result<TrackPage> {
        let page = filter.page.max(1);
        let limit = filter.limit.max(1);
        let offset = (page - 1)
            .checked_mul(limit)
            .and_then(|offset| i64::try_from(offset).ok())
            .with_context(|| format!("Page {page} of {limit} tracks is out of range"))?;

        let genre = filter.genre.as_deref().map(str::to_lowercase);
        let mood = filter.mood.as_deref().map(str::to_lowercase);
        let search = filter.search.as_deref().map(str::to_lowercase);

        let condition = "(?1 IS NULL OR instr(genre_key, ?1) > 0)
             AND (?2 IS NULL OR instr(mood_key, ?2) > 0)
             AND (?3 IS NULL OR instr(title_key, ?3) > 0
                             OR instr(artist_key, ?3) > 0
                             OR instr(genre_key, ?3) > 0)";

        self.with_conn(|conn| {
            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM tracks WHERE {condition}"),
                    params![genre, mood, search],
                    |row| row.get(0),
                )
                .context("Failed to count filtered tracks")?;
            let total = usize::try_from(total)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {TRACK_COLUMNS} FROM tracks WHERE {condition} ORDER BY id LIMIT ?4 OFFSET ?5"
            ))?;
            let tracks = stmt
                .query_map(params![genre, mood, search, limit, offset], track_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("Failed to load tracks")?;

            Ok(TrackPage {
                tracks,
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit),
            })
        })
    }

    /// Count one more play of `id`.
    pub fn record_play(&self, id: TrackId) -> Result<Track> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("UPDATE tracks SET plays = plays + 1 WHERE id = ?1", [id])
                .with_context(|| format!("Failed to record play for track {id}"))?;
            if changed == 0 {
                anyhow::bail!("Track {id} not found");
            }
            Ok(())
        })?;

        self.get_track(id)?
            .ok_or_else(|| anyhow!("Track {id} not found"))
    }

    fn query_tracks(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Track>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .with_context(|| format!("Invalid SQL statement: {sql}"))?;
            let tracks = stmt
                .query_map(params, track_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("Failed to load tracks")?;
            Ok(tracks)
        })
    }
}

impl Catalog for Database {
    fn find_by_ids(&self, ids: &[TrackId]) -> Result<Vec<Track>> {
        self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM tracks
                 WHERE id IN (SELECT value FROM json_each(?1)) ORDER BY id"
            ),
            [id_list(ids)?],
        )
    }

    fn find_by_mood_like(&self, mood: &str, exclude: &[TrackId], limit: usize) -> Result<Vec<Track>> {
        self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM tracks
                 WHERE instr(mood_key, ?1) > 0
                   AND id NOT IN (SELECT value FROM json_each(?2))
                 ORDER BY id LIMIT ?3"
            ),
            params![mood.to_lowercase(), id_list(exclude)?, limit],
        )
    }

    fn find_by_genre_in(&self, genres: &[String], exclude: &[TrackId], limit: usize) -> Result<Vec<Track>> {
        self.find_by_any("genre_key", genres, exclude, limit)
    }

    fn find_by_artist_in(&self, artists: &[String], exclude: &[TrackId], limit: usize) -> Result<Vec<Track>> {
        self.find_by_any("artist_key", artists, exclude, limit)
    }

    fn sample_by_mood(&self, mood: &str, exclude: &[TrackId], count: usize) -> Result<Vec<Track>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut eligible = self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM tracks
                 WHERE instr(mood_key, ?1) > 0
                   AND id NOT IN (SELECT value FROM json_each(?2))
                 ORDER BY id"
            ),
            params![mood.to_lowercase(), id_list(exclude)?],
        )?;
        trace!("{} tracks eligible for `{mood}' sample", eligible.len());

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("Sampling RNG lock poisoned"))?;
        let (chosen, _) = eligible.partial_shuffle(&mut *rng, count);
        Ok(chosen.to_vec())
    }
}

impl Database {
    /// Tracks whose `column` contains any of `needles`.
    fn find_by_any(&self, column: &str, needles: &[String], exclude: &[TrackId], limit: usize) -> Result<Vec<Track>> {
        let needles: Vec<String> = needles.iter().map(|needle| needle.to_lowercase()).collect();
        let needles = serde_json::to_string(&needles).context("Failed to encode match list")?;

        self.query_tracks(
            &format!(
                "SELECT {TRACK_COLUMNS} FROM tracks
                 WHERE EXISTS (SELECT 1 FROM json_each(?1) WHERE instr(tracks.{column}, value) > 0)
                   AND id NOT IN (SELECT value FROM json_each(?2))
                 ORDER BY id LIMIT ?3"
            ),
            params![needles, id_list(exclude)?, limit],
        )
    }
}

fn id_list(ids: &[TrackId]) -> Result<String> {
    serde_json::to_string(ids).context("Failed to encode id list")
}

pub(crate) fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        genre: row.get(3)?,
        mood: row.get(4)?,
        duration: row.get(5)?,
        plays: row.get(6)?,
        likes: row.get(7)?,
    })
}
