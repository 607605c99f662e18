//! Saved playlists and favorites, stored next to the catalog.

use crate::db::{track_from_row, Database};
use crate::playlist::GeneratedPlaylist;
use crate::track::{Track, TrackId};
use anyhow::{bail, Context, Result};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// A generated playlist the user chose to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlaylist {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub mood: String,
    pub prompt: String,
    pub created_at: String,
    pub track_ids: Vec<TrackId>,
}

impl Database {
    /// Store a hand-picked playlist. `track_ids` keep their order and must all exist.
    pub fn create_playlist(&self, name: &str, description: &str, track_ids: &[TrackId]) -> Result<i64> {
        self.store_playlist(name, description, "", "", track_ids)
    }

    /// Store a generated `playlist` under `name`, with its mood and prompt.
    pub fn save_playlist(&self, name: &str, description: &str, playlist: &GeneratedPlaylist) -> Result<i64> {
        let meta = &playlist.metadata;
        self.store_playlist(name, description, &meta.mood, &meta.prompt, &playlist.track_ids())
    }

    fn store_playlist(
        &self,
        name: &str,
        description: &str,
        mood: &str,
        prompt: &str,
        track_ids: &[TrackId],
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Playlist name is required");
        }

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for &id in track_ids {
                ensure_track_exists(&tx, id)?;
            }

            tx.execute(
                "INSERT INTO playlists (name, description, mood, prompt) VALUES (?1, ?2, ?3, ?4)",
                params![name, description, mood, prompt],
            )
            .with_context(|| format!("Failed to INSERT playlist `{name}'"))?;
            let playlist_id = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO playlist_tracks (playlist_id, position, track_id) VALUES (?1, ?2, ?3)",
                )?;
                for (position, id) in track_ids.iter().enumerate() {
                    stmt.execute(params![playlist_id, position, id])
                        .with_context(|| format!("Failed to add track {id} to playlist"))?;
                }
            }

            tx.commit().context("Committing SQL transaction failed")?;
            info!("Saved playlist `{name}' ({playlist_id}) with {} tracks", track_ids.len());
            Ok(playlist_id)
        })
    }

    /// All saved playlists, newest first.
    pub fn list_playlists(&self) -> Result<Vec<SavedPlaylist>> {
        self.with_conn(|conn| {
            let conn: &Connection = conn;
            let ids: Vec<i64> = conn
                .prepare("SELECT id FROM playlists ORDER BY id DESC")?
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()
                .context("Failed to list playlists")?;

            ids.into_iter()
                .filter_map(|id| load_playlist(conn, id).transpose())
                .collect()
        })
    }

    pub fn get_playlist(&self, id: i64) -> Result<Option<SavedPlaylist>> {
        self.with_conn(|conn| load_playlist(conn, id))
    }

    /// The tracks of playlist `id` in saved order.
    pub fn playlist_tracks(&self, id: i64) -> Result<Vec<Track>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.title, t.artist, t.genre, t.mood, t.duration, t.plays, t.likes
                 FROM playlist_tracks p JOIN tracks t ON t.id = p.track_id
                 WHERE p.playlist_id = ?1 ORDER BY p.position",
            )?;
            let tracks = stmt
                .query_map([id], track_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .with_context(|| format!("Failed to load tracks of playlist {id}"))?;
            Ok(tracks)
        })
    }

    /// Returns whether a playlist was removed.
    pub fn delete_playlist(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn
                .execute("DELETE FROM playlists WHERE id = ?1", [id])
                .with_context(|| format!("Failed to delete playlist {id}"))?;
            Ok(removed > 0)
        })
    }

    /// Mark `id` as a favorite. The like counter only moves on the first like.
    pub fn like(&self, id: TrackId) -> Result<Track> {
        self.with_conn(|conn| {
            ensure_track_exists(conn, id)?;
            let tx = conn.transaction()?;
            let added = tx.execute("INSERT OR IGNORE INTO favorites (track_id) VALUES (?1)", [id])?;
            if added > 0 {
                tx.execute("UPDATE tracks SET likes = likes + 1 WHERE id = ?1", [id])?;
            }
            tx.commit().context("Committing SQL transaction failed")?;
            Ok(())
        })?;

        self.get_track(id)?.context("Track vanished while liking it")
    }

    /// Remove `id` from favorites. Likes never drop below zero.
    pub fn unlike(&self, id: TrackId) -> Result<Track> {
        self.with_conn(|conn| {
            ensure_track_exists(conn, id)?;
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM favorites WHERE track_id = ?1", [id])?;
            if removed > 0 {
                tx.execute("UPDATE tracks SET likes = MAX(likes - 1, 0) WHERE id = ?1", [id])?;
            }
            tx.commit().context("Committing SQL transaction failed")?;
            Ok(())
        })?;

        self.get_track(id)?.context("Track vanished while unliking it")
    }

    /// Favorite tracks, most recently liked first.
    pub fn favorites(&self) -> Result<Vec<Track>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.title, t.artist, t.genre, t.mood, t.duration, t.plays, t.likes
                 FROM favorites f JOIN tracks t ON t.id = f.track_id
                 ORDER BY f.id DESC",
            )?;
            let tracks = stmt
                .query_map([], track_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("Failed to load favorites")?;
            Ok(tracks)
        })
    }
}

fn ensure_track_exists(conn: &Connection, id: TrackId) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM tracks WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    if exists.is_none() {
        bail!("Track {id} not found");
    }
    Ok(())
}

fn load_playlist(conn: &Connection, id: i64) -> Result<Option<SavedPlaylist>> {
    let header = conn
        .query_row(
            "SELECT name, description, mood, prompt, created_at FROM playlists WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()
        .with_context(|| format!("Failed to query playlist {id}"))?;

    let Some((name, description, mood, prompt, created_at)) = header else {
        return Ok(None);
    };

    let track_ids = conn
        .prepare("SELECT track_id FROM playlist_tracks WHERE playlist_id = ?1 ORDER BY position")?
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<TrackId>>>()
        .with_context(|| format!("Failed to query tracks of playlist {id}"))?;

    Ok(Some(SavedPlaylist {
        id,
        name,
        description,
        mood,
        prompt,
        created_at,
        track_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::{GenerationRequest, PlaylistGenerator};
    use crate::track::NewTrack;

    fn catalog() -> Result<Database> {
        let db = Database::open_in_memory()?.with_seed(1);
        let tracks: Vec<NewTrack> = (0..25)
            .map(|i| NewTrack {
                title: format!("Canción {i}"),
                artist: if i < 5 { "A".to_string() } else { "B".to_string() },
                genre: if i < 5 { "Pop".to_string() } else { "Rock".to_string() },
                mood: "Feliz".to_string(),
                duration: 200,
                plays: 0,
                likes: 0,
            })
            .collect();
        db.insert_tracks(&tracks)?;
        Ok(db)
    }

    fn generated(db: &Database) -> Result<GeneratedPlaylist> {
        let request = GenerationRequest::new("Feliz", "verano", vec![1, 2, 3, 4, 5]);
        Ok(PlaylistGenerator::new(db).generate(&request)?)
    }

    #[test]
    fn test_save_and_load_playlist_keeps_order() -> Result<()> {
        let db = catalog()?;
        let playlist = generated(&db)?;

        let id = db.save_playlist("Verano", "para la playa", &playlist)?;
        let saved = db.get_playlist(id)?.expect("saved playlist exists");

        assert_eq!(saved.name, "Verano");
        assert_eq!(saved.description, "para la playa");
        assert_eq!(saved.mood, "Feliz");
        assert_eq!(saved.prompt, "verano");
        assert_eq!(saved.track_ids, playlist.track_ids());

        let tracks = db.playlist_tracks(id)?;
        assert_eq!(tracks.iter().map(|t| t.id).collect::<Vec<_>>(), playlist.track_ids());
        Ok(())
    }

    #[test]
    fn test_save_requires_name() -> Result<()> {
        let db = catalog()?;
        let playlist = generated(&db)?;
        assert!(db.save_playlist("  ", "", &playlist).is_err());
        assert!(db.list_playlists()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_playlist_by_hand_keeps_order() -> Result<()> {
        let db = catalog()?;
        let id = db.create_playlist("Mis favoritas", "a mano", &[12, 3, 7, 3])?;

        let saved = db.get_playlist(id)?.expect("created playlist exists");
        assert_eq!(saved.name, "Mis favoritas");
        assert_eq!(saved.description, "a mano");
        assert_eq!(saved.mood, "");
        assert_eq!(saved.prompt, "");
        assert_eq!(saved.track_ids, vec![12, 3, 7, 3]);

        let titles: Vec<String> = db.playlist_tracks(id)?.into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Canción 11", "Canción 2", "Canción 6", "Canción 2"]);
        Ok(())
    }

    #[test]
    fn test_create_playlist_rejects_unknown_tracks() -> Result<()> {
        let db = catalog()?;
        assert!(db.create_playlist("Rota", "", &[1, 999]).is_err());
        assert!(db.create_playlist("", "", &[1]).is_err());
        assert!(db.list_playlists()?.is_empty(), "Nothing may be stored on failure");
        Ok(())
    }

    #[test]
    fn test_list_and_delete_playlists() -> Result<()> {
        let db = catalog()?;
        let playlist = generated(&db)?;
        let first = db.save_playlist("Uno", "", &playlist)?;
        let second = db.save_playlist("Dos", "", &playlist)?;

        let names: Vec<String> = db.list_playlists()?.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Dos", "Uno"]);

        assert!(db.delete_playlist(first)?);
        assert!(!db.delete_playlist(first)?);
        assert_eq!(db.get_playlist(first)?, None);
        assert!(db.playlist_tracks(first)?.is_empty(), "Track rows must cascade");
        assert!(db.get_playlist(second)?.is_some());
        Ok(())
    }

    #[test]
    fn test_like_is_idempotent() -> Result<()> {
        let db = catalog()?;
        assert_eq!(db.like(7)?.likes, 1);
        assert_eq!(db.like(7)?.likes, 1, "Liking twice must not double count");
        assert_eq!(db.favorites()?.iter().map(|t| t.id).collect::<Vec<_>>(), vec![7]);
        Ok(())
    }

    #[test]
    fn test_unlike_never_goes_negative() -> Result<()> {
        let db = catalog()?;
        assert_eq!(db.unlike(8)?.likes, 0);
        db.like(8)?;
        assert_eq!(db.unlike(8)?.likes, 0);
        assert_eq!(db.unlike(8)?.likes, 0);
        assert!(db.favorites()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_like_unknown_track_fails() -> Result<()> {
        let db = catalog()?;
        assert!(db.like(999).is_err());
        assert!(db.unlike(999).is_err());
        Ok(())
    }

    #[test]
    fn test_favorites_most_recent_first() -> Result<()> {
        let db = catalog()?;
        db.like(3)?;
        db.like(9)?;
        db.like(5)?;
        assert_eq!(db.favorites()?.iter().map(|t| t.id).collect::<Vec<_>>(), vec![5, 9, 3]);
        Ok(())
    }
}
