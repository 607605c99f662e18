//! The read-only query surface the playlist generator consumes.
//!
//! Every match is a case-insensitive substring test against the named field.
//! Implementations return tracks in a stable order (the SQLite catalog uses
//! insertion order) so that scoring ties break the same way on every run.

use crate::track::{Track, TrackId};
use anyhow::Result;

/// Catalog storage backend.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog: Send + Sync {
    /// Tracks whose id is in `ids`. Missing ids are simply absent from the result.
    fn find_by_ids(&self, ids: &[TrackId]) -> Result<Vec<Track>>;

    /// Tracks whose mood contains `mood`, skipping `exclude`, at most `limit`.
    fn find_by_mood_like(&self, mood: &str, exclude: &[TrackId], limit: usize) -> Result<Vec<Track>>;

    /// Tracks whose genre contains any of `genres`.
    fn find_by_genre_in(&self, genres: &[String], exclude: &[TrackId], limit: usize) -> Result<Vec<Track>>;

    /// Tracks whose artist contains any of `artists`.
    fn find_by_artist_in(&self, artists: &[String], exclude: &[TrackId], limit: usize) -> Result<Vec<Track>>;

    /// Uniform random draw of up to `count` tracks matching `mood`.
    /// Returns fewer when the catalog runs short.
    fn sample_by_mood(&self, mood: &str, exclude: &[TrackId], count: usize) -> Result<Vec<Track>>;
}
