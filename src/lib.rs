//! Mood playlists built around five seed tracks.
//!
//! Core modules:
//! - [`playlist`] - Playlist generation (seeds, candidates, interleaving)
//! - [`algorithm`] - Candidate scoring
//! - [`catalog`] - Queries the generator needs from a track store
//! - [`db`] - SQLite catalog implementing [`catalog::Catalog`]
//! - [`library`] - Saved playlists and favorites
//!
//! ### Supporting Modules
//!
//! - [`track`] - Track records and import rows
//! - [`error`] - Generation errors and their exit codes
//! - [`config`] - Data directory and database location
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodmix::db::Database;
//! use moodmix::playlist::{GenerationRequest, PlaylistGenerator};
//!
//! let db = Database::open(&moodmix::config::get_db_path()?)?;
//! db.import_json(std::path::Path::new("tracks.json"))?;
//!
//! let request = GenerationRequest::new("Feliz", "fiesta en la playa", vec![3, 8, 13, 21, 34]);
//! let playlist = PlaylistGenerator::new(&db).generate(&request)?;
//! for track in playlist.tracks() {
//!     println!("{} - {}", track.artist, track.title);
//! }
//!
//! db.save_playlist("Playa", "", &playlist)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Scoring
//!
//! Candidates come from three catalog queries that exclude the seeds:
//! same mood (50 points), a seed genre (30) and a seed artist (20). A track
//! found by several queries adds the weights up. On top of that:
//!
//! - +5 for each distinct prompt word longer than three characters that
//!   appears in the track's title, artist, genre or mood
//! - `min((plays + 2 * likes) / 100, 10)` for popularity
//!
//! The best 15 are kept, ties in discovery order. Missing slots are filled
//! with random same-mood tracks, then each seed is followed by three
//! recommendations until the playlist holds 20 tracks.

pub mod algorithm;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod playlist;
pub mod track;

pub use catalog::Catalog;
pub use error::GenerateError;
pub use playlist::{GeneratedPlaylist, GenerationRequest, PlaylistGenerator};
pub use track::{Track, TrackId};
