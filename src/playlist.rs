//! # Playlist Generation
//!
//! Builds a mood playlist around five seed tracks:
//!
//! 1. Resolve the seeds in one batch; all five must exist.
//! 2. Query mood, genre and artist matches (seeds excluded). The three
//!    queries are independent and run concurrently.
//! 3. Score the candidates (see [`crate::algorithm`]) and keep the best 15.
//! 4. Top up with random same-mood tracks if fewer than 15 were found.
//! 5. Interleave: one seed, then three recommendations, until 20 tracks.
//!
//! ```no_run
//! use moodmix::db::Database;
//! use moodmix::playlist::{GenerationRequest, PlaylistGenerator};
//!
//! let db = Database::open(std::path::Path::new("catalog.db"))?;
//! let generator = PlaylistGenerator::new(&db);
//! let request = GenerationRequest::new("Feliz", "fiesta de verano", vec![1, 2, 3, 4, 5]);
//! let playlist = generator.generate(&request)?;
//! println!("{} tracks", playlist.metadata.total_tracks);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::algorithm::{CandidatePool, MatchKind, ScoredCandidate, ScoringContext};
use crate::catalog::Catalog;
use crate::error::{GenerateError, Result};
use crate::track::{Track, TrackId};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Shape of the generated playlist and the catalog query caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub seed_count: usize,
    pub mood_limit: usize,
    pub genre_limit: usize,
    pub artist_limit: usize,
    pub recommendation_count: usize,
    pub recommendations_per_seed: usize,
    pub playlist_length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed_count: 5,
            mood_limit: 50,
            genre_limit: 30,
            artist_limit: 20,
            recommendation_count: 15,
            recommendations_per_seed: 3,
            playlist_length: 20,
        }
    }
}

/// What the caller asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub mood: String,
    pub prompt: String,
    pub seed_ids: Vec<TrackId>,
}

impl GenerationRequest {
    pub fn new(mood: impl Into<String>, prompt: impl Into<String>, seed_ids: Vec<TrackId>) -> Self {
        Self {
            mood: mood.into(),
            prompt: prompt.into(),
            seed_ids,
        }
    }

    fn validate(&self, config: &GeneratorConfig) -> Result<()> {
        if self.mood.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("a mood is required".to_string()));
        }
        if self.seed_ids.len() != config.seed_count {
            return Err(GenerateError::InvalidRequest(format!(
                "exactly {} seed tracks are required, got {}",
                config.seed_count,
                self.seed_ids.len()
            )));
        }
        Ok(())
    }
}

/// Why a track is in the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryOrigin {
    Seed,
    Ranked { score: f64 },
    Fill,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistEntry {
    pub track: Track,
    pub origin: EntryOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistMetadata {
    pub mood: String,
    pub prompt: String,
    pub seed_tracks: Vec<Track>,
    pub genres: Vec<String>,
    pub artists: Vec<String>,
    pub total_tracks: usize,
}

/// Generator output. Not persisted; see [`crate::library`] for saving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPlaylist {
    pub entries: Vec<PlaylistEntry>,
    pub metadata: PlaylistMetadata,
}

impl GeneratedPlaylist {
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.entries.iter().map(|entry| &entry.track)
    }

    #[must_use]
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks().map(|track| track.id).collect()
    }
}

/// Playlist generator over any [`Catalog`].
pub struct PlaylistGenerator<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    scoring: ScoringContext,
    config: GeneratorConfig,
}

impl<'a, C: Catalog + ?Sized> PlaylistGenerator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self::with_settings(catalog, ScoringContext::default(), GeneratorConfig::default())
    }

    pub fn with_settings(catalog: &'a C, scoring: ScoringContext, config: GeneratorConfig) -> Self {
        Self { catalog, scoring, config }
    }

    /// Generate a playlist for `request`.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::InvalidRequest`] before any catalog access
    /// - [`GenerateError::SeedNotFound`] when a seed id is unknown or repeated
    /// - [`GenerateError::CatalogUnavailable`] when any query fails
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedPlaylist> {
        request.validate(&self.config)?;
        let mood = request.mood.trim();

        let seeds = self.resolve_seeds(&request.seed_ids)?;
        let genres = distinct(seeds.iter().map(|track| track.genre.as_str()));
        let artists = distinct(seeds.iter().map(|track| track.artist.as_str()));
        debug!("Seed genres {genres:?}, seed artists {artists:?}");

        let pool = self.score_candidates(mood, &request.prompt, &request.seed_ids, &genres, &artists)?;
        let mut ranked: Vec<ScoredCandidate> = pool.into_ranked();
        ranked.truncate(self.config.recommendation_count);

        let mut recommendations: Vec<PlaylistEntry> = ranked
            .into_iter()
            .map(|candidate| PlaylistEntry {
                origin: EntryOrigin::Ranked { score: candidate.score },
                track: candidate.track,
            })
            .collect();

        if recommendations.len() < self.config.recommendation_count {
            let fill = self.fill_shortfall(mood, &request.seed_ids, &recommendations)?;
            recommendations.extend(fill.into_iter().map(|track| PlaylistEntry {
                track,
                origin: EntryOrigin::Fill,
            }));
        }

        let seed_entries = seeds.iter().cloned().map(|track| PlaylistEntry {
            track,
            origin: EntryOrigin::Seed,
        });
        let entries = interleave(
            seed_entries.collect(),
            recommendations,
            self.config.recommendations_per_seed,
            self.config.playlist_length,
        );

        info!("Generated {} track `{mood}' playlist", entries.len());

        Ok(GeneratedPlaylist {
            metadata: PlaylistMetadata {
                mood: mood.to_string(),
                prompt: request.prompt.clone(),
                seed_tracks: seeds,
                genres,
                artists,
                total_tracks: entries.len(),
            },
            entries,
        })
    }

    /// Look up all seeds in one query and return them in request order.
    fn resolve_seeds(&self, seed_ids: &[TrackId]) -> Result<Vec<Track>> {
        let found = self
            .catalog
            .find_by_ids(seed_ids)
            .map_err(GenerateError::CatalogUnavailable)?;

        if found.len() != seed_ids.len() {
            return Err(GenerateError::SeedNotFound {
                requested: seed_ids.len(),
                found: found.len(),
            });
        }

        let mut by_id: HashMap<TrackId, Track> = found.into_iter().map(|track| (track.id, track)).collect();
        let mut ordered = Vec::with_capacity(seed_ids.len());
        for id in seed_ids {
            match by_id.remove(id) {
                Some(track) => ordered.push(track),
                None => {
                    return Err(GenerateError::SeedNotFound {
                        requested: seed_ids.len(),
                        found: ordered.len(),
                    })
                }
            }
        }

        Ok(ordered)
    }

    fn score_candidates(
        &self,
        mood: &str,
        prompt: &str,
        seed_ids: &[TrackId],
        genres: &[String],
        artists: &[String],
    ) -> Result<CandidatePool> {
        let catalog = self.catalog;
        let config = &self.config;

        let (mood_matches, (genre_matches, artist_matches)) = rayon::join(
            || catalog.find_by_mood_like(mood, seed_ids, config.mood_limit),
            || {
                rayon::join(
                    || catalog.find_by_genre_in(genres, seed_ids, config.genre_limit),
                    || catalog.find_by_artist_in(artists, seed_ids, config.artist_limit),
                )
            },
        );
        let mood_matches = mood_matches.map_err(GenerateError::CatalogUnavailable)?;
        let genre_matches = genre_matches.map_err(GenerateError::CatalogUnavailable)?;
        let artist_matches = artist_matches.map_err(GenerateError::CatalogUnavailable)?;
        debug!(
            "Catalog returned {} mood, {} genre, {} artist matches",
            mood_matches.len(),
            genre_matches.len(),
            artist_matches.len()
        );

        // Order matters: ties later resolve by discovery order.
        let mut pool = CandidatePool::new();
        pool.add_matches(mood_matches, MatchKind::Mood, &self.scoring);
        pool.add_matches(genre_matches, MatchKind::Genre, &self.scoring);
        pool.add_matches(artist_matches, MatchKind::Artist, &self.scoring);

        if !prompt.is_empty() {
            pool.apply_keyword_bonus(prompt, &self.scoring);
        }
        pool.apply_popularity_bonus(&self.scoring);

        Ok(pool)
    }

    fn fill_shortfall(&self, mood: &str, seed_ids: &[TrackId], chosen: &[PlaylistEntry]) -> Result<Vec<Track>> {
        let missing = self.config.recommendation_count - chosen.len();
        let exclude: Vec<TrackId> = seed_ids
            .iter()
            .copied()
            .chain(chosen.iter().map(|entry| entry.track.id))
            .collect();

        let fill = self
            .catalog
            .sample_by_mood(mood, &exclude, missing)
            .map_err(GenerateError::CatalogUnavailable)?;

        if fill.len() < missing {
            warn!(
                "Only {} of {missing} filler tracks available for mood `{mood}'",
                fill.len()
            );
        } else {
            debug!("Filled {} recommendation slots with random `{mood}' tracks", fill.len());
        }

        Ok(fill)
    }
}

/// One seed, then up to `per_seed` recommendations, repeated until `length`
/// entries or until both sources run dry.
fn interleave(
    seeds: Vec<PlaylistEntry>,
    recommendations: Vec<PlaylistEntry>,
    per_seed: usize,
    length: usize,
) -> Vec<PlaylistEntry> {
    let mut seeds = seeds.into_iter();
    let mut recommendations = recommendations.into_iter();
    let mut playlist = Vec::with_capacity(length);

    while playlist.len() < length {
        let seed_added = match seeds.next() {
            Some(seed) => {
                playlist.push(seed);
                true
            }
            None => false,
        };

        let mut added = 0;
        while added < per_seed && playlist.len() < length {
            match recommendations.next() {
                Some(entry) => {
                    playlist.push(entry);
                    added += 1;
                }
                None => break,
            }
        }

        if !seed_added && added == 0 {
            break;
        }
    }

    playlist
}

/// Unique values in first-seen order.
fn distinct<'s>(values: impl Iterator<Item = &'s str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for value in values {
        if !unique.iter().any(|seen| seen == value) {
            unique.push(value.to_string());
        }
    }
    unique
}
