//! Candidate scoring for playlist generation.
//!
//! Scores are additive. A candidate earns a fixed weight for every criterion
//! it was retrieved by (mood, then genre, then artist), a bonus per prompt
//! keyword found in its text, and a capped popularity bonus.

use crate::track::{Track, TrackId};
use log::trace;
use std::collections::HashMap;

/// Scoring parameters. `Default` holds the production weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringContext {
    pub mood_weight: f64,
    pub genre_weight: f64,
    pub artist_weight: f64,
    /// Added once per distinct prompt keyword found in a candidate.
    pub keyword_bonus: f64,
    /// Keywords must be strictly longer than this many characters.
    pub min_keyword_len: usize,
    pub likes_weight: u32,
    pub popularity_divisor: f64,
    pub popularity_cap: f64,
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self {
            mood_weight: 50.0,
            genre_weight: 30.0,
            artist_weight: 20.0,
            keyword_bonus: 5.0,
            min_keyword_len: 3,
            likes_weight: 2,
            popularity_divisor: 100.0,
            popularity_cap: 10.0,
        }
    }
}

/// Which catalog query surfaced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Mood,
    Genre,
    Artist,
}

impl MatchKind {
    const fn weight(self, context: &ScoringContext) -> f64 {
        match self {
            Self::Mood => context.mood_weight,
            Self::Genre => context.genre_weight,
            Self::Artist => context.artist_weight,
        }
    }
}

/// A track and the score it has accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub track: Track,
    pub score: f64,
}

/// Candidates keyed by track id, iterated in first-discovery order.
#[derive(Debug, Default)]
pub struct CandidatePool {
    index: HashMap<TrackId, usize>,
    candidates: Vec<ScoredCandidate>,
}

impl CandidatePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit each track with the weight of `kind`.
    /// Known tracks accumulate; new ones are appended.
    pub fn add_matches(&mut self, tracks: Vec<Track>, kind: MatchKind, context: &ScoringContext) {
        let weight = kind.weight(context);

        for track in tracks {
            match self.index.get(&track.id) {
                Some(&slot) => {
                    let candidate = &mut self.candidates[slot];
                    candidate.score += weight;
                    trace!("{kind:?} match `{}' now scores {}", candidate.track.title, candidate.score);
                }
                None => {
                    trace!("{kind:?} match `{}' enters with {weight}", track.title);
                    self.index.insert(track.id, self.candidates.len());
                    self.candidates.push(ScoredCandidate { track, score: weight });
                }
            }
        }
    }

    /// Apply the keyword bonus for `prompt` to every candidate.
    pub fn apply_keyword_bonus(&mut self, prompt: &str, context: &ScoringContext) {
        let keywords = extract_keywords(prompt, context.min_keyword_len);
        if keywords.is_empty() {
            return;
        }

        for candidate in &mut self.candidates {
            let bonus = keyword_bonus(&candidate.track, &keywords, context.keyword_bonus);
            if bonus > 0.0 {
                trace!("Keyword bonus {bonus} for `{}'", candidate.track.title);
            }
            candidate.score += bonus;
        }
    }

    pub fn apply_popularity_bonus(&mut self, context: &ScoringContext) {
        for candidate in &mut self.candidates {
            candidate.score += popularity_bonus(&candidate.track, context);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: TrackId) -> Option<&ScoredCandidate> {
        self.index.get(&id).map(|&slot| &self.candidates[slot])
    }

    /// Highest scores first. Equal scores keep discovery order.
    #[must_use]
    pub fn into_ranked(self) -> Vec<ScoredCandidate> {
        let mut ranked = self.candidates;
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Lowercased whitespace tokens longer than `min_len` characters, first occurrence kept.
#[must_use]
pub fn extract_keywords(prompt: &str, min_len: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for token in prompt.split_whitespace().map(str::to_lowercase) {
        if token.chars().count() > min_len && !keywords.contains(&token) {
            keywords.push(token);
        }
    }

    keywords
}

/// `bonus` for every keyword contained in the track's search text.
#[must_use]
pub fn keyword_bonus(track: &Track, keywords: &[String], bonus: f64) -> f64 {
    let text = track.search_text();
    let hits = keywords.iter().filter(|keyword| text.contains(keyword.as_str())).count();

    #[allow(clippy::cast_precision_loss)]
    let hits = hits as f64;
    hits * bonus
}

/// `min(popularity / divisor, cap)`.
#[must_use]
pub fn popularity_bonus(track: &Track, context: &ScoringContext) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let popularity = track.popularity(context.likes_weight) as f64;
    (popularity / context.popularity_divisor).min(context.popularity_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn track(id: TrackId, title: &str, plays: u32, likes: u32) -> Track {
        Track {
            id,
            title: title.to_string(),
            artist: "Artist".to_string(),
            genre: "Rock".to_string(),
            mood: "Feliz".to_string(),
            duration: 200,
            plays,
            likes,
        }
    }

    #[test]
    fn test_default_weights() {
        let context = ScoringContext::default();
        assert_eq!(context.mood_weight, 50.0);
        assert_eq!(context.genre_weight, 30.0);
        assert_eq!(context.artist_weight, 20.0);
        assert_eq!(context.keyword_bonus, 5.0);
        assert_eq!(context.popularity_cap, 10.0);
    }

    #[test]
    fn test_matches_accumulate_into_one_entry() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();

        pool.add_matches(vec![track(1, "All", 0, 0), track(2, "Mood only", 0, 0)], MatchKind::Mood, &context);
        pool.add_matches(vec![track(1, "All", 0, 0)], MatchKind::Genre, &context);
        pool.add_matches(vec![track(1, "All", 0, 0), track(3, "Artist only", 0, 0)], MatchKind::Artist, &context);

        assert_eq!(pool.len(), 3, "Duplicates must not create new entries");
        assert_eq!(pool.get(1).map(|c| c.score), Some(100.0));
        assert_eq!(pool.get(2).map(|c| c.score), Some(50.0));
        assert_eq!(pool.get(3).map(|c| c.score), Some(20.0));
    }

    #[test]
    fn test_genre_only_match_scores_thirty() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();
        pool.add_matches(vec![track(7, "Genre only", 0, 0)], MatchKind::Genre, &context);
        assert_eq!(pool.get(7).map(|c| c.score), Some(30.0));
    }

    #[test]
    fn test_full_match_outranks_mood_only() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();

        pool.add_matches(vec![track(1, "Mood only", 0, 0), track(2, "All", 0, 0)], MatchKind::Mood, &context);
        pool.add_matches(vec![track(2, "All", 0, 0)], MatchKind::Genre, &context);
        pool.add_matches(vec![track(2, "All", 0, 0)], MatchKind::Artist, &context);

        let ranked = pool.into_ranked();
        assert_eq!(ranked[0].track.id, 2);
        assert_eq!(ranked[1].track.id, 1);
    }

    #[test]
    fn test_ranking_is_stable_for_ties() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();
        let tracks: Vec<Track> = (1..=10).map(|i| track(i, &format!("Song {i}"), 0, 0)).collect();
        pool.add_matches(tracks, MatchKind::Mood, &context);

        let order: Vec<TrackId> = pool.into_ranked().iter().map(|c| c.track.id).collect();
        assert_eq!(order, (1..=10).collect::<Vec<_>>(), "Ties must keep discovery order");
    }

    #[test]
    fn test_ranking_orders_fractional_scores_descending() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();
        pool.add_matches(
            vec![track(1, "A", 10, 0), track(2, "B", 55, 0), track(3, "C", 10, 0), track(4, "D", 900, 0)],
            MatchKind::Mood,
            &context,
        );
        pool.apply_popularity_bonus(&context);

        let ranked = pool.into_ranked();
        let order: Vec<TrackId> = ranked.iter().map(|c| c.track.id).collect();
        assert_eq!(order, vec![4, 2, 1, 3]);
        assert_relative_eq!(ranked[0].score, 59.0);
        assert_relative_eq!(ranked[1].score, 50.55);
    }

    #[test]
    fn test_extract_keywords_filters_short_tokens() {
        let keywords = extract_keywords("  Una   FIESTA de verano con amigos ", 3);
        assert_eq!(keywords, vec!["fiesta", "verano", "amigos"]);
    }

    #[test]
    fn test_extract_keywords_counts_characters_not_bytes() {
        // "café" is four characters but five bytes.
        assert_eq!(extract_keywords("café más", 3), vec!["café"]);
    }

    #[test]
    fn test_extract_keywords_deduplicates() {
        assert_eq!(extract_keywords("rock Rock ROCK", 3), vec!["rock"]);
    }

    #[test]
    fn test_keyword_bonus_per_matching_keyword() {
        let song = Track {
            genre: "Synthwave".to_string(),
            ..track(1, "Midnight Drive", 0, 0)
        };
        let keywords = extract_keywords("midnight synthwave ocean", 3);
        assert_relative_eq!(keyword_bonus(&song, &keywords, 5.0), 10.0);
    }

    #[test]
    fn test_keyword_bonus_matches_substrings() {
        let song = track(1, "Sunshine", 0, 0);
        let keywords = extract_keywords("shine", 3);
        assert_relative_eq!(keyword_bonus(&song, &keywords, 5.0), 5.0);
    }

    #[test]
    fn test_empty_prompt_adds_nothing() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();
        pool.add_matches(vec![track(1, "Feliz Feliz", 0, 0)], MatchKind::Mood, &context);
        pool.apply_keyword_bonus("", &context);
        assert_eq!(pool.get(1).map(|c| c.score), Some(50.0));
    }

    #[test]
    fn test_popularity_bonus_is_fractional() {
        let context = ScoringContext::default();
        assert_relative_eq!(popularity_bonus(&track(1, "A", 150, 25), &context), 2.0);
        assert_relative_eq!(popularity_bonus(&track(1, "A", 55, 0), &context), 0.55);
    }

    #[test]
    fn test_popularity_bonus_is_capped() {
        let context = ScoringContext::default();
        assert_relative_eq!(popularity_bonus(&track(1, "A", 100_000, 100_000), &context), 10.0);
        assert_relative_eq!(popularity_bonus(&track(1, "A", u32::MAX, u32::MAX), &context), 10.0);
    }

    #[test]
    fn test_popularity_breaks_ties() {
        let context = ScoringContext::default();
        let mut pool = CandidatePool::new();
        pool.add_matches(vec![track(1, "Quiet", 0, 0), track(2, "Loud", 300, 0)], MatchKind::Mood, &context);
        pool.apply_popularity_bonus(&context);

        let ranked = pool.into_ranked();
        assert_eq!(ranked[0].track.id, 2);
        assert_relative_eq!(ranked[0].score, 53.0);
    }
}
