//! Catalog track records.

use serde::{Deserialize, Serialize};

/// Stable catalog identifier (SQLite row id).
pub type TrackId = i64;

/// How a track is stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub mood: String,
    /// Length in seconds.
    pub duration: u32,
    pub plays: u32,
    pub likes: u32,
}

impl Track {
    /// Lowercased `title artist genre mood`, the text prompt keywords are matched against.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {} {} {}", self.title, self.artist, self.genre, self.mood).to_lowercase()
    }

    /// `plays + likes * likes_weight`, widened so huge counters cannot overflow.
    #[must_use]
    pub fn popularity(&self, likes_weight: u32) -> u64 {
        u64::from(self.plays) + u64::from(self.likes) * u64::from(likes_weight)
    }

    /// `m:ss` rendering of the duration.
    #[must_use]
    pub fn duration_label(&self) -> String {
        format!("{}:{:02}", self.duration / 60, self.duration % 60)
    }
}

/// A track as it arrives from an import file, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub genre: String,
    #[serde(alias = "emotion")]
    pub mood: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub plays: u32,
    #[serde(default)]
    pub likes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            id: 1,
            title: "Bailando Bajo La Lluvia".to_string(),
            artist: "Los Soles".to_string(),
            genre: "Pop".to_string(),
            mood: "Feliz".to_string(),
            duration: 185,
            plays: 120,
            likes: 40,
        }
    }

    #[test]
    fn test_search_text_is_lowercased_and_joined() {
        assert_eq!(track().search_text(), "bailando bajo la lluvia los soles pop feliz");
    }

    #[test]
    fn test_popularity_weights_likes() {
        assert_eq!(track().popularity(2), 200);
    }

    #[test]
    fn test_popularity_does_not_overflow() {
        let busy = Track { plays: u32::MAX, likes: u32::MAX, ..track() };
        assert_eq!(busy.popularity(2), u64::from(u32::MAX) * 3);
    }

    #[test]
    fn test_duration_label() {
        assert_eq!(track().duration_label(), "3:05");
    }

    #[test]
    fn test_new_track_accepts_emotion_alias_and_defaults() {
        let parsed: NewTrack = serde_json::from_str(
            r#"{"title":"Nube","artist":"Aire","genre":"Indie","emotion":"Tranquilo"}"#,
        )
        .expect("valid import record");

        assert_eq!(parsed.mood, "Tranquilo");
        assert_eq!(parsed.duration, 0);
        assert_eq!(parsed.plays, 0);
        assert_eq!(parsed.likes, 0);
    }
}
