//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `moodmix` binary. Every command works on
//! one catalog database, chosen with `--db` / `MOODMIX_DB` or defaulting to
//! the platform data directory (see [`crate::config`]).
//!
//! ## Examples
//!
//! ```bash
//! moodmix import tracks.json
//! moodmix list --mood feliz --page 2
//! moodmix generate --mood Feliz --prompt "fiesta de verano" \
//!     --seed 1 --seed 2 --seed 3 --seed 4 --seed 5 --save "Verano"
//! moodmix create-playlist --name "Domingo" --track 12 --track 4 --track 30
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "moodmix")]
#[command(about = "Moodmix: mood playlists built around five tracks you pick")]
#[command(version)]
pub struct Args {
    /// Catalog database to use instead of the default location
    #[arg(long, global = true, env = "MOODMIX_DB", value_hint = clap::ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import tracks from a JSON file
    ///
    /// The file holds an array of objects with `title`, `artist`, `genre`,
    /// `mood` (or `emotion`) and `duration` in seconds. `plays` and `likes`
    /// are optional and default to zero.
    Import {
        /// JSON file to read
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Remove every existing track (and the playlists and favorites
        /// that reference them) before importing
        #[arg(long)]
        replace: bool,
    },

    /// Browse the catalog, one page at a time
    List {
        /// Only tracks whose genre contains this text
        #[arg(long)]
        genre: Option<String>,

        /// Only tracks whose mood contains this text
        #[arg(long)]
        mood: Option<String>,

        /// Only tracks whose title, artist or genre contains this text
        #[arg(long)]
        search: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1, value_parser = page_number)]
        page: usize,

        /// Tracks per page
        #[arg(long, default_value_t = 20, value_parser = page_size)]
        limit: usize,
    },

    /// Generate a 20-track playlist from a mood, a prompt and five seed tracks
    ///
    /// Each seed is followed by up to three recommendations ranked by mood,
    /// genre and artist affinity, prompt keywords and popularity.
    Generate {
        /// Target mood, e.g. "Feliz"
        #[arg(long)]
        mood: String,

        /// Free text; words longer than three characters boost matching tracks
        #[arg(long, default_value = "")]
        prompt: String,

        /// Seed track id (exactly five, order is kept)
        #[arg(long = "seed", required = true, num_args = 1)]
        seeds: Vec<i64>,

        /// Save the result as a playlist with this name
        #[arg(long)]
        save: Option<String>,

        /// Description stored with a saved playlist
        #[arg(long, requires = "save")]
        description: Option<String>,

        /// Print the playlist as JSON
        #[arg(long)]
        json: bool,

        /// Show why each track was picked
        #[arg(short, long)]
        verbose: bool,
    },

    /// Save a playlist from hand-picked tracks
    CreatePlaylist {
        /// Playlist name
        #[arg(long)]
        name: String,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Track id, repeated in playlist order
        #[arg(long = "track", required = true, num_args = 1)]
        tracks: Vec<i64>,
    },

    /// List saved playlists, newest first
    Playlists,

    /// Show a saved playlist
    Playlist {
        /// Playlist id
        id: i64,
    },

    /// Delete a saved playlist
    DeletePlaylist {
        /// Playlist id
        id: i64,
    },

    /// Add a track to favorites
    Like {
        /// Track id
        id: i64,
    },

    /// Remove a track from favorites
    Unlike {
        /// Track id
        id: i64,
    },

    /// List favorite tracks, most recently liked first
    Favorites,

    /// Record that a track was played
    Play {
        /// Track id
        id: i64,
    },

    /// Generate shell completions
    ///
    /// Usage: moodmix completion bash > ~/.local/share/bash-completion/completions/moodmix
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn page_number(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(format!("`{value}' is not a page number (1 or more)")),
    }
}

fn page_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(limit) if (1..=500).contains(&limit) => Ok(limit),
        _ => Err(format!("`{value}' is not a page size between 1 and 500")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_generate_collects_seeds_in_order() {
        let args = Args::try_parse_from([
            "moodmix", "generate", "--mood", "Feliz", "--seed", "5", "--seed", "3", "--seed", "9",
            "--seed", "1", "--seed", "2",
        ])
        .expect("valid arguments");

        match args.command {
            Command::Generate { mood, prompt, seeds, save, json, .. } => {
                assert_eq!(mood, "Feliz");
                assert_eq!(prompt, "");
                assert_eq!(seeds, vec![5, 3, 9, 1, 2]);
                assert_eq!(save, None);
                assert!(!json);
            }
            other => panic!("Unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_generate_requires_mood_and_seeds() {
        assert!(Args::try_parse_from(["moodmix", "generate", "--seed", "1"]).is_err());
        assert!(Args::try_parse_from(["moodmix", "generate", "--mood", "Feliz"]).is_err());
    }

    #[test]
    fn test_description_requires_save() {
        let result = Args::try_parse_from([
            "moodmix", "generate", "--mood", "Feliz", "--seed", "1", "--description", "sin nombre",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_db_flag() {
        let args = Args::try_parse_from(["moodmix", "list", "--db", "/tmp/other.db", "--page", "3"])
            .expect("valid arguments");
        assert_eq!(args.db, Some(PathBuf::from("/tmp/other.db")));
        assert!(matches!(args.command, Command::List { page: 3, limit: 20, .. }));
    }

    #[test]
    fn test_list_rejects_page_zero() {
        assert!(Args::try_parse_from(["moodmix", "list", "--page", "0"]).is_err());
        assert!(Args::try_parse_from(["moodmix", "list", "--limit", "501"]).is_err());
    }

    #[test]
    fn test_create_playlist_collects_tracks_in_order() {
        let args = Args::try_parse_from([
            "moodmix", "create-playlist", "--name", "Domingo", "--track", "9", "--track", "2", "--track", "9",
        ])
        .expect("valid arguments");

        match args.command {
            Command::CreatePlaylist { name, description, tracks } => {
                assert_eq!(name, "Domingo");
                assert_eq!(description, None);
                assert_eq!(tracks, vec![9, 2, 9]);
            }
            other => panic!("Unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["moodmix", "create-playlist", "--name", "Vacía"]).is_err());
    }
}
