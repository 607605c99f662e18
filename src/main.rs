//! # Moodmix command-line entry point
//!
//! Logging is controlled via `RUST_LOG`:
//! - `RUST_LOG=debug moodmix generate ...` - query sizes and shortfalls
//! - `RUST_LOG=moodmix::algorithm=trace moodmix generate ...` - every scoring decision
//!
//! Exit codes: 2 for an invalid request, 3 for unknown seed tracks, 4 when
//! the catalog cannot be queried, 1 for anything else.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::info;
use moodmix::cli::{self, Args, Command};
use moodmix::completion;
use moodmix::config::RuntimeConfig;
use moodmix::db::{Database, TrackFilter};
use moodmix::error::GenerateError;
use moodmix::playlist::{EntryOrigin, GeneratedPlaylist, GenerationRequest, PlaylistGenerator};
use moodmix::track::Track;

fn main() {
    env_logger::init();

    let args = cli::Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<GenerateError>().map_or(1, GenerateError::exit_code);
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    // Completions never touch the catalog.
    if let Command::Completion { shell } = args.command {
        print_completions(shell);
        return Ok(());
    }

    let config = RuntimeConfig::resolve(args.db)?;
    let db = Database::open(&config.db_path)?;

    match args.command {
        Command::Import { file, replace } => {
            if replace {
                info!("Clearing catalog before import");
                db.clear_tracks()?;
            }
            let ids = db.import_json(&file)?;
            println!("Imported {} tracks ({} in catalog)", ids.len(), db.count_tracks()?);
        }
        Command::List { genre, mood, search, page, limit } => {
            let filter = TrackFilter {
                genre,
                mood,
                search,
                page,
                limit,
            };
            let result = db.list_tracks(&filter)?;
            print_track_table(&result.tracks);
            println!(
                "Page {}/{} ({} tracks)",
                result.page,
                result.total_pages.max(1),
                result.total
            );
        }
        Command::Generate { mood, prompt, seeds, save, description, json, verbose } => {
            let request = GenerationRequest::new(mood, prompt, seeds);
            let playlist = PlaylistGenerator::new(&db).generate(&request)?;

            if json {
                let rendered = serde_json::to_string_pretty(&playlist)
                    .context("Failed to serialize playlist")?;
                println!("{rendered}");
            } else {
                print_playlist(&playlist, verbose);
            }

            if let Some(name) = save {
                let id = db.save_playlist(&name, description.as_deref().unwrap_or_default(), &playlist)?;
                // Keep stdout pure JSON when asked for it.
                if json {
                    eprintln!("Saved playlist `{name}' as #{id}");
                } else {
                    println!("Saved playlist `{name}' as #{id}");
                }
            }
        }
        Command::CreatePlaylist { name, description, tracks } => {
            let id = db.create_playlist(&name, description.as_deref().unwrap_or_default(), &tracks)?;
            println!("Saved playlist `{name}' as #{id} with {} tracks", tracks.len());
        }
        Command::Playlists => {
            let playlists = db.list_playlists()?;
            if playlists.is_empty() {
                println!("No saved playlists");
            }
            for playlist in playlists {
                println!(
                    "#{:<4} {:<30} {:<12} {:>2} tracks  {}",
                    playlist.id,
                    playlist.name,
                    playlist.mood,
                    playlist.track_ids.len(),
                    playlist.created_at
                );
            }
        }
        Command::Playlist { id } => {
            let Some(playlist) = db.get_playlist(id)? else {
                bail!("Playlist {id} not found");
            };
            println!("{} ({})", playlist.name, playlist.mood);
            if !playlist.description.is_empty() {
                println!("{}", playlist.description);
            }
            if !playlist.prompt.is_empty() {
                println!("Prompt: {}", playlist.prompt);
            }
            print_track_table(&db.playlist_tracks(id)?);
        }
        Command::DeletePlaylist { id } => {
            if !db.delete_playlist(id)? {
                bail!("Playlist {id} not found");
            }
            println!("Deleted playlist #{id}");
        }
        Command::Like { id } => {
            let track = db.like(id)?;
            println!("♥ {} - {} ({} likes)", track.artist, track.title, track.likes);
        }
        Command::Unlike { id } => {
            let track = db.unlike(id)?;
            println!("{} - {} ({} likes)", track.artist, track.title, track.likes);
        }
        Command::Favorites => {
            print_track_table(&db.favorites()?);
        }
        Command::Play { id } => {
            let track = db.record_play(id)?;
            println!("▶ {} - {} [{}] ({} plays)", track.artist, track.title, track.duration_label(), track.plays);
        }
        Command::Completion { shell } => print_completions(shell),
    }

    Ok(())
}

fn print_completions(shell: cli::Shell) {
    let mut cmd = Args::command();
    completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
}

fn print_track_table(tracks: &[Track]) {
    if tracks.is_empty() {
        println!("No tracks");
        return;
    }
    println!("{:<6} {:<30} {:<24} {:<14} {:<12} {:>6} {:>6} {:>6}", "ID", "Title", "Artist", "Genre", "Mood", "Time", "Plays", "Likes");
    println!("{}", "-".repeat(111));
    for track in tracks {
        println!(
            "{:<6} {:<30} {:<24} {:<14} {:<12} {:>6} {:>6} {:>6}",
            track.id,
            truncate(&track.title, 30),
            truncate(&track.artist, 24),
            truncate(&track.genre, 14),
            truncate(&track.mood, 12),
            track.duration_label(),
            track.plays,
            track.likes
        );
    }
}

fn print_playlist(playlist: &GeneratedPlaylist, verbose: bool) {
    let meta = &playlist.metadata;
    println!("Mood: {}  |  {} tracks", meta.mood, meta.total_tracks);
    if !meta.prompt.is_empty() {
        println!("Prompt: {}", meta.prompt);
    }
    if verbose {
        println!("Seed genres: {}", meta.genres.join(", "));
        println!("Seed artists: {}", meta.artists.join(", "));
    }
    println!();

    for (position, entry) in playlist.entries.iter().enumerate() {
        let track = &entry.track;
        let marker = match entry.origin {
            EntryOrigin::Seed => "★",
            EntryOrigin::Ranked { .. } | EntryOrigin::Fill => " ",
        };
        print!(
            "{:>2}. {marker} {} - {} [{}]",
            position + 1,
            track.artist,
            track.title,
            track.duration_label()
        );
        if verbose {
            match entry.origin {
                EntryOrigin::Seed => print!("  (seed #{})", track.id),
                EntryOrigin::Ranked { score } => print!("  (#{}, score {score:.2})", track.id),
                EntryOrigin::Fill => print!("  (#{}, mood fill)", track.id),
            }
        }
        println!();
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
