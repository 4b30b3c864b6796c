use chrono::DateTime;
use clap::{Parser, Subcommand};
use racket_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "racket")]
#[command(about = "Racket swing detection and training sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log detection decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded sample file through the shot detector
    Replay {
        /// CSV recording (timestamp_millis,gyro_x,gyro_y,gyro_z,heart_rate_bpm,accuracy)
        file: PathBuf,

        /// Save the session to history
        #[arg(long)]
        save: bool,

        /// Print the finished session as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved sessions, newest first
    History,

    /// Delete all saved sessions
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    racket_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = JsonSessionStore::in_data_dir(&data_dir, config.history.max_sessions);

    match cli.command {
        Commands::Replay { file, save, json } => cmd_replay(&file, save, json, &config, &mut store),
        Commands::History => cmd_history(&store),
        Commands::Clear => cmd_clear(&mut store),
    }
}

fn cmd_replay(
    file: &Path,
    save: bool,
    json: bool,
    config: &Config,
    store: &mut JsonSessionStore,
) -> Result<()> {
    let samples = read_samples(file)?;
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first.timestamp_millis, last.timestamp_millis),
        _ => return Err(Error::Recording("recording is empty".into())),
    };

    let mut controller = SessionController::new(config);
    controller.start(first);

    if !json {
        println!("Replaying {} samples from {}", samples.len(), file.display());
        println!();
    }

    for sample in samples {
        if let Some(shot) = controller.ingest(sample)? {
            if !json {
                print_shot(&shot, first);
            }
        }
    }

    let session = controller.stop(last, save, store)?;
    tracing::debug!("Replay finished with session {}", session.id);

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    print_summary(&session.summary);

    if save {
        if controller.is_worth_keeping(&session) {
            println!("\n✓ Session saved");
            println!("  History: {}", store.path().display());
        } else {
            println!("\nSession too short and without shots - not saved.");
        }
    }

    Ok(())
}

fn cmd_history(store: &JsonSessionStore) -> Result<()> {
    let sessions = store.history()?;
    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }

    println!("{} saved sessions (newest first):", sessions.len());
    for session in &sessions {
        let started = DateTime::from_timestamp_millis(session.started_at_millis)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| format!("{} ms", session.started_at_millis));
        println!(
            "  {}  {:>6.1} min  {:>3} shots  avg {:.0} bpm  {}",
            started,
            session.summary.duration_millis as f64 / 60_000.0,
            session.summary.total_shots,
            session.summary.average_heart_rate,
            session.id
        );
    }

    Ok(())
}

fn cmd_clear(store: &mut JsonSessionStore) -> Result<()> {
    store.clear()?;
    println!("✓ Cleared session history");
    Ok(())
}

fn print_shot(shot: &ShotEvent, session_start: i64) {
    let offset = (shot.timestamp_millis - session_start).max(0);
    println!(
        "  {:>3}:{:06.3}  {:<14} confidence {:.2}  peak {:.1} rad/s",
        offset / 60_000,
        (offset % 60_000) as f64 / 1_000.0,
        format!("{:?}", shot.shot_type),
        shot.confidence,
        shot.peak_angular_velocity
    );
}

fn print_summary(summary: &TrainingSummary) {
    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│  SESSION SUMMARY");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Duration: {:.1} s",
        summary.duration_millis as f64 / 1_000.0
    );
    println!("  Total shots: {}", summary.total_shots);
    for (shot_type, count) in &summary.shot_counts {
        println!("    {:?}: {}", shot_type, count);
    }
    println!(
        "  Heart rate: avg {:.0} bpm, max {:.0} bpm",
        summary.average_heart_rate, summary.max_heart_rate
    );
    println!(
        "  Fatigue {:.2}  Effort {:.2}  Recovery {:.2}",
        summary.fatigue_score, summary.effort_score, summary.recovery_score
    );
    if !summary.heart_rate_zone_histogram.is_empty() {
        println!("  Zones:");
        for (zone, count) in &summary.heart_rate_zone_histogram {
            println!("    {:?}: {}", zone, count);
        }
    }
}
