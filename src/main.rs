use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand};
use lapsight::{
    AnalysisConfig, CoachingInsight, LapsightError, PlaybackCommand, PlaybackSynchronizer, Session,
    TheoreticalBest, analysis::InsightTone, coach_session, load_export, playback::run_playback,
    writer,
};
use log::error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Analysis config file, defaults to the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest an export and print lap statistics and coaching insights
    Analyze {
        #[arg(short, long)]
        input: PathBuf,

        /// Persist the ingested session as JSON lines
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay an export and print the synchronized playback indices
    Playback {
        #[arg(short, long)]
        input: PathBuf,

        /// Zero-based lap to restrict playback to
        #[arg(short, long)]
        lap: Option<usize>,

        #[arg(short, long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Print the summary of a persisted session
    Load {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, LapsightError> {
    match path {
        Some(path) => AnalysisConfig::from_file(path),
        None => Ok(AnalysisConfig::from_local_file()?.unwrap_or_default()),
    }
}

fn print_summary(session: &Session, config: &AnalysisConfig) {
    let stats = session.stats();
    println!("Session started {}", session.started_at());
    println!(
        "{} points, {} laps, {:.3} km",
        session.points().len(),
        stats.lap_count,
        stats.total_distance_km
    );
    println!(
        "Max speed {:.1} km/h, avg speed {:.1} km/h, max rpm {:.0}",
        stats.max_speed, stats.avg_speed, stats.max_rpm
    );

    for lap in session.lap_stats(config) {
        println!(
            "  Lap {:>3} {:>8.3}s  max {:>6.1} km/h  avg {:>6.1} km/h  max rpm {:>6.0}{}",
            lap.lap_number,
            lap.lap_time_s,
            lap.max_speed,
            lap.avg_speed,
            lap.max_rpm,
            if lap.valid { "" } else { "  (invalid)" }
        );
    }

    if stats.best_lap_s > 0. {
        println!("Best lap {:.3}s", stats.best_lap_s);
    }
    match session.theoretical_best(config) {
        TheoreticalBest::Available {
            lap_time_s,
            sector_times_s,
        } => {
            let sectors = sector_times_s
                .iter()
                .map(|s| format!("{:.3}s", s))
                .collect::<Vec<_>>()
                .join(" / ");
            println!("Theoretical best {:.3}s {}", lap_time_s, sectors);
        }
        TheoreticalBest::Unavailable { .. } => println!("Theoretical best unavailable"),
    }

    for warning in session.warnings() {
        println!("Warning: {}", warning);
    }
}

fn print_insight(insight: &CoachingInsight) {
    let marker = match insight.tone() {
        InsightTone::Success => "+",
        InsightTone::Warning => "!",
        InsightTone::Info => "-",
    };
    println!("{} {}", marker, insight.message());
}

fn analyze(
    input: &Path,
    output: Option<&Path>,
    config: &AnalysisConfig,
) -> Result<(), LapsightError> {
    let session = load_export(input, config)?;
    if session.is_empty() {
        println!("No telemetry points found in {:?}", input);
        return Ok(());
    }
    print_summary(&session, config);
    for insight in coach_session(&session, config) {
        print_insight(&insight);
    }
    if let Some(output) = output {
        writer::write_session(output, &session)?;
        println!("Session written to {:?}", output);
    }
    Ok(())
}

fn playback(
    input: &Path,
    lap: Option<usize>,
    speed: f64,
    config: &AnalysisConfig,
) -> Result<(), LapsightError> {
    let session = load_export(input, config)?;
    if session.is_empty() {
        println!("No telemetry points found in {:?}", input);
        return Ok(());
    }
    let mut synchronizer = PlaybackSynchronizer::new(session.points().len(), session.laps())
        .with_tick_interval(Duration::from_millis(config.tick_interval_ms));
    synchronizer.set_speed(speed)?;

    let (command_tx, command_rx) = mpsc::channel::<PlaybackCommand>();
    let (frame_tx, frame_rx) = mpsc::channel();
    command_tx.send(PlaybackCommand::SelectLap(lap)).ok();
    command_tx.send(PlaybackCommand::Play).ok();
    // playback ends once it reaches the end of the range
    drop(command_tx);

    let driver = thread::spawn(move || run_playback(synchronizer, command_rx, frame_tx));
    for frame in frame_rx {
        let Some(point) = session.points().get(frame.current_index) else {
            continue;
        };
        println!(
            "{:>6} {:>6} {:<7} {:>6.1} km/h {:>6.0} rpm",
            frame.current_index,
            frame.relative_index,
            if frame.is_playing { "playing" } else { "stopped" },
            point.speed,
            point.rpm
        );
    }
    match driver.join() {
        Ok(result) => result.map(|_| ()),
        Err(_) => {
            error!("Playback thread panicked");
            Ok(())
        }
    }
}

fn load(input: &Path, config: &AnalysisConfig) -> Result<(), LapsightError> {
    let session = writer::load_session(input)?;
    print_summary(&session, config);
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Analyze { input, output } => analyze(input, output.as_deref(), &config),
        Commands::Playback { input, lap, speed } => playback(input, *lap, *speed, &config),
        Commands::Load { input } => load(input, &config),
    });
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
