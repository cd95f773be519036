use std::{path::PathBuf, time::Instant};

use anyhow::Context;
use chrono::TimeDelta;
use clap::Parser;
use itertools::Itertools;
use log::info;

use tour_guide::{
    config::{SpeechConfig, TourConfig},
    controller::TourController,
    location::{LocationOptions, TraceSource},
    map_view::GeoJsonSurface,
    session::{TourEvent, TourPhase},
    speech::LogSpeech,
    tour::Tour,
};

#[derive(Parser)]
struct Args {
    /// Position trace, one `lat,lng[,timestamp]` per line
    trace_path: PathBuf,
    /// Tour definition JSON (defaults to the built-in Santa Barbara tour)
    #[arg(long)]
    tour: Option<PathBuf>,
    /// Write the final map state as GeoJSON
    #[arg(long)]
    map_out: Option<PathBuf>,
    /// Narration speech rate
    #[arg(long, default_value_t = 0.9)]
    rate: f32,
    /// Narration pitch
    #[arg(long, default_value_t = 1.0)]
    pitch: f32,
    /// Narration volume
    #[arg(long, default_value_t = 1.0)]
    volume: f32,
    /// Drop fixes older than this many seconds (0 keeps every fix)
    #[arg(long, default_value_t = 0)]
    max_age: i64,
}

fn location_options(max_age: i64) -> anyhow::Result<LocationOptions> {
    let maximum_age = TimeDelta::try_seconds(max_age).context("--max-age is out of range")?;
    if maximum_age < TimeDelta::zero() {
        anyhow::bail!("--max-age must not be negative");
    }

    Ok(LocationOptions {
        maximum_age,
        ..LocationOptions::default()
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let tour = match &args.tour {
        Some(path) => Tour::read(path)?,
        None => Tour::builtin()?,
    };
    let trace = TraceSource::read(&args.trace_path)?;
    info!(
        "Loaded {} with {} stops and {} trace fixes",
        tour.name,
        tour.stops.len(),
        trace.remaining()
    );

    let config = TourConfig {
        speech: SpeechConfig {
            rate: args.rate,
            pitch: args.pitch,
            volume: args.volume,
        },
        location: location_options(args.max_age)?,
        ..TourConfig::default()
    };
    let surface = GeoJsonSurface::new(&config.map);
    let mut controller = TourController::new(tour, config, trace, LogSpeech::new(), surface);

    let now = Instant::now();
    controller.dispatch(TourEvent::Start);
    for alert in controller.take_alerts() {
        eprintln!("{alert}");
    }

    while controller.location_mut().advance() {
        controller.process();
        for alert in controller.take_alerts() {
            eprintln!("{alert}");
        }
    }
    println!("Replayed trace in {:?}", now.elapsed());

    let stops = &controller.tour().stops;
    let visited = stops
        .iter()
        .filter(|s| controller.session().completed().contains(&s.id))
        .map(|s| s.name.as_str())
        .join(", ");
    println!("{} ({} narrations)", controller.progress(), controller.speech().spoken());
    if !visited.is_empty() {
        println!("Visited: {visited}");
    }

    match controller.phase() {
        TourPhase::Complete => println!(
            "Tour complete! You've visited all {} stops on the {}",
            stops.len(),
            controller.tour().name
        ),
        TourPhase::Touring { next, .. } => println!("Next stop: {}", next.name),
        TourPhase::NotStarted => println!("Tour did not start"),
    }

    if let Some(path) = &args.map_out {
        let json = controller.map().to_geojson()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write map to {}", path.display()))?;
        println!("Wrote map to {}", path.display());
    }

    controller.dispatch(TourEvent::End);

    Ok(())
}
