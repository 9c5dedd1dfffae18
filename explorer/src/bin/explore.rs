use std::{sync::Arc, time::Duration};

use clap::Parser;
use explorer::{
    config::{parse_max_distance, ExplorerConfig},
    driver::{Driver, Msg, Providers},
    models::{Coordinate, Mood},
    narration::{LogSpeech, SpeechSink},
    providers::{NominatimGeocoder, OsrmRouter, OverpassSearch},
    session::RouteStatus,
    surface::{View, WatchSurface},
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Find places nearby and get spoken driving directions"
)]
struct Args {
    /// Address or place name to search around
    query: Option<String>,

    /// Use this latitude instead of a text search (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// school, food, hospital, theatre or none
    #[arg(long, default_value = "none")]
    mood: Mood,

    /// Hide places further than this many kilometres
    #[arg(long, value_parser = parse_max_distance)]
    max_km: Option<f64>,

    /// Route to the N-th listed place (1-based) and narrate the directions
    #[arg(long)]
    pick: Option<usize>,

    /// Send directions to the log instead of the terminal
    #[arg(long)]
    mute: bool,
}

/// Prints utterances to the terminal.
struct ConsoleSpeech;

impl SpeechSink for ConsoleSpeech {
    fn speak(&self, text: &str) {
        println!("  🔊 {text}");
    }

    fn stop(&self) {
        tracing::debug!("speech interrupted");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explorer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ExplorerConfig::from_env();

    let providers = Providers {
        places: Arc::new(OverpassSearch::new(&config)?),
        geocoder: Arc::new(NominatimGeocoder::new(&config)?),
        router: Arc::new(OsrmRouter::new(&config)?),
    };
    let speech: Arc<dyn SpeechSink> = if args.mute {
        Arc::new(LogSpeech)
    } else {
        Arc::new(ConsoleSpeech)
    };
    let (surface, mut views) = WatchSurface::new();
    let (driver, handle) = Driver::new(&config, providers, speech, Arc::new(surface));
    let running = tokio::spawn(driver.run());

    handle.send(Msg::SetMood(args.mood));
    if let Some(km) = args.max_km {
        handle.send(Msg::SetMaxDistance(km));
    }
    match (args.lat, args.lon, args.query) {
        (Some(lat), Some(lon), _) => handle.send(Msg::UseDeviceLocation(Coordinate { lat, lon })),
        (_, _, Some(text)) => handle.search(text),
        _ => return Err("give a place to search for, or --lat and --lon".into()),
    };

    let view = wait_for(&mut views, |view| {
        view.notice.is_some() || (view.location.is_some() && !view.loading)
    })
    .await?;
    print_places(&view);

    if let Some(pick) = args.pick {
        let Some(place) = pick.checked_sub(1).and_then(|index| view.places.get(index)) else {
            handle.shutdown();
            running.await?;
            return Err(format!("--pick must be between 1 and {}", view.places.len()).into());
        };
        println!("\nRouting to {}…", place.label());
        handle.click(place.id);

        let view = wait_for(&mut views, |view| {
            matches!(view.route.status, RouteStatus::Active | RouteStatus::Failed)
        })
        .await?;
        print_route(&view);

        if view.route.status == RouteStatus::Active {
            let steps = u32::try_from(view.route.steps.len()).unwrap_or(u32::MAX);
            let narration = config.narration_interval.saturating_mul(steps);
            tokio::time::sleep(narration).await;
        }
    }

    handle.shutdown();
    running.await?;
    Ok(())
}

async fn wait_for(
    views: &mut watch::Receiver<View>,
    done: impl FnMut(&View) -> bool,
) -> Result<View, Box<dyn std::error::Error>> {
    let view = tokio::time::timeout(LOOKUP_TIMEOUT, views.wait_for(done)).await??;
    Ok(view.clone())
}

fn print_places(view: &View) {
    if let Some(location) = &view.location {
        println!("📍 {}", location.label);
    }
    println!("{}", view.title);
    if let Some(notice) = &view.notice {
        println!("{notice}");
    }
    for (index, place) in view.places.iter().enumerate() {
        println!(
            "{:>3}. {} ({}) {:.2} km away",
            index + 1,
            place.label(),
            place.kind(),
            place.distance_km
        );
    }
    if view.places.is_empty() && view.notice.is_none() {
        println!("No places within {} km.", view.max_distance_km);
    }
}

fn print_route(view: &View) {
    match (&view.route.summary, &view.notice) {
        (Some(summary), _) => {
            println!(
                "🚗 {} mins • {:.1} km",
                summary.duration_min, summary.distance_km
            );
            for (index, step) in view.route.steps.iter().enumerate() {
                println!("{:>3}. {} ({} m)", index + 1, step.text, step.distance_m.round());
            }
        }
        (None, Some(notice)) => println!("{notice}"),
        (None, None) => println!("No route."),
    }
}
