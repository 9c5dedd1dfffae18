use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use explorer::{
    config::{parse_radius, ExplorerConfig},
    create_router,
    driver::Providers,
    providers::{NominatimGeocoder, OsrmRouter, OverpassSearch},
    AppState,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Nearby places and driving directions API")]
struct Args {
    /// Address to listen on (overrides EXPLORER_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Places search radius in metres (overrides SEARCH_RADIUS_M)
    #[arg(long, value_parser = parse_radius)]
    radius_m: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explorer=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = ExplorerConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(radius_m) = args.radius_m {
        config.search_radius_m = radius_m;
    }

    let providers = Providers {
        places: Arc::new(OverpassSearch::new(&config)?),
        geocoder: Arc::new(NominatimGeocoder::new(&config)?),
        router: Arc::new(OsrmRouter::new(&config)?),
    };
    tracing::info!("places: {}", config.overpass_url);
    tracing::info!("geocoding: {}", config.nominatim_url);
    tracing::info!("routing: {}", config.osrm_url);

    let addr = config.bind;
    let state = AppState {
        providers,
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(state).layer(cors);

    tracing::info!("starting explorer on http://{addr}");
    tracing::info!("  GET  /api/places?lat=&lon=&mood=&max_km=");
    tracing::info!("  GET  /api/geocode?q=");
    tracing::info!("  POST /api/route");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
