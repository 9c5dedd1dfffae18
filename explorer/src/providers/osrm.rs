use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::ExplorerConfig,
    error::{ExploreError, Result},
    models::{Coordinate, Route, RouteSummary, Step},
    providers::{http_client, RouteProvider},
};

/// Driving directions from an OSRM `route/v1` service.
#[derive(Clone)]
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.user_agent, config.http_timeout)?,
            base_url: config.osrm_url.trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/driving/{},{};{},{}",
            self.base_url, origin.lon, origin.lat, destination.lon, destination.lat
        )
    }
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route> {
        let url = self.route_url(origin, destination);
        tracing::debug!("requesting route {url}");

        // OSRM answers 400 with a JSON body for unroutable requests, so the
        // status is judged from `code` rather than the HTTP status.
        let body: OsrmResponse = self
            .client
            .get(url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "true"),
            ])
            .send()
            .await?
            .json()
            .await?;

        into_route(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: Option<OsrmGeometry>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// `[lon, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    #[serde(default)]
    name: String,
    maneuver: Maneuver,
}

#[derive(Debug, Deserialize)]
struct Maneuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    #[serde(default)]
    bearing_after: Option<f64>,
    #[serde(default)]
    exit: Option<u32>,
}

pub fn into_route(body: OsrmResponse) -> Result<Route> {
    if body.code == "NoRoute" || body.code == "NoSegment" {
        return Err(ExploreError::NoResultsFound);
    }
    if body.code != "Ok" {
        return Err(ExploreError::ProviderUnavailable(format!(
            "routing service answered {}: {}",
            body.code,
            body.message.unwrap_or_default()
        )));
    }
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or(ExploreError::NoResultsFound)?;

    let steps = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| Step {
            text: instruction_text(step),
            distance_m: step.distance.max(0.0),
        })
        .collect();

    let geometry = route
        .geometry
        .map(|geometry| {
            geometry
                .coordinates
                .into_iter()
                .map(|[lon, lat]| Coordinate { lat, lon })
                .collect()
        })
        .unwrap_or_default();

    Ok(Route {
        summary: RouteSummary {
            distance_km: route.distance / 1000.0,
            duration_min: (route.duration / 60.0).round(),
        },
        steps,
        geometry,
    })
}

fn instruction_text(step: &OsrmStep) -> String {
    let maneuver = &step.maneuver;
    let modifier = maneuver.modifier.as_deref().unwrap_or("straight");
    let road = (!step.name.is_empty()).then_some(step.name.as_str());

    let base = match maneuver.kind.as_str() {
        "depart" => {
            let heading = maneuver.bearing_after.map(compass).unwrap_or("forward");
            format!("Head {heading}")
        }
        "arrive" => return "You have arrived at your destination".to_string(),
        "roundabout" | "rotary" => match maneuver.exit {
            Some(exit) => format!("Enter the roundabout and take the {} exit", ordinal(exit)),
            None => "Enter the roundabout".to_string(),
        },
        "fork" => format!("Keep {modifier} at the fork"),
        "merge" => format!("Merge {modifier}"),
        "on ramp" => format!("Take the ramp on the {modifier}"),
        "off ramp" => format!("Take the exit on the {modifier}"),
        "end of road" => format!("Turn {modifier} at the end of the road"),
        "continue" | "new name" => format!("Continue {modifier}"),
        _ if modifier == "straight" => "Continue straight".to_string(),
        _ if modifier == "uturn" => "Make a U-turn".to_string(),
        _ => format!("Turn {modifier}"),
    };

    match (maneuver.kind.as_str(), road) {
        ("depart", Some(road)) => format!("{base} on {road}"),
        (_, Some(road)) => format!("{base} onto {road}"),
        (_, None) => base,
    }
}

fn compass(bearing: f64) -> &'static str {
    const POINTS: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let index = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % POINTS.len();
    POINTS[index]
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
