use serde::Serialize;
use tokio::sync::watch;

use crate::{
    models::{Coordinate, LocationQuery, Mood, Place, RouteSummary, Step},
    session::RouteStatus,
};

/// Something the user should see instead of (or next to) results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    LocationNotFound,
    NoPlacesFound,
    ProviderUnavailable(String),
    RouteFailed(String),
    InvalidInput(String),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::LocationNotFound => f.write_str("Location not found. Try a clearer address."),
            Notice::NoPlacesFound => f.write_str("No places found nearby."),
            Notice::ProviderUnavailable(detail) => write!(f, "Service unavailable: {detail}"),
            Notice::RouteFailed(detail) => write!(f, "No route: {detail}"),
            Notice::InvalidInput(detail) => write!(f, "Invalid input: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteView {
    pub status: RouteStatus,
    pub summary: Option<RouteSummary>,
    pub steps: Vec<Step>,
    pub geometry: Vec<Coordinate>,
}

/// Immutable snapshot of everything a map or list needs to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub location: Option<LocationQuery>,
    pub mood: Mood,
    pub title: &'static str,
    pub max_distance_km: f64,
    pub loading: bool,
    pub catalog_size: usize,
    pub places: Vec<Place>,
    pub selected: Option<Place>,
    pub route: RouteView,
    pub notice: Option<Notice>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            location: None,
            mood: Mood::None,
            title: Mood::None.title(),
            max_distance_km: crate::config::DEFAULT_MAX_DISTANCE_KM,
            loading: false,
            catalog_size: 0,
            places: Vec::new(),
            selected: None,
            route: RouteView {
                status: RouteStatus::Idle,
                summary: None,
                steps: Vec::new(),
                geometry: Vec::new(),
            },
            notice: None,
        }
    }
}

/// Rendering side of the app. Place clicks travel back to the driver as
/// [`crate::driver::Msg::PlaceClicked`].
pub trait MapSurface: Send + Sync {
    fn render(&self, view: &View);
}

/// Publishes every rendered view on a watch channel.
pub struct WatchSurface {
    tx: watch::Sender<View>,
}

impl WatchSurface {
    pub fn new() -> (Self, watch::Receiver<View>) {
        let (tx, rx) = watch::channel(View::default());
        (Self { tx }, rx)
    }
}

impl MapSurface for WatchSurface {
    fn render(&self, view: &View) {
        self.tx.send_replace(view.clone());
    }
}
