//! Event loop that owns an [`Explorer`] and carries out its effects.
//!
//! All state changes happen on the driver task, one message at a time.
//! Provider calls run on spawned tasks and report back through the same
//! channel, tagged with the ticket they were issued under.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    config::ExplorerConfig,
    error::Result,
    models::{Coordinate, LocationQuery, Mood, RawPlace, Route},
    mood::search_categories,
    narration::{Narrator, SpeechSink},
    providers::{GeocodeProvider, PlaceSearchProvider, RouteProvider},
    session::{Effect, Explorer, QueryTicket, RouteTicket},
    surface::{MapSurface, Notice},
};

#[derive(Debug)]
pub enum Msg {
    SearchText(String),
    UseDeviceLocation(Coordinate),
    SelectLocation(LocationQuery),
    SetMood(Mood),
    SetMaxDistance(f64),
    PlaceClicked(u64),
    CancelRoute,
    ClearSelection,
    LocationFound(QueryTicket, Result<LocationQuery>),
    LocationNamed(QueryTicket, Coordinate, Result<String>),
    PlacesFetched(QueryTicket, Result<Vec<RawPlace>>),
    RouteFetched(RouteTicket, Result<Route>),
    Shutdown,
}

#[derive(Clone)]
pub struct Providers {
    pub places: Arc<dyn PlaceSearchProvider>,
    pub geocoder: Arc<dyn GeocodeProvider>,
    pub router: Arc<dyn RouteProvider>,
}

/// Sending side of a running driver.
#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<Msg>,
}

impl DriverHandle {
    /// Returns `false` once the driver has stopped.
    pub fn send(&self, msg: Msg) -> bool {
        self.tx.send(msg).is_ok()
    }

    pub fn search(&self, text: impl Into<String>) -> bool {
        self.send(Msg::SearchText(text.into()))
    }

    pub fn click(&self, place_id: u64) -> bool {
        self.send(Msg::PlaceClicked(place_id))
    }

    pub fn shutdown(&self) -> bool {
        self.send(Msg::Shutdown)
    }
}

pub struct Driver {
    explorer: Explorer,
    providers: Providers,
    narrator: Narrator,
    surface: Arc<dyn MapSurface>,
    search_radius_m: f64,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
}

impl Driver {
    pub fn new(
        config: &ExplorerConfig,
        providers: Providers,
        speech: Arc<dyn SpeechSink>,
        surface: Arc<dyn MapSurface>,
    ) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Self {
            explorer: Explorer::new(config.default_max_distance_km),
            providers,
            narrator: Narrator::with_interval(speech, config.narration_interval),
            surface,
            search_radius_m: config.search_radius_m,
            tx: tx.clone(),
            rx,
        };
        (driver, DriverHandle { tx })
    }

    /// Processes messages until [`Msg::Shutdown`]. Returns the final state.
    pub async fn run(mut self) -> Explorer {
        self.surface.render(&self.explorer.view());
        while let Some(msg) = self.rx.recv().await {
            if matches!(msg, Msg::Shutdown) {
                break;
            }
            self.handle(msg);
        }
        self.narrator.cancel();
        tracing::info!("driver stopped");
        self.explorer
    }

    pub fn handle(&mut self, msg: Msg) {
        let outcome = match msg {
            Msg::SearchText(text) => self.explorer.search_text(&text),
            Msg::UseDeviceLocation(coord) => self.explorer.use_device_location(coord),
            Msg::SelectLocation(query) => self.explorer.select_location(query),
            Msg::SetMood(mood) => {
                self.explorer.set_mood(mood);
                Ok(Vec::new())
            }
            Msg::SetMaxDistance(km) => self.explorer.set_max_distance(km).map(|()| Vec::new()),
            Msg::PlaceClicked(id) => self.explorer.select_place(id),
            Msg::CancelRoute => Ok(self.explorer.cancel_route()),
            Msg::ClearSelection => Ok(self.explorer.clear_selection()),
            Msg::LocationFound(ticket, result) => {
                Ok(self.explorer.lookup_resolved(ticket, result))
            }
            Msg::LocationNamed(ticket, coord, result) => {
                Ok(self.explorer.reverse_resolved(ticket, coord, result))
            }
            Msg::PlacesFetched(ticket, result) => {
                // Stale catalogs are dropped without a notice.
                let _ = self.explorer.catalog_loaded(ticket, result);
                Ok(Vec::new())
            }
            Msg::RouteFetched(ticket, result) => Ok(self.explorer.route_resolved(ticket, result)),
            Msg::Shutdown => Ok(Vec::new()),
        };

        match outcome {
            Ok(effects) => effects.into_iter().for_each(|effect| self.perform(effect)),
            Err(err) => {
                tracing::warn!("rejected input: {err}");
                self.explorer.set_notice(Notice::InvalidInput(err.to_string()));
            }
        }

        self.surface.render(&self.explorer.view());
    }

    fn perform(&self, effect: Effect) {
        let tx = self.tx.clone();
        match effect {
            Effect::CancelNarration => self.narrator.cancel(),
            Effect::StartNarration(steps) => {
                self.narrator.schedule(steps);
            }
            Effect::Geocode { ticket, text } => {
                let geocoder = Arc::clone(&self.providers.geocoder);
                tokio::spawn(async move {
                    let result = geocoder.forward(&text).await;
                    let _ = tx.send(Msg::LocationFound(ticket, result));
                });
            }
            Effect::ReverseGeocode { ticket, coord } => {
                let geocoder = Arc::clone(&self.providers.geocoder);
                tokio::spawn(async move {
                    let result = geocoder.reverse(coord).await;
                    let _ = tx.send(Msg::LocationNamed(ticket, coord, result));
                });
            }
            Effect::FetchCatalog { ticket, center } => {
                let places = Arc::clone(&self.providers.places);
                let radius_m = self.search_radius_m;
                tokio::spawn(async move {
                    let categories = search_categories();
                    let result = places.search(center, radius_m, &categories).await;
                    let _ = tx.send(Msg::PlacesFetched(ticket, result));
                });
            }
            Effect::FetchRoute {
                ticket,
                origin,
                destination,
            } => {
                let router = Arc::clone(&self.providers.router);
                tokio::spawn(async move {
                    let result = router.route(origin, destination).await;
                    let _ = tx.send(Msg::RouteFetched(ticket, result));
                });
            }
        }
    }
}
