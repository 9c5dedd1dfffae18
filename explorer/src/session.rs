//! Selection state and the lifecycle of the single live route session.
//!
//! [`Explorer`] is the one owner of the current query, the current session
//! and the filter parameters. It performs no I/O: every operation returns the
//! [`Effect`]s the caller must carry out, and provider results come back in
//! through the `*_resolved` / `*_loaded` methods together with the ticket they
//! were issued under. A result whose ticket is no longer current is dropped.

use serde::Serialize;

use crate::{
    catalog::{build_catalog, Catalog},
    config::DEFAULT_MAX_DISTANCE_KM,
    error::{ExploreError, Result},
    models::{
        validate_coordinate, Coordinate, LocationQuery, Mood, Place, RawPlace, Route,
        RouteSummary, Step,
    },
    mood::apply_filter,
    providers::nominatim::FALLBACK_LABEL,
    surface::{Notice, RouteView, View},
};

/// Stamp for a location lookup or catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryTicket(u64);

/// Stamp for a route request: the session it belongs to and the
/// origin/destination pair it was issued for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    session: u64,
    origin: Coordinate,
    destination: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Idle,
    Requesting,
    Active,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    Idle,
    Locating,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSession {
    id: u64,
    pub origin: Option<Coordinate>,
    pub destination: Option<Place>,
    pub status: RouteStatus,
    pub instructions: Vec<Step>,
    pub summary: Option<RouteSummary>,
    pub geometry: Vec<Coordinate>,
}

impl RouteSession {
    fn idle(id: u64, origin: Option<Coordinate>) -> Self {
        Self {
            id,
            origin,
            destination: None,
            status: RouteStatus::Idle,
            instructions: Vec::new(),
            summary: None,
            geometry: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn is_live(&self) -> bool {
        matches!(self.status, RouteStatus::Requesting | RouteStatus::Active)
    }
}

/// Work the owner of an [`Explorer`] has to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Geocode { ticket: QueryTicket, text: String },
    ReverseGeocode { ticket: QueryTicket, coord: Coordinate },
    FetchCatalog { ticket: QueryTicket, center: Coordinate },
    FetchRoute { ticket: RouteTicket, origin: Coordinate, destination: Coordinate },
    StartNarration(Vec<Step>),
    CancelNarration,
}

#[derive(Debug, Clone)]
pub struct Explorer {
    next_ticket: u64,
    pending_lookup: Option<QueryTicket>,
    catalog_ticket: Option<QueryTicket>,
    location: Option<LocationQuery>,
    catalog: Catalog,
    catalog_status: CatalogStatus,
    mood: Mood,
    max_distance_km: f64,
    next_session: u64,
    session: RouteSession,
    notice: Option<Notice>,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE_KM)
    }
}

impl Explorer {
    /// Starts with no location. A cap that is not a finite, non-negative
    /// number is replaced by [`DEFAULT_MAX_DISTANCE_KM`].
    pub fn new(max_distance_km: f64) -> Self {
        let max_distance_km = if max_distance_km.is_finite() && max_distance_km >= 0.0 {
            max_distance_km
        } else {
            tracing::warn!(
                "invalid max distance {max_distance_km}, using {DEFAULT_MAX_DISTANCE_KM} km"
            );
            DEFAULT_MAX_DISTANCE_KM
        };
        Self {
            next_ticket: 0,
            pending_lookup: None,
            catalog_ticket: None,
            location: None,
            catalog: Catalog::empty(),
            catalog_status: CatalogStatus::Idle,
            mood: Mood::None,
            max_distance_km,
            next_session: 1,
            session: RouteSession::idle(0, None),
            notice: None,
        }
    }

    pub fn location(&self) -> Option<&LocationQuery> {
        self.location.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        self.catalog_status
    }

    pub fn session(&self) -> &RouteSession {
        &self.session
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// The display list, always re-derived from the full catalog.
    pub fn display_list(&self) -> Vec<Place> {
        apply_filter(self.catalog.places(), self.mood, self.max_distance_km)
    }

    // ── Location ─────────────────────────────────────────────────────────────

    /// Starts a forward geocode for `text`. Supersedes any pending lookup.
    pub fn search_text(&mut self, text: &str) -> Result<Vec<Effect>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExploreError::InvalidInput("empty location query".into()));
        }
        let ticket = self.issue_lookup();
        tracing::info!("looking up location {text:?}");
        Ok(vec![Effect::Geocode {
            ticket,
            text: text.to_string(),
        }])
    }

    /// Starts a reverse geocode so the device position gets a readable label.
    pub fn use_device_location(&mut self, coord: Coordinate) -> Result<Vec<Effect>> {
        let coord = validate_coordinate(coord)?;
        let ticket = self.issue_lookup();
        Ok(vec![Effect::ReverseGeocode { ticket, coord }])
    }

    pub fn lookup_resolved(
        &mut self,
        ticket: QueryTicket,
        result: Result<LocationQuery>,
    ) -> Vec<Effect> {
        if !self.take_lookup(ticket) {
            return Vec::new();
        }
        match result.and_then(|query| self.select_location(query)) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::warn!("location lookup failed: {err}");
                self.catalog_status = self.settled_catalog_status();
                self.notice = Some(match err {
                    ExploreError::NoResultsFound => Notice::LocationNotFound,
                    ExploreError::InvalidInput(detail) => Notice::InvalidInput(detail),
                    other => Notice::ProviderUnavailable(other.to_string()),
                });
                Vec::new()
            }
        }
    }

    /// A failed reverse lookup still selects the position, under a generic label.
    pub fn reverse_resolved(
        &mut self,
        ticket: QueryTicket,
        coord: Coordinate,
        result: Result<String>,
    ) -> Vec<Effect> {
        let label = result.unwrap_or_else(|err| {
            tracing::warn!("reverse geocoding failed: {err}");
            FALLBACK_LABEL.to_string()
        });
        self.lookup_resolved(ticket, Ok(LocationQuery { coord, label }))
    }

    /// Makes `query` the current location: drops the catalog, the selection
    /// and the route session, and issues a fresh catalog fetch.
    pub fn select_location(&mut self, query: LocationQuery) -> Result<Vec<Effect>> {
        validate_coordinate(query.coord)?;

        let ticket = self.next_ticket();
        self.pending_lookup = None;
        self.catalog_ticket = Some(ticket);
        self.catalog = Catalog::empty();
        self.catalog_status = CatalogStatus::Loading;
        self.notice = None;
        self.reset_session(Some(query.coord));

        tracing::info!(
            "location set to {:?} ({:.5}, {:.5})",
            query.label,
            query.coord.lat,
            query.coord.lon
        );
        let center = query.coord;
        self.location = Some(query);

        Ok(vec![
            Effect::CancelNarration,
            Effect::FetchCatalog { ticket, center },
        ])
    }

    /// Applies a catalog fetch result. A result for anything but the current
    /// query is dropped with `StaleResult`.
    pub fn catalog_loaded(
        &mut self,
        ticket: QueryTicket,
        result: Result<Vec<RawPlace>>,
    ) -> Result<()> {
        let reference = match (&self.location, self.catalog_ticket) {
            (Some(location), Some(current)) if current == ticket => location.coord,
            _ => {
                tracing::debug!("discarding stale catalog {ticket:?}");
                return Err(ExploreError::StaleResult);
            }
        };
        self.catalog_ticket = None;

        match result {
            Ok(records) => {
                self.catalog = build_catalog(records, reference);
                self.catalog_status = CatalogStatus::Ready;
                if self.catalog.is_empty() {
                    self.notice = Some(Notice::NoPlacesFound);
                }
                tracing::info!("catalog ready with {} places", self.catalog.len());
            }
            Err(err) => {
                tracing::warn!("place search failed: {err}");
                self.catalog = Catalog::empty();
                self.catalog_status = CatalogStatus::Failed;
                self.notice = Some(match err {
                    ExploreError::NoResultsFound => Notice::NoPlacesFound,
                    other => Notice::ProviderUnavailable(other.to_string()),
                });
            }
        }
        Ok(())
    }

    // ── Filters ──────────────────────────────────────────────────────────────

    pub fn set_mood(&mut self, mood: Mood) {
        tracing::debug!("mood set to {mood}");
        self.mood = mood;
    }

    pub fn set_max_distance(&mut self, km: f64) -> Result<()> {
        if !km.is_finite() || km < 0.0 {
            return Err(ExploreError::InvalidInput(format!(
                "max distance must be a non-negative number, got {km}"
            )));
        }
        self.max_distance_km = km;
        Ok(())
    }

    // ── Route session ────────────────────────────────────────────────────────

    /// Selects a place from the current catalog and requests a route to it.
    ///
    /// Any live session is cancelled first. Selecting the place that is
    /// already selected restarts its session from scratch.
    pub fn select_place(&mut self, place_id: u64) -> Result<Vec<Effect>> {
        let origin = self
            .location
            .as_ref()
            .map(|location| location.coord)
            .ok_or_else(|| ExploreError::InvalidInput("no location selected".into()))?;
        let place = self
            .catalog
            .get(place_id)
            .cloned()
            .ok_or_else(|| ExploreError::InvalidInput(format!("unknown place {place_id}")))?;

        if self.session.is_live() {
            tracing::info!(
                "cancelling route session {} ({:?})",
                self.session.id,
                self.session.status
            );
            self.session.status = RouteStatus::Cancelled;
        }

        self.reset_session(Some(origin));
        self.session.destination = Some(place.clone());
        self.session.status = RouteStatus::Requesting;
        if matches!(self.notice, Some(Notice::RouteFailed(_))) {
            self.notice = None;
        }

        let ticket = RouteTicket {
            session: self.session.id,
            origin,
            destination: place.id,
        };
        tracing::info!(
            "route session {} requesting {} ({:.2} km away)",
            self.session.id,
            place.label(),
            place.distance_km
        );

        Ok(vec![
            Effect::CancelNarration,
            Effect::FetchRoute {
                ticket,
                origin,
                destination: place.coord,
            },
        ])
    }

    pub fn route_resolved(&mut self, ticket: RouteTicket, result: Result<Route>) -> Vec<Effect> {
        if !self.is_current_route(ticket) {
            tracing::debug!("discarding stale route for session {}", ticket.session);
            return Vec::new();
        }

        match result {
            Ok(route) => {
                tracing::info!(
                    "route session {} active: {:.1} km, {} min, {} steps",
                    self.session.id,
                    route.summary.distance_km,
                    route.summary.duration_min,
                    route.steps.len()
                );
                self.session.status = RouteStatus::Active;
                self.session.summary = Some(route.summary);
                self.session.geometry = route.geometry;
                self.session.instructions = route.steps;
                vec![Effect::StartNarration(self.session.instructions.clone())]
            }
            Err(err) => {
                tracing::warn!("route session {} failed: {err}", self.session.id);
                self.session.status = RouteStatus::Failed;
                self.notice = Some(Notice::RouteFailed(err.to_string()));
                Vec::new()
            }
        }
    }

    /// Cancels the live session, keeping the selected place.
    pub fn cancel_route(&mut self) -> Vec<Effect> {
        if !self.session.is_live() {
            return Vec::new();
        }
        tracing::info!("route session {} cancelled", self.session.id);
        self.session.status = RouteStatus::Cancelled;
        vec![Effect::CancelNarration]
    }

    /// Drops the selected place; the session goes back to idle.
    pub fn clear_selection(&mut self) -> Vec<Effect> {
        let origin = self.location.as_ref().map(|location| location.coord);
        self.reset_session(origin);
        vec![Effect::CancelNarration]
    }

    pub fn view(&self) -> View {
        View {
            location: self.location.clone(),
            mood: self.mood,
            title: self.mood.title(),
            max_distance_km: self.max_distance_km,
            loading: matches!(
                self.catalog_status,
                CatalogStatus::Locating | CatalogStatus::Loading
            ),
            catalog_size: self.catalog.len(),
            places: self.display_list(),
            selected: self.session.destination.clone(),
            route: RouteView {
                status: self.session.status,
                summary: self.session.summary,
                steps: self.session.instructions.clone(),
                geometry: self.session.geometry.clone(),
            },
            notice: self.notice.clone(),
        }
    }

    fn next_ticket(&mut self) -> QueryTicket {
        self.next_ticket += 1;
        QueryTicket(self.next_ticket)
    }

    fn issue_lookup(&mut self) -> QueryTicket {
        let ticket = self.next_ticket();
        self.pending_lookup = Some(ticket);
        self.catalog_status = CatalogStatus::Locating;
        ticket
    }

    fn take_lookup(&mut self, ticket: QueryTicket) -> bool {
        if self.pending_lookup == Some(ticket) {
            self.pending_lookup = None;
            true
        } else {
            tracing::debug!("discarding stale location lookup {ticket:?}");
            false
        }
    }

    fn settled_catalog_status(&self) -> CatalogStatus {
        match (self.catalog_ticket, self.location.is_some()) {
            (Some(_), _) => CatalogStatus::Loading,
            (None, true) => CatalogStatus::Ready,
            (None, false) => CatalogStatus::Idle,
        }
    }

    fn reset_session(&mut self, origin: Option<Coordinate>) {
        let id = self.next_session;
        self.next_session += 1;
        self.session = RouteSession::idle(id, origin);
    }

    fn is_current_route(&self, ticket: RouteTicket) -> bool {
        self.session.status == RouteStatus::Requesting
            && self.session.id == ticket.session
            && self.session.origin == Some(ticket.origin)
            && self
                .session
                .destination
                .as_ref()
                .is_some_and(|place| place.id == ticket.destination)
    }
}
