//! External collaborators the explorer talks to.
//!
//! Each trait is object safe so the driver and the HTTP API can hold them as
//! `Arc<dyn _>`; tests swap in in-memory stubs.

pub mod nominatim;
pub mod osrm;
pub mod overpass;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{Coordinate, LocationQuery, RawPlace, Route},
};

pub use nominatim::NominatimGeocoder;
pub use osrm::OsrmRouter;
pub use overpass::OverpassSearch;

/// Finds points of interest around a centre point.
///
/// # Contract
/// - `categories` lists the category keywords to ask for; empty means any
/// - An empty `Vec` is a valid answer, not an error
#[async_trait]
pub trait PlaceSearchProvider: Send + Sync {
    async fn search(
        &self,
        center: Coordinate,
        radius_m: f64,
        categories: &[&str],
    ) -> Result<Vec<RawPlace>>;
}

#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Resolves free text to a coordinate. No match is `NoResultsFound`.
    async fn forward(&self, text: &str) -> Result<LocationQuery>;

    async fn reverse(&self, coord: Coordinate) -> Result<String>;
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route>;
}

pub(crate) fn http_client(
    user_agent: &str,
    timeout: std::time::Duration,
) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}
