use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::ExplorerConfig,
    error::{ExploreError, Result},
    models::{Coordinate, LocationQuery},
    providers::{http_client, GeocodeProvider},
};

/// Label used when reverse geocoding finds nothing for a coordinate.
pub const FALLBACK_LABEL: &str = "Current Location";

#[derive(Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.user_agent, config.http_timeout)?,
            base_url: config.nominatim_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseHit {
    display_name: Option<String>,
}

#[async_trait]
impl GeocodeProvider for NominatimGeocoder {
    async fn forward(&self, text: &str) -> Result<LocationQuery> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ExploreError::InvalidInput("empty location query".into()));
        }

        let hits: Vec<SearchHit> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", text)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_hit(hits)
    }

    async fn reverse(&self, coord: Coordinate) -> Result<String> {
        let hit: ReverseHit = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(hit
            .display_name
            .unwrap_or_else(|| FALLBACK_LABEL.to_string()))
    }
}

fn first_hit(hits: Vec<SearchHit>) -> Result<LocationQuery> {
    let hit = hits.into_iter().next().ok_or(ExploreError::NoResultsFound)?;
    let parse = |value: &str| {
        value.parse::<f64>().map_err(|_| {
            ExploreError::ProviderUnavailable(format!("geocoder returned bad coordinate '{value}'"))
        })
    };
    let coord = Coordinate {
        lat: parse(&hit.lat)?,
        lon: parse(&hit.lon)?,
    };
    Ok(LocationQuery {
        coord: crate::models::validate_coordinate(coord)?,
        label: hit.display_name,
    })
}
