use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::ExplorerConfig,
    error::{ExploreError, Result},
    models::{Coordinate, RawPlace},
    providers::{http_client, PlaceSearchProvider},
};

/// Tags checked, in order, for a category label.
const CATEGORY_TAGS: [&str; 3] = ["amenity", "tourism", "historic"];

/// Places search backed by an Overpass API interpreter endpoint.
#[derive(Clone)]
pub struct OverpassSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl OverpassSearch {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.user_agent, config.http_timeout)?,
            endpoint: config.overpass_url.clone(),
        })
    }
}

#[async_trait]
impl PlaceSearchProvider for OverpassSearch {
    async fn search(
        &self,
        center: Coordinate,
        radius_m: f64,
        categories: &[&str],
    ) -> Result<Vec<RawPlace>> {
        let query = build_query(center, radius_m, categories)?;
        tracing::debug!("overpass query: {query}");

        let body = self
            .client
            .post(&self.endpoint)
            .body(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let places = parse_body(&body)?;

        tracing::debug!("overpass returned {} places", places.len());
        Ok(places)
    }
}

pub fn build_query(center: Coordinate, radius_m: f64, categories: &[&str]) -> Result<String> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(ExploreError::InvalidInput(format!(
            "search radius must be a positive number of metres, got {radius_m}"
        )));
    }
    let filter = if categories.is_empty() {
        "[amenity]".to_string()
    } else {
        format!("[amenity~\"{}\"]", categories.join("|"))
    };
    Ok(format!(
        "[out:json];node(around:{:.0},{},{}){};out;",
        radius_m, center.lat, center.lon, filter
    ))
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Keeps nodes that carry a position; ways and relations without a centre
/// are skipped.
fn parse_elements(response: OverpassResponse) -> Vec<RawPlace> {
    response
        .elements
        .into_iter()
        .filter_map(|element| {
            let coord = Coordinate {
                lat: element.lat?,
                lon: element.lon?,
            };
            if !coord.is_valid() {
                return None;
            }
            let category = CATEGORY_TAGS
                .iter()
                .find_map(|tag| element.tags.get(*tag).cloned());
            Some(RawPlace {
                id: element.id,
                coord,
                category,
                name: element.tags.get("name").cloned(),
            })
        })
        .collect()
}

pub fn parse_body(body: &str) -> Result<Vec<RawPlace>> {
    let response: OverpassResponse = serde_json::from_str(body).map_err(ExploreError::from)?;
    Ok(parse_elements(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lists_every_category() {
        let query = build_query(
            Coordinate { lat: 48.85, lon: 2.35 },
            2000.0,
            &["school", "cafe"],
        )
        .unwrap();
        assert_eq!(
            query,
            "[out:json];node(around:2000,48.85,2.35)[amenity~\"school|cafe\"];out;"
        );
    }

    #[test]
    fn query_without_categories_asks_for_any_amenity() {
        let query = build_query(Coordinate { lat: 1.0, lon: 2.0 }, 500.0, &[]).unwrap();
        assert!(query.contains("[amenity]"));
    }

    #[test]
    fn query_rejects_unusable_radius() {
        let center = Coordinate { lat: 45.0, lon: 5.0 };
        for radius_m in [-500.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                build_query(center, radius_m, &["cafe"]),
                Err(ExploreError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn search_with_negative_radius_fails_before_any_request() {
        let search = OverpassSearch::new(&ExplorerConfig {
            overpass_url: "http://127.0.0.1:9/unreachable".to_string(),
            ..ExplorerConfig::default()
        })
        .unwrap();
        let result = search
            .search(Coordinate { lat: 45.0, lon: 5.0 }, -500.0, &["cafe"])
            .await;
        assert!(matches!(result, Err(ExploreError::InvalidInput(_))));
    }

    #[test]
    fn parses_nodes_and_falls_back_across_tags() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 48.85, "lon": 2.35,
                 "tags": {"amenity": "cafe", "name": "Chez Paul"}},
                {"type": "node", "id": 2, "lat": 48.86, "lon": 2.36,
                 "tags": {"tourism": "museum"}},
                {"type": "way", "id": 3},
                {"type": "node", "id": 4, "lat": 48.87, "lon": 2.37}
            ]
        }"#;
        let places = parse_body(body).unwrap();

        assert_eq!(places.len(), 3);
        assert_eq!(places[0].category.as_deref(), Some("cafe"));
        assert_eq!(places[0].name.as_deref(), Some("Chez Paul"));
        assert_eq!(places[1].category.as_deref(), Some("museum"));
        assert_eq!(places[1].name, None);
        assert_eq!(places[2].id, 4);
        assert_eq!(places[2].category, None);
    }

    #[test]
    fn malformed_payload_is_provider_unavailable() {
        assert!(matches!(
            parse_body("<html>"),
            Err(ExploreError::ProviderUnavailable(_))
        ));
    }
}
