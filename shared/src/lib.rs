use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A point of interest as returned by a places-search provider, before any
/// distance has been computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlace {
    pub id: u64,
    pub coord: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A place annotated with its distance from the catalog's reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: u64,
    pub coord: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub distance_km: f64,
}

impl Place {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unnamed place")
    }

    pub fn kind(&self) -> &str {
        self.category.as_deref().unwrap_or("Place")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub coord: Coordinate,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    None,
    School,
    Food,
    Hospital,
    Theatre,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::None,
        Mood::School,
        Mood::Food,
        Mood::Hospital,
        Mood::Theatre,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::None => "none",
            Mood::School => "school",
            Mood::Food => "food",
            Mood::Hospital => "hospital",
            Mood::Theatre => "theatre",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Mood::None => "Explore Nearby Places",
            Mood::School => "Best Places for Students",
            Mood::Food => "Top Food Spots Near You",
            Mood::Hospital => "Nearby Hospitals",
            Mood::Theatre => "Nearby Theatre & Cinemas",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMood(pub String);

impl fmt::Display for UnknownMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mood '{}'", self.0)
    }
}

impl std::error::Error for UnknownMood {}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Ok(Mood::None);
        }
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == needle)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub text: String,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub summary: RouteSummary,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub geometry: Vec<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub max_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesResponse {
    pub reference: Coordinate,
    pub mood: Mood,
    pub title: String,
    /// Size of the full catalog before filtering.
    pub total: usize,
    pub places: Vec<Place>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
