use crate::models::{Mood, Place};

/// Maximum number of places shown at once.
pub const DISPLAY_LIMIT: usize = 10;

/// Category keywords each mood accepts. `Mood::None` has none and accepts
/// everything.
pub fn keywords(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::None => &[],
        Mood::School => &["school", "college", "university"],
        Mood::Food => &["restaurant", "cafe", "fast_food"],
        Mood::Hospital => &["hospital", "clinic"],
        Mood::Theatre => &["cinema", "theatre"],
    }
}

/// Union of every mood's keywords, used as the search filter so one catalog
/// serves all moods.
pub fn search_categories() -> Vec<&'static str> {
    Mood::ALL.into_iter().flat_map(keywords).copied().collect()
}

pub fn matches(mood: Mood, category: Option<&str>) -> bool {
    let words = keywords(mood);
    if words.is_empty() {
        return true;
    }
    let Some(category) = category else {
        return false;
    };
    let category = category.to_ascii_lowercase();
    words.iter().any(|word| category.contains(word))
}

/// Derives the display list from the full catalog: mood match, then distance
/// cutoff, then the first [`DISPLAY_LIMIT`] in catalog order.
pub fn apply_filter(catalog: &[Place], mood: Mood, max_distance_km: f64) -> Vec<Place> {
    catalog
        .iter()
        .filter(|place| matches(mood, place.category.as_deref()))
        .filter(|place| place.distance_km <= max_distance_km)
        .take(DISPLAY_LIMIT)
        .cloned()
        .collect()
}
