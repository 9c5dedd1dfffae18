use std::sync::Arc;

use crate::{
    geodesy::distance_km,
    models::{Coordinate, Place, RawPlace},
};

/// Every place found for one location query, nearest first.
///
/// Distances are only meaningful against `reference`; a catalog is never
/// patched, a new location query always produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    reference: Option<Coordinate>,
    places: Arc<[Place]>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            reference: None,
            places: Arc::from(Vec::new()),
        }
    }

    pub fn reference(&self) -> Option<Coordinate> {
        self.reference
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Place> {
        self.places.iter().find(|place| place.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

/// Annotates each record with its distance from `reference` and sorts them
/// ascending. The sort is stable so equal distances keep provider order.
pub fn build_catalog(records: Vec<RawPlace>, reference: Coordinate) -> Catalog {
    let mut places: Vec<Place> = records
        .into_iter()
        .map(|record| Place {
            distance_km: distance_km(reference, record.coord),
            id: record.id,
            coord: record.coord,
            category: record.category,
            display_name: record.name,
        })
        .collect();

    places.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    tracing::debug!(
        "built catalog of {} places around ({:.5}, {:.5})",
        places.len(),
        reference.lat,
        reference.lon
    );

    Catalog {
        reference: Some(reference),
        places: places.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: u64, lat: f64, lon: f64) -> RawPlace {
        RawPlace {
            id,
            coord: Coordinate { lat, lon },
            category: Some("cafe".into()),
            name: Some(format!("place {id}")),
        }
    }

    #[test]
    fn sorts_by_distance_from_reference() {
        let reference = Coordinate { lat: 45.0, lon: 5.0 };
        let catalog = build_catalog(
            vec![raw(1, 45.03, 5.0), raw(2, 45.01, 5.0), raw(3, 45.02, 5.0)],
            reference,
        );

        let ids: Vec<u64> = catalog.places().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(catalog.reference(), Some(reference));
        assert!(catalog.places().windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn equal_distances_keep_provider_order() {
        let reference = Coordinate { lat: 0.0, lon: 0.0 };
        // Same latitude offset north and south: identical distances.
        let records = vec![raw(7, 0.01, 0.0), raw(3, -0.01, 0.0), raw(5, 0.0, 0.05)];
        for _ in 0..3 {
            let catalog = build_catalog(records.clone(), reference);
            let ids: Vec<u64> = catalog.places().iter().map(|p| p.id).collect();
            assert_eq!(ids, vec![7, 3, 5]);
        }
    }

    #[test]
    fn carries_names_and_categories() {
        let catalog = build_catalog(vec![raw(1, 45.0, 5.0)], Coordinate { lat: 45.0, lon: 5.0 });
        let place = &catalog.places()[0];
        assert_eq!(place.distance_km, 0.0);
        assert_eq!(place.display_name.as_deref(), Some("place 1"));
        assert_eq!(place.category.as_deref(), Some("cafe"));
        assert_eq!(catalog.get(1).map(|p| p.id), Some(1));
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn empty_catalog_has_no_reference() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert_eq!(catalog.reference(), None);
    }
}
