//! Local (offline) result sources that are merged ahead of remote results.
//!
//! - [`Gazetteer`] — named places loaded from a TOML file
//! - [`CoordinateGeocoder`] — turns typed coordinates into a point result
//! - [`ChainGeocoder`] — concatenates several sources

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::types::Feature;

/// A synchronous source of results for a query.
pub trait LocalGeocoder: Send + Sync {
    fn search(&self, query: &str) -> Vec<Feature>;
}

impl<F> LocalGeocoder for F
where
    F: Fn(&str) -> Vec<Feature> + Send + Sync,
{
    fn search(&self, query: &str) -> Vec<Feature> {
        self(query)
    }
}

fn tag_local(mut feature: Feature) -> Feature {
    feature.properties = serde_json::json!({ "source": "local" });
    feature
}

// ---------------------------------------------------------------------------
// Gazetteer
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GazetteerFile {
    #[serde(default)]
    place: Vec<GazetteerEntry>,
}

#[derive(Deserialize)]
struct GazetteerEntry {
    name: String,
    center: [f64; 2],
    bbox: Option<[f64; 4]>,
    place_type: Option<String>,
}

struct Place {
    name_lower: String,
    feature: Feature,
}

/// A fixed list of named places, searched by name.
///
/// ```toml
/// [[place]]
/// name = "Parc du Mont-Royal"
/// center = [-73.5873, 45.5048]
/// bbox = [-73.5957, 45.4980, -73.5788, 45.5134]
/// place_type = "poi"
/// ```
pub struct Gazetteer {
    places: Vec<Place>,
}

impl Gazetteer {
    pub fn from_features(features: Vec<Feature>) -> Self {
        let places = features
            .into_iter()
            .map(|f| Place { name_lower: f.place_name.to_lowercase(), feature: tag_local(f) })
            .collect();
        Self { places }
    }

    /// Parse gazetteer TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let file: GazetteerFile =
            toml::from_str(content).map_err(|e| format!("invalid gazetteer: {e}"))?;
        let features = file
            .place
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut f = Feature::point(format!("local.{i}"), entry.name, entry.center);
                f.bbox = entry.bbox;
                f.place_type = entry.place_type.into_iter().collect();
                f
            })
            .collect();
        Ok(Self::from_features(features))
    }

    /// Load a gazetteer TOML file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {e}", path.display()))?;
        let gazetteer = Self::from_toml(&content)?;
        info!(path = %path.display(), places = gazetteer.len(), "Loaded gazetteer");
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl LocalGeocoder for Gazetteer {
    /// Case-insensitive match on the place name. Prefix matches come first,
    /// then substring matches, each in file order.
    fn search(&self, query: &str) -> Vec<Feature> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut prefix = Vec::new();
        let mut contains = Vec::new();
        for place in &self.places {
            if place.name_lower.starts_with(&needle) {
                prefix.push(place.feature.clone());
            } else if place.name_lower.contains(&needle) {
                contains.push(place.feature.clone());
            }
        }
        prefix.extend(contains);
        debug!(query, hits = prefix.len(), "Gazetteer lookup");
        prefix
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Recognizes coordinate input like `45.5017, -73.5673`.
///
/// Pairs are read as latitude, longitude. When the first value cannot be a
/// latitude (|v| > 90) the pair is read as longitude, latitude instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateGeocoder;

impl CoordinateGeocoder {
    /// `[longitude, latitude]` if `query` is a coordinate pair.
    pub fn parse(query: &str) -> Option<[f64; 2]> {
        let parts: Vec<&str> = query
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        let [a, b] = parts.as_slice() else {
            return None;
        };
        let a: f64 = a.parse().ok()?;
        let b: f64 = b.parse().ok()?;
        if !a.is_finite() || !b.is_finite() {
            return None;
        }
        let (lon, lat) = if a.abs() <= 90.0 { (b, a) } else { (a, b) };
        if lat.abs() > 90.0 || lon.abs() > 180.0 {
            return None;
        }
        Some([lon, lat])
    }
}

impl LocalGeocoder for CoordinateGeocoder {
    fn search(&self, query: &str) -> Vec<Feature> {
        match Self::parse(query) {
            Some([lon, lat]) => {
                let mut f = Feature::point(
                    format!("coordinate.{lon},{lat}"),
                    format!("{lat:.5}, {lon:.5}"),
                    [lon, lat],
                );
                f.place_type = vec!["coordinate".to_string()];
                vec![tag_local(f)]
            }
            None => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Runs each source in order and concatenates the results.
#[derive(Default)]
pub struct ChainGeocoder {
    sources: Vec<Box<dyn LocalGeocoder>>,
}

impl ChainGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl LocalGeocoder + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl LocalGeocoder for ChainGeocoder {
    fn search(&self, query: &str) -> Vec<Feature> {
        self.sources.iter().flat_map(|s| s.search(query)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACES: &str = r#"
        [[place]]
        name = "Old Port of Montreal"
        center = [-73.5525, 45.5075]
        bbox = [-73.5600, 45.5010, -73.5440, 45.5130]
        place_type = "poi"

        [[place]]
        name = "Parc du Mont-Royal"
        center = [-73.5873, 45.5048]

        [[place]]
        name = "Montreal Botanical Garden"
        center = [-73.5560, 45.5600]
    "#;

    #[test]
    fn gazetteer_prefix_before_substring() {
        let g = Gazetteer::from_toml(PLACES).unwrap();
        assert_eq!(g.len(), 3);
        let hits = g.search("mont");
        let names: Vec<&str> = hits.iter().map(|f| f.place_name.as_str()).collect();
        assert_eq!(names, vec!["Montreal Botanical Garden", "Old Port of Montreal", "Parc du Mont-Royal"]);
    }

    #[test]
    fn gazetteer_keeps_bbox_and_tags_source() {
        let g = Gazetteer::from_toml(PLACES).unwrap();
        let hits = g.search("old port");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].bbox.is_some());
        assert_eq!(hits[0].place_type, vec!["poi".to_string()]);
        assert_eq!(hits[0].properties["source"], "local");
    }

    #[test]
    fn gazetteer_empty_query_matches_nothing() {
        let g = Gazetteer::from_toml(PLACES).unwrap();
        assert!(g.search("   ").is_empty());
    }

    #[test]
    fn gazetteer_rejects_bad_toml() {
        assert!(Gazetteer::from_toml("[[place]]\nname = 3").is_err());
    }

    #[test]
    fn coordinates_lat_lon_and_lon_lat() {
        assert_eq!(CoordinateGeocoder::parse("45.5, -73.6"), Some([-73.6, 45.5]));
        assert_eq!(CoordinateGeocoder::parse("-123.1 49.28"), Some([-123.1, 49.28]));
        assert_eq!(CoordinateGeocoder::parse("montreal"), None);
        assert_eq!(CoordinateGeocoder::parse("1, 2, 3"), None);
        assert_eq!(CoordinateGeocoder::parse("200, 95"), None);
    }

    #[test]
    fn coordinate_result_is_a_point() {
        let hits = CoordinateGeocoder.search("45.5, -73.6");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].center, [-73.6, 45.5]);
        assert!(hits[0].bbox.is_none());
        assert_eq!(hits[0].place_name, "45.50000, -73.60000");
    }

    #[test]
    fn chain_concatenates_in_order() {
        let chain = ChainGeocoder::new()
            .with(CoordinateGeocoder)
            .with(|q: &str| vec![Feature::point("x", format!("echo {q}"), [0.0, 0.0])]);
        let hits = chain.search("10, 20");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].center, [20.0, 10.0]);
        assert_eq!(hits[1].place_name, "echo 10, 20");
    }
}
