//! Core types shared across Waypoint: camera state, geocoding features,
//! query parameters, geographic bounds, and runtime configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Camera state
// ---------------------------------------------------------------------------

/// What portion of the map is visible: center, zoom, tilt, and rotation.
///
/// `transition_duration` is in milliseconds and only tells the renderer how
/// long to animate towards this state; it plays no part in projection math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub transition_duration: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: -73.645,
            latitude: 45.56,
            zoom: 11.0,
            pitch: 0.0,
            bearing: -57.2,
            transition_duration: 0,
        }
    }
}

impl ViewState {
    /// Replace the center and zoom, keeping pitch and bearing.
    pub fn with_camera(self, camera: Camera, transition_duration: u64) -> Self {
        Self {
            longitude: camera.longitude,
            latitude: camera.latitude,
            zoom: camera.zoom,
            transition_duration,
            ..self
        }
    }
}

/// The part of a [`ViewState`] that a geocoder selection decides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

// ---------------------------------------------------------------------------
// Geocoding results
// ---------------------------------------------------------------------------

/// A single geocoding result, shaped like a Mapbox GeoJSON place feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: String,
    pub place_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub place_type: Vec<String>,
    #[serde(default)]
    pub relevance: f64,
    /// `[longitude, latitude]`
    pub center: [f64; 2],
    /// `[west, south, east, north]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub properties: serde_json::Value,
}

impl Feature {
    /// A point feature with no bounding box.
    pub fn point(id: impl Into<String>, place_name: impl Into<String>, center: [f64; 2]) -> Self {
        let place_name = place_name.into();
        Self {
            id: id.into(),
            text: place_name.clone(),
            place_name,
            place_type: Vec::new(),
            relevance: 1.0,
            center,
            bbox: None,
            properties: serde_json::Value::Null,
        }
    }

    pub fn with_bbox(mut self, bbox: [f64; 4]) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn bounds(&self) -> Option<LngLatBounds> {
        self.bbox.map(LngLatBounds::from_bbox)
    }
}

/// The body of a forward geocoding response. Only the features are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// A longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    /// Build from a GeoJSON-ordered bbox: `[west, south, east, north]`.
    pub fn from_bbox(bbox: [f64; 4]) -> Self {
        Self { west: bbox[0], south: bbox[1], east: bbox[2], north: bbox[3] }
    }

    /// Parse `"west,south,east,north"`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|e| format!("invalid coordinate '{p}': {e}")))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [w, s, e, n] => Ok(Self { west: *w, south: *s, east: *e, north: *n }),
            _ => Err(format!("expected 4 comma-separated values, got {}", parts.len())),
        }
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Optional parameters for a forward geocoding request.
///
/// Anything the API accepts that has no dedicated field goes in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// ISO 3166 alpha-2 country codes, comma separated (e.g. `"ca"`).
    pub country: Option<String>,
    pub language: Option<String>,
    /// Place types to restrict to (e.g. `address`, `poi`).
    #[serde(default)]
    pub types: Vec<String>,
    /// `[longitude, latitude]` to bias results towards.
    pub proximity: Option<[f64; 2]>,
    pub bbox: Option<[f64; 4]>,
    pub autocomplete: Option<bool>,
    pub fuzzy_match: Option<bool>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl QueryParams {
    /// Copy of these params with `limit` replaced.
    pub fn with_limit(&self, limit: usize) -> Self {
        Self { limit: Some(limit), ..self.clone() }
    }

    /// Render as URL query pairs in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(ref country) = self.country {
            pairs.push(("country".to_string(), country.clone()));
        }
        if let Some(ref language) = self.language {
            pairs.push(("language".to_string(), language.clone()));
        }
        if !self.types.is_empty() {
            pairs.push(("types".to_string(), self.types.join(",")));
        }
        if let Some([lon, lat]) = self.proximity {
            pairs.push(("proximity".to_string(), format!("{lon},{lat}")));
        }
        if let Some([w, s, e, n]) = self.bbox {
            pairs.push(("bbox".to_string(), format!("{w},{s},{e},{n}")));
        }
        if let Some(autocomplete) = self.autocomplete {
            pairs.push(("autocomplete".to_string(), autocomplete.to_string()));
        }
        if let Some(fuzzy) = self.fuzzy_match {
            pairs.push(("fuzzyMatch".to_string(), fuzzy.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        for (k, v) in &self.extra {
            pairs.push((k.clone(), v.clone()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Configuration — loaded from .waypoint.toml or defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/light-v10";

/// Runtime configuration for the map page and the geocoder widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointConfig {
    /// Mapbox access token. Empty means remote geocoding and map images are
    /// unavailable.
    pub access_token: String,
    pub map_style: String,
    pub initial_view: ViewState,
    /// Debounce quiet period in milliseconds.
    pub timeout_ms: u64,
    pub limit: usize,
    pub point_zoom: f64,
    pub transition_duration: u64,
    pub hide_on_select: bool,
    pub update_input_on_select: bool,
    pub local_only: bool,
    pub initial_input_value: String,
    pub query_params: QueryParams,
    /// TOML file of named places searched before the remote geocoder.
    pub gazetteer: Option<PathBuf>,
    /// Recognize typed coordinates as a result.
    pub coordinates: bool,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            map_style: DEFAULT_MAP_STYLE.to_string(),
            initial_view: ViewState::default(),
            timeout_ms: 300,
            limit: 5,
            point_zoom: 16.0,
            transition_duration: 0,
            hide_on_select: true,
            update_input_on_select: true,
            local_only: false,
            initial_input_value: String::new(),
            query_params: QueryParams { country: Some("ca".to_string()), ..Default::default() },
            gazetteer: None,
            coordinates: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_are_ordered_and_skip_unset() {
        let params = QueryParams {
            country: Some("ca".into()),
            types: vec!["address".into(), "poi".into()],
            proximity: Some([-73.6, 45.5]),
            ..Default::default()
        }
        .with_limit(3);
        let pairs = params.to_query_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["country", "types", "proximity", "limit"]);
        assert_eq!(pairs[1].1, "address,poi");
        assert_eq!(pairs[2].1, "-73.6,45.5");
        assert_eq!(pairs[3].1, "3");
    }

    #[test]
    fn with_limit_keeps_other_params() {
        let base = QueryParams { country: Some("ca".into()), limit: Some(5), ..Default::default() };
        let limited = base.with_limit(2);
        assert_eq!(limited.limit, Some(2));
        assert_eq!(limited.country.as_deref(), Some("ca"));
        assert_eq!(base.limit, Some(5));
    }

    #[test]
    fn feature_deserializes_from_mapbox_shape() {
        let json = r#"{
            "id": "place.123",
            "type": "Feature",
            "place_type": ["place"],
            "relevance": 1,
            "properties": {"wikidata": "Q340"},
            "text": "Montréal",
            "place_name": "Montréal, Quebec, Canada",
            "bbox": [-73.97, 45.41, -73.47, 45.70],
            "center": [-73.5878, 45.5088],
            "geometry": {"type": "Point", "coordinates": [-73.5878, 45.5088]}
        }"#;
        let f: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(f.place_name, "Montréal, Quebec, Canada");
        assert_eq!(f.center, [-73.5878, 45.5088]);
        assert_eq!(f.bbox, Some([-73.97, 45.41, -73.47, 45.70]));
        assert_eq!(f.place_type, vec!["place".to_string()]);
    }

    #[test]
    fn feature_without_bbox_has_no_bounds() {
        let f = Feature::point("a", "Somewhere", [1.0, 2.0]);
        assert!(f.bounds().is_none());
        assert_eq!(f.text, "Somewhere");
    }

    #[test]
    fn bounds_parse_rejects_wrong_arity() {
        assert!(LngLatBounds::parse("1,2,3").is_err());
        assert!(LngLatBounds::parse("a,2,3,4").is_err());
        let b = LngLatBounds::parse("-74, 45.4, -73.4, 45.7").unwrap();
        assert_eq!(b.west, -74.0);
        assert_eq!(b.north, 45.7);
    }

    #[test]
    fn with_camera_keeps_pitch_and_bearing() {
        let view = ViewState::default();
        let next = view.with_camera(Camera { longitude: 1.0, latitude: 2.0, zoom: 3.0 }, 500);
        assert_eq!(next.bearing, view.bearing);
        assert_eq!(next.pitch, view.pitch);
        assert_eq!(next.zoom, 3.0);
        assert_eq!(next.transition_duration, 500);
    }
}
