//! Waypoint — map camera state and a debounced address autocomplete.
//!
//! # Modules
//!
//! - [`types`] — Camera state, geocoding features, query params, configuration
//! - [`viewport`] — Web Mercator projection, bounds fitting, pan/zoom gestures
//! - [`mapbox`] — Mapbox geocoding client and Static Images URLs
//! - [`local`] — Offline result sources (gazetteer, typed coordinates)
//! - [`autocomplete`] — The geocoder widget state machine
//! - [`page`] — Page-level container owning the shared camera

pub mod autocomplete;
pub mod local;
pub mod mapbox;
pub mod page;
pub mod types;
pub mod viewport;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use autocomplete::GeocoderOptions;
use local::{ChainGeocoder, CoordinateGeocoder, Gazetteer};
use page::MapStyle;
use types::*;

/// Environment variable consulted when no token is configured.
pub const TOKEN_ENV_VAR: &str = "MAPBOX_ACCESS_TOKEN";

/// Project-local config file name.
pub const CONFIG_FILE_NAME: &str = ".waypoint.toml";

// ---------------------------------------------------------------------------
// Cross-platform path helpers
// ---------------------------------------------------------------------------

/// Platform-aware home directory: `HOME` on Unix, `USERPROFILE` on Windows.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok().map(PathBuf::from)
}

/// Platform-aware config directory: `~/.waypoint` on Unix, `%APPDATA%/waypoint` on Windows.
pub fn config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        std::env::var("APPDATA").ok().map(|a| PathBuf::from(a).join("waypoint"))
    } else {
        home_dir().map(|h| h.join(".waypoint"))
    }
}

// ---------------------------------------------------------------------------
// .waypoint.toml config loading
// ---------------------------------------------------------------------------

/// Known keys in `.waypoint.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &[
    "access_token",
    "map_style",
    "initial_view",
    "timeout_ms",
    "limit",
    "point_zoom",
    "transition_duration",
    "hide_on_select",
    "update_input_on_select",
    "local_only",
    "initial_input_value",
    "country",
    "language",
    "types",
    "proximity",
    "gazetteer",
    "coordinates",
];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Where the config for `project_root` comes from: `.waypoint.toml` in the
/// project, else `config.toml` in [`config_dir`].
pub fn config_path(project_root: &Path) -> Option<PathBuf> {
    let local = project_root.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    config_dir().map(|d| d.join("config.toml")).filter(|p| p.exists())
}

/// Load configuration for the given project root.
///
/// Defaults are merged with overrides from the config file. A missing or
/// unparsable file yields defaults (with a warning for the latter). The
/// access token falls back to `MAPBOX_ACCESS_TOKEN`.
pub fn load_config(project_root: &Path) -> WaypointConfig {
    let mut config = match config_path(project_root) {
        Some(path) => {
            debug!(path = %path.display(), "Loading config");
            match std::fs::read_to_string(&path) {
                Ok(content) => parse_config(&content, path.parent().unwrap_or(project_root)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not read config file");
                    WaypointConfig::default()
                }
            }
        }
        None => WaypointConfig::default(),
    };

    if config.access_token.is_empty() {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            config.access_token = token;
        }
    }
    if config.access_token.is_empty() {
        warn!("No Mapbox access token configured (set {TOKEN_ENV_VAR} or access_token)");
    }
    config
}

/// Parse config TOML text. Relative `gazetteer` paths resolve against `base_dir`.
pub fn parse_config(content: &str, base_dir: &Path) -> WaypointConfig {
    let mut config = WaypointConfig::default();
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to parse {CONFIG_FILE_NAME}");
            return config;
        }
    };

    // Validate keys — warn on unknown
    for key in table.keys() {
        if !KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            let suggestion = KNOWN_CONFIG_KEYS
                .iter()
                .min_by_key(|k| edit_distance(key, k))
                .copied()
                .unwrap_or_default();
            if edit_distance(key, suggestion) <= 3 {
                warn!(
                    key = key.as_str(),
                    suggestion,
                    "Unknown key in {CONFIG_FILE_NAME} — did you mean '{suggestion}'?"
                );
            } else {
                warn!(
                    key = key.as_str(),
                    "Unknown key in {CONFIG_FILE_NAME} (known keys: {})",
                    KNOWN_CONFIG_KEYS.join(", ")
                );
            }
        }
    }

    let get_str = |key: &str| table.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());
    let get_bool = |key: &str| table.get(key).and_then(|v| v.as_bool());
    let get_f64 = |key: &str| {
        table.get(key).and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
    };
    let get_u64 =
        |key: &str| table.get(key).and_then(|v| v.as_integer()).and_then(|i| u64::try_from(i).ok());

    if let Some(token) = get_str("access_token") {
        config.access_token = token;
    }
    if let Some(style) = get_str("map_style") {
        config.map_style = style;
    }
    if let Some(ms) = get_u64("timeout_ms") {
        config.timeout_ms = ms;
    }
    if let Some(limit) = get_u64("limit") {
        config.limit = limit as usize;
    }
    if let Some(zoom) = get_f64("point_zoom") {
        config.point_zoom = zoom;
    }
    if let Some(ms) = get_u64("transition_duration") {
        config.transition_duration = ms;
    }
    if let Some(b) = get_bool("hide_on_select") {
        config.hide_on_select = b;
    }
    if let Some(b) = get_bool("update_input_on_select") {
        config.update_input_on_select = b;
    }
    if let Some(b) = get_bool("local_only") {
        config.local_only = b;
    }
    if let Some(b) = get_bool("coordinates") {
        config.coordinates = b;
    }
    if let Some(value) = get_str("initial_input_value") {
        config.initial_input_value = value;
    }

    // Query params. An empty country string lifts the default restriction.
    if let Some(country) = get_str("country") {
        config.query_params.country = Some(country).filter(|c| !c.is_empty());
    }
    if let Some(language) = get_str("language") {
        config.query_params.language = Some(language);
    }
    if let Some(types) = table.get("types").and_then(|v| v.as_array()) {
        config.query_params.types =
            types.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect();
    }
    if let Some(arr) = table.get("proximity").and_then(|v| v.as_array()) {
        let coords: Vec<f64> = arr
            .iter()
            .filter_map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
            .collect();
        match coords.as_slice() {
            [lon, lat] => config.query_params.proximity = Some([*lon, *lat]),
            _ => warn!("proximity must be [longitude, latitude]"),
        }
    }

    if let Some(path) = get_str("gazetteer") {
        let path = PathBuf::from(path);
        config.gazetteer = Some(if path.is_relative() { base_dir.join(path) } else { path });
    }

    // [initial_view] — partial tables override individual fields
    if let Some(view) = table.get("initial_view").and_then(|v| v.as_table()) {
        let field = |key: &str| {
            view.get(key).and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        };
        let v = &mut config.initial_view;
        if let Some(x) = field("longitude") {
            v.longitude = x;
        }
        if let Some(x) = field("latitude") {
            v.latitude = x;
        }
        if let Some(x) = field("zoom") {
            v.zoom = x;
        }
        if let Some(x) = field("pitch") {
            v.pitch = x;
        }
        if let Some(x) = field("bearing") {
            v.bearing = x;
        }
    }

    config
}

impl WaypointConfig {
    /// Widget options derived from this config.
    pub fn geocoder_options(&self) -> GeocoderOptions {
        GeocoderOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            limit: self.limit,
            local_only: self.local_only,
            point_zoom: self.point_zoom,
            transition_duration: self.transition_duration,
            hide_on_select: self.hide_on_select,
            update_input_on_select: self.update_input_on_select,
            initial_input_value: self.initial_input_value.clone(),
            query_params: self.query_params.clone(),
            ..GeocoderOptions::default()
        }
    }

    pub fn map_style(&self) -> MapStyle {
        MapStyle {
            style: self.map_style.clone(),
            access_token: self.access_token.clone(),
            base_url: mapbox::DEFAULT_BASE_URL.to_string(),
            retina: true,
        }
    }

    /// The local result sources this config enables, or `None` if there are none.
    ///
    /// A gazetteer that fails to load is logged and skipped.
    pub fn local_geocoder(&self) -> Option<ChainGeocoder> {
        let mut chain = ChainGeocoder::new();
        if self.coordinates {
            chain = chain.with(CoordinateGeocoder);
        }
        if let Some(ref path) = self.gazetteer {
            match Gazetteer::load(path) {
                Ok(g) => chain = chain.with(g),
                Err(e) => warn!(error = %e, "Skipping gazetteer"),
            }
        }
        if chain.is_empty() {
            None
        } else {
            Some(chain)
        }
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}
