//! Global application state using Dioxus signals.

use std::sync::OnceLock;

use dioxus::prelude::*;
use tracing::info;
use waypoint_core::autocomplete::Geocoder;
use waypoint_core::local::ChainGeocoder;
use waypoint_core::mapbox::MapboxClient;
use waypoint_core::page::{MapPage, MapStyle};
use waypoint_core::types::WaypointConfig;

/// Size the map assumes until the first resize event reports the real one.
const INITIAL_MAP_SIZE: (f64, f64) = (1280.0, 800.0);

/// Immutable services and settings — created once at startup.
pub struct AppState {
    pub config: WaypointConfig,
    pub style: MapStyle,
    /// `None` without an access token: no remote lookups, no map imagery.
    pub client: Option<MapboxClient>,
    pub local: Option<ChainGeocoder>,
}

impl AppState {
    /// Load `.waypoint.toml` from the current working directory.
    pub fn from_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        let config = waypoint_core::load_config(&cwd);
        let client = config
            .has_access_token()
            .then(|| MapboxClient::new(config.access_token.clone()));
        let local = config.local_geocoder();
        info!(
            remote = client.is_some(),
            local = local.is_some(),
            style = config.map_style.as_str(),
            "Waypoint configured"
        );
        AppState { style: config.map_style(), config, client, local }
    }
}

/// Set in `main` before launch.
pub static APP_STATE: OnceLock<AppState> = OnceLock::new();

pub fn app_state() -> &'static AppState {
    APP_STATE.get_or_init(AppState::from_cwd)
}

// ---------------------------------------------------------------------------
// Global signals
// ---------------------------------------------------------------------------

/// Shared camera and map size
pub static PAGE: GlobalSignal<MapPage> = Signal::global(|| {
    let (w, h) = INITIAL_MAP_SIZE;
    MapPage::new(app_state().config.initial_view, w, h)
});

/// Autocomplete widget state
pub static GEOCODER: GlobalSignal<Geocoder> =
    Signal::global(|| Geocoder::new(app_state().config.geocoder_options()));

/// Last remote lookup error, cleared by the next successful lookup
pub static LOOKUP_ERROR: GlobalSignal<Option<String>> = Signal::global(|| None);

/// Lookup timing in ms
pub static LOOKUP_TIME_MS: GlobalSignal<f64> = Signal::global(|| 0.0);
