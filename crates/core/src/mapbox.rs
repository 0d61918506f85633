//! Mapbox web API client: forward geocoding and Static Images URLs.
//!
//! The autocomplete flow only depends on [`ForwardGeocoder`], so it can be
//! driven by [`MapboxClient`] or by an in-process fake in tests.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{Feature, FeatureCollection, QueryParams, ViewState};
use crate::viewport::{wrap_longitude, MAX_LATITUDE, MAX_ZOOM, MIN_ZOOM};

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Request timeout for geocoding calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest width/height the Static Images API renders.
pub const STATIC_MAX_SIZE: u32 = 1280;

/// Largest pitch the Static Images API accepts.
const STATIC_MAX_PITCH: f64 = 60.0;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can turn a free-text query into place features.
pub trait ForwardGeocoder: Send + Sync {
    fn geocode_forward<'a>(
        &'a self,
        query: &'a str,
        params: &'a QueryParams,
    ) -> BoxFuture<'a, Result<Vec<Feature>, String>>;
}

/// Error body returned by the Mapbox APIs on non-2xx responses.
#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Thin client over the Mapbox Geocoding v5 API.
#[derive(Clone)]
pub struct MapboxClient {
    access_token: String,
    base_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for MapboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl MapboxClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not configure HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { access_token: access_token.into(), base_url: DEFAULT_BASE_URL.to_string(), http }
    }

    /// Point the client at another host (a proxy, or a local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Full request URL for a forward geocoding query.
    pub fn forward_url(&self, query: &str, params: &QueryParams) -> String {
        let mut url = format!(
            "{}/geocoding/v5/mapbox.places/{}.json?access_token={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.access_token)
        );
        for (k, v) in params.to_query_pairs() {
            url.push('&');
            url.push_str(&urlencoding::encode(&k));
            url.push('=');
            url.push_str(&urlencoding::encode(&v));
        }
        url
    }

    /// Look up places matching `query`.
    pub async fn geocode_forward(
        &self,
        query: &str,
        params: &QueryParams,
    ) -> Result<Vec<Feature>, String> {
        let url = self.forward_url(query, params);
        debug!(query, limit = ?params.limit, "Forward geocoding request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("request error: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_default();
            return Err(if detail.is_empty() {
                format!("geocoding API responded with {status}")
            } else {
                format!("geocoding API responded with {status}: {detail}")
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read geocoding response: {e}"))?;
        parse_feature_collection(&body)
    }
}

impl ForwardGeocoder for MapboxClient {
    fn geocode_forward<'a>(
        &'a self,
        query: &'a str,
        params: &'a QueryParams,
    ) -> BoxFuture<'a, Result<Vec<Feature>, String>> {
        Box::pin(MapboxClient::geocode_forward(self, query, params))
    }
}

/// Parse a geocoding response body into its features.
pub fn parse_feature_collection(body: &str) -> Result<Vec<Feature>, String> {
    serde_json::from_str::<FeatureCollection>(body)
        .map(|fc| fc.features)
        .map_err(|e| format!("failed to parse geocoding response: {e}"))
}

// ---------------------------------------------------------------------------
// Static Images API
// ---------------------------------------------------------------------------

/// Resolve `mapbox://styles/<owner>/<id>` to the `<owner>/<id>` path the
/// Static Images API wants. Plain `<owner>/<id>` passes through.
pub fn style_path(style: &str) -> &str {
    style.strip_prefix("mapbox://styles/").unwrap_or(style)
}

/// Request for a rendered map image.
#[derive(Debug, Clone)]
pub struct StaticMapRequest<'a> {
    pub style: &'a str,
    pub view: ViewState,
    pub width: u32,
    pub height: u32,
    /// Render at twice the pixel density.
    pub retina: bool,
    /// `[longitude, latitude]` for a pin overlay.
    pub marker: Option<[f64; 2]>,
}

/// Static Images API URL rendering `request.view`.
///
/// Values outside what the API accepts are brought into range: longitude into
/// [-180, 180), latitude into the Mercator limits, bearing into [0, 360),
/// pitch into [0, 60], zoom into [0, 22], and each side to at most 1280 pixels
/// (keeping the aspect ratio). A downscaled image is rendered one
/// `log2(scale)` zoom level out, so it still covers the requested area.
pub fn static_map_url(base_url: &str, access_token: &str, request: &StaticMapRequest<'_>) -> String {
    let view = &request.view;
    let longitude = wrap_longitude(view.longitude);
    let latitude = view.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let bearing = view.bearing.rem_euclid(360.0);
    let pitch = view.pitch.clamp(0.0, STATIC_MAX_PITCH);
    let zoom = (view.zoom + static_scale(request.width, request.height).log2()).clamp(MIN_ZOOM, MAX_ZOOM);
    let (width, height) = fit_static_size(request.width, request.height);

    let overlay = match request.marker {
        Some([lon, lat]) => format!(
            "pin-s+e0533d({:.6},{:.6})/",
            wrap_longitude(lon),
            lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
        ),
        None => String::new(),
    };

    format!(
        "{}/styles/v1/{}/static/{}{:.6},{:.6},{:.2},{:.1},{:.1}/{}x{}{}?access_token={}&attribution=false&logo=false",
        base_url.trim_end_matches('/'),
        style_path(request.style),
        overlay,
        longitude,
        latitude,
        zoom,
        bearing,
        pitch,
        width,
        height,
        if request.retina { "@2x" } else { "" },
        urlencoding::encode(access_token),
    )
}

/// Scale `(width, height)` down so neither side exceeds [`STATIC_MAX_SIZE`].
/// Zero sizes become 1.
pub fn fit_static_size(width: u32, height: u32) -> (u32, u32) {
    let (w, h) = (width.max(1), height.max(1));
    let ratio = static_scale(w, h);
    if ratio >= 1.0 {
        return (w, h);
    }
    let scale = |v: u32| ((v as f64 * ratio).round() as u32).clamp(1, STATIC_MAX_SIZE);
    (scale(w), scale(h))
}

/// Factor (at most 1) applied to both sides by [`fit_static_size`].
fn static_scale(width: u32, height: u32) -> f64 {
    let largest = width.max(height).max(1);
    if largest <= STATIC_MAX_SIZE {
        1.0
    } else {
        STATIC_MAX_SIZE as f64 / largest as f64
    }
}
