//! Web Mercator viewport math: projecting between longitude/latitude and
//! screen pixels, fitting a bounding box, and the pan/zoom gestures the map
//! controller needs.
//!
//! Conventions match the mapping libraries the camera state is fed to:
//! 512-pixel tiles, so the world is `512 * 2^zoom` pixels wide, and latitudes
//! clamped to the Mercator limit. Pixel coordinates grow right and down from
//! the top-left corner. Bearing rotates the screen around its center; pitch
//! is ignored. `fit_bounds` works on the unrotated map.

use std::f64::consts::PI;

use crate::types::{Camera, LngLatBounds, ViewState};

/// Width of one tile, in pixels, at integer zoom levels.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude beyond which Web Mercator diverges.
pub const MAX_LATITUDE: f64 = 85.051129;

/// Zoom ceiling used by `fit_bounds` when none is given.
pub const DEFAULT_MAX_ZOOM: f64 = 24.0;

/// Bounds for interactive zooming.
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Project a longitude/latitude to world pixels at the given scale (`2^zoom`).
pub fn lng_lat_to_world(longitude: f64, latitude: f64, scale: f64) -> [f64; 2] {
    let world = TILE_SIZE * scale;
    let lambda = longitude.to_radians();
    let phi = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = world * (lambda + PI) / (2.0 * PI);
    let y = world * (PI - (PI / 4.0 + phi * 0.5).tan().ln()) / (2.0 * PI);
    [x, y]
}

/// Inverse of [`lng_lat_to_world`].
pub fn world_to_lng_lat(x: f64, y: f64, scale: f64) -> [f64; 2] {
    let world = TILE_SIZE * scale;
    let lambda = x / world * 2.0 * PI - PI;
    let phi = 2.0 * ((PI - y / world * 2.0 * PI).exp().atan() - PI / 4.0);
    [lambda.to_degrees(), phi.to_degrees()]
}

fn zoom_to_scale(zoom: f64) -> f64 {
    2f64.powf(zoom)
}

/// Rotate a pixel offset clockwise (y grows downwards) by `degrees`.
fn rotate(v: [f64; 2], degrees: f64) -> [f64; 2] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos]
}

/// Options for [`WebMercatorViewport::fit_bounds`].
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// Pixels kept clear on every side.
    pub padding: f64,
    pub max_zoom: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { padding: 0.0, max_zoom: DEFAULT_MAX_ZOOM }
    }
}

/// A camera plus the pixel size of the area it is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercatorViewport {
    pub view: ViewState,
    pub width: f64,
    pub height: f64,
}

impl WebMercatorViewport {
    pub fn new(view: ViewState, width: f64, height: f64) -> Self {
        Self { view, width, height }
    }

    pub fn scale(&self) -> f64 {
        zoom_to_scale(self.view.zoom)
    }

    fn center_world(&self) -> [f64; 2] {
        lng_lat_to_world(self.view.longitude, self.view.latitude, self.scale())
    }

    /// Longitude/latitude to screen pixels.
    pub fn project(&self, lng_lat: [f64; 2]) -> [f64; 2] {
        let [cx, cy] = self.center_world();
        let [x, y] = lng_lat_to_world(lng_lat[0], lng_lat[1], self.scale());
        let [sx, sy] = rotate([x - cx, y - cy], -self.view.bearing);
        [sx + self.width / 2.0, sy + self.height / 2.0]
    }

    /// Screen pixels to longitude/latitude.
    pub fn unproject(&self, pixel: [f64; 2]) -> [f64; 2] {
        let [cx, cy] = self.center_world();
        let [wx, wy] = self.screen_offset_to_world([pixel[0], pixel[1]]);
        world_to_lng_lat(cx + wx, cy + wy, self.scale())
    }

    /// Offset from the screen center, expressed along the world axes.
    fn screen_offset_to_world(&self, pixel: [f64; 2]) -> [f64; 2] {
        rotate([pixel[0] - self.width / 2.0, pixel[1] - self.height / 2.0], self.view.bearing)
    }

    /// The camera that shows `bounds` as large as possible inside this
    /// viewport, minus `padding` on every side.
    ///
    /// Zero-area bounds (a point) fit at `max_zoom`.
    pub fn fit_bounds(&self, bounds: &LngLatBounds, options: FitOptions) -> Result<Camera, String> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(format!("viewport has no area ({}x{})", self.width, self.height));
        }
        let target_w = self.width - 2.0 * options.padding;
        let target_h = self.height - 2.0 * options.padding;
        if target_w <= 0.0 || target_h <= 0.0 {
            return Err(format!(
                "padding {} leaves no room in a {}x{} viewport",
                options.padding, self.width, self.height
            ));
        }

        let north = bounds.north.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let south = bounds.south.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let nw = lng_lat_to_world(bounds.west, north, 1.0);
        let se = lng_lat_to_world(bounds.east, south, 1.0);

        let size_x = (se[0] - nw[0]).abs();
        let size_y = (se[1] - nw[1]).abs();
        let [longitude, latitude] =
            world_to_lng_lat((nw[0] + se[0]) / 2.0, (nw[1] + se[1]) / 2.0, 1.0);

        let scale_x = target_w / size_x;
        let scale_y = target_h / size_y;
        let zoom = scale_x.min(scale_y).log2().min(options.max_zoom);

        Ok(Camera { longitude, latitude, zoom })
    }

    /// Drag the map by a pixel offset: the point under the pointer follows it.
    pub fn pan_by(&self, dx: f64, dy: f64) -> ViewState {
        let [longitude, latitude] =
            self.unproject([self.width / 2.0 - dx, self.height / 2.0 - dy]);
        ViewState {
            longitude: wrap_longitude(longitude),
            latitude: latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            transition_duration: 0,
            ..self.view
        }
    }

    /// Zoom by `delta` levels keeping the geographic point under `(x, y)` fixed.
    pub fn zoom_around(&self, delta: f64, x: f64, y: f64) -> ViewState {
        let zoom = (self.view.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        let anchor = self.unproject([x, y]);
        let scale = zoom_to_scale(zoom);
        let [ax, ay] = lng_lat_to_world(anchor[0], anchor[1], scale);
        let [ox, oy] = self.screen_offset_to_world([x, y]);
        let [longitude, latitude] = world_to_lng_lat(ax - ox, ay - oy, scale);
        ViewState {
            longitude: wrap_longitude(longitude),
            latitude: latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            zoom,
            transition_duration: 0,
            ..self.view
        }
    }
}

/// Normalize a longitude into [-180, 180).
/// Values already in range are returned unchanged.
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        return longitude;
    }
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}
