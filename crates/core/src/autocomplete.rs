//! Debounced geocoder autocomplete: input text, merged result list, result
//! visibility, and turning a selected result into a camera.
//!
//! The state machine is synchronous. Timing is left to the host, which
//! follows a ticket protocol:
//!
//! 1. [`Geocoder::handle_input`] returns a [`PendingQuery`]. The host waits
//!    [`GeocoderOptions::timeout`] and then calls [`Geocoder::prepare`].
//!    Later input bumps the generation, so an older ticket prepares to `None`.
//! 2. [`Lookup::run`] (async) queries the local source and the remote
//!    geocoder and merges the results, local first.
//! 3. [`Geocoder::apply_results`] installs them if no newer input arrived
//!    while the request was in flight.
//!
//! Hiding the list on blur uses the same pattern with [`BlurTicket`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::local::LocalGeocoder;
use crate::mapbox::ForwardGeocoder;
use crate::types::{Camera, Feature, QueryParams, ViewState};
use crate::viewport::{wrap_longitude, FitOptions, WebMercatorViewport, MAX_LATITUDE};

/// How long the result list stays up after the input loses focus, so a click
/// on a result still lands.
pub const BLUR_HIDE_DELAY: Duration = Duration::from_millis(300);

/// Renders a result as the text shown in the list (and in the input after
/// selection).
pub type ItemFormatter = Arc<dyn Fn(&Feature) -> String + Send + Sync>;

fn default_format_item() -> ItemFormatter {
    Arc::new(|f: &Feature| f.place_name.clone())
}

/// Widget behaviour knobs.
#[derive(Clone)]
pub struct GeocoderOptions {
    /// Quiet period before a query fires.
    pub timeout: Duration,
    /// Total results, local plus remote.
    pub limit: usize,
    /// Never call the remote geocoder.
    pub local_only: bool,
    /// Zoom used for results that have no bounding box.
    pub point_zoom: f64,
    /// Forwarded on the selected camera, in milliseconds.
    pub transition_duration: u64,
    pub hide_on_select: bool,
    pub update_input_on_select: bool,
    /// Shown whenever the input is empty.
    pub initial_input_value: String,
    pub query_params: QueryParams,
    pub format_item: ItemFormatter,
}

impl Default for GeocoderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(300),
            limit: 5,
            local_only: false,
            point_zoom: 16.0,
            transition_duration: 0,
            hide_on_select: false,
            update_input_on_select: false,
            initial_input_value: String::new(),
            query_params: QueryParams::default(),
            format_item: default_format_item(),
        }
    }
}

impl fmt::Debug for GeocoderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocoderOptions")
            .field("timeout", &self.timeout)
            .field("limit", &self.limit)
            .field("local_only", &self.local_only)
            .field("point_zoom", &self.point_zoom)
            .field("transition_duration", &self.transition_duration)
            .field("hide_on_select", &self.hide_on_select)
            .field("update_input_on_select", &self.update_input_on_select)
            .field("initial_input_value", &self.initial_input_value)
            .field("query_params", &self.query_params)
            .finish_non_exhaustive()
    }
}

/// Returned by [`Geocoder::handle_input`]; redeem it after the quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub generation: u64,
    pub query: String,
}

/// Returned by [`Geocoder::blur`]; redeem it after [`BLUR_HIDE_DELAY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurTicket(u64);

/// A query that is ready to run: local results already computed, and the
/// remote request (if any) planned.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub generation: u64,
    pub query: String,
    pub local: Vec<Feature>,
    /// Params for the remote request, with `limit` set to the remaining room.
    /// `None` when the remote geocoder should not be called.
    pub remote: Option<QueryParams>,
}

impl Lookup {
    /// Run the remote part (if planned) and merge: local results first.
    ///
    /// A failed remote request is logged and the local results are kept.
    /// Returns the merged list and the remote error, if any.
    pub async fn run(self, remote: Option<&dyn ForwardGeocoder>) -> LookupOutcome {
        let mut results = self.local;
        let mut error = None;
        if let (Some(params), Some(client)) = (self.remote.as_ref(), remote) {
            match client.geocode_forward(&self.query, params).await {
                Ok(features) => {
                    debug!(query = self.query.as_str(), remote = features.len(), "Remote results");
                    results.extend(features);
                }
                Err(e) => {
                    warn!(query = self.query.as_str(), error = %e, "Remote geocoding failed");
                    error = Some(e);
                }
            }
        }
        LookupOutcome { generation: self.generation, results, error }
    }
}

/// What a [`Lookup`] produced.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub generation: u64,
    pub results: Vec<Feature>,
    pub error: Option<String>,
}

/// A chosen result and the camera it maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub view: ViewState,
    pub feature: Feature,
}

/// Autocomplete widget state.
#[derive(Debug)]
pub struct Geocoder {
    options: GeocoderOptions,
    input_value: String,
    results: Vec<Feature>,
    show_results: bool,
    active: Option<usize>,
    generation: u64,
    blur_generation: u64,
}

impl Geocoder {
    pub fn new(options: GeocoderOptions) -> Self {
        let input_value = options.initial_input_value.clone();
        Self {
            options,
            input_value,
            results: Vec::new(),
            show_results: false,
            active: None,
            generation: 0,
            blur_generation: 0,
        }
    }

    pub fn options(&self) -> &GeocoderOptions {
        &self.options
    }

    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    pub fn results(&self) -> &[Feature] {
        &self.results
    }

    pub fn is_showing_results(&self) -> bool {
        self.show_results
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Display text for a result.
    pub fn format_item(&self, feature: &Feature) -> String {
        (self.options.format_item)(feature)
    }

    // -----------------------------------------------------------------------
    // Typing
    // -----------------------------------------------------------------------

    /// Record new input text and start a new debounce period.
    ///
    /// Any earlier [`PendingQuery`] or in-flight [`Lookup`] becomes stale.
    pub fn handle_input(&mut self, value: &str) -> PendingQuery {
        self.input_value = value.to_string();
        if self.input_value.is_empty() && !self.options.initial_input_value.is_empty() {
            self.input_value = self.options.initial_input_value.clone();
        }
        self.generation += 1;
        PendingQuery { generation: self.generation, query: value.to_string() }
    }

    /// Whether `generation` still matches the latest input.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Plan the lookup for a ticket whose quiet period has elapsed.
    ///
    /// Returns `None` if more input arrived since the ticket was issued.
    pub fn prepare(&self, pending: &PendingQuery, local: Option<&dyn LocalGeocoder>) -> Option<Lookup> {
        if !self.is_current(pending.generation) {
            debug!(generation = pending.generation, current = self.generation, "Debounce superseded");
            return None;
        }
        let local_results = local.map(|l| l.search(&pending.query)).unwrap_or_default();
        let remaining = self.options.limit.saturating_sub(local_results.len());

        let remote = if remaining > 0 && !self.options.local_only && !pending.query.is_empty() {
            Some(self.options.query_params.with_limit(remaining))
        } else {
            None
        };

        Some(Lookup {
            generation: pending.generation,
            query: pending.query.clone(),
            local: local_results,
            remote,
        })
    }

    /// Install lookup results if they belong to the latest input.
    ///
    /// Returns `false` (and leaves state alone) for stale results.
    pub fn apply_results(&mut self, generation: u64, results: Vec<Feature>) -> bool {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "Dropping stale results");
            return false;
        }
        self.results = results;
        self.active = None;
        true
    }

    /// Empty the input and the result list.
    pub fn clear(&mut self) {
        self.input_value = self.options.initial_input_value.clone();
        self.results.clear();
        self.active = None;
        self.generation += 1;
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    pub fn focus(&mut self) {
        self.blur_generation += 1;
        self.show_results = true;
    }

    /// Schedule hiding the list after [`BLUR_HIDE_DELAY`].
    pub fn blur(&mut self) -> BlurTicket {
        self.blur_generation += 1;
        BlurTicket(self.blur_generation)
    }

    /// Hide the list unless focus returned since the ticket was issued.
    pub fn finish_blur(&mut self, ticket: BlurTicket) -> bool {
        if ticket.0 != self.blur_generation {
            return false;
        }
        self.show_results = false;
        self.active = None;
        true
    }

    /// Results to draw: empty unless the list is shown and has entries.
    pub fn visible_results(&self) -> &[Feature] {
        if self.show_results {
            &self.results
        } else {
            &[]
        }
    }

    // -----------------------------------------------------------------------
    // Keyboard highlight
    // -----------------------------------------------------------------------

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Move the highlight by `delta` rows, clamped to the visible list.
    /// Moving down from no highlight lands on the first row.
    pub fn move_active(&mut self, delta: isize) -> Option<usize> {
        let len = self.visible_results().len();
        if len == 0 {
            self.active = None;
            return None;
        }
        let next = match self.active {
            None if delta > 0 => 0,
            None => return None,
            Some(i) => (i as isize + delta).clamp(0, len as isize - 1) as usize,
        };
        self.active = Some(next);
        self.active
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// The camera a result maps to, given the current view and map size.
    ///
    /// Results with a bounding box are fitted to the viewport; point results
    /// are centered at [`GeocoderOptions::point_zoom`], with the center kept
    /// inside the Mercator limits. A box that cannot be fitted (zero-size map)
    /// falls back to the point camera.
    pub fn camera_for(&self, feature: &Feature, current: &ViewState, width: f64, height: f64) -> Camera {
        let point = Camera {
            longitude: wrap_longitude(feature.center[0]),
            latitude: feature.center[1].clamp(-MAX_LATITUDE, MAX_LATITUDE),
            zoom: self.options.point_zoom,
        };
        match feature.bounds() {
            Some(bounds) => WebMercatorViewport::new(*current, width, height)
                .fit_bounds(&bounds, FitOptions::default())
                .unwrap_or_else(|e| {
                    warn!(place = feature.place_name.as_str(), error = %e, "Could not fit bounds");
                    point
                }),
            None => point,
        }
    }

    /// Select the result at `index`, returning the new camera state.
    pub fn select(&mut self, index: usize, current: &ViewState, width: f64, height: f64) -> Option<Selection> {
        let feature = self.results.get(index)?.clone();
        let camera = self.camera_for(&feature, current, width, height);
        let view = current.with_camera(camera, self.options.transition_duration);
        info!(
            place = feature.place_name.as_str(),
            longitude = view.longitude,
            latitude = view.latitude,
            zoom = view.zoom,
            "Selected result"
        );

        if self.options.hide_on_select {
            self.results.clear();
        }
        if self.options.update_input_on_select {
            self.input_value = self.format_item(&feature);
        }
        self.active = None;
        Some(Selection { view, feature })
    }

    /// Select the highlighted result, if any.
    pub fn select_active(&mut self, current: &ViewState, width: f64, height: f64) -> Option<Selection> {
        let index = self.active?;
        self.select(index, current, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, center: [f64; 2]) -> Feature {
        Feature::point(name, name, center)
    }

    fn local_two(_: &str) -> Vec<Feature> {
        vec![place("a", [1.0, 1.0]), place("b", [2.0, 2.0])]
    }

    const LOCAL: &dyn LocalGeocoder = &local_two;

    #[test]
    fn stale_ticket_prepares_nothing() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let first = g.handle_input("mon");
        let second = g.handle_input("mont");
        assert!(g.prepare(&first, None).is_none());
        let lookup = g.prepare(&second, None).unwrap();
        assert_eq!(lookup.query, "mont");
        assert_eq!(lookup.remote.unwrap().limit, Some(5));
    }

    #[test]
    fn local_results_shrink_remote_limit() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("x");
        let lookup = g.prepare(&t, Some(LOCAL)).unwrap();
        assert_eq!(lookup.local.len(), 2);
        assert_eq!(lookup.remote.unwrap().limit, Some(3));
    }

    #[test]
    fn no_remote_when_local_fills_limit() {
        let mut g = Geocoder::new(GeocoderOptions { limit: 2, ..Default::default() });
        let t = g.handle_input("x");
        let lookup = g.prepare(&t, Some(LOCAL)).unwrap();
        assert!(lookup.remote.is_none());
    }

    #[test]
    fn no_remote_when_local_only_or_empty() {
        let mut g = Geocoder::new(GeocoderOptions { local_only: true, ..Default::default() });
        let t = g.handle_input("montreal");
        assert!(g.prepare(&t, None).unwrap().remote.is_none());

        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("");
        let lookup = g.prepare(&t, Some(LOCAL)).unwrap();
        assert!(lookup.remote.is_none());
        assert_eq!(lookup.local.len(), 2, "local source still runs for empty input");
    }

    #[test]
    fn apply_results_drops_stale_generation() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let old = g.handle_input("a");
        let _new = g.handle_input("ab");
        assert!(!g.apply_results(old.generation, vec![place("x", [0.0, 0.0])]));
        assert!(g.results().is_empty());
        assert!(g.apply_results(g.generation(), vec![place("y", [0.0, 0.0])]));
        assert_eq!(g.results().len(), 1);
    }

    #[test]
    fn empty_input_reverts_to_initial_value() {
        let opts = GeocoderOptions { initial_input_value: "Montréal".into(), ..Default::default() };
        let mut g = Geocoder::new(opts);
        assert_eq!(g.input_value(), "Montréal");
        let t = g.handle_input("");
        assert_eq!(g.input_value(), "Montréal");
        assert_eq!(t.query, "");
        g.handle_input("Lav");
        assert_eq!(g.input_value(), "Lav");
    }

    #[test]
    fn results_visible_only_while_focused() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("a");
        g.apply_results(t.generation, vec![place("x", [0.0, 0.0])]);
        assert!(g.visible_results().is_empty());
        g.focus();
        assert_eq!(g.visible_results().len(), 1);

        let ticket = g.blur();
        assert_eq!(g.visible_results().len(), 1, "list stays up until the delay passes");
        assert!(g.finish_blur(ticket));
        assert!(g.visible_results().is_empty());
    }

    #[test]
    fn refocus_cancels_pending_blur() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        g.focus();
        let ticket = g.blur();
        g.focus();
        assert!(!g.finish_blur(ticket));
        assert!(g.is_showing_results());
    }

    #[test]
    fn dismissed_list_returns_when_typing_resumes() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        g.focus();
        let t = g.handle_input("mon");
        g.apply_results(t.generation, vec![place("x", [0.0, 0.0])]);

        // Escape: hide right away while the input keeps focus
        let ticket = g.blur();
        assert!(g.finish_blur(ticket));
        assert!(g.visible_results().is_empty());

        g.focus();
        let t = g.handle_input("mont");
        g.apply_results(t.generation, vec![place("y", [0.0, 0.0])]);
        assert_eq!(g.visible_results().len(), 1);
    }

    #[test]
    fn select_point_uses_point_zoom() {
        let opts = GeocoderOptions { transition_duration: 400, ..Default::default() };
        let mut g = Geocoder::new(opts);
        let t = g.handle_input("x");
        g.apply_results(t.generation, vec![place("cafe", [-73.57, 45.52])]);
        let current = ViewState::default();
        let sel = g.select(0, &current, 800.0, 600.0).unwrap();
        assert_eq!(sel.view.longitude, -73.57);
        assert_eq!(sel.view.latitude, 45.52);
        assert_eq!(sel.view.zoom, 16.0);
        assert_eq!(sel.view.bearing, current.bearing);
        assert_eq!(sel.view.transition_duration, 400);
        assert_eq!(g.results().len(), 1, "hide_on_select is off by default");
        assert_eq!(g.input_value(), "x", "update_input_on_select is off by default");
    }

    #[test]
    fn select_bbox_fits_viewport() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("montreal");
        let city = place("Montréal", [-73.58, 45.50]).with_bbox([-73.97, 45.41, -73.47, 45.70]);
        g.apply_results(t.generation, vec![city]);
        let sel = g.select(0, &ViewState::default(), 800.0, 600.0).unwrap();
        assert!((sel.view.longitude - -73.72).abs() < 1e-9, "bbox center, not feature center");
        assert!(sel.view.zoom > 9.0 && sel.view.zoom < 12.0, "zoom {}", sel.view.zoom);
    }

    #[test]
    fn select_bbox_on_empty_map_falls_back_to_point() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("montreal");
        let city = place("Montréal", [-73.58, 45.50]).with_bbox([-73.97, 45.41, -73.47, 45.70]);
        g.apply_results(t.generation, vec![city]);
        let sel = g.select(0, &ViewState::default(), 0.0, 0.0).unwrap();
        assert_eq!(sel.view.longitude, -73.58);
        assert_eq!(sel.view.zoom, 16.0);
    }

    #[test]
    fn polar_coordinates_select_a_mercator_camera() {
        let coords: &dyn LocalGeocoder = &crate::local::CoordinateGeocoder;
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("89.5, 10");
        let lookup = g.prepare(&t, Some(coords)).unwrap();
        g.apply_results(t.generation, lookup.local);
        let sel = g.select(0, &ViewState::default(), 800.0, 600.0).unwrap();
        assert_eq!(sel.view.latitude, MAX_LATITUDE);
        assert_eq!(sel.view.longitude, 10.0);
        assert_eq!(sel.feature.center, [10.0, 89.5], "the result itself is untouched");
    }

    #[test]
    fn select_hides_and_updates_input_when_asked() {
        let opts = GeocoderOptions {
            hide_on_select: true,
            update_input_on_select: true,
            format_item: Arc::new(|f: &Feature| format!("> {}", f.place_name)),
            ..Default::default()
        };
        let mut g = Geocoder::new(opts);
        let t = g.handle_input("ca");
        g.apply_results(t.generation, vec![place("Café", [0.0, 0.0])]);
        g.select(0, &ViewState::default(), 800.0, 600.0).unwrap();
        assert!(g.results().is_empty());
        assert_eq!(g.input_value(), "> Café");
    }

    #[test]
    fn select_out_of_range_is_none() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        assert!(g.select(0, &ViewState::default(), 800.0, 600.0).is_none());
    }

    #[test]
    fn keyboard_highlight_clamps() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("x");
        g.apply_results(t.generation, vec![place("a", [0.0, 0.0]), place("b", [1.0, 1.0])]);
        assert_eq!(g.move_active(1), None, "hidden list has nothing to highlight");
        g.focus();
        assert_eq!(g.move_active(-1), None);
        assert_eq!(g.move_active(1), Some(0));
        assert_eq!(g.move_active(1), Some(1));
        assert_eq!(g.move_active(5), Some(1));
        assert_eq!(g.move_active(-9), Some(0));
        let sel = g.select_active(&ViewState::default(), 800.0, 600.0).unwrap();
        assert_eq!(sel.feature.place_name, "a");
    }

    #[test]
    fn clear_resets_and_invalidates() {
        let mut g = Geocoder::new(GeocoderOptions::default());
        let t = g.handle_input("abc");
        g.apply_results(t.generation, vec![place("a", [0.0, 0.0])]);
        g.clear();
        assert_eq!(g.input_value(), "");
        assert!(g.results().is_empty());
        assert!(g.prepare(&t, None).is_none());
    }
}
