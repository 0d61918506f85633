//! Page-level container: owns the camera and map size, takes controller
//! gestures and geocoder selections, and says which map image to draw.

use tracing::debug;

use crate::autocomplete::Selection;
use crate::mapbox::{static_map_url, StaticMapRequest};
use crate::types::{Feature, ViewState};
use crate::viewport::WebMercatorViewport;

/// Map styling and credentials needed to render the page.
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub style: String,
    pub access_token: String,
    pub base_url: String,
    pub retina: bool,
}

/// The map page's shared camera state.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPage {
    view: ViewState,
    width: f64,
    height: f64,
    selected: Option<Feature>,
}

impl MapPage {
    pub fn new(initial_view: ViewState, width: f64, height: f64) -> Self {
        Self { view: initial_view, width, height, selected: None }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// The last place picked from the geocoder.
    pub fn selected(&self) -> Option<&Feature> {
        self.selected.as_ref()
    }

    pub fn viewport(&self) -> WebMercatorViewport {
        WebMercatorViewport::new(self.view, self.width, self.height)
    }

    /// Adopt a camera coming from the interactive map controller.
    pub fn on_view_state_change(&mut self, view: ViewState) {
        self.view = view;
    }

    /// Adopt the camera chosen by the geocoder.
    pub fn on_selected(&mut self, selection: Selection) {
        debug!(place = selection.feature.place_name.as_str(), "Moving camera to selection");
        self.view = selection.view;
        self.selected = Some(selection.feature);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let view = self.viewport().pan_by(dx, dy);
        self.on_view_state_change(view);
    }

    pub fn zoom_around(&mut self, delta: f64, x: f64, y: f64) {
        let view = self.viewport().zoom_around(delta, x, y);
        self.on_view_state_change(view);
    }

    /// Static map image for the current camera and size.
    pub fn map_image_url(&self, style: &MapStyle) -> String {
        let request = StaticMapRequest {
            style: &style.style,
            view: self.view,
            width: self.width.round().max(1.0) as u32,
            height: self.height.round().max(1.0) as u32,
            retina: style.retina,
            marker: self.selected.as_ref().map(|f| f.center),
        };
        static_map_url(&style.base_url, &style.access_token, &request)
    }
}
