//! Root application component — full-window map with the geocoder overlay.

use dioxus::prelude::*;

use crate::geocoder::GeocoderPanel;
use crate::map::MapView;
use crate::state::*;

static VARIABLES_CSS: Asset = asset!("/assets/styles/variables.css");
static APP_CSS: Asset = asset!("/assets/styles/app.css");

#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: VARIABLES_CSS }
        document::Stylesheet { href: APP_CSS }

        div {
            class: "app-shell",

            // Map fills the window
            MapView {}

            // Geocoder floats over the top-left corner
            div {
                class: "geocoder-overlay",
                GeocoderPanel {}
            }

            // Status bar
            StatusBar {}
        }
    }
}

/// Camera readout and lookup status along the bottom edge
#[component]
fn StatusBar() -> Element {
    let page = PAGE.read();
    let geocoder = GEOCODER.read();
    let error = LOOKUP_ERROR.read();
    let query_time = LOOKUP_TIME_MS.read();
    let view = page.view();
    let results = geocoder.results().len();

    rsx! {
        div {
            class: "statusbar",
            span { class: "statusbar-camera", "{view.longitude:.5}, {view.latitude:.5}" }
            span { class: "statusbar-sep", "|" }
            span { class: "statusbar-zoom", "z{view.zoom:.2}" }
            span { class: "statusbar-sep", "|" }
            span { class: "statusbar-bearing", "{view.bearing:.1}\u{00B0}" }
            if results > 0 {
                span { class: "statusbar-sep", "|" }
                span { class: "statusbar-results", "{results} results in {query_time:.0}ms" }
            }
            {error.as_ref().map(|e| rsx! {
                span { class: "statusbar-sep", "|" }
                span { class: "statusbar-error", "{e}" }
            })}
        }
    }
}
