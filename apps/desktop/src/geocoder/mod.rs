//! Geocoder overlay — address input + result list, and the glue that runs
//! lookups and hands selections to the map page.

mod geocoder_input;
mod results_list;

use std::time::Instant;

use dioxus::prelude::*;
use geocoder_input::GeocoderInput;
use results_list::ResultsList;
use tracing::debug;
use waypoint_core::autocomplete::PendingQuery;
use waypoint_core::local::LocalGeocoder;
use waypoint_core::mapbox::ForwardGeocoder;

use crate::state::*;

/// Input box with its dropdown.
#[component]
pub fn GeocoderPanel() -> Element {
    rsx! {
        div {
            class: "waypoint-geocoder",
            GeocoderInput {}
            ResultsList {}
        }
    }
}

/// Run the lookup for a ticket whose quiet period has passed, then publish
/// the results unless newer input arrived meanwhile.
async fn run_lookup(ticket: PendingQuery) {
    let state = app_state();
    let local = state.local.as_ref().map(|l| l as &dyn LocalGeocoder);
    let Some(lookup) = GEOCODER.read().prepare(&ticket, local) else {
        return;
    };
    let remote = state.client.as_ref().map(|c| c as &dyn ForwardGeocoder);

    let start = Instant::now();
    let outcome = lookup.run(remote).await;
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    if GEOCODER.write().apply_results(outcome.generation, outcome.results) {
        *LOOKUP_TIME_MS.write() = elapsed;
        *LOOKUP_ERROR.write() = outcome.error;
    } else {
        debug!(query = ticket.query.as_str(), "Discarded results for superseded input");
    }
}

/// Select a result and move the shared camera to it.
fn select_result(index: usize) {
    let (view, (w, h)) = {
        let page = PAGE.read();
        (*page.view(), page.size())
    };
    let selection = GEOCODER.write().select(index, &view, w, h);
    if let Some(selection) = selection {
        PAGE.write().on_selected(selection);
    }
}

/// Select the keyboard-highlighted result, if any.
fn select_active() {
    let active = GEOCODER.read().active_index();
    if let Some(index) = active {
        select_result(index);
    }
}
