//! Dropdown of merged local + remote results.

use dioxus::prelude::*;

use super::select_result;
use crate::state::*;

#[component]
pub fn ResultsList() -> Element {
    let geocoder = GEOCODER.read();
    let results = geocoder.visible_results();
    let active = geocoder.active_index();

    if results.is_empty() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "geocoder-results",
            for (i, item) in results.iter().enumerate() {
                div {
                    key: "{i}",
                    class: if active == Some(i) { "geocoder-item active" } else { "geocoder-item" },
                    // Handle on mousedown and keep focus in the input
                    onmousedown: move |e: Event<MouseData>| {
                        e.prevent_default();
                        select_result(i);
                    },
                    span { class: "geocoder-item-name", {geocoder.format_item(item)} }
                    if let Some(kind) = item.place_type.first() {
                        span { class: "geocoder-item-kind", "{kind}" }
                    }
                }
            }
        }
    }
}
