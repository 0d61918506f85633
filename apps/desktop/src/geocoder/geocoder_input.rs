//! Address input with debounced lookups.

use dioxus::prelude::*;
use waypoint_core::autocomplete::BLUR_HIDE_DELAY;

use super::{run_lookup, select_active};
use crate::state::*;

#[component]
pub fn GeocoderInput() -> Element {
    let geocoder = GEOCODER.read();
    let value = geocoder.input_value().to_string();
    let has_query = !value.is_empty();

    rsx! {
        div {
            class: if has_query { "geocoder-field has-query" } else { "geocoder-field" },

            // Pin icon
            svg {
                class: "geocoder-icon",
                width: "16",
                height: "16",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                path { d: "M21 10c0 7-9 13-9 13s-9-6-9-13a9 9 0 0118 0z" }
                circle { cx: "12", cy: "10", r: "3" }
            }

            input {
                class: "geocoder-input",
                r#type: "text",
                placeholder: "Search for an address or place",
                value: "{value}",
                autofocus: true,
                oninput: move |e: Event<FormData>| {
                    let value = e.value();
                    // Typing re-shows a list dismissed with Escape; a new
                    // ticket supersedes any pending one
                    let ticket = {
                        let mut geocoder = GEOCODER.write();
                        geocoder.focus();
                        geocoder.handle_input(&value)
                    };
                    let timeout = GEOCODER.read().options().timeout;
                    spawn(async move {
                        tokio::time::sleep(timeout).await;
                        run_lookup(ticket).await;
                    });
                },
                onfocus: move |_| GEOCODER.write().focus(),
                onblur: move |_| {
                    let ticket = GEOCODER.write().blur();
                    spawn(async move {
                        tokio::time::sleep(BLUR_HIDE_DELAY).await;
                        GEOCODER.write().finish_blur(ticket);
                    });
                },
                onkeydown: move |e: Event<KeyboardData>| {
                    match e.key() {
                        Key::ArrowDown => {
                            e.prevent_default();
                            GEOCODER.write().move_active(1);
                        }
                        Key::ArrowUp => {
                            e.prevent_default();
                            GEOCODER.write().move_active(-1);
                        }
                        Key::Enter => select_active(),
                        Key::Escape => {
                            let ticket = GEOCODER.write().blur();
                            GEOCODER.write().finish_blur(ticket);
                        }
                        _ => {}
                    }
                },
            }

            // Clear button
            if has_query {
                button {
                    class: "geocoder-clear",
                    title: "Clear",
                    onclick: move |_| GEOCODER.write().clear(),
                    "\u{00D7}"
                }
            }
        }
    }
}
