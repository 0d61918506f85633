//! Map view — the current camera rendered as a static map image, with drag
//! to pan and wheel to zoom.

use dioxus::prelude::*;

use crate::state::*;

/// Zoom levels per wheel notch.
const WHEEL_ZOOM_STEP: f64 = 0.5;

#[component]
pub fn MapView() -> Element {
    // Pointer position where the current drag started (client coordinates)
    let mut drag_origin = use_signal(|| None::<(f64, f64)>);
    // How far the image is shifted while dragging; committed on release
    let mut drag_offset = use_signal(|| (0.0f64, 0.0f64));
    // Last pointer position over the map (element coordinates), used as zoom anchor
    let mut pointer = use_signal(|| None::<(f64, f64)>);

    let state = app_state();
    let page = PAGE.read();
    let image_url = state.client.as_ref().map(|_| page.map_image_url(&state.style));
    let (dx, dy) = *drag_offset.read();
    let dragging = drag_origin.read().is_some();

    rsx! {
        div {
            class: if dragging { "map-view dragging" } else { "map-view" },

            onresize: move |e: Event<ResizeData>| {
                if let Ok(size) = e.get_content_box_size() {
                    if size.width > 0.0 && size.height > 0.0 {
                        PAGE.write().resize(size.width, size.height);
                    }
                }
            },
            onmousedown: move |e: Event<MouseData>| {
                let p = e.client_coordinates();
                drag_origin.set(Some((p.x, p.y)));
                drag_offset.set((0.0, 0.0));
            },
            onmousemove: move |e: Event<MouseData>| {
                let local = e.element_coordinates();
                pointer.set(Some((local.x, local.y)));
                let origin = *drag_origin.read();
                if let Some((ox, oy)) = origin {
                    let p = e.client_coordinates();
                    drag_offset.set((p.x - ox, p.y - oy));
                }
            },
            onmouseup: move |_| finish_drag(drag_origin, drag_offset),
            onmouseleave: move |_| {
                pointer.set(None);
                finish_drag(drag_origin, drag_offset);
            },
            onwheel: move |e: Event<WheelData>| {
                let notch = e.delta().strip_units().y;
                if notch == 0.0 {
                    return;
                }
                let (w, h) = PAGE.read().size();
                let (x, y) = pointer().unwrap_or((w / 2.0, h / 2.0));
                let delta = if notch < 0.0 { WHEEL_ZOOM_STEP } else { -WHEEL_ZOOM_STEP };
                PAGE.write().zoom_around(delta, x, y);
            },

            {match image_url {
                Some(url) => rsx! {
                    img {
                        class: "map-image",
                        src: "{url}",
                        alt: "Map",
                        draggable: "false",
                        style: "transform: translate({dx}px, {dy}px);",
                    }
                },
                None => rsx! {
                    div {
                        class: "map-placeholder",
                        span { "No Mapbox access token." }
                        span { class: "map-placeholder-hint", "Set MAPBOX_ACCESS_TOKEN or access_token in .waypoint.toml" }
                    }
                },
            }}
        }
    }
}

/// End a drag: move the camera by the accumulated offset and reset the image.
fn finish_drag(mut origin: Signal<Option<(f64, f64)>>, mut offset: Signal<(f64, f64)>) {
    if origin.take().is_none() {
        return;
    }
    let (dx, dy) = offset.take();
    if dx != 0.0 || dy != 0.0 {
        PAGE.write().pan_by(dx, dy);
    }
}
