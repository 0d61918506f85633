//! Waypoint Desktop — map page with an address autocomplete overlay.

use dioxus::prelude::*;

mod app;
mod geocoder;
mod map;
mod state;

use app::App;
use state::{AppState, APP_STATE};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("waypoint=info".parse().expect("static directive")),
        )
        .with_target(false)
        .init();

    // Load config before launch; the global signals seed themselves from it.
    let _ = APP_STATE.set(AppState::from_cwd());

    #[cfg(feature = "desktop")]
    {
        use dioxus::desktop::{Config, LogicalSize, WindowBuilder};

        LaunchBuilder::new()
            .with_cfg(
                Config::default()
                    .with_menu(None)
                    .with_background_color((236, 236, 232, 255))
                    .with_disable_context_menu(true)
                    .with_window(
                        WindowBuilder::new()
                            .with_title("Waypoint")
                            .with_inner_size(LogicalSize::new(1280.0, 800.0))
                            .with_min_inner_size(LogicalSize::new(480.0, 360.0))
                            .with_resizable(true)
                            .with_decorations(true),
                    ),
            )
            .launch(App);
    }

    #[cfg(not(feature = "desktop"))]
    {
        dioxus::launch(App);
    }
}
