//! Waypoint CLI — geocode places and compute map cameras from the terminal.
//!
//! Runs the same lookup and selection logic as the map page, minus the map.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use waypoint_core::autocomplete::{Geocoder, Lookup};
use waypoint_core::local::{ChainGeocoder, Gazetteer, LocalGeocoder};
use waypoint_core::mapbox::{ForwardGeocoder, MapboxClient};
use waypoint_core::page::MapPage;
use waypoint_core::types::*;
use waypoint_core::viewport::{FitOptions, WebMercatorViewport};
use waypoint_core::{load_config, TOKEN_ENV_VAR};

/// Waypoint CLI — address lookup and map camera fitting.
#[derive(Parser)]
#[command(name = "wp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Directory to read .waypoint.toml from (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up places matching a query
    Search {
        /// Free-text address or place name
        query: String,

        /// Maximum number of results (local + remote)
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict to ISO country codes, e.g. "ca" or "ca,us" ("" for none)
        #[arg(long)]
        country: Option<String>,

        /// Only use local sources
        #[arg(long)]
        local_only: bool,

        /// Gazetteer TOML file with extra places
        #[arg(long)]
        gazetteer: Option<PathBuf>,
    },
    /// Print the camera that selecting a result would produce
    Locate {
        /// Free-text address or place name
        query: String,

        /// Which result to select (0-based)
        #[arg(long, default_value = "0")]
        index: usize,

        /// Map width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Map height in pixels
        #[arg(long, default_value = "800")]
        height: f64,
    },
    /// Fit a bounding box into a map of the given size (offline)
    Fit {
        /// west,south,east,north
        bbox: String,

        /// Map width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Map height in pixels
        #[arg(long, default_value = "800")]
        height: f64,

        /// Padding in pixels on every side
        #[arg(long, default_value = "0")]
        padding: f64,
    },
    /// Print the map image URL for the configured initial view
    StaticUrl {
        /// Image width in pixels
        #[arg(long, default_value = "1280")]
        width: f64,

        /// Image height in pixels
        #[arg(long, default_value = "800")]
        height: f64,
    },
}

fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(format!("Could not serialize output: {e}")),
    }
}

/// Both text and `--json` output treat an empty result list as a failure.
fn ensure_results(results: &[Feature], query: &str) -> Result<(), String> {
    if results.is_empty() {
        Err(format!("No results for '{query}'"))
    } else {
        Ok(())
    }
}

/// Run one lookup to completion, bypassing the debounce.
async fn lookup(
    geocoder: &mut Geocoder,
    query: &str,
    local: Option<&dyn LocalGeocoder>,
    remote: Option<&dyn ForwardGeocoder>,
) -> Vec<Feature> {
    let ticket = geocoder.handle_input(query);
    let plan: Option<Lookup> = geocoder.prepare(&ticket, local);
    let Some(plan) = plan else {
        return Vec::new();
    };
    if plan.remote.is_some() && remote.is_none() {
        eprintln!("warning: no access token (set {TOKEN_ENV_VAR}), showing local results only");
    }
    let outcome = plan.run(remote).await;
    if let Some(e) = outcome.error {
        eprintln!("warning: {e}");
    }
    geocoder.apply_results(outcome.generation, outcome.results);
    geocoder.results().to_vec()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("waypoint=warn".parse().expect("static directive")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = resolve_root(cli.root);
    let mut config = load_config(&root);
    debug!(root = %root.display(), remote = config.has_access_token(), "Loaded config");

    let client = config.has_access_token().then(|| MapboxClient::new(config.access_token.clone()));
    let remote = client.as_ref().map(|c| c as &dyn ForwardGeocoder);

    match cli.command {
        Commands::Search { query, limit, country, local_only, gazetteer } => {
            if let Some(limit) = limit {
                config.limit = limit;
            }
            if let Some(country) = country {
                config.query_params.country = Some(country).filter(|c| !c.is_empty());
            }
            config.local_only |= local_only;

            let mut local = config.local_geocoder().unwrap_or_default();
            if let Some(path) = gazetteer {
                match Gazetteer::load(&path) {
                    Ok(g) => local = local.with(g),
                    Err(e) => fail(e),
                }
            }
            let local: Option<&dyn LocalGeocoder> =
                (!local.is_empty()).then_some(&local as &dyn LocalGeocoder);

            let mut geocoder = Geocoder::new(config.geocoder_options());
            let results = lookup(&mut geocoder, &query, local, remote).await;

            if let Err(e) = ensure_results(&results, &query) {
                fail(e);
            }
            if cli.json {
                print_json(&results);
            } else {
                for f in &results {
                    let [lon, lat] = f.center;
                    let kind = f.place_type.first().map(String::as_str).unwrap_or("-");
                    println!("{:<60} {:>11.5} {:>10.5}  {}", geocoder.format_item(f), lon, lat, kind);
                }
                eprintln!("\n{} results", results.len());
            }
        }
        Commands::Locate { query, index, width, height } => {
            let local: Option<ChainGeocoder> = config.local_geocoder();
            let mut geocoder = Geocoder::new(config.geocoder_options());
            let mut page = MapPage::new(config.initial_view, width, height);

            let results = lookup(
                &mut geocoder,
                &query,
                local.as_ref().map(|l| l as &dyn LocalGeocoder),
                remote,
            )
            .await;
            if let Err(e) = ensure_results(&results, &query) {
                fail(e);
            }
            let Some(selection) = geocoder.select(index, page.view(), width, height) else {
                fail(format!("Only {} results, index {index} is out of range", results.len()));
            };
            page.on_selected(selection);

            let view = page.view();
            if cli.json {
                print_json(&serde_json::json!({
                    "place": page.selected(),
                    "view": view,
                }));
            } else {
                if let Some(place) = page.selected() {
                    println!("Place:      {}", geocoder.format_item(place));
                }
                println!("Longitude:  {:.6}", view.longitude);
                println!("Latitude:   {:.6}", view.latitude);
                println!("Zoom:       {:.2}", view.zoom);
                println!("Bearing:    {:.1}", view.bearing);
                println!("Pitch:      {:.1}", view.pitch);
            }
        }
        Commands::Fit { bbox, width, height, padding } => {
            let bounds = LngLatBounds::parse(&bbox).unwrap_or_else(|e| fail(format!("Invalid bbox: {e}")));
            let viewport = WebMercatorViewport::new(config.initial_view, width, height);
            let camera = viewport
                .fit_bounds(&bounds, FitOptions { padding, ..FitOptions::default() })
                .unwrap_or_else(|e| fail(e));

            if cli.json {
                print_json(&camera);
            } else {
                println!("Longitude:  {:.6}", camera.longitude);
                println!("Latitude:   {:.6}", camera.latitude);
                println!("Zoom:       {:.2}", camera.zoom);
            }
        }
        Commands::StaticUrl { width, height } => {
            if !config.has_access_token() {
                fail(format!("No access token configured (set {TOKEN_ENV_VAR})"));
            }
            let page = MapPage::new(config.initial_view, width, height);
            let url = page.map_image_url(&config.map_style());
            if cli.json {
                print_json(&serde_json::json!({ "url": url }));
            } else {
                println!("{url}");
            }
        }
    }
}
