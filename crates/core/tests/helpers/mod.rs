//! Test harness for autocomplete flow tests.
//!
//! Provides an in-process [`FakeGeocoder`] standing in for the Mapbox API and
//! a small gazetteer fixture, so flows run without network access.

use std::sync::Mutex;

use waypoint_core::local::Gazetteer;
use waypoint_core::mapbox::{BoxFuture, ForwardGeocoder};
use waypoint_core::types::{Feature, QueryParams};

/// Records every request and answers with canned features (or an error).
pub struct FakeGeocoder {
    features: Vec<Feature>,
    error: Option<String>,
    calls: Mutex<Vec<(String, QueryParams)>>,
}

impl FakeGeocoder {
    pub fn with_features(features: Vec<Feature>) -> Self {
        Self { features, error: None, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: &str) -> Self {
        Self { features: Vec::new(), error: Some(message.to_string()), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<(String, QueryParams)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ForwardGeocoder for FakeGeocoder {
    fn geocode_forward<'a>(
        &'a self,
        query: &'a str,
        params: &'a QueryParams,
    ) -> BoxFuture<'a, Result<Vec<Feature>, String>> {
        self.calls.lock().unwrap().push((query.to_string(), params.clone()));
        let result = match self.error {
            Some(ref e) => Err(e.clone()),
            None => {
                let limit = params.limit.unwrap_or(usize::MAX);
                Ok(self.features.iter().take(limit).cloned().collect())
            }
        };
        Box::pin(std::future::ready(result))
    }
}

/// Remote results for "montreal"-ish queries.
pub fn remote_features() -> Vec<Feature> {
    vec![
        Feature::point("place.1", "Montréal, Quebec, Canada", [-73.5878, 45.5088])
            .with_bbox([-73.97, 45.41, -73.47, 45.70]),
        Feature::point("poi.2", "Montréal-Trudeau Airport, Dorval, Quebec, Canada", [-73.7408, 45.4706]),
        Feature::point("place.3", "Montréal-Est, Quebec, Canada", [-73.5067, 45.6320]),
        Feature::point("place.4", "Montréal-Ouest, Quebec, Canada", [-73.6472, 45.4530]),
        Feature::point("place.5", "Mont-Royal, Quebec, Canada", [-73.6480, 45.5167]),
    ]
}

pub fn gazetteer() -> Gazetteer {
    Gazetteer::from_toml(
        r#"
        [[place]]
        name = "Montreal Office"
        center = [-73.5540, 45.5010]

        [[place]]
        name = "Old Montreal Warehouse"
        center = [-73.5560, 45.5040]
        "#,
    )
    .unwrap()
}
