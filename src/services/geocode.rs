//! Reverse Geocoding Service
//!
//! Resolves report coordinates to a human-readable address via the
//! Nominatim `/reverse` endpoint. Strictly best-effort: any failure
//! (network, non-2xx, unparseable body) yields `None` and the report is
//! stored without an address.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

#[derive(Clone)]
pub struct GeocodeService {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodeService {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("green-report-server")
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    /// Look up the display address for a coordinate pair.
    ///
    /// Never fails the caller; a missing address is an acceptable outcome.
    pub async fn reverse(&self, lat: f64, lng: f64) -> Option<String> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "Reverse geocoding request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Reverse geocoding returned an error status");
            return None;
        }

        match response.json::<ReverseResponse>().await {
            Ok(body) => body.display_name,
            Err(e) => {
                tracing::debug!(error = %e, "Reverse geocoding response was not parseable");
                None
            }
        }
    }
}
