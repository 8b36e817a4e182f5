// service/solar_api_service.rs
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::error::ServiceError;

/// Client for the aerial/3D building imagery lookup. The provider is keyed
/// by coordinates and frequently has no footage for a location, which is a
/// normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct AerialViewClient {
    client: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct VideoMetadata {
    state: String,
    uris: Option<VideoUris>,
}

#[derive(Debug, Deserialize)]
struct VideoUris {
    #[serde(rename = "IMAGE")]
    image: Option<UriPair>,
    #[serde(rename = "MP4_HIGH")]
    mp4_high: Option<UriPair>,
}

#[derive(Debug, Deserialize)]
struct UriPair {
    #[serde(rename = "landscapeUri")]
    landscape_uri: Option<String>,
}

impl AerialViewClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    /// Looks up rendered 3D footage of the building at (lat, lon).
    /// Returns None when no footage exists or the render is still processing.
    pub async fn get_roof_model_url(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<String>, ServiceError> {
        if self.api_key.is_empty() {
            tracing::debug!("Aerial view API key not configured; skipping 3D model lookup");
            return Ok(None);
        }

        let url = format!(
            "https://aerialview.googleapis.com/v1/videos:lookupVideoMetadata?key={}&address={},{}",
            self.api_key, lat, lon
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("aerial view request: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Upstream(format!(
                "aerial view returned HTTP {}",
                status.as_u16()
            )));
        }

        let metadata: VideoMetadata = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("aerial view response body: {}", e)))?;

        if metadata.state != "ACTIVE" {
            tracing::debug!("Aerial footage not ready (state {})", metadata.state);
            return Ok(None);
        }

        let model_url = metadata.uris.and_then(|uris| {
            uris.mp4_high
                .and_then(|pair| pair.landscape_uri)
                .or(uris.image.and_then(|pair| pair.landscape_uri))
        });

        Ok(model_url)
    }
}
