// service/gemini_service.rs
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ServiceError;

const SUITABILITY_SCORE_MAX: i32 = 100;

/// Structured estimate the text model must return. Numeric fields are
/// required; parsing fails the whole analysis when they are missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarEstimate {
    pub panel_count: i32,
    pub annual_production_kwh: f64,
    pub annual_savings_ksh: f64,
    pub system_size_kw: f64,
    pub payback_period_years: f64,
    pub roof_type_ai: Option<String>,
    pub roof_orientation_ai: Option<String>,
    pub roof_angle_ai: Option<f64>,
    pub summary_text: Option<String>,
    pub financial_summary_text: Option<String>,
    pub environmental_summary_text: Option<String>,
    pub solar_suitability_score: i32,
}

/// One suggested panel position on the roof plane. Rotation is optional;
/// anything else missing or mistyped disqualifies the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelPlacement {
    pub x: f64,
    pub z: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    /// Text-based sizing estimate for the property. The model is instructed
    /// to answer with a single JSON object matching [`SolarEstimate`].
    pub async fn get_solar_analysis(
        &self,
        address: &str,
        lat: f64,
        lon: f64,
        energy_kwh: i32,
        roof_type: &str,
    ) -> Result<SolarEstimate, ServiceError> {
        let prompt = format!(
            r#"You are a solar installation expert for Kenya.
Analyze the following data for a potential solar installation:

- Location Address: "{address}"
- Coordinates: {lat}, {lon}
- Average Monthly Energy Consumption: {energy_kwh} kWh
- Roof Type: "{roof_type}"

Considering typical solar irradiance at these coordinates and the stated
consumption, respond with a single valid JSON object and nothing else:

{{
  "panel_count": 25,
  "annual_production_kwh": 15000,
  "annual_savings_ksh": 300000,
  "system_size_kw": 10,
  "payback_period_years": 5.5,
  "roof_type_ai": "{roof_type}",
  "roof_orientation_ai": "South-East",
  "roof_angle_ai": 20,
  "summary_text": "...",
  "financial_summary_text": "...",
  "environmental_summary_text": "...",
  "solar_suitability_score": 85
}}

JSON:"#
        );

        let text = self.generate_text(&prompt).await?;
        let mut estimate = parse_solar_estimate(&text)?;
        estimate.solar_suitability_score = estimate
            .solar_suitability_score
            .clamp(0, SUITABILITY_SCORE_MAX);

        Ok(estimate)
    }

    /// Asks the multimodal model for a coarse panel layout over the uploaded
    /// roof photo. Malformed entries are dropped rather than failing the
    /// layout; a completely unusable response is an error the caller may
    /// degrade to a null layout.
    pub async fn get_panel_layout(
        &self,
        image_url: &str,
        roof_type: &str,
    ) -> Result<Vec<PanelPlacement>, ServiceError> {
        let prompt = format!(
            r#"Analyze this roof image: {image_url}
The roof is a "{roof_type}" type.

Suggest a simple JSON array of coordinates for placing solar panels on the
main, clearest surface. Assume a flat plane at y=0. Each entry must have
numeric "x" and "z" fields and may have a numeric "rotation" in degrees:

[
  {{"x": -2, "z": -1}},
  {{"x": -2, "z": 1, "rotation": 15}}
]

JSON:"#
        );

        let text = self.generate_text(&prompt).await?;
        parse_panel_layout(&text)
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("gemini request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(format!(
                "gemini returned HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("gemini response body: {}", e)))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ServiceError::BadUpstreamPayload("gemini response had no text candidate".to_string())
            })
    }
}

/// Models often wrap their JSON in markdown code fences; strip them before
/// parsing.
pub fn strip_code_fences(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn parse_solar_estimate(raw: &str) -> Result<SolarEstimate, ServiceError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<SolarEstimate>(&cleaned)
        .map_err(|e| ServiceError::BadUpstreamPayload(format!("solar estimate: {}", e)))
}

/// Item-by-item validation: entries that fail to deserialize are dropped with
/// a warning instead of failing the whole layout.
pub fn parse_panel_layout(raw: &str) -> Result<Vec<PanelPlacement>, ServiceError> {
    let cleaned = strip_code_fences(raw);
    let entries: Vec<Value> = serde_json::from_str(&cleaned)
        .map_err(|e| ServiceError::BadUpstreamPayload(format!("panel layout: {}", e)))?;

    let total = entries.len();
    let placements: Vec<PanelPlacement> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<PanelPlacement>(entry.clone()) {
            Ok(placement) => Some(placement),
            Err(e) => {
                tracing::warn!("Dropping malformed panel placement {}: {}", entry, e);
                None
            }
        })
        .collect();

    if placements.len() < total {
        tracing::warn!(
            "Panel layout kept {}/{} entries after validation",
            placements.len(),
            total
        );
    }

    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ESTIMATE: &str = r#"{
        "panel_count": 25,
        "annual_production_kwh": 15000.0,
        "annual_savings_ksh": 300000.0,
        "system_size_kw": 10.0,
        "payback_period_years": 5.5,
        "roof_type_ai": "flat",
        "roof_orientation_ai": "South-East",
        "roof_angle_ai": 20.0,
        "summary_text": "Good roof.",
        "financial_summary_text": "Pays back fast.",
        "environmental_summary_text": "Saves carbon.",
        "solar_suitability_score": 85
    }"#;

    #[test]
    fn estimate_parses_with_and_without_code_fences() {
        assert!(parse_solar_estimate(VALID_ESTIMATE).is_ok());

        let fenced = format!("```json\n{}\n```", VALID_ESTIMATE);
        let estimate = parse_solar_estimate(&fenced).unwrap();
        assert_eq!(estimate.panel_count, 25);
        assert_eq!(estimate.solar_suitability_score, 85);
    }

    #[test]
    fn estimate_with_missing_required_field_is_rejected() {
        let err = parse_solar_estimate(r#"{"panel_count": 25}"#).unwrap_err();
        assert!(matches!(err, ServiceError::BadUpstreamPayload(_)));
    }

    #[test]
    fn estimate_that_is_not_json_is_rejected() {
        let err = parse_solar_estimate("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, ServiceError::BadUpstreamPayload(_)));
    }

    #[test]
    fn suitability_score_is_clamped_after_parse() {
        let raw = VALID_ESTIMATE.replace("85", "140");
        let mut estimate = parse_solar_estimate(&raw).unwrap();
        estimate.solar_suitability_score = estimate.solar_suitability_score.clamp(0, 100);
        assert_eq!(estimate.solar_suitability_score, 100);
    }

    #[test]
    fn malformed_layout_entries_are_dropped_silently() {
        let raw = r#"[
            {"x": -2, "z": -1},
            {"x": "left", "z": 1},
            {"z": 3},
            {"x": 0, "z": 1, "rotation": 15},
            {"x": 1, "z": 1, "color": "blue"}
        ]"#;
        let layout = parse_panel_layout(raw).unwrap();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[1].rotation, Some(15.0));
    }

    #[test]
    fn layout_that_is_not_an_array_is_an_error() {
        assert!(parse_panel_layout(r#"{"x": 1, "z": 2}"#).is_err());
        assert!(parse_panel_layout("no layout available").is_err());
    }

    #[test]
    fn empty_layout_array_is_valid() {
        assert_eq!(parse_panel_layout("[]").unwrap().len(), 0);
    }
}
