use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::analysismodel::{AnalysisRequest, AnalysisResult};

/// Text fields of the multipart submission form. The image arrives as a
/// separate file part and is validated by the handler.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubmitAnalysisDto {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: f64,

    #[validate(range(min = 1, message = "Energy consumption must be positive"))]
    #[serde(rename = "energyConsumption")]
    pub energy_consumption: i32,

    #[validate(length(min = 1, message = "Roof type is required"))]
    #[serde(rename = "roofType")]
    pub roof_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnalysisResponseDto {
    pub message: String,
    pub analysis_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisStatusDto {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisRequestDto {
    pub address: String,
    pub energy_consumption: i32,
    pub roof_image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResultDto {
    pub roof_type_ai: Option<String>,
    pub roof_orientation_ai: Option<String>,
    pub roof_angle_ai: Option<f64>,
    pub panel_count: Option<i32>,
    pub annual_production_kwh: Option<f64>,
    pub annual_savings_ksh: Option<f64>,
    pub system_size_kw: Option<f64>,
    pub payback_period_years: Option<f64>,
    pub solar_suitability_score: Option<i32>,
    pub summary_text: Option<String>,
    pub financial_summary_text: Option<String>,
    pub environmental_summary_text: Option<String>,
    pub panel_layout: Option<Value>,
    pub roof_model_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletedAnalysisDto {
    pub status: String,
    pub request: AnalysisRequestDto,
    pub result: AnalysisResultDto,
}

impl CompletedAnalysisDto {
    pub fn from_records(request: &AnalysisRequest, result: &AnalysisResult) -> Self {
        CompletedAnalysisDto {
            status: result.status.to_str().to_string(),
            request: AnalysisRequestDto {
                address: request.address.to_owned(),
                energy_consumption: request.energy_consumption,
                roof_image_url: request.roof_image_url.to_owned(),
            },
            result: AnalysisResultDto {
                roof_type_ai: result.roof_type_ai.to_owned(),
                roof_orientation_ai: result.roof_orientation_ai.to_owned(),
                roof_angle_ai: result.roof_angle_ai,
                panel_count: result.panel_count,
                annual_production_kwh: result.annual_production_kwh,
                annual_savings_ksh: result.annual_savings_ksh,
                system_size_kw: result.system_size_kw,
                payback_period_years: result.payback_period_years,
                solar_suitability_score: result.solar_suitability_score,
                summary_text: result.summary_text.to_owned(),
                financial_summary_text: result.financial_summary_text.to_owned(),
                environmental_summary_text: result.environmental_summary_text.to_owned(),
                panel_layout: parse_layout(result.panel_layout_json.as_deref()),
                roof_model_url: result.roof_model_url.to_owned(),
            },
        }
    }
}

/// The stored layout is an opaque serialized string; anything that is not a
/// JSON array is treated as absent rather than surfaced to the client.
fn parse_layout(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Array(_)) => Some(value),
        Ok(_) | Err(_) => {
            tracing::warn!("Stored panel layout is not a JSON array; returning null");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_must_be_a_json_array() {
        assert!(parse_layout(Some(r#"[{"x": 1.0, "z": 2.0}]"#)).is_some());
        assert!(parse_layout(Some(r#"{"x": 1.0}"#)).is_none());
        assert!(parse_layout(Some("not json at all")).is_none());
        assert!(parse_layout(None).is_none());
    }

    #[test]
    fn submit_dto_validates_coordinates() {
        let dto = SubmitAnalysisDto {
            address: "Nairobi".to_string(),
            latitude: -1.28,
            longitude: 36.82,
            energy_consumption: 500,
            roof_type: "flat".to_string(),
        };
        assert!(dto.validate().is_ok());

        let bad = SubmitAnalysisDto {
            latitude: -95.0,
            ..dto
        };
        assert!(bad.validate().is_err());
    }
}
