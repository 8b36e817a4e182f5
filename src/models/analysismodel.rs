use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "analysis_status", rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn to_str(&self) -> &str {
        match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
        }
    }

    /// Once a result leaves PENDING it never goes back.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

/// One user-submitted roof survey. Immutable after creation; only its
/// paired result row is ever updated.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct AnalysisRequest {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Average monthly consumption in kWh
    pub energy_consumption: i32,
    pub roof_type_manual: String,
    pub roof_image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct AnalysisResult {
    pub id: i64,
    pub request_id: i64,
    pub status: AnalysisStatus,
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
    /// Serialized panel placement array; re-parsed defensively when read back
    pub panel_layout_json: Option<String>,
    pub roof_model_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the background worker derives for a completed analysis.
/// Non-critical fields stay None when their upstream call degraded.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
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
    pub panel_layout_json: Option<String>,
    pub roof_model_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!AnalysisStatus::Pending.is_terminal());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
    }

    #[test]
    fn status_labels_match_client_contract() {
        assert_eq!(AnalysisStatus::Pending.to_str(), "PENDING");
        assert_eq!(AnalysisStatus::Completed.to_str(), "COMPLETED");
        assert_eq!(AnalysisStatus::Failed.to_str(), "FAILED");
    }
}
