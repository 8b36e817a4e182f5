// db/analysisdb.rs
use async_trait::async_trait;

use super::db::DBClient;
use crate::models::analysismodel::{AnalysisOutcome, AnalysisRequest, AnalysisResult};

const REQUEST_COLUMNS: &str = r#"
    id, user_id, address, latitude, longitude,
    energy_consumption, roof_type_manual, roof_image_url, created_at
"#;

const RESULT_COLUMNS: &str = r#"
    id, request_id, status,
    roof_type_ai, roof_orientation_ai, roof_angle_ai,
    panel_count, annual_production_kwh, annual_savings_ksh,
    system_size_kw, payback_period_years, solar_suitability_score,
    summary_text, financial_summary_text, environmental_summary_text,
    panel_layout_json, roof_model_url,
    created_at, updated_at
"#;

#[async_trait]
pub trait AnalysisExt {
    /// Inserts the request and its PENDING result in one transaction, so a
    /// crash can never leave a request without a result row.
    async fn create_analysis_request(
        &self,
        user_id: i64,
        address: &str,
        latitude: f64,
        longitude: f64,
        energy_consumption: i32,
        roof_type_manual: &str,
        roof_image_url: &str,
    ) -> Result<AnalysisRequest, sqlx::Error>;

    async fn get_analysis_request(
        &self,
        request_id: i64,
    ) -> Result<Option<AnalysisRequest>, sqlx::Error>;

    async fn get_latest_request_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<AnalysisRequest>, sqlx::Error>;

    async fn get_result_for_request(
        &self,
        request_id: i64,
    ) -> Result<Option<AnalysisResult>, sqlx::Error>;

    /// Writes the worker outcome and flips status to COMPLETED. Guarded on
    /// status = PENDING; returns None when the row was already terminal.
    async fn complete_analysis_result(
        &self,
        request_id: i64,
        outcome: &AnalysisOutcome,
    ) -> Result<Option<AnalysisResult>, sqlx::Error>;

    /// Flips status to FAILED leaving all AI fields null. Same PENDING guard.
    async fn fail_analysis_result(
        &self,
        request_id: i64,
    ) -> Result<Option<AnalysisResult>, sqlx::Error>;
}

#[async_trait]
impl AnalysisExt for DBClient {
    async fn create_analysis_request(
        &self,
        user_id: i64,
        address: &str,
        latitude: f64,
        longitude: f64,
        energy_consumption: i32,
        roof_type_manual: &str,
        roof_image_url: &str,
    ) -> Result<AnalysisRequest, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, AnalysisRequest>(&format!(
            r#"
            INSERT INTO analysis_requests (
                user_id, address, latitude, longitude,
                energy_consumption, roof_type_manual, roof_image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(address)
        .bind(latitude)
        .bind(longitude)
        .bind(energy_consumption)
        .bind(roof_type_manual)
        .bind(roof_image_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_results (request_id, status)
            VALUES ($1, 'pending'::analysis_status)
            "#,
        )
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(request)
    }

    async fn get_analysis_request(
        &self,
        request_id: i64,
    ) -> Result<Option<AnalysisRequest>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM analysis_requests WHERE id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_latest_request_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<AnalysisRequest>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM analysis_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_result_for_request(
        &self,
        request_id: i64,
    ) -> Result<Option<AnalysisResult>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM analysis_results WHERE request_id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn complete_analysis_result(
        &self,
        request_id: i64,
        outcome: &AnalysisOutcome,
    ) -> Result<Option<AnalysisResult>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisResult>(&format!(
            r#"
            UPDATE analysis_results
            SET status = 'completed'::analysis_status,
                roof_type_ai = $2,
                roof_orientation_ai = $3,
                roof_angle_ai = $4,
                panel_count = $5,
                annual_production_kwh = $6,
                annual_savings_ksh = $7,
                system_size_kw = $8,
                payback_period_years = $9,
                solar_suitability_score = $10,
                summary_text = $11,
                financial_summary_text = $12,
                environmental_summary_text = $13,
                panel_layout_json = $14,
                roof_model_url = $15,
                updated_at = NOW()
            WHERE request_id = $1 AND status = 'pending'::analysis_status
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(&outcome.roof_type_ai)
        .bind(&outcome.roof_orientation_ai)
        .bind(outcome.roof_angle_ai)
        .bind(outcome.panel_count)
        .bind(outcome.annual_production_kwh)
        .bind(outcome.annual_savings_ksh)
        .bind(outcome.system_size_kw)
        .bind(outcome.payback_period_years)
        .bind(outcome.solar_suitability_score)
        .bind(&outcome.summary_text)
        .bind(&outcome.financial_summary_text)
        .bind(&outcome.environmental_summary_text)
        .bind(&outcome.panel_layout_json)
        .bind(&outcome.roof_model_url)
        .fetch_optional(&self.pool)
        .await
    }

    async fn fail_analysis_result(
        &self,
        request_id: i64,
    ) -> Result<Option<AnalysisResult>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisResult>(&format!(
            r#"
            UPDATE analysis_results
            SET status = 'failed'::analysis_status,
                updated_at = NOW()
            WHERE request_id = $1 AND status = 'pending'::analysis_status
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }
}
