// service/analysis_worker.rs
use std::future::Future;
use std::sync::Arc;

use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use serde_json::from_str;
use tokio::time::{sleep, Duration};

use super::error::ServiceError;
use super::gemini_service::GeminiClient;
use super::solar_api_service::AerialViewClient;
use crate::db::analysisdb::AnalysisExt;
use crate::db::db::DBClient;
use crate::models::analysismodel::{AnalysisOutcome, AnalysisRequest};

/// Redis list the submission endpoint pushes jobs onto.
pub const ANALYSIS_QUEUE_KEY: &str = "analysis:jobs";
/// Payloads the worker could not act on end up here for inspection.
const DEAD_LETTER_KEY: &str = "analysis:dead_letter";

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// Queue message: one per submitted analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisJob {
    pub request_id: i64,
}

/// Background worker for the roof analysis pipeline.
///
/// Pops `AnalysisJob` messages off a Redis list with `BRPOP`, one at a time
/// (the pipeline is bound by third-party API latency, not CPU), runs the
/// external AI/geo calls, and moves the PENDING result row to COMPLETED or
/// FAILED. Status updates are guarded on PENDING in SQL, so a terminal row is
/// never overwritten even if a job is somehow delivered twice.
#[derive(Clone)]
pub struct AnalysisWorker {
    db_client: Arc<DBClient>,
    gemini: Arc<GeminiClient>,
    aerial: Arc<AerialViewClient>,
    pub queue_key: String,
    pub idle_sleep: Duration,
}

impl AnalysisWorker {
    pub fn new(
        db_client: Arc<DBClient>,
        gemini: Arc<GeminiClient>,
        aerial: Arc<AerialViewClient>,
        queue_key: &str,
    ) -> Self {
        Self {
            db_client,
            gemini,
            aerial,
            queue_key: queue_key.to_string(),
            idle_sleep: Duration::from_secs(2),
        }
    }

    /// Pushes a job onto the queue. Returns false when Redis is not
    /// configured, in which case the caller runs the job in-process instead.
    pub async fn enqueue(&self, request_id: i64) -> Result<bool, ServiceError> {
        let Some(rc) = &self.db_client.redis_client else {
            return Ok(false);
        };

        let payload = serde_json::to_string(&AnalysisJob { request_id })
            .map_err(|e| ServiceError::Queue(e.to_string()))?;

        let mut conn = ConnectionManager::clone(rc);
        conn.lpush::<_, _, ()>(&self.queue_key, payload)
            .await
            .map_err(|e| ServiceError::Queue(e.to_string()))?;

        Ok(true)
    }

    /// Run the worker loop until the provided shutdown signal triggers.
    /// Blocks the current task while polling Redis with BRPOP.
    pub async fn run_forever(&self, shutdown: impl Future<Output = ()>) {
        let mut shutdown = Box::pin(shutdown);

        loop {
            if futures::future::poll_immediate(&mut shutdown).await.is_some() {
                tracing::info!("AnalysisWorker: shutdown requested, exiting loop");
                break;
            }

            let Some(rc) = &self.db_client.redis_client else {
                tracing::warn!("AnalysisWorker: Redis not configured; sleeping before retrying");
                sleep(self.idle_sleep).await;
                continue;
            };

            let mut conn = ConnectionManager::clone(rc);
            match redis::cmd("BRPOP")
                .arg(&self.queue_key)
                .arg(5)
                .query_async::<_, Option<(String, String)>>(&mut conn)
                .await
            {
                Ok(Some((_key, payload))) => match from_str::<AnalysisJob>(&payload) {
                    Ok(job) => {
                        if let Err(e) = self.process(job.request_id).await {
                            // Terminal per job: the result row is already
                            // FAILED (or missing); the user must resubmit.
                            tracing::error!(
                                "AnalysisWorker: analysis {} failed: {}",
                                job.request_id,
                                e
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "AnalysisWorker: invalid job payload: {} ; payload: {}",
                            e,
                            payload
                        );
                        let _: Result<(), _> = conn.lpush(DEAD_LETTER_KEY, &payload).await;
                    }
                },
                Ok(None) => {
                    // timeout, no data
                }
                Err(e) => {
                    tracing::error!("AnalysisWorker: redis brpop error: {}", e);
                    sleep(self.idle_sleep).await;
                }
            }
        }

        tracing::info!("AnalysisWorker: stopped");
    }

    /// Runs the full pipeline for one request id. Used both by the queue
    /// consumer and, when Redis is absent, by a directly spawned task.
    pub async fn process(&self, request_id: i64) -> Result<(), ServiceError> {
        let request = self
            .db_client
            .get_analysis_request(request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound(request_id))?;

        let result = self
            .db_client
            .get_result_for_request(request_id)
            .await?
            .ok_or(ServiceError::ResultNotFound(request_id))?;

        if result.status.is_terminal() {
            tracing::info!(
                "AnalysisWorker: result for request {} is already {}, skipping",
                request_id,
                result.status.to_str()
            );
            return Ok(());
        }

        match self.run_analysis(&request).await {
            Ok(outcome) => {
                match self
                    .db_client
                    .complete_analysis_result(request_id, &outcome)
                    .await?
                {
                    Some(_) => {
                        tracing::info!("AnalysisWorker: completed analysis {}", request_id);
                    }
                    None => {
                        tracing::warn!(
                            "AnalysisWorker: result for request {} turned terminal mid-flight",
                            request_id
                        );
                    }
                }
                Ok(())
            }
            Err(e) => {
                if let Err(db_err) = self.db_client.fail_analysis_result(request_id).await {
                    tracing::error!(
                        "AnalysisWorker: could not mark analysis {} failed: {}",
                        request_id,
                        db_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn run_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, ServiceError> {
        // (a) 3D roof footage. Best effort: missing footage is normal and an
        // exhausted lookup only costs the viewer tab, not the analysis.
        let roof_model_url = match with_backoff("3d roof model lookup", || {
            self.aerial
                .get_roof_model_url(request.latitude, request.longitude)
        })
        .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    "AnalysisWorker: 3D model lookup degraded for request {}: {}",
                    request.id,
                    e
                );
                None
            }
        };

        // (b) sizing estimate. Strict schema; this is the call that decides
        // COMPLETED vs FAILED.
        let estimate = with_backoff("solar analysis", || {
            self.gemini.get_solar_analysis(
                &request.address,
                request.latitude,
                request.longitude,
                request.energy_consumption,
                &request.roof_type_manual,
            )
        })
        .await?;

        // (c) panel layout. Best effort: an unusable layout degrades to null
        // while the result still completes.
        let layout = match with_backoff("panel layout", || {
            self.gemini
                .get_panel_layout(&request.roof_image_url, &request.roof_type_manual)
        })
        .await
        {
            Ok(placements) => Some(placements),
            Err(e) => {
                tracing::warn!(
                    "AnalysisWorker: panel layout degraded for request {}: {}",
                    request.id,
                    e
                );
                None
            }
        };

        let panel_layout_json = layout.as_ref().and_then(|p| serde_json::to_string(p).ok());

        Ok(AnalysisOutcome {
            roof_type_ai: estimate
                .roof_type_ai
                .or_else(|| Some(request.roof_type_manual.clone())),
            roof_orientation_ai: estimate.roof_orientation_ai,
            roof_angle_ai: estimate.roof_angle_ai,
            panel_count: Some(estimate.panel_count),
            annual_production_kwh: Some(estimate.annual_production_kwh),
            annual_savings_ksh: Some(estimate.annual_savings_ksh),
            system_size_kw: Some(estimate.system_size_kw),
            payback_period_years: Some(estimate.payback_period_years),
            solar_suitability_score: Some(estimate.solar_suitability_score),
            summary_text: estimate.summary_text,
            financial_summary_text: estimate.financial_summary_text,
            environmental_summary_text: estimate.environmental_summary_text,
            panel_layout_json,
            roof_model_url,
        })
    }
}

/// Bounded exponential backoff around a single upstream call. Only
/// transport-level failures are retried; payload errors return immediately.
async fn with_backoff<T, F, Fut>(label: &str, mut op: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                tracing::warn!(
                    "{} attempt {} failed: {}. Retrying in {}ms...",
                    label,
                    attempt,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn job_payload_roundtrip() {
        let payload = serde_json::to_string(&AnalysisJob { request_id: 7 }).unwrap();
        assert_eq!(payload, r#"{"request_id":7}"#);
        assert_eq!(
            from_str::<AnalysisJob>(&payload).unwrap(),
            AnalysisJob { request_id: 7 }
        );
    }

    #[tokio::test]
    async fn backoff_does_not_retry_payload_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), ServiceError> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::BadUpstreamPayload("bad json".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backoff_retries_transport_errors_up_to_the_limit() {
        let calls = AtomicU32::new(0);
        let result: Result<(), ServiceError> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Upstream("connection reset".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn backoff_stops_after_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ServiceError::Upstream("transient".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
