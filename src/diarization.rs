//! Speaker diarization via the pyannote.ai REST API.
//!
//! Jobs are asynchronous on the remote side: submission returns a job ID
//! which is then polled at a fixed interval until it reaches a terminal
//! status. The audio itself is fetched by the remote service from a public
//! URL, not uploaded here.

use crate::config::DiarizationSettings;
use crate::error::{Result, TolkError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// A timestamped interval attributed to one speaker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiarizationInterval {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Speaker label assigned by the service (e.g. "SPEAKER_00").
    pub speaker: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "jobId")]
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    status: JobStatus,
    output: Option<JobOutput>,
}

#[derive(Debug, Deserialize)]
struct JobOutput {
    diarization: Vec<DiarizationInterval>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JobStatus {
    Succeeded,
    Failed,
    #[serde(other)]
    Pending,
}

/// Client for the asynchronous diarization API.
pub struct DiarizationClient {
    client: reqwest::Client,
    api_base_url: String,
    api_key: String,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl DiarizationClient {
    /// Create a new diarization client from settings.
    pub fn new(settings: &DiarizationSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            poll_attempts: settings.poll_attempts,
            poll_interval: Duration::from_secs(settings.poll_interval_seconds),
        }
    }

    /// Submit a diarization job for an audio file reachable at `audio_url`.
    ///
    /// Returns the remote job ID.
    #[instrument(skip(self))]
    pub async fn submit(&self, audio_url: &str) -> Result<String> {
        info!("Submitting diarization job for {}", audio_url);

        let response = self
            .client
            .post(format!("{}/diarize", self.api_base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "url": audio_url }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TolkError::DiarizationSubmit(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let submitted: SubmitResponse = response.json().await?;
        info!("Diarization job submitted: {}", submitted.job_id);
        Ok(submitted.job_id)
    }

    /// Poll a job until it succeeds, fails, or the attempt budget runs out.
    ///
    /// Transport errors during polling propagate immediately rather than
    /// consuming an attempt; the loop is a completion wait, not a retry
    /// mechanism.
    #[instrument(skip(self))]
    pub async fn poll(&self, job_id: &str) -> Result<Vec<DiarizationInterval>> {
        for attempt in 0..self.poll_attempts {
            let response = self
                .client
                .get(format!("{}/jobs/{}", self.api_base_url, job_id))
                .bearer_auth(&self.api_key)
                .send()
                .await?
                .error_for_status()?;

            let job: JobResponse = response.json().await?;

            match job.status {
                JobStatus::Succeeded => {
                    let intervals = job
                        .output
                        .map(|o| o.diarization)
                        .ok_or_else(|| {
                            TolkError::DiarizationFailed("Job succeeded without output".into())
                        })?;
                    info!("Diarization completed with {} intervals", intervals.len());
                    return Ok(intervals);
                }
                JobStatus::Failed => {
                    return Err(TolkError::DiarizationFailed(format!("Job {} failed", job_id)));
                }
                JobStatus::Pending => {
                    debug!("Job {} still pending (attempt {})", job_id, attempt + 1);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(TolkError::DiarizationTimeout(self.poll_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn spawn_fake_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str, attempts: u32) -> DiarizationClient {
        DiarizationClient::new(&DiarizationSettings {
            api_base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            poll_attempts: attempts,
            poll_interval_seconds: 0,
        })
    }

    #[tokio::test]
    async fn test_submit_returns_job_id() {
        let router = Router::new().route(
            "/diarize",
            post(|| async { Json(serde_json::json!({ "jobId": "job-42" })) }),
        );
        let base = spawn_fake_api(router).await;

        let client = client_for(&base, 30);
        let job_id = client.submit("http://example.com/uploads/a.wav").await.unwrap();
        assert_eq!(job_id, "job-42");
    }

    #[tokio::test]
    async fn test_submit_non_2xx_fails() {
        let router = Router::new().route(
            "/diarize",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_fake_api(router).await;

        let client = client_for(&base, 30);
        let err = client.submit("http://example.com/a.wav").await.unwrap_err();
        assert!(matches!(err, TolkError::DiarizationSubmit(_)));
    }

    #[tokio::test]
    async fn test_poll_succeeds_on_fifth_attempt() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        let router = Router::new()
            .route(
                "/jobs/{id}",
                get(|State(polls): State<Arc<AtomicU32>>| async move {
                    let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 5 {
                        Json(serde_json::json!({ "status": "queued" }))
                    } else {
                        Json(serde_json::json!({
                            "status": "succeeded",
                            "output": { "diarization": [
                                { "start": 0.0, "end": 4.2, "speaker": "SPEAKER_00" }
                            ]}
                        }))
                    }
                }),
            )
            .with_state(counter);
        let base = spawn_fake_api(router).await;

        let client = client_for(&base, 30);
        let intervals = client.poll("job-1").await.unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 5);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].speaker, "SPEAKER_00");
    }

    #[tokio::test]
    async fn test_poll_failed_job_aborts_immediately() {
        let router = Router::new().route(
            "/jobs/{id}",
            get(|| async { Json(serde_json::json!({ "status": "failed" })) }),
        );
        let base = spawn_fake_api(router).await;

        let client = client_for(&base, 30);
        let err = client.poll("job-1").await.unwrap_err();
        assert!(matches!(err, TolkError::DiarizationFailed(_)));
    }

    #[tokio::test]
    async fn test_poll_exhausts_attempt_budget() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        let router = Router::new()
            .route(
                "/jobs/{id}",
                get(|State(polls): State<Arc<AtomicU32>>| async move {
                    polls.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "status": "queued" }))
                }),
            )
            .with_state(counter);
        let base = spawn_fake_api(router).await;

        let client = client_for(&base, 30);
        let err = client.poll("job-1").await.unwrap_err();

        assert!(matches!(err, TolkError::DiarizationTimeout(30)));
        assert_eq!(polls.load(Ordering::SeqCst), 30);
    }
}
