//! HTTP client for remote engine spots
//!
//! Request: `POST {address}/analyze` with `{"fen", "depth", "multiPv"}`.
//! Response: a JSON document when the content type says so, otherwise a
//! streamed UCI `info` transcript that is reassembled chunk by chunk.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use super::stream::{parse_json_document, StreamAccumulator};
use super::EvalBackend;
use crate::descriptor::BackendDescriptor;
use crate::error::{BackendError, BackendResult};
use crate::evaluation::EvaluationResult;
use crate::health::HealthTracker;

/// Longest response excerpt kept in a failure message
const BODY_EXCERPT_LEN: usize = 120;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    fen: &'a str,
    depth: u32,
    multi_pv: u32,
}

/// [`EvalBackend`] speaking the spot HTTP protocol
pub struct HttpBackend {
    descriptor: BackendDescriptor,
    client: Client,
    timeout: Duration,
    probe_timeout: Duration,
    health: HealthTracker,
}

impl HttpBackend {
    pub fn new(
        descriptor: BackendDescriptor,
        client: Client,
        timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            descriptor,
            client,
            timeout,
            probe_timeout,
            health: HealthTracker::new(),
        }
    }

    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn request(&self, fen: &str, depth: u32, multipv: u32) -> BackendResult<EvaluationResult> {
        let started = Instant::now();
        let body = AnalyzeRequest {
            fen,
            depth,
            multi_pv: multipv,
        };

        let response = self
            .client
            .post(self.descriptor.endpoint("analyze"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, started))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(BackendError::RateLimited),
            StatusCode::NOT_FOUND => return Err(BackendError::NotFound),
            status => {
                let text = response.text().await.unwrap_or_default();
                let excerpt: String = text.chars().take(BODY_EXCERPT_LEN).collect();
                return Err(BackendError::failure(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    excerpt.trim()
                )));
            }
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        if is_json {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(e, started))?;
            parse_json_document(&bytes)
        } else {
            self.read_stream(response, started).await
        }
    }

    async fn read_stream(&self, mut response: Response, started: Instant) -> BackendResult<EvaluationResult> {
        let mut accumulator = StreamAccumulator::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_error(e, started))?
        {
            accumulator.push(&chunk);
        }
        debug!(
            backend = %self.descriptor.id,
            lines = accumulator.line_count(),
            skipped = accumulator.skipped(),
            "stream complete"
        );
        accumulator.finish()
    }

    fn transport_error(&self, err: reqwest::Error, started: Instant) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
        } else {
            BackendError::failure(format!("request error: {err}"))
        }
    }
}

#[async_trait]
impl EvalBackend for HttpBackend {
    fn id(&self) -> &str {
        &self.descriptor.id
    }

    fn health(&self) -> &HealthTracker {
        &self.health
    }

    async fn analyze(&self, fen: &str, depth: u32, multipv: u32) -> BackendResult<EvaluationResult> {
        let started = Instant::now();
        let outcome = self.request(fen, depth, multipv).await;
        match &outcome {
            Ok(_) => self.health.record_success(started.elapsed()),
            Err(err) => {
                warn!(backend = %self.descriptor.id, error = %err, "spot attempt failed");
                self.health.record_failure();
            }
        }
        outcome
    }

    async fn health_check(&self) -> bool {
        let ok = match self
            .client
            .get(self.descriptor.endpoint("health"))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(backend = %self.descriptor.id, error = %err, "health probe failed");
                false
            }
        };
        self.health.record_probe(ok);
        ok
    }
}
