//! Failover orchestrator
//!
//! [`EvalRouter::analyze`] walks the ranked backends one at a time, bounded by
//! the retry budget, and degrades to the local heuristic once every attempt
//! failed. Backends are never raced against each other.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backend::EvalBackend;
use crate::config::{FallbackMode, RouterConfig};
use crate::error::{BackendError, RouterError, RouterResult};
use crate::evaluation::EvaluationResult;
use crate::fallback::{self, LocalEvaluator, MaterialHeuristic};
use crate::registry::BackendRegistry;

/// Who produced an evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ServedBy {
    Backend(String),
    Fallback,
}

impl std::fmt::Display for ServedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServedBy::Backend(id) => write!(f, "{id}"),
            ServedBy::Fallback => write!(f, "local fallback"),
        }
    }
}

/// Evaluation plus routing provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedEvaluation {
    pub result: EvaluationResult,
    pub served_by: ServedBy,
    /// Backend attempts made before the result was produced
    pub attempts: u32,
}

/// Routes evaluation requests across the registered spots
pub struct EvalRouter {
    registry: Arc<BackendRegistry>,
    config: RouterConfig,
    local: Option<Arc<dyn LocalEvaluator>>,
    last_served_by: Mutex<Option<ServedBy>>,
}

impl EvalRouter {
    /// Router with the material heuristic installed as local evaluator
    pub fn new(registry: Arc<BackendRegistry>, config: RouterConfig) -> Self {
        Self {
            registry,
            config,
            local: Some(Arc::new(MaterialHeuristic::new())),
            last_served_by: Mutex::new(None),
        }
    }

    pub fn with_local_evaluator(mut self, evaluator: Arc<dyn LocalEvaluator>) -> Self {
        self.local = Some(evaluator);
        self
    }

    pub fn without_local_evaluator(mut self) -> Self {
        self.local = None;
        self
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Provenance of the most recent successful call
    pub fn last_served_by(&self) -> Option<ServedBy> {
        self.last_served_by.lock().clone()
    }

    fn fallback_enabled(&self) -> bool {
        match self.config.fallback {
            FallbackMode::Off => false,
            FallbackMode::Local => true,
            FallbackMode::Auto => self.local.is_some(),
        }
    }

    /// Evaluate `fen`, failing over between backends
    pub async fn analyze(&self, fen: &str, depth: u32, multipv: u32) -> RouterResult<RoutedEvaluation> {
        let request_id = Uuid::new_v4();
        let span = info_span!("evaluate", %request_id, depth, multipv);
        self.route(fen, depth, multipv).instrument(span).await
    }

    async fn route(&self, fen: &str, depth: u32, multipv: u32) -> RouterResult<RoutedEvaluation> {
        fallback::parse_position(fen)?;

        let usable = self.registry.usable_backends();
        if usable.is_empty() {
            if self.fallback_enabled() {
                info!("no usable spots, serving from local fallback");
                return self.serve_fallback(fen, depth, multipv, 0);
            }
            return Err(RouterError::NoBackendsAvailable);
        }

        let budget = usable.len().min(self.config.max_retries as usize + 1);
        let mut failures = Vec::with_capacity(budget);
        let mut attempts = 0u32;

        for backend in usable.iter().take(budget) {
            attempts += 1;
            debug!(backend = %backend.id(), attempt = attempts, "dispatching");

            match self.attempt(backend.as_ref(), fen, depth, multipv).await {
                Ok(result) => {
                    info!(backend = %backend.id(), attempts, "evaluation served");
                    let served_by = ServedBy::Backend(backend.id().to_string());
                    *self.last_served_by.lock() = Some(served_by.clone());
                    return Ok(RoutedEvaluation {
                        result,
                        served_by,
                        attempts,
                    });
                }
                Err(err) => {
                    warn!(backend = %backend.id(), error = %err, "attempt failed");
                    failures.push(format!("{}: {}", backend.id(), err));
                    if err.is_definitive() && self.fallback_enabled() {
                        info!(backend = %backend.id(), "definitive refusal, going straight to fallback");
                        return self.serve_fallback(fen, depth, multipv, attempts);
                    }
                }
            }
        }

        if self.fallback_enabled() {
            info!(attempts, "all attempts failed, serving from local fallback");
            return self.serve_fallback(fen, depth, multipv, attempts);
        }
        Err(RouterError::AllBackendsFailed { failures })
    }

    /// One guarded attempt: bounded by the attempt timeout, panics become failures
    async fn attempt(
        &self,
        backend: &dyn EvalBackend,
        fen: &str,
        depth: u32,
        multipv: u32,
    ) -> Result<EvaluationResult, BackendError> {
        let timeout = self.config.attempt_timeout;
        let guarded = AssertUnwindSafe(backend.analyze(fen, depth, multipv)).catch_unwind();

        match tokio::time::timeout(timeout, guarded).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(panic)) => {
                backend.health().record_failure();
                Err(BackendError::failure(format!("backend panicked: {}", panic_message(&panic))))
            }
            Err(_) => {
                backend.health().record_failure();
                Err(BackendError::Timeout {
                    elapsed_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    fn serve_fallback(&self, fen: &str, depth: u32, multipv: u32, attempts: u32) -> RouterResult<RoutedEvaluation> {
        let Some(local) = &self.local else {
            return Err(RouterError::Fallback {
                message: "no local evaluator installed".to_string(),
            });
        };
        let result = local
            .analyze_legal_moves(fen, depth, multipv)
            .map_err(|err| match err {
                RouterError::Fallback { .. } => err,
                other => RouterError::Fallback {
                    message: other.to_string(),
                },
            })?;
        *self.last_served_by.lock() = Some(ServedBy::Fallback);
        Ok(RoutedEvaluation {
            result,
            served_by: ServedBy::Fallback,
            attempts,
        })
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn empty_router(fallback: FallbackMode) -> EvalRouter {
        let config = RouterConfig {
            fallback,
            ..RouterConfig::default()
        };
        EvalRouter::new(Arc::new(BackendRegistry::new(config.clone())), config)
    }

    #[tokio::test]
    async fn test_empty_registry_uses_fallback() {
        let router = empty_router(FallbackMode::Local);
        let routed = router.analyze(START, 1, 2).await.expect("Should fall back");

        assert_eq!(routed.served_by, ServedBy::Fallback);
        assert_eq!(routed.attempts, 0);
        assert_eq!(routed.result.len(), 2);
        assert_eq!(router.last_served_by(), Some(ServedBy::Fallback));
    }

    #[tokio::test]
    async fn test_empty_registry_without_fallback() {
        let router = empty_router(FallbackMode::Off);
        let err = router.analyze(START, 1, 1).await.expect_err("nothing to serve");
        assert!(matches!(err, RouterError::NoBackendsAvailable));
        assert_eq!(router.last_served_by(), None);
    }

    #[tokio::test]
    async fn test_auto_mode_needs_local_evaluator() {
        let router = empty_router(FallbackMode::Auto).without_local_evaluator();
        let err = router.analyze(START, 1, 1).await.expect_err("auto without evaluator");
        assert!(matches!(err, RouterError::NoBackendsAvailable));

        let router = empty_router(FallbackMode::Auto);
        assert!(router.analyze(START, 1, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_fen_rejected_before_routing() {
        let router = empty_router(FallbackMode::Local);
        let err = router.analyze("8/8/8 w", 1, 1).await.expect_err("bad FEN");
        assert!(matches!(err, RouterError::InvalidPosition { .. }));
    }

    #[test]
    fn test_served_by_display() {
        assert_eq!(ServedBy::Backend("eu-1".into()).to_string(), "eu-1");
        assert_eq!(ServedBy::Fallback.to_string(), "local fallback");
    }
}
