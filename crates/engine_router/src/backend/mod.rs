//! Backend client abstraction
//!
//! The orchestrator only knows about [`EvalBackend`]. The primary
//! implementation is [`HttpBackend`], which talks to a remote engine spot;
//! tests and embedders can register any other implementation.

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::evaluation::EvaluationResult;
use crate::health::HealthTracker;

mod http;
pub mod stream;

pub use http::HttpBackend;
pub use stream::{parse_info_line, parse_json_document, StreamAccumulator};

/// One evaluation backend
///
/// Implementations own their [`HealthTracker`] and must update it after every
/// `analyze` attempt. Requests to one backend are never parallelised by the
/// backend itself, but several orchestrator calls may share it.
#[async_trait]
pub trait EvalBackend: Send + Sync {
    /// Identifier of the descriptor this client serves
    fn id(&self) -> &str;

    /// Health statistics owned by this client
    fn health(&self) -> &HealthTracker;

    /// Evaluate a position, bounded by the client's attempt timeout
    async fn analyze(&self, fen: &str, depth: u32, multipv: u32) -> BackendResult<EvaluationResult>;

    /// Cheap availability probe for out-of-band monitoring
    async fn health_check(&self) -> bool;
}
