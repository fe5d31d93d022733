//! Position-evaluation routing across remote engine spots
//!
//! ```text
//! EvalRouter::analyze
//!     └── BackendRegistry::usable_backends  (selector ranking)
//!           └── EvalBackend::analyze        (HttpBackend, one attempt each)
//!     └── LocalEvaluator                    (degraded mode)
//! ```

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod evaluation;
pub mod fallback;
pub mod health;
pub mod registry;
pub mod router;
pub mod selector;

pub use backend::{EvalBackend, HttpBackend};
pub use config::{FallbackMode, RouterConfig};
pub use descriptor::BackendDescriptor;
pub use error::{BackendError, BackendResult, ConfigError, RouterError, RouterResult};
pub use evaluation::{EvaluationLine, EvaluationResult, Score, MATE_CP, MAX_MATE_DISTANCE};
pub use fallback::{LocalEvaluator, MaterialHeuristic};
pub use health::{BackendHealth, HealthStatus, HealthTracker};
pub use registry::BackendRegistry;
pub use router::{EvalRouter, RoutedEvaluation, ServedBy};
