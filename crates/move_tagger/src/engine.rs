//! Detector registry and runner

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;

use crate::context::TagContext;
use crate::detectors;
use crate::error::DetectorError;
use crate::gate::{Detector, TagEvidence};
use crate::resolution::{self, DetectorFault, TagResult};
use crate::tags::{Family, Tag};

/// Raw output of one pass over the registry, in catalogue order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionRun {
    pub evidence: Vec<TagEvidence>,
    pub faults: Vec<DetectorFault>,
}

/// Registry of detectors with per-tag enable/disable
pub struct TagEngine {
    detectors: Vec<Detector>,
    disabled: HashSet<Tag>,
}

impl TagEngine {
    /// Registry holding the full built-in catalogue
    pub fn new() -> Self {
        Self::with_detectors(detectors::catalogue())
    }

    pub fn with_detectors(detectors: Vec<Detector>) -> Self {
        Self {
            detectors,
            disabled: HashSet::new(),
        }
    }

    /// Add a detector, replacing any existing one for the same tag
    pub fn register(&mut self, detector: Detector) {
        if let Some(slot) = self.detectors.iter_mut().find(|d| d.tag == detector.tag) {
            tracing::info!(tag = %detector.tag, "replacing detector");
            *slot = detector;
        } else {
            tracing::info!(tag = %detector.tag, "registering detector");
            self.detectors.push(detector);
        }
    }

    pub fn disable(&mut self, tag: Tag) {
        self.disabled.insert(tag);
    }

    pub fn enable(&mut self, tag: Tag) {
        self.disabled.remove(&tag);
    }

    pub fn disable_family(&mut self, family: Family) {
        for detector in &self.detectors {
            if detector.family() == family {
                self.disabled.insert(detector.tag);
            }
        }
    }

    pub fn is_enabled(&self, tag: Tag) -> bool {
        !self.disabled.contains(&tag) && self.detectors.iter().any(|d| d.tag == tag)
    }

    pub fn count(&self) -> usize {
        self.detectors.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.active().count()
    }

    /// Run every enabled detector in registration order
    pub fn evaluate(&self, ctx: &TagContext) -> DetectionRun {
        let outcomes: Vec<_> = self.active().map(|d| run_detector(d, ctx)).collect();
        collect(outcomes)
    }

    /// Same result as [`TagEngine::evaluate`], with detectors fanned out over rayon
    pub fn evaluate_parallel(&self, ctx: &TagContext) -> DetectionRun {
        let active: Vec<&Detector> = self.active().collect();
        let outcomes: Vec<_> = active.par_iter().map(|d| run_detector(d, ctx)).collect();
        collect(outcomes)
    }

    /// Evaluate and resolve in one step
    pub fn tag(&self, ctx: &TagContext) -> TagResult {
        resolution::resolve(ctx, self.evaluate(ctx))
    }

    fn active(&self) -> impl Iterator<Item = &Detector> {
        self.detectors
            .iter()
            .filter(|d| !self.disabled.contains(&d.tag))
    }
}

impl Default for TagEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn run_detector(detector: &Detector, ctx: &TagContext) -> Result<TagEvidence, (Tag, DetectorError)> {
    let result = catch_unwind(AssertUnwindSafe(|| detector.evaluate(ctx)));
    match result {
        Ok(Ok(evidence)) => Ok(evidence),
        Ok(Err(err)) => {
            tracing::debug!(tag = %detector.tag, error = %err, "detector error");
            Err((detector.tag, err))
        }
        Err(payload) => {
            tracing::error!(tag = %detector.tag, "detector panicked during detection");
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err((detector.tag, DetectorError::Panicked { message }))
        }
    }
}

fn collect(outcomes: Vec<Result<TagEvidence, (Tag, DetectorError)>>) -> DetectionRun {
    let mut run = DetectionRun::default();
    for outcome in outcomes {
        match outcome {
            Ok(evidence) => run.evidence.push(evidence),
            Err((tag, err)) => {
                run.evidence.push(TagEvidence::fault(tag, &err));
                run.faults.push(DetectorFault {
                    tag,
                    message: err.to_string(),
                });
            }
        }
    }
    run
}
