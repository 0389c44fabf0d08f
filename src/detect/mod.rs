//! Object detection against an external inference service.
//!
//! The `Detector` trait is the seam between the loop coordinator and the
//! inference backend; `HttpDetector` is the production implementation,
//! tests substitute scripted detectors.

mod client;
mod filter;
mod result;

pub use client::{HttpDetector, HttpDetectorConfig, DEFAULT_ENDPOINT};
pub use filter::filter_by_confidence;
pub use result::{BoundingBox, Detection, DetectionResult};

use crate::error::DetectError;
use crate::sampler::SampledFrame;

/// Detection backend.
///
/// `detect` takes `&self` because the coordinator shares one backend across
/// overlapping in-flight cycles; implementations must not retry internally.
/// Retry policy belongs to the coordinator (which has none: the next
/// scheduled cycle supersedes a failed one).
pub trait Detector: Send + Sync {
    /// Run detection on one sampled frame, returning the confidence-filtered
    /// result.
    fn detect(
        &self,
        frame: &SampledFrame,
        confidence_threshold: f32,
    ) -> Result<DetectionResult, DetectError>;
}
