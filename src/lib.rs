//! wastewatch
//!
//! Real-time waste detection over a live video feed. The crate continuously
//! samples frames from a video source, submits each sampled frame to an
//! external object-detection inference service, filters the results by
//! confidence, and projects the resulting bounding boxes onto a
//! differently-sized display surface.
//!
//! # Components
//!
//! - `source`: the `VideoSource` collaborator interface plus still-image and
//!   test-pattern implementations
//! - `sampler`: captures the current frame into a reusable canvas and
//!   encodes it as a JPEG data URL
//! - `detect`: the `Detector` seam, the HTTP client for the inference
//!   service, and the confidence filter
//! - `coordinator`: the `DetectionLoop` owning the periodic timer, cycle
//!   sequencing, and the published snapshot
//! - `overlay`: pure projection of detections from frame space into surface
//!   space for rendering
//!
//! Playback itself (decoding, play/pause) and the inference model are
//! external collaborators; this crate only talks to their interfaces.

pub mod config;
pub mod coordinator;
pub mod detect;
pub mod error;
pub mod overlay;
pub mod sampler;
pub mod source;

pub use config::DetectionConfig;
pub use coordinator::{DetectionLoop, LoopSnapshot};
pub use detect::{
    filter_by_confidence, BoundingBox, Detection, DetectionResult, Detector, HttpDetector,
    HttpDetectorConfig,
};
pub use error::DetectError;
pub use overlay::{project, OverlayBox, SurfaceDimensions, PALETTE};
pub use sampler::{FrameSampler, SampledFrame};
pub use source::{FrameDimensions, StillSource, TestPatternSource, VideoSource};
