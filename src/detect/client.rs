//! HTTP detection client.
//!
//! Sends one encoded frame to the configured inference endpoint and parses
//! the structured detection response. The wire format is JSON both ways:
//!
//! request:  `{ "frame": "<jpeg data url>", "timestamp": <epoch ms> }`
//! response: `{ "detections": [ { "bbox": [xmin, ymin, xmax, ymax],
//!               "class": "...", "confidence": 0.93, "class_id": 0 }, ... ],
//!              "total_objects": 3, "timestamp": <epoch ms> }`
//!
//! A response without a `detections` array is a protocol error. The
//! service-reported `total_objects` is ignored; the count is recomputed
//! from the confidence-filtered detections.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::filter::filter_by_confidence;
use super::result::{BoundingBox, Detection, DetectionResult};
use super::Detector;
use crate::error::DetectError;
use crate::sampler::SampledFrame;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/detect-video-frame";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP detection client.
#[derive(Clone, Debug)]
pub struct HttpDetectorConfig {
    /// Inference service URL.
    pub endpoint: String,
    /// Upper bound on one request/response round trip.
    pub timeout: Duration,
}

impl Default for HttpDetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    frame: &'a str,
    timestamp: u64,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Option<Vec<WireDetection>>,
}

#[derive(Deserialize)]
struct WireDetection {
    bbox: [f32; 4],
    class: String,
    confidence: f32,
    class_id: u32,
}

/// Blocking HTTP detector. Shared by overlapping in-flight cycles, so all
/// state lives in the reusable agent.
pub struct HttpDetector {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpDetector {
    pub fn new(config: HttpDetectorConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            endpoint: config.endpoint,
        }
    }
}

impl Detector for HttpDetector {
    fn detect(
        &self,
        frame: &SampledFrame,
        confidence_threshold: f32,
    ) -> Result<DetectionResult, DetectError> {
        let request = DetectRequest {
            frame: &frame.data_url,
            timestamp: frame.captured_at_ms,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| DetectError::Protocol(format!("encode request: {}", e)))?;

        let response = match self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                return Err(DetectError::Service(format!(
                    "{} {}",
                    code,
                    response.status_text()
                )));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(DetectError::Transport(transport.to_string()));
            }
        };

        let body = response
            .into_string()
            .map_err(|e| DetectError::Transport(format!("read response: {}", e)))?;
        parse_response(&body, frame.captured_at_ms, confidence_threshold)
    }
}

fn parse_response(
    body: &str,
    captured_at_ms: u64,
    confidence_threshold: f32,
) -> Result<DetectionResult, DetectError> {
    let wire: DetectResponse =
        serde_json::from_str(body).map_err(|e| DetectError::Protocol(e.to_string()))?;
    let wire_detections = wire
        .detections
        .ok_or_else(|| DetectError::Protocol("response has no detections array".to_string()))?;
    let raw_count = wire_detections.len();

    let mut detections = Vec::with_capacity(raw_count);
    for detection in wire_detections {
        detections.push(normalize_detection(detection)?);
    }
    let detections = filter_by_confidence(detections, confidence_threshold);
    log::debug!(
        "{} detections from service, {} after confidence filter",
        raw_count,
        detections.len()
    );

    let total_objects = detections.len();
    Ok(DetectionResult {
        detections,
        total_objects,
        timestamp_ms: captured_at_ms,
    })
}

fn normalize_detection(wire: WireDetection) -> Result<Detection, DetectError> {
    let [xmin, ymin, xmax, ymax] = wire.bbox;
    if ![xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite()) {
        return Err(DetectError::Protocol(
            "non-finite bbox coordinate".to_string(),
        ));
    }
    Ok(Detection {
        bbox: BoundingBox::normalized(xmin, ymin, xmax, ymax),
        class: wire.class,
        confidence: wire.confidence.clamp(0.0, 1.0),
        class_id: wire.class_id,
    })
}
