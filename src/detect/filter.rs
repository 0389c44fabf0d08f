use super::result::Detection;

/// Keep detections with `confidence >= threshold`, preserving input order.
///
/// Pure and idempotent; the client applies it before returning a result so
/// `total_objects` always reflects the filtered count.
pub fn filter_by_confidence(mut detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections.retain(|d| d.confidence >= threshold);
    detections
}
