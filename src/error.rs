use thiserror::Error;

/// Per-cycle detection failures.
///
/// None of these stop the loop. The coordinator catches every variant at the
/// cycle boundary and converts it into the `error` field of the published
/// snapshot; the only fatal condition is a caller-invoked stop.
#[derive(Clone, Debug, Error)]
pub enum DetectError {
    /// The video source has no displayable frame (zero-area dimensions or a
    /// failed pixel copy). The cycle skips the detect step.
    #[error("frame unavailable: {0}")]
    SampleUnavailable(String),

    /// Network-level failure reaching the inference service (timeout, DNS,
    /// connection refused).
    #[error("detection transport error: {0}")]
    Transport(String),

    /// The inference service answered with a non-success status.
    #[error("detection service error: {0}")]
    Service(String),

    /// The response body did not match the detection wire format.
    #[error("malformed detection response: {0}")]
    Protocol(String),
}
