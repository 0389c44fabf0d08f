//! Frame sampling.
//!
//! Extracts a still image from the current playback position of a
//! `VideoSource` and encodes it for transport to the inference service.
//!
//! The sampler owns one reusable RGB canvas and one reusable JPEG buffer;
//! both are resized to the source's *current* native resolution on every
//! call rather than reallocated. The native resolution is authoritative for
//! detection geometry, independent of how large the source is rendered on
//! screen.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::DetectError;
use crate::source::VideoSource;

/// Fixed lossy quality factor, bounding payload size and latency.
pub const JPEG_QUALITY: u8 = 80;

/// One captured frame, encoded for transport.
#[derive(Clone, Debug)]
pub struct SampledFrame {
    /// `data:image/jpeg;base64,...` payload for the detection request.
    pub data_url: String,
    /// Native width of the source at capture time.
    pub width: u32,
    /// Native height of the source at capture time.
    pub height: u32,
    /// Capture time, epoch milliseconds.
    pub captured_at_ms: u64,
}

/// Reusable frame capture surface.
///
/// Not safe to share between overlapping sampling calls; the coordinator
/// keeps it on the ticker thread so sampling is always serialized.
pub struct FrameSampler {
    canvas: Vec<u8>,
    jpeg: Vec<u8>,
    quality: u8,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::with_quality(JPEG_QUALITY)
    }

    pub fn with_quality(quality: u8) -> Self {
        Self {
            canvas: Vec::new(),
            jpeg: Vec::new(),
            quality,
        }
    }

    /// Capture the source's current frame as a JPEG data URL.
    ///
    /// Fails with `SampleUnavailable` when the source has zero-area
    /// dimensions or the pixel copy fails.
    pub fn sample(&mut self, source: &mut dyn VideoSource) -> Result<SampledFrame, DetectError> {
        let (width, height) = source.native_size();
        if width == 0 || height == 0 {
            return Err(DetectError::SampleUnavailable(
                "source has zero-area dimensions".to_string(),
            ));
        }

        self.canvas.resize(width as usize * height as usize * 3, 0);
        source
            .copy_current_frame(&mut self.canvas)
            .map_err(|e| DetectError::SampleUnavailable(e.to_string()))?;

        self.jpeg.clear();
        JpegEncoder::new_with_quality(&mut self.jpeg, self.quality)
            .encode(&self.canvas, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| DetectError::SampleUnavailable(format!("jpeg encode: {}", e)))?;

        Ok(SampledFrame {
            data_url: format!(
                "data:image/jpeg;base64,{}",
                BASE64_STANDARD.encode(&self.jpeg)
            ),
            width,
            height,
            captured_at_ms: epoch_ms(),
        })
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
