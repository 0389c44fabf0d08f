//! Overlay projection.
//!
//! Maps detection bounding boxes from frame space (the source's native
//! pixel grid) into surface space (the rendering target, which may be a
//! different size and can change between renders). Pure computation, done
//! fresh on every render because the surface can resize at any time
//! independent of detection cycles.

use crate::detect::Detection;
use crate::source::FrameDimensions;

/// Size of the rendering target, supplied by the caller at render time and
/// never cached here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceDimensions {
    pub width: f32,
    pub height: f32,
}

/// Hex colors keyed by `class_id % PALETTE.len()`, so the same class always
/// renders in the same color within a session.
pub const PALETTE: [&str; 10] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#f9ca24", "#6c5ce7", "#a0e7e5", "#ffeaa7", "#fd79a8",
    "#00b894", "#e17055",
];

/// Vertical distance between a box's top edge and its label anchor.
const LABEL_OFFSET: f32 = 25.0;

/// One projected rectangle plus its label, in surface pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// `"{class}: {confidence}%"` with the confidence rounded to a percent.
    pub label: String,
    pub label_left: f32,
    pub label_top: f32,
    pub color: &'static str,
}

/// Project detections from frame space into surface space.
///
/// A zero-area frame yields no rectangles rather than a division by zero.
pub fn project(
    detections: &[Detection],
    frame: FrameDimensions,
    surface: SurfaceDimensions,
) -> Vec<OverlayBox> {
    if frame.width == 0 || frame.height == 0 {
        return Vec::new();
    }
    let sx = surface.width / frame.width as f32;
    let sy = surface.height / frame.height as f32;

    detections
        .iter()
        .map(|detection| {
            let left = detection.bbox.xmin * sx;
            let top = detection.bbox.ymin * sy;
            OverlayBox {
                left,
                top,
                width: detection.bbox.width() * sx,
                height: detection.bbox.height() * sy,
                label: format!(
                    "{}: {}%",
                    detection.class,
                    (detection.confidence * 100.0).round()
                ),
                label_left: left,
                label_top: top - LABEL_OFFSET,
                color: PALETTE[detection.class_id as usize % PALETTE.len()],
            }
        })
        .collect()
}
