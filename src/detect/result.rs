/// Axis-aligned box in source-frame pixel coordinates.
///
/// `xmin <= xmax` and `ymin <= ymax` always hold; `normalized` enforces the
/// invariant at the parse boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    /// Build a box from raw corner coordinates, reordering swapped corners
    /// so widths and heights are never negative.
    pub fn normalized(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin: xmin.min(xmax),
            ymin: ymin.min(ymax),
            xmax: xmin.max(xmax),
            ymax: ymin.max(ymax),
        }
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }
}

/// One inferred object instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Class label as reported by the service.
    pub class: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Used only for deterministic overlay color assignment; never validated
    /// against a class table.
    pub class_id: u32,
}

/// Result of one successful detection cycle.
///
/// Immutable after creation; the next cycle's result supersedes it wholesale
/// rather than merging into it.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    /// Count after confidence filtering, not the raw service-reported count.
    pub total_objects: usize,
    /// Capture time of the sampled frame, epoch milliseconds.
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_keeps_ordered_corners() {
        let bbox = BoundingBox::normalized(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bbox.xmin, 10.0);
        assert_eq!(bbox.ymax, 40.0);
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.height(), 20.0);
    }

    #[test]
    fn normalized_reorders_swapped_corners() {
        let bbox = BoundingBox::normalized(30.0, 40.0, 10.0, 20.0);
        assert_eq!(bbox.xmin, 10.0);
        assert_eq!(bbox.xmax, 30.0);
        assert_eq!(bbox.ymin, 20.0);
        assert_eq!(bbox.ymax, 40.0);
        assert!(bbox.width() >= 0.0);
        assert!(bbox.height() >= 0.0);
    }
}
