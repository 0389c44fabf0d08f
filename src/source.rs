//! Video sources.
//!
//! A `VideoSource` is the collaborator interface over the actual playback
//! machinery: it exposes the source's native resolution and lets the sampler
//! copy the currently displayed frame. Decoding and playback control live
//! outside this crate.
//!
//! Two implementations ship with the crate:
//! - `StillSource`: serves one decoded local image as every frame
//! - `TestPatternSource`: synthetic moving block (`stub://` sources)

use anyhow::{anyhow, Context, Result};

/// Native resolution of a video source, captured once when the source
/// metadata becomes available and held for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

/// A live video source the sampler can read frames from.
pub trait VideoSource: Send {
    /// Native resolution of the source. Returns `(0, 0)` until the source
    /// metadata is available (not yet loaded, or ended).
    fn native_size(&self) -> (u32, u32);

    /// Copy the currently displayed frame into `rgb` as tightly packed RGB8
    /// at native resolution. The caller sizes `rgb` to `width * height * 3`
    /// based on `native_size`.
    fn copy_current_frame(&mut self, rgb: &mut [u8]) -> Result<()>;
}

/// Frame source backed by a single decoded image file.
///
/// Every sampled frame is the same picture. Useful for demos and for
/// exercising the full pipeline without a camera.
pub struct StillSource {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl StillSource {
    pub fn open(path: &str) -> Result<Self> {
        let decoded = image::open(path).with_context(|| format!("open still image {}", path))?;
        let rgb = decoded.into_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            pixels: rgb.into_raw(),
            width,
            height,
        })
    }
}

impl VideoSource for StillSource {
    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn copy_current_frame(&mut self, rgb: &mut [u8]) -> Result<()> {
        if rgb.len() != self.pixels.len() {
            return Err(anyhow!(
                "canvas is {} bytes; source frame is {}",
                rgb.len(),
                self.pixels.len()
            ));
        }
        rgb.copy_from_slice(&self.pixels);
        Ok(())
    }
}

/// Synthetic frame source painting a bright block that moves a little on
/// every read, over a dark field. Stands in for a real camera behind
/// `stub://` source specs.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    tick: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }
}

impl VideoSource for TestPatternSource {
    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn copy_current_frame(&mut self, rgb: &mut [u8]) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 3;
        if rgb.len() != expected {
            return Err(anyhow!(
                "canvas is {} bytes; expected {}",
                rgb.len(),
                expected
            ));
        }
        rgb.fill(24);

        let block = (self.width / 8).max(1);
        let x_range = self.width.saturating_sub(block).max(1) as u64;
        let y_range = self.height.saturating_sub(block).max(1) as u64;
        let x0 = ((self.tick * 7) % x_range) as u32;
        let y0 = ((self.tick * 3) % y_range) as u32;

        for y in y0..(y0 + block).min(self.height) {
            for x in x0..(x0 + block).min(self.width) {
                let i = ((y * self.width + x) * 3) as usize;
                rgb[i] = 230;
                rgb[i + 1] = 180;
                rgb[i + 2] = 40;
            }
        }

        self.tick += 1;
        Ok(())
    }
}
