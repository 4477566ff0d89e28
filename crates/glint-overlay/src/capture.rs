//! Selection/capture layer: right-click drag tracking, region policy, and
//! bitmap cropping at device pixel density.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum drag extent, in device-independent pixels, in both dimensions.
/// Smaller regions are discarded and treated as "no capture".
pub const MIN_CAPTURE_EXTENT: f64 = 10.0;

/// A rectangle in device-independent page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Normalized rectangle spanning two corner points
    pub fn from_points(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (ax - bx).abs(),
            height: (ay - by).abs(),
        }
    }

    /// Whether both dimensions meet the minimum capture extent
    pub fn meets_minimum(&self) -> bool {
        self.width >= MIN_CAPTURE_EXTENT && self.height >= MIN_CAPTURE_EXTENT
    }

    /// Center point of the rectangle
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A page fragment extracted to seed a prompt. Consumed once by the
/// composer; not retained after the bubble is created.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// Selected text
    Text(String),
    /// Cropped screenshot plus the originating rectangle
    Image { png: Vec<u8>, region: Rect },
}

impl Capture {
    /// Encode an image capture as a `data:` URL for the wire
    pub fn data_url(&self) -> Option<String> {
        match self {
            Capture::Image { png, .. } => {
                Some(format!("data:image/png;base64,{}", STANDARD.encode(png)))
            }
            Capture::Text(_) => None,
        }
    }
}

/// Tracks a right-click drag growing a rectangular region.
///
/// The live rectangle is a transient visual: the controller emits region
/// events for it and guarantees removal on every finish path, including
/// render failure.
#[derive(Debug, Default)]
pub struct RegionTracker {
    origin: Option<(f64, f64)>,
    current: Option<(f64, f64)>,
}

impl RegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is in progress
    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Start tracking at the press point
    pub fn begin(&mut self, x: f64, y: f64) {
        self.origin = Some((x, y));
        self.current = Some((x, y));
    }

    /// Grow the region toward the pointer; returns the live rectangle
    pub fn update(&mut self, x: f64, y: f64) -> Option<Rect> {
        let (ox, oy) = self.origin?;
        self.current = Some((x, y));
        Some(Rect::from_points(ox, oy, x, y))
    }

    /// Finish the drag. Returns the dragged rectangle only if it meets the
    /// minimum extent; always resets the tracker.
    pub fn finish(&mut self, x: f64, y: f64) -> Option<Rect> {
        let (ox, oy) = self.origin.take()?;
        self.current = None;
        let rect = Rect::from_points(ox, oy, x, y);
        rect.meets_minimum().then_some(rect)
    }

    /// Abandon the drag without producing a rectangle
    pub fn cancel(&mut self) {
        self.origin = None;
        self.current = None;
    }
}

/// Renders the hosting page to an off-screen bitmap at the device's pixel
/// density. The bitmap is in device pixels: a page of w×h DIPs at ratio r
/// renders to (w·r)×(h·r).
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render_page(&self) -> Result<RgbaImage>;
}

/// Crop a full-page bitmap to the dragged rectangle, scaling the rectangle
/// by the device pixel ratio.
pub fn crop_region(bitmap: &RgbaImage, region: Rect, device_pixel_ratio: f64) -> Result<Vec<u8>> {
    let x = (region.x * device_pixel_ratio).round().max(0.0) as u32;
    let y = (region.y * device_pixel_ratio).round().max(0.0) as u32;
    let width = (region.width * device_pixel_ratio).round() as u32;
    let height = (region.height * device_pixel_ratio).round() as u32;

    if width == 0 || height == 0 || x >= bitmap.width() || y >= bitmap.height() {
        return Err(Error::RegionOutOfBounds);
    }

    // Clamp to the rendered extent rather than failing on edge drags
    let width = width.min(bitmap.width() - x);
    let height = height.min(bitmap.height() - y);

    let cropped = image::imageops::crop_imm(bitmap, x, y, width, height).to_image();

    let mut buffer = Vec::new();
    cropped.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}
