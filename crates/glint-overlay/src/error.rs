//! Error types for glint-overlay

use thiserror::Error;

/// Result type alias using the overlay Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by overlay operations.
///
/// Note that a drag region below the minimum extent is not an error: it is
/// a "no capture" outcome handled by the capture layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Gateway round trip failed
    #[error(transparent)]
    Gateway(#[from] glint_gateway::Error),

    /// Rendering the page to a bitmap failed
    #[error("Page render failed: {0}")]
    Render(String),

    /// The drag rectangle does not intersect the rendered bitmap
    #[error("Capture region out of bounds")]
    RegionOutOfBounds,

    /// PNG encoding of the cropped region failed
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Clipboard write failed; rendered as transient control feedback
    #[error("Clipboard write failed: {0}")]
    Clipboard(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_passes_through() {
        let e = Error::from(glint_gateway::Error::Unauthenticated);
        assert_eq!(e.to_string(), "User not authenticated");
    }

    #[test]
    fn test_render_error_display() {
        let e = Error::Render("canvas unavailable".into());
        assert_eq!(e.to_string(), "Page render failed: canvas unavailable");
    }
}
