//! Image acquisition
//!
//! Turns files on disk into [`Frame`]s for the analysis session. Camera
//! capture and bundled sample assets live outside this crate; whatever they
//! produce is decoded the same way.

pub mod frame;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

pub use frame::Frame;

/// Decode an image file into a frame
pub fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load image: {:?}", path))?;
    let frame = Frame::from_image(image);
    debug!("Loaded {:?} ({}x{})", path, frame.width(), frame.height());
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_frame_roundtrips_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pic0.png");
        image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let frame = load_frame(&path).unwrap();

        assert_eq!(frame.dimensions(), (4, 3));
        assert_eq!(frame.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_load_frame_missing_file() {
        assert!(load_frame(Path::new("/nonexistent/pic0.png")).is_err());
    }
}
