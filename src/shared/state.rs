//! Observable analysis session state

use crate::capture::frame::Frame;
use crate::vision::{FaceDetectionResult, Rect};

/// Index marking an ad-hoc image that is not part of the sample set
pub const CAPTURED_IMAGE_INDEX: i64 = -1;

/// Prompt shown before any analysis has run
pub const INITIAL_PROMPT: &str = "Press a button to analyze the image.";

/// One immutable snapshot of everything the presentation layer renders
///
/// Snapshots are only ever replaced as a whole, never edited in place.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Image currently under analysis
    pub current_image: Option<Frame>,
    /// Raw selection index; may be negative or out of range
    pub image_index: i64,
    /// Boxes to draw over the image
    pub bounding_boxes: Vec<Rect>,
    /// Status or result text
    pub text_output: String,
    /// Per-face details, including contours to draw
    pub face_results: Vec<FaceDetectionResult>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_image: None,
            image_index: 0,
            bounding_boxes: Vec::new(),
            text_output: INITIAL_PROMPT.to_string(),
            face_results: Vec::new(),
        }
    }
}

impl UiState {
    /// Whether the current image came from outside the sample set
    pub fn is_captured_image(&self) -> bool {
        self.image_index == CAPTURED_IMAGE_INDEX
    }

    /// Whether any overlay needs drawing
    pub fn has_overlays(&self) -> bool {
        !self.bounding_boxes.is_empty() || !self.face_results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let state = UiState::default();

        assert!(state.current_image.is_none());
        assert_eq!(state.image_index, 0);
        assert_eq!(state.text_output, INITIAL_PROMPT);
        assert!(!state.has_overlays());
        assert!(!state.is_captured_image());
    }
}
