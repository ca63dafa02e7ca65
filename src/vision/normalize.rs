//! Turns raw provider output into the three result shapes the session shows

use serde::Serialize;

use super::error::ProviderError;
use super::geometry::{PointF, Rect};
use super::provider::{ContourKind, RawFace, RawLabel, RawText};

/// Text reported when no line carried a bounding box
pub const NO_TEXT_DETECTED: &str = "No text detected.";

/// Smiling probability at or above which a face counts as smiling
pub const SMILE_THRESHOLD: f32 = 0.5;

/// Contour kinds reported per face, in display order
pub const FACE_CONTOURS: [ContourKind; 11] = [
    ContourKind::Face,
    ContourKind::LeftEyebrowTop,
    ContourKind::LeftEyebrowBottom,
    ContourKind::RightEyebrowTop,
    ContourKind::RightEyebrowBottom,
    ContourKind::LeftEye,
    ContourKind::RightEye,
    ContourKind::UpperLipTop,
    ContourKind::UpperLipBottom,
    ContourKind::LowerLipTop,
    ContourKind::LowerLipBottom,
];

/// Recognized text plus at most one enclosing box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRecognitionResult {
    pub text: String,
    pub bounding_boxes: Vec<Rect>,
}

/// One detected face ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceDetectionResult {
    pub bounding_box: Rect,
    pub is_smiling: bool,
    pub smile_probability: f32,
    /// Flattened `x0, y0, x1, y1, ...` point lists, one per reported contour
    pub contours: Vec<Vec<i32>>,
}

/// Outcome of a face detection run
#[derive(Debug, Clone, PartialEq)]
pub enum FaceDetection {
    Detected(Vec<FaceDetectionResult>),
    /// The provider failed; no faces are shown
    Failed(String),
}

impl FaceDetection {
    /// Faces to draw. Empty for a failed run.
    pub fn faces(&self) -> &[FaceDetectionResult] {
        match self {
            FaceDetection::Detected(faces) => faces,
            FaceDetection::Failed(_) => &[],
        }
    }

    pub fn into_faces(self) -> Vec<FaceDetectionResult> {
        match self {
            FaceDetection::Detected(faces) => faces,
            FaceDetection::Failed(_) => Vec::new(),
        }
    }
}

pub fn normalize_text(outcome: Result<RawText, ProviderError>) -> TextRecognitionResult {
    let raw = match outcome {
        Ok(raw) => raw,
        Err(e) => {
            return TextRecognitionResult {
                text: format!("Error: {}", e),
                bounding_boxes: Vec::new(),
            }
        }
    };

    let line_boxes = raw
        .blocks
        .iter()
        .flat_map(|block| block.lines.iter())
        .filter_map(|line| line.bounding_box.as_ref());

    match Rect::union_all(line_boxes) {
        Some(union) => TextRecognitionResult {
            text: raw.text,
            bounding_boxes: vec![union],
        },
        None => TextRecognitionResult {
            text: NO_TEXT_DETECTED.to_string(),
            bounding_boxes: Vec::new(),
        },
    }
}

pub fn normalize_faces(outcome: Result<Vec<RawFace>, ProviderError>) -> FaceDetection {
    match outcome {
        Ok(faces) => FaceDetection::Detected(faces.iter().map(normalize_face).collect()),
        Err(e) => FaceDetection::Failed(e.to_string()),
    }
}

pub fn normalize_face(face: &RawFace) -> FaceDetectionResult {
    let smile_probability = face.smiling_probability.unwrap_or(0.0);

    let contours = FACE_CONTOURS
        .iter()
        .filter_map(|kind| face.contour(*kind))
        .filter(|points| !points.is_empty())
        .map(flatten_points)
        .collect();

    FaceDetectionResult {
        bounding_box: face.bounding_box,
        is_smiling: smile_probability >= SMILE_THRESHOLD,
        smile_probability,
        contours,
    }
}

/// Flatten points into `x0, y0, x1, y1, ...`, truncating toward zero
fn flatten_points(points: &[PointF]) -> Vec<i32> {
    points
        .iter()
        .flat_map(|p| [p.x as i32, p.y as i32])
        .collect()
}

pub fn normalize_labels(outcome: Result<Vec<RawLabel>, ProviderError>) -> Vec<String> {
    match outcome {
        Ok(labels) => labels.iter().map(format_label).collect(),
        Err(e) => vec![format!("Error: {}", e)],
    }
}

/// `"<name> (<percent>%)"` with two decimals
pub fn format_label(label: &RawLabel) -> String {
    format!("{} ({:.2}%)", label.text, label.confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::provider::{RawTextBlock, RawTextLine};
    use std::collections::BTreeMap;

    fn line(bounding_box: Option<Rect>) -> RawTextLine {
        RawTextLine {
            text: "line".to_string(),
            bounding_box,
        }
    }

    fn points(n: usize) -> Vec<PointF> {
        (0..n).map(|i| PointF::new(i as f32 + 0.7, i as f32 * 2.0)).collect()
    }

    #[test]
    fn test_text_union_across_blocks() {
        let raw = RawText {
            text: "Hello\nWorld\nAgain".to_string(),
            blocks: vec![
                RawTextBlock {
                    lines: vec![
                        line(Some(Rect::new(0, 0, 10, 5))),
                        line(Some(Rect::new(2, 5, 12, 9))),
                    ],
                },
                RawTextBlock {
                    lines: vec![line(Some(Rect::new(0, 9, 8, 12)))],
                },
            ],
        };

        let result = normalize_text(Ok(raw));

        assert_eq!(result.text, "Hello\nWorld\nAgain");
        assert_eq!(result.bounding_boxes, vec![Rect::new(0, 0, 12, 12)]);
    }

    #[test]
    fn test_text_single_line_box_is_kept() {
        let raw = RawText {
            text: "Solo".to_string(),
            blocks: vec![RawTextBlock {
                lines: vec![line(Some(Rect::new(4, 4, 9, 7)))],
            }],
        };

        assert_eq!(normalize_text(Ok(raw)).bounding_boxes, vec![Rect::new(4, 4, 9, 7)]);
    }

    #[test]
    fn test_text_without_boxes_is_sentinel() {
        let raw = RawText {
            text: "ghost".to_string(),
            blocks: vec![RawTextBlock {
                lines: vec![line(None)],
            }],
        };

        let result = normalize_text(Ok(raw));

        assert_eq!(result.text, NO_TEXT_DETECTED);
        assert!(result.bounding_boxes.is_empty());
        assert_eq!(normalize_text(Ok(RawText::default())).text, NO_TEXT_DETECTED);
    }

    #[test]
    fn test_text_failure_embeds_message() {
        let result = normalize_text(Err(ProviderError::failed("model unavailable")));

        assert_eq!(result.text, "Error: model unavailable");
        assert!(result.bounding_boxes.is_empty());
    }

    #[test]
    fn test_smile_threshold() {
        let mut face = RawFace::default();
        let cases = [
            (Some(0.49), false),
            (Some(0.5), true),
            (Some(0.93), true),
            (None, false),
        ];
        for (probability, smiling) in cases {
            face.smiling_probability = probability;
            let result = normalize_face(&face);
            assert_eq!(result.is_smiling, smiling, "probability {:?}", probability);
            assert_eq!(result.is_smiling, result.smile_probability >= 0.5);
        }
        face.smiling_probability = None;
        assert_eq!(normalize_face(&face).smile_probability, 0.0);
    }

    #[test]
    fn test_contours_follow_fixed_order_and_skip_empty() {
        let mut contours = BTreeMap::new();
        contours.insert(ContourKind::LowerLipBottom, points(2));
        contours.insert(ContourKind::LeftEye, points(3));
        contours.insert(ContourKind::RightEye, Vec::new());
        contours.insert(ContourKind::Face, points(4));
        contours.insert(ContourKind::NoseBridge, points(2));
        let face = RawFace {
            bounding_box: Rect::new(0, 0, 50, 50),
            smiling_probability: Some(0.1),
            contours,
        };

        let result = normalize_face(&face);

        let lengths: Vec<usize> = result.contours.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![8, 6, 4]);
        assert!(result.contours.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_points_are_truncated() {
        let flat = flatten_points(&[PointF::new(1.9, 2.2), PointF::new(-0.5, 10.99)]);
        assert_eq!(flat, vec![1, 2, 0, 10]);
    }

    #[test]
    fn test_face_outline_then_left_eye() {
        let mut contours = BTreeMap::new();
        contours.insert(ContourKind::LeftEye, vec![PointF::new(30.0, 31.0)]);
        contours.insert(ContourKind::Face, vec![PointF::new(1.0, 2.0), PointF::new(3.0, 4.0)]);
        let face = RawFace {
            bounding_box: Rect::new(10, 20, 110, 140),
            smiling_probability: Some(0.82),
            contours,
        };

        let detection = normalize_faces(Ok(vec![face]));
        let result = &detection.faces()[0];

        assert!(result.is_smiling);
        assert_eq!(result.contours, vec![vec![1, 2, 3, 4], vec![30, 31]]);
    }

    #[test]
    fn test_face_failure_has_no_faces() {
        let detection = normalize_faces(Err(ProviderError::failed("no model")));

        assert_eq!(detection, FaceDetection::Failed("no model".to_string()));
        assert!(detection.faces().is_empty());
        assert!(detection.into_faces().is_empty());
    }

    #[test]
    fn test_labels_keep_order() {
        let labels = normalize_labels(Ok(vec![
            RawLabel::new("cat", 0.93),
            RawLabel::new("animal", 0.77),
        ]));
        assert_eq!(labels, vec!["cat (93.00%)", "animal (77.00%)"]);
    }

    #[test]
    fn test_label_failure_is_single_diagnostic() {
        let labels = normalize_labels(Err(ProviderError::Dropped));
        assert_eq!(labels.len(), 1);
        assert!(labels[0].starts_with("Error: "));
    }
}
