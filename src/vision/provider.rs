//! Contracts for the on-device vision capabilities
//!
//! Each capability is a long-lived provider held for the whole session.
//! Providers take a frame and a [`Listener`], and notify it whenever their
//! underlying engine finishes, from whichever thread that happens on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::geometry::{PointF, Rect};
use super::pending::{Listener, Registration};
use crate::capture::frame::Frame;

/// The three analysis kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TextRecognition,
    FaceDetection,
    ImageLabeling,
}

impl Capability {
    pub fn display_name(&self) -> &'static str {
        match self {
            Capability::TextRecognition => "Text Recognition",
            Capability::FaceDetection => "Face Detection",
            Capability::ImageLabeling => "Image Labeling",
        }
    }
}

/// Text recognition engine
pub trait TextRecognizer: Send + Sync {
    fn process(&self, image: &Frame, listener: Listener<RawText>) -> Registration;
}

/// Face detection engine
pub trait FaceDetector: Send + Sync {
    fn process(&self, image: &Frame, listener: Listener<Vec<RawFace>>) -> Registration;
}

/// Image labeling engine
pub trait ImageLabeler: Send + Sync {
    fn process(&self, image: &Frame, listener: Listener<Vec<RawLabel>>) -> Registration;
}

/// Recognized text as reported by the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawText {
    /// Full recognized text, already concatenated by the engine
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blocks: Vec<RawTextBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTextBlock {
    #[serde(default)]
    pub lines: Vec<RawTextLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTextLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bounding_box: Option<Rect>,
}

/// Facial contour kinds the face engine can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourKind {
    Face,
    LeftEyebrowTop,
    LeftEyebrowBottom,
    RightEyebrowTop,
    RightEyebrowBottom,
    LeftEye,
    RightEye,
    UpperLipTop,
    UpperLipBottom,
    LowerLipTop,
    LowerLipBottom,
    NoseBridge,
    NoseBottom,
    LeftCheek,
    RightCheek,
}

/// One detected face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFace {
    pub bounding_box: Rect,
    /// Absent when classification is disabled or inconclusive
    #[serde(default)]
    pub smiling_probability: Option<f32>,
    #[serde(default)]
    pub contours: BTreeMap<ContourKind, Vec<PointF>>,
}

impl RawFace {
    /// Points of one contour kind, if the engine produced it
    pub fn contour(&self, kind: ContourKind) -> Option<&[PointF]> {
        self.contours.get(&kind).map(Vec::as_slice)
    }
}

/// One image label with confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    pub text: String,
    pub confidence: f32,
}

impl RawLabel {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}
