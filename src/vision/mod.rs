//! Vision Layer
//!
//! Glue between the analysis session and the on-device vision engines.
//! The engines themselves are opaque providers:
//! - a text recognizer
//! - a face detector (smile classification and contours)
//! - an image labeler
//!
//! [`VisionAdapter`] turns their callbacks into awaitable calls and the
//! normalizer turns their raw output into display-ready results.

pub mod adapter;
pub mod error;
pub mod geometry;
pub mod normalize;
pub mod pending;
pub mod provider;
pub mod scripted;

pub use adapter::VisionAdapter;
pub use error::ProviderError;
pub use geometry::{PointF, Rect};
pub use normalize::{
    normalize_faces, normalize_labels, normalize_text, FaceDetection, FaceDetectionResult,
    TextRecognitionResult, NO_TEXT_DETECTED,
};
pub use pending::{Listener, Pending, Registration};
pub use provider::{
    Capability, ContourKind, FaceDetector, ImageLabeler, RawFace, RawLabel, RawText,
    RawTextBlock, RawTextLine, TextRecognizer,
};
pub use scripted::{scripted_adapter, ProviderScript, ScriptedOutcome, ScriptedProvider};
