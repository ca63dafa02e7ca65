//! Provider backend replaying detections from a JSON script
//!
//! Stands in for the on-device engine when driving the session headlessly.
//! Answers are delivered from a spawned tokio task, like an engine callback
//! firing on its own thread, so providers must be used inside a runtime.
//!
//! ```json
//! {
//!   "delay_ms": 25,
//!   "text": { "ok": { "text": "Hi", "blocks": [] } },
//!   "faces": { "err": "model missing" },
//!   "labels": "hang"
//! }
//! ```

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::adapter::VisionAdapter;
use super::pending::{Listener, Registration};
use super::provider::{FaceDetector, ImageLabeler, RawFace, RawLabel, RawText, TextRecognizer};
use crate::capture::frame::Frame;
use crate::config::{FaceDetectionSettings, LabelingSettings};

/// What a scripted provider answers with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedOutcome<T> {
    Ok(T),
    Err(String),
    /// Never answer
    Hang,
}

impl<T: Default> Default for ScriptedOutcome<T> {
    fn default() -> Self {
        ScriptedOutcome::Ok(T::default())
    }
}

/// Full script covering all three capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderScript {
    /// Delay before each answer is delivered
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub text: ScriptedOutcome<RawText>,
    #[serde(default)]
    pub faces: ScriptedOutcome<Vec<RawFace>>,
    #[serde(default)]
    pub labels: ScriptedOutcome<Vec<RawLabel>>,
}

impl ProviderScript {
    /// Load a script from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read provider script: {:?}", path))?;
        let script = serde_json::from_str(&content)
            .with_context(|| format!("Invalid provider script: {:?}", path))?;
        info!("Loaded provider script from {:?}", path);
        Ok(script)
    }
}

/// Scripted engine implementing every provider trait
pub struct ScriptedProvider {
    script: ProviderScript,
    face_settings: FaceDetectionSettings,
    labeling_settings: LabelingSettings,
    /// Listeners of unreleased requests answered with `Hang`
    parked: Arc<Mutex<HashMap<Uuid, Box<dyn Any + Send>>>>,
}

impl ScriptedProvider {
    pub fn new(script: ProviderScript) -> Self {
        Self {
            script,
            face_settings: FaceDetectionSettings::default(),
            labeling_settings: LabelingSettings::default(),
            parked: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Apply engine options the way the on-device library would
    pub fn with_settings(
        mut self,
        faces: FaceDetectionSettings,
        labeling: LabelingSettings,
    ) -> Self {
        self.face_settings = faces;
        self.labeling_settings = labeling;
        self
    }

    /// Number of requests held unanswered and not yet released
    pub fn parked_requests(&self) -> usize {
        self.parked.lock().len()
    }

    fn deliver<T>(&self, outcome: ScriptedOutcome<T>, listener: Listener<T>) -> Registration
    where
        T: Send + 'static,
    {
        let value = match outcome {
            ScriptedOutcome::Ok(value) => Ok(value),
            ScriptedOutcome::Err(message) => Err(message),
            ScriptedOutcome::Hang => {
                let key = Uuid::new_v4();
                debug!("Scripted provider parking request {}", key);
                self.parked.lock().insert(key, Box::new(listener));

                let parked = Arc::clone(&self.parked);
                return Registration::new(move || {
                    parked.lock().remove(&key);
                });
            }
        };

        let delay = Duration::from_millis(self.script.delay_ms);
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!("Scripted delivery cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    match value {
                        Ok(value) => listener.on_success(value),
                        Err(message) => listener.on_failure(message),
                    };
                }
            }
        });

        Registration::new(move || token.cancel())
    }

    fn apply_face_settings(&self, mut faces: Vec<RawFace>) -> Vec<RawFace> {
        for face in &mut faces {
            if !self.face_settings.contours {
                face.contours.clear();
            }
            if !self.face_settings.classification {
                face.smiling_probability = None;
            }
        }
        faces
    }

    fn apply_labeling_settings(&self, labels: Vec<RawLabel>) -> Vec<RawLabel> {
        let threshold = self.labeling_settings.confidence_threshold;
        labels
            .into_iter()
            .filter(|label| label.confidence >= threshold)
            .collect()
    }
}

impl TextRecognizer for ScriptedProvider {
    fn process(&self, image: &Frame, listener: Listener<RawText>) -> Registration {
        debug!("Scripted text recognition on {}x{}", image.width(), image.height());
        self.deliver(self.script.text.clone(), listener)
    }
}

impl FaceDetector for ScriptedProvider {
    fn process(&self, image: &Frame, listener: Listener<Vec<RawFace>>) -> Registration {
        debug!("Scripted face detection on {}x{}", image.width(), image.height());
        let outcome = match self.script.faces.clone() {
            ScriptedOutcome::Ok(faces) => ScriptedOutcome::Ok(self.apply_face_settings(faces)),
            other => other,
        };
        self.deliver(outcome, listener)
    }
}

impl ImageLabeler for ScriptedProvider {
    fn process(&self, image: &Frame, listener: Listener<Vec<RawLabel>>) -> Registration {
        debug!("Scripted image labeling on {}x{}", image.width(), image.height());
        let outcome = match self.script.labels.clone() {
            ScriptedOutcome::Ok(labels) => {
                ScriptedOutcome::Ok(self.apply_labeling_settings(labels))
            }
            other => other,
        };
        self.deliver(outcome, listener)
    }
}

/// Build an adapter whose three capabilities share one scripted provider
pub fn scripted_adapter(provider: ScriptedProvider) -> VisionAdapter {
    let provider = Arc::new(provider);
    VisionAdapter::new(provider.clone(), provider.clone(), provider)
}
