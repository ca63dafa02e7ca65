//! Analysis Session Controller
//!
//! Owns the current image, the selection index and the latest results, and
//! publishes them as whole [`UiState`] snapshots. The presentation layer
//! only ever sees snapshots and sends commands; it never touches a provider.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::capture::frame::Frame;
use crate::shared::{SessionCommand, UiState, CAPTURED_IMAGE_INDEX};
use crate::vision::{
    normalize_faces, normalize_labels, normalize_text, Capability, FaceDetection,
    FaceDetectionResult, Rect, TextRecognitionResult, VisionAdapter,
};

const IMAGE_LOADED: &str = "Image loaded. Select a task.";
const CAMERA_IMAGE_LOADED: &str = "Camera image loaded.";
const ANALYZING_TEXT: &str = "Analyzing text...";
const DETECTING_FACES: &str = "Detecting faces...";
const LABELING_IMAGE: &str = "Running Image Labeling...";

/// How an analysis task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The result was published as a new snapshot
    Published,
    /// The session shut down first; nothing was published
    Cancelled,
}

/// Handle to an analysis running in the background
#[derive(Debug)]
pub struct AnalysisTask {
    capability: Capability,
    handle: JoinHandle<TaskOutcome>,
}

impl AnalysisTask {
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Wait for the analysis to publish or be cancelled
    pub async fn join(self) -> Result<TaskOutcome, JoinError> {
        self.handle.await
    }
}

/// Fields an analysis writes when it finishes
struct AnalysisOutput {
    text_output: String,
    bounding_boxes: Vec<Rect>,
    face_results: Vec<FaceDetectionResult>,
}

/// The single writer of [`UiState`]
pub struct AnalysisSession {
    adapter: Arc<VisionAdapter>,
    state: Arc<watch::Sender<UiState>>,
    shutdown: CancellationToken,
}

impl AnalysisSession {
    /// Create a session with default state around long-lived providers
    pub fn new(adapter: VisionAdapter) -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self {
            adapter: Arc::new(adapter),
            state: Arc::new(state),
            shutdown: CancellationToken::new(),
        }
    }

    /// Observe every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Route a presentation command
    ///
    /// Returns the background task for analysis commands that started one.
    pub fn dispatch(&self, command: SessionCommand) -> Option<AnalysisTask> {
        match command {
            SessionCommand::SelectImage { frame, index } => {
                self.select_image(frame, index);
                None
            }
            SessionCommand::Next => {
                self.request_next();
                None
            }
            SessionCommand::Previous => {
                self.request_previous();
                None
            }
            SessionCommand::Analyze(Capability::TextRecognition) => self.run_text_recognition(),
            SessionCommand::Analyze(Capability::FaceDetection) => self.run_face_detection(),
            SessionCommand::Analyze(Capability::ImageLabeling) => self.run_image_labeling(),
        }
    }

    /// Replace the current image and clear any overlays
    pub fn select_image(&self, frame: Frame, index: i64) {
        let text_output = if index == CAPTURED_IMAGE_INDEX {
            CAMERA_IMAGE_LOADED
        } else {
            IMAGE_LOADED
        };
        info!("Selected {}x{} image at index {}", frame.width(), frame.height(), index);

        self.state.send_modify(|state| {
            *state = UiState {
                current_image: Some(frame),
                image_index: index,
                bounding_boxes: Vec::new(),
                text_output: text_output.to_string(),
                face_results: Vec::new(),
            };
        });
    }

    /// Ask for the next sample. Wrapping is up to the presentation layer.
    pub fn request_next(&self) {
        self.request_step(1);
    }

    /// Ask for the previous sample
    pub fn request_previous(&self) {
        self.request_step(-1);
    }

    /// Move the requested index by `delta` samples in one step
    pub fn request_step(&self, delta: i64) {
        self.state.send_modify(|state| {
            *state = UiState {
                image_index: state.image_index.wrapping_add(delta),
                ..state.clone()
            };
        });
        debug!("Requested image index {}", self.state.borrow().image_index);
    }

    /// Recognize text in the current image. No-op without an image.
    pub fn run_text_recognition(&self) -> Option<AnalysisTask> {
        self.start_analysis(
            Capability::TextRecognition,
            ANALYZING_TEXT,
            |adapter, frame| async move {
                let result = normalize_text(adapter.recognize_text(&frame).await);
                AnalysisOutput {
                    text_output: text_report(&result),
                    bounding_boxes: result.bounding_boxes,
                    face_results: Vec::new(),
                }
            },
        )
    }

    /// Detect faces in the current image. No-op without an image.
    pub fn run_face_detection(&self) -> Option<AnalysisTask> {
        self.start_analysis(
            Capability::FaceDetection,
            DETECTING_FACES,
            |adapter, frame| async move {
                let detection = normalize_faces(adapter.detect_faces(&frame).await);
                let text_output = face_report(&detection);
                let face_results = detection.into_faces();
                AnalysisOutput {
                    text_output,
                    bounding_boxes: face_results.iter().map(|face| face.bounding_box).collect(),
                    face_results,
                }
            },
        )
    }

    /// Label the current image. No-op without an image.
    pub fn run_image_labeling(&self) -> Option<AnalysisTask> {
        self.start_analysis(
            Capability::ImageLabeling,
            LABELING_IMAGE,
            |adapter, frame| async move {
                let labels = normalize_labels(adapter.label_image(&frame).await);
                AnalysisOutput {
                    text_output: label_report(&labels),
                    bounding_boxes: Vec::new(),
                    face_results: Vec::new(),
                }
            },
        )
    }

    /// Cancel every in-flight analysis without publishing its result
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Shutting down analysis session");
            self.shutdown.cancel();
        }
    }

    fn start_analysis<F, Fut>(
        &self,
        capability: Capability,
        working: &str,
        analyze: F,
    ) -> Option<AnalysisTask>
    where
        F: FnOnce(Arc<VisionAdapter>, Frame) -> Fut,
        Fut: Future<Output = AnalysisOutput> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return None;
        }

        // Read the image and publish the interim state in one step
        let mut captured = None;
        self.state.send_if_modified(|state| {
            let Some(frame) = state.current_image.clone() else {
                return false;
            };
            captured = Some(frame);
            *state = UiState {
                bounding_boxes: Vec::new(),
                text_output: working.to_string(),
                face_results: Vec::new(),
                ..state.clone()
            };
            true
        });

        let Some(frame) = captured else {
            debug!("No image selected, ignoring {}", capability.display_name());
            return None;
        };

        info!(
            "Starting {} on a frame acquired {:?} ago",
            capability.display_name(),
            frame.age()
        );
        let analysis = analyze(Arc::clone(&self.adapter), frame);
        let state = Arc::clone(&self.state);
        let cancelled = self.shutdown.child_token();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    debug!("{} cancelled", capability.display_name());
                    TaskOutcome::Cancelled
                }
                output = analysis => {
                    state.send_modify(|snapshot| {
                        *snapshot = UiState {
                            current_image: snapshot.current_image.clone(),
                            image_index: snapshot.image_index,
                            bounding_boxes: output.bounding_boxes,
                            text_output: output.text_output,
                            face_results: output.face_results,
                        };
                    });
                    info!("{} complete", capability.display_name());
                    TaskOutcome::Published
                }
            }
        });

        Some(AnalysisTask { capability, handle })
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn text_report(result: &TextRecognitionResult) -> String {
    format!("{}\nFinished: Text Recognition Complete", result.text)
}

fn face_report(detection: &FaceDetection) -> String {
    let mut output = String::new();
    match detection {
        FaceDetection::Failed(message) => {
            output.push_str(&format!("Error: {}\n", message));
        }
        FaceDetection::Detected(faces) if faces.is_empty() => {
            output.push_str("No faces detected.\n");
        }
        FaceDetection::Detected(faces) => {
            output.push_str(&format!("Detected {} face(s).\n", faces.len()));
            for (i, face) in faces.iter().enumerate() {
                output.push_str(&format!(
                    "Face {} Bounds: ({}, {})\n",
                    i + 1,
                    face.bounding_box.left,
                    face.bounding_box.top
                ));
                output.push_str(&format!(
                    "Face {} Smile: {:.2}% -> {}\n",
                    i + 1,
                    face.smile_probability * 100.0,
                    if face.is_smiling { "Smiling :D" } else { "Not Smiling :(" }
                ));
            }
        }
    }
    output.push_str("Finished: Face Detection Complete");
    output
}

fn label_report(labels: &[String]) -> String {
    let mut output = String::new();
    for label in labels {
        output.push_str(label);
        output.push('\n');
    }
    output.push_str("Finished: Image Labeling Complete");
    output
}
