//! Uniform "submit image, await result" front for the three providers

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use super::error::ProviderError;
use super::pending::{self, Listener, Pending, Registration};
use super::provider::{
    Capability, FaceDetector, ImageLabeler, RawFace, RawLabel, RawText, TextRecognizer,
};
use crate::capture::frame::Frame;
use crate::config::VisionSettings;

/// Owns one provider per capability for the lifetime of a session
#[derive(Clone)]
pub struct VisionAdapter {
    text: Arc<dyn TextRecognizer>,
    faces: Arc<dyn FaceDetector>,
    labels: Arc<dyn ImageLabeler>,
    timeout: Option<Duration>,
}

impl VisionAdapter {
    /// Create an adapter without a timeout
    pub fn new(
        text: Arc<dyn TextRecognizer>,
        faces: Arc<dyn FaceDetector>,
        labels: Arc<dyn ImageLabeler>,
    ) -> Self {
        Self {
            text,
            faces,
            labels,
            timeout: None,
        }
    }

    /// Apply the timeout from configuration
    pub fn with_settings(self, settings: &VisionSettings) -> Self {
        self.with_timeout(settings.timeout())
    }

    /// Give up on a provider call after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run text recognition on `image`
    pub async fn recognize_text(&self, image: &Frame) -> Result<RawText, ProviderError> {
        let provider = Arc::clone(&self.text);
        self.submit(Capability::TextRecognition, move |listener| {
            provider.process(image, listener)
        })
        .await
    }

    /// Run face detection on `image`
    pub async fn detect_faces(&self, image: &Frame) -> Result<Vec<RawFace>, ProviderError> {
        let provider = Arc::clone(&self.faces);
        self.submit(Capability::FaceDetection, move |listener| {
            provider.process(image, listener)
        })
        .await
    }

    /// Run image labeling on `image`
    pub async fn label_image(&self, image: &Frame) -> Result<Vec<RawLabel>, ProviderError> {
        let provider = Arc::clone(&self.labels);
        self.submit(Capability::ImageLabeling, move |listener| {
            provider.process(image, listener)
        })
        .await
    }

    async fn submit<T, F>(&self, capability: Capability, start: F) -> Result<T, ProviderError>
    where
        F: FnOnce(Listener<T>) -> Registration,
    {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "vision_request",
            %request_id,
            capability = capability.display_name()
        );

        let pending = span.in_scope(|| start_request(capability, start));
        self.settle(pending).instrument(span).await
    }

    async fn settle<T>(&self, pending: Pending<T>) -> Result<T, ProviderError> {
        let outcome = match self.timeout {
            // Timing out drops the pending cell, which releases the registration
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or(Err(ProviderError::Timeout(limit))),
            None => pending.await,
        };

        match &outcome {
            Ok(_) => debug!("Provider resolved"),
            Err(e) => warn!("Provider failed: {}", e),
        }
        outcome
    }
}

/// Hand a fresh listener to the provider, containing any panic it raises
fn start_request<T, F>(capability: Capability, start: F) -> Pending<T>
where
    F: FnOnce(Listener<T>) -> Registration,
{
    let (listener, mut pending) = pending::channel();
    match catch_unwind(AssertUnwindSafe(|| start(listener))) {
        Ok(registration) => pending.hold(registration),
        // The listener was dropped while unwinding, so the cell already
        // carries ProviderError::Dropped
        Err(_) => error!(
            "{} provider panicked while accepting a request",
            capability.display_name()
        ),
    }
    pending
}
