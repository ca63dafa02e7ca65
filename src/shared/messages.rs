//! Commands the presentation layer sends into the analysis session

use crate::capture::frame::Frame;
use crate::vision::Capability;

/// Commands accepted by [`crate::app::AnalysisSession::dispatch`]
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Show a new image; `index` is the sample index or the captured sentinel
    SelectImage { frame: Frame, index: i64 },
    /// Request the next sample
    Next,
    /// Request the previous sample
    Previous,
    /// Run one analysis on the current image
    Analyze(Capability),
}
