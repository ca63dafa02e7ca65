//! Presentation helpers
//!
//! Pure geometry the display layer needs to draw session results over a
//! scaled image and to navigate the sample set. Nothing here renders pixels.

pub mod carousel;
pub mod fit;

pub use carousel::wrap_index;
pub use fit::{FitTransform, OverlayRect};
