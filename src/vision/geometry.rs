//! Pixel-space geometry shared by providers, the normalizer and overlays
//!
//! Coordinates use a top-left origin with X growing right and Y growing down.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in integer pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Smallest rectangle enclosing both `self` and `other`
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Union rectangle of every input, or `None` when there are no inputs
    pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects
            .into_iter()
            .copied()
            .reduce(|acc, rect| acc.union(&rect))
    }
}

/// Sub-pixel point as reported by providers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_single_rect_is_itself() {
        let rect = Rect::new(3, 4, 10, 20);
        assert_eq!(Rect::union_all([&rect]), Some(rect));
    }

    #[test]
    fn test_union_takes_extremes() {
        let rects = [
            Rect::new(5, 7, 9, 12),
            Rect::new(-2, 9, 4, 30),
            Rect::new(6, 1, 15, 8),
        ];

        let union = Rect::union_all(&rects).unwrap();

        assert_eq!(union.left, rects.iter().map(|r| r.left).min().unwrap());
        assert_eq!(union.top, rects.iter().map(|r| r.top).min().unwrap());
        assert_eq!(union.right, rects.iter().map(|r| r.right).max().unwrap());
        assert_eq!(union.bottom, rects.iter().map(|r| r.bottom).max().unwrap());
        assert_eq!(union, Rect::new(-2, 1, 15, 30));
    }

    #[test]
    fn test_union_of_nothing() {
        let empty: [Rect; 0] = [];
        assert!(Rect::union_all(&empty).is_none());
    }

    #[test]
    fn test_dimensions() {
        let rect = Rect::new(2, 5, 12, 9);
        assert_eq!(rect.width(), 10);
        assert_eq!(rect.height(), 4);
    }
}
