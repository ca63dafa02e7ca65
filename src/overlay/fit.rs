//! Mapping image-space results onto a scaled, centered display area

use serde::Serialize;

use crate::vision::Rect;

/// Rectangle in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Uniform "fit inside" scaling plus centering offsets
///
/// The image is scaled by the smaller of the two axis ratios so it fits the
/// canvas without distortion, then centered along the other axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitTransform {
    /// Transform for an image of `image_size` shown in `canvas_size`
    ///
    /// Returns `None` for an empty image.
    pub fn fit(image_size: (u32, u32), canvas_size: (f32, f32)) -> Option<Self> {
        let (image_w, image_h) = (image_size.0 as f32, image_size.1 as f32);
        if image_w <= 0.0 || image_h <= 0.0 {
            return None;
        }

        let scale = (canvas_size.0 / image_w).min(canvas_size.1 / image_h);
        Some(Self {
            scale,
            offset_x: (canvas_size.0 - image_w * scale) / 2.0,
            offset_y: (canvas_size.1 - image_h * scale) / 2.0,
        })
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn map_rect(&self, rect: &Rect) -> OverlayRect {
        let (x, y) = self.map_point(rect.left as f32, rect.top as f32);
        OverlayRect {
            x,
            y,
            width: rect.width() as f32 * self.scale,
            height: rect.height() as f32 * self.scale,
        }
    }

    /// Closed polyline for a flattened `x0, y0, x1, y1, ...` contour
    ///
    /// The first point is repeated at the end. Contours with fewer than two
    /// coordinates are skipped; a trailing odd coordinate is ignored.
    pub fn contour_path(&self, flat: &[i32]) -> Option<Vec<(f32, f32)>> {
        if flat.len() < 2 {
            return None;
        }

        let mut path: Vec<(f32, f32)> = flat
            .chunks_exact(2)
            .map(|xy| self.map_point(xy[0] as f32, xy[1] as f32))
            .collect();
        path.push(path[0]);
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_image_is_letterboxed() {
        let fit = FitTransform::fit((200, 100), (100.0, 100.0)).unwrap();

        assert!((fit.scale - 0.5).abs() < 0.001);
        assert!(fit.offset_x.abs() < 0.001);
        assert!((fit.offset_y - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_fit_tall_image_is_pillarboxed() {
        let fit = FitTransform::fit((100, 400), (200.0, 200.0)).unwrap();

        assert!((fit.scale - 0.5).abs() < 0.001);
        assert!((fit.offset_x - 75.0).abs() < 0.001);
        assert!(fit.offset_y.abs() < 0.001);
    }

    #[test]
    fn test_fit_empty_image() {
        assert!(FitTransform::fit((0, 10), (100.0, 100.0)).is_none());
    }

    #[test]
    fn test_map_rect() {
        let fit = FitTransform::fit((200, 100), (100.0, 100.0)).unwrap();

        let rect = fit.map_rect(&Rect::new(20, 40, 120, 80));

        assert!((rect.x - 10.0).abs() < 0.001);
        assert!((rect.y - 45.0).abs() < 0.001);
        assert!((rect.width - 50.0).abs() < 0.001);
        assert!((rect.height - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_contour_path_is_closed() {
        let fit = FitTransform::fit((100, 100), (200.0, 200.0)).unwrap();

        let path = fit.contour_path(&[0, 0, 10, 0, 10, 10]).unwrap();

        assert_eq!(path.len(), 4);
        assert_eq!(path[0], (0.0, 0.0));
        assert_eq!(path[2], (20.0, 20.0));
        assert_eq!(path[3], path[0]);
    }

    #[test]
    fn test_contour_path_skips_degenerate() {
        let fit = FitTransform::fit((10, 10), (10.0, 10.0)).unwrap();
        assert!(fit.contour_path(&[]).is_none());
        assert!(fit.contour_path(&[5]).is_none());
        assert_eq!(fit.contour_path(&[1, 2, 3]).unwrap().len(), 2);
    }
}
