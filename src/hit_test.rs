//! Map a click on the displayed canvas to the label under it.
//!
//! The canvas may be drawn at a different size than the source image, so the
//! click is scaled by `image / display` per axis and floored to a pixel.

use crate::segmentation::SegmentationResult;

/// Convert a display-space click into an image pixel.
///
/// Clicks outside the display rectangle are clamped to its edge, and the
/// resulting pixel is clamped into the image. Returns `None` for zero-sized
/// displays or images.
pub fn image_point(
    click_x: f32,
    click_y: f32,
    display_width: f32,
    display_height: f32,
    image_width: u32,
    image_height: u32,
) -> Option<(u32, u32)> {
    if !(display_width > 0.0 && display_height > 0.0) || image_width == 0 || image_height == 0 {
        return None;
    }

    let click_x = if click_x.is_finite() { click_x.clamp(0.0, display_width) } else { 0.0 };
    let click_y = if click_y.is_finite() { click_y.clamp(0.0, display_height) } else { 0.0 };

    let scale_x = image_width as f32 / display_width;
    let scale_y = image_height as f32 / display_height;

    // A click on the far edge lands one past the last pixel.
    let x = ((click_x * scale_x).floor() as u32).min(image_width - 1);
    let y = ((click_y * scale_y).floor() as u32).min(image_height - 1);
    Some((x, y))
}

/// Resolve a click to the label of the first mask containing it.
pub fn resolve(
    result: &SegmentationResult,
    click_x: f32,
    click_y: f32,
    display_width: f32,
    display_height: f32,
    image_width: u32,
    image_height: u32,
) -> Option<&str> {
    let (x, y) = image_point(
        click_x,
        click_y,
        display_width,
        display_height,
        image_width,
        image_height,
    )?;
    let index = y as usize * image_width as usize + x as usize;

    result
        .masks()
        .iter()
        .find(|mask| mask.is_member(index))
        .map(|mask| mask.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::RawSegment;

    fn rect_mask(label: &str, w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RawSegment {
        let membership = (0..h)
            .flat_map(|y| (0..w).map(move |x| u8::from(x >= x0 && x < x1 && y >= y0 && y < y1)))
            .collect();
        RawSegment {
            label: label.to_string(),
            width: w,
            height: h,
            membership,
        }
    }

    #[test]
    fn test_image_point_mapping() {
        assert_eq!(image_point(100.0, 300.0, 256.0, 256.0, 512, 512), Some((200, 511)));
        assert_eq!(image_point(10.0, 10.0, 100.0, 50.0, 1000, 100), Some((100, 20)));
        assert_eq!(image_point(99.9, 0.0, 100.0, 100.0, 10, 10), Some((9, 0)));
    }

    #[test]
    fn test_image_point_floors_for_every_click() {
        for cx in 0..64 {
            for cy in 0..40 {
                let (x, y) = image_point(cx as f32, cy as f32, 64.0, 40.0, 200, 100).unwrap();
                assert_eq!(x, (cx as f32 * 200.0 / 64.0).floor() as u32);
                assert_eq!(y, (cy as f32 * 100.0 / 40.0).floor() as u32);
            }
        }
    }

    #[test]
    fn test_clicks_outside_display_are_clamped() {
        assert_eq!(image_point(-20.0, 5.0, 100.0, 100.0, 10, 10), Some((0, 0)));
        assert_eq!(image_point(500.0, 500.0, 100.0, 100.0, 10, 10), Some((9, 9)));
        assert_eq!(image_point(f32::NAN, 50.0, 100.0, 100.0, 10, 10), Some((0, 5)));
    }

    #[test]
    fn test_zero_sizes_resolve_to_none() {
        assert_eq!(image_point(1.0, 1.0, 0.0, 10.0, 10, 10), None);
        assert_eq!(image_point(1.0, 1.0, 10.0, 10.0, 0, 10), None);

        let result = SegmentationResult::default();
        assert_eq!(resolve(&result, 1.0, 1.0, 10.0, 10.0, 10, 10), None);
    }

    #[test]
    fn test_first_match_wins() {
        let segments = vec![
            rect_mask("rug", 4, 4, 1, 1, 3, 3),
            rect_mask("floor", 4, 4, 0, 0, 4, 4),
        ];
        let result = SegmentationResult::from_segments(segments, 4, 4).unwrap();

        assert_eq!(resolve(&result, 1.5, 1.5, 4.0, 4.0, 4, 4), Some("rug"));
        assert_eq!(resolve(&result, 0.5, 3.5, 4.0, 4.0, 4, 4), Some("floor"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let segments = vec![rect_mask("wall", 8, 8, 0, 0, 4, 8)];
        let result = SegmentationResult::from_segments(segments, 8, 8).unwrap();
        let first = resolve(&result, 3.0, 7.0, 16.0, 16.0, 8, 8);
        for _ in 0..10 {
            assert_eq!(resolve(&result, 3.0, 7.0, 16.0, 16.0, 8, 8), first);
        }
        assert_eq!(first, Some("wall"));
    }

    #[test]
    fn test_miss_returns_none() {
        let segments = vec![rect_mask("sofa", 4, 4, 0, 0, 1, 1)];
        let result = SegmentationResult::from_segments(segments, 4, 4).unwrap();
        assert_eq!(resolve(&result, 3.0, 3.0, 4.0, 4.0, 4, 4), None);
    }
}
