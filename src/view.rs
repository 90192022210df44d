/* ─────────────────── single-image display rects ─────────────────── */

/// Destination rectangle for the single-image view, window coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Letterbox a `img_w × img_h` image into the window: a relatively taller
/// image fits the window height and centers horizontally, otherwise it fits
/// the width and centers vertically.
pub fn letterbox(img_w: u32, img_h: u32, win_w: f32, win_h: f32) -> ViewRect {
    let image_ar = img_w.max(1) as f32 / img_h.max(1) as f32;
    let window_ar = win_w / win_h;
    if image_ar < window_ar {
        let w = (win_h * image_ar).round();
        ViewRect { x: ((win_w - w) / 2.0).round(), y: 0.0, w, h: win_h }
    } else {
        let h = (win_w / image_ar).round();
        ViewRect { x: 0.0, y: ((win_h - h) / 2.0).round(), w: win_w, h }
    }
}

#[inline]
fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Fraction of `rect` under the pointer, clamped to `[0, 1]` per axis.
pub fn anchor_fraction(rect: &ViewRect, px: f32, py: f32) -> (f32, f32) {
    (clamp01((px - rect.x) / rect.w), clamp01((py - rect.y) / rect.h))
}

/// Pan-to-point zoom: place the image at natural size, offset so that the
/// point of the letterboxed rect under the pointer stays under the pointer.
pub fn zoom_rect(
    letterboxed: &ViewRect,
    nat_w: u32,
    nat_h: u32,
    win_w: f32,
    win_h: f32,
    px: f32,
    py: f32,
) -> ViewRect {
    let (fx, fy) = anchor_fraction(letterboxed, px, py);
    ViewRect {
        x: (-fx * (nat_w as f32 - win_w)).round(),
        y: (-fy * (nat_h as f32 - win_h)).round(),
        w: nat_w as f32,
        h: nat_h as f32,
    }
}

/* ───────────────────────────── tests ────────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_wide_image() {
        // 1920x1080 (AR 1.78) in 800x600 (AR 1.33): fit width, center
        // vertically.
        let rect = letterbox(1920, 1080, 800.0, 600.0);
        assert_eq!(rect, ViewRect { x: 0.0, y: 75.0, w: 800.0, h: 450.0 });
    }

    #[test]
    fn letterbox_tall_image() {
        let rect = letterbox(600, 1200, 800.0, 600.0);
        assert_eq!(rect, ViewRect { x: 250.0, y: 0.0, w: 300.0, h: 600.0 });
    }

    #[test]
    fn letterbox_placeholder_is_square() {
        // The 1x1 placeholder used before anything decodes.
        let rect = letterbox(1, 1, 800.0, 600.0);
        assert_eq!(rect, ViewRect { x: 100.0, y: 0.0, w: 600.0, h: 600.0 });
    }

    #[test]
    fn anchor_fraction_clamps() {
        let rect = ViewRect { x: 100.0, y: 50.0, w: 200.0, h: 100.0 };
        assert_eq!(anchor_fraction(&rect, 200.0, 100.0), (0.5, 0.5));
        assert_eq!(anchor_fraction(&rect, -500.0, 1000.0), (0.0, 1.0));
    }

    #[test]
    fn zoom_anchors_under_pointer() {
        // 3200x2400 image letterboxed into 800x600; zoom at the center
        // pans to the image center.
        let boxed = letterbox(3200, 2400, 800.0, 600.0);
        let rect = zoom_rect(&boxed, 3200, 2400, 800.0, 600.0, 400.0, 300.0);
        assert_eq!(rect, ViewRect { x: -1200.0, y: -900.0, w: 3200.0, h: 2400.0 });

        // Zoom at the top-left corner keeps the origin pinned.
        let rect = zoom_rect(&boxed, 3200, 2400, 800.0, 600.0, 0.0, 0.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn zoom_from_outside_the_rect_is_clamped() {
        let boxed = letterbox(1000, 2000, 800.0, 600.0);
        let rect = zoom_rect(&boxed, 1000, 2000, 800.0, 600.0, 10_000.0, 10_000.0);
        // Anchor clamps to (1,1): bottom-right of the image at bottom-right
        // of the window.
        assert_eq!(rect.x, -(1000.0 - 800.0));
        assert_eq!(rect.y, -(2000.0 - 600.0));
    }
}
