// ============================================================================
// CropPlanner — deterministic tiling of crop boxes along a guide line
// ============================================================================

use crate::guide::{CropBox, CropRect, GuideLine};

/// Tile `pitch`-sized square boxes along `line`, anchored per the line's
/// anchor policy and clamped to the image bounds.
///
/// Pure function of its inputs: no hidden state, safe to call on every edit,
/// and the whole list is rebuilt from scratch each time. The walk runs from
/// the start point to half a pitch past the line's length, so a box always
/// lands covering the end point even when the length is not a pitch
/// multiple. Box count for a non-degenerate line is
/// `floor((L + pitch/2) / pitch) + 1`.
///
/// Degenerate inputs (length under one pixel, zero pitch) yield an empty
/// list; that is a valid quiescent result, not an error.
pub fn plan(line: &GuideLine, image_w: u32, image_h: u32, owner: usize) -> Vec<CropBox> {
    if line.pitch == 0 {
        return Vec::new();
    }
    let d = line.end - line.start;
    let length = d.length();
    // Non-finite endpoints make the loop bound NaN/inf and the walk would
    // never terminate; treat them like degenerate geometry.
    if !length.is_finite() || length < 1.0 {
        return Vec::new();
    }
    let unit = d / length;
    let pitch = line.pitch as f32;
    let limit = length + pitch / 2.0;

    // Positions are clamped so the box stays inside the image; when the
    // pitch exceeds an image dimension the position clamps to 0 and the
    // size reduction is left to the exporter.
    let max_x = image_w.saturating_sub(line.pitch) as i32;
    let max_y = image_h.saturating_sub(line.pitch) as i32;

    let mut boxes = Vec::new();
    let mut step = 0u32;
    loop {
        let dist = step as f32 * pitch;
        if dist > limit {
            break;
        }
        let anchor = line.start + unit * dist;
        let (tx, ty) = line.anchor.top_left(anchor, pitch);
        boxes.push(CropBox {
            rect: CropRect {
                x: (tx.round() as i32).clamp(0, max_x),
                y: (ty.round() as i32).clamp(0, max_y),
                w: line.pitch,
                h: line.pitch,
            },
            owner,
            hovered: false,
        });
        step += 1;
    }
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide::CropAnchor;
    use egui::pos2;

    fn line(x1: f32, y1: f32, x2: f32, y2: f32, pitch: u32, anchor: CropAnchor) -> GuideLine {
        GuideLine::new(pos2(x1, y1), pos2(x2, y2), pitch, anchor)
    }

    #[test]
    fn horizontal_line_clamps_first_and_last_box() {
        let l = line(0.0, 0.0, 1000.0, 0.0, 500, CropAnchor::Center);
        let boxes = plan(&l, 1200, 1200, 0);
        let xs: Vec<i32> = boxes.iter().map(|b| b.rect.x).collect();
        // dist 0 wants x = -250 (clamped to 0), dist 500 gives 250,
        // dist 1000 wants 750 (clamped to 1200 - 500 = 700).
        assert_eq!(xs, vec![0, 250, 700]);
        assert!(boxes.iter().all(|b| b.rect.y == 0));
    }

    #[test]
    fn box_count_matches_overshoot_formula() {
        for (len, pitch, expected) in [(1000.0, 500, 3), (1500.0, 500, 4), (499.0, 500, 2), (250.0, 500, 2)] {
            let l = line(0.0, 600.0, len, 600.0, pitch, CropAnchor::Center);
            let boxes = plan(&l, 4000, 4000, 0);
            assert_eq!(
                boxes.len(),
                expected,
                "length {} pitch {} should tile {} boxes",
                len,
                pitch,
                expected
            );
            assert_eq!(
                boxes.len(),
                ((len + pitch as f32 / 2.0) / pitch as f32).floor() as usize + 1
            );
        }
    }

    #[test]
    fn plan_is_idempotent() {
        let l = line(123.0, 77.0, 901.5, 640.25, 256, CropAnchor::TopRight);
        let a = plan(&l, 2000, 1500, 3);
        let b = plan(&l, 2000, 1500, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn no_box_escapes_the_image() {
        let cases = [
            line(0.0, 0.0, 1999.0, 1499.0, 512, CropAnchor::Center),
            line(1999.0, 0.0, 0.0, 1499.0, 512, CropAnchor::BottomRight),
            line(10.0, 10.0, 10.0, 1400.0, 300, CropAnchor::TopLeft),
        ];
        for l in cases {
            for b in plan(&l, 2000, 1500, 0) {
                assert!(b.rect.x >= 0 && b.rect.y >= 0);
                assert!(b.rect.x + b.rect.w as i32 <= 2000);
                assert!(b.rect.y + b.rect.h as i32 <= 1500);
            }
        }
    }

    #[test]
    fn degenerate_line_yields_no_boxes() {
        let l = line(500.0, 500.0, 500.0, 500.0, 512, CropAnchor::Center);
        assert!(plan(&l, 2000, 1500, 0).is_empty());
        let l = line(500.0, 500.0, 500.6, 500.0, 512, CropAnchor::Center);
        assert!(plan(&l, 2000, 1500, 0).is_empty());
    }

    #[test]
    fn non_finite_endpoints_yield_no_boxes() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let l = line(bad, 0.0, 100.0, 0.0, 500, CropAnchor::Center);
            assert!(plan(&l, 2000, 1500, 0).is_empty());
            let l = line(0.0, 0.0, 100.0, bad, 500, CropAnchor::Center);
            assert!(plan(&l, 2000, 1500, 0).is_empty());
        }
    }

    #[test]
    fn zero_pitch_yields_no_boxes() {
        let l = line(0.0, 0.0, 800.0, 0.0, 0, CropAnchor::Center);
        assert!(plan(&l, 2000, 1500, 0).is_empty());
    }

    #[test]
    fn oversized_pitch_clamps_position_to_origin() {
        // Pitch larger than the image: positions clamp to 0, the exporter
        // later shrinks width/height.
        let l = line(0.0, 0.0, 100.0, 0.0, 4096, CropAnchor::Center);
        let boxes = plan(&l, 640, 480, 0);
        assert!(!boxes.is_empty());
        for b in boxes {
            assert_eq!((b.rect.x, b.rect.y), (0, 0));
            assert_eq!((b.rect.w, b.rect.h), (4096, 4096));
        }
    }

    #[test]
    fn owner_back_reference_is_recorded() {
        let l = line(0.0, 0.0, 600.0, 0.0, 200, CropAnchor::Center);
        assert!(plan(&l, 1000, 1000, 7).iter().all(|b| b.owner == 7));
    }

    #[test]
    fn top_left_anchor_keeps_the_anchor_as_the_corner() {
        let l = line(100.0, 100.0, 1100.0, 100.0, 500, CropAnchor::TopLeft);
        let boxes = plan(&l, 4000, 4000, 0);
        // Anchors at dist 0, 500, 1000 → x = 100, 600, 1100 (TopLeft keeps
        // the anchor as the corner).
        let xs: Vec<i32> = boxes.iter().map(|b| b.rect.x).collect();
        assert_eq!(xs, vec![100, 600, 1100]);
    }
}
