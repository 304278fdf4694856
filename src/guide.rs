// ============================================================================
// Data model — guide lines, crop boxes, and the interaction enums
// ============================================================================

use egui::Pos2;

/// Which point on the guide line a crop box is anchored to.
///
/// The anchor maps a point on the line to the top-left corner of its box;
/// the variant set is closed, so this is a plain enum with one pure
/// transform per variant (see [`CropAnchor::top_left`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropAnchor {
    /// Box centered on the line point (the original tool's behavior).
    #[default]
    Center,
    /// Line point is the box's top-left corner.
    TopLeft,
    /// Line point is the box's top-right corner.
    TopRight,
    /// Line point is the box's bottom-left corner.
    BottomLeft,
    /// Line point is the box's bottom-right corner.
    BottomRight,
}

impl CropAnchor {
    pub const ALL: [CropAnchor; 5] = [
        CropAnchor::Center,
        CropAnchor::TopLeft,
        CropAnchor::TopRight,
        CropAnchor::BottomLeft,
        CropAnchor::BottomRight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CropAnchor::Center => "Center",
            CropAnchor::TopLeft => "Top-Left",
            CropAnchor::TopRight => "Top-Right",
            CropAnchor::BottomLeft => "Bottom-Left",
            CropAnchor::BottomRight => "Bottom-Right",
        }
    }

    /// Parse a CLI-style name ("center", "top-left", "topleft", ...).
    pub fn parse(s: &str) -> Option<CropAnchor> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "center" => Some(CropAnchor::Center),
            "topleft" => Some(CropAnchor::TopLeft),
            "topright" => Some(CropAnchor::TopRight),
            "bottomleft" => Some(CropAnchor::BottomLeft),
            "bottomright" => Some(CropAnchor::BottomRight),
            _ => None,
        }
    }

    /// Top-left corner (Original space, unclamped) of a `pitch`-sized box
    /// anchored at `point`.
    pub fn top_left(&self, point: Pos2, pitch: f32) -> (f32, f32) {
        match self {
            CropAnchor::Center => (point.x - pitch / 2.0, point.y - pitch / 2.0),
            CropAnchor::TopLeft => (point.x, point.y),
            CropAnchor::TopRight => (point.x - pitch, point.y),
            CropAnchor::BottomLeft => (point.x, point.y - pitch),
            CropAnchor::BottomRight => (point.x - pitch, point.y - pitch),
        }
    }
}

/// A user-drawn two-point segment in Original (full-resolution) space.
///
/// Created when the second point of a placement sequence lands; endpoints
/// are mutated by handle drags; destroyed only by a full reset.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideLine {
    pub start: Pos2,
    pub end: Pos2,
    /// Spacing between successive box anchors along the line, in Original px.
    pub pitch: u32,
    pub anchor: CropAnchor,
}

impl GuideLine {
    pub fn new(start: Pos2, end: Pos2, pitch: u32, anchor: CropAnchor) -> Self {
        Self { start, end, pitch, anchor }
    }

    /// Segment length in Original px.
    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }
}

/// An axis-aligned rectangle in Original space, integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl CropRect {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && py >= self.y as f32
            && px < (self.x + self.w as i32) as f32
            && py < (self.y + self.h as i32) as f32
    }
}

/// One planned crop region along a guide line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub rect: CropRect,
    /// Index of the owning line in the controller's collection (a
    /// back-reference, not ownership).
    pub owner: usize,
    /// Display-only hover flag, rewritten on every hover pass.
    pub hovered: bool,
}

/// Where the two-click placement sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// First point placed, waiting for the second click.
    OnePointPlaced,
    /// Most recent line is complete; the next plain click starts a new line.
    TwoPointsPlaced,
}

/// Active pointer-capture session. Any variant other than `None` suspends
/// the placement state machine until pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    None,
    DraggingStart,
    DraggingEnd,
    Panning,
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn anchor_transforms_match_their_corners() {
        let p = pos2(100.0, 200.0);
        assert_eq!(CropAnchor::Center.top_left(p, 50.0), (75.0, 175.0));
        assert_eq!(CropAnchor::TopLeft.top_left(p, 50.0), (100.0, 200.0));
        assert_eq!(CropAnchor::TopRight.top_left(p, 50.0), (50.0, 200.0));
        assert_eq!(CropAnchor::BottomLeft.top_left(p, 50.0), (100.0, 150.0));
        assert_eq!(CropAnchor::BottomRight.top_left(p, 50.0), (50.0, 150.0));
    }

    #[test]
    fn anchor_parse_accepts_cli_spellings() {
        assert_eq!(CropAnchor::parse("center"), Some(CropAnchor::Center));
        assert_eq!(CropAnchor::parse("Top-Left"), Some(CropAnchor::TopLeft));
        assert_eq!(CropAnchor::parse("bottom_right"), Some(CropAnchor::BottomRight));
        assert_eq!(CropAnchor::parse("middle"), None);
    }

    #[test]
    fn crop_rect_contains_is_half_open() {
        let r = CropRect { x: 10, y: 10, w: 20, h: 20 };
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(29.9, 29.9));
        assert!(!r.contains(30.0, 10.0));
        assert!(!r.contains(9.9, 15.0));
    }
}
