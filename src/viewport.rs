// ============================================================================
// Viewport — pan/zoom state and the three coordinate spaces
// ============================================================================
//
// Three spaces are in play:
//   Screen          raw input / painting coordinates of the canvas surface
//   Displayed-Image coordinates of the downscaled on-screen raster
//   Original        coordinates of the full-resolution raster
//
// `scale` + `offset` relate Screen and Displayed-Image and change with every
// pan/zoom. The Displayed↔Original ratio is fixed per loaded image.

use egui::{Pos2, Rect, Vec2, pos2, vec2};

pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 5.0;
/// Multiplicative zoom per wheel notch (10%).
pub const ZOOM_STEP: f32 = 1.1;

#[derive(Debug, Clone)]
pub struct Viewport {
    /// Displayed-Image → Screen magnification. Always within
    /// `[MIN_ZOOM, MAX_ZOOM]`.
    pub scale: f32,
    /// Screen-space translation of the displayed image's top-left corner.
    pub offset: Vec2,
    displayed_size: Vec2,
    original_size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            displayed_size: Vec2::ZERO,
            original_size: Vec2::ZERO,
        }
    }

    /// Install the sizes of a freshly loaded image. The Displayed↔Original
    /// ratio is derived from these and stays fixed until the next load.
    pub fn set_image(&mut self, displayed: (u32, u32), original: (u32, u32)) {
        self.displayed_size = vec2(displayed.0 as f32, displayed.1 as f32);
        self.original_size = vec2(original.0 as f32, original.1 as f32);
    }

    pub fn has_image(&self) -> bool {
        self.displayed_size.x > 0.0 && self.displayed_size.y > 0.0
    }

    // --- Screen ↔ Displayed-Image -------------------------------------

    pub fn screen_to_displayed(&self, p: Pos2) -> Pos2 {
        ((p.to_vec2() - self.offset) / self.scale).to_pos2()
    }

    pub fn displayed_to_screen(&self, p: Pos2) -> Pos2 {
        (p.to_vec2() * self.scale + self.offset).to_pos2()
    }

    // --- Displayed-Image ↔ Original ------------------------------------

    pub fn displayed_to_original(&self, p: Pos2) -> Pos2 {
        if !self.has_image() {
            return p;
        }
        pos2(
            p.x * self.original_size.x / self.displayed_size.x,
            p.y * self.original_size.y / self.displayed_size.y,
        )
    }

    pub fn original_to_displayed(&self, p: Pos2) -> Pos2 {
        if !self.has_image() {
            return p;
        }
        pos2(
            p.x * self.displayed_size.x / self.original_size.x,
            p.y * self.displayed_size.y / self.original_size.y,
        )
    }

    // --- Compositions ---------------------------------------------------

    pub fn screen_to_original(&self, p: Pos2) -> Pos2 {
        self.displayed_to_original(self.screen_to_displayed(p))
    }

    pub fn original_to_screen(&self, p: Pos2) -> Pos2 {
        self.displayed_to_screen(self.original_to_displayed(p))
    }

    /// Screen-space rectangle currently covered by the displayed image.
    pub fn displayed_rect_on_screen(&self) -> Rect {
        Rect::from_min_size(
            self.offset.to_pos2(),
            self.displayed_size * self.scale,
        )
    }

    // --- Pan / zoom ------------------------------------------------------

    /// Zoom by `factor`, keeping the image point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Pos2, factor: f32) {
        let old_scale = self.scale;
        self.scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let actual = self.scale / old_scale;
        // offset' = p - (p - offset) * (new/old): the displayed point under
        // the cursor projects to the same screen position before and after.
        self.offset = screen_point.to_vec2() - (screen_point.to_vec2() - self.offset) * actual;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Reset to 1:1 scale with the displayed image centered inside `area`
    /// (screen coordinates). With no image loaded the offset goes to zero.
    pub fn reset_to_fit(&mut self, area: Rect) {
        self.scale = 1.0;
        self.offset = if self.has_image() {
            area.min.to_vec2() + (area.size() - self.displayed_size) / 2.0
        } else {
            Vec2::ZERO
        };
    }
}
