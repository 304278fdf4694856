// ============================================================================
// InteractionController — pointer/wheel state machine over the guide lines
// ============================================================================
//
// Owns the guide-line collection, the placement and drag state machines,
// and the viewport. Consumes plain screen-space events (the canvas layer
// translates egui input into these), so the whole state machine runs
// headless in unit tests.

use egui::{Pos2, Vec2, pos2};

use crate::guide::{CropAnchor, CropBox, DragState, GuideLine, InteractionState};
use crate::planner;
use crate::viewport::{Viewport, ZOOM_STEP};

/// Handle hit-test radius in screen pixels.
pub const HIT_RADIUS: f32 = 8.0;

pub const DEFAULT_PITCH: u32 = 512;
pub const MAX_PITCH: u32 = 4096;

/// Button identity after the canvas layer's translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Places points, completes lines, grabs endpoint handles.
    Primary,
    /// Pans the viewport, independent of the placement state.
    Pan,
}

pub struct InteractionController {
    pub viewport: Viewport,
    lines: Vec<GuideLine>,
    /// Crop boxes per line, parallel to `lines`. Rebuilt from scratch by
    /// the planner whenever the owning line or the global pitch changes.
    boxes: Vec<Vec<CropBox>>,
    state: InteractionState,
    drag: DragState,
    /// Line index being dragged; `None` means the pending (uncommitted)
    /// first point is the drag target.
    drag_line: Option<usize>,
    /// First point of an in-progress placement, Original space.
    pending_start: Option<Pos2>,
    /// Set when a press lands on the pending-start handle: if the pointer
    /// never moves before release, the press was a click and commits this
    /// point as the line's end (covers the two-clicks-same-spot case).
    pending_press: Option<Pos2>,
    /// `(line index, box index)` of the hovered crop box, if any.
    hovered: Option<(usize, usize)>,
    /// Line most recently placed or edited, for the status readout.
    last_edited: Option<usize>,
    pitch: u32,
    anchor: CropAnchor,
    image_size: Option<(u32, u32)>,
    /// Set while a background load is in flight; all input is rejected.
    input_locked: bool,
    /// Last pointer position while panning, for delta computation.
    pan_anchor: Option<Pos2>,
    /// Button that opened the active drag session; presses and releases
    /// of any other button are ignored until that button releases.
    drag_button: Option<Button>,
    notice: Option<String>,
    /// Suppresses repeated invalid-location notices until a valid click.
    invalid_notice_sent: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(),
            lines: Vec::new(),
            boxes: Vec::new(),
            state: InteractionState::Idle,
            drag: DragState::None,
            drag_line: None,
            pending_start: None,
            pending_press: None,
            hovered: None,
            last_edited: None,
            pitch: DEFAULT_PITCH,
            anchor: CropAnchor::Center,
            image_size: None,
            input_locked: false,
            pan_anchor: None,
            drag_button: None,
            notice: None,
            invalid_notice_sent: false,
        }
    }

    // --- Session wiring --------------------------------------------------

    /// Install freshly loaded image bounds. Clears every line and resets
    /// both state machines, matching the original tool's reset-on-load.
    pub fn install_image(&mut self, width: u32, height: u32) {
        self.image_size = Some((width, height));
        self.clear_lines();
    }

    /// Destroy all guide lines and return to `Idle`. The only way lines
    /// are removed outside of a new image load.
    pub fn clear_lines(&mut self) {
        self.lines.clear();
        self.boxes.clear();
        self.state = InteractionState::Idle;
        self.drag = DragState::None;
        self.drag_line = None;
        self.drag_button = None;
        self.pending_start = None;
        self.pending_press = None;
        self.hovered = None;
        self.last_edited = None;
    }

    /// Gate used while a background load is in flight: events arriving
    /// against a half-loaded image are dropped, never applied.
    pub fn set_input_locked(&mut self, locked: bool) {
        self.input_locked = locked;
        if locked {
            self.drag = DragState::None;
            self.drag_line = None;
            self.drag_button = None;
            self.pending_press = None;
            self.pan_anchor = None;
        }
    }

    pub fn input_locked(&self) -> bool {
        self.input_locked
    }

    // --- Pointer events ---------------------------------------------------

    pub fn pointer_down(&mut self, pos: Pos2, button: Button) {
        if self.input_locked || self.image_size.is_none() {
            return;
        }
        // A second button pressed mid-session must not hijack the drag.
        if self.drag != DragState::None {
            return;
        }
        if button == Button::Pan {
            self.drag = DragState::Panning;
            self.drag_button = Some(button);
            self.pan_anchor = Some(pos);
            return;
        }

        // Handle hit-testing takes priority over placement and over
        // starting a new line.
        if let Some((target, which)) = self.hit_test_handles(pos) {
            self.drag = which;
            self.drag_line = target;
            self.drag_button = Some(button);
            // An accepted click re-arms the invalid-location notice.
            self.invalid_notice_sent = false;
            if target.is_none() && self.viewport.displayed_rect_on_screen().contains(pos) {
                // Pressing the pending-start handle may still be the
                // second placement click; decided at release.
                self.pending_press =
                    Some(self.clamp_to_image(self.viewport.screen_to_original(pos)));
            }
            return;
        }

        if !self.viewport.displayed_rect_on_screen().contains(pos) {
            if !self.invalid_notice_sent {
                self.notice = Some("Click inside the image area".to_string());
                self.invalid_notice_sent = true;
            }
            return;
        }
        self.invalid_notice_sent = false;

        let point = self.clamp_to_image(self.viewport.screen_to_original(pos));
        match self.state {
            InteractionState::Idle | InteractionState::TwoPointsPlaced => {
                // A click on a completed collection starts a new
                // independent line; committed lines stay.
                self.pending_start = Some(point);
                self.state = InteractionState::OnePointPlaced;
            }
            InteractionState::OnePointPlaced => {
                if let Some(start) = self.pending_start.take() {
                    self.commit_line(start, point);
                }
            }
        }
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        if self.input_locked {
            return;
        }
        match self.drag {
            DragState::Panning => {
                if let Some(prev) = self.pan_anchor {
                    self.viewport.pan(pos - prev);
                }
                self.pan_anchor = Some(pos);
            }
            DragState::DraggingStart | DragState::DraggingEnd => {
                let point = self.clamp_to_image(self.viewport.screen_to_original(pos));
                match self.drag_line {
                    Some(idx) => {
                        if let Some(line) = self.lines.get_mut(idx) {
                            if self.drag == DragState::DraggingStart {
                                line.start = point;
                            } else {
                                line.end = point;
                            }
                            self.replan(idx);
                            self.last_edited = Some(idx);
                        }
                    }
                    None => {
                        // Dragging the pending first point of an
                        // unfinished placement. A move event that did not
                        // actually change the position keeps the pending
                        // press alive so a plain click still commits.
                        if self.pending_press != Some(point) {
                            self.pending_press = None;
                            self.pending_start = Some(point);
                        }
                    }
                }
            }
            DragState::None => self.resolve_hover(pos),
        }
    }

    pub fn pointer_up(&mut self, button: Button) {
        // Only the button that opened the drag session may close it.
        if let Some(active) = self.drag_button
            && active != button
        {
            return;
        }
        // A press on the pending-start handle that never moved is the
        // second placement click; a same-spot double click commits a
        // degenerate line whose plan is simply empty.
        if self.drag == DragState::DraggingStart && self.drag_line.is_none() {
            if let Some(end) = self.pending_press.take() {
                if let Some(start) = self.pending_start.take() {
                    self.commit_line(start, end);
                }
            }
        }
        self.pending_press = None;
        self.drag = DragState::None;
        self.drag_line = None;
        self.drag_button = None;
        self.pan_anchor = None;
    }

    pub fn wheel(&mut self, pos: Pos2, delta: f32) {
        if self.input_locked || self.image_size.is_none() || delta == 0.0 {
            return;
        }
        let factor = if delta > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        self.viewport.zoom_at(pos, factor);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if !self.input_locked {
            self.viewport.pan(delta);
        }
    }

    // --- Configuration ----------------------------------------------------

    /// Apply a new pitch to every guide line and replan them all. Values
    /// outside `1..=MAX_PITCH` are clamped here, at the boundary; the
    /// planner itself never sees a non-positive pitch from the UI.
    pub fn set_pitch(&mut self, pitch: u32) {
        let pitch = pitch.clamp(1, MAX_PITCH);
        if pitch == self.pitch {
            return;
        }
        self.pitch = pitch;
        for line in &mut self.lines {
            line.pitch = pitch;
        }
        self.replan_all();
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Apply a new anchor policy to every guide line and replan them all.
    pub fn set_anchor(&mut self, anchor: CropAnchor) {
        if anchor == self.anchor {
            return;
        }
        self.anchor = anchor;
        for line in &mut self.lines {
            line.anchor = anchor;
        }
        self.replan_all();
    }

    pub fn anchor(&self) -> CropAnchor {
        self.anchor
    }

    // --- Read access for rendering and export -----------------------------

    pub fn lines(&self) -> &[GuideLine] {
        &self.lines
    }

    pub fn boxes(&self) -> &[Vec<CropBox>] {
        &self.boxes
    }

    /// All committed crop boxes, line order then generation order — the
    /// exporter's input.
    pub fn all_boxes(&self) -> Vec<CropBox> {
        self.boxes.iter().flatten().copied().collect()
    }

    pub fn hovered(&self) -> Option<(usize, usize)> {
        self.hovered
    }

    pub fn pending_start(&self) -> Option<Pos2> {
        self.pending_start
    }

    /// `(length px, box count)` of the line most recently placed or edited.
    pub fn line_readout(&self) -> Option<(f32, usize)> {
        let idx = self.last_edited?;
        let line = self.lines.get(idx)?;
        Some((line.length(), self.boxes.get(idx).map_or(0, Vec::len)))
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    /// One-shot user notice (invalid click location etc.).
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    // --- Internals ---------------------------------------------------------

    fn commit_line(&mut self, start: Pos2, end: Pos2) {
        self.lines
            .push(GuideLine::new(start, end, self.pitch, self.anchor));
        self.replan(self.lines.len() - 1);
        self.last_edited = Some(self.lines.len() - 1);
        self.state = InteractionState::TwoPointsPlaced;
    }

    fn replan(&mut self, idx: usize) {
        let Some((w, h)) = self.image_size else { return };
        // Drop the hover before rebuilding: the flag may live on another
        // line's box, which survives this replan untouched.
        if let Some((li, bi)) = self.hovered.take()
            && let Some(b) = self.boxes.get_mut(li).and_then(|l| l.get_mut(bi))
        {
            b.hovered = false;
        }
        while self.boxes.len() < self.lines.len() {
            self.boxes.push(Vec::new());
        }
        if let Some(line) = self.lines.get(idx) {
            self.boxes[idx] = planner::plan(line, w, h, idx);
        }
    }

    fn replan_all(&mut self) {
        for idx in 0..self.lines.len() {
            self.replan(idx);
        }
    }

    /// Find an endpoint handle within `HIT_RADIUS` screen px of `pos`.
    /// Committed lines are scanned in collection order, then the pending
    /// first point of an unfinished placement.
    fn hit_test_handles(&self, pos: Pos2) -> Option<(Option<usize>, DragState)> {
        for (idx, line) in self.lines.iter().enumerate() {
            if self.near(pos, line.start) {
                return Some((Some(idx), DragState::DraggingStart));
            }
            if self.near(pos, line.end) {
                return Some((Some(idx), DragState::DraggingEnd));
            }
        }
        if self.state == InteractionState::OnePointPlaced {
            if let Some(p) = self.pending_start {
                if self.near(pos, p) {
                    return Some((None, DragState::DraggingStart));
                }
            }
        }
        None
    }

    fn near(&self, screen: Pos2, original: Pos2) -> bool {
        (self.viewport.original_to_screen(original) - screen).length() <= HIT_RADIUS
    }

    /// Hover: first box (line order, then generation order) containing the
    /// pointer wins. A stable, documented first-match policy — overlapping
    /// boxes from later lines never steal the hover.
    fn resolve_hover(&mut self, pos: Pos2) {
        if self.image_size.is_none() {
            return;
        }
        let p = self.viewport.screen_to_original(pos);
        let mut hit = None;
        'scan: for (li, list) in self.boxes.iter().enumerate() {
            for (bi, b) in list.iter().enumerate() {
                if b.rect.contains(p.x, p.y) {
                    hit = Some((li, bi));
                    break 'scan;
                }
            }
        }
        if hit != self.hovered {
            if let Some((li, bi)) = self.hovered {
                if let Some(b) = self.boxes.get_mut(li).and_then(|l| l.get_mut(bi)) {
                    b.hovered = false;
                }
            }
            if let Some((li, bi)) = hit {
                if let Some(b) = self.boxes.get_mut(li).and_then(|l| l.get_mut(bi)) {
                    b.hovered = true;
                }
            }
            self.hovered = hit;
        }
    }

    fn clamp_to_image(&self, p: Pos2) -> Pos2 {
        match self.image_size {
            Some((w, h)) => pos2(p.x.clamp(0.0, w as f32), p.y.clamp(0.0, h as f32)),
            None => p,
        }
    }
}
