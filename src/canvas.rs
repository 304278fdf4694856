// ============================================================================
// Canvas — paints the image + overlays and feeds egui input to the controller
// ============================================================================
//
// This layer owns no interaction state of its own. It harvests raw egui
// events (all sub-frame pointer events, not just the frame's last
// position), translates them into the controller's screen-space event
// vocabulary, then draws the overlay from the controller's read model.

use egui::{Color32, Pos2, Rect, Shape, Stroke, TextureHandle};

use crate::controller::{Button, InteractionController};

const LINE_STROKE: f32 = 2.0;
const HANDLE_RADIUS: f32 = 4.0;
const DASH_LEN: f32 = 6.0;
const DASH_GAP: f32 = 4.0;

const LINE_COLOR: Color32 = Color32::from_rgb(230, 50, 50);
const BOX_COLOR: Color32 = Color32::from_rgb(240, 210, 40);
const HOVER_COLOR: Color32 = Color32::from_rgb(120, 240, 120);
const BACKDROP: Color32 = Color32::from_gray(28);

pub struct CanvasView {
    pub last_canvas_rect: Option<Rect>,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasView {
    pub fn new() -> Self {
        Self { last_canvas_rect: None }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        controller: &mut InteractionController,
        texture: Option<&TextureHandle>,
    ) {
        let available = ui.available_size();
        let sense = egui::Sense::click_and_drag().union(egui::Sense::hover());
        let (response, painter) = ui.allocate_painter(available, sense);
        let canvas_rect = response.rect;
        self.last_canvas_rect = Some(canvas_rect);
        let painter = painter.with_clip_rect(canvas_rect);

        self.dispatch_input(ui, controller, canvas_rect);

        painter.rect_filled(canvas_rect, 0.0, BACKDROP);
        if let Some(texture) = texture {
            painter.image(
                texture.id(),
                controller.viewport.displayed_rect_on_screen(),
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        self.draw_overlay(&painter, controller);
    }

    /// Translate egui events into controller events. Presses are only
    /// forwarded when they land on the canvas; releases always are, so a
    /// drag that ends over a panel still clears its session.
    fn dispatch_input(
        &self,
        ui: &egui::Ui,
        controller: &mut InteractionController,
        canvas_rect: Rect,
    ) {
        let ui_blocking = ui.ctx().memory(|mem| mem.any_popup_open());
        let events: Vec<egui::Event> = ui.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::PointerButton { pos, button, pressed: true, .. } => {
                    if ui_blocking || !canvas_rect.contains(pos) {
                        continue;
                    }
                    match button {
                        egui::PointerButton::Primary => {
                            controller.pointer_down(pos, Button::Primary)
                        }
                        egui::PointerButton::Middle => controller.pointer_down(pos, Button::Pan),
                        _ => {}
                    }
                }
                egui::Event::PointerButton { button, pressed: false, .. } => match button {
                    egui::PointerButton::Primary => controller.pointer_up(Button::Primary),
                    egui::PointerButton::Middle => controller.pointer_up(Button::Pan),
                    _ => {}
                },
                egui::Event::PointerMoved(pos) => controller.pointer_move(pos),
                _ => {}
            }
        }

        // Wheel zoom, anchored at the cursor, only while hovering the canvas.
        let hover = ui.input(|i| i.pointer.hover_pos());
        if let Some(pos) = hover
            && canvas_rect.contains(pos)
            && !ui_blocking
        {
            let scroll = ui.input(|i| i.scroll_delta.y);
            if scroll.abs() > 0.1 {
                controller.wheel(pos, scroll);
            }
        }
    }

    fn draw_overlay(&self, painter: &egui::Painter, controller: &InteractionController) {
        let vp = &controller.viewport;

        // Crop boxes first so lines and handles stay on top.
        for list in controller.boxes() {
            for b in list {
                let min = vp.original_to_screen(Pos2::new(b.rect.x as f32, b.rect.y as f32));
                let max = vp.original_to_screen(Pos2::new(
                    (b.rect.x + b.rect.w as i32) as f32,
                    (b.rect.y + b.rect.h as i32) as f32,
                ));
                let rect = Rect::from_min_max(min, max);
                if b.hovered {
                    painter.rect_stroke(rect, 0.0, Stroke::new(LINE_STROKE + 1.0, HOVER_COLOR));
                } else {
                    self.dashed_rect(painter, rect, Stroke::new(LINE_STROKE, BOX_COLOR));
                }
            }
        }

        for line in controller.lines() {
            let a = vp.original_to_screen(line.start);
            let b = vp.original_to_screen(line.end);
            painter.line_segment([a, b], Stroke::new(LINE_STROKE, LINE_COLOR));
            painter.circle_filled(a, HANDLE_RADIUS, LINE_COLOR);
            painter.circle_filled(b, HANDLE_RADIUS, LINE_COLOR);
        }

        if let Some(pending) = controller.pending_start() {
            painter.circle_filled(vp.original_to_screen(pending), HANDLE_RADIUS, LINE_COLOR);
        }
    }

    fn dashed_rect(&self, painter: &egui::Painter, rect: Rect, stroke: Stroke) {
        let corners = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
            rect.left_top(),
        ];
        for pair in corners.windows(2) {
            painter.extend(Shape::dashed_line(pair, stroke, DASH_LEN, DASH_GAP));
        }
    }
}
