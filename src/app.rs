// ============================================================================
// CropLineApp — eframe shell: panels, controls, and the load/export wiring
// ============================================================================

use eframe::egui;
use egui::{ColorImage, TextureHandle, TextureOptions};
use std::path::PathBuf;

use crate::canvas::CanvasView;
use crate::controller::{DEFAULT_PITCH, InteractionController, MAX_PITCH};
use crate::exporter;
use crate::guide::CropAnchor;
use crate::session::{ImageSession, LoadPipeline, LoadResult};
use crate::{io, log_err, log_info, log_warn};

pub struct CropLineApp {
    controller: InteractionController,
    canvas: CanvasView,
    session: Option<ImageSession>,
    loader: LoadPipeline,
    /// Texture of the displayed raster; rebuilt on each session install.
    texture: Option<TextureHandle>,
    /// UI copies of pitch/anchor, pushed into the controller on change.
    pitch_ui: u32,
    anchor_ui: CropAnchor,
    status: String,
    export_root: PathBuf,
}

impl CropLineApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            controller: InteractionController::new(),
            canvas: CanvasView::new(),
            session: None,
            loader: LoadPipeline::new(),
            texture: None,
            pitch_ui: DEFAULT_PITCH,
            anchor_ui: CropAnchor::Center,
            status: "Load an image to begin".to_string(),
            export_root: exporter::app_root(),
        }
    }

    /// Install a fully loaded session in one step: texture, viewport,
    /// controller bounds, then the session itself. The previous session is
    /// dropped only after everything new is in place.
    fn install_session(&mut self, ctx: &egui::Context, session: Box<ImageSession>) {
        let (dw, dh) = session.displayed_size();
        let (ow, oh) = session.original_size();

        let color_image = ColorImage::from_rgba_unmultiplied(
            [dw as usize, dh as usize],
            session.displayed.as_raw(),
        );
        self.texture = Some(ctx.load_texture("displayed-image", color_image, TextureOptions::LINEAR));

        self.controller.viewport.set_image((dw, dh), (ow, oh));
        if let Some(rect) = self.canvas.last_canvas_rect {
            self.controller.viewport.reset_to_fit(rect);
        }
        self.controller.install_image(ow, oh);
        self.controller.set_input_locked(false);

        self.status = format!("Loaded {} ({}x{})", session.path.display(), ow, oh);
        log_info!("Loaded {} ({}x{}, displayed {}x{})", session.path.display(), ow, oh, dw, dh);
        self.session = Some(*session);
    }

    fn begin_load(&mut self, path: PathBuf) {
        log_info!("Loading {}", path.display());
        self.status = format!("Loading {}...", path.display());
        // Gate all interaction until the replacement session arrives.
        self.controller.set_input_locked(true);
        self.loader.spawn_load(path);
    }

    fn export(&mut self) {
        let Some(session) = &self.session else {
            self.status = "Nothing to export — no image loaded".to_string();
            return;
        };
        let boxes = self.controller.all_boxes();
        match exporter::export_crops(&boxes, &session.original, &self.export_root) {
            Ok(0) => {
                self.status = "Export: 0 files written (no crop boxes)".to_string();
                log_warn!("Export requested with no surviving crop boxes");
            }
            Ok(n) => {
                self.status = format!("Export complete ({} files)", n);
                log_info!("Exported {} crops under {}", n, self.export_root.display());
            }
            Err(e) => {
                self.status = format!("Export failed: {}", e);
                log_err!("Export failed: {}", e);
            }
        }
    }

    fn top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let loading = self.loader.in_flight();
                ui.add_enabled_ui(!loading, |ui| {
                    if ui.button("Load Image").clicked()
                        && let Some(path) = io::pick_image_path()
                    {
                        self.begin_load(path);
                    }
                    if ui.button("Export Crops").clicked() {
                        self.export();
                    }
                    if ui.button("Clear Lines").clicked() {
                        self.controller.clear_lines();
                        self.status = "Guide lines cleared".to_string();
                    }
                    if ui.button("Reset View").clicked()
                        && let Some(rect) = self.canvas.last_canvas_rect
                    {
                        self.controller.viewport.reset_to_fit(rect);
                    }
                });

                ui.separator();
                ui.label("Crop size:");
                let drag = egui::DragValue::new(&mut self.pitch_ui)
                    .clamp_range(1..=MAX_PITCH)
                    .suffix(" px");
                if ui.add_enabled(!loading, drag).changed() {
                    self.controller.set_pitch(self.pitch_ui);
                }

                ui.label("Anchor:");
                egui::ComboBox::from_id_source("anchor-policy")
                    .selected_text(self.anchor_ui.label())
                    .show_ui(ui, |ui| {
                        for anchor in CropAnchor::ALL {
                            if ui
                                .selectable_value(&mut self.anchor_ui, anchor, anchor.label())
                                .changed()
                            {
                                self.controller.set_anchor(anchor);
                            }
                        }
                    });

                if loading {
                    ui.separator();
                    ui.spinner();
                    ui.label("Loading image...");
                }
            });
        });
    }

    fn status_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.controller.line_readout() {
                    Some((length, count)) => {
                        ui.label(format!("Line Length: {:.1}px", length));
                        ui.separator();
                        ui.label(format!("Crop Count: {}", count));
                    }
                    None => {
                        ui.label("Line Length: -");
                        ui.separator();
                        ui.label("Crop Count: -");
                    }
                }
                ui.separator();
                ui.label(format!("Lines: {}", self.controller.lines().len()));
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.controller.viewport.scale * 100.0));
                ui.separator();
                ui.label(&self.status);
            });
        });
    }
}

impl eframe::App for CropLineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll the background loader; the swap is a single step, so the
        // controller never observes a half-loaded image.
        if let Some(result) = self.loader.poll() {
            match result {
                LoadResult::Loaded(session) => self.install_session(ctx, session),
                LoadResult::Failed(e) => {
                    // Previous session, lines, and viewport stay untouched.
                    self.controller.set_input_locked(false);
                    self.status = format!("Image load failed: {}", e);
                    log_err!("Image load failed: {}", e);
                }
            }
        }
        if self.loader.in_flight() {
            // Keep polling even while the pointer is idle.
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        if let Some(notice) = self.controller.take_notice() {
            self.status = notice;
        }

        self.top_panel(ctx);
        self.status_panel(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.canvas.show(ui, &mut self.controller, self.texture.as_ref());
            });
    }
}
