//! Main editor application.
//!
//! This module contains the `SnapFitEditor` struct which implements the
//! `eframe::App` trait for the crop-then-resize window.

use super::input::{pointer_events, to_screen, to_screen_pos, to_surface};
use super::rendering::{CropOverlay, cursor_for, cursor_for_drag};
use super::state::{ResizeForm, Stage, WorkerEvent, failure_message};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pipeline::{ImagePipeline, OutputFormat};
use crate::resize::{MAX_DIMENSION, ResizeResult, ResizeStage, resize_and_encode};
use crate::session::{CROP_PRESETS, CropOutcome, CropSession};
use crate::stats::{self, PixelChange, RESIZE_PRESETS};
use eframe::egui;
use image::DynamicImage;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;

const PREVIEW_MAX: egui::Vec2 = egui::vec2(400.0, 300.0);

/// What the crop buttons asked for this frame.
enum CropAction {
    Apply,
    Skip,
}

/// Two-stage crop and resize editor.
pub struct SnapFitEditor {
    stage: Stage,
    config: Config,
    /// Size of the file the image was loaded from, for target hints.
    source_bytes: Option<u64>,

    // Textures
    color_image: Option<egui::ColorImage>,
    image_texture: Option<egui::TextureHandle>,
    preview_texture: Option<egui::TextureHandle>,

    // Crop state
    active_preset: usize,

    // Resize state
    resize: ResizeStage,
    status: Option<String>,
    rx: Receiver<WorkerEvent>,
    tx: Sender<WorkerEvent>,

    /// Shared slot the caller reads once the window closes.
    pub result: Arc<Mutex<Option<ResizeResult>>>,
}

impl SnapFitEditor {
    /// Creates an editor starting in the crop stage.
    ///
    /// # Arguments
    /// * `image` - The image to edit
    /// * `source_bytes` - Size of the original file, if known
    /// * `result` - Shared result container for returning the output to the caller
    /// * `config` - Application configuration
    pub fn new(
        image: DynamicImage,
        source_bytes: Option<u64>,
        result: Arc<Mutex<Option<ResizeResult>>>,
        config: Config,
    ) -> Self {
        let (tx, rx) = channel();

        // Convert before the UI loop starts so the first frame only uploads
        let color_image = to_color_image(&image);
        let session = CropSession::begin(image, config.max_surface());

        Self {
            stage: Stage::Cropping(Box::new(session)),
            config,
            source_bytes,
            color_image: Some(color_image),
            image_texture: None,
            preview_texture: None,
            active_preset: 0,
            resize: ResizeStage::new(),
            status: None,
            rx,
            tx,
            result,
        }
    }

    fn finish_crop(&mut self, action: CropAction) {
        let Stage::Cropping(session) = std::mem::replace(&mut self.stage, Stage::Closed) else {
            return;
        };
        let outcome = match action {
            CropAction::Skip => Ok(session.skip()),
            CropAction::Apply => session.commit(),
        };
        match outcome {
            Ok(outcome) => self.enter_resize(outcome),
            Err(e) => {
                log::error!("crop failed: {}", e);
                self.status = Some(failure_message(&e));
            }
        }
    }

    fn enter_resize(&mut self, outcome: CropOutcome) {
        let CropOutcome {
            image,
            target_width,
            target_height,
            ..
        } = outcome;
        let source = (image.width(), image.height());
        let form = ResizeForm::new(source, (target_width, target_height), &self.config);
        // The crop texture is no longer shown
        self.image_texture = None;
        self.resize.clear();
        self.stage = Stage::Resizing {
            source: Arc::new(image),
            form,
        };
    }

    /// Starts a resize job on a background thread.
    fn submit_resize(&mut self, ctx: &egui::Context) {
        let Stage::Resizing { source, form } = &self.stage else {
            return;
        };
        let request = match form.request() {
            Ok(r) => r,
            Err(e) => {
                self.status = Some(failure_message(&e));
                return;
            }
        };
        if let Err(e) = self.resize.begin() {
            self.status = Some(failure_message(&e));
            return;
        }
        self.status = None;

        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let source = Arc::clone(source);
        let search = self.config.search_engine();

        // Spawn background thread for async work
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            let outcome = match runtime {
                Ok(rt) => rt.block_on(resize_and_encode(&ImagePipeline, source, &request, &search)),
                Err(e) => Err(AppError::Unknown(format!(
                    "Failed to create async runtime: {}",
                    e
                ))),
            };
            let _ = tx.send(WorkerEvent::Finished(outcome));
            ctx.request_repaint();
        });
    }

    /// Processes events from the resize worker.
    fn process_worker_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                WorkerEvent::Finished(outcome) => match self.resize.finish(outcome) {
                    Ok(result) => {
                        log::debug!("resize job finished, {} bytes", result.size());
                        self.status = Some(result.status_message());
                        // Release the old preview before uploading the new one
                        self.preview_texture = None;
                        self.preview_texture = preview_image(result)
                            .map(|img| ctx.load_texture("preview", img, egui::TextureOptions::LINEAR));
                        if let Ok(mut slot) = self.result.lock() {
                            *slot = Some(result.clone());
                        }
                    }
                    Err(e) => {
                        log::error!("resize failed: {}", e);
                        self.status = Some(failure_message(&e));
                    }
                },
            }
        }
    }

    /// Renders the crop stage.
    fn render_crop_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) -> Option<CropAction> {
        let Stage::Cropping(session) = &mut self.stage else {
            return None;
        };

        ui.horizontal(|ui| {
            for (i, preset) in CROP_PRESETS.iter().enumerate() {
                if ui.selectable_label(self.active_preset == i, preset.label).clicked() {
                    self.active_preset = i;
                    session.apply_preset(preset);
                }
            }
        });
        ui.add_space(6.0);

        let surface = session.surface();
        let (response, painter) = ui.allocate_painter(
            egui::vec2(surface.width, surface.height),
            egui::Sense::click_and_drag(),
        );
        let widget = response.rect;

        for event in pointer_events(&response, ctx, surface) {
            session.handle_pointer(event);
        }

        let cursor = cursor_for_drag(session.engine().mode()).or_else(|| {
            let pos = response.hover_pos()?;
            Some(cursor_for(session.engine().hit_test(to_surface(pos, widget, surface))))
        });
        if let Some(icon) = cursor {
            ctx.set_cursor_icon(icon);
        }

        if let Some(texture) = &self.image_texture {
            painter.image(
                texture.id(),
                widget,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        let selection = to_screen(session.rect(), widget, surface);
        let handles = session
            .engine()
            .handle_anchors()
            .map(|(handle, anchor)| (handle, to_screen_pos(anchor, widget, surface)));
        CropOverlay::default().paint(&painter, widget, selection, handles);

        let region = session.selection_in_image();
        ui.add_space(6.0);
        ui.label(format!("{} × {} px", region.width, region.height));

        let mut action = None;
        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                self.active_preset = 0;
                session.reset();
            }
            if ui.button("Skip").clicked() {
                action = Some(CropAction::Skip);
            }
            if ui.button("Apply").clicked() {
                action = Some(CropAction::Apply);
            }
        });
        action
    }

    /// Renders the resize stage. Returns whether Resize was clicked.
    fn render_resize_ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) -> bool {
        let busy = self.resize.is_busy();
        let Stage::Resizing { form, .. } = &mut self.stage else {
            return false;
        };

        let (sw, sh) = form.source;
        ui.label(format!(
            "Current: {} × {} ({}, {})",
            sw,
            sh,
            stats::format_aspect(sw, sh),
            stats::format_pixels(sw as u64 * sh as u64)
        ));
        ui.label(format!(
            "Desired: {} × {} ({}, {}) at {}%",
            form.width,
            form.height,
            stats::format_aspect(form.width, form.height),
            stats::format_pixels(form.width as u64 * form.height as u64),
            stats::scale_percent(form.source, (form.width, form.height))
        ));
        ui.label(PixelChange::between(form.source, (form.width, form.height)).label());
        ui.separator();

        ui.horizontal(|ui| {
            let mut width = form.width;
            ui.label("Width:");
            if ui
                .add(egui::DragValue::new(&mut width).range(1..=MAX_DIMENSION))
                .changed()
            {
                form.set_width(width);
            }
            let mut height = form.height;
            ui.label("Height:");
            if ui
                .add(egui::DragValue::new(&mut height).range(1..=MAX_DIMENSION))
                .changed()
            {
                form.set_height(height);
            }
            let mut locked = form.aspect_locked;
            if ui.checkbox(&mut locked, "Lock aspect").changed() {
                form.set_aspect_locked(locked);
            }
        });

        ui.horizontal(|ui| {
            for preset in RESIZE_PRESETS {
                if ui.button(preset.label()).clicked() {
                    form.apply_preset(*preset);
                }
            }
        });

        egui::ComboBox::from_label("Format")
            .selected_text(form.format.label())
            .show_ui(ui, |ui| {
                for format in OutputFormat::ALL {
                    ui.selectable_value(&mut form.format, format, format.label());
                }
            });

        let quality_applies = form.target_input.trim().is_empty() || form.format.is_lossless();
        ui.add_enabled(
            quality_applies,
            egui::Slider::new(&mut form.quality, 0.01..=1.0).text("Quality"),
        );

        ui.horizontal(|ui| {
            ui.label("Target size:");
            ui.add(
                egui::TextEdit::singleline(&mut form.target_input)
                    .desired_width(120.0)
                    .hint_text("e.g. 200KB or 1.5MB"),
            );
        });
        if let Some(hint) = form.target_hint(self.source_bytes) {
            ui.label(egui::RichText::new(hint).small().color(egui::Color32::LIGHT_GRAY));
        }
        ui.separator();

        let mut clicked = false;
        ui.horizontal(|ui| {
            clicked = ui.add_enabled(!busy, egui::Button::new("Resize")).clicked();
            if busy {
                ui.spinner();
                ui.label("Resizing...");
            }
            if ui.button("Done").clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        if let Some(status) = &self.status {
            ui.label(status);
        }

        if let Some(texture) = &self.preview_texture {
            let size = fit_within(texture.size_vec2(), PREVIEW_MAX);
            ui.add(egui::Image::new((texture.id(), size)));
        }

        clicked
    }
}

impl eframe::App for SnapFitEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.process_worker_events(ctx);

        // Upload texture on first frame using pre-converted data
        if self.image_texture.is_none() {
            if let Some(color_image) = self.color_image.take() {
                self.image_texture =
                    Some(ctx.load_texture("source", color_image, egui::TextureOptions::LINEAR));
            }
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.stage {
            Stage::Cropping(_) => {
                if let Some(action) = self.render_crop_ui(ui, ctx) {
                    self.finish_crop(action);
                }
            }
            Stage::Resizing { .. } => {
                if self.render_resize_ui(ui, ctx) {
                    self.submit_resize(ctx);
                }
            }
            Stage::Closed => {
                if let Some(status) = &self.status {
                    ui.label(egui::RichText::new(status).color(egui::Color32::RED));
                }
            }
        });
    }
}

fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
    let buffer = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, buffer.as_flat_samples().as_slice())
}

/// Decodes an encoded result for display. Formats without a decoder show no preview.
fn preview_image(result: &ResizeResult) -> Option<egui::ColorImage> {
    match image::load_from_memory(&result.bytes) {
        Ok(img) => Some(to_color_image(&img)),
        Err(e) => {
            log::debug!("no preview for {} output: {}", result.format, e);
            None
        }
    }
}

/// Scales `size` down to fit in `max`, keeping its aspect ratio.
fn fit_within(size: egui::Vec2, max: egui::Vec2) -> egui::Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return size;
    }
    let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
    size * scale
}

/// Launches the editor and returns the last successful resize when it closes.
///
/// # Arguments
/// * `image` - The image to crop and resize
/// * `source_bytes` - Size of the original file, if known
/// * `config` - Application configuration
pub fn run(
    image: DynamicImage,
    source_bytes: Option<u64>,
    config: Config,
) -> Result<Option<ResizeResult>> {
    let surface = config.max_surface();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SnapFit")
            .with_inner_size([
                (surface.width + 40.0).max(520.0),
                surface.height + 200.0,
            ]),
        ..Default::default()
    };

    let result = Arc::new(Mutex::new(None));
    let app_result = result.clone();

    eframe::run_native(
        "SnapFit",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(SnapFitEditor::new(image, source_bytes, app_result, config))
                as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))?;

    let mut lock = result
        .lock()
        .map_err(|_| AppError::ui("Failed to acquire result lock"))?;
    Ok(lock.take())
}
