use std::path::PathBuf;

use eframe::egui;
use image::DynamicImage;

use crate::area::Direction;
use crate::drag_select::{BoxId, DragSelect};
use crate::error::Result;
use crate::form::{BBox, Submission};
use crate::geometry::{Area, AreaId, Point, Size};
use crate::handle::Handle;
use crate::options::Options;
use crate::selector::{AreaSelector, SelectEvent};

const HANDLE_SIZE: f32 = 8.0;
const DELETE_SIZE: f32 = 14.0;
/// Grab distance for the drag-select resize corner.
const CORNER_GRAB: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Multiple areas with handles, delete buttons and nudging.
    Plugin,
    /// One box per drag; boxes can be dragged and resized from the corner.
    DragSelect,
}

pub struct AppConfig {
    pub image_path: PathBuf,
    pub image_id: String,
    pub options: Options,
    pub mode: Mode,
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
enum BoxEdit {
    Drag,
    Resize,
}

enum Widget {
    Plugin(AreaSelector),
    DragSelect {
        select: DragSelect,
        editing: Option<(BoxId, BoxEdit)>,
    },
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct BboxAnnotateApp {
    image_id: String,
    output: Option<PathBuf>,
    raw_image: DynamicImage,
    texture: Option<egui::TextureHandle>,
    widget: Widget,
    outline_opacity: f32,
    overlay_opacity: f32,

    entire_image: bool,
    delete_image: bool,
    status: String,
}

impl BboxAnnotateApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let raw_image = image::open(&config.image_path)?;
        let natural = Size::new(raw_image.width() as f32, raw_image.height() as f32);
        tracing::info!(
            path = %config.image_path.display(),
            width = natural.width,
            height = natural.height,
            mode = ?config.mode,
            "image loaded"
        );

        let (outline_opacity, overlay_opacity) =
            (config.options.outline_opacity, config.options.overlay_opacity);
        let widget = match config.mode {
            Mode::Plugin => Widget::Plugin(AreaSelector::new(natural, config.options)),
            Mode::DragSelect => Widget::DragSelect {
                select: DragSelect::new(),
                editing: None,
            },
        };

        Ok(Self {
            image_id: config.image_id,
            output: config.output,
            raw_image,
            texture: None,
            widget,
            outline_opacity,
            overlay_opacity,
            entire_image: false,
            delete_image: false,
            status: String::new(),
        })
    }

    fn display_size(&self) -> Size {
        match &self.widget {
            Widget::Plugin(selector) => selector.image_size(),
            Widget::DragSelect { .. } => {
                Size::new(self.raw_image.width() as f32, self.raw_image.height() as f32)
            }
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let rgba = self.raw_image.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        self.texture = Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
    }

    fn submission(&self) -> Submission {
        let boxes: Vec<BBox> = match &self.widget {
            Widget::Plugin(selector) => selector
                .relative_areas()
                .into_iter()
                .map(BBox::from)
                .collect(),
            Widget::DragSelect { select, .. } => select.bboxes(),
        };
        let mut submission = Submission::new(self.image_id.clone(), boxes);
        submission.entire_image = self.entire_image;
        submission.delete = self.delete_image;
        submission
    }

    fn submit(&mut self, path: Option<PathBuf>) {
        let submission = self.submission();
        if let Err(e) = submission.validate() {
            tracing::warn!("{e}; submitting anyway");
        }
        let path = path.or_else(|| self.output.clone());
        self.status = match submission.write(path.as_deref()) {
            Ok(()) => format!("Submitted {} field(s)", submission.fields().len()),
            Err(e) => {
                tracing::error!("submission failed: {e}");
                format!("Submit failed: {e}")
            }
        };
    }

    fn reset(&mut self) {
        match &mut self.widget {
            Widget::Plugin(selector) => selector.reset(),
            Widget::DragSelect { select, editing } => {
                select.clear();
                *editing = None;
            }
        }
    }

    fn box_count(&self) -> usize {
        match &self.widget {
            Widget::Plugin(selector) => selector.areas().len(),
            Widget::DragSelect { select, .. } => select.boxes().len(),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.entire_image, "Annotate entire image");
            ui.checkbox(&mut self.delete_image, "Delete image");
            ui.separator();
            if ui.button("Reset").clicked() {
                self.reset();
            }
            if ui.button("Submit").clicked() {
                self.submit(None);
            }
            if ui.button("Submit as...").clicked() {
                let picked = rfd::FileDialog::new()
                    .add_filter("JSON", &["json"])
                    .set_file_name("submission.json")
                    .save_file();
                if let Some(path) = picked {
                    self.submit(Some(path));
                }
            }
            ui.separator();
            ui.label(format!("Boxes: {}", self.box_count()));
            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });
    }
}

// ── Coordinate helpers ──────────────────────────────────────────────────────

fn to_screen(origin: egui::Pos2, p: Point) -> egui::Pos2 {
    egui::pos2(origin.x + p.x, origin.y + p.y)
}

fn to_container(origin: egui::Pos2, p: egui::Pos2) -> Point {
    Point::new(p.x - origin.x, p.y - origin.y)
}

fn screen_rect(origin: egui::Pos2, x: f32, y: f32, width: f32, height: f32) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(origin.x + x, origin.y + y), egui::vec2(width, height))
}

fn opacity(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0) as u8
}

fn handle_cursor(handle: Handle) -> egui::CursorIcon {
    match handle {
        Handle::NorthWest => egui::CursorIcon::ResizeNorthWest,
        Handle::North => egui::CursorIcon::ResizeNorth,
        Handle::NorthEast => egui::CursorIcon::ResizeNorthEast,
        Handle::East => egui::CursorIcon::ResizeEast,
        Handle::SouthEast => egui::CursorIcon::ResizeSouthEast,
        Handle::South => egui::CursorIcon::ResizeSouth,
        Handle::SouthWest => egui::CursorIcon::ResizeSouthWest,
        Handle::West => egui::CursorIcon::ResizeWest,
    }
}

// ── Area selector layers ────────────────────────────────────────────────────

/// What a pointer-down at a container position lands on, top layer first.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Hit {
    Delete(AreaId),
    Handle(AreaId, Handle),
    Fill(AreaId),
    Trigger,
    Outside,
}

/// Above the top-right corner; areas touching the top of the image get it
/// beside the corner instead, clear of the handle and inside the canvas.
fn delete_button_rect(origin: egui::Pos2, area: &Area) -> egui::Rect {
    let right = area.x + area.width;
    let top = area.y - DELETE_SIZE - 1.0;
    let (x, y) = if top < 0.0 {
        (right + HANDLE_SIZE / 2.0 + 1.0, area.y.max(0.0))
    } else {
        (right + 1.0, top)
    };
    screen_rect(origin, x, y, DELETE_SIZE, DELETE_SIZE)
}

fn hit_test(selector: &AreaSelector, origin: egui::Pos2, pos: egui::Pos2) -> Hit {
    let options = selector.options();
    if let Some(area) = selector.focused().and_then(|id| selector.area(id)) {
        if options.allow_delete && delete_button_rect(origin, area).contains(pos) {
            return Hit::Delete(area.id);
        }
        if options.allow_resize {
            for handle in Handle::ALL {
                let center = to_screen(origin, handle.position(area));
                let rect =
                    egui::Rect::from_center_size(center, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
                if rect.contains(pos) {
                    return Hit::Handle(area.id, handle);
                }
            }
        }
        if area.contains(to_container(origin, pos)) {
            return Hit::Fill(area.id);
        }
    }
    let point = to_container(origin, pos);
    if let Some(area) = selector.areas().iter().rev().find(|a| a.contains(point)) {
        return Hit::Fill(area.id);
    }
    let image = selector.image_size();
    if point.x >= 0.0 && point.y >= 0.0 && point.x <= image.width && point.y <= image.height {
        Hit::Trigger
    } else {
        Hit::Outside
    }
}

fn plugin_input(
    selector: &mut AreaSelector,
    ctx: &egui::Context,
    response: &egui::Response,
    origin: egui::Pos2,
) {
    let (pressed, released, pos, delta) = ctx.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.latest_pos(),
            i.pointer.delta(),
        )
    });

    if pressed && response.hovered() {
        if let Some(pos) = pos {
            match hit_test(selector, origin, pos) {
                Hit::Delete(id) => selector.delete(id),
                Hit::Handle(id, handle) => {
                    selector.pointer_down_handle(id, handle);
                }
                Hit::Fill(id) => {
                    selector.pointer_down_fill(id, to_container(origin, pos));
                }
                Hit::Trigger => {
                    selector.pointer_down_trigger(to_container(origin, pos));
                }
                Hit::Outside => selector.blur_all(),
            }
        }
    } else if let Some(pos) = pos {
        if delta != egui::Vec2::ZERO {
            selector.pointer_move(to_container(origin, pos));
        }
    }
    if released {
        selector.pointer_up();
    }

    if !ctx.wants_keyboard_input() {
        let keys = [
            (egui::Key::ArrowLeft, Direction::Left),
            (egui::Key::ArrowUp, Direction::Up),
            (egui::Key::ArrowRight, Direction::Right),
            (egui::Key::ArrowDown, Direction::Down),
        ];
        for (key, direction) in keys {
            if ctx.input(|i| i.key_pressed(key)) {
                selector.nudge(direction);
            }
        }
    }

    if let Some(pos) = response.hover_pos() {
        let cursor = match hit_test(selector, origin, pos) {
            Hit::Handle(_, handle) => handle_cursor(handle),
            Hit::Fill(_) if selector.options().allow_move => egui::CursorIcon::Move,
            Hit::Trigger if selector.options().allow_select => egui::CursorIcon::Crosshair,
            Hit::Delete(_) => egui::CursorIcon::PointingHand,
            _ => egui::CursorIcon::Default,
        };
        ctx.set_cursor_icon(cursor);
    }

    for event in selector.take_events() {
        match event {
            SelectEvent::Loaded => tracing::debug!("selector loaded"),
            SelectEvent::Changing { id, .. } => tracing::trace!(id, "changing"),
            SelectEvent::Changed { id, areas } => {
                tracing::debug!(id, count = areas.len(), "changed")
            }
        }
    }
}

fn paint_plugin(
    selector: &AreaSelector,
    painter: &egui::Painter,
    origin: egui::Pos2,
    texture: Option<&egui::TextureHandle>,
    outline_opacity: f32,
    overlay_opacity: f32,
) {
    let image = selector.image_size();
    let image_rect = screen_rect(origin, 0.0, 0.0, image.width, image.height);
    let mut areas = selector.areas();
    if !areas.is_empty() {
        let overlay = egui::Color32::from_black_alpha(opacity(overlay_opacity));
        painter.rect_filled(image_rect, 0.0, overlay);
    }
    // Focused area paints last so its handles sit on top.
    areas.sort_by_key(|a| a.z);

    for area in &areas {
        let rect = screen_rect(origin, area.x, area.y, area.width, area.height);
        if let Some(tex) = texture {
            let uv = egui::Rect::from_min_max(
                egui::pos2(area.x / image.width, area.y / image.height),
                egui::pos2(
                    (area.x + area.width) / image.width,
                    (area.y + area.height) / image.height,
                ),
            );
            painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
        }
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_white_alpha(opacity(outline_opacity))),
            egui::StrokeKind::Outside,
        );

        if !area.is_focused() {
            continue;
        }
        let options = selector.options();
        if options.allow_resize {
            for handle in Handle::ALL {
                let center = to_screen(origin, handle.position(area));
                let handle_rect =
                    egui::Rect::from_center_size(center, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
                painter.rect_filled(handle_rect, 0.0, egui::Color32::from_white_alpha(128));
                painter.rect_stroke(
                    handle_rect,
                    0.0,
                    egui::Stroke::new(1.0, egui::Color32::BLACK),
                    egui::StrokeKind::Inside,
                );
            }
        }
        if options.allow_delete {
            let button = delete_button_rect(origin, area);
            painter.rect_filled(button, 2.0, egui::Color32::from_rgb(200, 40, 40));
            painter.text(
                button.center(),
                egui::Align2::CENTER_CENTER,
                "×",
                egui::FontId::proportional(12.0),
                egui::Color32::WHITE,
            );
        }
    }
}

// ── Drag-select layers ──────────────────────────────────────────────────────

fn drag_select_input(
    select: &mut DragSelect,
    editing: &mut Option<(BoxId, BoxEdit)>,
    ctx: &egui::Context,
    response: &egui::Response,
    origin: egui::Pos2,
) {
    let (pressed, down, released, pos, delta) = ctx.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_down(),
            i.pointer.primary_released(),
            i.pointer.latest_pos(),
            i.pointer.delta(),
        )
    });
    let Some(pos) = pos else {
        return;
    };
    let point = to_container(origin, pos);

    if pressed && response.hovered() {
        if let Some(id) = select.box_at(point) {
            let corner = select
                .boxes()
                .iter()
                .find(|b| b.id == id)
                .map(|b| Point::new(b.x + b.width, b.y + b.height));
            let near_corner = corner.is_some_and(|c| {
                (c.x - point.x).abs() <= CORNER_GRAB && (c.y - point.y).abs() <= CORNER_GRAB
            });
            let edit = if near_corner { BoxEdit::Resize } else { BoxEdit::Drag };
            *editing = Some((id, edit));
        } else {
            select.selection_start(Point::new(pos.x, pos.y));
        }
    } else if down {
        if let Some((id, edit)) = *editing {
            match edit {
                BoxEdit::Drag => select.drag_box(id, Point::new(delta.x, delta.y)),
                BoxEdit::Resize => {
                    if let Some(b) = select.boxes().iter().find(|b| b.id == id).copied() {
                        select.resize_box(id, Size::new(point.x - b.x, point.y - b.y));
                    }
                }
            }
        }
    }

    if released {
        if select.is_selecting() {
            select.selection_stop(Point::new(pos.x, pos.y));
        }
        *editing = None;
    }

    if response.hovered() {
        ctx.set_cursor_icon(match editing {
            Some((_, BoxEdit::Resize)) => egui::CursorIcon::ResizeSouthEast,
            Some((_, BoxEdit::Drag)) => egui::CursorIcon::Move,
            None => egui::CursorIcon::Crosshair,
        });
    }
}

fn paint_drag_select(
    select: &DragSelect,
    painter: &egui::Painter,
    origin: egui::Pos2,
    pointer: Option<egui::Pos2>,
) {
    let stroke = egui::Stroke::new(2.0, egui::Color32::from_rgb(255, 200, 0));
    for b in select.boxes() {
        let rect = screen_rect(origin, b.x, b.y, b.width, b.height);
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgba_unmultiplied(255, 200, 0, 40));
        painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
        let corner = egui::Rect::from_center_size(rect.max, egui::vec2(CORNER_GRAB, CORNER_GRAB));
        painter.rect_filled(corner, 0.0, egui::Color32::from_rgb(255, 200, 0));
    }
    if let Some(preview) = pointer.and_then(|p| select.preview(Point::new(p.x, p.y))) {
        let rect = screen_rect(origin, preview.x, preview.y, preview.width, preview.height);
        painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for BboxAnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            let origin = canvas_rect.min;
            let display = self.display_size();

            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));
            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    screen_rect(origin, 0.0, 0.0, display.width, display.height),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            let texture = self.texture.as_ref();
            match &mut self.widget {
                Widget::Plugin(selector) => {
                    plugin_input(selector, ctx, &response, origin);
                    paint_plugin(
                        selector,
                        &painter,
                        origin,
                        texture,
                        self.outline_opacity,
                        self.overlay_opacity,
                    );
                }
                Widget::DragSelect { select, editing } => {
                    // The image offset is cached once, on the first laid-out frame.
                    if !select.is_loaded() {
                        select.image_loaded(Point::new(origin.x, origin.y), display);
                    }
                    drag_select_input(select, editing, ctx, &response, origin);
                    let pointer = ctx.input(|i| i.pointer.latest_pos());
                    paint_drag_select(select, &painter, origin, pointer);
                }
            }
        });
    }
}
