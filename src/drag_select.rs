use crate::form::BBox;
use crate::geometry::{Point, Size};

pub type BoxId = u32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragBox {
    pub id: BoxId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DragBox {
    pub fn bbox(&self) -> BBox {
        BBox {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
            width: self.width.round() as i32,
            height: self.height.round() as i32,
        }
    }
}

/// Single-gesture box drawing: each drag over the image commits one box,
/// which can then be dragged around the image and resized.
///
/// Gestures arrive in page coordinates; the image's page offset is cached
/// once when the image loads.
#[derive(Debug, Default)]
pub struct DragSelect {
    image_offset: Option<Point>,
    image: Size,
    start: Option<Point>,
    boxes: Vec<DragBox>,
    next_id: BoxId,
}

impl DragSelect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_loaded(&mut self, page_offset: Point, size: Size) {
        self.image_offset = Some(page_offset);
        self.image = size;
        tracing::debug!(?page_offset, ?size, "drag-select image loaded");
    }

    pub fn is_loaded(&self) -> bool {
        self.image_offset.is_some()
    }

    pub fn boxes(&self) -> &[DragBox] {
        &self.boxes
    }

    pub fn bboxes(&self) -> Vec<BBox> {
        self.boxes.iter().map(DragBox::bbox).collect()
    }

    /// Box currently being drawn, if a gesture is in progress.
    pub fn preview(&self, page: Point) -> Option<DragBox> {
        let start = self.start?;
        let offset = self.image_offset?;
        Some(span(self.next_id, start, page - offset))
    }

    pub fn selection_start(&mut self, page: Point) -> bool {
        let Some(offset) = self.image_offset else {
            return false;
        };
        self.start = Some(page - offset);
        true
    }

    /// Commits the box spanned since `selection_start`. Drags in any
    /// direction give the same box as the reverse drag; a drag with no
    /// extent commits nothing.
    pub fn selection_stop(&mut self, page: Point) -> Option<BoxId> {
        let start = self.start.take()?;
        let offset = self.image_offset?;
        let drag_box = span(self.next_id, start, page - offset);
        if drag_box.width <= 0.0 || drag_box.height <= 0.0 {
            return None;
        }
        self.next_id += 1;
        self.boxes.push(drag_box);
        tracing::debug!(?drag_box, "box drawn");
        Some(drag_box.id)
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }

    pub fn is_selecting(&self) -> bool {
        self.start.is_some()
    }

    /// Drags a box by `delta`, contained within the image.
    pub fn drag_box(&mut self, id: BoxId, delta: Point) {
        let image = self.image;
        let Some(b) = self.boxes.iter_mut().find(|b| b.id == id) else {
            return;
        };
        b.x = (b.x + delta.x).min(image.width - b.width).max(0.0);
        b.y = (b.y + delta.y).min(image.height - b.height).max(0.0);
    }

    /// Sets a box's size, keeping its top-left corner. Extents stay at
    /// least one pixel.
    pub fn resize_box(&mut self, id: BoxId, size: Size) {
        let Some(b) = self.boxes.iter_mut().find(|b| b.id == id) else {
            return;
        };
        b.width = size.width.max(1.0);
        b.height = size.height.max(1.0);
    }

    pub fn box_at(&self, point: Point) -> Option<BoxId> {
        self.boxes
            .iter()
            .rev()
            .find(|b| {
                point.x >= b.x
                    && point.x <= b.x + b.width
                    && point.y >= b.y
                    && point.y <= b.y + b.height
            })
            .map(|b| b.id)
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
        self.start = None;
    }
}

/// The box with corners `a` and `b`, mirrored about `a` when dragged
/// leftward or upward.
fn span(id: BoxId, a: Point, b: Point) -> DragBox {
    DragBox {
        id,
        x: a.x.min(b.x),
        y: a.y.min(b.y),
        width: (b.x - a.x).abs(),
        height: (b.y - a.y).abs(),
    }
}
