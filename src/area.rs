use crate::geometry::{Area, AreaId, AreaPatch, Point, Size, BLURRED_Z, FOCUSED_Z};
use crate::handle::Handle;
use crate::options::Options;

/// Which extents a resize gesture is allowed to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Axes {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Axes {
    pub const BOTH: Self = Self {
        horizontal: true,
        vertical: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    fn offset(self) -> Point {
        match self {
            Self::Left => Point::new(-1.0, 0.0),
            Self::Up => Point::new(0.0, -1.0),
            Self::Right => Point::new(1.0, 0.0),
            Self::Down => Point::new(0.0, 1.0),
        }
    }
}

/// Geometry and focus of one area, plus the corner resizes are anchored on.
///
/// The anchor (`origin`) is only recommitted on release, nudge and `set`, so a
/// resize always measures the pointer against the corner fixed when the
/// gesture began.
#[derive(Clone, Debug)]
pub struct AreaController {
    area: Area,
    origin: Point,
}

impl AreaController {
    pub fn new(id: AreaId) -> Self {
        Self {
            area: Area {
                id,
                ..Default::default()
            },
            origin: Point::ZERO,
        }
    }

    pub fn data(&self) -> &Area {
        &self.area
    }

    pub fn id(&self) -> AreaId {
        self.area.id
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn is_focused(&self) -> bool {
        self.area.is_focused()
    }

    pub fn focus(&mut self) {
        self.area.z = FOCUSED_Z;
    }

    pub fn blur(&mut self) {
        self.area.z = BLURRED_Z;
    }

    pub fn contains(&self, point: Point) -> bool {
        self.area.contains(point)
    }

    /// Starts a new box of `min_size` at `pointer`, pulled back so the
    /// minimum box fits on the image.
    pub fn start_drawing(&mut self, pointer: Point, min_size: [f32; 2], image: Size) {
        self.area.width = min_size[0];
        self.area.height = min_size[1];

        let mut origin = pointer;
        if origin.x + self.area.width > image.width {
            origin.x = image.width - self.area.width;
        }
        if origin.y + self.area.height > image.height {
            origin.y = image.height - self.area.height;
        }
        self.origin = origin;
        self.area.x = origin.x;
        self.area.y = origin.y;
    }

    /// Re-anchors on the edge opposite `handle` and reports which extents the
    /// handle may change.
    pub fn pick_handle(&mut self, handle: Handle) -> Axes {
        if handle.anchors_right() {
            self.origin.x += self.area.width;
            self.area.x = self.origin.x - self.area.width;
        }
        if handle.anchors_bottom() {
            self.origin.y += self.area.height;
            self.area.y = self.origin.y - self.area.height;
        }
        Axes {
            horizontal: handle.resizes_horizontally(),
            vertical: handle.resizes_vertically(),
        }
    }

    /// Pointer offset from the top-left corner, kept for the whole move.
    pub fn pick_fill(&self, pointer: Point) -> Point {
        pointer - self.area.origin()
    }

    pub fn resize(&mut self, pointer: Point, axes: Axes, options: &Options, image: Size) {
        let origin = self.origin;
        let [min_w, min_h] = options.min_size;
        let mut width = pointer.x - origin.x;
        let mut height = pointer.y - origin.y;

        if width.abs() < min_w {
            width = signed(min_w, width);
        }
        if height.abs() < min_h {
            height = signed(min_h, height);
        }

        // An edge pushed off the image mirrors the box back inward.
        if origin.x + width < 0.0 || origin.x + width > image.width {
            width = -width;
        }
        if origin.y + height < 0.0 || origin.y + height > image.height {
            height = -height;
        }

        if options.max_size_applies() {
            let [max_w, max_h] = options.max_size;
            if width.abs() > max_w {
                width = signed(max_w, width);
            }
            if height.abs() > max_h {
                height = signed(max_h, height);
            }
        }

        if axes.horizontal {
            self.area.width = width;
        }
        if axes.vertical {
            self.area.height = height;
        }

        let ratio = options.aspect_ratio;
        if ratio != 0.0 {
            let same_sign = (width > 0.0 && height > 0.0) || (width < 0.0 && height < 0.0);
            let sign = if same_sign { 1.0 } else { -1.0 };
            if axes.horizontal {
                height = sign * round_half_up(width / ratio);
            } else {
                width = sign * round_half_up(height * ratio);
            }

            if origin.x + width > image.width {
                width = image.width - origin.x;
                height = positive_if(round_half_up(width / ratio), height);
            }
            if origin.y + height < 0.0 {
                height = -origin.y;
                width = -positive_if(round_half_up(height * ratio), width);
            }
            if origin.y + height > image.height {
                height = image.height - origin.y;
                width = positive_if(round_half_up(height * ratio), width);
            }

            // The derived extent may have outgrown maxSize again.
            if options.max_size_applies() {
                let [max_w, max_h] = options.max_size;
                if width.abs() > max_w {
                    width = signed(max_w, width);
                    height = signed(round_half_up(max_w / ratio), height);
                }
                if height.abs() > max_h {
                    height = signed(max_h, height);
                    width = signed(round_half_up(max_h * ratio).min(max_w), width);
                }
            }

            self.area.width = width;
            self.area.height = height;
        }

        if self.area.width < 0.0 {
            self.area.width = self.area.width.abs();
            self.area.x = origin.x - self.area.width;
        } else {
            self.area.x = origin.x;
        }
        if self.area.height < 0.0 {
            self.area.height = self.area.height.abs();
            self.area.y = origin.y - self.area.height;
        } else {
            self.area.y = origin.y;
        }
    }

    pub fn move_with_pointer(&mut self, pointer: Point, grab_offset: Point, image: Size) {
        self.area.move_to(pointer - grab_offset, image);
    }

    /// Commits the current top-left corner as the next resize anchor.
    pub fn release(&mut self) {
        self.origin = self.area.origin();
    }

    pub fn nudge(&mut self, direction: Direction, image: Size) {
        let target = self.area.origin() + direction.offset();
        self.area.move_to(target, image);
        self.origin = self.area.origin();
    }

    /// The id is never overwritten by a patch.
    pub fn set(&mut self, patch: &AreaPatch) {
        let id = self.area.id;
        self.area.apply(patch);
        self.area.id = id;
        self.origin = self.area.origin();
    }
}

/// `magnitude` carrying the sign of `like` (zero counts as positive).
fn signed(magnitude: f32, like: f32) -> f32 {
    if like >= 0.0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Like [`signed`], but zero counts as negative.
fn positive_if(magnitude: f32, like: f32) -> f32 {
    if like > 0.0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Halves round towards positive infinity, also for negative values.
fn round_half_up(v: f32) -> f32 {
    (v + 0.5).floor()
}
