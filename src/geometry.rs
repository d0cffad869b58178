use serde::{Deserialize, Serialize};

pub type AreaId = u32;

/// `z` of the focused area. Every other area sits at [`BLURRED_Z`].
pub const FOCUSED_Z: i32 = 100;
pub const BLURRED_Z: i32 = 0;

// ── Points & sizes ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp a container-relative pointer position onto the image.
    pub fn clamp_to(self, bounds: Size) -> Self {
        Self {
            x: self.x.clamp(0.0, bounds.width.max(0.0)),
            y: self.y.clamp(0.0, bounds.height.max(0.0)),
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ── Areas ───────────────────────────────────────────────────────────────────

/// One rectangular region in container-pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub x: f32,
    pub y: f32,
    pub z: i32,
    pub width: f32,
    pub height: f32,
}

impl Area {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_focused(&self) -> bool {
        self.z == FOCUSED_Z
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Places the top-left corner at `point`, pinned so the whole rectangle
    /// stays inside `[0, image.width] x [0, image.height]`.
    pub fn move_to(&mut self, point: Point, image: Size) {
        self.x = if point.x > 0.0 {
            if point.x + self.width < image.width {
                point.x
            } else {
                image.width - self.width
            }
        } else {
            0.0
        };
        self.y = if point.y > 0.0 {
            if point.y + self.height < image.height {
                point.y
            } else {
                image.height - self.height
            }
        } else {
            0.0
        };
    }

    pub fn apply(&mut self, patch: &AreaPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(z) = patch.z {
            self.z = z;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
    }

    /// Geometry rescaled into the image's natural pixel space.
    pub fn relative(&self, ratio: f32) -> RelativeArea {
        let scale = |v: f32| (v / ratio).floor() as i32;
        RelativeArea {
            id: self.id,
            x: scale(self.x),
            y: scale(self.y),
            z: self.z,
            width: scale(self.width),
            height: scale(self.height),
        }
    }
}

/// Partial area dimensions, as accepted by `add` and `set`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl AreaPatch {
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
            width: Some(width),
            height: Some(height),
        }
    }
}

/// An area in the image's natural (un-scaled) integer pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeArea {
    pub id: AreaId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub width: i32,
    pub height: i32,
}
