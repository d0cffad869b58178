use crate::geometry::{Area, Point};

/// Resize handle, named by compass direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NorthWest,
        Handle::North,
        Handle::NorthEast,
        Handle::East,
        Handle::SouthEast,
        Handle::South,
        Handle::SouthWest,
        Handle::West,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::NorthWest => "nw",
            Self::North => "n",
            Self::NorthEast => "ne",
            Self::East => "e",
            Self::SouthEast => "se",
            Self::South => "s",
            Self::SouthWest => "sw",
            Self::West => "w",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.label() == label)
    }

    /// `n` and `s` only move the vertical edge.
    pub fn resizes_horizontally(self) -> bool {
        !matches!(self, Self::North | Self::South)
    }

    /// `e` and `w` only move the horizontal edge.
    pub fn resizes_vertically(self) -> bool {
        !matches!(self, Self::East | Self::West)
    }

    /// Dragging a west edge anchors the resize at the right edge.
    pub fn anchors_right(self) -> bool {
        matches!(self, Self::NorthWest | Self::SouthWest | Self::West)
    }

    /// Dragging a north edge anchors the resize at the bottom edge.
    pub fn anchors_bottom(self) -> bool {
        matches!(self, Self::NorthWest | Self::North | Self::NorthEast)
    }

    /// Where the handle sits on the area's outline.
    pub fn position(self, area: &Area) -> Point {
        let x = match self {
            Self::NorthWest | Self::West | Self::SouthWest => area.x,
            Self::North | Self::South => area.x + area.width / 2.0,
            Self::NorthEast | Self::East | Self::SouthEast => area.x + area.width,
        };
        let y = match self {
            Self::NorthWest | Self::North | Self::NorthEast => area.y,
            Self::West | Self::East => area.y + area.height / 2.0,
            Self::SouthWest | Self::South | Self::SouthEast => area.y + area.height,
        };
        Point::new(x, y)
    }
}
