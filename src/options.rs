use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};
use crate::geometry::AreaPatch;

/// Area selector configuration. Field names match the option file keys
/// (`allowEdit`, `minSize`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub allow_edit: bool,
    pub allow_move: bool,
    pub allow_resize: bool,
    pub allow_select: bool,
    pub allow_delete: bool,
    pub allow_nudge: bool,
    /// width / height; 0 leaves the shape free.
    pub aspect_ratio: f32,
    pub min_size: [f32; 2],
    /// Ignored unless both components exceed `min_size`.
    pub max_size: [f32; 2],
    /// Display width override; 0 keeps the natural width.
    pub width: f32,
    /// 0 means unlimited.
    pub max_areas: usize,
    pub outline_opacity: f32,
    pub overlay_opacity: f32,
    pub areas: Vec<AreaPatch>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_edit: true,
            allow_move: true,
            allow_resize: true,
            allow_select: true,
            allow_delete: true,
            allow_nudge: true,
            aspect_ratio: 0.0,
            min_size: [0.0, 0.0],
            max_size: [0.0, 0.0],
            width: 0.0,
            max_areas: 0,
            outline_opacity: 0.5,
            overlay_opacity: 0.5,
            areas: Vec::new(),
        }
    }
}

impl Options {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| AnnotateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options: Options = serde_json::from_str(&data)?;
        Ok(options.normalized())
    }

    /// Without `allowEdit` nothing can be selected, moved, resized or deleted.
    pub fn normalized(mut self) -> Self {
        if !self.allow_edit {
            self.allow_select = false;
            self.allow_move = false;
            self.allow_resize = false;
            self.allow_delete = false;
        }
        self
    }

    pub fn max_size_applies(&self) -> bool {
        self.max_size[0] > self.min_size[0] && self.max_size[1] > self.min_size[1]
    }

    pub fn is_read_only(&self) -> bool {
        !self.allow_select && !self.allow_move && !self.allow_resize && !self.allow_delete
    }
}
