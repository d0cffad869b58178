use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};
use crate::geometry::RelativeArea;

/// Box submitted for the "annotate entire image" flag.
pub const ENTIRE_IMAGE: BBox = BBox {
    x: 0,
    y: 0,
    width: 512,
    height: 512,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    /// `x,y,width,height`, the `new-bbox` field value.
    pub fn field_value(&self) -> String {
        format!("{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl From<RelativeArea> for BBox {
    fn from(area: RelativeArea) -> Self {
        Self {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_owned(),
            value: value.into(),
        }
    }
}

/// What one image's annotation form carries when submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    pub image_id: String,
    pub delete: bool,
    pub entire_image: bool,
    pub boxes: Vec<BBox>,
}

impl Submission {
    pub fn new(image_id: impl Into<String>, boxes: Vec<BBox>) -> Self {
        Self {
            image_id: image_id.into(),
            boxes,
            ..Default::default()
        }
    }

    /// Hidden inputs in form order. The entire-image flag replaces every
    /// drawn box with [`ENTIRE_IMAGE`].
    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::new("image_id", self.image_id.clone())];
        if self.delete {
            fields.push(FormField::new("delete", "true"));
        }
        if self.entire_image {
            fields.push(FormField::new("new-bbox", ENTIRE_IMAGE.field_value()));
        } else {
            fields.extend(
                self.boxes
                    .iter()
                    .map(|b| FormField::new("new-bbox", b.field_value())),
            );
        }
        fields
    }

    /// Not enforced on submit; callers decide what to do with an empty form.
    pub fn validate(&self) -> Result<()> {
        if self.boxes.is_empty() && !self.entire_image {
            return Err(AnnotateError::EmptySubmission);
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.fields())?)
    }

    /// Writes the fields as JSON to `path`, or to stdout without one.
    pub fn write(&self, path: Option<&Path>) -> Result<()> {
        let data = self.to_json()?;
        match path {
            Some(path) => std::fs::write(path, data).map_err(|source| AnnotateError::Io {
                path: path.to_path_buf(),
                source,
            })?,
            None => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{data}").map_err(|source| AnnotateError::Io {
                    path: "<stdout>".into(),
                    source,
                })?;
            }
        }
        tracing::info!(
            image_id = %self.image_id,
            boxes = self.boxes.len(),
            entire_image = self.entire_image,
            delete = self.delete,
            "submission written"
        );
        Ok(())
    }
}
