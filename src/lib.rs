pub mod app;
pub mod area;
pub mod drag_select;
pub mod error;
pub mod form;
pub mod geometry;
pub mod handle;
pub mod options;
pub mod selector;

pub use error::{AnnotateError, Result};
