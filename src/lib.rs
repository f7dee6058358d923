//! Parse ArchiMate model files and render their diagram views.
//!
//! The pipeline is [`xml::Document::parse`] → [`archimate::extract_model`]
//! and [`archimate::build_diagrams`] → [`archimate::render_diagram_svg`].
//! [`viewer`] wraps it into a per-file operation and [`page`] turns the
//! result into HTML.

pub mod archimate;
pub mod cli;
pub mod error;
pub mod export;
pub mod page;
pub mod theme;
pub mod viewer;
pub mod xml;

pub use error::{Error, Result};
