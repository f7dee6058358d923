//! Error type shared by every stage of the viewer.
//!
//! Missing or dangling data inside a model (bounds-less diagram objects,
//! unresolved connector endpoints, unknown element ids) is never an error;
//! those cases are handled where they occur. This type covers the failures
//! that stop a file from being viewed at all.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed document: {0}")]
    Structure(String),

    #[error("theme error: {0}")]
    Theme(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("no diagram view named '{0}'")]
    DiagramNotFound(String),

    #[error("{0} contains no diagram views")]
    NoDiagrams(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
