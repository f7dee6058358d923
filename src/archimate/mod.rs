mod geometry;
mod model;
mod render;
mod types;

pub use geometry::{
    build_diagram, build_diagrams, canvas_size, collect_connectors, connection_points,
    extract_tree, flatten, is_diagram_view, read_bounds, resolve_segments,
};
pub use model::extract_model;
pub use render::{DiagramStyle, render_diagram_svg};
pub use types::*;
