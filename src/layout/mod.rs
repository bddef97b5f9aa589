//! Geometry of the hierarchy: which way children run, where new children go,
//! and which anchor an edge attaches to.

mod placement;
mod resolve;
mod routing;
pub(crate) mod types;

pub use placement::{
    append_after_existing_siblings, append_anchor, append_to_siblings, compute_child_positions,
    compute_child_positions_sized,
};
pub use resolve::{
    LayoutSource, detect_layout_from_geometry, resolve_layout, resolve_layout_with_source,
};
pub use routing::{
    Orientation, connection_point, determine_sides, pick_connection_site,
};
pub use types::*;
