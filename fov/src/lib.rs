//! Line-of-fire computation over a precomputed octant geometry table.

/// How far lines of fire reach.
pub const MAX_SIGHT: i32 = 20;

mod fire;
pub use fire::{confinement, FireView, Viewer};

mod geometry;
pub use geometry::{FireSlope, GeometryNode, GeometryTable, SlopeSet, SCALE};

mod path;
pub use path::{
    projectable, trace_path, Blockage, PathRequest, ProjectFlags, ProjectPath,
};

mod terrain;
pub use terrain::Terrain;

#[cfg(test)]
mod test_map;
