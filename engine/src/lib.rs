//! Cave terrain and player state on top of the line-of-fire machinery.

pub use fov::{
    Blockage, PathRequest, ProjectFlags, ProjectPath, Terrain, MAX_SIGHT,
};

/// How far missiles can be fired.
pub const MAX_RANGE: i32 = 20;

mod cave;
pub use cave::{Cave, SquareInfo};

mod feat;
pub use feat::Feat;

mod runtime;
pub use runtime::Runtime;
