use glam::IVec2;

/// Map queries and the fire-visibility flag the line-of-fire computations
/// need from the game world.
pub trait Terrain {
    /// Grid is inside the map.
    fn in_bounds(&self, p: IVec2) -> bool;

    /// Grid is inside the map and not part of its permanent outer wall.
    fn in_bounds_fully(&self, p: IVec2) -> bool;

    /// Lines of fire and projectiles can pass through the grid.
    fn is_projectable(&self, p: IVec2) -> bool;

    /// The player has seen the grid.
    fn is_known(&self, p: IVec2) -> bool;

    /// Grid is a pit that hides everything beyond its rim from anyone
    /// standing in it.
    fn is_pit(&self, _p: IVec2) -> bool {
        false
    }

    /// A monster or the player stands in the grid.
    fn is_occupied(&self, p: IVec2) -> bool;

    fn is_fire_visible(&self, p: IVec2) -> bool;

    fn set_fire_visible(&mut self, p: IVec2, is_visible: bool);
}
