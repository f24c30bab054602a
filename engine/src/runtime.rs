use anyhow::bail;
use fov::{
    trace_path, FireView, GeometryTable, PathRequest, ProjectFlags,
    ProjectPath, Terrain, Viewer,
};
use glam::IVec2;

use crate::{Cave, MAX_RANGE};

/// Main data container for the engine runtime.
///
/// Keeps the player's line of fire current as the player moves.
pub struct Runtime {
    cave: Cave,
    viewer: Viewer,
    fire: FireView,
    table: &'static GeometryTable,
}

impl Runtime {
    /// Start a runtime on a cave that has the player placed in it.
    pub fn new(cave: Cave) -> anyhow::Result<Self> {
        let Some(pos) = cave.player() else {
            bail!("Runtime::new: cave has no player");
        };
        if !cave.in_bounds_fully(pos) {
            bail!("Runtime::new: player at {pos} is outside the cave");
        }

        let mut ret = Runtime {
            cave,
            viewer: Viewer::new(pos),
            fire: Default::default(),
            table: GeometryTable::get(),
        };
        ret.update_fire();
        Ok(ret)
    }

    pub fn from_ascii(map: &str) -> anyhow::Result<Self> {
        Runtime::new(Cave::from_ascii(map)?)
    }

    pub fn cave(&self) -> &Cave {
        &self.cave
    }

    /// Edit the cave.
    ///
    /// Call [`Runtime::update_fire`] afterwards if the change is in the
    /// player's view.
    pub fn cave_mut(&mut self) -> &mut Cave {
        &mut self.cave
    }

    pub fn player(&self) -> IVec2 {
        self.viewer.pos
    }

    pub fn is_leaping(&self) -> bool {
        self.viewer.leaping
    }

    /// Recompute the player's line of fire.
    ///
    /// Every grid the player can fire at also becomes known.
    pub fn update_fire(&mut self) {
        self.fire.update(self.table, &mut self.cave, &self.viewer);
        for &p in self.fire.visible() {
            self.cave.mark_known(p);
        }
    }

    /// Move the player to a new grid and update the line of fire.
    ///
    /// Fails if the grid is outside the cave, a wall or has a monster in it.
    pub fn move_player(&mut self, pos: IVec2) -> anyhow::Result<()> {
        if !self.cave.in_bounds_fully(pos) {
            bail!("Runtime::move_player: {pos} is outside the cave");
        }
        if self.cave.feat(pos).is_some_and(|f| f.is_wall()) {
            bail!("Runtime::move_player: {pos} is a wall");
        }
        if pos != self.viewer.pos && self.cave.is_occupied(pos) {
            bail!("Runtime::move_player: {pos} is occupied");
        }

        self.viewer.pos = pos;
        self.cave.set_player(pos);
        self.update_fire();
        Ok(())
    }

    /// Start or end a leap, leaping players see out of pits.
    pub fn set_leaping(&mut self, leaping: bool) {
        if self.viewer.leaping != leaping {
            self.viewer.leaping = leaping;
            self.update_fire();
        }
    }

    pub fn is_fire_visible(&self, p: IVec2) -> bool {
        self.cave.is_fire_visible(p)
    }

    /// Grids in the player's line of fire, player's own grid first.
    pub fn fire_view(&self) -> &[IVec2] {
        self.fire.visible()
    }

    /// Path of a missile the player fires at `target`.
    pub fn project_path(
        &self,
        target: IVec2,
        flags: ProjectFlags,
    ) -> ProjectPath {
        let req = PathRequest::new(self.viewer.pos, target, MAX_RANGE)
            .with_flags(flags)
            .ignoring(self.viewer.pos);
        trace_path(self.table, &self.cave, &req)
    }

    /// Path of a missile fired by someone else, such as a monster.
    pub fn project_path_from(&self, req: &PathRequest) -> ProjectPath {
        trace_path(self.table, &self.cave, req)
    }

    /// A missile from `start` would reach `end`.
    pub fn projectable(
        &self,
        start: IVec2,
        end: IVec2,
        flags: ProjectFlags,
    ) -> bool {
        fov::projectable(self.table, &self.cave, start, end, flags)
    }
}
