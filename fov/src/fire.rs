use std::collections::VecDeque;

use glam::IVec2;
use util::distance;

use crate::{GeometryTable, Terrain};

/// Where the line of fire is being computed from.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub struct Viewer {
    pub pos: IVec2,
    /// Viewer is in mid-leap and can see out of a pit.
    pub leaping: bool,
}

impl Viewer {
    pub fn new(pos: impl Into<IVec2>) -> Self {
        Viewer {
            pos: pos.into(),
            leaping: false,
        }
    }
}

/// Range limit on what the viewer can see from its current footing.
///
/// Standing in a pit limits the view to the grids right next to it.
pub fn confinement(terrain: &impl Terrain, viewer: &Viewer) -> Option<i32> {
    (terrain.is_pit(viewer.pos) && !viewer.leaping).then_some(1)
}

/// Grids a viewer currently has a line of fire to.
///
/// The grids are flagged fire-visible on the terrain. The view remembers
/// which grids it flagged so the next update can unflag them without
/// scanning the whole map.
#[derive(Clone, Default, Debug)]
pub struct FireView {
    visible: Vec<IVec2>,
}

impl FireView {
    /// Fire-visible grids in the order they were found, viewer first.
    pub fn visible(&self) -> &[IVec2] {
        &self.visible
    }

    /// Unflag every grid this view has flagged.
    pub fn clear(&mut self, terrain: &mut impl Terrain) {
        for p in self.visible.drain(..) {
            terrain.set_fire_visible(p, false);
        }
    }

    /// Recompute the view.
    ///
    /// Must be rerun whenever the viewer moves or terrain in range changes.
    /// The viewer must be in bounds.
    pub fn update(
        &mut self,
        table: &GeometryTable,
        terrain: &mut impl Terrain,
        viewer: &Viewer,
    ) {
        self.clear(terrain);

        let origin = viewer.pos;
        let reach = confinement(terrain, viewer);
        self.mark(terrain, origin);

        let nodes = table.nodes();
        let mut queue = VecDeque::with_capacity(nodes.len());

        for octant in 0..8 {
            // Lines of sight not yet blocked in this octant.
            let mut open = table.all_slopes();

            queue.clear();
            queue.extend([1, 2]);
            let mut last = 2;

            while let Some(i) = queue.pop_front() {
                let node = &nodes[i];
                let p = origin + node.offsets[octant];

                if !node.los.intersects(open) {
                    continue;
                }

                if !terrain.in_bounds_fully(p) {
                    continue;
                }

                if reach.is_some_and(|r| distance(origin, p) > r) {
                    continue;
                }

                if !node.fire.is_some_and(|f| f.is_open(open)) {
                    continue;
                }

                self.mark(terrain, p);

                if !terrain.is_projectable(p) {
                    // Everything behind the grid is in its shadow.
                    open.remove_all(node.los);
                    continue;
                }

                for child in node.children() {
                    if child != last {
                        queue.push_back(child);
                        last = child;
                    }
                }
            }
        }

        log::trace!(
            "FireView: {} grids in line of fire from {origin}",
            self.visible.len()
        );
    }

    fn mark(&mut self, terrain: &mut impl Terrain, p: IVec2) {
        // Grids along the octant edges get visited twice.
        if !terrain.is_fire_visible(p) {
            terrain.set_fire_visible(p, true);
            self.visible.push(p);
        }
    }
}
