use bitflags::bitflags;
use glam::{ivec2, IVec2};
use util::{scale_round, VecExt};

use crate::{GeometryTable, Terrain};

bitflags! {
    /// Behavior switches for projectile paths.
    #[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
    pub struct ProjectFlags: u8 {
        /// End the path at the first occupied grid.
        const STOP_AT_MONSTER = 1 << 0;
        /// Continue through occupied grids but report being blocked.
        const NOTE_MONSTER_BLOCK = 1 << 1;
        /// Keep going past the target until range or an obstruction.
        const EXTEND_PAST_TARGET = 1 << 2;
        /// Walls don't stop the path.
        const PASS_THROUGH_WALLS = 1 << 3;
        /// Walls the player hasn't seen don't stop the path.
        const IGNORE_UNKNOWN_WALLS = 1 << 4;
        /// Don't pull targets beyond sight range in, such targets have no
        /// line of fire.
        const LEAVE_SIGHT_RANGE = 1 << 5;
    }
}

/// How badly a grid obstructs a projectile, from least to worst.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum Blockage {
    Clear,
    /// Someone is standing in the grid.
    Monster,
    /// Wall, the permanent map edge or off the map.
    Wall,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PathRequest {
    pub start: IVec2,
    pub end: IVec2,
    /// Maximum number of grids in the path.
    pub range: i32,
    pub flags: ProjectFlags,
    /// Occupant of this grid never blocks, usually whoever is shooting.
    pub ignore: Option<IVec2>,
}

impl PathRequest {
    pub fn new(
        start: impl Into<IVec2>,
        end: impl Into<IVec2>,
        range: i32,
    ) -> Self {
        PathRequest {
            start: start.into(),
            end: end.into(),
            range,
            flags: Default::default(),
            ignore: None,
        }
    }

    pub fn with_flags(mut self, flags: ProjectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn ignoring(mut self, p: impl Into<IVec2>) -> Self {
        self.ignore = Some(p.into());
        self
    }
}

/// Grids a projectile passes through.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct ProjectPath {
    /// Grids in travel order, not including the starting grid.
    pub grids: Vec<IVec2>,
    /// An occupied grid before the end of the path was passed through.
    ///
    /// Only reported with `NOTE_MONSTER_BLOCK`.
    pub blocked_by_monster: bool,
    /// Where the projectile was aimed, or where it came to rest if it stops
    /// short of the target.
    pub end: IVec2,
}

impl ProjectPath {
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn last(&self) -> Option<IVec2> {
        self.grids.last().copied()
    }
}

struct Tracer<'a, T> {
    terrain: &'a T,
    req: &'a PathRequest,
}

impl<T: Terrain> Tracer<'_, T> {
    /// Grid stops projectiles.
    fn is_wall(&self, p: IVec2) -> bool {
        let flags = self.req.flags;
        if flags.contains(ProjectFlags::PASS_THROUGH_WALLS)
            || self.terrain.is_projectable(p)
        {
            return false;
        }
        !(flags.contains(ProjectFlags::IGNORE_UNKNOWN_WALLS)
            && !self.terrain.is_known(p))
    }

    fn blockage(&self, p: IVec2) -> Blockage {
        if !self.terrain.in_bounds_fully(p) || self.is_wall(p) {
            Blockage::Wall
        } else if self.terrain.is_occupied(p) && self.req.ignore != Some(p) {
            Blockage::Monster
        } else {
            Blockage::Clear
        }
    }
}

/// Find the path of a projectile from `req.start` towards `req.end`.
///
/// Targets further away than the table radius are pulled in along the same
/// direction unless `LEAVE_SIGHT_RANGE` is set. The path is empty if the start and end are the same, the range
/// is not positive, or there is no line of fire towards the end at all.
///
/// Walls and the map edge stop the path before the obstructing grid.
pub fn trace_path(
    table: &GeometryTable,
    terrain: &impl Terrain,
    req: &PathRequest,
) -> ProjectPath {
    let mut ret = ProjectPath {
        end: req.end,
        ..Default::default()
    };

    if req.start == req.end || req.range <= 0 {
        return ret;
    }

    let mut d = req.end - req.start;
    let dist = d.approx_len();
    if dist > table.radius()
        && !req.flags.contains(ProjectFlags::LEAVE_SIGHT_RANGE)
    {
        let r = table.radius() - 1;
        d = ivec2(scale_round(d.x, r, dist), scale_round(d.y, r, dist));
        ret.end = req.start + d;
    }

    let Some(octant) = GeometryTable::octant_of(d) else {
        return ret;
    };
    let Some(fire) = table.find(octant, d).and_then(|n| n.fire) else {
        return ret;
    };

    let tracer = Tracer { terrain, req };

    // Grids on the still open lines of fire, tagged with their distance
    // along the major axis. Table order keeps them sorted by it.
    let mut candidates: Vec<(i32, IVec2)> = Vec::new();
    let mut open = table.all_slopes();
    for node in &table.nodes()[1..] {
        let p = req.start + node.offsets[octant];
        if !node.los.intersects(open) || !terrain.in_bounds(p) {
            continue;
        }

        if fire.crosses(open, node.los) {
            if let Some(&(_, prev)) = candidates.last() {
                // The two bracketing lines have diverged.
                if !(p - prev).is_adjacent() {
                    break;
                }
            }
            candidates.push((node.pos.x, p));
        }

        if tracer.is_wall(p) {
            open.remove_all(node.los);
        }
    }

    let mut pos = req.start;
    let mut rest = &candidates[..];
    while let Some(&(step, _)) = rest.first() {
        let n = rest.iter().take_while(|(s, _)| *s == step).count();
        let (group, tail) = rest.split_at(n);
        rest = tail;

        let mut choices = group
            .iter()
            .map(|&(_, p)| p)
            .filter(|&p| (p - pos).is_adjacent());

        // Prefer the first grid, it's the one closer to the major axis.
        let next = match (choices.next(), choices.next()) {
            (Some(a), Some(b))
                if tracer.blockage(a) > tracer.blockage(b) =>
            {
                b
            }
            (Some(a), _) => a,
            (None, _) => break,
        };

        if tracer.blockage(next) == Blockage::Wall {
            break;
        }

        ret.grids.push(next);
        pos = next;

        if ret.grids.len() >= req.range as usize {
            break;
        }

        if tracer.blockage(next) == Blockage::Monster
            && req.flags.contains(ProjectFlags::STOP_AT_MONSTER)
        {
            break;
        }

        if !req.flags.contains(ProjectFlags::EXTEND_PAST_TARGET)
            && next == ret.end
        {
            break;
        }
    }

    // A monster at the target is what's being shot at, any other one is in
    // the way.
    let target = ret.end;
    ret.blocked_by_monster =
        req.flags.contains(ProjectFlags::NOTE_MONSTER_BLOCK)
            && ret.grids.iter().any(|&p| {
                p != target && tracer.blockage(p) == Blockage::Monster
            });

    if !req.flags.contains(ProjectFlags::EXTEND_PAST_TARGET) {
        if let Some(p) = ret.last() {
            ret.end = p;
        }
    }

    ret
}

/// A projectile from `start` would reach `end`.
pub fn projectable(
    table: &GeometryTable,
    terrain: &impl Terrain,
    start: impl Into<IVec2>,
    end: impl Into<IVec2>,
    flags: ProjectFlags,
) -> bool {
    let end = end.into();
    let req = PathRequest::new(start, end, table.radius())
        .with_flags(flags - ProjectFlags::EXTEND_PAST_TARGET);
    trace_path(table, terrain, &req).last() == Some(end)
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;
    use util::distance;

    use super::*;
    use crate::{test_map::TestMap, MAX_SIGHT};

    fn trace(map: &TestMap, req: PathRequest) -> ProjectPath {
        trace_path(GeometryTable::get(), map, &req)
    }

    fn row(xs: impl IntoIterator<Item = i32>, y: i32) -> Vec<IVec2> {
        xs.into_iter().map(|x| ivec2(x, y)).collect()
    }

    #[test]
    fn straight_shot() {
        let map = TestMap::open(40);
        let path = trace(&map, PathRequest::new([10, 10], [20, 10], 15));
        assert_eq!(path.grids, row(11..=20, 10));
        assert_eq!(path.end, ivec2(20, 10));
        assert!(!path.blocked_by_monster);
    }

    #[test]
    fn wall_stops_shot() {
        let mut map = TestMap::open(40);
        map.walls.insert(ivec2(15, 10));

        let path = trace(&map, PathRequest::new([10, 10], [20, 10], 15));
        assert_eq!(path.grids, row(11..=14, 10));
        assert_eq!(path.end, ivec2(14, 10));

        let path = trace(
            &map,
            PathRequest::new([10, 10], [20, 10], 15)
                .with_flags(ProjectFlags::PASS_THROUGH_WALLS),
        );
        assert_eq!(path.grids, row(11..=20, 10));
    }

    #[test]
    fn no_path_to_self() {
        let map = TestMap::open(40);
        for flags in [ProjectFlags::empty(), ProjectFlags::all()] {
            let path = trace(
                &map,
                PathRequest::new([10, 10], [10, 10], 15).with_flags(flags),
            );
            assert!(path.is_empty());
            assert_eq!(path.end, ivec2(10, 10));
        }

        let path = trace(&map, PathRequest::new([10, 10], [20, 10], 0));
        assert!(path.is_empty());
    }

    #[test]
    fn monsters() {
        let mut map = TestMap::open(40);
        map.occupied.insert(ivec2(13, 10));

        let req = PathRequest::new([10, 10], [20, 10], 15);

        let path = trace(
            &map,
            req.with_flags(ProjectFlags::STOP_AT_MONSTER),
        );
        assert_eq!(path.grids, row(11..=13, 10));
        assert_eq!(path.end, ivec2(13, 10));
        assert!(!path.blocked_by_monster);

        let path = trace(
            &map,
            req.with_flags(ProjectFlags::NOTE_MONSTER_BLOCK),
        );
        assert_eq!(path.grids, row(11..=20, 10));
        assert!(path.blocked_by_monster);

        // Shots that come to rest on a monster short of the target are
        // blocked by it too.
        let path = trace(
            &map,
            req.with_flags(
                ProjectFlags::STOP_AT_MONSTER
                    | ProjectFlags::NOTE_MONSTER_BLOCK,
            ),
        );
        assert_eq!(path.grids, row(11..=13, 10));
        assert!(path.blocked_by_monster);

        let path = trace(
            &map,
            PathRequest::new([10, 10], [20, 10], 3)
                .with_flags(ProjectFlags::NOTE_MONSTER_BLOCK),
        );
        assert_eq!(path.grids, row(11..=13, 10));
        assert_eq!(path.end, ivec2(13, 10));
        assert!(path.blocked_by_monster);

        // Plain paths go through monsters without comment.
        let path = trace(&map, req);
        assert_eq!(path.len(), 10);
        assert!(!path.blocked_by_monster);

        // Monster at the target is what's being shot at.
        let path = trace(
            &map,
            PathRequest::new([10, 10], [13, 10], 15)
                .with_flags(ProjectFlags::NOTE_MONSTER_BLOCK),
        );
        assert_eq!(path.grids, row(11..=13, 10));
        assert!(!path.blocked_by_monster);

        // The ignored occupant doesn't stop the shot.
        let path = trace(
            &map,
            req.with_flags(ProjectFlags::STOP_AT_MONSTER)
                .ignoring([13, 10]),
        );
        assert_eq!(path.grids, row(11..=20, 10));
    }

    #[test]
    fn slanted_shot() {
        let map = TestMap::open(40);
        let req = PathRequest::new([10, 10], [17, 13], 15);

        let path = trace(&map, req);
        assert_eq!(
            path.grids,
            vec![
                ivec2(11, 10),
                ivec2(12, 11),
                ivec2(13, 11),
                ivec2(14, 12),
                ivec2(15, 12),
                ivec2(16, 12),
                ivec2(17, 13),
            ]
        );

        let path =
            trace(&map, req.with_flags(ProjectFlags::EXTEND_PAST_TARGET));
        assert_eq!(path.len(), 15);
        assert_eq!(path.grids[6], ivec2(17, 13));
        assert_eq!(path.last(), Some(ivec2(25, 16)));
        assert_eq!(path.end, ivec2(17, 13));
    }

    #[test]
    fn side_step_around_monster() {
        // First step can go to either (11, 10) or (11, 11), and the step at
        // x = 16 to either (16, 12) or (16, 13).
        let mut map = TestMap::open(40);
        let req = PathRequest::new([10, 10], [17, 13], 15)
            .with_flags(ProjectFlags::STOP_AT_MONSTER);
        assert_eq!(trace(&map, req).grids[0], ivec2(11, 10));

        map.occupied.insert(ivec2(11, 10));
        let path = trace(&map, req);
        assert_eq!(path.grids[0], ivec2(11, 11));
        assert_eq!(path.last(), Some(ivec2(17, 13)));

        // Equally blocked choices go with the first one.
        map.occupied.insert(ivec2(16, 12));
        map.occupied.insert(ivec2(16, 13));
        let path = trace(&map, req);
        assert_eq!(path.last(), Some(ivec2(16, 12)));
        assert_eq!(path.end, ivec2(16, 12));
    }

    #[test]
    fn distant_target() {
        let map = TestMap::open(60);
        let path = trace(&map, PathRequest::new([5, 5], [45, 25], 40));
        assert_eq!(path.end, ivec2(20, 13));
        assert_eq!(path.last(), Some(ivec2(20, 13)));
        assert_eq!(path.len(), 15);
    }

    #[test]
    fn leaving_sight_range() {
        let map = TestMap::open(60);
        let req = PathRequest::new([5, 5], [45, 25], 40)
            .with_flags(ProjectFlags::LEAVE_SIGHT_RANGE);
        let path = trace(&map, req);
        assert!(path.is_empty());
        assert_eq!(path.end, ivec2(45, 25));

        // Targets in range are unaffected.
        let near = PathRequest::new([5, 5], [20, 13], 40);
        assert_eq!(
            trace(&map, near.with_flags(ProjectFlags::LEAVE_SIGHT_RANGE)),
            trace(&map, near)
        );
        assert_eq!(trace(&map, near).len(), 15);
    }

    #[test]
    fn off_map_grids_block_like_walls() {
        let map = TestMap::open(20);
        let req = PathRequest::new([10, 10], [12, 10], 20)
            .with_flags(ProjectFlags::PASS_THROUGH_WALLS);
        let tracer = Tracer {
            terrain: &map,
            req: &req,
        };
        assert_eq!(tracer.blockage(ivec2(10, 10)), Blockage::Clear);
        assert_eq!(tracer.blockage(ivec2(19, 10)), Blockage::Wall);
        assert_eq!(tracer.blockage(ivec2(25, 10)), Blockage::Wall);
        assert_eq!(tracer.blockage(ivec2(-1, -1)), Blockage::Wall);
    }

    #[test]
    fn unknown_walls() {
        let map = TestMap::parse(
            "
            ##########
            #@..?....#
            ##########",
        );
        let req = PathRequest::new([1, 1], [8, 1], 20);

        assert_eq!(trace(&map, req).grids, row(2..=3, 1));
        assert_eq!(
            trace(&map, req.with_flags(ProjectFlags::IGNORE_UNKNOWN_WALLS))
                .grids,
            row(2..=8, 1)
        );
    }

    #[test]
    fn map_edge() {
        let map = TestMap::open(20);
        let path = trace(
            &map,
            PathRequest::new([10, 10], [12, 10], 20)
                .with_flags(ProjectFlags::EXTEND_PAST_TARGET),
        );
        assert_eq!(path.grids, row(11..=18, 10));

        let path = trace(
            &map,
            PathRequest::new([10, 10], [12, 10], 20).with_flags(
                ProjectFlags::EXTEND_PAST_TARGET
                    | ProjectFlags::PASS_THROUGH_WALLS,
            ),
        );
        assert_eq!(path.grids, row(11..=18, 10));
    }

    #[test]
    fn open_map_reach() {
        let map = TestMap::open(45);
        let table = GeometryTable::get();
        let start = ivec2(22, 22);
        for y in 1..44 {
            for x in 1..44 {
                let end = ivec2(x, y);
                if end != start && distance(start, end) <= MAX_SIGHT {
                    assert!(
                        projectable(
                            table,
                            &map,
                            start,
                            end,
                            ProjectFlags::empty()
                        ),
                        "{end} not reachable"
                    );
                }
            }
        }
    }

    fn scattered_map(walls: &[(u8, u8)], occupants: &[(u8, u8)]) -> TestMap {
        let mut map = TestMap::open(41);
        for &(x, y) in walls {
            map.walls.insert(ivec2(1 + x as i32 % 39, 1 + y as i32 % 39));
        }
        for &(x, y) in occupants {
            map.occupied.insert(ivec2(1 + x as i32 % 39, 1 + y as i32 % 39));
        }
        map
    }

    #[quickcheck]
    fn path_is_contiguous_and_bounded(
        walls: Vec<(u8, u8)>,
        occupants: Vec<(u8, u8)>,
        ends: ((u8, u8), (i8, i8)),
        range: i8,
        flags: u8,
    ) -> bool {
        let map = scattered_map(&walls, &occupants);
        let ((sx, sy), (ex, ey)) = ends;
        let start = ivec2(1 + sx as i32 % 39, 1 + sy as i32 % 39);
        let end = ivec2(ex as i32, ey as i32);
        let req = PathRequest::new(start, end, range as i32 % 32)
            .with_flags(ProjectFlags::from_bits_truncate(flags));

        let path = trace(&map, req);
        let mut pos = start;
        for &p in &path.grids {
            if !(p - pos).is_adjacent() || !map.in_bounds_fully(p) {
                return false;
            }
            pos = p;
        }
        path.len() <= req.range.max(0) as usize && path == trace(&map, req)
    }
}
