use glam::{ivec2, IVec2};
use util::{AsciiMap, HashSet};

use crate::Terrain;

/// Minimal terrain for exercising the line-of-fire code.
///
/// Map legend: `#` wall, `?` wall the player hasn't seen, `.` floor, `^`
/// pit, `M` monster on floor, `@` origin on floor.
#[derive(Clone, Default, Debug)]
pub struct TestMap {
    pub size: IVec2,
    pub walls: HashSet<IVec2>,
    pub unknown: HashSet<IVec2>,
    pub pits: HashSet<IVec2>,
    pub occupied: HashSet<IVec2>,
    pub fire: HashSet<IVec2>,
    pub origin: Option<IVec2>,
}

impl TestMap {
    /// Empty square room with a wall border.
    pub fn open(size: i32) -> Self {
        let mut ret = TestMap {
            size: ivec2(size, size),
            ..Default::default()
        };
        for y in 0..size {
            for x in 0..size {
                if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                    ret.walls.insert(ivec2(x, y));
                }
            }
        }
        ret
    }

    pub fn parse(map: &str) -> Self {
        let map = AsciiMap::new(map);
        let mut ret = TestMap {
            size: map.size(),
            ..Default::default()
        };

        for (p, c) in map.iter() {
            match c {
                '#' => {
                    ret.walls.insert(p);
                }
                '?' => {
                    ret.walls.insert(p);
                    ret.unknown.insert(p);
                }
                '^' => {
                    ret.pits.insert(p);
                }
                'M' => {
                    ret.occupied.insert(p);
                }
                '@' => ret.origin = Some(p),
                '.' => {}
                _ => panic!("bad test map char {c:?}"),
            }
        }
        ret
    }

    /// Fire-visible grids drawn as `*` over the map.
    pub fn show_fire(&self) -> String {
        let mut ret = String::new();
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let p = ivec2(x, y);
                ret.push(if Some(p) == self.origin {
                    '@'
                } else if self.fire.contains(&p) {
                    '*'
                } else if self.walls.contains(&p) {
                    '#'
                } else {
                    '.'
                });
            }
            ret.push('\n');
        }
        ret
    }
}

impl Terrain for TestMap {
    fn in_bounds(&self, p: IVec2) -> bool {
        p.cmpge(IVec2::ZERO).all() && p.cmplt(self.size).all()
    }

    fn in_bounds_fully(&self, p: IVec2) -> bool {
        p.cmpgt(IVec2::ZERO).all() && p.cmplt(self.size - 1).all()
    }

    fn is_projectable(&self, p: IVec2) -> bool {
        !self.walls.contains(&p)
    }

    fn is_known(&self, p: IVec2) -> bool {
        !self.unknown.contains(&p)
    }

    fn is_pit(&self, p: IVec2) -> bool {
        self.pits.contains(&p)
    }

    fn is_occupied(&self, p: IVec2) -> bool {
        self.occupied.contains(&p)
    }

    fn is_fire_visible(&self, p: IVec2) -> bool {
        self.fire.contains(&p)
    }

    fn set_fire_visible(&mut self, p: IVec2, is_visible: bool) {
        if is_visible {
            self.fire.insert(p);
        } else {
            self.fire.remove(&p);
        }
    }
}
