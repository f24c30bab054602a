use engine::{Runtime, Terrain};
use glam::{ivec2, IVec2};
use util::HashSet;

/// Draw the cave with `f` overriding the chars of some grids.
fn draw(rt: &Runtime, f: impl Fn(IVec2) -> Option<char>) -> String {
    let cave = rt.cave();
    let mut ret = String::new();
    for (y, line) in cave.render().lines().enumerate() {
        for (x, c) in line.chars().enumerate() {
            ret.push(f(ivec2(x as i32, y as i32)).unwrap_or(c));
        }
        ret.push('\n');
    }
    ret
}

/// Open grids in line of fire as `*`.
pub fn fire(rt: &Runtime) -> String {
    let cave = rt.cave();
    draw(rt, |p| {
        (rt.is_fire_visible(p)
            && cave.is_projectable(p)
            && !cave.is_occupied(p))
        .then_some('*')
    })
}

/// Missile path grids as `*`.
pub fn path(rt: &Runtime, grids: &[IVec2]) -> String {
    let grids: HashSet<IVec2> = grids.iter().copied().collect();
    draw(rt, |p| grids.contains(&p).then_some('*'))
}
