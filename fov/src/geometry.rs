use std::{cmp::Ordering, fmt, ops, sync::LazyLock};

use glam::{ivec2, IVec2};
use util::{HashMap, VecExt};

use crate::MAX_SIGHT;

/// Fixed-point scale of slope values.
pub const SCALE: i64 = 100_000;

/// Number of grids in one octant of a `MAX_SIGHT` disk.
const MAX_SIGHT_GRIDS: usize = 161;

/// Number of distinct corner slopes in one octant of a `MAX_SIGHT` disk.
const MAX_SIGHT_SLOPES: usize = 126;

/// Set of line-of-sight slope indices.
///
/// Slope index `i` is bit `i`, so the table can hold at most 128 slopes.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SlopeSet(u128);

impl SlopeSet {
    pub const EMPTY: SlopeSet = SlopeSet(0);

    /// Set with the first `n` slopes.
    pub fn full(n: usize) -> Self {
        assert!(n <= 128, "SlopeSet: too many slopes");
        if n == 128 {
            SlopeSet(u128::MAX)
        } else {
            SlopeSet((1 << n) - 1)
        }
    }

    pub fn contains(self, i: usize) -> bool {
        i < 128 && self.0 & (1 << i) != 0
    }

    pub fn insert(&mut self, i: usize) {
        assert!(i < 128, "SlopeSet: index out of range");
        self.0 |= 1 << i;
    }

    /// Remove every slope in `other` from this set.
    pub fn remove_all(&mut self, other: SlopeSet) {
        self.0 &= !other.0;
    }

    pub fn intersects(self, other: SlopeSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate slope indices in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..128).filter(move |&i| self.contains(i))
    }
}

impl ops::BitOr for SlopeSet {
    type Output = SlopeSet;

    fn bitor(self, rhs: SlopeSet) -> SlopeSet {
        SlopeSet(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for SlopeSet {
    fn bitor_assign(&mut self, rhs: SlopeSet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<usize> for SlopeSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut ret = SlopeSet::EMPTY;
        for i in iter {
            ret.insert(i);
        }
        ret
    }
}

impl fmt::Debug for SlopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlopeSet({:#034x})", self.0)
    }
}

/// Precomputed slopes that stand in for the line of fire from the origin to
/// the center of a grid.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FireSlope {
    /// The line of fire is one of the table slopes.
    Exact(usize),
    /// The line of fire falls between two table slopes, nearest below and
    /// nearest above.
    Bracket(usize, usize),
}

impl FireSlope {
    pub fn indices(self) -> impl Iterator<Item = usize> {
        match self {
            FireSlope::Exact(a) => [Some(a), None],
            FireSlope::Bracket(a, b) => [Some(a), Some(b)],
        }
        .into_iter()
        .flatten()
    }

    /// Some line of fire to the grid is still in the unobstructed set.
    pub fn is_open(self, open: SlopeSet) -> bool {
        match self {
            FireSlope::Exact(a) => open.contains(a),
            FireSlope::Bracket(a, b) => {
                open.contains(a) || (a != b && open.contains(b))
            }
        }
    }

    /// Some still unobstructed line of fire passes through a grid with the
    /// given line-of-sight slopes.
    pub fn crosses(self, open: SlopeSet, los: SlopeSet) -> bool {
        self.indices().any(|i| open.contains(i) && los.contains(i))
    }
}

/// A grid in the canonical octant of the geometry table.
#[derive(Clone, Debug)]
pub struct GeometryNode {
    /// Position in the canonical octant, `0 <= y <= x`.
    pub pos: IVec2,
    /// Position of this grid relative to the origin in each of the 8
    /// octants.
    pub offsets: [IVec2; 8],
    /// Lines of sight that pass through the interior of the grid.
    pub los: SlopeSet,
    /// Line of fire from the origin to the center of the grid. `None` for
    /// the origin.
    pub fire: Option<FireSlope>,
    /// Next grid further along the major axis.
    pub straight: Option<usize>,
    /// Next grid along the diagonal.
    ///
    /// On the main diagonal, both children are the diagonal grid.
    pub diagonal: Option<usize>,
    /// Game distance from the origin.
    pub dist: i32,
    /// Radius of the grid if it lies on an axis or the main diagonal, 0
    /// otherwise.
    pub ring: i32,
}

impl GeometryNode {
    fn new(pos: IVec2) -> Self {
        let IVec2 { x, y } = pos;
        let ring = if y == 0 || y == x { x } else { 0 };
        GeometryNode {
            pos,
            offsets: [
                ivec2(x, y),
                ivec2(y, x),
                ivec2(-y, x),
                ivec2(-x, y),
                ivec2(-x, -y),
                ivec2(-y, -x),
                ivec2(y, -x),
                ivec2(x, -y),
            ],
            los: SlopeSet::EMPTY,
            fire: None,
            straight: None,
            diagonal: None,
            dist: pos.approx_len(),
            ring,
        }
    }

    /// Child nodes of this grid in the propagation order.
    pub fn children(&self) -> impl Iterator<Item = usize> {
        [self.straight, self.diagonal].into_iter().flatten()
    }
}

/// Line-of-sight geometry of one octant of a disk.
///
/// The table lists every grid in the octant `0 <= y <= x` within the table
/// radius in breadth-first order from the origin, together with the
/// precomputed slopes that cross each grid. The other seven octants are
/// served by reflecting the same nodes.
#[derive(Clone, Debug)]
pub struct GeometryTable {
    radius: i32,
    slopes: Vec<i64>,
    nodes: Vec<GeometryNode>,
}

impl GeometryTable {
    /// Shared table for `MAX_SIGHT`, built on first use.
    pub fn get() -> &'static GeometryTable {
        static TABLE: LazyLock<GeometryTable> =
            LazyLock::new(|| GeometryTable::new(MAX_SIGHT));
        &TABLE
    }

    /// Build the table for the given radius.
    ///
    /// Panics if the table comes out malformed. A `MAX_SIGHT` table must
    /// have exactly the grid and slope counts the rest of the game is sized
    /// for.
    pub fn new(radius: i32) -> Self {
        assert!(radius > 0, "GeometryTable: radius must be positive");

        // Corner slopes of each grid, lower and upper bounds.
        let mut spans: HashMap<IVec2, (i64, i64)> = Default::default();
        let mut slopes = Vec::new();

        for y in 0..=radius {
            for x in y..=radius {
                let pos = ivec2(x, y);
                if pos.approx_len() > radius {
                    continue;
                }

                let (x, y) = (x as i64, y as i64);
                let mut span = (i64::MAX, i64::MIN);
                let corners = [(-500, 500), (-500, -500), (500, 500), (500, -500)];
                for (dy, dx) in corners {
                    let m = SCALE * (1000 * y + dy) / (1000 * x + dx);
                    if m > 0 && m <= SCALE && !slopes.contains(&m) {
                        slopes.push(m);
                    }
                    span = (span.0.min(m), span.1.max(m));
                }
                spans.insert(pos, span);
            }
        }

        assert!(
            slopes.len() <= 128,
            "GeometryTable: too many LOS slopes ({}) for radius {radius}",
            slopes.len()
        );
        if radius == MAX_SIGHT {
            assert_eq!(
                spans.len(),
                MAX_SIGHT_GRIDS,
                "GeometryTable: wrong number of grids"
            );
            assert_eq!(
                slopes.len(),
                MAX_SIGHT_SLOPES,
                "GeometryTable: wrong number of LOS slopes"
            );
        }

        slopes.sort_unstable();

        let mut nodes = vec![GeometryNode::new(IVec2::ZERO)];
        let mut i = 0;
        while i < nodes.len() {
            let pos = nodes[i].pos;

            let mut children = [None; 2];
            for (k, child) in [pos + ivec2(1, 0), pos + ivec2(1, 1)]
                .into_iter()
                .enumerate()
            {
                if child.approx_len() > radius {
                    continue;
                }
                // Neighboring parents share children, the previous parent
                // has already queued it if so.
                if nodes.last().map(|n| n.pos) != Some(child) {
                    nodes.push(GeometryNode::new(child));
                }
                children[k] = Some(nodes.len() - 1);
            }
            if pos.x == pos.y {
                children[0] = children[1];
            }

            let node = &mut nodes[i];
            [node.straight, node.diagonal] = children;

            if i > 0 {
                let (lo, hi) = spans[&pos];
                node.los = slopes
                    .iter()
                    .enumerate()
                    .filter(|&(_, &m)| lo < m && m < hi)
                    .map(|(j, _)| j)
                    .collect();
                node.fire = Some(fire_slope(&slopes, node.los, pos));
            }

            i += 1;
        }

        debug_assert_eq!(nodes.len(), spans.len());

        let ret = GeometryTable {
            radius,
            slopes,
            nodes,
        };

        // The two grids next to the origin must see every slope between
        // them, or some lines of sight could never be propagated.
        assert_eq!(
            ret.nodes[1].los | ret.nodes[2].los,
            ret.all_slopes(),
            "GeometryTable: incorrect bit masks"
        );

        log::debug!(
            "GeometryTable: {} grids, {} slopes for radius {radius}",
            ret.nodes.len(),
            ret.slopes.len()
        );

        ret
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Sorted slope values, scaled by `SCALE`.
    pub fn slopes(&self) -> &[i64] {
        &self.slopes
    }

    pub fn nodes(&self) -> &[GeometryNode] {
        &self.nodes
    }

    /// Set of every slope in the table.
    pub fn all_slopes(&self) -> SlopeSet {
        SlopeSet::full(self.slopes.len())
    }

    /// Octant a displacement from the origin falls into.
    ///
    /// Displacements with equal axis lengths count as horizontal-major.
    /// Returns `None` for the zero vector.
    pub fn octant_of(d: IVec2) -> Option<usize> {
        let (ax, ay) = (d.x.abs(), d.y.abs());
        Some(if ax >= ay {
            match (d.x.cmp(&0), d.y >= 0) {
                (Ordering::Equal, _) => return None,
                (Ordering::Greater, true) => 0,
                (Ordering::Greater, false) => 7,
                (Ordering::Less, true) => 3,
                (Ordering::Less, false) => 4,
            }
        } else if d.y > 0 {
            if d.x >= 0 {
                1
            } else {
                2
            }
        } else if d.x >= 0 {
            6
        } else {
            5
        })
    }

    /// Find the node at the given displacement in an octant.
    pub fn find(&self, octant: usize, d: IVec2) -> Option<&GeometryNode> {
        self.nodes.iter().find(|n| n.offsets[octant] == d)
    }
}

/// Pick the table slopes that approximate the line of fire to a grid.
fn fire_slope(slopes: &[i64], los: SlopeSet, pos: IVec2) -> FireSlope {
    let m = if pos.x == 0 {
        SCALE
    } else {
        SCALE * pos.y as i64 / pos.x as i64
    };

    let (mut below, mut above) = (None, None);
    for i in los.iter() {
        match slopes[i].cmp(&m) {
            Ordering::Equal => return FireSlope::Exact(i),
            Ordering::Less => below = Some(i),
            Ordering::Greater => {
                above.get_or_insert(i);
            }
        }
    }

    match (below, above) {
        (Some(a), Some(b)) => FireSlope::Bracket(a, b),
        // Grids on the major axis have no table slope below the line.
        (Some(a), None) | (None, Some(a)) => FireSlope::Exact(a),
        (None, None) => panic!("GeometryTable: no LOS slopes at {pos}"),
    }
}
