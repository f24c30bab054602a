use std::fmt;

use anyhow::bail;
use bitflags::bitflags;
use glam::{ivec2, IVec2};
use serde::{Deserialize, Serialize};
use util::{AsciiMap, HashSet};

use crate::Feat;

bitflags! {
    /// Transient per-grid state.
    #[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
    pub struct SquareInfo: u8 {
        /// Player has a line of fire to the grid.
        const FIRE = 1 << 0;
        /// Player has seen the grid.
        const KNOWN = 1 << 1;
    }
}

/// Single dungeon level.
///
/// Serializes as its ASCII map. Square info is not saved.
#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cave {
    size: IVec2,
    feats: Vec<Feat>,
    info: Vec<SquareInfo>,
    monsters: HashSet<IVec2>,
    player: Option<IVec2>,
}

impl Cave {
    /// Empty floor surrounded by permanent wall.
    pub fn new(size: impl Into<IVec2>) -> Self {
        let size = size.into().max(IVec2::ZERO);
        let n = (size.x * size.y) as usize;
        let mut ret = Cave {
            size,
            feats: vec![Feat::Floor; n],
            info: vec![Default::default(); n],
            ..Default::default()
        };

        for y in 0..size.y {
            for x in 0..size.x {
                let p = ivec2(x, y);
                if !ret.in_bounds_fully(p) {
                    ret.set_feat(p, Feat::Permanent);
                }
            }
        }
        ret
    }

    /// Parse a cave from a map drawing.
    ///
    /// Terrain chars are the ones [`Feat`] converts from, `M` is a monster
    /// on floor and `@` is the player on floor.
    pub fn from_ascii(s: &str) -> anyhow::Result<Self> {
        let map = AsciiMap::new(s);
        if !map.is_rectangular() {
            bail!("Cave::from_ascii: map is not rectangular");
        }

        let size = map.size();
        let n = (size.x * size.y) as usize;
        let mut ret = Cave {
            size,
            feats: vec![Feat::Floor; n],
            info: vec![Default::default(); n],
            ..Default::default()
        };

        for (p, c) in map.iter() {
            match c {
                'M' => {
                    ret.monsters.insert(p);
                }
                '@' => {
                    if ret.player.is_some() {
                        bail!("Cave::from_ascii: second player at {p}");
                    }
                    ret.player = Some(p);
                }
                c => match Feat::try_from(c) {
                    Ok(f) => ret.set_feat(p, f),
                    Err(e) => bail!("Cave::from_ascii: {e} {c:?} at {p}"),
                },
            }
        }

        Ok(ret)
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    fn idx(&self, p: IVec2) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y * self.size.x + p.x) as usize)
    }

    pub fn in_bounds(&self, p: IVec2) -> bool {
        p.cmpge(IVec2::ZERO).all() && p.cmplt(self.size).all()
    }

    /// Grid is inside the permanent outer wall.
    pub fn in_bounds_fully(&self, p: IVec2) -> bool {
        p.cmpgt(IVec2::ZERO).all() && p.cmplt(self.size - 1).all()
    }

    /// Feature at grid, `None` if off the map.
    pub fn feat(&self, p: IVec2) -> Option<Feat> {
        self.idx(p).map(|i| self.feats[i])
    }

    pub fn set_feat(&mut self, p: IVec2, f: Feat) {
        if let Some(i) = self.idx(p) {
            self.feats[i] = f;
        } else {
            log::warn!("Cave::set_feat: {p} is off the map");
        }
    }

    pub fn info(&self, p: IVec2) -> SquareInfo {
        self.idx(p).map(|i| self.info[i]).unwrap_or_default()
    }

    pub fn mark_known(&mut self, p: IVec2) {
        if let Some(i) = self.idx(p) {
            self.info[i].insert(SquareInfo::KNOWN);
        }
    }

    pub fn player(&self) -> Option<IVec2> {
        self.player
    }

    /// Put the player in a grid.
    ///
    /// A running [`crate::Runtime`] should move the player with
    /// [`crate::Runtime::move_player`] instead.
    pub fn set_player(&mut self, p: IVec2) {
        self.player = Some(p);
    }

    pub fn monsters(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.monsters.iter().copied()
    }

    /// Put a monster in the grid if there's room for it.
    pub fn place_monster(&mut self, p: IVec2) -> bool {
        if !self.feat(p).is_some_and(|f| !f.is_wall())
            || fov::Terrain::is_occupied(self, p)
        {
            return false;
        }
        self.monsters.insert(p)
    }

    pub fn remove_monster(&mut self, p: IVec2) -> bool {
        self.monsters.remove(&p)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fov::Terrain for Cave {
    fn in_bounds(&self, p: IVec2) -> bool {
        Cave::in_bounds(self, p)
    }

    fn in_bounds_fully(&self, p: IVec2) -> bool {
        Cave::in_bounds_fully(self, p)
    }

    fn is_projectable(&self, p: IVec2) -> bool {
        self.feat(p).is_some_and(Feat::is_projectable)
    }

    fn is_known(&self, p: IVec2) -> bool {
        self.info(p).contains(SquareInfo::KNOWN)
    }

    fn is_pit(&self, p: IVec2) -> bool {
        self.feat(p).is_some_and(Feat::is_pit)
    }

    fn is_occupied(&self, p: IVec2) -> bool {
        self.player == Some(p) || self.monsters.contains(&p)
    }

    fn is_fire_visible(&self, p: IVec2) -> bool {
        self.info(p).contains(SquareInfo::FIRE)
    }

    fn set_fire_visible(&mut self, p: IVec2, is_visible: bool) {
        if let Some(i) = self.idx(p) {
            self.info[i].set(SquareInfo::FIRE, is_visible);
        }
    }
}

impl fmt::Display for Cave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let p = ivec2(x, y);
                let c = if self.player == Some(p) {
                    '@'
                } else if self.monsters.contains(&p) {
                    'M'
                } else {
                    self.feats[(y * self.size.x + x) as usize].into()
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Cave {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cave::from_ascii(&value)
    }
}

impl From<Cave> for String {
    fn from(cave: Cave) -> Self {
        cave.to_string()
    }
}
