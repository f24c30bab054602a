use serde::{Deserialize, Serialize};

/// Terrain feature in a single cave grid.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
#[serde(try_from = "char", into = "char")]
pub enum Feat {
    #[default]
    Floor,
    /// Whoever stands in a pit can't see past its rim.
    Pit,
    OpenDoor,
    ClosedDoor,
    Rubble,
    Granite,
    /// Indestructible map edge.
    Permanent,
    Chasm,
}

use Feat::*;

impl Feat {
    pub fn is_wall(self) -> bool {
        matches!(self, Rubble | Granite | Permanent)
    }

    /// Lines of fire pass through the feature.
    ///
    /// ```
    /// use engine::Feat;
    ///
    /// assert!(Feat::Chasm.is_projectable());
    /// assert!(Feat::OpenDoor.is_projectable());
    /// assert!(!Feat::ClosedDoor.is_projectable());
    /// assert!(!Feat::Rubble.is_projectable());
    /// ```
    pub fn is_projectable(self) -> bool {
        !self.is_wall() && self != ClosedDoor
    }

    pub fn is_pit(self) -> bool {
        self == Pit
    }
}

impl TryFrom<char> for Feat {
    type Error = &'static str;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '.' => Ok(Floor),
            '^' => Ok(Pit),
            '\'' => Ok(OpenDoor),
            '+' => Ok(ClosedDoor),
            ':' => Ok(Rubble),
            '#' => Ok(Granite),
            '%' => Ok(Permanent),
            'v' => Ok(Chasm),
            _ => Err("invalid terrain char"),
        }
    }
}

impl From<Feat> for char {
    fn from(val: Feat) -> Self {
        // NB. This must match Feat's TryFrom inputs above.
        match val {
            Floor => '.',
            Pit => '^',
            OpenDoor => '\'',
            ClosedDoor => '+',
            Rubble => ':',
            Granite => '#',
            Permanent => '%',
            Chasm => 'v',
        }
    }
}
