use glam::{ivec2, IVec2};

/// Rectangular character map read from a block of text.
///
/// Leading blank lines and indentation shared by every line are ignored, so
/// maps can be written as indented string literals in code.
#[derive(Clone, Default, Debug)]
pub struct AsciiMap {
    lines: Vec<String>,
}

impl AsciiMap {
    pub fn new(map: &str) -> Self {
        let map = map.trim_end();

        let lines: Vec<&str> = map
            .lines()
            .map(|line| line.trim_end())
            .skip_while(|line| line.is_empty())
            .collect();

        let x_skip = lines
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
            .min()
            .unwrap_or(0);

        AsciiMap {
            lines: lines
                .into_iter()
                .map(|line| line.chars().skip(x_skip).collect())
                .collect(),
        }
    }

    /// Bounding size of the map, longest line by number of lines.
    pub fn size(&self) -> IVec2 {
        let w = self
            .lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        ivec2(w as i32, self.lines.len() as i32)
    }

    /// Map is a proper rectangle with all lines of the same length.
    pub fn is_rectangular(&self) -> bool {
        let w = self.size().x as usize;
        self.lines.iter().all(|line| line.chars().count() == w)
    }

    /// Iterate the points and characters on the map, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, char)> + '_ {
        self.lines.iter().enumerate().flat_map(|(y, line)| {
            line.chars()
                .enumerate()
                .map(move |(x, c)| (ivec2(x as i32, y as i32), c))
        })
    }
}
