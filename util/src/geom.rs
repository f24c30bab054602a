use glam::IVec2;

/// 8 directions, clock face order.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

pub trait VecExt: Sized + Default {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Absolute size of vector in chessboard metric.
    fn chess_len(&self) -> i32;

    /// Game distance of the vector.
    ///
    /// Length along the major axis plus half the length along the minor
    /// axis, rounded down. Sight radius, projection range and the
    /// precomputed line-of-fire tables are all measured with this.
    ///
    /// ```
    /// # use glam::ivec2;
    /// # use util::VecExt;
    /// assert_eq!(ivec2(5, 0).approx_len(), 5);
    /// assert_eq!(ivec2(4, -3).approx_len(), 5);
    /// assert_eq!(ivec2(1, 1).approx_len(), 1);
    /// assert_eq!(ivec2(-2, 7).approx_len(), 8);
    /// ```
    fn approx_len(&self) -> i32;

    /// Vec points to one of the 8 cells surrounding the origin.
    fn is_adjacent(&self) -> bool {
        self.chess_len() == 1
    }
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self[0].abs() + self[1].abs()
    }

    fn chess_len(&self) -> i32 {
        self[0].abs().max(self[1].abs())
    }

    fn approx_len(&self) -> i32 {
        let (ax, ay) = (self[0].abs(), self[1].abs());
        if ay > ax {
            ay + (ax >> 1)
        } else {
            ax + (ay >> 1)
        }
    }
}

/// Game distance between two points, see [`VecExt::approx_len`].
pub fn distance(a: impl Into<IVec2>, b: impl Into<IVec2>) -> i32 {
    (b.into() - a.into()).approx_len()
}

/// Scale `v` by `num / den`, rounding halves away from zero.
///
/// ```
/// # use util::scale_round;
/// assert_eq!(scale_round(5, 1, 2), 3);
/// assert_eq!(scale_round(-5, 1, 2), -3);
/// assert_eq!(scale_round(40, 19, 50), 15);
/// assert_eq!(scale_round(20, 19, 50), 8);
/// ```
pub fn scale_round(v: i32, num: i32, den: i32) -> i32 {
    assert!(den > 0, "scale_round: non-positive denominator");
    let n = v as i64 * num as i64;
    let den = den as i64;
    let q = (n.abs() * 2 + den) / (2 * den);
    (if n < 0 { -q } else { q }) as i32
}
