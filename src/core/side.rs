//! Sides, lanes and per-participant perspective.
//!
//! ## Side
//!
//! Absolute, connection-independent tag for one of the two parties.
//! Everything that crosses the wire uses `Side`.
//!
//! ## RelativeSide
//!
//! Locally-relative label (`Player`/`Opponent`). Each participant derives it
//! from `Side` through its own [`Perspective`]; it never leaves the process.
//!
//! ## SideMap
//!
//! Two-entry storage indexed by `Side`, used for formations and per-side
//! turn plans.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Absolute side tag.
///
/// `Host` is the participant that created the match. Which side is
/// authoritative is a property of the session, not of the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Host,
    Guest,
}

impl Side {
    /// Both sides in fixed resolution order.
    pub const BOTH: [Side; 2] = [Side::Host, Side::Guest];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Host => Side::Guest,
            Side::Guest => Side::Host,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Host => 0,
            Side::Guest => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Host => write!(f, "host"),
            Side::Guest => write!(f, "guest"),
        }
    }
}

/// Locally-relative side label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelativeSide {
    Player,
    Opponent,
}

/// Maps absolute sides to relative labels for one participant.
///
/// ```
/// use lane_duel::core::{Perspective, RelativeSide, Side};
///
/// let guest_view = Perspective::new(Side::Guest);
/// assert_eq!(guest_view.relative(Side::Guest), RelativeSide::Player);
/// assert_eq!(guest_view.relative(Side::Host), RelativeSide::Opponent);
/// assert_eq!(guest_view.absolute(RelativeSide::Opponent), Side::Host);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Perspective {
    local: Side,
}

impl Perspective {
    #[must_use]
    pub const fn new(local: Side) -> Self {
        Self { local }
    }

    /// The absolute side this participant plays.
    #[must_use]
    pub const fn local(self) -> Side {
        self.local
    }

    #[must_use]
    pub fn relative(self, side: Side) -> RelativeSide {
        if side == self.local {
            RelativeSide::Player
        } else {
            RelativeSide::Opponent
        }
    }

    #[must_use]
    pub fn absolute(self, side: RelativeSide) -> Side {
        match side {
            RelativeSide::Player => self.local,
            RelativeSide::Opponent => self.local.opponent(),
        }
    }
}

/// One of the three formation lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Center,
    Right,
}

impl Lane {
    /// All lanes in roster order.
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Center => 1,
            Lane::Right => 2,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lanes tried, in order, when the mirrored lane has no target.
    ///
    /// `Center` has no fixed order; callers pick among alive heroes at random.
    #[must_use]
    pub const fn fallback_order(self) -> Option<[Lane; 2]> {
        match self {
            Lane::Left => Some([Lane::Center, Lane::Right]),
            Lane::Right => Some([Lane::Center, Lane::Left]),
            Lane::Center => None,
        }
    }

    /// Number of lane steps between two lanes.
    #[must_use]
    pub fn distance(self, other: Lane) -> usize {
        self.index().abs_diff(other.index())
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Lane::Left => "left",
            Lane::Center => "center",
            Lane::Right => "right",
        };
        write!(f, "{label}")
    }
}

/// Per-side data storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    host: T,
    guest: T,
}

impl<T> SideMap<T> {
    pub fn new(host: T, guest: T) -> Self {
        Self { host, guest }
    }

    /// Build both entries from a factory.
    pub fn from_fn(mut factory: impl FnMut(Side) -> T) -> Self {
        Self {
            host: factory(Side::Host),
            guest: factory(Side::Guest),
        }
    }

    #[must_use]
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Host => &self.host,
            Side::Guest => &self.guest,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Host => &mut self.host,
            Side::Guest => &mut self.guest,
        }
    }

    /// Iterate over (Side, &T) pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::Host, &self.host), (Side::Guest, &self.guest)].into_iter()
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        self.get(side)
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        self.get_mut(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Host.opponent(), Side::Guest);
        assert_eq!(Side::Guest.opponent(), Side::Host);
        assert_eq!(format!("{}", Side::Guest), "guest");
    }

    #[test]
    fn test_perspective_round_trip() {
        for local in Side::BOTH {
            let view = Perspective::new(local);
            for side in Side::BOTH {
                assert_eq!(view.absolute(view.relative(side)), side);
            }
        }
    }

    #[test]
    fn test_lane_fallbacks() {
        assert_eq!(Lane::Left.fallback_order(), Some([Lane::Center, Lane::Right]));
        assert_eq!(Lane::Right.fallback_order(), Some([Lane::Center, Lane::Left]));
        assert_eq!(Lane::Center.fallback_order(), None);
    }

    #[test]
    fn test_lane_distance() {
        assert_eq!(Lane::Left.distance(Lane::Right), 2);
        assert_eq!(Lane::Center.distance(Lane::Left), 1);
        assert_eq!(Lane::from_index(2), Some(Lane::Right));
        assert_eq!(Lane::from_index(3), None);
    }

    #[test]
    fn test_side_map_indexing() {
        let mut map = SideMap::from_fn(|side| side.index() as i32 * 10);
        assert_eq!(map[Side::Host], 0);
        assert_eq!(map[Side::Guest], 10);

        map[Side::Host] = 5;
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(Side::Host, &5), (Side::Guest, &10)]);
    }

    #[test]
    fn test_side_map_serialization() {
        let map = SideMap::new(1u32, 2u32);
        let json = serde_json::to_string(&map).unwrap();
        let deserialized: SideMap<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, deserialized);
    }
}
