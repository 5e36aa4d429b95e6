use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer address of one cell of the movement grid.
///
/// Grid convention: `x` grows to the right, `y` grows downward (screen order),
/// so `Direction::Up` is `y - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    pub fn offset(self, direction: Direction) -> Option<TileCoord> {
        let (dx, dy) = direction.delta();
        Some(TileCoord {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Direction of the single step that brings `self` closer to `target`.
    /// The axis with the larger gap wins; ties go to the horizontal axis.
    pub fn direction_toward(self, target: TileCoord) -> Option<Direction> {
        if self == target {
            return None;
        }
        let dx = i64::from(target.x) - i64::from(self.x);
        let dy = i64::from(target.y) - i64::from(self.y);
        if dx.abs() >= dy.abs() {
            Some(if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else {
            Some(if dy > 0 {
                Direction::Down
            } else {
                Direction::Up
            })
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    #[default]
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Accepts both the screen-relative and the cardinal vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "up" | "north" => Some(Self::Up),
            "right" | "east" => Some(Self::Right),
            "down" | "south" => Some(Self::Down),
            "left" | "west" => Some(Self::Left),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_and_cardinal_tokens_normalize_to_same_facing() {
        let pairs = [
            ("up", "north"),
            ("right", "east"),
            ("down", "south"),
            ("left", "west"),
        ];
        for (screen, cardinal) in pairs {
            let a = Direction::from_token(screen).expect("screen token");
            let b = Direction::from_token(cardinal).expect("cardinal token");
            assert_eq!(a, b);
        }
        assert_eq!(Direction::from_token("  NoRtH "), Some(Direction::Up));
    }

    #[test]
    fn unknown_direction_token_is_rejected() {
        assert_eq!(Direction::from_token("northeast"), None);
        assert_eq!(Direction::from_token(""), None);
    }

    #[test]
    fn offset_follows_screen_convention() {
        let origin = TileCoord::new(2, 2);
        assert_eq!(origin.offset(Direction::Up), Some(TileCoord::new(2, 1)));
        assert_eq!(origin.offset(Direction::Right), Some(TileCoord::new(3, 2)));
        assert_eq!(origin.offset(Direction::Down), Some(TileCoord::new(2, 3)));
        assert_eq!(origin.offset(Direction::Left), Some(TileCoord::new(1, 2)));
        assert_eq!(TileCoord::new(i32::MAX, 0).offset(Direction::Right), None);
    }

    #[test]
    fn direction_toward_prefers_larger_axis_gap() {
        let origin = TileCoord::new(0, 0);
        assert_eq!(
            origin.direction_toward(TileCoord::new(1, 0)),
            Some(Direction::Right)
        );
        assert_eq!(
            origin.direction_toward(TileCoord::new(1, -3)),
            Some(Direction::Up)
        );
        assert_eq!(
            origin.direction_toward(TileCoord::new(-2, 2)),
            Some(Direction::Left)
        );
        assert_eq!(origin.direction_toward(origin), None);
    }
}
