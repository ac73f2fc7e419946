use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

/// A board intersection, 1-based. `x` is the column, `y` the row.
///
/// Serialized as the string key `"x,y"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    pub fn is_on(&self, size: BoardSize) -> bool {
        let n = size.get();
        (1..=n).contains(&self.x) && (1..=n).contains(&self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Position {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidPosition(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse::<u8>().map_err(|_| invalid())?;
        let y = y.trim().parse::<u8>().map_err(|_| invalid())?;
        if x == 0 || y == 0 {
            return Err(invalid());
        }
        Ok(Self { x, y })
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoneColor {
    Black,
    White,
}

impl StoneColor {
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// Single-letter tag used in board fingerprints.
    pub fn initial(self) -> char {
        match self {
            Self::Black => 'b',
            Self::White => 'w',
        }
    }
}

impl FromStr for StoneColor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "black" => Ok(Self::Black),
            "white" => Ok(Self::White),
            other => Err(EngineError::InvalidColor(other.to_string())),
        }
    }
}

/// A stone on one board together with the position of its entangled mate
/// on the other board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stone {
    pub position: Position,
    #[serde(rename = "type")]
    pub color: StoneColor,
    #[serde(rename = "brother")]
    pub mate: Position,
}

impl Stone {
    /// A stone that is its own mate (before the anchors are cross-linked).
    pub fn unlinked(position: Position, color: StoneColor) -> Self {
        Self {
            position,
            color,
            mate: position,
        }
    }
}

/// Which of the two realities a stone lives on. Serialized as `1` / `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoardSide {
    A,
    B,
}

impl BoardSide {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, EngineError> {
        match tag {
            1 => Ok(Self::A),
            2 => Ok(Self::B),
            other => Err(EngineError::InvalidBoardTag(other)),
        }
    }
}

impl Serialize for BoardSide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for BoardSide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        Self::from_tag(tag).map_err(serde::de::Error::custom)
    }
}

/// Supported board extents. Serialized as the plain number of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BoardSize {
    #[default]
    Nine,
    Thirteen,
    Nineteen,
}

impl BoardSize {
    pub fn get(self) -> u8 {
        match self {
            Self::Nine => 9,
            Self::Thirteen => 13,
            Self::Nineteen => 19,
        }
    }

    pub fn points(self) -> usize {
        let n = self.get() as usize;
        n * n
    }

    /// Komi suggested by the ruleset table for this size.
    pub fn recommended_komi(self) -> f64 {
        match self {
            Self::Nine => 5.5,
            Self::Thirteen => 3.25,
            Self::Nineteen => 3.75,
        }
    }

    /// Iterates every intersection, column-major.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        let n = self.get();
        (1..=n).flat_map(move |x| (1..=n).map(move |y| Position::new(x, y)))
    }
}

impl TryFrom<u8> for BoardSize {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            9 => Ok(Self::Nine),
            13 => Ok(Self::Thirteen),
            19 => Ok(Self::Nineteen),
            other => Err(EngineError::UnsupportedBoardSize(other)),
        }
    }
}

impl Serialize for BoardSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.get())
    }
}

impl<'de> Deserialize<'de> for BoardSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        Self::try_from(n).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_key_round_trips_through_display() {
        let pos: Position = "3,14".parse().expect("valid key");

        assert_eq!(pos, Position::new(3, 14));
        assert_eq!(pos.to_string(), "3,14");
    }

    #[test]
    fn malformed_position_keys_are_rejected() {
        for key in ["", "3", "0,4", "a,b", "3;4", "300,1"] {
            assert!(key.parse::<Position>().is_err(), "{key:?} should not parse");
        }
    }

    #[test]
    fn position_bounds_follow_board_size() {
        assert!(Position::new(9, 9).is_on(BoardSize::Nine));
        assert!(!Position::new(10, 1).is_on(BoardSize::Nine));
        assert!(Position::new(10, 1).is_on(BoardSize::Thirteen));
    }

    #[test]
    fn stone_uses_wire_field_names() {
        let stone = Stone {
            position: Position::new(3, 3),
            color: StoneColor::White,
            mate: Position::new(3, 4),
        };

        let json = serde_json::to_value(stone).expect("serializable");

        assert_eq!(
            json,
            serde_json::json!({ "position": "3,3", "type": "white", "brother": "3,4" })
        );
    }

    #[test]
    fn unsupported_board_size_is_an_error() {
        assert!(BoardSize::try_from(7).is_err());
        assert_eq!(BoardSize::try_from(13).expect("supported"), BoardSize::Thirteen);
        assert_eq!(BoardSize::Nineteen.points(), 361);
    }

    #[test]
    fn recommended_komi_follows_the_size_table() {
        assert_eq!(BoardSize::Nine.recommended_komi(), 5.5);
        assert_eq!(BoardSize::Thirteen.recommended_komi(), 3.25);
        assert_eq!(BoardSize::Nineteen.recommended_komi(), 3.75);
    }

    #[test]
    fn colors_parse_from_wire_names() {
        assert_eq!("white".parse::<StoneColor>().expect("color"), StoneColor::White);
        assert!("Black".parse::<StoneColor>().is_err());
    }
}
