//! Board squares in Little-Endian Rank-File order.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A square on the board. Index = rank * 8 + file, so A1 = 0, H8 = 63.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Total number of squares.
    pub const COUNT: usize = 64;

    /// Create a square from zero-based file and rank, or `None` if off the board.
    #[inline]
    pub const fn from_coords(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    /// Create a square from a zero-based index, returning `None` if out of range.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Square> {
        if index < 64 { Some(Square(index)) } else { None }
    }

    /// Parse algebraic notation such as `"e4"`.
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Square::from_coords(file - b'a', rank - b'1')
    }

    /// Zero-based index (0..63).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Zero-based file (0 = a).
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    /// Zero-based rank (0 = first rank).
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// Mirror vertically (a1 <-> a8). Used to read White tables for Black.
    #[inline]
    pub const fn flip_rank(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// Iterate over all 64 squares in index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }

    pub const A1: Square = Square(0);
    pub const E1: Square = Square(4);
    pub const G1: Square = Square(6);
    pub const C1: Square = Square(2);
    pub const E2: Square = Square(12);
    pub const D2: Square = Square(11);
    pub const E4: Square = Square(28);
    pub const D4: Square = Square(27);
    pub const D5: Square = Square(35);
    pub const E8: Square = Square(60);
    pub const G8: Square = Square(62);
    pub const C8: Square = Square(58);
}

impl From<shakmaty::Square> for Square {
    fn from(sq: shakmaty::Square) -> Square {
        Square(u32::from(sq) as u8)
    }
}

impl From<Square> for shakmaty::Square {
    fn from(sq: Square) -> shakmaty::Square {
        shakmaty::Square::new(u32::from(sq.0))
    }
}

impl FromStr for Square {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Square, CoreError> {
        Square::from_algebraic(s).ok_or_else(|| CoreError::InvalidSquare {
            text: s.to_string(),
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_roundtrip() {
        for sq in Square::all() {
            let text = sq.to_string();
            assert_eq!(Square::from_algebraic(&text), Some(sq));
        }
    }

    #[test]
    fn named_constants() {
        assert_eq!(Square::E4.to_string(), "e4");
        assert_eq!(Square::G8.to_string(), "g8");
        assert_eq!(Square::D5.to_string(), "d5");
    }

    #[test]
    fn rejects_bad_text() {
        assert!(Square::from_algebraic("i1").is_none());
        assert!(Square::from_algebraic("a9").is_none());
        assert!(Square::from_algebraic("e").is_none());
        assert!("z3".parse::<Square>().is_err());
    }

    #[test]
    fn shakmaty_conversion_roundtrip() {
        for sq in Square::all() {
            let other: shakmaty::Square = sq.into();
            assert_eq!(Square::from(other), sq);
        }
    }

    #[test]
    fn flip_rank_mirrors() {
        assert_eq!(Square::E1.flip_rank(), Square::E8);
        assert_eq!(Square::A1.flip_rank().to_string(), "a8");
    }
}
