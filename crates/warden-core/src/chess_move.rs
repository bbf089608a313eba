//! Engine-side move representation.

use std::fmt;

use crate::error::CoreError;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// A move as the search sees it: source, destination and optional promotion.
///
/// Equality is structural. Castling is written as the king's two-square move
/// (`e1g1`), matching UCI.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// Null move sentinel (a1a1). Never legal.
    pub const NULL: Move = Move {
        from: Square::A1,
        to: Square::A1,
        promotion: None,
    };

    /// Create a non-promoting move.
    #[inline]
    pub const fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Create a promotion.
    #[inline]
    pub const fn with_promotion(from: Square, to: Square, kind: PieceKind) -> Move {
        Move {
            from,
            to,
            promotion: Some(kind),
        }
    }

    /// Returns `true` for [`Move::NULL`].
    #[inline]
    pub fn is_null(self) -> bool {
        self == Move::NULL
    }

    /// Parse UCI long algebraic text (`e2e4`, `a7a8q`) without consulting a board.
    ///
    /// Legality is not checked here; see `Board::parse_uci_move`.
    pub fn from_uci(text: &str) -> Result<Move, CoreError> {
        let malformed = || CoreError::MalformedMove {
            text: text.to_string(),
        };
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(malformed());
        }
        let from = Square::from_algebraic(&text[0..2]).ok_or_else(malformed)?;
        let to = Square::from_algebraic(&text[2..4]).ok_or_else(malformed)?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_fen_char(c) {
                Some(kind @ (PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)) => {
                    Some(kind)
                }
                _ => return Err(malformed()),
            },
        };
        Ok(Move { from, to, promotion })
    }

    /// UCI text for this move.
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uci_roundtrip() {
        for text in ["e2e4", "g1f3", "a7a8q", "h2h1n", "e1g1"] {
            let mv = Move::from_uci(text).unwrap();
            assert_eq!(mv.to_uci(), text);
        }
    }

    #[test]
    fn null_displays_as_zeros() {
        assert_eq!(Move::NULL.to_string(), "0000");
        assert!(Move::NULL.is_null());
        assert!(!Move::new(Square::E2, Square::E4).is_null());
    }

    #[test]
    fn structural_equality() {
        let a = Move::new(Square::E2, Square::E4);
        let b = Move::from_uci("e2e4").unwrap();
        assert_eq!(a, b);
        let promo = Move::with_promotion(Square::E2, Square::E4, PieceKind::Queen);
        assert_ne!(a, promo);
    }

    #[test]
    fn rejects_malformed() {
        assert!(Move::from_uci("e2").is_err());
        assert!(Move::from_uci("e2e9").is_err());
        assert!(Move::from_uci("e7e8k").is_err());
        assert!(Move::from_uci("e7e8qq").is_err());
    }
}
