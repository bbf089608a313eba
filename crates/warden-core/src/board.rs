//! [`Position`] implementation backed by the `shakmaty` move generator.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position as _};
use tracing::warn;

use crate::chess_move::Move;
use crate::color::Color;
use crate::error::CoreError;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::Square;
use crate::zobrist::{PRIMARY, VERIFY};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess position with its legal moves and both hash keys precomputed.
///
/// Immutable: every move produces a fresh `Board`.
#[derive(Clone)]
pub struct Board {
    chess: Chess,
    legal: Vec<shakmaty::Move>,
    hash: u64,
    hash2: u64,
}

impl Board {
    /// The standard starting position.
    pub fn starting_position() -> Board {
        Board::from_chess(Chess::default())
    }

    /// Parse a FEN string.
    pub fn from_fen(fen: &str) -> Result<Board, CoreError> {
        let invalid = |reason: String| {
            warn!(fen, %reason, "rejected FEN");
            CoreError::InvalidFen {
                fen: fen.to_string(),
                reason,
            }
        };
        let parsed: Fen = fen.trim().parse().map_err(|e: shakmaty::fen::ParseFenError| invalid(e.to_string()))?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Board::from_chess(chess))
    }

    fn from_chess(chess: Chess) -> Board {
        let legal: Vec<shakmaty::Move> = chess.legal_moves().into_iter().collect();

        let en_passant = legal.iter().find_map(|m| match m {
            shakmaty::Move::EnPassant { to, .. } => Some(Square::from(*to)),
            _ => None,
        });
        let side = Color::from(chess.turn());
        let placement = chess.board();
        let pieces = || {
            placement
                .occupied()
                .into_iter()
                .filter_map(|sq| placement.piece_at(sq).map(|p| (Square::from(sq), Piece::from(p))))
        };
        let rooks = || chess.castles().castling_rights().into_iter().map(Square::from);

        let hash = PRIMARY.hash(pieces(), side, rooks(), en_passant);
        let hash2 = VERIFY.hash(pieces(), side, rooks(), en_passant);

        Board {
            chess,
            legal,
            hash,
            hash2,
        }
    }

    /// Resolve UCI text to a legal move in this position.
    pub fn parse_uci_move(&self, text: &str) -> Result<Move, CoreError> {
        let mv = Move::from_uci(text)?;
        if self.legal.iter().any(|m| to_move(m) == mv) {
            Ok(mv)
        } else {
            Err(CoreError::IllegalMove {
                uci: text.to_string(),
            })
        }
    }

    /// Play a move given as UCI text.
    pub fn play_uci(&self, text: &str) -> Result<Board, CoreError> {
        let mv = self.parse_uci_move(text)?;
        self.play(mv)
    }

    /// Play a move, rejecting it if it is not legal here.
    pub fn play(&self, mv: Move) -> Result<Board, CoreError> {
        let inner = self
            .legal
            .iter()
            .find(|m| to_move(m) == mv)
            .ok_or_else(|| CoreError::IllegalMove { uci: mv.to_uci() })?;
        let mut next = self.chess.clone();
        next.play_unchecked(inner.clone());
        Ok(Board::from_chess(next))
    }
}

/// Convert a generator move into the engine's `from/to/promotion` form.
fn to_move(m: &shakmaty::Move) -> Move {
    match m {
        shakmaty::Move::Normal {
            from, to, promotion, ..
        } => Move {
            from: Square::from(*from),
            to: Square::from(*to),
            promotion: (*promotion).map(PieceKind::from),
        },
        shakmaty::Move::EnPassant { from, to } => Move::new(Square::from(*from), Square::from(*to)),
        shakmaty::Move::Castle { king, rook } => {
            let king = Square::from(*king);
            let rook = Square::from(*rook);
            let file = if rook.file() > king.file() { 6 } else { 2 };
            match Square::from_coords(file, king.rank()) {
                Some(dest) => Move::new(king, dest),
                None => Move::NULL,
            }
        }
        #[allow(unreachable_patterns)]
        _ => Move::NULL,
    }
}

impl Position for Board {
    fn legal_moves(&self) -> Vec<Move> {
        self.legal.iter().map(to_move).collect()
    }

    fn captures(&self) -> Vec<Move> {
        self.legal.iter().filter(|m| m.is_capture()).map(to_move).collect()
    }

    fn apply_move(&self, mv: Move) -> Board {
        match self.play(mv) {
            Ok(next) => next,
            Err(err) => {
                debug_assert!(false, "apply_move precondition violated: {err}");
                warn!(%err, "apply_move called with an illegal move; position unchanged");
                self.clone()
            }
        }
    }

    fn is_in_check(&self) -> bool {
        self.chess.is_check()
    }

    fn hash(&self) -> u64 {
        self.hash
    }

    fn hash2(&self) -> u64 {
        self.hash2
    }

    fn active_side(&self) -> Color {
        Color::from(self.chess.turn())
    }

    fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.chess.board().piece_at(sq.into()).map(Piece::from)
    }

    fn is_legal(&self, mv: Move) -> bool {
        self.legal.iter().any(|m| to_move(m) == mv)
    }

    fn is_capture(&self, mv: Move) -> bool {
        self.legal.iter().any(|m| m.is_capture() && to_move(m) == mv)
    }
}

impl FromStr for Board {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Board, CoreError> {
        Board::from_fen(s)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting_position()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.hash == other.hash && self.hash2 == other.hash2
    }
}

impl Eq for Board {}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("side_to_move", &self.active_side())
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("legal_moves", &self.legal.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_twenty_moves() {
        let board = Board::starting_position();
        assert_eq!(board.legal_moves().len(), 20);
        assert!(board.captures().is_empty());
        assert_eq!(board.active_side(), Color::White);
        assert!(!board.is_in_check());
    }

    #[test]
    fn starting_fen_matches_default() {
        let parsed: Board = STARTING_FEN.parse().unwrap();
        assert_eq!(parsed.hash(), Board::starting_position().hash());
        assert_eq!(parsed.hash2(), Board::starting_position().hash2());
    }

    #[test]
    fn hashes_are_independent() {
        let board = Board::starting_position();
        assert_ne!(board.hash(), board.hash2());
    }

    #[test]
    fn transposition_gives_same_hashes() {
        let start = Board::starting_position();
        let a = start
            .play_uci("g1f3")
            .and_then(|b| b.play_uci("g8f6"))
            .and_then(|b| b.play_uci("b1c3"))
            .unwrap();
        let b = start
            .play_uci("b1c3")
            .and_then(|b| b.play_uci("g8f6"))
            .and_then(|b| b.play_uci("g1f3"))
            .unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash2(), b.hash2());
    }

    #[test]
    fn different_positions_different_hashes() {
        let start = Board::starting_position();
        let e4 = start.play_uci("e2e4").unwrap();
        assert_ne!(start.hash(), e4.hash());
        assert_ne!(start.hash2(), e4.hash2());
    }

    #[test]
    fn apply_move_is_non_destructive() {
        let start = Board::starting_position();
        let before = start.hash();
        let _ = start.apply_move(Move::new(Square::E2, Square::E4));
        assert_eq!(start.hash(), before);
        assert_eq!(start.legal_moves().len(), 20);
    }

    #[test]
    fn illegal_move_rejected() {
        let start = Board::starting_position();
        assert!(matches!(start.play_uci("e2e5"), Err(CoreError::IllegalMove { .. })));
        assert!(matches!(start.play_uci("zz"), Err(CoreError::MalformedMove { .. })));
    }

    #[test]
    fn castling_uses_king_destination() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let moves = board.legal_moves();
        assert!(moves.contains(&Move::new(Square::E1, Square::G1)));
        assert!(moves.contains(&Move::new(Square::E1, Square::C1)));
        let castled = board.play_uci("e1g1").unwrap();
        assert_eq!(
            castled.piece_on(Square::G1),
            Some(Piece::new(Color::White, PieceKind::King))
        );
    }

    #[test]
    fn en_passant_is_a_capture_and_hashed() {
        let with_ep: Board = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"
            .parse()
            .unwrap();
        let ep = Move::from_uci("e5d6").unwrap();
        assert!(with_ep.captures().contains(&ep));
        assert!(with_ep.is_capture(ep));

        let without_ep: Board = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3"
            .parse()
            .unwrap();
        assert_ne!(with_ep.hash(), without_ep.hash());
    }

    #[test]
    fn promotions_are_distinct_moves() {
        let board: Board = "7k/4P3/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let promos: Vec<Move> = board
            .legal_moves()
            .into_iter()
            .filter(|m| m.promotion.is_some())
            .collect();
        assert_eq!(promos.len(), 4);
    }

    #[test]
    fn invalid_fen_rejected() {
        assert!(matches!(
            Board::from_fen("not a fen"),
            Err(CoreError::InvalidFen { .. })
        ));
    }

    #[test]
    fn check_detection() {
        let board: Board = "4k3/8/8/8/8/8/8/4K2r w - - 0 1".parse().unwrap();
        assert!(board.is_in_check());
    }
}
