//! Zobrist key tables for the primary and verification hashes.
//!
//! Both tables come from the same const xorshift generator seeded differently,
//! so the two keys of a position are statistically independent.

use crate::color::Color;
use crate::piece::Piece;
use crate::square::Square;

/// One full set of Zobrist keys.
pub(crate) struct ZobristKeys {
    /// Indexed by `[Piece::index()][Square::index()]`.
    piece_square: [[u64; 64]; 12],
    /// XORed when Black is to move.
    black_to_move: u64,
    /// Indexed by the square of a rook that still carries castling rights.
    castling_rook: [u64; 64],
    /// Indexed by the file of a legal en passant target.
    en_passant_file: [u64; 8],
}

/// Keys for [`Position::hash`](crate::Position::hash).
pub(crate) static PRIMARY: ZobristKeys = ZobristKeys::generate(0x5a4f_4252_4953_5421); // "ZOBRIST!"

/// Keys for [`Position::hash2`](crate::Position::hash2).
pub(crate) static VERIFY: ZobristKeys = ZobristKeys::generate(0x5645_5249_4659_2121); // "VERIFY!!"

/// Xorshift64 PRNG. Returns (value, next_state).
const fn xorshift64(mut state: u64) -> (u64, u64) {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    (state, state)
}

impl ZobristKeys {
    const fn generate(seed: u64) -> ZobristKeys {
        let mut state = seed;

        let mut piece_square = [[0u64; 64]; 12];
        let mut piece = 0;
        while piece < 12 {
            let mut sq = 0;
            while sq < 64 {
                let (val, next) = xorshift64(state);
                piece_square[piece][sq] = val;
                state = next;
                sq += 1;
            }
            piece += 1;
        }

        let (black_to_move, next) = xorshift64(state);
        state = next;

        let mut castling_rook = [0u64; 64];
        let mut sq = 0;
        while sq < 64 {
            let (val, next) = xorshift64(state);
            castling_rook[sq] = val;
            state = next;
            sq += 1;
        }

        let mut en_passant_file = [0u64; 8];
        let mut file = 0;
        while file < 8 {
            let (val, next) = xorshift64(state);
            en_passant_file[file] = val;
            state = next;
            file += 1;
        }

        ZobristKeys {
            piece_square,
            black_to_move,
            castling_rook,
            en_passant_file,
        }
    }

    /// Hash a position from its parts.
    pub(crate) fn hash(
        &self,
        pieces: impl Iterator<Item = (Square, Piece)>,
        side_to_move: Color,
        castling_rooks: impl Iterator<Item = Square>,
        en_passant: Option<Square>,
    ) -> u64 {
        let mut hash = 0u64;
        for (sq, piece) in pieces {
            hash ^= self.piece_square[piece.index()][sq.index()];
        }
        if side_to_move == Color::Black {
            hash ^= self.black_to_move;
        }
        for rook in castling_rooks {
            hash ^= self.castling_rook[rook.index()];
        }
        if let Some(ep) = en_passant {
            hash ^= self.en_passant_file[ep.file() as usize];
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece_kind::PieceKind;

    fn all_keys(keys: &ZobristKeys) -> Vec<u64> {
        let mut out: Vec<u64> = keys.piece_square.iter().flatten().copied().collect();
        out.push(keys.black_to_move);
        out.extend_from_slice(&keys.castling_rook);
        out.extend_from_slice(&keys.en_passant_file);
        out
    }

    #[test]
    fn keys_within_a_table_are_unique() {
        for table in [&PRIMARY, &VERIFY] {
            let mut keys = all_keys(table);
            let count = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), count, "some Zobrist keys collide");
        }
    }

    #[test]
    fn tables_differ() {
        assert_ne!(all_keys(&PRIMARY), all_keys(&VERIFY));
    }

    #[test]
    fn side_to_move_changes_hash() {
        let king = (Square::E1, Piece::new(Color::White, PieceKind::King));
        let white = PRIMARY.hash([king].into_iter(), Color::White, std::iter::empty(), None);
        let black = PRIMARY.hash([king].into_iter(), Color::Black, std::iter::empty(), None);
        assert_ne!(white, black);
    }
}
