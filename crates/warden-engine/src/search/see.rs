//! Static Exchange Evaluation (SEE).
//!
//! Plays out the capture sequence on one square, each side recapturing with
//! its least valuable attacker and stopping as soon as continuing would lose
//! material. Attackers come from the position's own legal captures, so pins
//! and x-rays are handled by replaying the exchange move by move.

use warden_core::{Move, PieceKind, Position, Square};

/// Material won by `mv` on its own: the victim plus any promotion gain.
///
/// En passant lands on an empty square and is valued as a pawn.
fn capture_gain<P: Position>(pos: &P, mv: Move) -> i32 {
    let victim = pos
        .piece_on(mv.to)
        .map_or(PieceKind::Pawn.value(), |p| p.kind.value());
    let promotion = mv
        .promotion
        .map_or(0, |kind| kind.value() - PieceKind::Pawn.value());
    victim + promotion
}

/// The cheapest legal capture onto `target`.
///
/// Pawn captures end the scan early since nothing is cheaper. Promoting
/// captures are only considered as queen promotions.
fn least_valuable_capture<P: Position>(pos: &P, target: Square) -> Option<Move> {
    let mut best: Option<(i32, Move)> = None;
    for mv in pos.captures().into_iter().filter(|m| m.to == target) {
        if mv.promotion.is_some_and(|kind| kind != PieceKind::Queen) {
            continue;
        }
        let Some(attacker) = pos.piece_on(mv.from) else {
            continue;
        };
        if attacker.kind == PieceKind::Pawn {
            return Some(mv);
        }
        let value = attacker.kind.value();
        if best.is_none_or(|(v, _)| value < v) {
            best = Some((value, mv));
        }
    }
    best.map(|(_, mv)| mv)
}

/// Best the side to move can get by starting (or declining) a recapture on `target`.
fn recapture_value<P: Position>(pos: &P, target: Square) -> i32 {
    match least_valuable_capture(pos, target) {
        None => 0,
        Some(mv) => {
            let gain = capture_gain(pos, mv);
            (gain - recapture_value(&pos.apply_move(mv), target)).max(0)
        }
    }
}

/// Net material of playing `mv` and letting the exchange run its course.
///
/// Unlike [`see`], the first capture is forced, so a losing capture scores
/// negative.
fn exchange<P: Position>(pos: &P, mv: Move) -> i32 {
    capture_gain(pos, mv) - recapture_value(&pos.apply_move(mv), mv.to)
}

/// Static exchange value of the capture `mv`, never negative.
///
/// The initiating side may always decline, so the result is
/// `max(0, gain - best reply)`.
pub fn see<P: Position>(pos: &P, mv: Move) -> i32 {
    exchange(pos, mv).max(0)
}

#[cfg(test)]
mod tests {
    use warden_core::Board;

    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn undefended_pawn() {
        let b = board("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let mv = b.parse_uci_move("e4d5").unwrap();
        assert_eq!(see(&b, mv), 100);
    }

    #[test]
    fn pawn_takes_defended_pawn() {
        // exd5 Rxd5 Qxd5: Black stops after exd5 since Rxd5 loses the rook.
        let b = board("3r3k/8/8/3p4/4P3/8/3Q4/K7 w - - 0 1");
        let mv = b.parse_uci_move("e4d5").unwrap();
        assert_eq!(see(&b, mv), 100);
    }

    #[test]
    fn queen_takes_defended_pawn() {
        // Qxd5 Rxd5 exd5: queen for pawn and rook.
        let b = board("3r3k/8/8/3p4/4P3/8/3Q4/K7 w - - 0 1");
        let mv = b.parse_uci_move("d2d5").unwrap();
        assert_eq!(exchange(&b, mv), -300);
        assert_eq!(see(&b, mv), 0, "SEE is clamped at zero");
    }

    #[test]
    fn rook_takes_knight_defended_by_pawn() {
        let b = board("4k3/8/2p5/3n4/8/8/8/3RK3 w - - 0 1");
        let mv = b.parse_uci_move("d1d5").unwrap();
        assert_eq!(exchange(&b, mv), 320 - 500);
    }

    #[test]
    fn en_passant_wins_a_pawn() {
        let b = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let mv = b.parse_uci_move("e5d6").unwrap();
        assert_eq!(see(&b, mv), 100);
    }

    #[test]
    fn promotion_capture_counts_promotion_gain() {
        let b = board("3r3k/4P3/8/8/8/8/8/K7 w - - 0 1");
        let mv = b.parse_uci_move("e7d8q").unwrap();
        assert_eq!(see(&b, mv), 500 + 800);
    }

    #[test]
    fn king_recapture_only_when_safe() {
        // Rxe2 Kxe2: the king may take since nothing defends e2.
        let b = board("4r2k/8/8/8/8/8/4N3/4K3 b - - 0 1");
        let mv = b.parse_uci_move("e8e2").unwrap();
        assert_eq!(exchange(&b, mv), 320 - 500);
    }
}
