//! Killer moves: quiet moves that caused a cutoff, remembered per ply.

use warden_core::Move;

use crate::search::negamax::MAX_PLY;

/// Killer slots kept per ply.
pub const KILLERS_PER_PLY: usize = 2;

/// Per-ply FIFO of recent cutoff moves.
///
/// Indexed by ply, not by position: a killer may be illegal where it is
/// consulted, so callers must check it against the legal move list.
#[derive(Clone)]
pub struct KillerTable {
    slots: Box<[[Move; KILLERS_PER_PLY]; MAX_PLY]>,
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: Box::new([[Move::NULL; KILLERS_PER_PLY]; MAX_PLY]),
        }
    }

    /// Remember `mv` as a cutoff move at `ply`.
    ///
    /// The newest move takes slot 0 and the oldest falls out. Storing the move
    /// already in slot 0 changes nothing.
    pub fn store(&mut self, ply: usize, mv: Move) {
        let Some(row) = self.slots.get_mut(ply) else {
            return;
        };
        if row[0] == mv {
            return;
        }
        row.copy_within(0..KILLERS_PER_PLY - 1, 1);
        row[0] = mv;
    }

    /// Killers at `ply`, newest first, null slots skipped.
    pub fn killers(&self, ply: usize) -> impl Iterator<Item = Move> + '_ {
        self.slots
            .get(ply)
            .into_iter()
            .flatten()
            .copied()
            .filter(|m| !m.is_null())
    }

    /// Move every ply's killers `plies` closer to the root.
    ///
    /// Called when the game advances so that cutoffs found two plies below
    /// the old root (same side to move) seed the new root's ordering.
    pub fn shift(&mut self, plies: usize) {
        if plies == 0 {
            return;
        }
        if plies >= MAX_PLY {
            self.clear();
            return;
        }
        self.slots.copy_within(plies.., 0);
        for row in &mut self.slots[MAX_PLY - plies..] {
            *row = [Move::NULL; KILLERS_PER_PLY];
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill([Move::NULL; KILLERS_PER_PLY]);
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KillerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.slots.iter().filter(|row| !row[0].is_null()).count();
        f.debug_struct("KillerTable").field("plies_used", &used).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Square;

    fn has_killer(kt: &KillerTable, ply: usize, mv: Move) -> bool {
        kt.killers(ply).any(|k| k == mv)
    }

    #[test]
    fn killer_store_and_check() {
        let mut kt = KillerTable::new();
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::D2, Square::D4);

        kt.store(5, mv1);
        assert!(has_killer(&kt, 5, mv1));
        assert!(!has_killer(&kt, 5, mv2));

        kt.store(5, mv2);
        assert!(has_killer(&kt, 5, mv1));
        assert!(has_killer(&kt, 5, mv2));
        assert_eq!(kt.killers(5).collect::<Vec<_>>(), vec![mv2, mv1], "newest first");
    }

    #[test]
    fn third_killer_evicts_oldest() {
        let mut kt = KillerTable::new();
        let a = Move::new(Square::E2, Square::E4);
        let b = Move::new(Square::D2, Square::D4);
        let c = Move::new(Square::G1, Square::from_algebraic("f3").unwrap());
        kt.store(1, a);
        kt.store(1, b);
        kt.store(1, c);
        assert!(!has_killer(&kt, 1, a));
        assert_eq!(kt.killers(1).collect::<Vec<_>>(), vec![c, b]);
    }

    #[test]
    fn repeated_store_does_not_shift() {
        let mut kt = KillerTable::new();
        let a = Move::new(Square::E2, Square::E4);
        let b = Move::new(Square::D2, Square::D4);
        kt.store(0, a);
        kt.store(0, b);
        kt.store(0, b);
        assert_eq!(kt.killers(0).collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn shift_moves_killers_toward_root() {
        let mut kt = KillerTable::new();
        let a = Move::new(Square::E2, Square::E4);
        let b = Move::new(Square::D2, Square::D4);
        kt.store(2, a);
        kt.store(3, b);
        kt.store(0, b);

        kt.shift(2);
        assert!(has_killer(&kt, 0, a));
        assert!(has_killer(&kt, 1, b));
        assert!(!has_killer(&kt, 2, a));
        assert_eq!(kt.killers(MAX_PLY - 1).count(), 0);
    }

    #[test]
    fn out_of_range_ply_is_ignored() {
        let mut kt = KillerTable::new();
        let a = Move::new(Square::E2, Square::E4);
        kt.store(MAX_PLY, a);
        assert!(!has_killer(&kt, MAX_PLY, a));
    }
}
