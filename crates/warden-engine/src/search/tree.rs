//! Retained tree of explored positions.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Full positions
//! are not stored in the nodes: they are fetched from a [`PositionCache`] and,
//! when the cache has dropped them, rebuilt by replaying moves from the root.
//!
//! When the game advances, [`PositionTree::rebase`] keeps only the subtree
//! under the new current position and starts a fresh position cache.

use std::fmt;

use warden_core::{Color, Move, Position};

use crate::analysis::AnalysisResult;
use crate::search::position_cache::PositionCache;

/// Index of a node in a [`PositionTree`]. Invalidated by [`PositionTree::rebase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    parent: Option<NodeId>,
    mv: Option<Move>,
    hash: u64,
    hash2: u64,
    side: Color,
    depth: usize,
    children: Vec<NodeId>,
    result: Option<AnalysisResult>,
}

/// A move, its recorded value and the continuations explored below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    /// `None` for the root of the variation tree.
    pub mv: Option<Move>,
    pub result: Option<AnalysisResult>,
    /// Best continuation first, from the point of view of the side to move.
    pub continuations: Vec<Variation>,
}

impl Variation {
    /// Moves along the first continuation at every level.
    pub fn principal_line(&self) -> Vec<Move> {
        let mut line = Vec::new();
        let mut current = self;
        while let Some(next) = current.continuations.first() {
            if let Some(mv) = next.mv {
                line.push(mv);
            }
            current = next;
        }
        line
    }
}

/// Arena of positions reachable from a root, with per-node results.
pub struct PositionTree<P> {
    nodes: Vec<TreeNode>,
    root_position: P,
    positions: PositionCache<P>,
}

impl<P: Position> PositionTree<P> {
    /// A tree containing only `root`.
    pub fn new(root: P, position_cache_capacity: usize) -> Self {
        let mut positions = PositionCache::new(position_cache_capacity);
        positions.insert(root.clone());
        Self {
            nodes: vec![Self::make_node(&root, None, None, 0)],
            root_position: root,
            positions,
        }
    }

    fn make_node(pos: &P, parent: Option<NodeId>, mv: Option<Move>, depth: usize) -> TreeNode {
        TreeNode {
            parent,
            mv,
            hash: pos.hash(),
            hash2: pos.hash2(),
            side: pos.active_side(),
            depth,
            children: Vec::new(),
            result: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_position(&self) -> &P {
        &self.root_position
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The child of `node` reached by `mv`, created if missing.
    ///
    /// `mv` must be legal in the position at `node`.
    pub fn child(&mut self, node: NodeId, mv: Move) -> NodeId {
        if let Some(&existing) = self.nodes[node.0]
            .children
            .iter()
            .find(|&&c| self.nodes[c.0].mv == Some(mv))
        {
            return existing;
        }
        let next = self.position(node).apply_move(mv);
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[node.0].depth + 1;
        self.nodes.push(Self::make_node(&next, Some(node), Some(mv), depth));
        self.nodes[node.0].children.push(id);
        self.positions.insert(next);
        id
    }

    /// Walk (and create) the path `line` below `node`; returns the last node.
    pub fn extend_line(&mut self, node: NodeId, line: &[Move]) -> NodeId {
        line.iter().fold(node, |at, &mv| self.child(at, mv))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// The move that reached `node` from its parent.
    pub fn move_to(&self, node: NodeId) -> Option<Move> {
        self.nodes[node.0].mv
    }

    /// Attach the latest result computed for `node`.
    pub fn record(&mut self, node: NodeId, result: AnalysisResult) {
        self.nodes[node.0].result = Some(result);
    }

    pub fn result(&self, node: NodeId) -> Option<AnalysisResult> {
        self.nodes[node.0].result
    }

    /// Plies from the root.
    pub fn depth_of(&self, node: NodeId) -> usize {
        self.nodes[node.0].depth
    }

    /// The position at `node`, from the cache or rebuilt from the root.
    pub fn position(&mut self, node: NodeId) -> P {
        let target = &self.nodes[node.0];
        if let Some(pos) = self.positions.get(target.hash, target.hash2) {
            return pos.clone();
        }

        let mut path = Vec::with_capacity(target.depth);
        let mut at = node;
        while let (Some(parent), Some(mv)) = (self.nodes[at.0].parent, self.nodes[at.0].mv) {
            path.push(mv);
            at = parent;
        }
        let pos = path
            .iter()
            .rev()
            .fold(self.root_position.clone(), |pos, &mv| pos.apply_move(mv));
        self.positions.insert(pos.clone());
        pos
    }

    /// Find a node holding the position with these hashes, at most
    /// `max_depth` plies below the root.
    pub fn find(&self, hash: u64, hash2: u64, max_depth: usize) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.depth <= max_depth && n.hash == hash && n.hash2 == hash2)
            .map(NodeId)
    }

    /// Make `node` the new root, discarding everything outside its subtree.
    ///
    /// All previous [`NodeId`]s are invalidated. The position cache is replaced
    /// by a fresh one holding only the new root.
    pub fn rebase(&mut self, node: NodeId) -> NodeId {
        let new_root_position = self.position(node);
        let base_depth = self.nodes[node.0].depth;

        let mut nodes: Vec<TreeNode> = Vec::new();
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(node, None)];
        while let Some((old, new_parent)) = stack.pop() {
            let src = &self.nodes[old.0];
            let id = NodeId(nodes.len());
            nodes.push(TreeNode {
                parent: new_parent,
                mv: if new_parent.is_some() { src.mv } else { None },
                hash: src.hash,
                hash2: src.hash2,
                side: src.side,
                depth: src.depth - base_depth,
                children: Vec::with_capacity(src.children.len()),
                result: src.result,
            });
            if let Some(parent) = new_parent {
                nodes[parent.0].children.push(id);
            }
            for &c in src.children.iter().rev() {
                stack.push((c, Some(id)));
            }
        }

        let mut positions = PositionCache::new(self.positions.capacity());
        positions.insert(new_root_position.clone());

        self.nodes = nodes;
        self.root_position = new_root_position;
        self.positions = positions;
        self.root()
    }

    /// Recorded continuations below `node`, best first.
    pub fn variation(&self, node: NodeId) -> Variation {
        let n = &self.nodes[node.0];
        let mut continuations: Vec<Variation> = n
            .children
            .iter()
            .filter(|&&c| self.nodes[c.0].result.is_some())
            .map(|&c| self.variation(c))
            .collect();
        let side = n.side;
        continuations.sort_by_key(|v| {
            std::cmp::Reverse(v.result.map_or(i32::MIN, |r| r.relative_to(side)))
        });
        Variation {
            mv: n.mv,
            result: n.result,
            continuations,
        }
    }

    /// Positions currently held by the position cache.
    pub fn cached_positions(&self) -> usize {
        self.positions.len()
    }
}

impl<P> fmt::Debug for PositionTree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionTree")
            .field("nodes", &self.nodes.len())
            .field("positions", &self.positions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{Board, Square};

    use super::*;

    fn mv(text: &str) -> Move {
        Move::from_uci(text).unwrap()
    }

    #[test]
    fn child_is_get_or_insert() {
        let mut tree = PositionTree::new(Board::starting_position(), 64);
        let root = tree.root();
        let a = tree.child(root, mv("e2e4"));
        let b = tree.child(root, mv("e2e4"));
        assert_eq!(a, b);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.depth_of(a), 1);
        assert_eq!(tree.move_to(a), Some(Move::new(Square::E2, Square::E4)));
        assert_eq!(tree.parent(a), Some(root));
    }

    #[test]
    fn position_rebuilt_without_cache() {
        // Capacity 0: nothing is ever cached, every lookup replays.
        let mut tree = PositionTree::new(Board::starting_position(), 0);
        let root = tree.root();
        let leaf = tree.extend_line(root, &[mv("e2e4"), mv("e7e5"), mv("g1f3")]);
        let expected = Board::starting_position()
            .play_uci("e2e4")
            .and_then(|b| b.play_uci("e7e5"))
            .and_then(|b| b.play_uci("g1f3"))
            .unwrap();
        assert_eq!(tree.position(leaf).hash(), expected.hash());
        assert_eq!(tree.cached_positions(), 0);
    }

    #[test]
    fn find_respects_depth_limit() {
        let mut tree = PositionTree::new(Board::starting_position(), 64);
        let root = tree.root();
        let leaf = tree.extend_line(root, &[mv("g1f3"), mv("g8f6")]);
        let pos = tree.position(leaf);
        assert_eq!(tree.find(pos.hash(), pos.hash2(), 2), Some(leaf));
        assert_eq!(tree.find(pos.hash(), pos.hash2(), 1), None);
    }

    #[test]
    fn rebase_keeps_only_subtree() {
        let mut tree = PositionTree::new(Board::starting_position(), 64);
        let root = tree.root();
        let e4 = tree.child(root, mv("e2e4"));
        let _d4 = tree.child(root, mv("d2d4"));
        let e5 = tree.child(e4, mv("e7e5"));
        let c5 = tree.child(e4, mv("c7c5"));
        tree.record(e5, AnalysisResult::estimate(20, 0));
        tree.record(c5, AnalysisResult::estimate(40, 0));
        let e4_pos = tree.position(e4);

        let new_root = tree.rebase(e4);
        assert_eq!(tree.len(), 3, "e4 and its two replies survive");
        assert_eq!(tree.depth_of(new_root), 0);
        assert_eq!(tree.move_to(new_root), None);
        assert_eq!(tree.parent(new_root), None);
        assert_eq!(tree.root_position().hash(), e4_pos.hash());
        assert_eq!(tree.cached_positions(), 1, "fresh position cache");

        let kept: Vec<Option<Move>> = tree.children(new_root).iter().map(|&c| tree.move_to(c)).collect();
        assert_eq!(kept, vec![Some(mv("e7e5")), Some(mv("c7c5"))]);
        assert!(tree.children(new_root).iter().all(|&c| tree.depth_of(c) == 1));
    }

    #[test]
    fn rebase_matches_fresh_tree() {
        let start = Board::starting_position();
        let mut tree = PositionTree::new(start.clone(), 64);
        let child = tree.child(tree.root(), mv("d2d4"));
        let new_root = tree.rebase(child);

        let mut fresh = PositionTree::new(start.play_uci("d2d4").unwrap(), 64);
        let fresh_root = fresh.root();
        assert_eq!(tree.position(new_root), fresh.position(fresh_root));
        assert_eq!(tree.cached_positions(), fresh.cached_positions());
        assert_eq!(tree.len(), fresh.len());
    }

    #[test]
    fn variation_orders_by_side_to_move() {
        let mut tree = PositionTree::new(Board::starting_position(), 64);
        let root = tree.root();
        let a = tree.child(root, mv("a2a3"));
        let e = tree.child(root, mv("e2e4"));
        tree.record(a, AnalysisResult::estimate(-5, 0));
        tree.record(e, AnalysisResult::estimate(30, 0));
        let reply = tree.child(e, mv("e7e5"));
        tree.record(reply, AnalysisResult::estimate(25, 0));

        let v = tree.variation(root);
        assert_eq!(v.continuations[0].mv, Some(mv("e2e4")), "White prefers the higher score");
        assert_eq!(v.principal_line(), vec![mv("e2e4"), mv("e7e5")]);
    }
}
