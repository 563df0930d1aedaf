//! The hash-consing table: every expression node lives here exactly once.
//!
//! Grounded on the same intern-by-structural-equality idea as
//! [`symlogic_base::intern::Interner`], generalized from strings to
//! [`ExprKind`] trees. `Arbitrary` is the one exception carved out by
//! spec §3.3/§9: its constructor always allocates a fresh node rather than
//! consulting the index, so two structurally identical `Arbitrary` calls
//! remain distinct holes.

use std::collections::HashMap;
use std::fmt;

use symlogic_types::Kind;

use crate::node::ExprKind;

/// A handle to a node in a [`Store`].
///
/// Two `ExprId`s are equal iff they name the same node; since the store
/// hash-conses everything but `Arbitrary`, structural equality of the
/// underlying [`ExprKind`] implies `ExprId` equality for every other kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u64);

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Node {
    kind: ExprKind,
    result: Kind,
}

/// The process-lifetime table of interned expression nodes.
///
/// A `Store` is not `Sync`; per spec §5, concurrent expression construction
/// from multiple threads must be externally serialized (e.g. behind a
/// `Mutex<Store>`).
#[derive(Default)]
pub struct Store {
    nodes: Vec<Node>,
    index: HashMap<ExprKind, ExprId>,
    next_arbitrary_id: u64,
    next_argument_id: u64,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Store {
            nodes: Vec::new(),
            index: HashMap::new(),
            next_arbitrary_id: 0,
            next_argument_id: 0,
        }
    }

    /// Interns `kind`, returning the existing id if an equal node is
    /// already present. Used for every node kind except `Arbitrary`.
    pub fn intern(&mut self, kind: ExprKind, result: Kind) -> ExprId {
        debug_assert!(
            !matches!(kind, ExprKind::Arbitrary { .. }),
            "Arbitrary nodes must go through Store::fresh, not Store::intern"
        );
        if let Some(&id) = self.index.get(&kind) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u64);
        self.index.insert(kind.clone(), id);
        self.nodes.push(Node { kind, result });
        id
    }

    /// Allocates a node without consulting or updating the hash-consing
    /// index. Used for `Arbitrary`, whose identity must never collapse.
    pub fn fresh(&mut self, kind: ExprKind, result: Kind) -> ExprId {
        let id = ExprId(self.nodes.len() as u64);
        self.nodes.push(Node { kind, result });
        id
    }

    /// Allocates the next `Arbitrary` id. Each call advances the counter;
    /// the id is embedded in the node so hashing/equality on the node still
    /// distinguishes otherwise-identical `Arbitrary` constructions.
    pub fn next_arbitrary_id(&mut self) -> u64 {
        let id = self.next_arbitrary_id;
        self.next_arbitrary_id += 1;
        id
    }

    /// Allocates the next argument id, used for lambda parameters and the
    /// fresh head/tail bindings introduced by `FSeq.Case` lowering.
    pub fn next_argument_id(&mut self) -> u64 {
        let id = self.next_argument_id;
        self.next_argument_id += 1;
        id
    }

    /// Looks up a node's kind.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this store.
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.nodes[id.0 as usize].kind
    }

    /// Looks up a node's statically-declared result kind.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this store.
    pub fn result_kind(&self, id: ExprId) -> &Kind {
        &self.nodes[id.0 as usize].result
    }

    /// The number of distinct nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if no nodes have been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates_structurally_equal_nodes() {
        let mut store = Store::new();
        let a = store.intern(ExprKind::ConstBool(true), Kind::Bool);
        let b = store.intern(ExprKind::ConstBool(true), Kind::Bool);
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn intern_distinguishes_different_nodes() {
        let mut store = Store::new();
        let a = store.intern(ExprKind::ConstBool(true), Kind::Bool);
        let b = store.intern(ExprKind::ConstBool(false), Kind::Bool);
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_never_deduplicates() {
        let mut store = Store::new();
        let id1 = store.next_arbitrary_id();
        let id2 = store.next_arbitrary_id();
        let a = store.fresh(
            ExprKind::Arbitrary { id: id1, kind: Kind::U8, name: None },
            Kind::U8,
        );
        let b = store.fresh(
            ExprKind::Arbitrary { id: id2, kind: Kind::U8, name: None },
            Kind::U8,
        );
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn argument_ids_are_monotonic() {
        let mut store = Store::new();
        assert_eq!(store.next_argument_id(), 0);
        assert_eq!(store.next_argument_id(), 1);
    }
}
