//! The symbolic evaluator's environment: argument bindings only.
//!
//! Unlike `symlogic_interp::Env`, there is no `Arbitrary` assignment map
//! here — every `Arbitrary` hole becomes a fresh backend variable on first
//! visit (spec §4.6.3), tracked separately in `crate::value::WitnessMap`
//! since that map must survive across the fresh per-`Case`-entry
//! environments this type's `with_argument` produces.

use rustc_hash::FxHashMap;

use crate::value::SymbolicValue;

/// Argument (lambda/`FSeq.Case` parameter) bindings an evaluation runs under.
#[derive(Clone)]
pub struct SymbolicEnv<T> {
    arguments: FxHashMap<u64, SymbolicValue<T>>,
}

impl<T: Clone> Default for SymbolicEnv<T> {
    fn default() -> Self {
        SymbolicEnv { arguments: FxHashMap::default() }
    }
}

impl<T: Clone> SymbolicEnv<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_argument(&mut self, id: u64, value: SymbolicValue<T>) {
        self.arguments.insert(id, value);
    }

    /// A clone of this environment with one extra argument binding, used by
    /// `FSeq.Case` to introduce its head/tail parameters per guarded entry
    /// without disturbing the caller's environment or any sibling entry's.
    pub fn with_argument(&self, id: u64, value: SymbolicValue<T>) -> SymbolicEnv<T> {
        let mut extended = self.clone();
        extended.bind_argument(id, value);
        extended
    }

    pub fn argument(&self, id: u64) -> Option<&SymbolicValue<T>> {
        self.arguments.get(&id)
    }
}
