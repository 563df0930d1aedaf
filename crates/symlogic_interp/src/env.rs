//! The concrete interpreter's environment: argument bindings plus an
//! optional assignment for each `Arbitrary` hole.

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Bindings an evaluation runs under.
///
/// `arguments` holds lambda/cons-function parameters (bound by an enclosing
/// `Function` or introduced fresh by `FSeq.Case`). `arbitrary_assignment`
/// holds concrete values chosen for `Arbitrary` holes; a hole with no entry
/// here evaluates to its kind's default value (spec §4.4/§5).
#[derive(Clone, Default)]
pub struct Env {
    arguments: FxHashMap<u64, Value>,
    arbitrary_assignment: FxHashMap<u64, Value>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    pub fn assign_arbitrary(&mut self, id: u64, value: Value) {
        self.arbitrary_assignment.insert(id, value);
    }

    pub fn bind_argument(&mut self, id: u64, value: Value) {
        self.arguments.insert(id, value);
    }

    /// Returns a clone of this environment with one extra argument binding,
    /// used by `FSeq.Case` to introduce its head/tail parameters without
    /// disturbing the caller's environment.
    pub fn with_argument(&self, id: u64, value: Value) -> Env {
        let mut extended = self.clone();
        extended.bind_argument(id, value);
        extended
    }

    pub fn argument(&self, id: u64) -> Option<&Value> {
        self.arguments.get(&id)
    }

    pub fn arbitrary(&self, id: u64) -> Option<&Value> {
        self.arbitrary_assignment.get(&id)
    }
}
