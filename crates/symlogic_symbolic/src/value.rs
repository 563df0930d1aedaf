//! The symbolic value model and its structural `merge` (spec §4.6).
//!
//! Mirrors `symlogic_interp::value::Value`'s one-variant-per-kind shape, but
//! every leaf carries a backend [`Backend::Term`] instead of a host value,
//! and an `FSeq` is a [`GuardedListGroup`] rather than a flat `Vec`.

use rustc_hash::FxHashMap;
use symlogic_base::error::{Error, Result};
use symlogic_base::Symbol;
use symlogic_types::RecordId;

use crate::backend::Backend;

/// A fully-lowered symbolic value for one of the closed universe's kinds.
///
/// `Set<K>` has no dedicated variant for the same reason
/// `symlogic_interp::Value` has none: it is `Map<K, Bool>` under the hood,
/// so [`SymbolicValue::SMap`] covers both.
#[derive(Clone, Debug)]
pub enum SymbolicValue<T> {
    SBool(T),
    SBitvec { term: T, width: u32, signed: bool },
    SBigInt(T),
    SReal(T),
    SChar(T),
    /// `Str`, backed by the same `Seq` theory term as `SSeq` — kept as a
    /// distinct variant only so callers don't have to track an element kind
    /// to tell a string apart from a sequence of some other element.
    SStr(T),
    /// `Seq<T>`, lowered directly onto the backend's own sequence theory —
    /// unlike `FSeq`, its length is never statically bounded, so there is no
    /// guard-per-length structure to build.
    SSeq(T),
    SObject { record: RecordId, fields: Vec<(Symbol, SymbolicValue<T>)> },
    SMap(T),
    SConstMap(Vec<(Symbol, SymbolicValue<T>)>),
    /// `FSeq<T>`, represented as a length-indexed union of guarded,
    /// fixed-length element lists (spec §4.6.1).
    SList(GuardedListGroup<T>),
}

impl<T: Clone> SymbolicValue<T> {
    pub fn as_bool(&self) -> Result<&T> {
        match self {
            SymbolicValue::SBool(t) => Ok(t),
            _ => Err(Error::invariant_violation("expected a symbolic Bool value")),
        }
    }

    pub fn record_field(&self, field: Symbol) -> Option<&SymbolicValue<T>> {
        match self {
            SymbolicValue::SObject { fields, .. } => fields.iter().find(|(name, _)| *name == field).map(|(_, v)| v),
            _ => None,
        }
    }

    /// An `Option` record's `HasValue` field, by position (index 0).
    pub fn option_has_value(&self) -> Option<&T> {
        match self {
            SymbolicValue::SObject { fields, .. } => match fields.first() {
                Some((_, SymbolicValue::SBool(t))) => Some(t),
                _ => None,
            },
            _ => None,
        }
    }

    /// An `Option` record's `Value` field, by position (index 1).
    pub fn option_inner(&self) -> Option<&SymbolicValue<T>> {
        match self {
            SymbolicValue::SObject { fields, .. } => fields.get(1).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// One length bucket of a [`GuardedListGroup`]: `guard` holds in exactly the
/// models where the represented `FSeq` has this `length`, and `values` holds
/// its elements in order.
#[derive(Clone, Debug)]
pub struct GuardedEntry<T> {
    pub length: u32,
    pub guard: T,
    pub values: Vec<SymbolicValue<T>>,
}

/// A symbolic `FSeq<T>`: a mapping `length -> (guard, values)` in which, for
/// any concrete model, at most one entry's guard holds (spec §4.6.1).
#[derive(Clone, Debug)]
pub struct GuardedListGroup<T> {
    pub entries: Vec<GuardedEntry<T>>,
}

impl<T: Clone> GuardedListGroup<T> {
    /// The empty `FSeq`: a single length-0 entry, unconditionally taken.
    pub fn empty(always: T) -> Self {
        GuardedListGroup { entries: vec![GuardedEntry { length: 0, guard: always, values: Vec::new() }] }
    }

    fn find(&self, length: u32) -> Option<&GuardedEntry<T>> {
        self.entries.iter().find(|e| e.length == length)
    }

    /// Lowers `FSeq.AddFront(head, tail)`: `head` is evaluated first (it is
    /// an `Option<elem>`, per the combinator surface), since a `None` head
    /// truncates the result to the empty list regardless of `tail`'s
    /// content, while a `Some` head shifts every one of `tail`'s entries up
    /// by one length and prepends the element (spec §4.6.1).
    pub fn add_front(
        backend: &mut impl Backend<Term = T>,
        head: &SymbolicValue<T>,
        tail: &GuardedListGroup<T>,
    ) -> Result<GuardedListGroup<T>> {
        let has_value = head
            .option_has_value()
            .ok_or_else(|| Error::invariant_violation("FSeq.AddFront head is not a symbolic Option"))?
            .clone();
        let value = head
            .option_inner()
            .ok_or_else(|| Error::invariant_violation("FSeq.AddFront head is not a symbolic Option"))?
            .clone();
        let not_has_value = backend.not(&has_value);

        let mut entries = vec![GuardedEntry { length: 0, guard: not_has_value, values: Vec::new() }];
        for entry in &tail.entries {
            let guard = backend.and(&has_value, &entry.guard);
            let mut values = vec![value.clone()];
            values.extend(entry.values.iter().cloned());
            entries.push(GuardedEntry { length: entry.length + 1, guard, values });
        }
        Ok(GuardedListGroup { entries })
    }

    /// Merges two guarded lists under a top-level condition: `guard` selects
    /// `self` over `other` in every concrete model. Per length bucket, the
    /// chosen guard and values are picked with [`Backend::ite`]/a structural
    /// [`merge`], exactly as `If` does for any other symbolic value.
    pub fn merge(
        backend: &mut impl Backend<Term = T>,
        guard: &T,
        self_: &GuardedListGroup<T>,
        other: &GuardedListGroup<T>,
    ) -> Result<GuardedListGroup<T>> {
        let mut lengths: Vec<u32> = self_.entries.iter().map(|e| e.length).chain(other.entries.iter().map(|e| e.length)).collect();
        lengths.sort_unstable();
        lengths.dedup();

        let mut entries = Vec::with_capacity(lengths.len());
        for length in lengths {
            match (self_.find(length), other.find(length)) {
                (Some(a), Some(b)) => {
                    let merged_guard = backend.ite(guard, &a.guard, &b.guard);
                    let values = a
                        .values
                        .iter()
                        .zip(b.values.iter())
                        .map(|(av, bv)| merge(backend, guard, av, bv))
                        .collect::<Result<Vec<_>>>()?;
                    entries.push(GuardedEntry { length, guard: merged_guard, values });
                }
                (Some(a), None) => {
                    let merged_guard = backend.and(guard, &a.guard);
                    entries.push(GuardedEntry { length, guard: merged_guard, values: a.values.clone() });
                }
                (None, Some(b)) => {
                    let not_guard = backend.not(guard);
                    let merged_guard = backend.and(&not_guard, &b.guard);
                    entries.push(GuardedEntry { length, guard: merged_guard, values: b.values.clone() });
                }
                (None, None) => unreachable!("length collected from one of the two lists"),
            }
        }
        Ok(GuardedListGroup { entries })
    }
}

/// Structural `If`/guarded-list merge (spec §4.6.1, §4.6.4): both branches
/// of a symbolic `If` are always fully lowered (no short-circuiting on a
/// non-constant guard), then combined leaf-by-leaf with
/// [`Backend::ite`]/`Backend::and`/`Backend::or`.
///
/// `then_` and `else_` are required to share a shape — both sides of an
/// `If` or an `FSeq.Case` branch are type-checked against the same `Kind`
/// before evaluation ever reaches here. A mismatch is therefore an
/// evaluator bug rather than a possible outcome of a well-typed program,
/// and is reported as [`Error::invariant_violation`] rather than a panic
/// so a caller gets a normal `Err` instead of an aborted process.
pub fn merge<T: Clone>(backend: &mut impl Backend<Term = T>, guard: &T, then_: &SymbolicValue<T>, else_: &SymbolicValue<T>) -> Result<SymbolicValue<T>> {
    Ok(match (then_, else_) {
        (SymbolicValue::SBool(a), SymbolicValue::SBool(b)) => SymbolicValue::SBool(backend.ite(guard, a, b)),
        (SymbolicValue::SBitvec { term: a, width, signed }, SymbolicValue::SBitvec { term: b, .. }) => {
            SymbolicValue::SBitvec { term: backend.ite(guard, a, b), width: *width, signed: *signed }
        }
        (SymbolicValue::SBigInt(a), SymbolicValue::SBigInt(b)) => SymbolicValue::SBigInt(backend.ite(guard, a, b)),
        (SymbolicValue::SReal(a), SymbolicValue::SReal(b)) => SymbolicValue::SReal(backend.ite(guard, a, b)),
        (SymbolicValue::SChar(a), SymbolicValue::SChar(b)) => SymbolicValue::SChar(backend.ite(guard, a, b)),
        (SymbolicValue::SStr(a), SymbolicValue::SStr(b)) => SymbolicValue::SStr(backend.ite(guard, a, b)),
        (SymbolicValue::SSeq(a), SymbolicValue::SSeq(b)) => SymbolicValue::SSeq(backend.ite(guard, a, b)),
        (SymbolicValue::SMap(a), SymbolicValue::SMap(b)) => SymbolicValue::SMap(backend.ite(guard, a, b)),
        (SymbolicValue::SObject { record, fields: a }, SymbolicValue::SObject { fields: b, .. }) => {
            let fields = a
                .iter()
                .zip(b.iter())
                .map(|((name, av), (_, bv))| merge(backend, guard, av, bv).map(|v| (*name, v)))
                .collect::<Result<Vec<_>>>()?;
            SymbolicValue::SObject { record: *record, fields }
        }
        (SymbolicValue::SConstMap(a), SymbolicValue::SConstMap(b)) => {
            let entries = a
                .iter()
                .zip(b.iter())
                .map(|((name, av), (_, bv))| merge(backend, guard, av, bv).map(|v| (*name, v)))
                .collect::<Result<Vec<_>>>()?;
            SymbolicValue::SConstMap(entries)
        }
        (SymbolicValue::SList(a), SymbolicValue::SList(b)) => SymbolicValue::SList(GuardedListGroup::merge(backend, guard, a, b)?),
        _ => return Err(Error::invariant_violation("merge of mismatched SymbolicValue shapes: construction guarantees both branches share a kind")),
    })
}

/// A witness map from `Arbitrary` node id to the fresh backend value
/// allocated for it on first visit (spec §4.6.3). Threaded by mutable
/// reference through the whole evaluation, never scoped per `FSeq.Case`
/// branch, since the same `Arbitrary` id always denotes the same variable
/// regardless of which branch happens to reach it.
pub type WitnessMap<T> = FxHashMap<u64, SymbolicValue<T>>;
