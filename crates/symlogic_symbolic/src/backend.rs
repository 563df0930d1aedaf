//! The backend abstraction (spec §4.7).
//!
//! A [`Backend`] exposes one erased associated `Term` for every value it
//! constructs, the same division of labor the teacher's Z3 encoder drew
//! between `Dynamic<'ctx>` and its sort-specific `as_int`/`as_bool`
//! accessors. Unlike that encoder, [`crate::value::SymbolicValue`] already
//! tags each term with its sort, so nothing here needs to downcast: the
//! evaluator picks the matching `Backend` method directly instead of trying
//! a `Dynamic` and falling back.
//!
//! One method per node spec §3.2 can lower to, grouped by sort. A backend
//! that cannot represent a feature (e.g. a BDD backend asked for `Seq`
//! theory) returns `Err(Error::backend_unsupported(..))` rather than
//! panicking.

use num_bigint::BigInt;
use symlogic_base::error::Result;
use symlogic_expr::{CombineOp, ContainsKind, Rational, RegexExpr};

/// A backend-visible sort descriptor.
///
/// `Term`s are erased, but a backend still needs to know what it is
/// declaring when it allocates a fresh `Seq`/array-sorted variable or packs
/// an `Option<V>` into an array's range — there is no way to recover that
/// from an opaque `Term` alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sort {
    Bool,
    Bv(u32),
    Int,
    Real,
    Char,
    Str,
    Seq(Box<Sort>),
}

/// A solver backend capable of lowering the closed expression universe onto
/// its own term representation and deciding satisfiability.
pub trait Backend {
    /// One term of any sort this backend can represent.
    type Term: Clone;
    /// A satisfying assignment, read back via [`Backend::model_value`].
    type Model;

    // ---- booleans -----------------------------------------------------
    fn bool_const(&mut self, value: bool) -> Self::Term;
    fn bool_var(&mut self, name: &str) -> Self::Term;
    fn and(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn or(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn not(&mut self, a: &Self::Term) -> Self::Term;
    fn iff(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    /// Selects `then_` when `cond` holds, `else_` otherwise. Used both for
    /// `If` and to merge the branches of a symbolic `If`/guarded-list case.
    fn ite(&mut self, cond: &Self::Term, then_: &Self::Term, else_: &Self::Term) -> Self::Term;

    // ---- fixed-width bitvectors -----------------------------------------
    fn bv_const(&mut self, width: u32, bits: u64) -> Self::Term;
    fn bv_var(&mut self, width: u32, name: &str) -> Self::Term;
    fn bv_add(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn bv_sub(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn bv_mul(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn bv_and(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn bv_or(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn bv_xor(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn bv_not(&mut self, a: &Self::Term) -> Self::Term;
    fn bv_min(&mut self, a: &Self::Term, b: &Self::Term, signed: bool) -> Self::Term;
    fn bv_max(&mut self, a: &Self::Term, b: &Self::Term, signed: bool) -> Self::Term;
    fn bv_lt(&mut self, a: &Self::Term, b: &Self::Term, signed: bool) -> Self::Term;
    fn bv_leq(&mut self, a: &Self::Term, b: &Self::Term, signed: bool) -> Self::Term;
    fn bv_cast(&mut self, value: &Self::Term, from_width: u32, to_width: u32, from_signed: bool) -> Self::Term;

    // ---- arbitrary-precision integers ------------------------------------
    fn int_const(&mut self, value: &BigInt) -> Self::Term;
    fn int_var(&mut self, name: &str) -> Self::Term;
    fn int_add(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn int_sub(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn int_mul(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn int_min(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn int_max(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn int_lt(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn int_leq(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;

    // ---- reals --------------------------------------------------------------
    fn real_const(&mut self, value: Rational) -> Self::Term;
    fn real_var(&mut self, name: &str) -> Self::Term;
    fn real_add(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn real_sub(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn real_mul(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn real_min(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn real_max(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn real_lt(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn real_leq(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;

    // ---- chars --------------------------------------------------------------
    fn char_const(&mut self, value: char) -> Self::Term;
    fn char_var(&mut self, name: &str) -> Self::Term;
    fn char_lt(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    fn char_leq(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;

    // ---- equality, generic over any one like-sorted pair ------------------------
    fn eq(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;

    // ---- Seq<T> (also backs Str = Seq<Char>) -------------------------------------
    fn seq_var(&mut self, elem: &Sort, name: &str) -> Self::Term;
    fn seq_empty(&mut self, elem: &Sort) -> Self::Term;
    /// A string literal, as a `Str`-sorted term.
    fn str_const(&mut self, value: &str) -> Self::Term;
    fn seq_unit(&mut self, value: &Self::Term) -> Self::Term;
    fn seq_concat(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;
    /// Length as an `Int` term.
    fn seq_length(&mut self, seq: &Self::Term) -> Self::Term;
    /// Unchecked element access, bounds already established by the caller.
    fn seq_nth(&mut self, seq: &Self::Term, index: &Self::Term) -> Self::Term;
    fn seq_contains(&mut self, haystack: &Self::Term, needle: &Self::Term, mode: ContainsKind) -> Self::Term;
    /// Index of the first occurrence of `needle`, or `-1` as an `Int` term.
    fn seq_index_of(&mut self, haystack: &Self::Term, needle: &Self::Term) -> Self::Term;
    fn seq_slice(&mut self, seq: &Self::Term, offset: &Self::Term, length: &Self::Term) -> Self::Term;
    fn seq_replace_first(&mut self, seq: &Self::Term, pattern: &Self::Term, replacement: &Self::Term) -> Self::Term;
    /// `true` iff `0 <= index < length(seq)`, used to decide `Seq.At`'s `Option` wrapper.
    fn seq_in_bounds(&mut self, seq: &Self::Term, index: &Self::Term) -> Self::Term;
    fn int_const_from_i64(&mut self, value: i64) -> Self::Term;
    /// `true` iff `seq` (of `Char`) matches the compiled regular language.
    fn seq_matches_regex(&mut self, seq: &Self::Term, regex: &RegexExpr) -> Result<Self::Term>;

    // ---- Map<K, V> (arrays lifted through Option<V>) and Set<K> -----------------
    /// A fresh array-sorted variable over `key`/`value`; the range is the
    /// backend's own encoding of `Option<value>` (e.g. a Z3 datatype sort),
    /// packed and unpacked via [`Backend::option_pack`]/
    /// [`Backend::option_unpack_has_value`]/[`Backend::option_unpack_value`].
    fn array_var(&mut self, key: &Sort, value: &Sort, name: &str) -> Self::Term;
    /// An array every key maps to `default` (already an `Option`-packed term).
    fn array_const(&mut self, key: &Sort, default: &Self::Term) -> Self::Term;
    fn array_select(&mut self, array: &Self::Term, key: &Self::Term) -> Self::Term;
    fn array_store(&mut self, array: &Self::Term, key: &Self::Term, value: &Self::Term) -> Self::Term;
    /// Pointwise array combination, lowering `Map.Combine`'s set-algebra
    /// operator via a `ite`-based map/lambda the same way the evaluator
    /// would build by hand, but left to the backend since only it knows how
    /// to express a pointwise array update efficiently. A backend without a
    /// bounded-domain quantifier encoding returns
    /// `Err(Error::backend_unsupported(..))` rather than guessing.
    fn array_combine(&mut self, op: CombineOp, left: &Self::Term, right: &Self::Term) -> Result<Self::Term>;
    /// Packs a presence bit and a value into one `Option<V>`-sorted term.
    fn option_pack(&mut self, value_sort: &Sort, has_value: &Self::Term, value: &Self::Term) -> Self::Term;
    /// Projects the presence bit out of an `Option<V>`-sorted term.
    fn option_unpack_has_value(&mut self, value_sort: &Sort, packed: &Self::Term) -> Self::Term;
    /// Projects the value out of an `Option<V>`-sorted term.
    fn option_unpack_value(&mut self, value_sort: &Sort, packed: &Self::Term) -> Self::Term;

    // ---- queries ----------------------------------------------------------------
    /// Finds a model satisfying the conjunction of `assertions`, or `None`
    /// if unsatisfiable.
    fn solve(&mut self, assertions: &[Self::Term]) -> Result<Option<Self::Model>>;
    /// Reads a boolean-sorted term's value out of a model.
    fn model_bool(&self, model: &Self::Model, term: &Self::Term) -> Option<bool>;
    /// Reads a numeric (bitvector/int/real) term's value out of a model as
    /// an exact rational, so a caller can format it for whichever kind the
    /// term actually has.
    fn model_rational(&self, model: &Self::Model, term: &Self::Term) -> Option<Rational>;
    fn model_char(&self, model: &Self::Model, term: &Self::Term) -> Option<char>;
    fn model_string(&self, model: &Self::Model, term: &Self::Term) -> Option<String>;
}
