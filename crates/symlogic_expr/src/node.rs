//! The expression node set (spec §3.2): constants, variables, and one
//! constructor per operation the combinator surface exposes.

use num_bigint::BigInt;
use symlogic_base::Symbol;
use symlogic_types::{Kind, RecordId};

use crate::ExprId;

/// An exact rational number: `num / den`, always stored in lowest terms
/// with a positive denominator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    /// Builds a rational from a numerator and denominator, reducing to
    /// lowest terms.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "rational denominator must not be zero");
        let sign = if den < 0 { -1 } else { 1 };
        let (num, den) = (num * sign, den * sign);
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1);
        Rational {
            num: num / g as i64,
            den: den / g as i64,
        }
    }

    /// Builds a rational equal to the integer `n`.
    pub fn from_int(n: i64) -> Self {
        Rational { num: n, den: 1 }
    }

    /// The numerator, in lowest terms.
    pub fn numerator(self) -> i64 {
        self.num
    }

    /// The denominator, in lowest terms and always positive.
    pub fn denominator(self) -> i64 {
        self.den
    }

    /// Exact addition.
    pub fn add(self, other: Rational) -> Rational {
        Rational::new(
            self.num * other.den + other.num * self.den,
            self.den * other.den,
        )
    }

    /// Exact subtraction.
    pub fn sub(self, other: Rational) -> Rational {
        Rational::new(
            self.num * other.den - other.num * self.den,
            self.den * other.den,
        )
    }

    /// Exact multiplication.
    pub fn mul(self, other: Rational) -> Rational {
        Rational::new(self.num * other.num, self.den * other.den)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Which side(s) of a haystack `Seq.Contains` checks against the needle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ContainsKind {
    /// The needle must match a prefix of the haystack.
    Prefix,
    /// The needle must match a suffix of the haystack.
    Suffix,
    /// The needle may occur anywhere in the haystack.
    Infix,
}

/// `Map.Combine`'s set-algebra operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CombineOp {
    /// Union: keys present in either map.
    Union,
    /// Intersection: keys present in both maps.
    Intersect,
    /// Difference: keys present in the left map but not the right.
    Difference,
}

/// A small regex AST, consumed only by a backend that implements SMT
/// sequence/regex theory (spec §6.3). The BDD backend rejects every variant.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RegexExpr {
    /// Matches exactly this literal string.
    Literal(String),
    /// Matches one character in the inclusive range `[lo, hi]`.
    Range(char, char),
    /// Matches either alternative.
    Union(Box<RegexExpr>, Box<RegexExpr>),
    /// Matches strings accepted by both alternatives.
    Intersect(Box<RegexExpr>, Box<RegexExpr>),
    /// Matches the first pattern followed by the second.
    Concat(Box<RegexExpr>, Box<RegexExpr>),
    /// Matches zero or more repetitions.
    Star(Box<RegexExpr>),
    /// Matches any string the inner pattern does not match (SMT backend only).
    Negate(Box<RegexExpr>),
}

/// One node in the expression DAG.
///
/// `ExprKind` is hash-consable: two structurally equal kinds (down to their
/// child [`ExprId`]s) are `==`, which the [`crate::store::Store`] relies on
/// to return the same id for the same expression. `Arbitrary` is the one
/// exception: its constructor never consults the hash-consing index, so
/// equal-looking `Arbitrary` calls still produce distinct nodes (spec §3.3).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ExprKind {
    /// A boolean literal.
    ConstBool(bool),
    /// A fixed-width integer literal, stored as its two's-complement bit
    /// pattern; `width` and `signed` select how it prints and compares.
    ConstBv { width: u32, signed: bool, bits: u64 },
    /// An arbitrary-precision integer literal.
    ConstBigInt(BigInt),
    /// An exact rational literal.
    ConstReal(Rational),
    /// A Unicode scalar value literal.
    ConstChar(char),
    /// A string literal.
    ConstStr(String),

    /// A symbolic hole of the given kind. `id` alone determines identity;
    /// `name` is advisory (used for human-readable model readback).
    Arbitrary { id: u64, kind: Kind, name: Option<Symbol> },
    /// A reference to a lambda/cons-function parameter bound by an
    /// enclosing `Function` or `FSeq.Case`.
    Argument { id: u64, kind: Kind },

    /// Conjunction of one or more operands.
    And(Vec<ExprId>),
    /// Disjunction of one or more operands.
    Or(Vec<ExprId>),
    /// Boolean negation.
    Not(ExprId),
    /// Boolean biconditional.
    Iff(ExprId, ExprId),
    /// Conditional: `cond` selects between `then_` and `else_`.
    If { cond: ExprId, then_: ExprId, else_: ExprId },

    /// Numeric addition.
    Add(ExprId, ExprId),
    /// Numeric subtraction.
    Sub(ExprId, ExprId),
    /// Numeric multiplication.
    Mul(ExprId, ExprId),

    /// Bitwise AND on a fixed-width kind.
    BitAnd(ExprId, ExprId),
    /// Bitwise OR on a fixed-width kind.
    BitOr(ExprId, ExprId),
    /// Bitwise XOR on a fixed-width kind.
    BitXor(ExprId, ExprId),
    /// Bitwise complement on a fixed-width kind.
    BitNot(ExprId),
    /// Bitwise/numeric maximum.
    Max(ExprId, ExprId),
    /// Bitwise/numeric minimum.
    Min(ExprId, ExprId),

    /// Structural/value equality.
    Eq(ExprId, ExprId),
    /// Strictly-less-than, signedness chosen by the operand kind.
    Lt(ExprId, ExprId),
    /// Less-than-or-equal.
    Leq(ExprId, ExprId),
    /// Strictly-greater-than.
    Gt(ExprId, ExprId),
    /// Greater-than-or-equal.
    Geq(ExprId, ExprId),
    /// Reinterpret/widen/narrow between fixed-width integer kinds.
    Cast { expr: ExprId, target: Kind },

    /// Builds a record value from a complete field assignment.
    CreateObject { record: RecordId, fields: Vec<(Symbol, ExprId)> },
    /// Projects a named field out of a record value.
    GetField { object: ExprId, field: Symbol },
    /// Produces a copy of a record value with one field replaced.
    WithField { object: ExprId, field: Symbol, value: ExprId },

    /// The empty `FSeq`.
    FSeqEmpty { elem: Kind },
    /// Prepends an `Option<elem>` head onto a tail `FSeq`.
    FSeqAddFront { head: ExprId, tail: ExprId },
    /// Case-splits on whether `list` is empty, binding `head_arg`/`tail_arg`
    /// to fresh argument ids inside `cons_body` for the non-empty case.
    FSeqCase {
        list: ExprId,
        empty_expr: ExprId,
        head_arg: u64,
        tail_arg: u64,
        cons_body: ExprId,
    },

    /// The empty `Seq`.
    SeqEmpty { elem: Kind },
    /// A single-element `Seq`.
    SeqUnit(ExprId),
    /// Concatenation of two sequences.
    SeqConcat(ExprId, ExprId),
    /// The length of a sequence.
    SeqLength(ExprId),
    /// Bounds-checked element access; out-of-range yields `Option::None`.
    SeqAt(ExprId, ExprId),
    /// Unchecked element access, used where bounds are already established.
    SeqNth(ExprId, ExprId),
    /// Substring/subsequence containment test.
    SeqContains { haystack: ExprId, needle: ExprId, mode: ContainsKind },
    /// The index of the first occurrence of `needle` in `haystack`, or `-1`.
    SeqIndexOf { haystack: ExprId, needle: ExprId },
    /// `(offset, length)` slicing; out-of-range clamps to the empty sequence.
    SeqSlice { seq: ExprId, offset: ExprId, length: ExprId },
    /// Replaces the first occurrence of `pattern` with `replacement`.
    SeqReplaceFirst { seq: ExprId, pattern: ExprId, replacement: ExprId },
    /// Tests whether `seq` matches a regular language.
    SeqMatchesRegex { seq: ExprId, regex: RegexExpr },

    /// The empty `Map`/`Set` (all keys absent).
    MapEmpty { key: Kind, value: Kind },
    /// Associates `key` with `value`, overwriting any prior association.
    MapSet { map: ExprId, key: ExprId, value: ExprId },
    /// Removes any association for `key`.
    MapDelete { map: ExprId, key: ExprId },
    /// Looks up `key`, returning `Option<value>`.
    MapGet { map: ExprId, key: ExprId },
    /// Combines two maps with a set-algebra operator.
    MapCombine { op: CombineOp, left: ExprId, right: ExprId },

    /// Associates a statically-known key with a value in a `ConstMap`.
    ConstMapSet { map: ExprId, key: Symbol, value: ExprId },
    /// Looks up a statically-known key in a `ConstMap`.
    ConstMapGet { map: ExprId, key: Symbol },
}
