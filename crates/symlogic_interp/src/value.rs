//! The concrete value model: one variant per element [`Kind`].
//!
//! Narrowed from `logicaffeine_compile::interpreter`'s `RuntimeValue`
//! tree-walked value to exactly the closed universe in `symlogic_types`, with
//! no VFS or async surface to carry over.

use std::cmp::Ordering;

use num_bigint::BigInt;
use symlogic_base::Symbol;
use symlogic_expr::Rational;
use symlogic_types::{Kind, RecordId, Registry};

/// A fully-evaluated value for one of the closed universe's kinds.
///
/// `Set<K>` has no dedicated variant: per the type universe's own
/// definition, a set is `Map<K, Bool>`, so [`Value::Map`] covers both.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    /// A fixed- or arbitrary-width bitvector, stored as its bit pattern
    /// already masked to `width`. `signed` governs ordering, not storage.
    Bv { width: u32, signed: bool, bits: u64 },
    BigInt(BigInt),
    Real(Rational),
    Char(char),
    Str(String),
    /// A reflected record's field values, in the declaration order fixed by
    /// its [`RecordId`].
    Record { record: RecordId, fields: Vec<(Symbol, Value)> },
    /// A depth-bounded finite sequence.
    FSeq(Vec<Value>),
    /// An unbounded sequence.
    Seq(Vec<Value>),
    /// `Map<K, V>` (and, when `V` is `Bool`, `Set<K>`): an association list,
    /// last write wins, absent key reads back `None` through `MapGet`.
    Map(Vec<(Value, Value)>),
    /// A `ConstMap`: every statically-enumerated key always has an entry.
    ConstMap(Vec<(Symbol, Value)>),
}

impl Value {
    /// Builds `Option::some(inner)`. `synthesize_option` always lays a
    /// record's fields out as `[HasValue, Value]`, so the encoding is
    /// positional rather than name-keyed — no registry lookup needed.
    pub fn option_some(inner: Value, record: RecordId, has_value_name: Symbol, value_name: Symbol) -> Value {
        Value::Record {
            record,
            fields: vec![(has_value_name, Value::Bool(true)), (value_name, inner)],
        }
    }

    /// `true`/`false` for an `Option` record's `HasValue` field, by position
    /// (index 0), or `None` if this isn't an `Option` record at all.
    pub fn is_option_present(&self) -> Option<bool> {
        match self {
            Value::Record { fields, .. } => fields.first().map(|(_, v)| matches!(v, Value::Bool(true))),
            _ => None,
        }
    }

    /// The `Option` record's `Value` field, by position (index 1).
    pub fn option_inner(&self) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.get(1).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn record_field(&self, field: Symbol) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.iter().find(|(name, _)| *name == field).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            other => panic!("expected Bool, found {other:?}"),
        }
    }
}

/// Field names every synthesized `Option<T>` record carries, in position
/// order. Kept as plain string constants since `Symbol` is registry-local.
const OPTION_HAS_VALUE_NAME: &str = "HasValue";
const OPTION_VALUE_NAME: &str = "Value";

/// The recursively-defined default value for `kind` (mirrors
/// `symlogic_expr::Builder::default_value`, but produces a host [`Value`]
/// directly instead of an expression node).
pub fn default_concrete_value(registry: &mut Registry, kind: &Kind) -> Value {
    match kind {
        Kind::Bool => Value::Bool(false),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => {
            let width = kind.bit_width().expect("fixed-width kind");
            Value::Bv { width, signed: !kind.is_unsigned(), bits: 0 }
        }
        Kind::Bv(width) => Value::Bv { width: *width, signed: false, bits: 0 },
        Kind::BigInt => Value::BigInt(BigInt::from(0)),
        Kind::Real => Value::Real(Rational::from_int(0)),
        Kind::Char => Value::Char('\0'),
        Kind::Str => Value::Str(String::new()),
        Kind::Option(elem) => {
            let has_value = registry.intern(OPTION_HAS_VALUE_NAME);
            let value = registry.intern(OPTION_VALUE_NAME);
            let record = registry
                .synthesize_option((**elem).clone())
                .expect("Option element kinds are validated at construction");
            Value::Record {
                record,
                fields: vec![
                    (has_value, Value::Bool(false)),
                    (value, default_concrete_value(registry, elem)),
                ],
            }
        }
        Kind::Record(id) => {
            let fields = registry.descriptor(*id).fields().to_vec();
            let built = fields
                .into_iter()
                .map(|(symbol, field_kind)| (symbol, default_concrete_value(registry, &field_kind)))
                .collect();
            Value::Record { record: *id, fields: built }
        }
        Kind::FSeq(_) => Value::FSeq(Vec::new()),
        Kind::Seq(_) => Value::Seq(Vec::new()),
        Kind::Map(_, _) | Kind::Set(_) => Value::Map(Vec::new()),
        Kind::ConstMap(value, keys) => {
            let entries = keys
                .iter()
                .map(|key| (registry.intern(key), default_concrete_value(registry, value)))
                .collect();
            Value::ConstMap(entries)
        }
    }
}

/// Total order over values of the same kind: signed/unsigned-aware for
/// bitvectors, exact for `Real`, natural `Ord` otherwise.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Bv { signed, width, bits: x }, Value::Bv { bits: y, .. }) => {
            if *signed {
                sign_extend(*x, *width).cmp(&sign_extend(*y, *width))
            } else {
                x.cmp(y)
            }
        }
        (Value::BigInt(x), Value::BigInt(y)) => x.cmp(y),
        (Value::Real(x), Value::Real(y)) => {
            let lhs = x.numerator() as i128 * y.denominator() as i128;
            let rhs = y.numerator() as i128 * x.denominator() as i128;
            lhs.cmp(&rhs)
        }
        (Value::Char(x), Value::Char(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (lhs, rhs) => panic!("values of incomparable shape: {lhs:?}, {rhs:?}"),
    }
}

fn sign_extend(bits: u64, width: u32) -> i128 {
    if width >= 64 {
        return bits as i64 as i128;
    }
    let shift = 64 - width;
    (((bits << shift) as i64) >> shift) as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_value_of_bool_is_false() {
        let mut registry = Registry::new();
        assert_eq!(default_concrete_value(&mut registry, &Kind::Bool), Value::Bool(false));
    }

    #[test]
    fn default_value_of_option_has_no_value() {
        let mut registry = Registry::new();
        let default = default_concrete_value(&mut registry, &Kind::option(Kind::U8));
        assert_eq!(default.is_option_present(), Some(false));
    }

    #[test]
    fn signed_compare_treats_high_bit_as_negative() {
        let neg_one = Value::Bv { width: 8, signed: true, bits: 0xFF };
        let zero = Value::Bv { width: 8, signed: true, bits: 0 };
        assert_eq!(compare(&neg_one, &zero), Ordering::Less);
    }

    #[test]
    fn unsigned_compare_treats_high_bit_as_large() {
        let max = Value::Bv { width: 8, signed: false, bits: 0xFF };
        let zero = Value::Bv { width: 8, signed: false, bits: 0 };
        assert_eq!(compare(&max, &zero), Ordering::Greater);
    }

    #[test]
    fn real_compare_cross_multiplies() {
        let half = Value::Real(Rational::new(1, 2));
        let third = Value::Real(Rational::new(1, 3));
        assert_eq!(compare(&half, &third), Ordering::Greater);
    }
}
