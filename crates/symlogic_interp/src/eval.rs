//! The concrete, tree-walking evaluator (spec §4.4).
//!
//! Evaluation order is left-to-right and guard-before-branches: `And`/`Or`
//! evaluate operands in list order, `If` evaluates only the taken branch,
//! and `CreateObject` evaluates fields in declaration order. Fixed-width
//! arithmetic wraps; `Seq.At`/`Map.Get` produce `Option::None` rather than
//! erroring on a missing element; an unassigned `Arbitrary` hole falls back
//! to its kind's default value.

use num_bigint::BigInt;
use symlogic_base::error::{Error, Result};
use symlogic_expr::{ExprId, ExprKind, Rational};
use symlogic_types::{Kind, Registry};
use symlogic_visit::Cache;

use crate::env::Env;
use crate::regex_match;
use crate::value::{compare, default_concrete_value, Value};

/// Evaluates `expr` to a concrete [`Value`] under `env`.
///
/// Takes `&mut Registry` (not `&Registry`) because constructing an
/// `Option::Some`/`Option::None` result on the fly — for `Seq.At`,
/// `Map.Get`, and `FSeq.Case`'s head binding — resolves the backing record
/// through `Registry::synthesize_option`, which caches by shape and so
/// needs mutable access even though it is idempotent.
pub fn evaluate(store: &symlogic_expr::Store, registry: &mut Registry, expr: ExprId, env: &Env) -> Result<Value> {
    let mut cache = Cache::new();
    eval_cached(store, registry, expr, env, &mut cache)
}

fn eval_cached(
    store: &symlogic_expr::Store,
    registry: &mut Registry,
    expr: ExprId,
    env: &Env,
    cache: &mut Cache<(), Value>,
) -> Result<Value> {
    // FSeq.Case is never memoized: each guarded entry binds fresh argument
    // ids, so a cache keyed on the outer environment would smear one
    // entry's head/tail across every entry's result.
    if matches!(store.kind(expr), ExprKind::FSeqCase { .. }) {
        return eval_node(store, registry, expr, env, cache);
    }
    if let Some(value) = cache.get(expr, &()) {
        return Ok(value);
    }
    let value = eval_node(store, registry, expr, env, cache)?;
    cache.insert(expr, &(), value.clone());
    Ok(value)
}

fn eval_node(
    store: &symlogic_expr::Store,
    registry: &mut Registry,
    expr: ExprId,
    env: &Env,
    cache: &mut Cache<(), Value>,
) -> Result<Value> {
    macro_rules! eval {
        ($id:expr) => {
            eval_cached(store, registry, $id, env, cache)?
        };
    }

    match store.kind(expr).clone() {
        ExprKind::ConstBool(b) => Ok(Value::Bool(b)),
        ExprKind::ConstBv { width, signed, bits } => Ok(Value::Bv { width, signed, bits }),
        ExprKind::ConstBigInt(n) => Ok(Value::BigInt(n)),
        ExprKind::ConstReal(r) => Ok(Value::Real(r)),
        ExprKind::ConstChar(c) => Ok(Value::Char(c)),
        ExprKind::ConstStr(s) => Ok(Value::Str(s)),

        ExprKind::Arbitrary { id, kind, .. } => match env.arbitrary(id) {
            Some(value) => Ok(value.clone()),
            None => Ok(default_concrete_value(registry, &kind)),
        },
        ExprKind::Argument { id, .. } => env
            .argument(id)
            .cloned()
            .ok_or_else(|| Error::invariant_violation(format!("argument {id} unbound during evaluation"))),

        ExprKind::And(operands) => {
            let mut result = true;
            for operand in operands {
                result &= eval!(operand).as_bool();
            }
            Ok(Value::Bool(result))
        }
        ExprKind::Or(operands) => {
            let mut result = false;
            for operand in operands {
                result |= eval!(operand).as_bool();
            }
            Ok(Value::Bool(result))
        }
        ExprKind::Not(a) => Ok(Value::Bool(!eval!(a).as_bool())),
        ExprKind::Iff(a, b) => Ok(Value::Bool(eval!(a).as_bool() == eval!(b).as_bool())),
        ExprKind::If { cond, then_, else_ } => {
            if eval!(cond).as_bool() {
                Ok(eval!(then_))
            } else {
                Ok(eval!(else_))
            }
        }

        ExprKind::Add(a, b) => numeric_op(eval!(a), eval!(b), |x, y| x.wrapping_add(y), Rational::add, |x, y| x + y),
        ExprKind::Sub(a, b) => numeric_op(eval!(a), eval!(b), |x, y| x.wrapping_sub(y), Rational::sub, |x, y| x - y),
        ExprKind::Mul(a, b) => numeric_op(eval!(a), eval!(b), |x, y| x.wrapping_mul(y), Rational::mul, |x, y| x * y),

        ExprKind::BitAnd(a, b) => bitwise_op(eval!(a), eval!(b), |x, y| x & y),
        ExprKind::BitOr(a, b) => bitwise_op(eval!(a), eval!(b), |x, y| x | y),
        ExprKind::BitXor(a, b) => bitwise_op(eval!(a), eval!(b), |x, y| x ^ y),
        ExprKind::BitNot(a) => match eval!(a) {
            Value::Bv { width, signed, bits } => Ok(Value::Bv { width, signed, bits: !bits & mask_for(width) }),
            other => Err(Error::type_mismatch("a bitvector value", format!("{other:?}"))),
        },
        ExprKind::Max(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            Ok(if compare(&a, &b).is_ge() { a } else { b })
        }
        ExprKind::Min(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            Ok(if compare(&a, &b).is_le() { a } else { b })
        }

        ExprKind::Eq(a, b) => Ok(Value::Bool(eval!(a) == eval!(b))),
        ExprKind::Lt(a, b) => Ok(Value::Bool(compare(&eval!(a), &eval!(b)).is_lt())),
        ExprKind::Leq(a, b) => Ok(Value::Bool(compare(&eval!(a), &eval!(b)).is_le())),
        ExprKind::Gt(a, b) => Ok(Value::Bool(compare(&eval!(a), &eval!(b)).is_gt())),
        ExprKind::Geq(a, b) => Ok(Value::Bool(compare(&eval!(a), &eval!(b)).is_ge())),
        ExprKind::Cast { expr: inner, target } => cast_value(eval!(inner), &target),

        ExprKind::CreateObject { record, fields } => {
            let mut built = Vec::with_capacity(fields.len());
            for (name, value_expr) in fields {
                built.push((name, eval!(value_expr)));
            }
            Ok(Value::Record { record, fields: built })
        }
        ExprKind::GetField { object, field } => {
            let value = eval!(object);
            value
                .record_field(field)
                .cloned()
                .ok_or_else(|| Error::invariant_violation(format!("no field {field:?} on {value:?}")))
        }
        ExprKind::WithField { object, field, value } => {
            let mut record = eval!(object);
            let replacement = eval!(value);
            match &mut record {
                Value::Record { fields, .. } => {
                    if let Some(slot) = fields.iter_mut().find(|(name, _)| *name == field) {
                        slot.1 = replacement;
                    }
                }
                other => return Err(Error::type_mismatch("a record value", format!("{other:?}"))),
            }
            Ok(record)
        }

        ExprKind::FSeqEmpty { .. } => Ok(Value::FSeq(Vec::new())),
        ExprKind::FSeqAddFront { head, tail } => {
            let head = eval!(head);
            let tail = eval!(tail);
            let rest = match tail {
                Value::FSeq(items) => items,
                other => return Err(Error::type_mismatch("an FSeq value", format!("{other:?}"))),
            };
            // checkSmallerDepths semantics: a `None` head terminates the
            // list at this point, truncating whatever the tail held.
            match head.is_option_present() {
                Some(true) => {
                    let mut items = vec![head.option_inner().cloned().expect("Some has a value")];
                    items.extend(rest);
                    Ok(Value::FSeq(items))
                }
                Some(false) => Ok(Value::FSeq(Vec::new())),
                None => Err(Error::type_mismatch("an Option head value", format!("{head:?}"))),
            }
        }
        ExprKind::FSeqCase { list, empty_expr, head_arg, tail_arg, cons_body } => {
            let elem = match store.result_kind(list) {
                Kind::FSeq(elem) => (**elem).clone(),
                other => return Err(Error::invariant_violation(format!("Case over non-FSeq kind {other}"))),
            };
            let items = match eval!(list) {
                Value::FSeq(items) => items,
                other => return Err(Error::type_mismatch("an FSeq value", format!("{other:?}"))),
            };
            if items.is_empty() {
                eval_cached(store, registry, empty_expr, env, cache)
            } else {
                let mut rest = items;
                let head = rest.remove(0);
                let record = registry.synthesize_option(elem)?;
                let has_value = registry.intern("HasValue");
                let value_name = registry.intern("Value");
                let head_value = Value::option_some(head, record, has_value, value_name);
                let extended = env.with_argument(head_arg, head_value).with_argument(tail_arg, Value::FSeq(rest));
                // Fresh cache: the extended environment invalidates anything
                // memoized under the caller's bindings.
                let mut inner_cache = Cache::new();
                eval_cached(store, registry, cons_body, &extended, &mut inner_cache)
            }
        }

        ExprKind::SeqEmpty { .. } => Ok(Value::Seq(Vec::new())),
        ExprKind::SeqUnit(value) => Ok(Value::Seq(vec![eval!(value)])),
        ExprKind::SeqConcat(a, b) => {
            let (mut a, b) = (as_seq(eval!(a))?, as_seq(eval!(b))?);
            a.extend(b);
            Ok(Value::Seq(a))
        }
        ExprKind::SeqLength(seq) => Ok(Value::BigInt(BigInt::from(as_seq(eval!(seq))?.len()))),
        ExprKind::SeqAt(seq, index) => {
            let elem = seq_elem_kind(store, seq)?;
            let items = as_seq(eval!(seq))?;
            let index = as_usize(eval!(index));
            let record = registry.synthesize_option(elem.clone())?;
            let has_value = registry.intern("HasValue");
            let value_name = registry.intern("Value");
            match index.and_then(|i| items.get(i).cloned()) {
                Some(found) => Ok(Value::option_some(found, record, has_value, value_name)),
                None => Ok(default_concrete_value(registry, &Kind::option(elem))),
            }
        }
        ExprKind::SeqNth(seq, index) => {
            let items = as_seq(eval!(seq))?;
            let index = as_usize(eval!(index))
                .ok_or_else(|| Error::invariant_violation("Seq.Nth index does not fit a usize"))?;
            items
                .get(index)
                .cloned()
                .ok_or_else(|| Error::invariant_violation(format!("Seq.Nth index {index} out of bounds")))
        }
        ExprKind::SeqContains { haystack, needle, mode } => {
            let (haystack, needle) = (as_seq(eval!(haystack))?, as_seq(eval!(needle))?);
            Ok(Value::Bool(seq_contains(&haystack, &needle, mode)))
        }
        ExprKind::SeqIndexOf { haystack, needle } => {
            let (haystack, needle) = (as_seq(eval!(haystack))?, as_seq(eval!(needle))?);
            Ok(Value::BigInt(match find_subsequence(&haystack, &needle) {
                Some(i) => BigInt::from(i),
                None => BigInt::from(-1),
            }))
        }
        ExprKind::SeqSlice { seq, offset, length } => {
            let items = as_seq(eval!(seq))?;
            let offset = as_usize(eval!(offset)).unwrap_or(items.len());
            let length = as_usize(eval!(length)).unwrap_or(0);
            let sliced = if offset >= items.len() {
                Vec::new()
            } else {
                let end = (offset + length).min(items.len());
                items[offset..end].to_vec()
            };
            Ok(Value::Seq(sliced))
        }
        ExprKind::SeqReplaceFirst { seq, pattern, replacement } => {
            let (items, pattern, replacement) = (as_seq(eval!(seq))?, as_seq(eval!(pattern))?, as_seq(eval!(replacement))?);
            Ok(Value::Seq(match find_subsequence(&items, &pattern) {
                Some(at) => {
                    let mut out = items[..at].to_vec();
                    out.extend(replacement);
                    out.extend(items[at + pattern.len()..].to_vec());
                    out
                }
                None => items,
            }))
        }
        ExprKind::SeqMatchesRegex { seq, regex } => {
            let chars = as_seq(eval!(seq))?
                .into_iter()
                .map(|v| match v {
                    Value::Char(c) => Ok(c),
                    other => Err(Error::type_mismatch("a Char value", format!("{other:?}"))),
                })
                .collect::<Result<String>>()?;
            Ok(Value::Bool(regex_match::matches_full(&chars, &regex)))
        }

        ExprKind::MapEmpty { .. } => match store.result_kind(expr) {
            Kind::ConstMap(value, keys) => {
                let value = (**value).clone();
                let mut entries = Vec::with_capacity(keys.len());
                for key in keys {
                    let symbol = registry.intern(key);
                    entries.push((symbol, default_concrete_value(registry, &value)));
                }
                Ok(Value::ConstMap(entries))
            }
            _ => Ok(Value::Map(Vec::new())),
        },
        ExprKind::MapSet { map, key, value } => {
            let (mut entries, key, value) = (as_map(eval!(map))?, eval!(key), eval!(value));
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
            Ok(Value::Map(entries))
        }
        ExprKind::MapDelete { map, key } => {
            let (mut entries, key) = (as_map(eval!(map))?, eval!(key));
            entries.retain(|(k, _)| *k != key);
            Ok(Value::Map(entries))
        }
        ExprKind::MapGet { map, key } => {
            let value_kind = match store.result_kind(map) {
                Kind::Map(_, v) => (**v).clone(),
                other => return Err(Error::invariant_violation(format!("Map.Get over non-Map kind {other}"))),
            };
            let (entries, key) = (as_map(eval!(map))?, eval!(key));
            let record = registry.synthesize_option(value_kind.clone())?;
            let has_value = registry.intern("HasValue");
            let value_name = registry.intern("Value");
            match entries.into_iter().find(|(k, _)| *k == key) {
                Some((_, found)) => Ok(Value::option_some(found, record, has_value, value_name)),
                None => Ok(default_concrete_value(registry, &Kind::option(value_kind))),
            }
        }
        ExprKind::MapCombine { op, left, right } => {
            let (left, right) = (as_map(eval!(left))?, as_map(eval!(right))?);
            Ok(Value::Map(combine_maps(op, left, right)))
        }

        ExprKind::ConstMapSet { map, key, value } => {
            let (mut entries, value) = (as_const_map(eval!(map))?, eval!(value));
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
            Ok(Value::ConstMap(entries))
        }
        ExprKind::ConstMapGet { map, key } => {
            let entries = as_const_map(eval!(map))?;
            entries
                .into_iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v)
                .ok_or_else(|| Error::invariant_violation(format!("ConstMap missing statically-declared key {key:?}")))
        }
    }
}

fn numeric_op(
    a: Value,
    b: Value,
    on_bits: impl Fn(u64, u64) -> u64,
    on_real: impl Fn(Rational, Rational) -> Rational,
    on_bigint: impl Fn(BigInt, BigInt) -> BigInt,
) -> Result<Value> {
    match (a, b) {
        (Value::Bv { width, signed, bits: x }, Value::Bv { bits: y, .. }) => {
            Ok(Value::Bv { width, signed, bits: on_bits(x, y) & mask_for(width) })
        }
        (Value::BigInt(x), Value::BigInt(y)) => Ok(Value::BigInt(on_bigint(x, y))),
        (Value::Real(x), Value::Real(y)) => Ok(Value::Real(on_real(x, y))),
        (a, b) => Err(Error::type_mismatch("two numeric values of the same kind", format!("{a:?}, {b:?}"))),
    }
}

fn bitwise_op(a: Value, b: Value, op: impl Fn(u64, u64) -> u64) -> Result<Value> {
    match (a, b) {
        (Value::Bv { width, signed, bits: x }, Value::Bv { bits: y, .. }) => {
            Ok(Value::Bv { width, signed, bits: op(x, y) & mask_for(width) })
        }
        (a, b) => Err(Error::type_mismatch("two bitvector values", format!("{a:?}, {b:?}"))),
    }
}

fn cast_value(value: Value, target: &Kind) -> Result<Value> {
    let (width, signed, bits) = match value {
        Value::Bv { width, signed, bits } => (width, signed, bits),
        other => return Err(Error::type_mismatch("a fixed-width integer value", format!("{other:?}"))),
    };
    let target_width = target
        .bit_width()
        .ok_or_else(|| Error::type_mismatch("a fixed-width integer kind", target))?;
    let target_signed = !target.is_unsigned();
    let widened: i128 = if signed { sign_extend(bits, width) } else { bits as i128 };
    let mask: u128 = mask_for_128(target_width);
    let truncated = (widened as u128 & mask) as u64;
    Ok(Value::Bv { width: target_width, signed: target_signed, bits: truncated })
}

fn mask_for(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn mask_for_128(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

fn sign_extend(bits: u64, width: u32) -> i128 {
    if width >= 64 {
        return bits as i64 as i128;
    }
    let shift = 64 - width;
    (((bits << shift) as i64) >> shift) as i128
}

fn as_seq(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Seq(items) => Ok(items),
        other => Err(Error::type_mismatch("a Seq value", format!("{other:?}"))),
    }
}

fn as_map(value: Value) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(Error::type_mismatch("a Map value", format!("{other:?}"))),
    }
}

fn as_const_map(value: Value) -> Result<Vec<(symlogic_base::Symbol, Value)>> {
    match value {
        Value::ConstMap(entries) => Ok(entries),
        other => Err(Error::type_mismatch("a ConstMap value", format!("{other:?}"))),
    }
}

fn as_usize(value: Value) -> Option<usize> {
    use num_traits::ToPrimitive;
    match value {
        Value::BigInt(n) => n.to_usize(),
        Value::Bv { signed, width, bits } => {
            let signed_value = if signed { sign_extend(bits, width) } else { bits as i128 };
            usize::try_from(signed_value).ok()
        }
        _ => None,
    }
}

fn seq_elem_kind(store: &symlogic_expr::Store, seq: ExprId) -> Result<Kind> {
    match store.result_kind(seq) {
        Kind::Seq(elem) => Ok((**elem).clone()),
        other => Err(Error::invariant_violation(format!("expected a Seq kind, found {other}"))),
    }
}

fn seq_contains(haystack: &[Value], needle: &[Value], mode: symlogic_expr::ContainsKind) -> bool {
    use symlogic_expr::ContainsKind;
    match mode {
        ContainsKind::Prefix => haystack.len() >= needle.len() && haystack[..needle.len()] == *needle,
        ContainsKind::Suffix => {
            haystack.len() >= needle.len() && haystack[haystack.len() - needle.len()..] == *needle
        }
        ContainsKind::Infix => find_subsequence(haystack, needle).is_some(),
    }
}

fn find_subsequence(haystack: &[Value], needle: &[Value]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&start| haystack[start..start + needle.len()] == *needle)
}

fn combine_maps(op: symlogic_expr::CombineOp, left: Vec<(Value, Value)>, right: Vec<(Value, Value)>) -> Vec<(Value, Value)> {
    use symlogic_expr::CombineOp;
    match op {
        CombineOp::Union => {
            let mut combined = left.clone();
            for (key, value) in right {
                if !combined.iter().any(|(k, _)| *k == key) {
                    combined.push((key, value));
                }
            }
            combined
        }
        CombineOp::Intersect => left
            .into_iter()
            .filter(|(key, _)| right.iter().any(|(k, _)| k == key))
            .collect(),
        CombineOp::Difference => left
            .into_iter()
            .filter(|(key, _)| !right.iter().any(|(k, _)| k == key))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symlogic_expr::Builder;

    #[test]
    fn u8_addition_wraps_at_evaluation() {
        let mut b = Builder::new();
        let max = b.const_fixed(Kind::U8, 255).unwrap();
        let one = b.const_fixed(Kind::U8, 1).unwrap();
        let sum = b.add(max, one).unwrap();
        let env = Env::new();
        let value = evaluate(&b.store, &mut b.registry, sum, &env).unwrap();
        assert_eq!(value, Value::Bv { width: 8, signed: false, bits: 0 });
    }

    #[test]
    fn unassigned_arbitrary_uses_default_value() {
        let mut b = Builder::new();
        let hole = b.arbitrary(Kind::Bool, Some("flag"));
        let env = Env::new();
        let value = evaluate(&b.store, &mut b.registry, hole, &env).unwrap();
        assert_eq!(value, Value::Bool(false));
    }

    #[test]
    fn assigned_arbitrary_overrides_default() {
        let mut b = Builder::new();
        let hole = b.arbitrary(Kind::Bool, Some("flag"));
        let id = match b.store.kind(hole) {
            ExprKind::Arbitrary { id, .. } => *id,
            _ => unreachable!(),
        };
        let mut env = Env::new();
        env.assign_arbitrary(id, Value::Bool(true));
        let value = evaluate(&b.store, &mut b.registry, hole, &env).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn fseq_case_sums_elements() {
        let mut b = Builder::new();
        let empty = b.fseq_empty(Kind::U8);
        let three = b.const_fixed(Kind::U8, 3).unwrap();
        let some_three = b.option_some(three).unwrap();
        let list = b.fseq_add_front(some_three, empty).unwrap();

        let head_arg = b.fresh_argument_id();
        let tail_arg = b.fresh_argument_id();
        let head_opt = b.argument(head_arg, Kind::option(Kind::U8));
        let head_value = b.get_field(head_opt, "Value").unwrap();
        let zero = b.const_fixed(Kind::U8, 0).unwrap();
        let case = b.fseq_case(list, zero, head_arg, tail_arg, head_value).unwrap();

        let env = Env::new();
        let value = evaluate(&b.store, &mut b.registry, case, &env).unwrap();
        assert_eq!(value, Value::Bv { width: 8, signed: false, bits: 3 });
    }

    #[test]
    fn seq_at_out_of_range_is_none() {
        let mut b = Builder::new();
        let empty = b.seq_empty(Kind::U8);
        let index = b.const_bigint(BigInt::from(0));
        let at = b.seq_at(empty, index).unwrap();
        let env = Env::new();
        let value = evaluate(&b.store, &mut b.registry, at, &env).unwrap();
        assert_eq!(value.is_option_present(), Some(false));
    }

    #[test]
    fn map_get_roundtrips_set_value() {
        let mut b = Builder::new();
        let map = b.map_empty(Kind::U8, Kind::Bool);
        let key = b.const_fixed(Kind::U8, 7).unwrap();
        let value = b.const_bool(true);
        let set = b.map_set(map, key, value).unwrap();
        let get = b.map_get(set, key).unwrap();
        let env = Env::new();
        let result = evaluate(&b.store, &mut b.registry, get, &env).unwrap();
        assert_eq!(result.is_option_present(), Some(true));
        assert_eq!(result.option_inner(), Some(&Value::Bool(true)));
    }
}
