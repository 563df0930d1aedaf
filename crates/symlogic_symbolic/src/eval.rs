//! The symbolic evaluator (spec §4.6): lowers a closed expression onto a
//! [`Backend`] instead of computing a concrete [`symlogic_interp::value::Value`].
//!
//! Structured the same way as `symlogic_interp::eval`: a `Cache<(), SymbolicValue<T>>`
//! memoizes every node except `FSeq.Case`, which gets a fresh cache per
//! guarded entry since each entry binds its own head/tail arguments. Unlike
//! the concrete evaluator, an `Arbitrary` hole is never "unassigned" — it
//! allocates a fresh backend variable the first time it is visited, recorded
//! in a [`WitnessMap`] so every later visit of the same id returns the same
//! term.
//!
//! `Map`/`Set`/`Seq` values are restricted here to a scalar element/value
//! kind (`Bool`, a fixed-width or arbitrary-precision integer, `Real`,
//! `Char`, `Str`, or `Seq`): lowering a compound-valued array onto a single
//! backend term would need a recursive array-of-arrays encoding with no
//! grounding in this codebase's dependency stack, so a compound value kind
//! is rejected with [`Error::backend_unsupported`] rather than invented.
//! `ConstMap` is unaffected, since its keys are compile-time constants and
//! each entry is stored structurally, exactly like a record's fields.

use num_bigint::BigInt;
use symlogic_base::error::{Error, Result};
use symlogic_base::Symbol;
use symlogic_expr::{ExprId, ExprKind, Rational, Store};
use symlogic_types::{Kind, Registry};
use symlogic_visit::Cache;

use crate::backend::{Backend, Sort};
use crate::env::SymbolicEnv;
use crate::value::{merge, GuardedEntry, GuardedListGroup, SymbolicValue, WitnessMap};

/// Evaluates `expr` to a [`SymbolicValue`] under `env`, allocating fresh
/// backend variables for any not-yet-visited `Arbitrary` hole into `witnesses`.
pub fn evaluate<B: Backend>(
    store: &Store,
    registry: &mut Registry,
    backend: &mut B,
    witnesses: &mut WitnessMap<B::Term>,
    expr: ExprId,
    env: &SymbolicEnv<B::Term>,
) -> Result<SymbolicValue<B::Term>> {
    let mut cache = Cache::new();
    eval_cached(store, registry, backend, witnesses, expr, env, &mut cache)
}

type ValueCache<T> = Cache<(), SymbolicValue<T>>;

fn eval_cached<B: Backend>(
    store: &Store,
    registry: &mut Registry,
    backend: &mut B,
    witnesses: &mut WitnessMap<B::Term>,
    expr: ExprId,
    env: &SymbolicEnv<B::Term>,
    cache: &mut ValueCache<B::Term>,
) -> Result<SymbolicValue<B::Term>> {
    if matches!(store.kind(expr), ExprKind::FSeqCase { .. }) {
        return eval_node(store, registry, backend, witnesses, expr, env, cache);
    }
    if let Some(value) = cache.get(expr, &()) {
        return Ok(value);
    }
    let value = eval_node(store, registry, backend, witnesses, expr, env, cache)?;
    cache.insert(expr, &(), value.clone());
    Ok(value)
}

fn eval_node<B: Backend>(
    store: &Store,
    registry: &mut Registry,
    backend: &mut B,
    witnesses: &mut WitnessMap<B::Term>,
    expr: ExprId,
    env: &SymbolicEnv<B::Term>,
    cache: &mut ValueCache<B::Term>,
) -> Result<SymbolicValue<B::Term>> {
    macro_rules! eval {
        ($id:expr) => {
            eval_cached(store, registry, backend, witnesses, $id, env, cache)?
        };
    }

    match store.kind(expr).clone() {
        ExprKind::ConstBool(b) => Ok(SymbolicValue::SBool(backend.bool_const(b))),
        ExprKind::ConstBv { width, signed, bits } => Ok(SymbolicValue::SBitvec { term: backend.bv_const(width, bits), width, signed }),
        ExprKind::ConstBigInt(n) => Ok(SymbolicValue::SBigInt(backend.int_const(&n))),
        ExprKind::ConstReal(r) => Ok(SymbolicValue::SReal(backend.real_const(r))),
        ExprKind::ConstChar(c) => Ok(SymbolicValue::SChar(backend.char_const(c))),
        ExprKind::ConstStr(s) => Ok(SymbolicValue::SStr(backend.str_const(&s))),

        ExprKind::Arbitrary { id, kind, name } => {
            if let Some(existing) = witnesses.get(&id) {
                return Ok(existing.clone());
            }
            let path = name.map(|s| registry.resolve(s).to_string()).unwrap_or_else(|| format!("arbitrary{id}"));
            let fresh = fresh_value(backend, registry, &kind, &path)?;
            witnesses.insert(id, fresh.clone());
            Ok(fresh)
        }
        ExprKind::Argument { id, .. } => env
            .argument(id)
            .cloned()
            .ok_or_else(|| Error::invariant_violation(format!("argument {id} unbound during symbolic evaluation"))),

        ExprKind::And(operands) => {
            let mut acc = backend.bool_const(true);
            for operand in operands {
                let term = eval!(operand).as_bool()?.clone();
                acc = backend.and(&acc, &term);
            }
            Ok(SymbolicValue::SBool(acc))
        }
        ExprKind::Or(operands) => {
            let mut acc = backend.bool_const(false);
            for operand in operands {
                let term = eval!(operand).as_bool()?.clone();
                acc = backend.or(&acc, &term);
            }
            Ok(SymbolicValue::SBool(acc))
        }
        ExprKind::Not(a) => {
            let a_val = eval!(a);
            Ok(SymbolicValue::SBool(backend.not(a_val.as_bool()?)))
        }
        ExprKind::Iff(a, b) => {
            let a_val = eval!(a);
            let b_val = eval!(b);
            Ok(SymbolicValue::SBool(backend.iff(a_val.as_bool()?, b_val.as_bool()?)))
        }
        ExprKind::If { cond, then_, else_ } => {
            let cond_term = eval!(cond).as_bool()?.clone();
            let then_v = eval!(then_);
            let else_v = eval!(else_);
            merge(backend, &cond_term, &then_v, &else_v)
        }

        ExprKind::Add(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            numeric_op(backend, a, b, Backend::bv_add, Backend::int_add, Backend::real_add)
        }
        ExprKind::Sub(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            numeric_op(backend, a, b, Backend::bv_sub, Backend::int_sub, Backend::real_sub)
        }
        ExprKind::Mul(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            numeric_op(backend, a, b, Backend::bv_mul, Backend::int_mul, Backend::real_mul)
        }

        ExprKind::BitAnd(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            bitwise_op(backend, a, b, Backend::bv_and)
        }
        ExprKind::BitOr(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            bitwise_op(backend, a, b, Backend::bv_or)
        }
        ExprKind::BitXor(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            bitwise_op(backend, a, b, Backend::bv_xor)
        }
        ExprKind::BitNot(a) => match eval!(a) {
            SymbolicValue::SBitvec { term, width, signed } => Ok(SymbolicValue::SBitvec { term: backend.bv_not(&term), width, signed }),
            other => Err(type_mismatch("a bitvector value", &other)),
        },
        ExprKind::Max(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            minmax(backend, a, b, Backend::bv_max, Backend::int_max, Backend::real_max)
        }
        ExprKind::Min(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            minmax(backend, a, b, Backend::bv_min, Backend::int_min, Backend::real_min)
        }

        ExprKind::Eq(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            Ok(SymbolicValue::SBool(structural_eq(backend, &a, &b)?))
        }
        ExprKind::Lt(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            ordered(backend, a, b, false)
        }
        ExprKind::Leq(a, b) => {
            let (a, b) = (eval!(a), eval!(b));
            ordered(backend, a, b, true)
        }
        ExprKind::Gt(a, b) => {
            let (a, b) = (eval!(b), eval!(a));
            ordered(backend, a, b, false)
        }
        ExprKind::Geq(a, b) => {
            let (a, b) = (eval!(b), eval!(a));
            ordered(backend, a, b, true)
        }
        ExprKind::Cast { expr: inner, target } => match eval!(inner) {
            SymbolicValue::SBitvec { term, width, signed } => {
                let target_width = target.bit_width().ok_or_else(|| Error::type_mismatch("a fixed-width integer kind", target.to_string()))?;
                Ok(SymbolicValue::SBitvec {
                    term: backend.bv_cast(&term, width, target_width, signed),
                    width: target_width,
                    signed: !target.is_unsigned(),
                })
            }
            other => Err(type_mismatch("a bitvector value", &other)),
        },

        ExprKind::CreateObject { record, fields } => {
            let mut built = Vec::with_capacity(fields.len());
            for (name, value_expr) in fields {
                built.push((name, eval!(value_expr)));
            }
            Ok(SymbolicValue::SObject { record, fields: built })
        }
        ExprKind::GetField { object, field } => {
            let value = eval!(object);
            value
                .record_field(field)
                .cloned()
                .ok_or_else(|| Error::invariant_violation(format!("no field {field:?} on a symbolic record")))
        }
        ExprKind::WithField { object, field, value } => {
            let mut record = eval!(object);
            let replacement = eval!(value);
            match &mut record {
                SymbolicValue::SObject { fields, .. } => {
                    if let Some(slot) = fields.iter_mut().find(|(name, _)| *name == field) {
                        slot.1 = replacement;
                    }
                }
                other => return Err(type_mismatch("a record value", &*other)),
            }
            Ok(record)
        }

        ExprKind::FSeqEmpty { .. } => Ok(SymbolicValue::SList(GuardedListGroup::empty(backend.bool_const(true)))),
        ExprKind::FSeqAddFront { head, tail } => {
            let head_v = eval!(head);
            let tail_v = match eval!(tail) {
                SymbolicValue::SList(list) => list,
                other => return Err(type_mismatch("an FSeq value", &other)),
            };
            Ok(SymbolicValue::SList(GuardedListGroup::add_front(backend, &head_v, &tail_v)?))
        }
        ExprKind::FSeqCase { list, empty_expr, head_arg, tail_arg, cons_body } => {
            let elem = match store.result_kind(list) {
                Kind::FSeq(elem) => (**elem).clone(),
                other => return Err(Error::invariant_violation(format!("Case over non-FSeq kind {other}"))),
            };
            let entries = match eval!(list) {
                SymbolicValue::SList(list) => list.entries,
                other => return Err(type_mismatch("an FSeq value", &other)),
            };
            if entries.is_empty() {
                return Err(Error::invariant_violation("a symbolic FSeq had no length entries"));
            }
            let mut result: Option<SymbolicValue<B::Term>> = None;
            for entry in &entries {
                let contribution = eval_case_entry(store, registry, backend, witnesses, entry, &elem, empty_expr, head_arg, tail_arg, cons_body, env)?;
                result = Some(match result {
                    None => contribution,
                    Some(acc) => merge(backend, &entry.guard, &contribution, &acc)?,
                });
            }
            Ok(result.expect("entries is non-empty"))
        }

        ExprKind::SeqEmpty { elem } => {
            let sort = sort_of(&elem)?;
            Ok(wrap_seq_result(store.result_kind(expr), backend.seq_empty(&sort)))
        }
        ExprKind::SeqUnit(value) => {
            let term = scalar_term(&eval!(value))?;
            Ok(wrap_seq_result(store.result_kind(expr), backend.seq_unit(&term)))
        }
        ExprKind::SeqConcat(a, b) => {
            let (a, b) = (scalar_term(&eval!(a))?, scalar_term(&eval!(b))?);
            Ok(wrap_seq_result(store.result_kind(expr), backend.seq_concat(&a, &b)))
        }
        ExprKind::SeqLength(seq) => {
            let seq_val = eval!(seq);
            Ok(SymbolicValue::SBigInt(backend.seq_length(&scalar_term(&seq_val)?)))
        }
        ExprKind::SeqAt(seq, index) => {
            let elem = seq_elem_kind(store, seq)?;
            let seq_term = scalar_term(&eval!(seq))?;
            let index_term = scalar_term(&eval!(index))?;
            let in_bounds = backend.seq_in_bounds(&seq_term, &index_term);
            let nth = backend.seq_nth(&seq_term, &index_term);
            let value = wrap_scalar_result(&elem, nth)?;
            wrap_some(registry, elem, value, in_bounds)
        }
        ExprKind::SeqNth(seq, index) => {
            let elem = seq_elem_kind(store, seq)?;
            let (seq_val, index_val) = (eval!(seq), eval!(index));
            let term = backend.seq_nth(&scalar_term(&seq_val)?, &scalar_term(&index_val)?);
            wrap_scalar_result(&elem, term)
        }
        ExprKind::SeqContains { haystack, needle, mode } => {
            let (haystack_val, needle_val) = (eval!(haystack), eval!(needle));
            Ok(SymbolicValue::SBool(backend.seq_contains(&scalar_term(&haystack_val)?, &scalar_term(&needle_val)?, mode)))
        }
        ExprKind::SeqIndexOf { haystack, needle } => {
            let (haystack_val, needle_val) = (eval!(haystack), eval!(needle));
            Ok(SymbolicValue::SBigInt(backend.seq_index_of(&scalar_term(&haystack_val)?, &scalar_term(&needle_val)?)))
        }
        ExprKind::SeqSlice { seq, offset, length } => {
            let kind = store.result_kind(expr).clone();
            let (seq_val, offset_val, length_val) = (eval!(seq), eval!(offset), eval!(length));
            let term = backend.seq_slice(&scalar_term(&seq_val)?, &scalar_term(&offset_val)?, &scalar_term(&length_val)?);
            Ok(wrap_seq_result(&kind, term))
        }
        ExprKind::SeqReplaceFirst { seq, pattern, replacement } => {
            let kind = store.result_kind(expr).clone();
            let (seq_val, pattern_val, replacement_val) = (eval!(seq), eval!(pattern), eval!(replacement));
            let term = backend.seq_replace_first(&scalar_term(&seq_val)?, &scalar_term(&pattern_val)?, &scalar_term(&replacement_val)?);
            Ok(wrap_seq_result(&kind, term))
        }
        ExprKind::SeqMatchesRegex { seq, regex } => {
            let seq_val = eval!(seq);
            Ok(SymbolicValue::SBool(backend.seq_matches_regex(&scalar_term(&seq_val)?, &regex)?))
        }

        ExprKind::MapEmpty { .. } => match store.result_kind(expr).clone() {
            Kind::ConstMap(value_kind, keys) => {
                let mut entries = Vec::with_capacity(keys.len());
                for key in &keys {
                    let symbol = registry.intern(key);
                    entries.push((symbol, default_symbolic(backend, registry, &value_kind)?));
                }
                Ok(SymbolicValue::SConstMap(entries))
            }
            Kind::Set(key) => {
                let key_sort = sort_of(&key)?;
                let false_has = backend.bool_const(false);
                let false_val = backend.bool_const(false);
                let default = backend.option_pack(&Sort::Bool, &false_has, &false_val);
                Ok(SymbolicValue::SMap(backend.array_const(&key_sort, &default)))
            }
            Kind::Map(key, value) => {
                let key_sort = sort_of(&key)?;
                let value_sort = sort_of(&value)?;
                let default_val = default_scalar_term(backend, &value)?;
                let false_term = backend.bool_const(false);
                let default = backend.option_pack(&value_sort, &false_term, &default_val);
                Ok(SymbolicValue::SMap(backend.array_const(&key_sort, &default)))
            }
            other => Err(Error::invariant_violation(format!("Map.Empty with unexpected result kind {other}"))),
        },
        ExprKind::MapSet { map, key, value } => {
            let value_kind = map_value_kind(store, map)?;
            let value_sort = sort_of(&value_kind)?;
            let map_term = scalar_term(&eval!(map))?;
            let key_term = scalar_term(&eval!(key))?;
            let value_term = scalar_term(&eval!(value))?;
            let true_term = backend.bool_const(true);
            let packed = backend.option_pack(&value_sort, &true_term, &value_term);
            Ok(SymbolicValue::SMap(backend.array_store(&map_term, &key_term, &packed)))
        }
        ExprKind::MapDelete { map, key } => {
            let value_kind = map_value_kind(store, map)?;
            let value_sort = sort_of(&value_kind)?;
            let map_term = scalar_term(&eval!(map))?;
            let key_term = scalar_term(&eval!(key))?;
            let default_val = default_scalar_term(backend, &value_kind)?;
            let false_term = backend.bool_const(false);
            let packed = backend.option_pack(&value_sort, &false_term, &default_val);
            Ok(SymbolicValue::SMap(backend.array_store(&map_term, &key_term, &packed)))
        }
        ExprKind::MapGet { map, key } => {
            let value_kind = map_value_kind(store, map)?;
            let value_sort = sort_of(&value_kind)?;
            let map_term = scalar_term(&eval!(map))?;
            let key_term = scalar_term(&eval!(key))?;
            let selected = backend.array_select(&map_term, &key_term);
            let has_value = backend.option_unpack_has_value(&value_sort, &selected);
            let value_term = backend.option_unpack_value(&value_sort, &selected);
            let value_v = wrap_scalar_result(&value_kind, value_term)?;
            wrap_some(registry, value_kind, value_v, has_value)
        }
        ExprKind::MapCombine { op, left, right } => {
            let (l, r) = (scalar_term(&eval!(left))?, scalar_term(&eval!(right))?);
            Ok(SymbolicValue::SMap(backend.array_combine(op, &l, &r)?))
        }

        ExprKind::ConstMapSet { map, key, value } => {
            let mut entries = as_const_map(eval!(map))?;
            let value_v = eval!(value);
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value_v,
                None => entries.push((key, value_v)),
            }
            Ok(SymbolicValue::SConstMap(entries))
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

#[allow(clippy::too_many_arguments)]
fn eval_case_entry<B: Backend>(
    store: &Store,
    registry: &mut Registry,
    backend: &mut B,
    witnesses: &mut WitnessMap<B::Term>,
    entry: &GuardedEntry<B::Term>,
    elem: &Kind,
    empty_expr: ExprId,
    head_arg: u64,
    tail_arg: u64,
    cons_body: ExprId,
    env: &SymbolicEnv<B::Term>,
) -> Result<SymbolicValue<B::Term>> {
    let mut inner_cache = Cache::new();
    if entry.length == 0 {
        eval_cached(store, registry, backend, witnesses, empty_expr, env, &mut inner_cache)
    } else {
        let head = entry.values[0].clone();
        let rest = entry.values[1..].to_vec();
        let always = backend.bool_const(true);
        let tail_list = GuardedListGroup { entries: vec![GuardedEntry { length: entry.length - 1, guard: always, values: rest }] };
        let true_term = backend.bool_const(true);
        let head_value = wrap_some(registry, elem.clone(), head, true_term)?;
        let extended = env.with_argument(head_arg, head_value).with_argument(tail_arg, SymbolicValue::SList(tail_list));
        eval_cached(store, registry, backend, witnesses, cons_body, &extended, &mut inner_cache)
    }
}

fn numeric_op<B: Backend>(
    backend: &mut B,
    a: SymbolicValue<B::Term>,
    b: SymbolicValue<B::Term>,
    on_bv: impl Fn(&mut B, &B::Term, &B::Term) -> B::Term,
    on_int: impl Fn(&mut B, &B::Term, &B::Term) -> B::Term,
    on_real: impl Fn(&mut B, &B::Term, &B::Term) -> B::Term,
) -> Result<SymbolicValue<B::Term>> {
    match (a, b) {
        (SymbolicValue::SBitvec { term: x, width, signed }, SymbolicValue::SBitvec { term: y, .. }) => {
            Ok(SymbolicValue::SBitvec { term: on_bv(backend, &x, &y), width, signed })
        }
        (SymbolicValue::SBigInt(x), SymbolicValue::SBigInt(y)) => Ok(SymbolicValue::SBigInt(on_int(backend, &x, &y))),
        (SymbolicValue::SReal(x), SymbolicValue::SReal(y)) => Ok(SymbolicValue::SReal(on_real(backend, &x, &y))),
        (a, _) => Err(type_mismatch("two numeric values of the same kind", &a)),
    }
}

fn bitwise_op<B: Backend>(
    backend: &mut B,
    a: SymbolicValue<B::Term>,
    b: SymbolicValue<B::Term>,
    on_bv: impl Fn(&mut B, &B::Term, &B::Term) -> B::Term,
) -> Result<SymbolicValue<B::Term>> {
    match (a, b) {
        (SymbolicValue::SBitvec { term: x, width, signed }, SymbolicValue::SBitvec { term: y, .. }) => {
            Ok(SymbolicValue::SBitvec { term: on_bv(backend, &x, &y), width, signed })
        }
        (a, _) => Err(type_mismatch("two bitvector values", &a)),
    }
}

fn minmax<B: Backend>(
    backend: &mut B,
    a: SymbolicValue<B::Term>,
    b: SymbolicValue<B::Term>,
    on_bv: impl Fn(&mut B, &B::Term, &B::Term, bool) -> B::Term,
    on_int: impl Fn(&mut B, &B::Term, &B::Term) -> B::Term,
    on_real: impl Fn(&mut B, &B::Term, &B::Term) -> B::Term,
) -> Result<SymbolicValue<B::Term>> {
    match (a, b) {
        (SymbolicValue::SBitvec { term: x, width, signed }, SymbolicValue::SBitvec { term: y, .. }) => {
            Ok(SymbolicValue::SBitvec { term: on_bv(backend, &x, &y, signed), width, signed })
        }
        (SymbolicValue::SBigInt(x), SymbolicValue::SBigInt(y)) => Ok(SymbolicValue::SBigInt(on_int(backend, &x, &y))),
        (SymbolicValue::SReal(x), SymbolicValue::SReal(y)) => Ok(SymbolicValue::SReal(on_real(backend, &x, &y))),
        (a, _) => Err(type_mismatch("two numeric values of the same kind", &a)),
    }
}

/// `a < b` (or `a <= b` when `or_equal`), dispatched over every ordered sort
/// the combinator surface defines a total order for. `Seq`/`Str` have no
/// lexicographic comparison in this backend interface; see the module doc.
fn ordered<B: Backend>(backend: &mut B, a: SymbolicValue<B::Term>, b: SymbolicValue<B::Term>, or_equal: bool) -> Result<SymbolicValue<B::Term>> {
    let term = match (a, b) {
        (SymbolicValue::SBitvec { term: x, signed, .. }, SymbolicValue::SBitvec { term: y, .. }) => {
            if or_equal {
                backend.bv_leq(&x, &y, signed)
            } else {
                backend.bv_lt(&x, &y, signed)
            }
        }
        (SymbolicValue::SBigInt(x), SymbolicValue::SBigInt(y)) => {
            if or_equal {
                backend.int_leq(&x, &y)
            } else {
                backend.int_lt(&x, &y)
            }
        }
        (SymbolicValue::SReal(x), SymbolicValue::SReal(y)) => {
            if or_equal {
                backend.real_leq(&x, &y)
            } else {
                backend.real_lt(&x, &y)
            }
        }
        (SymbolicValue::SChar(x), SymbolicValue::SChar(y)) => {
            if or_equal {
                backend.char_leq(&x, &y)
            } else {
                backend.char_lt(&x, &y)
            }
        }
        (a, _) => return Err(type_mismatch("two ordered values of the same kind", &a)),
    };
    Ok(SymbolicValue::SBool(term))
}

/// Structural equality, recursing field-by-field for records/`ConstMap` the
/// same way `symlogic_interp::Value`'s derived `PartialEq` does, since
/// `Backend::eq` only ever compares two like-sorted scalar terms.
fn structural_eq<B: Backend>(backend: &mut B, a: &SymbolicValue<B::Term>, b: &SymbolicValue<B::Term>) -> Result<B::Term> {
    match (a, b) {
        (SymbolicValue::SBool(x), SymbolicValue::SBool(y))
        | (SymbolicValue::SBitvec { term: x, .. }, SymbolicValue::SBitvec { term: y, .. })
        | (SymbolicValue::SBigInt(x), SymbolicValue::SBigInt(y))
        | (SymbolicValue::SReal(x), SymbolicValue::SReal(y))
        | (SymbolicValue::SChar(x), SymbolicValue::SChar(y))
        | (SymbolicValue::SStr(x), SymbolicValue::SStr(y))
        | (SymbolicValue::SSeq(x), SymbolicValue::SSeq(y))
        | (SymbolicValue::SMap(x), SymbolicValue::SMap(y)) => Ok(backend.eq(x, y)),
        (SymbolicValue::SObject { fields: xs, .. }, SymbolicValue::SObject { fields: ys, .. }) => {
            let mut acc = backend.bool_const(true);
            for ((_, x), (_, y)) in xs.iter().zip(ys.iter()) {
                let field_eq = structural_eq(backend, x, y)?;
                acc = backend.and(&acc, &field_eq);
            }
            Ok(acc)
        }
        (SymbolicValue::SConstMap(xs), SymbolicValue::SConstMap(ys)) => {
            let mut acc = backend.bool_const(true);
            for ((_, x), (_, y)) in xs.iter().zip(ys.iter()) {
                let field_eq = structural_eq(backend, x, y)?;
                acc = backend.and(&acc, &field_eq);
            }
            Ok(acc)
        }
        _ => Err(Error::backend_unsupported("this backend", "equality over a symbolic FSeq value")),
    }
}

fn sort_of(kind: &Kind) -> Result<Sort> {
    match kind {
        Kind::Bool => Ok(Sort::Bool),
        Kind::BigInt => Ok(Sort::Int),
        Kind::Real => Ok(Sort::Real),
        Kind::Char => Ok(Sort::Char),
        Kind::Str => Ok(Sort::Str),
        Kind::Seq(elem) => Ok(Sort::Seq(Box::new(sort_of(elem)?))),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => Ok(Sort::Bv(kind.bit_width().unwrap())),
        Kind::Bv(width) => Ok(Sort::Bv(*width)),
        other => Err(Error::backend_unsupported("this backend", format!("a compound kind {other} where a scalar sort was required"))),
    }
}

fn scalar_term<T: Clone>(value: &SymbolicValue<T>) -> Result<T> {
    match value {
        SymbolicValue::SBool(t) => Ok(t.clone()),
        SymbolicValue::SBitvec { term, .. } => Ok(term.clone()),
        SymbolicValue::SBigInt(t) => Ok(t.clone()),
        SymbolicValue::SReal(t) => Ok(t.clone()),
        SymbolicValue::SChar(t) => Ok(t.clone()),
        SymbolicValue::SStr(t) => Ok(t.clone()),
        SymbolicValue::SSeq(t) => Ok(t.clone()),
        SymbolicValue::SMap(t) => Ok(t.clone()),
        other => Err(Error::backend_unsupported("this backend", format!("a compound value ({}) where a scalar term was required", value_tag(other)))),
    }
}

fn wrap_seq_result<T: Clone>(kind: &Kind, term: T) -> SymbolicValue<T> {
    match kind {
        Kind::Str => SymbolicValue::SStr(term),
        _ => SymbolicValue::SSeq(term),
    }
}

fn wrap_scalar_result<T: Clone>(kind: &Kind, term: T) -> Result<SymbolicValue<T>> {
    match kind {
        Kind::Bool => Ok(SymbolicValue::SBool(term)),
        Kind::BigInt => Ok(SymbolicValue::SBigInt(term)),
        Kind::Real => Ok(SymbolicValue::SReal(term)),
        Kind::Char => Ok(SymbolicValue::SChar(term)),
        Kind::Str => Ok(SymbolicValue::SStr(term)),
        Kind::Seq(_) => Ok(SymbolicValue::SSeq(term)),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => {
            Ok(SymbolicValue::SBitvec { term, width: kind.bit_width().unwrap(), signed: !kind.is_unsigned() })
        }
        Kind::Bv(width) => Ok(SymbolicValue::SBitvec { term, width: *width, signed: false }),
        other => Err(Error::backend_unsupported("this backend", format!("a compound element kind {other}"))),
    }
}

fn default_scalar_term<B: Backend>(backend: &mut B, kind: &Kind) -> Result<B::Term> {
    match kind {
        Kind::Bool => Ok(backend.bool_const(false)),
        Kind::BigInt => Ok(backend.int_const(&BigInt::from(0))),
        Kind::Real => Ok(backend.real_const(Rational::from_int(0))),
        Kind::Char => Ok(backend.char_const('\0')),
        Kind::Str => Ok(backend.seq_empty(&Sort::Char)),
        Kind::Seq(elem) => Ok(backend.seq_empty(&sort_of(elem)?)),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => Ok(backend.bv_const(kind.bit_width().unwrap(), 0)),
        Kind::Bv(width) => Ok(backend.bv_const(*width, 0)),
        other => Err(Error::backend_unsupported("this backend", format!("a Map/Set value kind of {other}"))),
    }
}

/// A fully-general default value (spec §4.4's `default_concrete_value`
/// mirrored onto symbolic terms), used only to seed `ConstMap`'s entries
/// before any `ConstMap.Set` overwrites them — `ConstMap` values are not
/// restricted to scalar kinds since there is no array lowering involved.
fn default_symbolic<B: Backend>(backend: &mut B, registry: &mut Registry, kind: &Kind) -> Result<SymbolicValue<B::Term>> {
    match kind {
        Kind::Option(elem) => {
            let has_value = backend.bool_const(false);
            let value = default_symbolic(backend, registry, elem)?;
            wrap_some(registry, (**elem).clone(), value, has_value)
        }
        Kind::Record(id) => {
            let fields = registry.descriptor(*id).fields().to_vec();
            let mut built = Vec::with_capacity(fields.len());
            for (symbol, field_kind) in &fields {
                built.push((*symbol, default_symbolic(backend, registry, field_kind)?));
            }
            Ok(SymbolicValue::SObject { record: *id, fields: built })
        }
        Kind::FSeq(_) => Ok(SymbolicValue::SList(GuardedListGroup::empty(backend.bool_const(true)))),
        Kind::Map(key, value) => {
            let key_sort = sort_of(key)?;
            let value_sort = sort_of(value)?;
            let default_val = default_scalar_term(backend, value)?;
            let false_term = backend.bool_const(false);
            let packed = backend.option_pack(&value_sort, &false_term, &default_val);
            Ok(SymbolicValue::SMap(backend.array_const(&key_sort, &packed)))
        }
        Kind::Set(key) => {
            let key_sort = sort_of(key)?;
            let false_has = backend.bool_const(false);
                let false_val = backend.bool_const(false);
                let default = backend.option_pack(&Sort::Bool, &false_has, &false_val);
            Ok(SymbolicValue::SMap(backend.array_const(&key_sort, &default)))
        }
        Kind::ConstMap(value, keys) => {
            let mut entries = Vec::with_capacity(keys.len());
            for key in keys {
                let symbol = registry.intern(key);
                entries.push((symbol, default_symbolic(backend, registry, value)?));
            }
            Ok(SymbolicValue::SConstMap(entries))
        }
        scalar => {
            let term = default_scalar_term(backend, scalar)?;
            wrap_scalar_result(scalar, term)
        }
    }
}

/// Allocates a fresh backend value for an `Arbitrary` hole of `kind`,
/// recursing structurally for `Option`/`Record` the same way
/// `symlogic_gen::generate` does for the input generator, and naming every
/// leaf with its dotted path for model readback.
fn fresh_value<B: Backend>(backend: &mut B, registry: &mut Registry, kind: &Kind, path: &str) -> Result<SymbolicValue<B::Term>> {
    match kind {
        Kind::Bool => Ok(SymbolicValue::SBool(backend.bool_var(path))),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => {
            let width = kind.bit_width().unwrap();
            Ok(SymbolicValue::SBitvec { term: backend.bv_var(width, path), width, signed: !kind.is_unsigned() })
        }
        Kind::Bv(width) => Ok(SymbolicValue::SBitvec { term: backend.bv_var(*width, path), width: *width, signed: false }),
        Kind::BigInt => Ok(SymbolicValue::SBigInt(backend.int_var(path))),
        Kind::Real => Ok(SymbolicValue::SReal(backend.real_var(path))),
        Kind::Char => Ok(SymbolicValue::SChar(backend.char_var(path))),
        Kind::Str => Ok(SymbolicValue::SStr(backend.seq_var(&Sort::Char, path))),
        Kind::Seq(elem) => Ok(SymbolicValue::SSeq(backend.seq_var(&sort_of(elem)?, path))),
        Kind::Map(key, value) => {
            let key_sort = sort_of(key)?;
            let value_sort = sort_of(value)?;
            Ok(SymbolicValue::SMap(backend.array_var(&key_sort, &value_sort, path)))
        }
        Kind::Set(key) => {
            let key_sort = sort_of(key)?;
            Ok(SymbolicValue::SMap(backend.array_var(&key_sort, &Sort::Bool, path)))
        }
        Kind::Option(elem) => {
            let has_value = backend.bool_var(&format!("{path}.HasValue"));
            let value = fresh_value(backend, registry, elem, &format!("{path}.Value"))?;
            wrap_some(registry, (**elem).clone(), value, has_value)
        }
        Kind::Record(id) => {
            let fields = registry.descriptor(*id).fields().to_vec();
            let mut built = Vec::with_capacity(fields.len());
            for (symbol, field_kind) in &fields {
                let field_name = registry.resolve(*symbol).to_string();
                built.push((*symbol, fresh_value(backend, registry, field_kind, &format!("{path}.{field_name}"))?));
            }
            Ok(SymbolicValue::SObject { record: *id, fields: built })
        }
        Kind::FSeq(_) => Err(Error::invariant_violation(format!(
            "a bare Arbitrary<FSeq<_>> hole at {path} has no depth bound; expand it with symlogic_gen first"
        ))),
        Kind::ConstMap(value, keys) => {
            let mut entries = Vec::with_capacity(keys.len());
            for key in keys {
                let symbol = registry.intern(key);
                entries.push((symbol, fresh_value(backend, registry, value, &format!("{path}.{key}"))?));
            }
            Ok(SymbolicValue::SConstMap(entries))
        }
    }
}

/// Builds a symbolic `Option<elem>` record from a presence term and an
/// already-lowered inner value, mirroring
/// `symlogic_interp::value::Value::option_some`.
fn wrap_some<T: Clone>(registry: &mut Registry, elem: Kind, value: SymbolicValue<T>, has_value: T) -> Result<SymbolicValue<T>> {
    let record = registry.synthesize_option(elem)?;
    let has_value_name = registry.intern("HasValue");
    let value_name = registry.intern("Value");
    Ok(SymbolicValue::SObject { record, fields: vec![(has_value_name, SymbolicValue::SBool(has_value)), (value_name, value)] })
}

fn as_const_map<T: Clone>(value: SymbolicValue<T>) -> Result<Vec<(Symbol, SymbolicValue<T>)>> {
    match value {
        SymbolicValue::SConstMap(entries) => Ok(entries),
        other => Err(type_mismatch("a ConstMap value", &other)),
    }
}

fn map_value_kind(store: &Store, map: ExprId) -> Result<Kind> {
    match store.result_kind(map) {
        Kind::Map(_, value) => Ok((**value).clone()),
        Kind::Set(_) => Ok(Kind::Bool),
        other => Err(Error::invariant_violation(format!("Map operation over non-Map/Set kind {other}"))),
    }
}

fn seq_elem_kind(store: &Store, seq: ExprId) -> Result<Kind> {
    match store.result_kind(seq) {
        Kind::Seq(elem) => Ok((**elem).clone()),
        other => Err(Error::invariant_violation(format!("expected a Seq kind, found {other}"))),
    }
}

fn type_mismatch<T: Clone>(expected: &str, found: &SymbolicValue<T>) -> Error {
    Error::type_mismatch(expected, value_tag(found))
}

/// A short, `T`-independent name for a `SymbolicValue`'s shape, used in error
/// messages in place of a `Debug` impl (leaf terms are backend-opaque).
fn value_tag<T>(value: &SymbolicValue<T>) -> &'static str {
    match value {
        SymbolicValue::SBool(_) => "Bool",
        SymbolicValue::SBitvec { .. } => "a bitvector",
        SymbolicValue::SBigInt(_) => "BigInt",
        SymbolicValue::SReal(_) => "Real",
        SymbolicValue::SChar(_) => "Char",
        SymbolicValue::SStr(_) => "Str",
        SymbolicValue::SSeq(_) => "Seq",
        SymbolicValue::SObject { .. } => "a record",
        SymbolicValue::SMap(_) => "a Map/Set",
        SymbolicValue::SConstMap(_) => "a ConstMap",
        SymbolicValue::SList(_) => "an FSeq",
    }
}

/// A concrete stand-in [`Backend`]: terms carry their own computed value
/// rather than an uninterpreted formula, so `bool_var`/`bv_var`/etc. read
/// from a table the test pre-populates instead of staying free. Exercises
/// `eval_node`'s structure without a real solver; not a `Backend` any
/// production code should use.
#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;
    use symlogic_expr::Builder;

    #[derive(Clone, Debug, PartialEq)]
    enum T {
        Bool(bool),
        Bv { width: u32, signed: bool, bits: u64 },
        Int(BigInt),
        Real(Rational),
        Char(char),
        Str(String),
        Array { default: Box<T>, entries: Vec<(T, T)> },
        Packed { has_value: Box<T>, value: Box<T> },
    }

    impl T {
        fn bool(&self) -> bool {
            match self {
                T::Bool(b) => *b,
                other => panic!("expected Bool, found {other:?}"),
            }
        }
        fn bits(&self) -> u64 {
            match self {
                T::Bv { bits, .. } => *bits,
                other => panic!("expected Bv, found {other:?}"),
            }
        }
    }

    fn rational_lt(a: Rational, b: Rational, or_equal: bool) -> bool {
        let lhs = a.numerator() as i128 * b.denominator() as i128;
        let rhs = b.numerator() as i128 * a.denominator() as i128;
        if or_equal {
            lhs <= rhs
        } else {
            lhs < rhs
        }
    }

    fn mask(width: u32) -> u64 {
        if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        }
    }

    #[derive(Default)]
    struct TestBackend {
        vars: FxHashMap<String, T>,
    }

    impl Backend for TestBackend {
        type Term = T;
        type Model = ();

        fn bool_const(&mut self, value: bool) -> T {
            T::Bool(value)
        }
        fn bool_var(&mut self, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Bool(false))
        }
        fn and(&mut self, a: &T, b: &T) -> T {
            T::Bool(a.bool() && b.bool())
        }
        fn or(&mut self, a: &T, b: &T) -> T {
            T::Bool(a.bool() || b.bool())
        }
        fn not(&mut self, a: &T) -> T {
            T::Bool(!a.bool())
        }
        fn iff(&mut self, a: &T, b: &T) -> T {
            T::Bool(a.bool() == b.bool())
        }
        fn ite(&mut self, cond: &T, then_: &T, else_: &T) -> T {
            if cond.bool() {
                then_.clone()
            } else {
                else_.clone()
            }
        }
        fn bv_const(&mut self, width: u32, bits: u64) -> T {
            T::Bv { width, signed: false, bits: bits & mask(width) }
        }
        fn bv_var(&mut self, width: u32, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Bv { width, signed: false, bits: 0 })
        }
        fn bv_add(&mut self, a: &T, b: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: a.bits().wrapping_add(b.bits()) & mask(w) }
        }
        fn bv_sub(&mut self, a: &T, b: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: a.bits().wrapping_sub(b.bits()) & mask(w) }
        }
        fn bv_mul(&mut self, a: &T, b: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: a.bits().wrapping_mul(b.bits()) & mask(w) }
        }
        fn bv_and(&mut self, a: &T, b: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: a.bits() & b.bits() }
        }
        fn bv_or(&mut self, a: &T, b: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: a.bits() | b.bits() }
        }
        fn bv_xor(&mut self, a: &T, b: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: a.bits() ^ b.bits() }
        }
        fn bv_not(&mut self, a: &T) -> T {
            let (w, s) = match a {
                T::Bv { width, signed, .. } => (*width, *signed),
                _ => panic!("expected Bv"),
            };
            T::Bv { width: w, signed: s, bits: !a.bits() & mask(w) }
        }
        fn bv_min(&mut self, a: &T, b: &T, _signed: bool) -> T {
            if a.bits() <= b.bits() {
                a.clone()
            } else {
                b.clone()
            }
        }
        fn bv_max(&mut self, a: &T, b: &T, _signed: bool) -> T {
            if a.bits() >= b.bits() {
                a.clone()
            } else {
                b.clone()
            }
        }
        fn bv_lt(&mut self, a: &T, b: &T, _signed: bool) -> T {
            T::Bool(a.bits() < b.bits())
        }
        fn bv_leq(&mut self, a: &T, b: &T, _signed: bool) -> T {
            T::Bool(a.bits() <= b.bits())
        }
        fn bv_cast(&mut self, value: &T, _from_width: u32, to_width: u32, _from_signed: bool) -> T {
            T::Bv { width: to_width, signed: false, bits: value.bits() & mask(to_width) }
        }
        fn int_const(&mut self, value: &BigInt) -> T {
            T::Int(value.clone())
        }
        fn int_var(&mut self, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Int(BigInt::from(0)))
        }
        fn int_add(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Int(x + y),
                _ => panic!("expected Int"),
            }
        }
        fn int_sub(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Int(x - y),
                _ => panic!("expected Int"),
            }
        }
        fn int_mul(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Int(x * y),
                _ => panic!("expected Int"),
            }
        }
        fn int_min(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Int(x.min(y).clone()),
                _ => panic!("expected Int"),
            }
        }
        fn int_max(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Int(x.max(y).clone()),
                _ => panic!("expected Int"),
            }
        }
        fn int_lt(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Bool(x < y),
                _ => panic!("expected Int"),
            }
        }
        fn int_leq(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Int(x), T::Int(y)) => T::Bool(x <= y),
                _ => panic!("expected Int"),
            }
        }
        fn real_const(&mut self, value: Rational) -> T {
            T::Real(value)
        }
        fn real_var(&mut self, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Real(Rational::from_int(0)))
        }
        fn real_add(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Real(x.add(*y)),
                _ => panic!("expected Real"),
            }
        }
        fn real_sub(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Real(x.sub(*y)),
                _ => panic!("expected Real"),
            }
        }
        fn real_mul(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Real(x.mul(*y)),
                _ => panic!("expected Real"),
            }
        }
        fn real_min(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Real(if rational_lt(*x, *y, true) { *x } else { *y }),
                _ => panic!("expected Real"),
            }
        }
        fn real_max(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Real(if rational_lt(*x, *y, true) { *y } else { *x }),
                _ => panic!("expected Real"),
            }
        }
        fn real_lt(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Bool(rational_lt(*x, *y, false)),
                _ => panic!("expected Real"),
            }
        }
        fn real_leq(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Real(x), T::Real(y)) => T::Bool(rational_lt(*x, *y, true)),
                _ => panic!("expected Real"),
            }
        }
        fn char_const(&mut self, value: char) -> T {
            T::Char(value)
        }
        fn char_var(&mut self, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Char('\0'))
        }
        fn char_lt(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Char(x), T::Char(y)) => T::Bool(x < y),
                _ => panic!("expected Char"),
            }
        }
        fn char_leq(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Char(x), T::Char(y)) => T::Bool(x <= y),
                _ => panic!("expected Char"),
            }
        }
        fn eq(&mut self, a: &T, b: &T) -> T {
            T::Bool(a == b)
        }
        fn seq_var(&mut self, _elem: &Sort, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Str(String::new()))
        }
        fn seq_empty(&mut self, _elem: &Sort) -> T {
            T::Str(String::new())
        }
        fn str_const(&mut self, value: &str) -> T {
            T::Str(value.to_string())
        }
        fn seq_unit(&mut self, value: &T) -> T {
            match value {
                T::Char(c) => T::Str(c.to_string()),
                other => panic!("expected Char, found {other:?}"),
            }
        }
        fn seq_concat(&mut self, a: &T, b: &T) -> T {
            match (a, b) {
                (T::Str(x), T::Str(y)) => T::Str(format!("{x}{y}")),
                _ => panic!("expected Str"),
            }
        }
        fn seq_length(&mut self, seq: &T) -> T {
            match seq {
                T::Str(s) => T::Int(BigInt::from(s.chars().count())),
                other => panic!("expected Str, found {other:?}"),
            }
        }
        fn seq_nth(&mut self, seq: &T, index: &T) -> T {
            use num_traits::ToPrimitive;
            match (seq, index) {
                (T::Str(s), T::Int(i)) => T::Char(s.chars().nth(i.to_usize().unwrap_or(usize::MAX)).unwrap_or('\0')),
                _ => panic!("expected Str/Int"),
            }
        }
        fn seq_contains(&mut self, haystack: &T, needle: &T, mode: symlogic_expr::ContainsKind) -> T {
            use symlogic_expr::ContainsKind;
            match (haystack, needle) {
                (T::Str(h), T::Str(n)) => T::Bool(match mode {
                    ContainsKind::Prefix => h.starts_with(n.as_str()),
                    ContainsKind::Suffix => h.ends_with(n.as_str()),
                    ContainsKind::Infix => h.contains(n.as_str()),
                }),
                _ => panic!("expected Str"),
            }
        }
        fn seq_index_of(&mut self, haystack: &T, needle: &T) -> T {
            match (haystack, needle) {
                (T::Str(h), T::Str(n)) => T::Int(match h.find(n.as_str()) {
                    Some(byte) => BigInt::from(h[..byte].chars().count()),
                    None => BigInt::from(-1),
                }),
                _ => panic!("expected Str"),
            }
        }
        fn seq_slice(&mut self, seq: &T, offset: &T, length: &T) -> T {
            use num_traits::ToPrimitive;
            match (seq, offset, length) {
                (T::Str(s), T::Int(o), T::Int(l)) => {
                    let chars: Vec<char> = s.chars().collect();
                    let offset = o.to_usize().unwrap_or(chars.len());
                    let length = l.to_usize().unwrap_or(0);
                    if offset >= chars.len() {
                        T::Str(String::new())
                    } else {
                        let end = (offset + length).min(chars.len());
                        T::Str(chars[offset..end].iter().collect())
                    }
                }
                _ => panic!("expected Str/Int"),
            }
        }
        fn seq_replace_first(&mut self, seq: &T, pattern: &T, replacement: &T) -> T {
            match (seq, pattern, replacement) {
                (T::Str(s), T::Str(p), T::Str(r)) => T::Str(s.replacen(p.as_str(), r, 1)),
                _ => panic!("expected Str"),
            }
        }
        fn seq_in_bounds(&mut self, seq: &T, index: &T) -> T {
            use num_traits::ToPrimitive;
            match (seq, index) {
                (T::Str(s), T::Int(i)) => T::Bool(i.to_usize().map(|i| i < s.chars().count()).unwrap_or(false)),
                _ => panic!("expected Str/Int"),
            }
        }
        fn int_const_from_i64(&mut self, value: i64) -> T {
            T::Int(BigInt::from(value))
        }
        fn seq_matches_regex(&mut self, _seq: &T, _regex: &symlogic_expr::RegexExpr) -> Result<T> {
            Err(Error::backend_unsupported("TestBackend", "regex matching"))
        }
        fn array_var(&mut self, _key: &Sort, _value: &Sort, name: &str) -> T {
            self.vars.get(name).cloned().unwrap_or(T::Array { default: Box::new(T::Bool(false)), entries: Vec::new() })
        }
        fn array_const(&mut self, _key: &Sort, default: &T) -> T {
            T::Array { default: Box::new(default.clone()), entries: Vec::new() }
        }
        fn array_select(&mut self, array: &T, key: &T) -> T {
            match array {
                T::Array { default, entries } => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap_or_else(|| (**default).clone()),
                other => panic!("expected Array, found {other:?}"),
            }
        }
        fn array_store(&mut self, array: &T, key: &T, value: &T) -> T {
            match array {
                T::Array { default, entries } => {
                    let mut entries = entries.clone();
                    match entries.iter_mut().find(|(k, _)| k == key) {
                        Some(slot) => slot.1 = value.clone(),
                        None => entries.push((key.clone(), value.clone())),
                    }
                    T::Array { default: default.clone(), entries }
                }
                other => panic!("expected Array, found {other:?}"),
            }
        }
        fn array_combine(&mut self, op: symlogic_expr::CombineOp, left: &T, right: &T) -> Result<T> {
            use symlogic_expr::CombineOp;
            match (left, right) {
                (T::Array { default, entries: l }, T::Array { entries: r, .. }) => {
                    let entries = match op {
                        CombineOp::Union => {
                            let mut combined = l.clone();
                            for (k, v) in r {
                                if !combined.iter().any(|(ek, _)| ek == k) {
                                    combined.push((k.clone(), v.clone()));
                                }
                            }
                            combined
                        }
                        CombineOp::Intersect => l.iter().filter(|(k, _)| r.iter().any(|(ek, _)| ek == k)).cloned().collect(),
                        CombineOp::Difference => l.iter().filter(|(k, _)| !r.iter().any(|(ek, _)| ek == k)).cloned().collect(),
                    };
                    Ok(T::Array { default: default.clone(), entries })
                }
                _ => panic!("expected Array"),
            }
        }
        fn option_pack(&mut self, _value_sort: &Sort, has_value: &T, value: &T) -> T {
            T::Packed { has_value: Box::new(has_value.clone()), value: Box::new(value.clone()) }
        }
        fn option_unpack_has_value(&mut self, _value_sort: &Sort, packed: &T) -> T {
            match packed {
                T::Packed { has_value, .. } => (**has_value).clone(),
                other => panic!("expected Packed, found {other:?}"),
            }
        }
        fn option_unpack_value(&mut self, _value_sort: &Sort, packed: &T) -> T {
            match packed {
                T::Packed { value, .. } => (**value).clone(),
                other => panic!("expected Packed, found {other:?}"),
            }
        }
        fn solve(&mut self, _assertions: &[T]) -> Result<Option<()>> {
            Ok(Some(()))
        }
        fn model_bool(&self, _model: &(), _term: &T) -> Option<bool> {
            None
        }
        fn model_rational(&self, _model: &(), _term: &T) -> Option<Rational> {
            None
        }
        fn model_char(&self, _model: &(), _term: &T) -> Option<char> {
            None
        }
        fn model_string(&self, _model: &(), _term: &T) -> Option<String> {
            None
        }
    }

    #[test]
    fn u8_addition_wraps_at_evaluation() {
        let mut b = Builder::new();
        let max = b.const_fixed(Kind::U8, 255).unwrap();
        let one = b.const_fixed(Kind::U8, 1).unwrap();
        let sum = b.add(max, one).unwrap();
        let mut backend = TestBackend::default();
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();
        let value = evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, sum, &env).unwrap();
        match value {
            SymbolicValue::SBitvec { term, width, signed } => {
                assert_eq!(term, T::Bv { width: 8, signed: false, bits: 0 });
                assert_eq!(width, 8);
                assert!(!signed);
            }
            other => panic!("expected SBitvec, found {}", value_tag(&other)),
        }
    }

    #[test]
    fn arbitrary_hole_allocates_once_and_is_reused() {
        let mut b = Builder::new();
        let hole = b.arbitrary(Kind::Bool, Some("flag"));
        let also_hole = hole;
        let mut backend = TestBackend::default();
        backend.vars.insert("flag".to_string(), T::Bool(true));
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();
        let first = evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, hole, &env).unwrap();
        let second = evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, also_hole, &env).unwrap();
        assert_eq!(*first.as_bool().unwrap(), T::Bool(true));
        assert_eq!(*second.as_bool().unwrap(), T::Bool(true));
        assert_eq!(witnesses.len(), 1);
    }

    #[test]
    fn if_always_lowers_both_branches_and_selects_via_ite() {
        let mut b = Builder::new();
        let cond = b.arbitrary(Kind::Bool, Some("cond"));
        let a = b.const_fixed(Kind::U8, 1).unwrap();
        let c = b.const_fixed(Kind::U8, 2).unwrap();
        let if_expr = b.if_(cond, a, c).unwrap();
        let mut backend = TestBackend::default();
        backend.vars.insert("cond".to_string(), T::Bool(false));
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();
        let value = evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, if_expr, &env).unwrap();
        match value {
            SymbolicValue::SBitvec { term, .. } => assert_eq!(term, T::Bv { width: 8, signed: false, bits: 2 }),
            other => panic!("expected SBitvec, found {}", value_tag(&other)),
        }
    }

    #[test]
    fn fseq_case_sums_a_fixed_depth_list() {
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

        let mut backend = TestBackend::default();
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();
        let value = evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, case, &env).unwrap();
        match value {
            SymbolicValue::SBitvec { term, .. } => assert_eq!(term, T::Bv { width: 8, signed: false, bits: 3 }),
            other => panic!("expected SBitvec, found {}", value_tag(&other)),
        }
    }

    #[test]
    fn map_get_roundtrips_set_value() {
        let mut b = Builder::new();
        let map = b.map_empty(Kind::U8, Kind::Bool);
        let key = b.const_fixed(Kind::U8, 7).unwrap();
        let value = b.const_bool(true);
        let set = b.map_set(map, key, value).unwrap();
        let get = b.map_get(set, key).unwrap();
        let mut backend = TestBackend::default();
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();
        let result = evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, get, &env).unwrap();
        assert_eq!(result.option_has_value(), Some(&T::Bool(true)));
        assert_eq!(*result.option_inner().unwrap().as_bool().unwrap(), T::Bool(true));
    }

    #[test]
    fn bare_arbitrary_fseq_is_rejected() {
        let mut b = Builder::new();
        let hole = b.arbitrary(Kind::fseq(Kind::U8), Some("list"));
        let mut backend = TestBackend::default();
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();
        assert!(evaluate(&b.store, &mut b.registry, &mut backend, &mut witnesses, hole, &env).is_err());
    }

    #[test]
    fn merge_of_mismatched_shapes_is_an_invariant_violation_not_a_panic() {
        use symlogic_base::error::ErrorKind;

        let mut backend = TestBackend::default();
        let guard = backend.bool_const(true);
        let then_ = SymbolicValue::SBool(T::Bool(true));
        let else_ = SymbolicValue::SBigInt(T::Int(BigInt::from(0)));

        let err = merge(&mut backend, &guard, &then_, &else_).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvariantViolation);
    }
}
