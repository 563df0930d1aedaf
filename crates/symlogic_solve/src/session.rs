//! The `Solve` capability's entry points: find a satisfying assignment, or
//! search for an extremal one, over a closed symlogic expression.
//!
//! Mirrors the teacher's `VerificationSession`: one fresh [`z3::Context`]
//! (and [`Z3Backend`]) per call, since nothing about a solve needs to share
//! state with a later one. Unlike the teacher's `VerifyExpr` IR, the
//! expression being solved is a plain `symlogic_expr::ExprId` — no separate
//! verification AST is needed once `symlogic_symbolic::evaluate` already
//! lowers the real expression universe onto a [`Backend`].

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use symlogic_base::error::{Error, Result};
use symlogic_expr::{ExprId, Rational, Store};
use symlogic_symbolic::backend::Backend;
use symlogic_symbolic::{evaluate, SymbolicEnv, SymbolicValue, WitnessMap};
use symlogic_types::Registry;

use crate::backend::Z3Backend;

/// A rendered `Arbitrary`-hole assignment from a satisfying model.
#[derive(Debug, Clone, PartialEq)]
pub enum Witness {
    Bool(bool),
    Number(Rational),
    Char(char),
    Str(String),
}

/// The result of a successful [`solve`]/[`maximize`]/[`minimize`] call: a
/// rendered value per `Arbitrary` hole that was actually visited while
/// evaluating the expression.
pub type Model = FxHashMap<u64, Witness>;

/// Finds an assignment to every `Arbitrary` hole in `expr` that makes it
/// evaluate to `true`, or `None` if no such assignment exists.
pub fn solve(store: &Store, registry: &mut Registry, expr: ExprId) -> Result<Option<Model>> {
    tracing::debug!(backend = "z3", "solve: lowering expression onto the backend");
    let cfg = z3::Config::new();
    let ctx = z3::Context::new(&cfg);
    let mut backend = Z3Backend::new(&ctx);
    let mut witnesses = WitnessMap::default();
    let env = SymbolicEnv::new();

    let value = evaluate(store, registry, &mut backend, &mut witnesses, expr, &env)?;
    let formula = value.as_bool()?.clone();

    tracing::trace!(holes = witnesses.len(), "solve: dispatching to the backend's check()");
    match backend.solve(&[formula])? {
        Some(model) => Ok(Some(render(&backend, &model, &witnesses))),
        None => Ok(None),
    }
}

/// Finds an assignment maximizing (`ascending = false`) or minimizing
/// (`ascending = true`) `objective`'s value subject to `constraint`
/// evaluating to `true`, via a binary search over [`Backend::solve`] calls.
///
/// `lo`/`hi` bound the search (inclusive); the search narrows until the two
/// bounds meet, so both must already be feasible/infeasible boundaries the
/// caller is confident bracket the optimum.
fn search_extremum(
    store: &Store,
    registry: &mut Registry,
    constraint: ExprId,
    objective: ExprId,
    mut lo: i64,
    mut hi: i64,
    ascending: bool,
) -> Result<Option<Model>> {
    tracing::debug!(backend = "z3", ascending, lo, hi, "search_extremum: binary search over [lo, hi]");
    let mut best: Option<Model> = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        tracing::trace!(mid, lo, hi, "search_extremum: probing bound");
        let cfg = z3::Config::new();
        let ctx = z3::Context::new(&cfg);
        let mut backend = Z3Backend::new(&ctx);
        let mut witnesses = WitnessMap::default();
        let env = SymbolicEnv::new();

        let constraint_value = evaluate(store, registry, &mut backend, &mut witnesses, constraint, &env)?;
        let objective_value = evaluate(store, registry, &mut backend, &mut witnesses, objective, &env)?;
        let bound_holds = bound_comparison(&mut backend, &objective_value, mid, ascending)?;
        let formula = backend.and(constraint_value.as_bool()?, &bound_holds);

        match backend.solve(&[formula])? {
            Some(model) => {
                best = Some(render(&backend, &model, &witnesses));
                if ascending {
                    hi = mid - 1;
                } else {
                    lo = mid + 1;
                }
            }
            None => {
                if ascending {
                    lo = mid + 1;
                } else {
                    hi = mid - 1;
                }
            }
        }
    }
    Ok(best)
}

/// Minimizes `objective`'s value subject to `constraint`, searching the
/// inclusive integer range `[lo, hi]`.
pub fn minimize(store: &Store, registry: &mut Registry, constraint: ExprId, objective: ExprId, lo: i64, hi: i64) -> Result<Option<Model>> {
    search_extremum(store, registry, constraint, objective, lo, hi, true)
}

/// Maximizes `objective`'s value subject to `constraint`, searching the
/// inclusive integer range `[lo, hi]`.
pub fn maximize(store: &Store, registry: &mut Registry, constraint: ExprId, objective: ExprId, lo: i64, hi: i64) -> Result<Option<Model>> {
    search_extremum(store, registry, constraint, objective, lo, hi, false)
}

/// Builds `objective <= mid` (ascending search, i.e. minimizing) or
/// `objective >= mid` (descending, maximizing), in whichever numeric sort
/// `objective` actually has.
fn bound_comparison<'ctx>(
    backend: &mut Z3Backend<'ctx>,
    objective: &SymbolicValue<z3::ast::Dynamic<'ctx>>,
    mid: i64,
    ascending: bool,
) -> Result<z3::ast::Dynamic<'ctx>> {
    match objective {
        SymbolicValue::SBitvec { term, width, signed } => {
            let bound = backend.bv_const(*width, mid as u64);
            Ok(if ascending { backend.bv_leq(term, &bound, *signed) } else { backend.bv_leq(&bound, term, *signed) })
        }
        SymbolicValue::SBigInt(term) => {
            let bound = backend.int_const(&BigInt::from(mid));
            Ok(if ascending { backend.int_leq(term, &bound) } else { backend.int_leq(&bound, term) })
        }
        SymbolicValue::SReal(term) => {
            let bound = backend.real_const(Rational::from_int(mid));
            Ok(if ascending { backend.real_leq(term, &bound) } else { backend.real_leq(&bound, term) })
        }
        _ => Err(Error::type_mismatch("a numeric value", "a non-numeric symbolic value")),
    }
}

fn render<'ctx>(backend: &Z3Backend<'ctx>, model: &z3::Model<'ctx>, witnesses: &WitnessMap<z3::ast::Dynamic<'ctx>>) -> Model {
    let mut rendered = FxHashMap::default();
    for (id, value) in witnesses {
        if let Some(witness) = render_value(backend, model, value) {
            rendered.insert(*id, witness);
        }
    }
    rendered
}

fn render_value<'ctx>(backend: &Z3Backend<'ctx>, model: &z3::Model<'ctx>, value: &SymbolicValue<z3::ast::Dynamic<'ctx>>) -> Option<Witness> {
    match value {
        SymbolicValue::SBool(term) => backend.model_bool(model, term).map(Witness::Bool),
        SymbolicValue::SBitvec { term, .. } | SymbolicValue::SBigInt(term) | SymbolicValue::SReal(term) => {
            backend.model_rational(model, term).map(Witness::Number)
        }
        SymbolicValue::SChar(term) => backend.model_char(model, term).map(Witness::Char),
        SymbolicValue::SStr(term) | SymbolicValue::SSeq(term) => backend.model_string(model, term).map(Witness::Str),
        // Records, Map/Set arrays, and FSeq witnesses have no single scalar
        // rendering; a caller after a record-shaped `Arbitrary` hole should
        // walk `SymbolicValue::SObject`'s fields itself.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symlogic_base::error::ErrorKind;
    use symlogic_expr::{Builder, CombineOp};
    use symlogic_types::Kind;

    #[test]
    fn tautology_is_satisfiable_with_no_arbitrary_holes() {
        let mut b = Builder::new();
        let t = b.const_bool(true);
        let f = b.const_bool(false);
        let formula = b.or(t, f).unwrap();

        let model = solve(&b.store, &mut b.registry, formula).unwrap();
        assert!(model.is_some());
    }

    #[test]
    fn contradiction_is_unsatisfiable() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::Bool, Some("x"));
        let not_x = b.not(x).unwrap();
        let formula = b.and(x, not_x).unwrap();

        let model = solve(&b.store, &mut b.registry, formula).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn boolean_hole_is_solved_to_make_xor_true() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::Bool, Some("x"));
        let y = b.const_bool(false);
        // x XOR y, with y fixed to false, forces x to true.
        let not_y = b.not(y).unwrap();
        let both = b.and(x, not_y).unwrap();
        let neither = b.and(b.not(x).unwrap(), y).unwrap();
        let formula = b.or(both, neither).unwrap();

        let model = solve(&b.store, &mut b.registry, formula).unwrap().unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(*model.values().next().unwrap(), Witness::Bool(true));
    }

    #[test]
    fn bitvector_hole_found_within_an_integer_bound() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::U8, Some("x"));
        let ten = b.const_fixed(Kind::U8, 10).unwrap();
        let formula = b.lt(x, ten).unwrap();

        let model = solve(&b.store, &mut b.registry, formula).unwrap().unwrap();
        let Witness::Number(value) = model.values().next().unwrap() else {
            panic!("expected a numeric witness for a U8 hole");
        };
        assert_eq!(value.denominator(), 1);
        assert!(value.numerator() < 10);
    }

    #[test]
    fn bitvector_bound_outside_the_type_range_is_unsatisfiable() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::U8, Some("x"));
        let zero = b.const_fixed(Kind::U8, 0).unwrap();
        let formula = b.lt(x, zero).unwrap();

        let model = solve(&b.store, &mut b.registry, formula).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn maximize_respects_an_upper_bound_constraint() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::I32, Some("x"));
        let bound = b.const_fixed(Kind::I32, 100).unwrap();
        let zero = b.const_fixed(Kind::I32, 0).unwrap();
        let upper = b.leq(x, bound).unwrap();
        let lower = b.leq(zero, x).unwrap();
        let constraint = b.and(upper, lower).unwrap();

        let model = maximize(&b.store, &mut b.registry, constraint, x, 0, 100).unwrap().unwrap();
        let Witness::Number(value) = model.values().next().unwrap() else {
            panic!("expected a numeric witness for an I32 hole");
        };
        assert_eq!(value.numerator(), 100);
    }

    #[test]
    fn minimize_respects_a_lower_bound_constraint() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::I32, Some("x"));
        let bound = b.const_fixed(Kind::I32, 100).unwrap();
        let five = b.const_fixed(Kind::I32, 5).unwrap();
        let upper = b.leq(x, bound).unwrap();
        let lower = b.leq(five, x).unwrap();
        let constraint = b.and(upper, lower).unwrap();

        let model = minimize(&b.store, &mut b.registry, constraint, x, 0, 100).unwrap().unwrap();
        let Witness::Number(value) = model.values().next().unwrap() else {
            panic!("expected a numeric witness for an I32 hole");
        };
        assert_eq!(value.numerator(), 5);
    }

    #[test]
    fn map_combine_is_a_disclosed_error_rather_than_a_panic() {
        let mut b = Builder::new();
        let left = b.map_empty(Kind::U8, Kind::U8);
        let right = b.map_empty(Kind::U8, Kind::U8);
        let combined = b.map_combine(CombineOp::Union, left, right).unwrap();
        let zero = b.const_fixed(Kind::U8, 0).unwrap();
        let got = b.map_get(combined, zero).unwrap();
        let none = b.option_none(Kind::U8).unwrap();
        let formula = b.eq(got, none).unwrap();

        let err = solve(&b.store, &mut b.registry, formula).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendUnsupported);
        assert!(err.to_string().contains("Map.Combine"));
    }

    #[test]
    fn regex_match_is_satisfied_by_a_string_in_the_literal_range() {
        use symlogic_expr::RegexExpr;

        let mut b = Builder::new();
        let x = b.arbitrary(Kind::Str, Some("x"));
        let one = b.const_fixed(Kind::BigInt, 1).unwrap();
        let length = b.seq_length(x);
        let is_single_char = b.eq(length, one).unwrap();
        let in_range = b.seq_matches_regex(x, RegexExpr::Range('a', 'c')).unwrap();
        let formula = b.and(is_single_char, in_range).unwrap();

        let model = solve(&b.store, &mut b.registry, formula).unwrap().unwrap();
        let Witness::Str(value) = model.values().next().unwrap() else {
            panic!("expected a string witness for a Str hole");
        };
        assert!(('a'..='c').contains(&value.chars().next().unwrap()));
    }
}
