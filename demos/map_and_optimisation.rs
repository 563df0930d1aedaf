//! Map round-trip and optimisation seed scenarios: an UNSAT check over a
//! `get(set(m, k, v), k)` round-trip, and a bounded `maximize`.

use symlogic::{Function, SolveConfig, Value};
use symlogic_types::Kind;

fn main() {
    // e = λm:Map<u8,u8>. get(set(m, 1, 42), 1); find m with e(m) != Some(42)
    // should be UNSAT — the map round-trip property holds for every m.
    let mut find_counterexample = Function::new(vec![Kind::map(Kind::U8, Kind::U8)], Kind::Bool, |b, args| {
        let one = b.const_fixed(Kind::U8, 1)?;
        let forty_two = b.const_fixed(Kind::U8, 42)?;
        let updated = b.map_set(args[0], one, forty_two)?;
        let got = b.map_get(updated, one)?;
        let expected = b.option_some(forty_two)?;
        let equal = b.eq(got, expected)?;
        b.not(equal)
    });
    let model = find_counterexample.find(&SolveConfig::default()).unwrap();
    println!("round-trip counterexample: {model:?}");
    assert!(model.is_none());

    // e = λx:i32. x; maximize(e, λx. 0 <= x <= 100) -> 100.
    let mut range = Function::new(vec![Kind::I32], Kind::Bool, |_b, _args| unreachable!());
    let model = range
        .maximize(
            |b, args| {
                let zero = b.const_fixed(Kind::I32, 0)?;
                let hundred = b.const_fixed(Kind::I32, 100)?;
                let lower = b.leq(zero, args[0])?;
                let upper = b.leq(args[0], hundred)?;
                b.and(lower, upper)
            },
            |_b, args| Ok(args[0]),
            &SolveConfig::default(),
            0,
            100,
        )
        .unwrap()
        .expect("the bounded range is satisfiable");
    let Value::Bv { bits, .. } = &model[0] else { unreachable!() };
    println!("maximum x in [0, 100]: {bits}");
    assert_eq!(*bits, 100);
}
