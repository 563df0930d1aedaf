//! Boolean and bitvector seed scenarios: `find` over an XOR-shaped
//! predicate, and a `u8` overflow witness.

use symlogic::{Function, SolveConfig, Value};
use symlogic_types::Kind;

fn main() {
    // e = λ(a,b). (a ∧ ¬b) ∨ (¬a ∧ b); find (a,b) with e(a,b) = true.
    let mut xor = Function::new(vec![Kind::Bool, Kind::Bool], Kind::Bool, |b, args| {
        let not_b = b.not(args[1])?;
        let not_a = b.not(args[0])?;
        let both = b.and(args[0], not_b)?;
        let neither = b.and(not_a, args[1])?;
        b.or(both, neither)
    });
    let model = xor.find(&SolveConfig::default()).unwrap().expect("xor is satisfiable");
    let (Value::Bool(a), Value::Bool(bv)) = (&model[0], &model[1]) else { unreachable!() };
    println!("xor: a={a} b={bv}");
    assert_ne!(a, bv);

    // e = λx:u8. x + 1; find x with e(x) = 0, i.e. the wraparound point.
    let mut overflow = Function::new(vec![Kind::U8], Kind::U8, |b, args| {
        let one = b.const_fixed(Kind::U8, 1)?;
        b.add(args[0], one)
    });
    let mut find_wraparound = Function::new(vec![Kind::U8], Kind::Bool, |b, args| {
        let one = b.const_fixed(Kind::U8, 1)?;
        let next = b.add(args[0], one)?;
        let zero = b.const_fixed(Kind::U8, 0)?;
        b.eq(next, zero)
    });
    let model = find_wraparound.find(&SolveConfig::default()).unwrap().expect("wraparound is satisfiable");
    let Value::Bv { bits, .. } = &model[0] else { unreachable!() };
    println!("wraparound: x={bits}");
    assert_eq!(*bits, 255);

    let wrapped = overflow.evaluate(vec![Value::Bv { width: 8, signed: false, bits: 255 }]).unwrap();
    assert_eq!(wrapped, Value::Bv { width: 8, signed: false, bits: 0 });
}
