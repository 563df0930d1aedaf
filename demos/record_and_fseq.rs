//! Record and `FSeq` seed scenarios: prefix matching over a reflected
//! `{addr: u32, len: u8}` record, and a depth-bounded sum search.

use symlogic::{Builder, Function, Result, SolveConfig, Value};
use symlogic_types::{Kind, Registry};

/// Registers `P{addr: u32, len: u8}` and returns its id. Called once against
/// a scratch registry to learn the id up front, and again inside every
/// function body against that function's own registry — `register_record`
/// is idempotent by signature, and both registries assign ids in the same
/// deterministic order starting from empty, so the ids agree.
fn register_p(registry: &mut Registry) -> symlogic_types::RecordId {
    registry.register_record("P", vec![("addr", Kind::U32), ("len", Kind::U8)]).unwrap()
}

/// Unrolls `FSeq.Case` `remaining` levels deep to sum a list's elements —
/// the bounded recursion `Function::compile`'s `maxUnrollingDepth` knob
/// describes, built by hand here since this demo calls `find` directly.
fn sum_fseq(b: &mut Builder, list: symlogic::ExprId, remaining: u32) -> Result<symlogic::ExprId> {
    let zero = b.const_fixed(Kind::U32, 0)?;
    if remaining == 0 {
        return Ok(zero);
    }
    let head_arg = b.fresh_argument_id();
    let tail_arg = b.fresh_argument_id();
    let head_opt = b.argument(head_arg, Kind::option(Kind::U32));
    let head_value = b.get_field(head_opt, "Value")?;
    let tail_list = b.argument(tail_arg, Kind::fseq(Kind::U32));
    let tail_sum = sum_fseq(b, tail_list, remaining - 1)?;
    let cons_body = b.add(head_value, tail_sum)?;
    b.fseq_case(list, zero, head_arg, tail_arg, cons_body)
}

fn main() {
    let mut scratch = Registry::new();
    let p = register_p(&mut scratch);
    let p_kind = Kind::Record(p);

    // match(p, ip) = (ip & mask) = (p.addr & mask); mask picks out p.len's
    // leading bits. len=8 fixes the mask to the top byte for this demo.
    let mask: i128 = 0xFF00_0000;
    let mut find_prefix_match = Function::new(vec![p_kind.clone(), Kind::U32], Kind::Bool, move |b, args| {
        register_p(&mut b.registry);
        let addr = b.get_field(args[0], "addr")?;
        let mask_expr = b.const_fixed(Kind::U32, mask)?;
        let masked_addr = b.bit_and(addr, mask_expr)?;
        let masked_ip = b.bit_and(args[1], mask_expr)?;
        let matches = b.eq(masked_ip, masked_addr)?;
        let eq_addr = b.eq(args[1], addr)?;
        let differs = b.not(eq_addr)?;
        b.and(matches, differs)
    });
    let model = find_prefix_match.find(&SolveConfig::default()).unwrap().expect("a matching, distinct ip exists");
    let Value::Bv { bits: ip, .. } = &model[1] else { unreachable!() };
    println!("matching ip: {ip:#010x}");
    assert_eq!(ip & 0xFF00_0000, 0x0A00_0000);

    // e = λxs:FSeq<u32>. sum(xs); with depth=3, find xs with sum(xs) = 7.
    let mut find_sum_seven = Function::new(vec![Kind::fseq(Kind::U32)], Kind::Bool, |b, args| {
        let sum = sum_fseq(b, args[0], 3)?;
        let seven = b.const_fixed(Kind::U32, 7)?;
        b.eq(sum, seven)
    });
    let config = SolveConfig { depth: 3, ..SolveConfig::default() };
    let model = find_sum_seven.find(&config).unwrap().expect("some list of length <= 3 sums to 7");
    let Value::FSeq(elements) = &model[0] else { unreachable!() };
    println!("list summing to 7: {elements:?}");
    assert!(elements.len() <= 3);
}
