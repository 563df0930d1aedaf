//! Depth-bounded fresh-value generation (spec §4.5).

use symlogic_base::error::Result;
use symlogic_expr::{Builder, ExprId};
use symlogic_types::{Kind, RecordId};

use crate::config::GenConfig;

/// Produces a fresh symbolic value of `kind` under `config`.
///
/// - A primitive kind (`Bool`, a fixed-width integer, `BigInt`, `Real`,
///   `Char`, `Str`) becomes one fresh [`Builder::arbitrary`] variable.
/// - `Seq<T>`, `Map<K,V>`, and `Set<K>` also become a single fresh
///   sort-level variable — the backend, not this generator, is responsible
///   for picking concrete contents.
/// - `Option<T>` and any `Record` (including synthesized tuples) are built
///   by structural composition: one fresh variable per leaf.
/// - `FSeq<T>` is built to exactly `config.depth` elements via repeated
///   `AddFront`; see [`generate_fseq`] for how `check_smaller_depths`
///   changes each head.
/// - `ConstMap<K,V>` gets one fresh value per statically-enumerated key.
pub fn generate(builder: &mut Builder, kind: &Kind, config: &GenConfig) -> Result<ExprId> {
    generate_at(builder, kind, config, &config.name_prefix)
}

fn generate_at(builder: &mut Builder, kind: &Kind, config: &GenConfig, path: &str) -> Result<ExprId> {
    match kind {
        Kind::Bool
        | Kind::I8
        | Kind::I16
        | Kind::I32
        | Kind::I64
        | Kind::U8
        | Kind::U16
        | Kind::U32
        | Kind::U64
        | Kind::Bv(_)
        | Kind::BigInt
        | Kind::Real
        | Kind::Char
        | Kind::Str
        | Kind::Seq(_)
        | Kind::Map(_, _)
        | Kind::Set(_) => Ok(builder.arbitrary(kind.clone(), Some(path))),
        Kind::Option(elem) => generate_option(builder, elem, config, path),
        Kind::Record(id) => generate_record(builder, *id, config, path),
        Kind::FSeq(elem) => generate_fseq(builder, elem, config, path),
        Kind::ConstMap(value, keys) => generate_const_map(builder, value, keys, config, path),
    }
}

/// `Option<elem>` as a fresh presence bit paired with a fresh element —
/// used both directly (for an `Option`-kinded slot) and by `generate_fseq`
/// to build each `checkSmallerDepths` head.
fn generate_option(builder: &mut Builder, elem: &Kind, config: &GenConfig, path: &str) -> Result<ExprId> {
    let has_value = builder.arbitrary(Kind::Bool, Some(&format!("{path}.HasValue")));
    let value = generate_at(builder, elem, config, &format!("{path}.Value"))?;
    builder.option_of(has_value, value)
}

fn generate_record(builder: &mut Builder, id: RecordId, config: &GenConfig, path: &str) -> Result<ExprId> {
    let fields = builder.registry.descriptor(id).fields().to_vec();
    let mut built = Vec::with_capacity(fields.len());
    for (symbol, field_kind) in &fields {
        let field_name = builder.registry.resolve(*symbol).to_string();
        let value = generate_at(builder, field_kind, config, &format!("{path}.{field_name}"))?;
        built.push((field_name, value));
    }
    let named: Vec<(&str, ExprId)> = built.iter().map(|(name, value)| (name.as_str(), *value)).collect();
    builder.create_object(id, named)
}

/// Builds a length-`config.depth` `FSeq<elem>` via `AddFront`.
///
/// With `check_smaller_depths`, each head is an independently fresh
/// `Option<elem>` (a symbolic presence bit), so the single generated value
/// encodes every length from `0` through `depth` at once: the concrete
/// semantics treat a `None` head as truncating the list there (spec §5).
/// Without it, every head is forced `Some` of a fresh element, so the
/// sequence always has exactly `depth` elements.
fn generate_fseq(builder: &mut Builder, elem: &Kind, config: &GenConfig, path: &str) -> Result<ExprId> {
    let mut list = builder.fseq_empty(elem.clone());
    for i in 0..config.depth {
        let slot = format!("{path}.{i}");
        let head = if config.check_smaller_depths {
            generate_option(builder, elem, config, &slot)?
        } else {
            let value = generate_at(builder, elem, config, &format!("{slot}.Value"))?;
            builder.option_some(value)?
        };
        list = builder.fseq_add_front(head, list)?;
    }
    Ok(list)
}

fn generate_const_map(
    builder: &mut Builder,
    value: &Kind,
    keys: &[String],
    config: &GenConfig,
    path: &str,
) -> Result<ExprId> {
    let mut map = builder.const_map_empty(value.clone(), keys.to_vec());
    for key in keys {
        let fresh = generate_at(builder, value, config, &format!("{path}.{key}"))?;
        map = builder.const_map_set(map, key, fresh)?;
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use symlogic_expr::ExprKind;

    #[test]
    fn primitive_kind_yields_a_single_arbitrary_node() {
        let mut b = Builder::new();
        let config = GenConfig::new("root");
        let value = generate(&mut b, &Kind::U8, &config).unwrap();
        assert!(matches!(b.store.kind(value), ExprKind::Arbitrary { .. }));
        assert_eq!(b.kind_of(value), &Kind::U8);
    }

    #[test]
    fn depth_zero_fseq_is_exactly_empty() {
        let mut b = Builder::new();
        let config = GenConfig::new("root").with_depth(0);
        let value = generate(&mut b, &Kind::fseq(Kind::U8), &config).unwrap();
        assert!(matches!(b.store.kind(value), ExprKind::FSeqEmpty { .. }));
    }

    #[test]
    fn fixed_depth_fseq_forces_every_head_present() {
        let mut b = Builder::new();
        let config = GenConfig::new("root").with_depth(3).with_check_smaller_depths(false);
        let value = generate(&mut b, &Kind::fseq(Kind::U8), &config).unwrap();
        let mut current = value;
        let mut count = 0;
        while let ExprKind::FSeqAddFront { head, tail } = b.store.kind(current).clone() {
            match b.store.kind(head) {
                ExprKind::CreateObject { fields, .. } => {
                    let (_, has_value) = fields[0];
                    assert!(matches!(b.store.kind(has_value), ExprKind::ConstBool(true)));
                }
                other => panic!("expected a CreateObject head, found {other:?}"),
            }
            count += 1;
            current = tail;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn shrinking_fseq_gives_every_head_a_symbolic_presence_bit() {
        let mut b = Builder::new();
        let config = GenConfig::new("root").with_depth(2).with_check_smaller_depths(true);
        let value = generate(&mut b, &Kind::fseq(Kind::Bool), &config).unwrap();
        let ExprKind::FSeqAddFront { head, .. } = b.store.kind(value).clone() else {
            panic!("expected an AddFront node");
        };
        let ExprKind::CreateObject { fields, .. } = b.store.kind(head).clone() else {
            panic!("expected a CreateObject head");
        };
        let (_, has_value) = fields[0];
        assert!(matches!(b.store.kind(has_value), ExprKind::Arbitrary { .. }));
    }

    #[test]
    fn const_map_gets_a_fresh_value_per_key() {
        let mut b = Builder::new();
        let config = GenConfig::new("root");
        let keys = vec!["a".to_string(), "b".to_string()];
        let value = generate(&mut b, &Kind::const_map(Kind::U8, keys), &config).unwrap();
        assert!(matches!(b.kind_of(value), Kind::ConstMap(_, _)));
    }

    #[test]
    fn record_gets_one_fresh_variable_per_field() {
        let mut b = Builder::new();
        let record = b.registry.synthesize_tuple(vec![Kind::U8, Kind::Bool]).unwrap();
        let config = GenConfig::new("root");
        let value = generate(&mut b, &Kind::Record(record), &config).unwrap();
        let ExprKind::CreateObject { fields, .. } = b.store.kind(value).clone() else {
            panic!("expected a CreateObject node");
        };
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|(_, v)| matches!(b.store.kind(*v), ExprKind::Arbitrary { .. })));
    }
}
