//! Record reflection and the kind-visitor dispatcher.
//!
//! A [`Registry`] is where algebraic records get their one-time reflection:
//! each registration is cached as an ordered field-name → [`Kind`] map and,
//! from then on, every registry user treats the record purely structurally
//! via its [`RecordId`].
//!
//! [`KindVisitor`] gives every consumer (the concrete interpreter, the
//! symbolic evaluator, the input generator) one method per element kind and
//! per structural constructor, matching the closed universe in
//! [`crate::kind::Kind`]. [`visit`] is the single dispatcher every one of
//! those consumers calls instead of hand-rolling its own match.

use crate::kind::{Kind, RecordId};
use rustc_hash::FxHashMap;
use symlogic_base::error::{Error, Result};
use symlogic_base::Symbol;

/// A reflected record's field layout: an ordered list of named, typed
/// fields, reflected once and then treated structurally everywhere else.
#[derive(Clone, Debug)]
pub struct RecordDescriptor {
    name: String,
    fields: Vec<(Symbol, Kind)>,
    /// `true` for records synthesized from tuples (`_0`, `_1`, ...) or from
    /// `Option<T>` (`HasValue`, `Value`), as opposed to user-named records.
    is_synthetic: bool,
}

impl RecordDescriptor {
    /// The record's declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The record's fields, in declaration order.
    pub fn fields(&self) -> &[(Symbol, Kind)] {
        &self.fields
    }

    /// `true` if this descriptor was synthesized (tuple or `Option`) rather
    /// than declared by the user.
    pub fn is_synthetic(&self) -> bool {
        self.is_synthetic
    }
}

/// The type-descriptor registry: caches reflected records and validates
/// that a [`Kind`] tree stays within the closed universe's invariants.
#[derive(Default)]
pub struct Registry {
    interner: symlogic_base::Interner,
    records: Vec<RecordDescriptor>,
    by_signature: FxHashMap<(String, Vec<(Symbol, Kind)>), RecordId>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            interner: symlogic_base::Interner::new(),
            records: Vec::new(),
            by_signature: FxHashMap::default(),
        }
    }

    /// Interns a field or record name.
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Resolves a previously interned name.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol)
    }

    /// Registers a named record with the given fields, reflecting it once.
    /// A second registration with the same name and field layout returns the
    /// existing [`RecordId`] rather than creating a duplicate.
    pub fn register_record(
        &mut self,
        name: &str,
        fields: Vec<(&str, Kind)>,
    ) -> Result<RecordId> {
        let fields: Vec<(Symbol, Kind)> = fields
            .into_iter()
            .map(|(field_name, kind)| (self.interner.intern(field_name), kind))
            .collect();
        for (_, kind) in &fields {
            self.validate(kind)?;
        }
        self.intern_descriptor(name.to_string(), fields, false)
    }

    /// Synthesizes (or reuses) the tuple record `{_0: T0, _1: T1, ...}`.
    pub fn synthesize_tuple(&mut self, elements: Vec<Kind>) -> Result<RecordId> {
        let fields: Vec<(Symbol, Kind)> = elements
            .into_iter()
            .enumerate()
            .map(|(i, kind)| (self.interner.intern(&format!("_{i}")), kind))
            .collect();
        for (_, kind) in &fields {
            self.validate(kind)?;
        }
        self.intern_descriptor("Tuple".to_string(), fields, true)
    }

    /// Synthesizes (or reuses) the `Option<T>` record `{HasValue: Bool, Value: T}`.
    pub fn synthesize_option(&mut self, element: Kind) -> Result<RecordId> {
        self.validate(&element)?;
        let has_value = self.interner.intern("HasValue");
        let value = self.interner.intern("Value");
        let fields = vec![(has_value, Kind::Bool), (value, element)];
        self.intern_descriptor("Option".to_string(), fields, true)
    }

    fn intern_descriptor(
        &mut self,
        name: String,
        fields: Vec<(Symbol, Kind)>,
        is_synthetic: bool,
    ) -> Result<RecordId> {
        let signature = (name.clone(), fields.clone());
        if let Some(&id) = self.by_signature.get(&signature) {
            return Ok(id);
        }
        let id = RecordId(self.records.len() as u32);
        self.records.push(RecordDescriptor {
            name,
            fields,
            is_synthetic,
        });
        self.by_signature.insert(signature, id);
        Ok(id)
    }

    /// Looks up a reflected record's descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this registry.
    pub fn descriptor(&self, id: RecordId) -> &RecordDescriptor {
        &self.records[id.index()]
    }

    /// Looks up the kind of a named field on a reflected record.
    pub fn field_kind(&self, id: RecordId, field: Symbol) -> Option<&Kind> {
        self.descriptor(id)
            .fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| kind)
    }

    /// Validates that `kind` respects the closed universe's structural
    /// invariants: `FSeq<T>` must never appear as a `Map`/`Set` value, and
    /// a `ConstMap`'s key list must be non-empty.
    pub fn validate(&self, kind: &Kind) -> Result<()> {
        self.validate_inner(kind, false)
    }

    fn validate_inner(&self, kind: &Kind, inside_map_or_set_range: bool) -> Result<()> {
        match kind {
            Kind::FSeq(elem) => {
                if inside_map_or_set_range {
                    return Err(Error::unsupported_type(
                        "FSeq<T> nested inside a Map or Set range",
                    ));
                }
                self.validate_inner(elem, false)
            }
            Kind::Option(elem) | Kind::Seq(elem) => self.validate_inner(elem, false),
            Kind::Map(key, value) => {
                self.validate_inner(key, false)?;
                self.validate_inner(value, true)
            }
            Kind::Set(elem) => self.validate_inner(elem, true),
            Kind::ConstMap(value, keys) => {
                if keys.is_empty() {
                    return Err(Error::unsupported_type("ConstMap with no statically enumerated keys"));
                }
                self.validate_inner(value, false)
            }
            Kind::Record(id) => {
                for (_, field_kind) in self.descriptor(*id).fields() {
                    self.validate_inner(field_kind, inside_map_or_set_range)?;
                }
                Ok(())
            }
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
            | Kind::Str => Ok(()),
        }
    }
}

/// One method per element kind and per structural constructor, as specified
/// for the type-descriptor registry's traversal contract.
pub trait KindVisitor<R> {
    /// Visits `Bool`.
    fn visit_bool(&mut self) -> R;
    /// Visits a fixed-width or arbitrary-width integral kind.
    fn visit_integral(&mut self, kind: &Kind) -> R;
    /// Visits `BigInt`.
    fn visit_bigint(&mut self) -> R;
    /// Visits `Real`.
    fn visit_real(&mut self) -> R;
    /// Visits `Char`.
    fn visit_char(&mut self) -> R;
    /// Visits `Str`.
    fn visit_str(&mut self) -> R;
    /// Visits `Option<T>`.
    fn visit_option(&mut self, element: &Kind) -> R;
    /// Visits a synthesized tuple record.
    fn visit_tuple(&mut self, id: RecordId) -> R;
    /// Visits a user-declared algebraic record ("object").
    fn visit_object(&mut self, id: RecordId) -> R;
    /// Visits `FSeq<T>`.
    fn visit_fseq(&mut self, element: &Kind) -> R;
    /// Visits `Seq<T>`.
    fn visit_seq(&mut self, element: &Kind) -> R;
    /// Visits `Map<K, V>`.
    fn visit_map(&mut self, key: &Kind, value: &Kind) -> R;
    /// Visits `Set<K>`.
    fn visit_set(&mut self, element: &Kind) -> R;
    /// Visits `ConstMap<K, V>`.
    fn visit_const_map(&mut self, value: &Kind, keys: &[String]) -> R;
}

/// Dispatches `kind` to the matching [`KindVisitor`] method, consulting
/// `registry` to distinguish a tuple record from a user-declared one.
pub fn visit<R>(registry: &Registry, kind: &Kind, visitor: &mut impl KindVisitor<R>) -> R {
    match kind {
        Kind::Bool => visitor.visit_bool(),
        Kind::I8
        | Kind::I16
        | Kind::I32
        | Kind::I64
        | Kind::U8
        | Kind::U16
        | Kind::U32
        | Kind::U64
        | Kind::Bv(_) => visitor.visit_integral(kind),
        Kind::BigInt => visitor.visit_bigint(),
        Kind::Real => visitor.visit_real(),
        Kind::Char => visitor.visit_char(),
        Kind::Str => visitor.visit_str(),
        Kind::Option(elem) => visitor.visit_option(elem),
        Kind::Record(id) => {
            let descriptor = registry.descriptor(*id);
            if descriptor.is_synthetic() && descriptor.name() == "Tuple" {
                visitor.visit_tuple(*id)
            } else {
                visitor.visit_object(*id)
            }
        }
        Kind::FSeq(elem) => visitor.visit_fseq(elem),
        Kind::Seq(elem) => visitor.visit_seq(elem),
        Kind::Map(key, value) => visitor.visit_map(key, value),
        Kind::Set(elem) => visitor.visit_set(elem),
        Kind::ConstMap(value, keys) => visitor.visit_const_map(value, keys),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_same_record_twice_is_idempotent() {
        let mut registry = Registry::new();
        let a = registry
            .register_record("Point", vec![("x", Kind::I32), ("y", Kind::I32)])
            .unwrap();
        let b = registry
            .register_record("Point", vec![("x", Kind::I32), ("y", Kind::I32)])
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn registering_different_fields_yields_different_ids() {
        let mut registry = Registry::new();
        let a = registry.register_record("P", vec![("x", Kind::I32)]).unwrap();
        let b = registry.register_record("P", vec![("x", Kind::I64)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fseq_inside_map_value_is_rejected() {
        let registry = Registry::new();
        let bad = Kind::map(Kind::U8, Kind::fseq(Kind::U8));
        assert!(registry.validate(&bad).is_err());
    }

    #[test]
    fn fseq_inside_fseq_is_fine() {
        let registry = Registry::new();
        let ok = Kind::fseq(Kind::fseq(Kind::U8));
        assert!(registry.validate(&ok).is_ok());
    }

    #[test]
    fn const_map_requires_nonempty_keys() {
        let registry = Registry::new();
        let bad = Kind::const_map(Kind::U8, vec![]);
        assert!(registry.validate(&bad).is_err());
    }

    #[test]
    fn synthesize_tuple_is_cached_by_shape() {
        let mut registry = Registry::new();
        let a = registry.synthesize_tuple(vec![Kind::I32, Kind::Bool]).unwrap();
        let b = registry.synthesize_tuple(vec![Kind::I32, Kind::Bool]).unwrap();
        assert_eq!(a, b);
        assert!(registry.descriptor(a).is_synthetic());
    }

    #[test]
    fn field_kind_looks_up_by_symbol() {
        let mut registry = Registry::new();
        let id = registry.register_record("P", vec![("x", Kind::I32)]).unwrap();
        let x = registry.intern("x");
        assert_eq!(registry.field_kind(id, x), Some(&Kind::I32));
    }

    struct CountingVisitor {
        objects_seen: u32,
    }

    impl KindVisitor<()> for CountingVisitor {
        fn visit_bool(&mut self) {}
        fn visit_integral(&mut self, _: &Kind) {}
        fn visit_bigint(&mut self) {}
        fn visit_real(&mut self) {}
        fn visit_char(&mut self) {}
        fn visit_str(&mut self) {}
        fn visit_option(&mut self, _: &Kind) {}
        fn visit_tuple(&mut self, _: RecordId) {}
        fn visit_object(&mut self, _: RecordId) {
            self.objects_seen += 1;
        }
        fn visit_fseq(&mut self, _: &Kind) {}
        fn visit_seq(&mut self, _: &Kind) {}
        fn visit_map(&mut self, _: &Kind, _: &Kind) {}
        fn visit_set(&mut self, _: &Kind) {}
        fn visit_const_map(&mut self, _: &Kind, _: &[String]) {}
    }

    #[test]
    fn visit_dispatches_to_object_for_user_record() {
        let mut registry = Registry::new();
        let id = registry.register_record("P", vec![("x", Kind::I32)]).unwrap();
        let mut v = CountingVisitor { objects_seen: 0 };
        visit(&registry, &Kind::Record(id), &mut v);
        assert_eq!(v.objects_seen, 1);
    }
}
