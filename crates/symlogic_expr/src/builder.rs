//! Smart constructors: the only way to build an [`ExprId`].
//!
//! Every constructor hash-conses through [`Store::intern`] (except
//! `arbitrary`, which never interns) and applies the bounded, sound
//! peephole simplifications spec §4.2 asks for — `And(true, x) -> x`,
//! `If(true, a, _) -> a`, and their kin. A constructor that receives
//! operands of incompatible result kinds fails with
//! `symlogic_base::error::ErrorKind::TypeMismatch` rather than panicking:
//! per spec §4.2, construction is the one place type errors are allowed to
//! surface.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use symlogic_base::error::{Error, Result};
use symlogic_base::Symbol;
use symlogic_types::{Kind, RecordId, Registry};

use crate::node::{CombineOp, ContainsKind, ExprKind, RegexExpr, Rational};
use crate::store::{ExprId, Store};

/// Owns the expression store and the type registry together, since every
/// constructor needs both: the store to intern nodes, the registry to
/// reflect record layouts and validate kinds.
pub struct Builder {
    /// The hash-consing table backing every constructor here.
    pub store: Store,
    /// The type-descriptor registry backing record reflection.
    pub registry: Registry,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Builder {
            store: Store::new(),
            registry: Registry::new(),
        }
    }

    /// The result kind of a previously built expression.
    pub fn kind_of(&self, id: ExprId) -> &Kind {
        self.store.result_kind(id)
    }

    fn same_kind(&self, a: ExprId, b: ExprId) -> Result<Kind> {
        let ka = self.store.result_kind(a).clone();
        let kb = self.store.result_kind(b);
        if &ka == kb {
            Ok(ka)
        } else {
            Err(Error::type_mismatch(&ka, kb))
        }
    }

    fn expect_bool(&self, id: ExprId) -> Result<()> {
        if self.store.result_kind(id) == &Kind::Bool {
            Ok(())
        } else {
            Err(Error::type_mismatch(Kind::Bool, self.store.result_kind(id)))
        }
    }

    fn expect_integral(&self, id: ExprId) -> Result<Kind> {
        let kind = self.store.result_kind(id).clone();
        if kind.is_integral() || kind == Kind::Real {
            Ok(kind)
        } else {
            Err(Error::type_mismatch("a numeric kind", &kind))
        }
    }

    fn const_bool_value(&self, id: ExprId) -> Option<bool> {
        match self.store.kind(id) {
            ExprKind::ConstBool(b) => Some(*b),
            _ => None,
        }
    }

    // ---- constants ----------------------------------------------------

    /// Builds a boolean literal.
    pub fn const_bool(&mut self, value: bool) -> ExprId {
        self.store.intern(ExprKind::ConstBool(value), Kind::Bool)
    }

    /// Builds a fixed-width integer literal for one of the eight named
    /// widths (`I8`..`U64`).
    pub fn const_fixed(&mut self, kind: Kind, value: i128) -> Result<ExprId> {
        let width = kind
            .bit_width()
            .ok_or_else(|| Error::type_mismatch("a fixed-width integer kind", &kind))?;
        let signed = !kind.is_unsigned();
        let mask: u128 = if width == 128 { u128::MAX } else { (1u128 << width) - 1 };
        let bits = (value as u128 & mask) as u64;
        Ok(self.store.intern(ExprKind::ConstBv { width, signed, bits }, kind))
    }

    /// Builds an arbitrary-width bitvector literal.
    pub fn const_bv(&mut self, width: u32, signed: bool, bits: u64) -> ExprId {
        self.store.intern(
            ExprKind::ConstBv { width, signed, bits },
            Kind::Bv(width),
        )
    }

    /// Builds an arbitrary-precision integer literal.
    pub fn const_bigint(&mut self, value: BigInt) -> ExprId {
        self.store.intern(ExprKind::ConstBigInt(value), Kind::BigInt)
    }

    /// Builds a rational literal.
    pub fn const_real(&mut self, value: Rational) -> ExprId {
        self.store.intern(ExprKind::ConstReal(value), Kind::Real)
    }

    /// Builds a character literal.
    pub fn const_char(&mut self, value: char) -> ExprId {
        self.store.intern(ExprKind::ConstChar(value), Kind::Char)
    }

    /// Builds a string literal.
    pub fn const_str(&mut self, value: impl Into<String>) -> ExprId {
        self.store.intern(ExprKind::ConstStr(value.into()), Kind::Str)
    }

    /// Builds a fresh symbolic hole of the given kind. Per spec §3.3/§9,
    /// this never hash-conses: two calls with identical arguments still
    /// produce distinct nodes.
    pub fn arbitrary(&mut self, kind: Kind, name: Option<&str>) -> ExprId {
        let id = self.store.next_arbitrary_id();
        let name = name.map(|n| self.registry.intern(n));
        self.store
            .fresh(ExprKind::Arbitrary { id, kind: kind.clone(), name }, kind)
    }

    /// References a lambda/cons-function parameter by its already-assigned
    /// argument id.
    pub fn argument(&mut self, id: u64, kind: Kind) -> ExprId {
        self.store.intern(ExprKind::Argument { id, kind: kind.clone() }, kind)
    }

    /// Allocates a fresh argument id, without binding it to an expression.
    /// Used by `FSeq.Case` to introduce the head/tail parameters.
    pub fn fresh_argument_id(&mut self) -> u64 {
        self.store.next_argument_id()
    }

    // ---- logic ----------------------------------------------------------

    /// Conjunction, with `And(true, x) -> x` and short-circuit-to-`false`.
    pub fn and(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.expect_bool(a)?;
        self.expect_bool(b)?;
        match (self.const_bool_value(a), self.const_bool_value(b)) {
            (Some(true), _) => Ok(b),
            (_, Some(true)) => Ok(a),
            (Some(false), _) | (_, Some(false)) => Ok(self.const_bool(false)),
            _ => Ok(self.store.intern(ExprKind::And(vec![a, b]), Kind::Bool)),
        }
    }

    /// Disjunction, with `Or(false, x) -> x` and short-circuit-to-`true`.
    pub fn or(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.expect_bool(a)?;
        self.expect_bool(b)?;
        match (self.const_bool_value(a), self.const_bool_value(b)) {
            (Some(false), _) => Ok(b),
            (_, Some(false)) => Ok(a),
            (Some(true), _) | (_, Some(true)) => Ok(self.const_bool(true)),
            _ => Ok(self.store.intern(ExprKind::Or(vec![a, b]), Kind::Bool)),
        }
    }

    /// Negation, with double-negation elimination and constant folding.
    pub fn not(&mut self, a: ExprId) -> Result<ExprId> {
        self.expect_bool(a)?;
        if let Some(b) = self.const_bool_value(a) {
            return Ok(self.const_bool(!b));
        }
        if let ExprKind::Not(inner) = self.store.kind(a) {
            return Ok(*inner);
        }
        Ok(self.store.intern(ExprKind::Not(a), Kind::Bool))
    }

    /// Boolean biconditional.
    pub fn iff(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.expect_bool(a)?;
        self.expect_bool(b)?;
        if a == b {
            return Ok(self.const_bool(true));
        }
        Ok(self.store.intern(ExprKind::Iff(a, b), Kind::Bool))
    }

    /// Conditional expression. `If(true, a, _) -> a`, `If(false, _, b) -> b`,
    /// and `If(_, a, a) -> a` (both branches are always well-typed and
    /// identical, so the guard is irrelevant).
    pub fn if_(&mut self, cond: ExprId, then_: ExprId, else_: ExprId) -> Result<ExprId> {
        self.expect_bool(cond)?;
        let result = self.same_kind(then_, else_)?;
        if let Some(b) = self.const_bool_value(cond) {
            return Ok(if b { then_ } else { else_ });
        }
        if then_ == else_ {
            return Ok(then_);
        }
        Ok(self.store.intern(ExprKind::If { cond, then_, else_ }, result))
    }

    // ---- arithmetic -------------------------------------------------------

    /// Numeric addition, constant-folded for fixed-width operands (wrapping).
    pub fn add(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        self.expect_integral(a)?;
        if let (ExprKind::ConstBv { width, signed, bits: x }, ExprKind::ConstBv { bits: y, .. }) =
            (self.store.kind(a).clone(), self.store.kind(b).clone())
        {
            let sum = x.wrapping_add(y) & mask_for(width);
            return Ok(self.store.intern(
                ExprKind::ConstBv { width, signed, bits: sum },
                kind,
            ));
        }
        Ok(self.store.intern(ExprKind::Add(a, b), kind))
    }

    /// Numeric subtraction, constant-folded for fixed-width operands (wrapping).
    pub fn sub(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        self.expect_integral(a)?;
        if let (ExprKind::ConstBv { width, signed, bits: x }, ExprKind::ConstBv { bits: y, .. }) =
            (self.store.kind(a).clone(), self.store.kind(b).clone())
        {
            let diff = x.wrapping_sub(y) & mask_for(width);
            return Ok(self.store.intern(
                ExprKind::ConstBv { width, signed, bits: diff },
                kind,
            ));
        }
        Ok(self.store.intern(ExprKind::Sub(a, b), kind))
    }

    /// Numeric multiplication, constant-folded for fixed-width operands
    /// (wrapping).
    pub fn mul(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        self.expect_integral(a)?;
        if let (ExprKind::ConstBv { width, signed, bits: x }, ExprKind::ConstBv { bits: y, .. }) =
            (self.store.kind(a).clone(), self.store.kind(b).clone())
        {
            let prod = x.wrapping_mul(y) & mask_for(width);
            return Ok(self.store.intern(
                ExprKind::ConstBv { width, signed, bits: prod },
                kind,
            ));
        }
        Ok(self.store.intern(ExprKind::Mul(a, b), kind))
    }

    // ---- bitwise ------------------------------------------------------------

    /// Bitwise AND on a fixed-width kind.
    pub fn bit_and(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::BitAnd(a, b), kind))
    }

    /// Bitwise OR on a fixed-width kind.
    pub fn bit_or(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::BitOr(a, b), kind))
    }

    /// Bitwise XOR on a fixed-width kind.
    pub fn bit_xor(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::BitXor(a, b), kind))
    }

    /// Bitwise complement on a fixed-width kind.
    pub fn bit_not(&mut self, a: ExprId) -> Result<ExprId> {
        let kind = self.expect_integral(a)?;
        Ok(self.store.intern(ExprKind::BitNot(a), kind))
    }

    /// Numeric maximum.
    pub fn max(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::Max(a, b), kind))
    }

    /// Numeric minimum.
    pub fn min(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::Min(a, b), kind))
    }

    // ---- comparisons --------------------------------------------------------

    /// Structural/value equality, foldable when both sides are the same node.
    pub fn eq(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.same_kind(a, b)?;
        if a == b {
            return Ok(self.const_bool(true));
        }
        Ok(self.store.intern(ExprKind::Eq(a, b), Kind::Bool))
    }

    /// Strictly-less-than.
    pub fn lt(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::Lt(a, b), Kind::Bool))
    }

    /// Less-than-or-equal.
    pub fn leq(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::Leq(a, b), Kind::Bool))
    }

    /// Strictly-greater-than.
    pub fn gt(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::Gt(a, b), Kind::Bool))
    }

    /// Greater-than-or-equal.
    pub fn geq(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::Geq(a, b), Kind::Bool))
    }

    /// Casts a fixed-width integer expression to another fixed-width kind.
    pub fn cast(&mut self, expr: ExprId, target: Kind) -> Result<ExprId> {
        let source = self.store.result_kind(expr).clone();
        if source.bit_width().is_none() || target.bit_width().is_none() {
            return Err(Error::type_mismatch("a fixed-width integer kind", &source));
        }
        Ok(self.store.intern(ExprKind::Cast { expr, target: target.clone() }, target))
    }

    // ---- records --------------------------------------------------------------

    /// Builds a record value from a complete, correctly-typed field
    /// assignment (in declaration order).
    pub fn create_object(&mut self, record: RecordId, fields: Vec<(&str, ExprId)>) -> Result<ExprId> {
        let resolved = self.named_fields(record, fields)?;
        Ok(self
            .store
            .intern(ExprKind::CreateObject { record, fields: resolved }, Kind::Record(record)))
    }

    /// Resolves the `RecordId` backing a value of kind `kind`: direct for
    /// `Kind::Record`, synthesized on demand for `Kind::Option` (whose
    /// declared kind names the element type, not the record that stores
    /// it — see `option_none`/`option_some`).
    fn record_of(&mut self, kind: &Kind) -> Result<RecordId> {
        match kind {
            Kind::Record(id) => Ok(*id),
            Kind::Option(elem) => self.registry.synthesize_option((**elem).clone()),
            other => Err(Error::type_mismatch("a record or Option kind", other)),
        }
    }

    /// Projects a named field out of a record expression.
    pub fn get_field(&mut self, object: ExprId, field: &str) -> Result<ExprId> {
        let object_kind = self.store.result_kind(object).clone();
        let record = self.record_of(&object_kind)?;
        let symbol = self.registry.intern(field);
        let field_kind = self
            .registry
            .field_kind(record, symbol)
            .cloned()
            .ok_or_else(|| Error::type_mismatch(format!("a field named {field}"), "no such field"))?;
        if let ExprKind::CreateObject { fields, .. } = self.store.kind(object) {
            if let Some((_, value)) = fields.iter().find(|(name, _)| *name == symbol) {
                return Ok(*value);
            }
        }
        Ok(self
            .store
            .intern(ExprKind::GetField { object, field: symbol }, field_kind))
    }

    /// Produces a copy of a record expression with one field replaced.
    pub fn with_field(&mut self, object: ExprId, field: &str, value: ExprId) -> Result<ExprId> {
        let object_kind = self.store.result_kind(object).clone();
        let record = self.record_of(&object_kind)?;
        let symbol = self.registry.intern(field);
        let field_kind = self
            .registry
            .field_kind(record, symbol)
            .cloned()
            .ok_or_else(|| Error::type_mismatch(format!("a field named {field}"), "no such field"))?;
        if self.store.result_kind(value) != &field_kind {
            return Err(Error::type_mismatch(&field_kind, self.store.result_kind(value)));
        }
        Ok(self.store.intern(
            ExprKind::WithField { object, field: symbol, value },
            object_kind,
        ))
    }

    // ---- FSeq ----------------------------------------------------------------

    /// The empty `FSeq<elem>`.
    pub fn fseq_empty(&mut self, elem: Kind) -> ExprId {
        self.store
            .intern(ExprKind::FSeqEmpty { elem: elem.clone() }, Kind::fseq(elem))
    }

    /// Prepends `head: Option<elem>` onto `tail: FSeq<elem>`.
    pub fn fseq_add_front(&mut self, head: ExprId, tail: ExprId) -> Result<ExprId> {
        let elem = match self.store.result_kind(tail).clone() {
            Kind::FSeq(elem) => *elem,
            other => return Err(Error::type_mismatch("an FSeq kind", &other)),
        };
        if self.store.result_kind(head) != &Kind::option(elem.clone()) {
            return Err(Error::type_mismatch(Kind::option(elem.clone()), self.store.result_kind(head)));
        }
        Ok(self
            .store
            .intern(ExprKind::FSeqAddFront { head, tail }, Kind::fseq(elem)))
    }

    /// Case-splits `list`, evaluating `empty_expr` when empty and
    /// `cons_body` (with `head_arg`/`tail_arg` bound) otherwise.
    pub fn fseq_case(
        &mut self,
        list: ExprId,
        empty_expr: ExprId,
        head_arg: u64,
        tail_arg: u64,
        cons_body: ExprId,
    ) -> Result<ExprId> {
        if !matches!(self.store.result_kind(list), Kind::FSeq(_)) {
            return Err(Error::type_mismatch("an FSeq kind", self.store.result_kind(list)));
        }
        let result = self.same_kind(empty_expr, cons_body)?;
        Ok(self.store.intern(
            ExprKind::FSeqCase { list, empty_expr, head_arg, tail_arg, cons_body },
            result,
        ))
    }

    // ---- Seq -------------------------------------------------------------------

    /// The empty `Seq<elem>`.
    pub fn seq_empty(&mut self, elem: Kind) -> ExprId {
        self.store
            .intern(ExprKind::SeqEmpty { elem: elem.clone() }, Kind::seq(elem))
    }

    /// A single-element `Seq`.
    pub fn seq_unit(&mut self, value: ExprId) -> ExprId {
        let elem = self.store.result_kind(value).clone();
        self.store.intern(ExprKind::SeqUnit(value), Kind::seq(elem))
    }

    /// Concatenates two sequences of the same element kind.
    pub fn seq_concat(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(a, b)?;
        Ok(self.store.intern(ExprKind::SeqConcat(a, b), kind))
    }

    /// The length of a sequence, as a `BigInt` (non-negative by construction).
    pub fn seq_length(&mut self, seq: ExprId) -> ExprId {
        self.store.intern(ExprKind::SeqLength(seq), Kind::BigInt)
    }

    /// Bounds-checked element access, returning `Option<elem>`.
    pub fn seq_at(&mut self, seq: ExprId, index: ExprId) -> Result<ExprId> {
        let elem = match self.store.result_kind(seq).clone() {
            Kind::Seq(elem) => *elem,
            other => return Err(Error::type_mismatch("a Seq kind", &other)),
        };
        Ok(self
            .store
            .intern(ExprKind::SeqAt(seq, index), Kind::option(elem)))
    }

    /// Unchecked element access, for use where bounds are already proven.
    pub fn seq_nth(&mut self, seq: ExprId, index: ExprId) -> Result<ExprId> {
        let elem = match self.store.result_kind(seq).clone() {
            Kind::Seq(elem) => *elem,
            other => return Err(Error::type_mismatch("a Seq kind", &other)),
        };
        Ok(self.store.intern(ExprKind::SeqNth(seq, index), elem))
    }

    /// Prefix/suffix/infix containment test.
    pub fn seq_contains(&mut self, haystack: ExprId, needle: ExprId, mode: ContainsKind) -> Result<ExprId> {
        self.same_kind(haystack, needle)?;
        Ok(self
            .store
            .intern(ExprKind::SeqContains { haystack, needle, mode }, Kind::Bool))
    }

    /// The index of the first occurrence of `needle`, or `-1` if absent.
    pub fn seq_index_of(&mut self, haystack: ExprId, needle: ExprId) -> Result<ExprId> {
        self.same_kind(haystack, needle)?;
        Ok(self
            .store
            .intern(ExprKind::SeqIndexOf { haystack, needle }, Kind::BigInt))
    }

    /// Slices `seq` by `(offset, length)`; out-of-range clamps to empty.
    pub fn seq_slice(&mut self, seq: ExprId, offset: ExprId, length: ExprId) -> Result<ExprId> {
        let kind = self.store.result_kind(seq).clone();
        if !matches!(kind, Kind::Seq(_)) {
            return Err(Error::type_mismatch("a Seq kind", &kind));
        }
        Ok(self
            .store
            .intern(ExprKind::SeqSlice { seq, offset, length }, kind))
    }

    /// Replaces the first occurrence of `pattern` with `replacement`.
    pub fn seq_replace_first(&mut self, seq: ExprId, pattern: ExprId, replacement: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(seq, pattern)?;
        self.same_kind(seq, replacement)?;
        Ok(self
            .store
            .intern(ExprKind::SeqReplaceFirst { seq, pattern, replacement }, kind))
    }

    /// Tests whether `seq: Seq<Char>` matches `regex`.
    pub fn seq_matches_regex(&mut self, seq: ExprId, regex: RegexExpr) -> Result<ExprId> {
        if self.store.result_kind(seq) != &Kind::seq(Kind::Char) {
            return Err(Error::type_mismatch(Kind::seq(Kind::Char), self.store.result_kind(seq)));
        }
        Ok(self
            .store
            .intern(ExprKind::SeqMatchesRegex { seq, regex }, Kind::Bool))
    }

    // ---- Map / Set --------------------------------------------------------------

    /// The empty `Map<key, value>` (every key absent).
    pub fn map_empty(&mut self, key: Kind, value: Kind) -> ExprId {
        self.store.intern(
            ExprKind::MapEmpty { key: key.clone(), value: value.clone() },
            Kind::map(key, value),
        )
    }

    /// `Set.Empty`, i.e. `Map<key, Unit>` realized with a boolean range.
    pub fn set_empty(&mut self, key: Kind) -> ExprId {
        self.store
            .intern(ExprKind::MapEmpty { key: key.clone(), value: Kind::Bool }, Kind::set(key))
    }

    /// The empty `ConstMap<value>` over statically-enumerated `keys`, with
    /// every key already present — a `ConstMap` has no "absent" state, so
    /// callers are expected to fill every key via [`Builder::const_map_set`]
    /// before using the result.
    pub fn const_map_empty(&mut self, value: Kind, keys: Vec<String>) -> ExprId {
        self.store.intern(
            ExprKind::MapEmpty { key: Kind::Str, value: value.clone() },
            Kind::const_map(value, keys),
        )
    }

    /// Associates `key` with `value`.
    pub fn map_set(&mut self, map: ExprId, key: ExprId, value: ExprId) -> Result<ExprId> {
        let kind = self.store.result_kind(map).clone();
        match &kind {
            Kind::Map(k, v) => {
                if self.store.result_kind(key) != k.as_ref() {
                    return Err(Error::type_mismatch(k.as_ref(), self.store.result_kind(key)));
                }
                if self.store.result_kind(value) != v.as_ref() {
                    return Err(Error::type_mismatch(v.as_ref(), self.store.result_kind(value)));
                }
            }
            other => return Err(Error::type_mismatch("a Map kind", other)),
        }
        Ok(self.store.intern(ExprKind::MapSet { map, key, value }, kind))
    }

    /// Removes any association for `key`.
    pub fn map_delete(&mut self, map: ExprId, key: ExprId) -> Result<ExprId> {
        let kind = self.store.result_kind(map).clone();
        Ok(self.store.intern(ExprKind::MapDelete { map, key }, kind))
    }

    /// Looks up `key`, returning `Option<value>`.
    pub fn map_get(&mut self, map: ExprId, key: ExprId) -> Result<ExprId> {
        let value = match self.store.result_kind(map).clone() {
            Kind::Map(_, v) => *v,
            other => return Err(Error::type_mismatch("a Map kind", &other)),
        };
        Ok(self
            .store
            .intern(ExprKind::MapGet { map, key }, Kind::option(value)))
    }

    /// Combines two maps of the same kind with a set-algebra operator.
    pub fn map_combine(&mut self, op: CombineOp, left: ExprId, right: ExprId) -> Result<ExprId> {
        let kind = self.same_kind(left, right)?;
        Ok(self.store.intern(ExprKind::MapCombine { op, left, right }, kind))
    }

    // ---- ConstMap -----------------------------------------------------------------

    /// Associates a statically-known key with a value in a `ConstMap`.
    pub fn const_map_set(&mut self, map: ExprId, key: &str, value: ExprId) -> Result<ExprId> {
        let kind = self.store.result_kind(map).clone();
        let (value_kind, keys) = match &kind {
            Kind::ConstMap(v, keys) => (v.as_ref().clone(), keys.clone()),
            other => return Err(Error::type_mismatch("a ConstMap kind", other)),
        };
        if !keys.iter().any(|k| k == key) {
            return Err(Error::type_mismatch(format!("one of {keys:?}"), key.to_string()));
        }
        if self.store.result_kind(value) != &value_kind {
            return Err(Error::type_mismatch(&value_kind, self.store.result_kind(value)));
        }
        let symbol = self.registry.intern(key);
        Ok(self
            .store
            .intern(ExprKind::ConstMapSet { map, key: symbol, value }, kind))
    }

    /// Looks up a statically-known key in a `ConstMap`.
    pub fn const_map_get(&mut self, map: ExprId, key: &str) -> Result<ExprId> {
        let value_kind = match self.store.result_kind(map).clone() {
            Kind::ConstMap(v, keys) => {
                if !keys.iter().any(|k| k == key) {
                    return Err(Error::type_mismatch(format!("one of {keys:?}"), key.to_string()));
                }
                *v
            }
            other => return Err(Error::type_mismatch("a ConstMap kind", &other)),
        };
        let symbol = self.registry.intern(key);
        Ok(self
            .store
            .intern(ExprKind::ConstMapGet { map, key: symbol }, value_kind))
    }

    // ---- Option / tuple sugar (spec §9 open question: both are records) ------------

    /// Builds `Option::none<elem>`. Tagged `Kind::Option(elem)` rather than
    /// `Kind::Record(id)`: every other constructor that produces or consumes
    /// an `Option` (`Seq.At`, `Map.Get`, `FSeq.AddFront`'s head) compares
    /// against `Kind::option(elem)`, so the two must agree on which tag
    /// names the type. The synthesized record is still what actually backs
    /// field storage; `get_field`/`with_field` resolve it on demand.
    pub fn option_none(&mut self, elem: Kind) -> Result<ExprId> {
        let has_value = self.const_bool(false);
        let value = self.default_value(&elem)?;
        self.option_of(has_value, value)
    }

    /// Builds `Option::some(value)`. See [`Builder::option_none`] for why
    /// this is tagged `Kind::Option(elem)` instead of `Kind::Record(id)`.
    pub fn option_some(&mut self, value: ExprId) -> Result<ExprId> {
        let has_value = self.const_bool(true);
        self.option_of(has_value, value)
    }

    /// Builds an `Option` whose presence flag is an arbitrary expression
    /// rather than a known constant — the primitive `option_none`/
    /// `option_some` build on, and the hook the depth-bounded input
    /// generator uses to compose a symbolic presence bit.
    pub fn option_of(&mut self, has_value: ExprId, value: ExprId) -> Result<ExprId> {
        self.expect_bool(has_value)?;
        let elem = self.store.result_kind(value).clone();
        let record = self.registry.synthesize_option(elem.clone())?;
        let fields = self.named_fields(record, vec![("HasValue", has_value), ("Value", value)])?;
        Ok(self
            .store
            .intern(ExprKind::CreateObject { record, fields }, Kind::option(elem)))
    }

    /// Resolves `(name, value)` pairs against a record's declared field
    /// order and symbols, without committing to any particular result kind
    /// for the built node (callers choose that themselves).
    fn named_fields(&mut self, record: RecordId, fields: Vec<(&str, ExprId)>) -> Result<Vec<(Symbol, ExprId)>> {
        let descriptor = self.registry.descriptor(record).clone();
        if descriptor.fields().len() != fields.len() {
            return Err(Error::type_mismatch(
                format!("{} fields", descriptor.fields().len()),
                format!("{} fields", fields.len()),
            ));
        }
        let mut resolved = Vec::with_capacity(fields.len());
        for (i, (name, value)) in fields.into_iter().enumerate() {
            let (expected_symbol, expected_kind) = &descriptor.fields()[i];
            let symbol = self.registry.intern(name);
            if symbol != *expected_symbol {
                return Err(Error::type_mismatch(
                    self.registry.resolve(*expected_symbol).to_string(),
                    name.to_string(),
                ));
            }
            if self.store.result_kind(value) != expected_kind {
                return Err(Error::type_mismatch(expected_kind, self.store.result_kind(value)));
            }
            resolved.push((symbol, value));
        }
        Ok(resolved)
    }

    /// Builds a tuple record `{_0, _1, ...}` from its elements.
    pub fn tuple(&mut self, elements: Vec<ExprId>) -> Result<ExprId> {
        let kinds = elements.iter().map(|e| self.store.result_kind(*e).clone()).collect();
        let record = self.registry.synthesize_tuple(kinds)?;
        let fields: Vec<(Symbol, ExprId)> = self
            .registry
            .descriptor(record)
            .fields()
            .iter()
            .map(|(symbol, _)| *symbol)
            .zip(elements)
            .collect();
        Ok(self.store.intern(ExprKind::CreateObject { record, fields }, Kind::Record(record)))
    }

    /// The recursively-defined default value of `kind` (spec §5 of
    /// SPEC_FULL): `false`/`0`/empty-string/empty-sequence/`None`/a
    /// zero-filled record.
    pub fn default_value(&mut self, kind: &Kind) -> Result<ExprId> {
        match kind {
            Kind::Bool => Ok(self.const_bool(false)),
            Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => {
                self.const_fixed(kind.clone(), 0)
            }
            Kind::Bv(width) => Ok(self.const_bv(*width, false, 0)),
            Kind::BigInt => Ok(self.const_bigint(BigInt::from(0))),
            Kind::Real => Ok(self.const_real(Rational::from_int(0))),
            Kind::Char => Ok(self.const_char('\0')),
            Kind::Str => Ok(self.const_str("")),
            Kind::Option(elem) => self.option_none((**elem).clone()),
            Kind::Record(id) => {
                let fields = self.registry.descriptor(*id).fields().to_vec();
                let mut built = Vec::with_capacity(fields.len());
                for (symbol, field_kind) in &fields {
                    let value = self.default_value(field_kind)?;
                    built.push((self.registry.resolve(*symbol).to_string(), value));
                }
                let named: Vec<(&str, ExprId)> = built.iter().map(|(n, v)| (n.as_str(), *v)).collect();
                self.create_object(*id, named)
            }
            Kind::FSeq(elem) => Ok(self.fseq_empty((**elem).clone())),
            Kind::Seq(elem) => Ok(self.seq_empty((**elem).clone())),
            Kind::Map(k, v) => Ok(self.map_empty((**k).clone(), (**v).clone())),
            Kind::Set(k) => Ok(self.set_empty((**k).clone())),
            Kind::ConstMap(value, keys) => {
                let mut map = self.const_map_empty((**value).clone(), keys.clone());
                for key in keys.clone() {
                    let default = self.default_value(value)?;
                    map = self.const_map_set(map, &key, default)?;
                }
                Ok(map)
            }
        }
    }

    /// Converts a signed 128-bit host value into the nearest fitting
    /// fixed-width kind's literal, used by the concrete-to-symbolic bridge.
    pub fn const_fixed_from_i64(&mut self, kind: Kind, value: i64) -> Result<ExprId> {
        self.const_fixed(kind, value as i128)
    }

    /// Reads a `ConstBv` literal back out as a plain `i64`, for callers
    /// that already know the node is a constant.
    pub fn as_i64_literal(&self, id: ExprId) -> Option<i64> {
        match self.store.kind(id) {
            ExprKind::ConstBv { bits, signed, width } => {
                if *signed {
                    Some(sign_extend(*bits, *width))
                } else {
                    bits.to_i64()
                }
            }
            _ => None,
        }
    }
}

fn mask_for(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn sign_extend(bits: u64, width: u32) -> i64 {
    if width >= 64 {
        return bits as i64;
    }
    let shift = 64 - width;
    ((bits << shift) as i64) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_true_simplifies_to_other_operand() {
        let mut b = Builder::new();
        let t = b.const_bool(true);
        let x = b.arbitrary(Kind::Bool, None);
        let result = b.and(t, x).unwrap();
        assert_eq!(result, x);
    }

    #[test]
    fn if_true_simplifies_to_then_branch() {
        let mut b = Builder::new();
        let t = b.const_bool(true);
        let a = b.const_fixed(Kind::U8, 1).unwrap();
        let c = b.const_fixed(Kind::U8, 2).unwrap();
        let result = b.if_(t, a, c).unwrap();
        assert_eq!(result, a);
    }

    #[test]
    fn arbitrary_never_hash_conses() {
        let mut b = Builder::new();
        let a = b.arbitrary(Kind::U8, Some("x"));
        let c = b.arbitrary(Kind::U8, Some("x"));
        assert_ne!(a, c);
    }

    #[test]
    fn hash_consing_deduplicates_equal_additions() {
        let mut b = Builder::new();
        let x = b.arbitrary(Kind::U8, None);
        let one = b.const_fixed(Kind::U8, 1).unwrap();
        let a = b.add(x, one).unwrap();
        let c = b.add(x, one).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn add_on_mismatched_kinds_is_type_mismatch() {
        let mut b = Builder::new();
        let x = b.const_fixed(Kind::U8, 1).unwrap();
        let y = b.const_fixed(Kind::I32, 1).unwrap();
        assert!(b.add(x, y).is_err());
    }

    #[test]
    fn u8_addition_wraps() {
        let mut b = Builder::new();
        let max = b.const_fixed(Kind::U8, 255).unwrap();
        let one = b.const_fixed(Kind::U8, 1).unwrap();
        let sum = b.add(max, one).unwrap();
        assert_eq!(b.as_i64_literal(sum), Some(0));
    }

    #[test]
    fn create_object_roundtrips_get_field() {
        let mut b = Builder::new();
        let record = b
            .registry
            .register_record("Point", vec![("x", Kind::I32), ("y", Kind::I32)])
            .unwrap();
        let x = b.const_fixed(Kind::I32, 3).unwrap();
        let y = b.const_fixed(Kind::I32, 4).unwrap();
        let p = b.create_object(record, vec![("x", x), ("y", y)]).unwrap();
        let got_x = b.get_field(p, "x").unwrap();
        assert_eq!(got_x, x);
    }

    #[test]
    fn fseq_empty_has_correct_kind() {
        let mut b = Builder::new();
        let empty = b.fseq_empty(Kind::U8);
        assert_eq!(b.kind_of(empty), &Kind::fseq(Kind::U8));
    }

    #[test]
    fn option_none_then_get_field_has_value_is_false() {
        let mut b = Builder::new();
        let none = b.option_none(Kind::U8).unwrap();
        let has_value = b.get_field(none, "HasValue").unwrap();
        assert_eq!(b.store.kind(has_value), &ExprKind::ConstBool(false));
    }

    #[test]
    fn default_value_of_map_is_well_typed() {
        let mut b = Builder::new();
        let default = b.default_value(&Kind::map(Kind::U8, Kind::Bool)).unwrap();
        assert_eq!(b.kind_of(default), &Kind::map(Kind::U8, Kind::Bool));
    }
}
