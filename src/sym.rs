//! The fluent combinator surface (spec.md §6.1): a typed `Sym<T>` wrapper
//! around an [`ExprId`], with operator overloads and named methods mirroring
//! `symlogic_expr::Builder`'s smart constructors.
//!
//! Every `Sym<T>` combinator takes `&mut Builder` explicitly rather than
//! hiding a shared, reference-counted builder behind the wrapper — the same
//! discipline `Builder`'s own constructors already follow, so a
//! `Function` body reads as ordinary calls threaded through one `&mut
//! Builder` rather than interior-mutability magic.

use std::marker::PhantomData;

use symlogic_base::error::Result;
use symlogic_expr::{Builder, ExprId};
use symlogic_types::Kind;

/// A `Sym<T>`'s marker type: the static/dynamic bridge between a Rust type
/// parameter and the [`Kind`] it represents in the closed universe.
pub trait SymKind {
    fn kind() -> Kind;
}

/// Marker types for the scalar kinds the fluent surface covers directly.
/// Records, `Option`, `FSeq`, `Map`/`Set`, and `Seq` are built through
/// `Builder`'s own methods on the raw `ExprId`s inside a `Sym`, since their
/// shapes vary per instantiation (record layout, element kind) in a way a
/// fixed marker type can't express without per-use-site generated types.
pub mod kinds {
    use super::{Kind, SymKind};

    macro_rules! scalar_kind {
        ($name:ident, $kind:expr) => {
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name;
            impl SymKind for $name {
                fn kind() -> Kind {
                    $kind
                }
            }
        };
    }

    scalar_kind!(BoolK, Kind::Bool);
    scalar_kind!(I8K, Kind::I8);
    scalar_kind!(I16K, Kind::I16);
    scalar_kind!(I32K, Kind::I32);
    scalar_kind!(I64K, Kind::I64);
    scalar_kind!(U8K, Kind::U8);
    scalar_kind!(U16K, Kind::U16);
    scalar_kind!(U32K, Kind::U32);
    scalar_kind!(U64K, Kind::U64);
    scalar_kind!(BigIntK, Kind::BigInt);
    scalar_kind!(RealK, Kind::Real);
    scalar_kind!(CharK, Kind::Char);
    scalar_kind!(StrK, Kind::Str);
}

use kinds::{BigIntK, BoolK, CharK, I16K, I32K, I64K, I8K, RealK, StrK, U16K, U32K, U64K, U8K};

/// Marker for every fixed-width or arbitrary-precision numeric kind the
/// arithmetic/comparison combinators are generic over.
pub trait NumericKind: SymKind {}
impl NumericKind for I8K {}
impl NumericKind for I16K {}
impl NumericKind for I32K {}
impl NumericKind for I64K {}
impl NumericKind for U8K {}
impl NumericKind for U16K {}
impl NumericKind for U32K {}
impl NumericKind for U64K {}
impl NumericKind for BigIntK {}
impl NumericKind for RealK {}

/// A typed handle onto an [`ExprId`], tagged with the marker `T` names its
/// [`Kind`].
pub struct Sym<T> {
    id: ExprId,
    _marker: PhantomData<T>,
}

impl<T> Sym<T> {
    /// Wraps an already-built `ExprId` without checking its kind against
    /// `T` — used internally by combinators that already know the result
    /// kind from construction, and by [`crate::Function`] to hand
    /// argument expressions to a body closure.
    pub fn from_id(id: ExprId) -> Self {
        Sym { id, _marker: PhantomData }
    }

    pub fn id(self) -> ExprId {
        self.id
    }
}

impl<T> Clone for Sym<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Sym<T> {}

impl<T: SymKind> Sym<T> {
    /// A fresh `Arbitrary` hole of this kind, named for model readback.
    pub fn arbitrary(builder: &mut Builder, name: &str) -> Self {
        Sym::from_id(builder.arbitrary(T::kind(), Some(name)))
    }

    pub fn if_(builder: &mut Builder, cond: Sym<BoolK>, then_: Self, else_: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.if_(cond.id, then_.id, else_.id)?))
    }

    pub fn eq(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.eq(self.id, other.id)?))
    }
}

impl Sym<BoolK> {
    pub fn constant(builder: &mut Builder, value: bool) -> Self {
        Sym::from_id(builder.const_bool(value))
    }

    pub fn and(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.and(self.id, other.id)?))
    }

    pub fn or(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.or(self.id, other.id)?))
    }

    pub fn not(self, builder: &mut Builder) -> Result<Self> {
        Ok(Sym::from_id(builder.not(self.id)?))
    }

    pub fn iff(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.iff(self.id, other.id)?))
    }

    /// `self => other`, i.e. `!self || other`.
    pub fn implies(self, builder: &mut Builder, other: Self) -> Result<Self> {
        let not_self = self.not(builder)?;
        not_self.or(builder, other)
    }
}

impl<T: NumericKind> Sym<T> {
    pub fn add(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.add(self.id, other.id)?))
    }
    pub fn sub(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.sub(self.id, other.id)?))
    }
    pub fn mul(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.mul(self.id, other.id)?))
    }
    pub fn min(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.min(self.id, other.id)?))
    }
    pub fn max(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.max(self.id, other.id)?))
    }
    pub fn lt(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.lt(self.id, other.id)?))
    }
    pub fn leq(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.leq(self.id, other.id)?))
    }
    pub fn gt(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.gt(self.id, other.id)?))
    }
    pub fn geq(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.geq(self.id, other.id)?))
    }
}

macro_rules! fixed_width_numeric {
    ($name:ident, $kind:expr) => {
        impl Sym<$name> {
            pub fn constant(builder: &mut Builder, value: i128) -> Result<Self> {
                Ok(Sym::from_id(builder.const_fixed($kind, value)?))
            }
            pub fn bit_and(self, builder: &mut Builder, other: Self) -> Result<Self> {
                Ok(Sym::from_id(builder.bit_and(self.id, other.id)?))
            }
            pub fn bit_or(self, builder: &mut Builder, other: Self) -> Result<Self> {
                Ok(Sym::from_id(builder.bit_or(self.id, other.id)?))
            }
            pub fn bit_xor(self, builder: &mut Builder, other: Self) -> Result<Self> {
                Ok(Sym::from_id(builder.bit_xor(self.id, other.id)?))
            }
            pub fn bit_not(self, builder: &mut Builder) -> Result<Self> {
                Ok(Sym::from_id(builder.bit_not(self.id)?))
            }
        }
    };
}

fixed_width_numeric!(I8K, Kind::I8);
fixed_width_numeric!(I16K, Kind::I16);
fixed_width_numeric!(I32K, Kind::I32);
fixed_width_numeric!(I64K, Kind::I64);
fixed_width_numeric!(U8K, Kind::U8);
fixed_width_numeric!(U16K, Kind::U16);
fixed_width_numeric!(U32K, Kind::U32);
fixed_width_numeric!(U64K, Kind::U64);

impl Sym<CharK> {
    pub fn constant(builder: &mut Builder, value: char) -> Self {
        Sym::from_id(builder.const_char(value))
    }
    pub fn lt(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.lt(self.id, other.id)?))
    }
    pub fn leq(self, builder: &mut Builder, other: Self) -> Result<Sym<BoolK>> {
        Ok(Sym::from_id(builder.leq(self.id, other.id)?))
    }
}

impl Sym<StrK> {
    pub fn constant(builder: &mut Builder, value: impl Into<String>) -> Self {
        Sym::from_id(builder.const_str(value))
    }
    pub fn length(self, builder: &mut Builder) -> Sym<BigIntK> {
        Sym::from_id(builder.seq_length(self.id))
    }
    pub fn concat(self, builder: &mut Builder, other: Self) -> Result<Self> {
        Ok(Sym::from_id(builder.seq_concat(self.id, other.id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_combinators_build_the_expected_shape() {
        let mut b = Builder::new();
        let x = Sym::<BoolK>::arbitrary(&mut b, "x");
        let y = Sym::<BoolK>::constant(&mut b, true);
        let formula = x.and(&mut b, y).unwrap();
        assert_eq!(b.kind_of(formula.id()), &Kind::Bool);
    }

    #[test]
    fn numeric_comparison_yields_a_bool_sym() {
        let mut b = Builder::new();
        let x = Sym::<U8K>::arbitrary(&mut b, "x");
        let ten = Sym::<U8K>::constant(&mut b, 10).unwrap();
        let cmp = x.lt(&mut b, ten).unwrap();
        assert_eq!(b.kind_of(cmp.id()), &Kind::Bool);
    }

    #[test]
    fn implies_desugars_to_not_or() {
        let mut b = Builder::new();
        let x = Sym::<BoolK>::arbitrary(&mut b, "x");
        let y = Sym::<BoolK>::arbitrary(&mut b, "y");
        let implication = x.implies(&mut b, y).unwrap();
        assert_eq!(b.kind_of(implication.id()), &Kind::Bool);
    }
}
