#![cfg_attr(docsrs, feature(doc_cfg))]

//! The symbolic evaluator (spec §4.6, §4.7): lowers a closed symlogic
//! expression onto a solver [`Backend`] instead of a concrete
//! [`symlogic_interp::value::Value`], producing a [`SymbolicValue`] built
//! from the backend's own erased terms.
//!
//! [`eval::evaluate`] is the entry point: given a [`Backend`], a mutable
//! [`WitnessMap`] (the `Arbitrary`-hole → fresh-variable table), and a
//! [`SymbolicEnv`], it walks an [`symlogic_expr::ExprId`] the same way
//! `symlogic_interp::eval::evaluate` walks one concretely, except every
//! `Arbitrary` hole allocates a fresh backend variable on first visit rather
//! than falling back to a default, and `FSeq<T>` is represented as a
//! length-indexed [`value::GuardedListGroup`] instead of a flat `Vec`.
//!
//! ```ignore
//! let mut witnesses = WitnessMap::default();
//! let env = SymbolicEnv::new();
//! let value = eval::evaluate(&store, &mut registry, &mut backend, &mut witnesses, expr, &env)?;
//! ```

pub mod backend;
pub mod env;
pub mod eval;
pub mod value;

pub use backend::Backend;
pub use env::SymbolicEnv;
pub use eval::evaluate;
pub use value::{SymbolicValue, WitnessMap};
