#![cfg_attr(docsrs, feature(doc_cfg))]

//! The expression DAG: hash-consed, immutable nodes over the closed type
//! universe in `symlogic_types`.
//!
//! # Architecture
//!
//! - [`node::ExprKind`] — the node set: constants, variables, and one
//!   constructor per combinator operation (spec §3.2).
//! - [`store::Store`]/[`store::ExprId`] — the hash-consing table; identical
//!   nodes collapse to the same id, except `Arbitrary`, which never interns.
//! - [`builder::Builder`] — the smart constructors every other crate in the
//!   workspace calls to build expressions; applies bounded local
//!   simplification and raises `TypeMismatch` at construction.
//!
//! # Example
//!
//! ```
//! use symlogic_expr::Builder;
//! use symlogic_types::Kind;
//!
//! let mut b = Builder::new();
//! let x = b.arbitrary(Kind::U8, Some("x"));
//! let one = b.const_fixed(Kind::U8, 1).unwrap();
//! let sum = b.add(x, one).unwrap();
//! assert_eq!(b.kind_of(sum), &Kind::U8);
//! ```

pub mod builder;
pub mod node;
pub mod store;

pub use builder::Builder;
pub use node::{CombineOp, ContainsKind, ExprKind, RegexExpr, Rational};
pub use store::{ExprId, Store};
