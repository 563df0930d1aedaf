#![cfg_attr(docsrs, feature(doc_cfg))]

//! The concrete interpreter: evaluates a built expression to a [`Value`]
//! given argument bindings and an optional assignment for `Arbitrary` holes.
//!
//! Narrowed from `logicaffeine_compile::interpreter`'s tree-walking
//! `RuntimeValue` evaluator to pure, synchronous evaluation over the closed
//! type universe — no filesystem or async surface survives the narrowing.
//!
//! # Example
//!
//! ```
//! use symlogic_expr::Builder;
//! use symlogic_interp::{evaluate, Env, Value};
//! use symlogic_types::Kind;
//!
//! let mut b = Builder::new();
//! let x = b.arbitrary(Kind::U8, Some("x"));
//! let six = b.const_fixed(Kind::U8, 6).unwrap();
//! let sum = b.add(x, six).unwrap();
//!
//! // `x` is unassigned, so it falls back to its default value (0).
//! let value = evaluate(&b.store, &mut b.registry, sum, &Env::new()).unwrap();
//! assert_eq!(value, Value::Bv { width: 8, signed: false, bits: 6 });
//! ```

pub mod env;
pub mod eval;
pub mod regex_match;
pub mod value;

pub use env::Env;
pub use eval::evaluate;
pub use value::{default_concrete_value, Value};
