#![cfg_attr(docsrs, feature(doc_cfg))]

//! Symbolic reasoning over small, typed, first-order programs: build
//! expressions with the fluent [`Sym`] surface, then `evaluate`, `compile`,
//! or `find`/`assert`/`maximize`/`minimize` over them with a [`Function`].
//!
//! ```
//! use symlogic::{Function, SolveConfig};
//! use symlogic_types::Kind;
//!
//! // find x: U8 such that x < 10
//! let mut f = Function::new(vec![Kind::U8], Kind::Bool, |b, args| {
//!     let ten = b.const_fixed(Kind::U8, 10)?;
//!     b.lt(args[0], ten)
//! });
//! let model = f.find(&SolveConfig::default()).unwrap();
//! assert!(model.is_some());
//! ```

pub mod config;
pub mod function;
pub mod sym;

pub use config::{BackendKind, SolveConfig};
pub use function::Function;
pub use sym::{kinds, NumericKind, Sym, SymKind};

pub use symlogic_base::error::{Error, ErrorKind, Result};
pub use symlogic_expr::{Builder, ExprId};
pub use symlogic_interp::Value;
pub use symlogic_types::Kind;
