#![cfg_attr(docsrs, feature(doc_cfg))]

//! # symlogic-base
//!
//! Pure structural atoms shared by the rest of the symlogic workspace.
//!
//! This crate provides the foundational types every other crate builds on:
//!
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`error::Error`]/[`error::Result`] — the shared error hierarchy
//!
//! # Design principles
//!
//! This crate has no knowledge of expressions, types, or solvers. It
//! provides only generic, reusable infrastructure that higher-level crates
//! build upon.
//!
//! # Example
//!
//! ```
//! use symlogic_base::{Interner, Symbol};
//!
//! let mut interner = Interner::new();
//! let x: Symbol = interner.intern("x");
//! assert_eq!(interner.resolve(x), "x");
//! ```

pub mod error;
pub mod intern;

pub use error::{Error, Result};
pub use intern::{Interner, Symbol};
