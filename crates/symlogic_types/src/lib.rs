#![cfg_attr(docsrs, feature(doc_cfg))]

//! Closed universe of element kinds and record reflection.
//!
//! `symlogic_types` owns the type-descriptor registry: the set of element
//! kinds symlogic can reason about ([`kind::Kind`]), and a [`registry::Registry`]
//! that reflects user records once and caches them as ordered field maps.
//! Everything downstream — the expression DAG, the concrete interpreter,
//! the symbolic evaluator — treats records purely structurally through a
//! [`kind::RecordId`] handle rather than any native Rust type.

pub mod kind;
pub mod registry;

pub use kind::{Kind, RecordId};
pub use registry::{visit, KindVisitor, RecordDescriptor, Registry};
