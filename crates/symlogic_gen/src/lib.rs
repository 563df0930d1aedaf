#![cfg_attr(docsrs, feature(doc_cfg))]

//! The depth-bounded input generator (spec §4.5): fills a [`symlogic_types::Kind`]
//! with fresh `Arbitrary` holes, structurally composing records and options
//! and unrolling `FSeq<T>` to a fixed depth via repeated `AddFront`.
//!
//! # Example
//!
//! ```
//! use symlogic_expr::Builder;
//! use symlogic_gen::{generate, GenConfig};
//! use symlogic_types::Kind;
//!
//! let mut b = Builder::new();
//! let config = GenConfig::new("input").with_depth(2).with_check_smaller_depths(true);
//! let list = generate(&mut b, &Kind::fseq(Kind::U8), &config).unwrap();
//! assert_eq!(b.kind_of(list), &Kind::fseq(Kind::U8));
//! ```

pub mod config;
pub mod generate;

pub use config::GenConfig;
pub use generate::generate;
