//! Hash-consed bit-vector expression DAG for the bitfp encoder.
//!
//! This crate is the node manager the symbolic back-end of `bitfp-core`
//! builds into. It provides:
//!
//! - Arena-allocated terms with copyable [`TermId`] handles
//! - Hash-consing: structurally equal terms share one node
//! - Eager constant folding and if-then-else simplification
//! - An evaluator for closing terms under a variable assignment
//! - Exact bit-vector value semantics shared with the concrete evaluator
//! - An SMT-LIB 2 printer for inspecting encodings
//!
//! Propositions are width-1 bit vectors throughout ("prop-is-bv"): the
//! comparison operators return width-1 terms and `ite` conditions are
//! width-1 terms. This halves the node vocabulary and matches what the
//! downstream bit-vector solver consumes.
//!
//! # Examples
//!
//! ```
//! use bitfp_dag::TermDag;
//! use num_bigint::BigUint;
//!
//! let mut dag = TermDag::new();
//! let x = dag.mk_var(8, "x");
//! let one = dag.mk_const_u64(8, 1);
//! let inc = dag.mk_add(x, one);
//!
//! let mut env = rustc_hash::FxHashMap::default();
//! env.insert(x, BigUint::from(41u32));
//! assert_eq!(dag.eval(inc, &env).unwrap(), BigUint::from(42u32));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod arith;
mod dag;
mod eval;
mod print;

pub use dag::{Likelihood, Term, TermDag, TermId, TermKind};
pub use eval::EvalError;
