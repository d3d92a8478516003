//! Symbolic IEEE-754 floating-point encoder over bit-vector back-ends.
//!
//! This crate is the bit-blasting kernel of a floating-point decision
//! procedure: every IEEE-754 operation is expressed purely through
//! bit-vector primitives, so the same code either *evaluates* (over the
//! [`concrete::Concrete`] back-end, where bit vectors are literal
//! integers) or *encodes* (over the [`symbolic::SymBackend`] back-end,
//! where bit vectors are nodes in an expression dag handed to a SAT-backed
//! solver). The two back-ends agree bit-for-bit on every input.
//!
//! The layers, leaves first:
//!
//! - [`backend`]: the trait of primitives everything is written against
//! - [`bits`], [`ops`]: width-carrying bit-vector wrappers and helpers
//! - [`unpacked`], [`pack`]: the working representation and the packed
//!   encoding
//! - [`rounder`]: correct rounding from extended precision
//! - [`add`], [`mul`], [`div`], [`sqrt`], [`fma`], [`rem`], [`convert`],
//!   [`compare`], [`classify`], [`sign`]: one encoder per operation
//!
//! Encoders never branch on back-end data: every decision is an `ite` in
//! the produced circuit. Special values (NaN, infinities, signed zeros)
//! are computed alongside the arithmetic path and spliced in.
//!
//! # Example
//!
//! ```
//! use bitfp_core::bits::UBits;
//! use bitfp_core::concrete::Concrete;
//! use bitfp_core::format::{Format, RoundingMode};
//! use bitfp_core::pack::{pack, unpack};
//! use bitfp_core::Backend;
//!
//! let bd = &mut Concrete;
//! let fmt = Format::BINARY32;
//! let one = unpack(bd, fmt, &UBits::lit(bd, 32, 0x3f80_0000));
//! let rm = bd.rm_const(RoundingMode::NearestEven);
//! let two = bitfp_core::add::add(bd, fmt, &rm, &one, &one);
//! let bits = pack(bd, fmt, &two);
//! assert_eq!(u64::try_from(bits.raw()).unwrap(), 0x4000_0000);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod add;
pub mod backend;
pub mod bits;
pub mod classify;
pub mod compare;
pub mod concrete;
pub mod convert;
pub mod div;
pub mod fma;
pub mod format;
pub mod mul;
pub mod ops;
pub mod pack;
pub mod rem;
pub mod rounder;
pub mod sign;
pub mod sqrt;
pub mod symbolic;
pub mod unpacked;

pub use backend::{Backend, Likelihood};
pub use bits::{SBits, UBits};
pub use concrete::Concrete;
pub use format::{Format, RoundingMode};
pub use rounder::{RounderHints, SigRounded};
pub use symbolic::SymBackend;
pub use unpacked::Unpacked;
