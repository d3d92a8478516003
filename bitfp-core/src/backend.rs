//! The back-end trait every encoder is parameterised over.

use std::fmt::Debug;

use num_bigint::BigUint;

use crate::format::RoundingMode;

pub use bitfp_dag::Likelihood;

/// Supplier of the bit-level primitives the kernel is written against.
///
/// A back-end provides a proposition type, a raw bit-vector type and a
/// rounding-mode type, plus constructors for every primitive operation.
/// Two implementations exist: [`crate::concrete::Concrete`] evaluates
/// eagerly over literal integers, and [`crate::symbolic::SymBackend`]
/// allocates nodes in an expression dag.
///
/// Bit-vector widths are known at construction time and carried by the
/// caller (see [`crate::bits`]); each method receives the operand width and
/// may assume the equal-width contracts stated there. The if-then-else
/// combinators live on the trait itself so that a back-end can simplify
/// them (the dag back-end folds constant conditions and merges nested
/// selections).
///
/// A back-end may represent propositions however it likes: the concrete
/// evaluator uses `bool`, the symbolic builder uses width-1 bit-vector
/// handles. The kernel only moves between the two views through
/// [`Backend::prop_to_bv`] and [`Backend::bv_to_prop`].
pub trait Backend {
    /// A single bit of truth.
    type Prop: Clone + Debug;
    /// A bit vector; the width travels with the caller, not the value.
    type Bv: Clone + Debug;
    /// A rounding mode.
    type Rm: Clone + Debug;

    /// Literal proposition.
    fn prop(&mut self, value: bool) -> Self::Prop;
    /// Logical negation.
    fn prop_not(&mut self, a: &Self::Prop) -> Self::Prop;
    /// Conjunction.
    fn prop_and(&mut self, a: &Self::Prop, b: &Self::Prop) -> Self::Prop;
    /// Disjunction.
    fn prop_or(&mut self, a: &Self::Prop, b: &Self::Prop) -> Self::Prop;
    /// Exclusive or.
    fn prop_xor(&mut self, a: &Self::Prop, b: &Self::Prop) -> Self::Prop;
    /// Equivalence.
    fn prop_iff(&mut self, a: &Self::Prop, b: &Self::Prop) -> Self::Prop;
    /// Select between two propositions.
    fn ite_prop(&mut self, cond: &Self::Prop, t: &Self::Prop, e: &Self::Prop) -> Self::Prop;

    /// Literal bit vector, reduced modulo `2^width`.
    fn bv_const(&mut self, width: u32, value: &BigUint) -> Self::Bv;
    /// Modular addition.
    fn bv_add(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    /// Modular subtraction.
    fn bv_sub(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    /// Modular multiplication.
    fn bv_mul(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    /// Two's-complement negation.
    fn bv_neg(&mut self, width: u32, a: &Self::Bv) -> Self::Bv;
    /// Bitwise complement.
    fn bv_not(&mut self, width: u32, a: &Self::Bv) -> Self::Bv;
    /// Bitwise and.
    fn bv_and(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    /// Bitwise or.
    fn bv_or(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    /// Bitwise xor.
    fn bv_xor(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Bv;
    /// Left shift; amounts of `width` or more give zero.
    fn bv_shl(&mut self, width: u32, a: &Self::Bv, amount: &Self::Bv) -> Self::Bv;
    /// Logical right shift; amounts of `width` or more give zero.
    fn bv_lshr(&mut self, width: u32, a: &Self::Bv, amount: &Self::Bv) -> Self::Bv;
    /// Arithmetic right shift; amounts of `width` or more give the sign fill.
    fn bv_ashr(&mut self, width: u32, a: &Self::Bv, amount: &Self::Bv) -> Self::Bv;
    /// Concatenation; `hi` occupies the upper bits.
    fn bv_concat(
        &mut self,
        hi_width: u32,
        lo_width: u32,
        hi: &Self::Bv,
        lo: &Self::Bv,
    ) -> Self::Bv;
    /// Extract bits `hi..=lo`, inclusive of both end points.
    fn bv_extract(&mut self, width: u32, hi: u32, lo: u32, a: &Self::Bv) -> Self::Bv;
    /// Zero extension by `by` bits.
    fn bv_zero_extend(&mut self, width: u32, by: u32, a: &Self::Bv) -> Self::Bv;
    /// Sign extension by `by` bits.
    fn bv_sign_extend(&mut self, width: u32, by: u32, a: &Self::Bv) -> Self::Bv;
    /// Equality.
    fn bv_eq(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Prop;
    /// Unsigned less-than.
    fn bv_ult(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Prop;
    /// Unsigned less-or-equal.
    fn bv_ule(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Prop;
    /// Signed less-than.
    fn bv_slt(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Prop;
    /// Signed less-or-equal.
    fn bv_sle(&mut self, width: u32, a: &Self::Bv, b: &Self::Bv) -> Self::Prop;
    /// Select between two bit vectors of the same width.
    fn ite_bv(&mut self, width: u32, cond: &Self::Prop, t: &Self::Bv, e: &Self::Bv) -> Self::Bv;
    /// Materialise a proposition as a width-1 bit vector.
    fn prop_to_bv(&mut self, p: &Self::Prop) -> Self::Bv;
    /// Read a width-1 bit vector as a proposition.
    fn bv_to_prop(&mut self, a: &Self::Bv) -> Self::Prop;

    /// A rounding-mode constant, carrying the one-hot encoding of
    /// [`RoundingMode::one_hot`].
    fn rm_const(&mut self, rm: RoundingMode) -> Self::Rm;
    /// Rounding-mode equality.
    fn rm_eq(&mut self, a: &Self::Rm, b: &Self::Rm) -> Self::Prop;
    /// Exactly one mode bit is set.
    fn rm_valid(&mut self, a: &Self::Rm) -> Self::Prop;
    /// Select between two rounding modes.
    fn ite_rm(&mut self, cond: &Self::Prop, t: &Self::Rm, e: &Self::Rm) -> Self::Rm;

    /// Attach a branch-likelihood hint to a proposition.
    ///
    /// Purely advisory; the concrete back-end ignores it.
    fn annotate(&mut self, _p: &Self::Prop, _likelihood: Likelihood) {}

    /// Test whether the rounding mode equals a literal mode.
    fn rm_is(&mut self, rm: &Self::Rm, mode: RoundingMode) -> Self::Prop {
        let lit = self.rm_const(mode);
        self.rm_eq(rm, &lit)
    }
}
