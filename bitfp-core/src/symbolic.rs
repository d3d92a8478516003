//! The symbolic back-end: a term builder over the expression dag.

use num_bigint::BigUint;

use bitfp_dag::{Likelihood, TermDag, TermId};

use crate::backend::Backend;
use crate::format::RoundingMode;

/// Builds dag nodes instead of computing values.
///
/// Propositions are width-1 terms ("prop-is-bv"), so the whole encoding
/// stays inside the bit-vector sort the downstream solver consumes.
/// Rounding modes are width-5 terms carrying the one-hot encoding of
/// [`RoundingMode::one_hot`].
///
/// The back-end owns its [`TermDag`]; use [`SymBackend::from_dag`] /
/// [`SymBackend::into_dag`] to thread an existing dag through an encoding
/// session, and [`SymBackend::dag`] to inspect or evaluate the result.
#[derive(Debug, Default)]
pub struct SymBackend {
    dag: TermDag,
}

impl SymBackend {
    /// A back-end over a fresh dag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing dag.
    #[must_use]
    pub fn from_dag(dag: TermDag) -> Self {
        Self { dag }
    }

    /// The underlying dag.
    #[must_use]
    pub fn dag(&self) -> &TermDag {
        &self.dag
    }

    /// Mutable access to the underlying dag (e.g. to introduce variables).
    pub fn dag_mut(&mut self) -> &mut TermDag {
        &mut self.dag
    }

    /// Surrender the dag.
    #[must_use]
    pub fn into_dag(self) -> TermDag {
        tracing::debug!(terms = self.dag.len(), "encoding session finished");
        self.dag
    }

    fn check(&self, width: u32, id: TermId) -> TermId {
        debug_assert_eq!(self.dag.width(id), width, "term width drifted");
        id
    }
}

impl Backend for SymBackend {
    type Prop = TermId;
    type Bv = TermId;
    type Rm = TermId;

    fn prop(&mut self, value: bool) -> TermId {
        if value {
            self.dag.mk_true()
        } else {
            self.dag.mk_false()
        }
    }

    fn prop_not(&mut self, a: &TermId) -> TermId {
        self.dag.mk_not(*a)
    }

    fn prop_and(&mut self, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_and(*a, *b)
    }

    fn prop_or(&mut self, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_or(*a, *b)
    }

    fn prop_xor(&mut self, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_xor(*a, *b)
    }

    fn prop_iff(&mut self, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_eq(*a, *b)
    }

    fn ite_prop(&mut self, cond: &TermId, t: &TermId, e: &TermId) -> TermId {
        self.dag.mk_ite(*cond, *t, *e)
    }

    fn bv_const(&mut self, width: u32, value: &BigUint) -> TermId {
        self.dag.mk_const(width, value.clone())
    }

    fn bv_add(&mut self, width: u32, a: &TermId, b: &TermId) -> TermId {
        let id = self.dag.mk_add(*a, *b);
        self.check(width, id)
    }

    fn bv_sub(&mut self, width: u32, a: &TermId, b: &TermId) -> TermId {
        let id = self.dag.mk_sub(*a, *b);
        self.check(width, id)
    }

    fn bv_mul(&mut self, width: u32, a: &TermId, b: &TermId) -> TermId {
        let id = self.dag.mk_mul(*a, *b);
        self.check(width, id)
    }

    fn bv_neg(&mut self, width: u32, a: &TermId) -> TermId {
        let id = self.dag.mk_neg(*a);
        self.check(width, id)
    }

    fn bv_not(&mut self, width: u32, a: &TermId) -> TermId {
        let id = self.dag.mk_not(*a);
        self.check(width, id)
    }

    fn bv_and(&mut self, width: u32, a: &TermId, b: &TermId) -> TermId {
        let id = self.dag.mk_and(*a, *b);
        self.check(width, id)
    }

    fn bv_or(&mut self, width: u32, a: &TermId, b: &TermId) -> TermId {
        let id = self.dag.mk_or(*a, *b);
        self.check(width, id)
    }

    fn bv_xor(&mut self, width: u32, a: &TermId, b: &TermId) -> TermId {
        let id = self.dag.mk_xor(*a, *b);
        self.check(width, id)
    }

    fn bv_shl(&mut self, width: u32, a: &TermId, amount: &TermId) -> TermId {
        let id = self.dag.mk_shl(*a, *amount);
        self.check(width, id)
    }

    fn bv_lshr(&mut self, width: u32, a: &TermId, amount: &TermId) -> TermId {
        let id = self.dag.mk_lshr(*a, *amount);
        self.check(width, id)
    }

    fn bv_ashr(&mut self, width: u32, a: &TermId, amount: &TermId) -> TermId {
        let id = self.dag.mk_ashr(*a, *amount);
        self.check(width, id)
    }

    fn bv_concat(&mut self, hi_width: u32, lo_width: u32, hi: &TermId, lo: &TermId) -> TermId {
        let id = self.dag.mk_concat(*hi, *lo);
        self.check(hi_width + lo_width, id)
    }

    fn bv_extract(&mut self, _width: u32, hi: u32, lo: u32, a: &TermId) -> TermId {
        self.dag.mk_extract(*a, hi, lo)
    }

    fn bv_zero_extend(&mut self, width: u32, by: u32, a: &TermId) -> TermId {
        let id = self.dag.mk_zero_extend(*a, by);
        self.check(width + by, id)
    }

    fn bv_sign_extend(&mut self, width: u32, by: u32, a: &TermId) -> TermId {
        let id = self.dag.mk_sign_extend(*a, by);
        self.check(width + by, id)
    }

    fn bv_eq(&mut self, _width: u32, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_eq(*a, *b)
    }

    fn bv_ult(&mut self, _width: u32, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_ult(*a, *b)
    }

    fn bv_ule(&mut self, _width: u32, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_ule(*a, *b)
    }

    fn bv_slt(&mut self, _width: u32, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_slt(*a, *b)
    }

    fn bv_sle(&mut self, _width: u32, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_sle(*a, *b)
    }

    fn ite_bv(&mut self, width: u32, cond: &TermId, t: &TermId, e: &TermId) -> TermId {
        let id = self.dag.mk_ite(*cond, *t, *e);
        self.check(width, id)
    }

    fn prop_to_bv(&mut self, p: &TermId) -> TermId {
        // Propositions already are width-1 vectors.
        *p
    }

    fn bv_to_prop(&mut self, a: &TermId) -> TermId {
        debug_assert_eq!(self.dag.width(*a), 1, "proposition must have width 1");
        *a
    }

    fn rm_const(&mut self, rm: RoundingMode) -> TermId {
        self.dag
            .mk_const_u64(RoundingMode::BITS, u64::from(rm.one_hot()))
    }

    fn rm_eq(&mut self, a: &TermId, b: &TermId) -> TermId {
        self.dag.mk_eq(*a, *b)
    }

    fn rm_valid(&mut self, a: &TermId) -> TermId {
        // One-hot: x != 0 and x & (x - 1) == 0.
        let zero = self.dag.mk_const_u64(RoundingMode::BITS, 0);
        let one = self.dag.mk_const_u64(RoundingMode::BITS, 1);
        let pred = self.dag.mk_sub(*a, one);
        let masked = self.dag.mk_and(*a, pred);
        let no_extra_bit = self.dag.mk_eq(masked, zero);
        let is_zero = self.dag.mk_eq(*a, zero);
        let non_zero = self.dag.mk_not(is_zero);
        self.dag.mk_and(no_extra_bit, non_zero)
    }

    fn ite_rm(&mut self, cond: &TermId, t: &TermId, e: &TermId) -> TermId {
        self.dag.mk_ite(*cond, *t, *e)
    }

    fn annotate(&mut self, p: &TermId, likelihood: Likelihood) {
        self.dag.annotate(*p, likelihood);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use rustc_hash::FxHashMap;

    #[test]
    fn rm_valid_accepts_exactly_one_hot() {
        let mut bd = SymBackend::new();
        for bits in 0u64..32 {
            let rm = bd.dag_mut().mk_const_u64(RoundingMode::BITS, bits);
            let valid = bd.rm_valid(&rm);
            let value = bd
                .dag()
                .eval(valid, &FxHashMap::default())
                .expect("constant");
            let expect = bits.count_ones() == 1;
            assert_eq!(!value.is_zero(), expect, "valid({bits:#07b})");
        }
    }

    #[test]
    fn rm_constants_match_wire_encoding() {
        let mut bd = SymBackend::new();
        for rm in RoundingMode::ALL {
            let c = bd.rm_const(rm);
            let v = bd.dag().const_value(c).expect("rm constants are literal");
            assert_eq!(v, &BigUint::from(rm.one_hot()));
        }
    }
}
