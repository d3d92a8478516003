//! The concrete back-end: an eager evaluator over literal bit vectors.

use num_bigint::BigUint;

use crate::backend::Backend;
use crate::format::RoundingMode;

use bitfp_dag::arith;

/// Evaluates every primitive immediately.
///
/// Bit vectors are [`BigUint`] values already reduced modulo `2^width`
/// (the width travels with the caller), propositions are `bool` and
/// rounding modes are the literal [`RoundingMode`]. The value semantics
/// are shared with the dag evaluator through [`bitfp_dag::arith`], so the
/// two back-ends cannot drift apart.
///
/// The back-end is stateless; `&mut` receivers exist only to satisfy the
/// allocating interface of the trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct Concrete;

impl Backend for Concrete {
    type Prop = bool;
    type Bv = BigUint;
    type Rm = RoundingMode;

    fn prop(&mut self, value: bool) -> bool {
        value
    }

    fn prop_not(&mut self, a: &bool) -> bool {
        !a
    }

    fn prop_and(&mut self, a: &bool, b: &bool) -> bool {
        *a && *b
    }

    fn prop_or(&mut self, a: &bool, b: &bool) -> bool {
        *a || *b
    }

    fn prop_xor(&mut self, a: &bool, b: &bool) -> bool {
        a ^ b
    }

    fn prop_iff(&mut self, a: &bool, b: &bool) -> bool {
        a == b
    }

    fn ite_prop(&mut self, cond: &bool, t: &bool, e: &bool) -> bool {
        if *cond {
            *t
        } else {
            *e
        }
    }

    fn bv_const(&mut self, width: u32, value: &BigUint) -> BigUint {
        arith::norm(width, value)
    }

    fn bv_add(&mut self, width: u32, a: &BigUint, b: &BigUint) -> BigUint {
        arith::add(width, a, b)
    }

    fn bv_sub(&mut self, width: u32, a: &BigUint, b: &BigUint) -> BigUint {
        arith::sub(width, a, b)
    }

    fn bv_mul(&mut self, width: u32, a: &BigUint, b: &BigUint) -> BigUint {
        arith::mul(width, a, b)
    }

    fn bv_neg(&mut self, width: u32, a: &BigUint) -> BigUint {
        arith::neg(width, a)
    }

    fn bv_not(&mut self, width: u32, a: &BigUint) -> BigUint {
        arith::not(width, a)
    }

    fn bv_and(&mut self, width: u32, a: &BigUint, b: &BigUint) -> BigUint {
        arith::and(width, a, b)
    }

    fn bv_or(&mut self, width: u32, a: &BigUint, b: &BigUint) -> BigUint {
        arith::or(width, a, b)
    }

    fn bv_xor(&mut self, width: u32, a: &BigUint, b: &BigUint) -> BigUint {
        arith::xor(width, a, b)
    }

    fn bv_shl(&mut self, width: u32, a: &BigUint, amount: &BigUint) -> BigUint {
        arith::shl(width, a, amount)
    }

    fn bv_lshr(&mut self, width: u32, a: &BigUint, amount: &BigUint) -> BigUint {
        arith::lshr(width, a, amount)
    }

    fn bv_ashr(&mut self, width: u32, a: &BigUint, amount: &BigUint) -> BigUint {
        arith::ashr(width, a, amount)
    }

    fn bv_concat(&mut self, _hi_width: u32, lo_width: u32, hi: &BigUint, lo: &BigUint) -> BigUint {
        arith::concat(lo_width, hi, lo)
    }

    fn bv_extract(&mut self, _width: u32, hi: u32, lo: u32, a: &BigUint) -> BigUint {
        arith::extract(a, hi, lo)
    }

    fn bv_zero_extend(&mut self, _width: u32, _by: u32, a: &BigUint) -> BigUint {
        a.clone()
    }

    fn bv_sign_extend(&mut self, width: u32, by: u32, a: &BigUint) -> BigUint {
        arith::sign_extend(width, by, a)
    }

    fn bv_eq(&mut self, _width: u32, a: &BigUint, b: &BigUint) -> bool {
        a == b
    }

    fn bv_ult(&mut self, _width: u32, a: &BigUint, b: &BigUint) -> bool {
        arith::ult(a, b)
    }

    fn bv_ule(&mut self, _width: u32, a: &BigUint, b: &BigUint) -> bool {
        arith::ule(a, b)
    }

    fn bv_slt(&mut self, width: u32, a: &BigUint, b: &BigUint) -> bool {
        arith::slt(width, a, b)
    }

    fn bv_sle(&mut self, width: u32, a: &BigUint, b: &BigUint) -> bool {
        arith::sle(width, a, b)
    }

    fn ite_bv(&mut self, _width: u32, cond: &bool, t: &BigUint, e: &BigUint) -> BigUint {
        if *cond {
            t.clone()
        } else {
            e.clone()
        }
    }

    fn prop_to_bv(&mut self, p: &bool) -> BigUint {
        BigUint::from(u8::from(*p))
    }

    fn bv_to_prop(&mut self, a: &BigUint) -> bool {
        a.bit(0)
    }

    fn rm_const(&mut self, rm: RoundingMode) -> RoundingMode {
        rm
    }

    fn rm_eq(&mut self, a: &RoundingMode, b: &RoundingMode) -> bool {
        a == b
    }

    fn rm_valid(&mut self, _a: &RoundingMode) -> bool {
        // A literal mode is one-hot by construction.
        true
    }

    fn ite_rm(&mut self, cond: &bool, t: &RoundingMode, e: &RoundingMode) -> RoundingMode {
        if *cond {
            *t
        } else {
            *e
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{SBits, UBits};

    #[test]
    fn shifts_follow_smtlib_saturation() {
        let bd = &mut Concrete;
        let x = UBits::lit(bd, 8, 0x81);
        let nine = UBits::lit(bd, 8, 9);
        let zero = UBits::zero(bd, 8);
        let shifted = x.shl(bd, &nine);
        assert!(shifted.eq(bd, &zero));
        let arith_shift = x.to_signed().ashr(bd, &nine);
        let ones = UBits::all_ones(bd, 8).to_signed();
        assert!(arith_shift.eq(bd, &ones));
    }

    #[test]
    fn signed_literals_wrap_to_twos_complement() {
        let bd = &mut Concrete;
        let minus_one = SBits::lit(bd, 4, -1);
        let ones = UBits::all_ones(bd, 4).to_signed();
        assert!(minus_one.eq(bd, &ones));
        let zero = SBits::zero(bd, 4);
        assert!(minus_one.slt(bd, &zero));
    }
}
