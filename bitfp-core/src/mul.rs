//! Multiplication.

use crate::backend::Backend;
use crate::bits::UBits;
use crate::format::Format;
use crate::ops::{conditional_increment_s, conditional_left_shift_one_u, expanding_add, expanding_multiply};
use crate::rounder::rounder;
use crate::unpacked::Unpacked;

/// The arithmetic core: the exact double-width product, renormalised and
/// folded down to guard and sticky. Finite inputs only.
pub(crate) fn arithmetic_multiply<B: Backend>(
    bd: &mut B,
    fmt: Format,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let sig_width = fmt.unpacked_significand_width();

    let sign = bd.prop_xor(left.sign(), right.sign());

    let product = expanding_multiply(bd, left.significand(), right.significand());
    let product_width = 2 * sig_width;

    // Two leading-one operands give a product in [1, 4): one conditional
    // shift renormalises, and the exponent picks up the carry.
    let top = product.bit(bd, product_width - 1);
    let not_top = bd.prop_not(&top);
    let aligned = conditional_left_shift_one_u(bd, &not_top, &product);

    let exp_sum = expanding_add(bd, left.exponent(), right.exponent());
    let exponent = conditional_increment_s(bd, &top, &exp_sum);

    // Keep the candidate and guard; everything below folds into one
    // sticky bit.
    let head = aligned.extract(bd, product_width - 1, sig_width - 1);
    let tail = aligned.extract(bd, sig_width - 2, 0);
    let tail_zero = tail.is_all_zeros(bd);
    let any_tail = bd.prop_not(&tail_zero);
    let sticky = UBits::from_prop(bd, &any_tail);
    let significand = head.append(bd, &sticky);

    Unpacked::number(bd, sign, exponent, significand)
}

/// IEEE-754 multiplication.
pub fn mul<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let arithmetic = arithmetic_multiply(bd, fmt, left, right);
    let rounded = rounder(bd, fmt, rm, &arithmetic);

    let sign = bd.prop_xor(left.sign(), right.sign());

    let either_nan = bd.prop_or(left.nan(), right.nan());
    let inf_times_zero = {
        let a = bd.prop_and(left.inf(), right.zero());
        let b = bd.prop_and(left.zero(), right.inf());
        bd.prop_or(&a, &b)
    };
    let generates_nan = bd.prop_or(&either_nan, &inf_times_zero);
    let generates_inf = bd.prop_or(left.inf(), right.inf());
    let generates_zero = bd.prop_or(left.zero(), right.zero());

    let nan_result = Unpacked::make_nan(bd, fmt);
    let inf_result = Unpacked::make_inf(bd, fmt, sign.clone());
    let zero_result = Unpacked::make_zero(bd, fmt, sign);

    let on_zero = Unpacked::ite(bd, &generates_zero, &zero_result, &rounded);
    let on_inf = Unpacked::ite(bd, &generates_inf, &inf_result, &on_zero);
    Unpacked::ite(bd, &generates_nan, &nan_result, &on_inf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::Concrete;
    use crate::format::RoundingMode;
    use crate::pack::{pack, unpack};

    fn mul_f32(rm: RoundingMode, a: f32, b: f32) -> u32 {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let pa = UBits::lit(bd, 32, u64::from(a.to_bits()));
        let pb = UBits::lit(bd, 32, u64::from(b.to_bits()));
        let ua = unpack(bd, fmt, &pa);
        let ub = unpack(bd, fmt, &pb);
        let mode = bd.rm_const(rm);
        let result = mul(bd, fmt, &mode, &ua, &ub);
        assert!(result.is_valid(bd, fmt));
        u32::try_from(pack(bd, fmt, &result).raw()).expect("fits")
    }

    #[test]
    fn products_match_hardware() {
        use RoundingMode::NearestEven as RNE;
        for (a, b) in [
            (2.0f32, 3.0f32),
            (1.5, 1.5),
            (0.1, 0.3),
            (-7.25, 0.125),
            (1.0e20, 1.0e20),        // overflow
            (1.0e-30, 1.0e-30),      // underflow to zero region
            (3.4e38, 2.0),           // overflow
            (1.1754944e-38, 0.5),    // smallest normal halved: subnormal
        ] {
            assert_eq!(mul_f32(RNE, a, b), (a * b).to_bits(), "{a} * {b}");
        }
    }

    #[test]
    fn half_min_subnormal_ties_to_zero() {
        let min_sub = f32::from_bits(1);
        assert_eq!(mul_f32(RoundingMode::NearestEven, min_sub, 0.5), 0);
        // Ties away rounds back up to the smallest subnormal.
        assert_eq!(mul_f32(RoundingMode::NearestAway, min_sub, 0.5), 1);
        // Toward positive also lands on the smallest subnormal.
        assert_eq!(mul_f32(RoundingMode::TowardPositive, min_sub, 0.5), 1);
    }

    #[test]
    fn zero_times_infinity_is_nan() {
        use RoundingMode::NearestEven as RNE;
        assert_eq!(mul_f32(RNE, 0.0, f32::INFINITY), 0x7fc0_0000);
        assert_eq!(mul_f32(RNE, f32::NEG_INFINITY, -0.0), 0x7fc0_0000);
        assert_eq!(mul_f32(RNE, f32::INFINITY, -2.0), 0xff80_0000);
        assert_eq!(mul_f32(RNE, -0.0, 2.0), 0x8000_0000);
    }
}
