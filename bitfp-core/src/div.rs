//! Division.

use num_bigint::BigUint;
use num_traits::One;

use crate::backend::Backend;
use crate::bits::UBits;
use crate::format::Format;
use crate::ops::{conditional_decrement_s, expanding_subtract};
use crate::rounder::rounder;
use crate::unpacked::Unpacked;

/// The arithmetic core: a restoring division producing the candidate,
/// guard and sticky bits of the quotient. Finite non-zero inputs only.
pub(crate) fn arithmetic_divide<B: Backend>(
    bd: &mut B,
    fmt: Format,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let sig_width = fmt.unpacked_significand_width();
    let work_width = 2 * sig_width + 2;

    let sign = bd.prop_xor(left.sign(), right.sign());
    let exp_diff = expanding_subtract(bd, left.exponent(), right.exponent());

    // q = floor((a << (s + 1)) / b). Both significands have their leading
    // bit set, so the quotient lands in (2^s, 2^(s+2)) and s + 2 result
    // bits cover it.
    let mut remainder = left
        .significand()
        .extend(bd, work_width - sig_width)
        .shl_lit(bd, sig_width + 1);
    let divisor = right.significand().extend(bd, work_width - sig_width);

    let mut quotient = UBits::zero(bd, work_width);
    for j in (0..=sig_width + 1).rev() {
        let step = divisor.shl_lit(bd, j);
        let fits = remainder.uge(bd, &step);
        let reduced = remainder.sub(bd, &step);
        remainder = UBits::ite(bd, &fits, &reduced, &remainder);
        let bit = UBits::from_biguint(bd, work_width, &(BigUint::one() << j));
        let taken = quotient.or(bd, &bit);
        quotient = UBits::ite(bd, &fits, &taken, &quotient);
    }
    let quotient = quotient.extract(bd, sig_width + 1, 0);

    let rem_zero = remainder.is_all_zeros(bd);
    let inexact = bd.prop_not(&rem_zero);
    let sticky = UBits::from_prop(bd, &inexact);

    // A ratio of at least one puts the leading bit at the top; otherwise
    // everything sits one place lower and the exponent drops by one.
    let top = quotient.bit(bd, sig_width + 1);
    let q_low = quotient.extract(bd, 0, 0);
    let low_folded = q_low.or(bd, &sticky);
    let head_hi = quotient.extract(bd, sig_width + 1, 1);
    let sig_hi = head_hi.append(bd, &low_folded);
    let head_lo = quotient.extract(bd, sig_width, 0);
    let sig_lo = head_lo.append(bd, &sticky);
    let significand = UBits::ite(bd, &top, &sig_hi, &sig_lo);

    let below_one = bd.prop_not(&top);
    let exponent = conditional_decrement_s(bd, &below_one, &exp_diff);

    Unpacked::number(bd, sign, exponent, significand)
}

/// IEEE-754 division.
pub fn div<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let arithmetic = arithmetic_divide(bd, fmt, left, right);
    let rounded = rounder(bd, fmt, rm, &arithmetic);

    let sign = bd.prop_xor(left.sign(), right.sign());

    let either_nan = bd.prop_or(left.nan(), right.nan());
    let zero_over_zero = bd.prop_and(left.zero(), right.zero());
    let inf_over_inf = bd.prop_and(left.inf(), right.inf());
    let generates_nan = {
        let bad = bd.prop_or(&zero_over_zero, &inf_over_inf);
        bd.prop_or(&either_nan, &bad)
    };
    // Division by zero and an infinite dividend both produce infinity.
    let generates_inf = bd.prop_or(left.inf(), right.zero());
    let generates_zero = bd.prop_or(left.zero(), right.inf());

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

    fn div_f32(rm: RoundingMode, a: f32, b: f32) -> u32 {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let pa = UBits::lit(bd, 32, u64::from(a.to_bits()));
        let pb = UBits::lit(bd, 32, u64::from(b.to_bits()));
        let ua = unpack(bd, fmt, &pa);
        let ub = unpack(bd, fmt, &pb);
        let mode = bd.rm_const(rm);
        let result = div(bd, fmt, &mode, &ua, &ub);
        assert!(result.is_valid(bd, fmt));
        u32::try_from(pack(bd, fmt, &result).raw()).expect("fits")
    }

    #[test]
    fn quotients_match_hardware() {
        use RoundingMode::NearestEven as RNE;
        for (a, b) in [
            (1.0f32, 3.0f32),
            (10.0, 2.0),
            (7.0, -0.1),
            (1.0, 1.0000001),
            (1.0e-38, 3.0),   // subnormal quotient
            (3.4e38, 0.25),   // overflow
        ] {
            assert_eq!(div_f32(RNE, a, b), (a / b).to_bits(), "{a} / {b}");
        }
    }

    #[test]
    fn division_by_zero_signs_the_infinity() {
        use RoundingMode::NearestEven as RNE;
        assert_eq!(div_f32(RNE, 1.0, 0.0), f32::INFINITY.to_bits());
        assert_eq!(div_f32(RNE, 1.0, -0.0), f32::NEG_INFINITY.to_bits());
        assert_eq!(div_f32(RNE, -1.0, 0.0), f32::NEG_INFINITY.to_bits());
    }

    #[test]
    fn indeterminate_forms_are_nan() {
        use RoundingMode::NearestEven as RNE;
        assert_eq!(div_f32(RNE, 0.0, -0.0), 0x7fc0_0000);
        assert_eq!(div_f32(RNE, f32::INFINITY, f32::INFINITY), 0x7fc0_0000);
        assert_eq!(div_f32(RNE, f32::INFINITY, 1.0), 0x7f80_0000);
        assert_eq!(div_f32(RNE, 0.0, f32::INFINITY), 0x0000_0000);
        assert_eq!(div_f32(RNE, -0.0, 5.0), 0x8000_0000);
    }
}
