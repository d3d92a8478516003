//! Square root.

use num_bigint::BigUint;
use num_traits::One;

use crate::backend::Backend;
use crate::bits::UBits;
use crate::format::Format;
use crate::ops::conditional_left_shift_one_u;
use crate::rounder::rounder;
use crate::unpacked::Unpacked;

/// The arithmetic core: a restoring digit-recurrence root over an
/// even-exponent radicand. Finite positive inputs only.
pub(crate) fn arithmetic_sqrt<B: Backend>(
    bd: &mut B,
    fmt: Format,
    value: &Unpacked<B>,
) -> Unpacked<B> {
    let sig_width = fmt.unpacked_significand_width();
    let work_width = 2 * sig_width + 2;

    // Split the exponent into 2m + r; an odd exponent doubles the
    // significand so only even powers reach the root.
    let odd = value.exponent().to_unsigned().bit(bd, 0);
    let one = UBits::one(bd, value.exponent_width());
    let half_exp = value.exponent().ashr(bd, &one);

    let base = value.significand().extend(bd, 1);
    let radicand = conditional_left_shift_one_u(bd, &odd, &base);

    // q = floor(sqrt(radicand << (s + 1))): s + 1 result bits, leading
    // bit set because the radicand lies in [1, 4).
    let mut remainder = radicand
        .extend(bd, work_width - (sig_width + 1))
        .shl_lit(bd, sig_width + 1);
    let mut root = UBits::zero(bd, work_width);
    for i in (0..=sig_width).rev() {
        // Adding 2^i to the partial root grows its square by
        // (root << (i + 1)) + 2^(2i).
        let doubled = root.shl_lit(bd, i + 1);
        let square_bit = UBits::from_biguint(bd, work_width, &(BigUint::one() << (2 * i)));
        let trial = doubled.add(bd, &square_bit);
        let fits = remainder.uge(bd, &trial);
        let reduced = remainder.sub(bd, &trial);
        remainder = UBits::ite(bd, &fits, &reduced, &remainder);
        let bit = UBits::from_biguint(bd, work_width, &(BigUint::one() << i));
        let grown = root.or(bd, &bit);
        root = UBits::ite(bd, &fits, &grown, &root);
    }
    let root = root.extract(bd, sig_width, 0);

    let rem_zero = remainder.is_all_zeros(bd);
    let inexact = bd.prop_not(&rem_zero);
    let sticky = UBits::from_prop(bd, &inexact);
    let significand = root.append(bd, &sticky);

    let sign = bd.prop(false);
    let exponent = half_exp.extend(bd, 1);
    Unpacked::number(bd, sign, exponent, significand)
}

/// IEEE-754 square root: negative numbers give NaN, zeros keep their
/// sign, positive infinity passes through.
pub fn sqrt<B: Backend>(bd: &mut B, fmt: Format, rm: &B::Rm, value: &Unpacked<B>) -> Unpacked<B> {
    let arithmetic = arithmetic_sqrt(bd, fmt, value);
    let rounded = rounder(bd, fmt, rm, &arithmetic);

    let negative_number = {
        let non_zero = bd.prop_not(value.zero());
        bd.prop_and(value.sign(), &non_zero)
    };
    let generates_nan = bd.prop_or(value.nan(), &negative_number);

    let nan_result = Unpacked::make_nan(bd, fmt);
    let zero_result = Unpacked::make_zero(bd, fmt, value.sign().clone());
    let pos = bd.prop(false);
    let inf_result = Unpacked::make_inf(bd, fmt, pos);

    let on_inf = Unpacked::ite(bd, value.inf(), &inf_result, &rounded);
    let on_zero = Unpacked::ite(bd, value.zero(), &zero_result, &on_inf);
    Unpacked::ite(bd, &generates_nan, &nan_result, &on_zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::Concrete;
    use crate::format::RoundingMode;
    use crate::pack::{pack, unpack};

    fn sqrt_f32(rm: RoundingMode, a: f32) -> u32 {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let pa = UBits::lit(bd, 32, u64::from(a.to_bits()));
        let ua = unpack(bd, fmt, &pa);
        let mode = bd.rm_const(rm);
        let result = sqrt(bd, fmt, &mode, &ua);
        assert!(result.is_valid(bd, fmt));
        u32::try_from(pack(bd, fmt, &result).raw()).expect("fits")
    }

    #[test]
    fn roots_match_hardware() {
        use RoundingMode::NearestEven as RNE;
        for a in [4.0f32, 2.0, 0.25, 1.0, 9.0, 0.1, 3.0e38, 1.2e-38, 1.0e-45] {
            assert_eq!(sqrt_f32(RNE, a), a.sqrt().to_bits(), "sqrt({a})");
        }
    }

    #[test]
    fn signed_zero_and_negatives() {
        use RoundingMode::NearestEven as RNE;
        assert_eq!(sqrt_f32(RNE, 0.0), 0.0f32.to_bits());
        assert_eq!(sqrt_f32(RNE, -0.0), (-0.0f32).to_bits());
        assert_eq!(sqrt_f32(RNE, -1.0), 0x7fc0_0000);
        assert_eq!(sqrt_f32(RNE, f32::NEG_INFINITY), 0x7fc0_0000);
        assert_eq!(sqrt_f32(RNE, f32::INFINITY), 0x7f80_0000);
    }
}
