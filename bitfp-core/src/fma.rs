//! Fused multiply-add: one rounding over the exact product and addend.

use crate::add::arithmetic_add;
use crate::backend::Backend;
use crate::format::{Format, RoundingMode};
use crate::mul::arithmetic_multiply;
use crate::ops::{conditional_increment_s, conditional_left_shift_one_u, expanding_add, expanding_multiply};
use crate::rounder::rounder;
use crate::unpacked::Unpacked;

/// `fma(x, y, z) = round(x * y + z)`.
///
/// The product is kept exact at doubled precision, the addend is extended
/// exactly to match, and the addition core runs at that width; only the
/// final result is rounded. The special-case table is richer than
/// addition's because the product's NaN and infinity cases compose with
/// the addend's.
pub fn fma<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    x: &Unpacked<B>,
    y: &Unpacked<B>,
    z: &Unpacked<B>,
) -> Unpacked<B> {
    let sig_width = fmt.unpacked_significand_width();
    let product_width = 2 * sig_width;

    let product_sign = bd.prop_xor(x.sign(), y.sign());

    // The exact product, renormalised but not folded: every bit stays.
    let product = expanding_multiply(bd, x.significand(), y.significand());
    let top = product.bit(bd, product_width - 1);
    let not_top = bd.prop_not(&top);
    let full_sig = conditional_left_shift_one_u(bd, &not_top, &product);
    let exp_sum = expanding_add(bd, x.exponent(), y.exponent());
    let product_exp = conditional_increment_s(bd, &top, &exp_sum);
    let product_uf = Unpacked::number(bd, product_sign.clone(), product_exp, full_sig);

    // The addend, widened exactly to the product's shape.
    let addend = z.extend(bd, 1, sig_width);

    let t = bd.prop(true);
    let (sum, _) = arithmetic_add(bd, rm, &product_uf, &addend, &t);
    let fused = rounder(bd, fmt, rm, &sum);

    // The product alone, for a zero addend: folding to guard and sticky
    // rebuilds the same nodes the multiplier would.
    let folded = arithmetic_multiply(bd, fmt, x, y);
    let product_alone = rounder(bd, fmt, rm, &folded);

    // Special cases.
    let product_nan = {
        let either_nan = bd.prop_or(x.nan(), y.nan());
        let inf_zero = bd.prop_and(x.inf(), y.zero());
        let zero_inf = bd.prop_and(x.zero(), y.inf());
        let bad = bd.prop_or(&inf_zero, &zero_inf);
        bd.prop_or(&either_nan, &bad)
    };
    let product_inf = bd.prop_or(x.inf(), y.inf());
    let product_zero = bd.prop_or(x.zero(), y.zero());

    let inf_clash = {
        let both = bd.prop_and(&product_inf, z.inf());
        let signs_differ = bd.prop_xor(&product_sign, z.sign());
        bd.prop_and(&both, &signs_differ)
    };
    let generates_nan = {
        let a = bd.prop_or(&product_nan, z.nan());
        bd.prop_or(&a, &inf_clash)
    };
    let generates_inf = bd.prop_or(&product_inf, z.inf());
    let sign_of_inf = bd.ite_prop(&product_inf, &product_sign, z.sign());

    // Both contributions zero: the sum-of-zeros sign rule, as in addition.
    let both_zero = bd.prop_and(&product_zero, z.zero());
    let is_rtn = bd.rm_is(rm, RoundingMode::TowardNegative);
    let signs_match = bd.prop_iff(&product_sign, z.sign());
    let sign_of_zero = bd.ite_prop(&signs_match, &product_sign, &is_rtn);

    let nan_result = Unpacked::make_nan(bd, fmt);
    let inf_result = Unpacked::make_inf(bd, fmt, sign_of_inf);
    let zero_result = Unpacked::make_zero(bd, fmt, sign_of_zero);

    let on_zero_addend = Unpacked::ite(bd, z.zero(), &product_alone, &fused);
    let on_zero_product = Unpacked::ite(bd, &product_zero, z, &on_zero_addend);
    let on_both_zero = Unpacked::ite(bd, &both_zero, &zero_result, &on_zero_product);
    let on_inf = Unpacked::ite(bd, &generates_inf, &inf_result, &on_both_zero);
    Unpacked::ite(bd, &generates_nan, &nan_result, &on_inf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::UBits;
    use crate::concrete::Concrete;
    use crate::pack::{pack, unpack};

    fn fma_f32(rm: RoundingMode, x: f32, y: f32, z: f32) -> u32 {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let px = UBits::lit(bd, 32, u64::from(x.to_bits()));
        let py = UBits::lit(bd, 32, u64::from(y.to_bits()));
        let pz = UBits::lit(bd, 32, u64::from(z.to_bits()));
        let ux = unpack(bd, fmt, &px);
        let uy = unpack(bd, fmt, &py);
        let uz = unpack(bd, fmt, &pz);
        let mode = bd.rm_const(rm);
        let result = fma(bd, fmt, &mode, &ux, &uy, &uz);
        assert!(result.is_valid(bd, fmt));
        u32::try_from(pack(bd, fmt, &result).raw()).expect("fits")
    }

    #[test]
    fn fused_results_match_hardware() {
        use RoundingMode::NearestEven as RNE;
        for (x, y, z) in [
            (1.0f32, 1.0f32, 1.0f32),
            (2.5, 4.0, -10.0),
            (0.1, 0.2, 0.3),
            (1.0e20, 1.0e20, -1.0e38),
            (1.5, 1.5, f32::from_bits(1)),
            (-3.0, 7.0, 22.0),
        ] {
            assert_eq!(
                fma_f32(RNE, x, y, z),
                x.mul_add(y, z).to_bits(),
                "fma({x}, {y}, {z})"
            );
        }
    }

    #[test]
    fn single_rounding_beats_two_operations() {
        // (1 + 2^-12)^2 - 1 = 2^-11 + 2^-24, exactly representable; a
        // separate multiply rounds the 2^-24 term away first.
        let x = f32::from_bits(0x3f80_0800); // 1 + 2^-12
        let z = -1.0f32;
        let fused = fma_f32(RoundingMode::NearestEven, x, x, z);
        assert_eq!(fused, x.mul_add(x, z).to_bits());
        assert_ne!(fused, (x * x + z).to_bits());
    }

    #[test]
    fn zero_addend_still_rounds_the_product() {
        use RoundingMode::{NearestEven, TowardNegative, TowardZero};
        let x = f32::from_bits(0x3f80_0001);
        assert_eq!(fma_f32(NearestEven, x, x, 0.0), (x * x).to_bits());
        assert_eq!(fma_f32(TowardZero, x, x, -0.0), (x * x).to_bits());
        // Sum-of-zeros sign rule.
        assert_eq!(fma_f32(NearestEven, 0.0, 1.0, -0.0), 0.0f32.to_bits());
        assert_eq!(fma_f32(TowardNegative, 0.0, 1.0, -0.0), (-0.0f32).to_bits());
        assert_eq!(fma_f32(NearestEven, -0.0, 1.0, -0.0), (-0.0f32).to_bits());
    }

    #[test]
    fn special_operands() {
        use RoundingMode::NearestEven as RNE;
        assert_eq!(fma_f32(RNE, f32::INFINITY, 0.0, 1.0), 0x7fc0_0000);
        assert_eq!(
            fma_f32(RNE, f32::INFINITY, 1.0, f32::NEG_INFINITY),
            0x7fc0_0000
        );
        assert_eq!(
            fma_f32(RNE, f32::INFINITY, 2.0, 5.0),
            f32::INFINITY.to_bits()
        );
        assert_eq!(
            fma_f32(RNE, 2.0, 2.0, f32::NEG_INFINITY),
            f32::NEG_INFINITY.to_bits()
        );
        assert_eq!(fma_f32(RNE, f32::NAN, 1.0, 1.0), 0x7fc0_0000);
        assert_eq!(fma_f32(RNE, 5.0, 0.0, 3.0), 3.0f32.to_bits());
    }
}
