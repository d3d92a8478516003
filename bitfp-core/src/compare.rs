//! IEEE-754 equality, ordering, and the partial min/max.

use crate::backend::Backend;
use crate::format::Format;
use crate::unpacked::Unpacked;

/// IEEE equality: `+0 = -0`, NaN equals nothing (itself included).
pub fn ieee_equal<B: Backend>(
    bd: &mut B,
    _fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
) -> B::Prop {
    let a_not_nan = bd.prop_not(a.nan());
    let b_not_nan = bd.prop_not(b.nan());
    let neither_nan = bd.prop_and(&a_not_nan, &b_not_nan);

    let both_zero = bd.prop_and(a.zero(), b.zero());
    let a_not_zero = bd.prop_not(a.zero());
    let b_not_zero = bd.prop_not(b.zero());
    let neither_zero = bd.prop_and(&a_not_zero, &b_not_zero);

    // Infinities share the default payload, so the component equality
    // covers them as well.
    let inf_agree = bd.prop_iff(a.inf(), b.inf());
    let sign_agree = bd.prop_iff(a.sign(), b.sign());
    let exp_agree = a.exponent().eq(bd, b.exponent());
    let sig_agree = a.significand().eq(bd, b.significand());

    let components = {
        let x = bd.prop_and(&inf_agree, &sign_agree);
        let y = bd.prop_and(&x, &exp_agree);
        bd.prop_and(&y, &sig_agree)
    };
    let numeric = bd.prop_and(&neither_zero, &components);
    let same = bd.prop_or(&both_zero, &numeric);
    bd.prop_and(&neither_nan, &same)
}

/// IEEE strict ordering: `a < b`; false whenever either side is NaN.
pub fn less_than<B: Backend>(
    bd: &mut B,
    _fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
) -> B::Prop {
    // Magnitude order of finite non-zero values in the unpacked form is
    // lexicographic on (exponent, significand); subnormals are normalised
    // so this needs no special casing.
    let exp_lt = a.exponent().slt(bd, b.exponent());
    let exp_eq = a.exponent().eq(bd, b.exponent());
    let sig_lt = a.significand().ult(bd, b.significand());
    let sig_gt = b.significand().ult(bd, a.significand());
    let mag_lt = {
        let tie = bd.prop_and(&exp_eq, &sig_lt);
        bd.prop_or(&exp_lt, &tie)
    };
    let mag_gt = {
        let exp_gt = b.exponent().slt(bd, a.exponent());
        let tie = bd.prop_and(&exp_eq, &sig_gt);
        bd.prop_or(&exp_gt, &tie)
    };

    let a_neg = a.sign().clone();
    let b_neg = b.sign().clone();
    let signs_differ = bd.prop_xor(&a_neg, &b_neg);

    // Both finite and non-zero.
    let same_sign = bd.ite_prop(&a_neg, &mag_gt, &mag_lt);
    let finite_lt = bd.ite_prop(&signs_differ, &a_neg, &same_sign);

    let b_pos_nonzero = {
        let b_pos = bd.prop_not(&b_neg);
        let b_not_zero = bd.prop_not(b.zero());
        bd.prop_and(&b_pos, &b_not_zero)
    };

    let both_zero = bd.prop_and(a.zero(), b.zero());
    let both_inf = bd.prop_and(a.inf(), b.inf());
    let f = bd.prop(false);

    // Case ladder from the outside in: NaN, infinities, zeros, numbers.
    let on_zeros = {
        let z1 = bd.ite_prop(&both_zero, &f, &b_pos_nonzero);
        let z2 = bd.ite_prop(b.zero(), &a_neg, &finite_lt);
        bd.ite_prop(a.zero(), &z1, &z2)
    };
    let on_infs = {
        let neg_vs_pos = {
            let b_pos = bd.prop_not(&b_neg);
            bd.prop_and(&a_neg, &b_pos)
        };
        let b_is_pos_inf = bd.prop_not(&b_neg);
        let i1 = bd.ite_prop(&both_inf, &neg_vs_pos, &a_neg);
        let i2 = bd.ite_prop(b.inf(), &b_is_pos_inf, &on_zeros);
        bd.ite_prop(a.inf(), &i1, &i2)
    };
    let either_nan = bd.prop_or(a.nan(), b.nan());
    bd.ite_prop(&either_nan, &f, &on_infs)
}

/// IEEE `a <= b`: false whenever either side is NaN.
pub fn less_than_or_equal<B: Backend>(
    bd: &mut B,
    fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
) -> B::Prop {
    let lt = less_than(bd, fmt, a, b);
    let eq = ieee_equal(bd, fmt, a, b);
    bd.prop_or(&lt, &eq)
}

/// IEEE `a > b`.
pub fn greater_than<B: Backend>(
    bd: &mut B,
    fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
) -> B::Prop {
    less_than(bd, fmt, b, a)
}

/// IEEE `a >= b`.
pub fn greater_than_or_equal<B: Backend>(
    bd: &mut B,
    fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
) -> B::Prop {
    less_than_or_equal(bd, fmt, b, a)
}

/// The minimum, total only up to `min(+0, -0)`.
///
/// A NaN argument yields the other argument. On the one undefined input
/// pair, opposite-signed zeros, the caller-supplied `undefined` value is
/// returned and the accompanying proposition is false.
pub fn min_with_undefined<B: Backend>(
    bd: &mut B,
    fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
    undefined: &Unpacked<B>,
) -> (Unpacked<B>, B::Prop) {
    let b_lt_a = less_than(bd, fmt, b, a);
    let smaller = Unpacked::ite(bd, &b_lt_a, b, a);
    let skip_a = Unpacked::ite(bd, a.nan(), b, &smaller);
    let chosen = Unpacked::ite(bd, b.nan(), a, &skip_a);

    let both_zero = bd.prop_and(a.zero(), b.zero());
    let signs_differ = bd.prop_xor(a.sign(), b.sign());
    let ambiguous = bd.prop_and(&both_zero, &signs_differ);
    let result = Unpacked::ite(bd, &ambiguous, undefined, &chosen);
    let defined = bd.prop_not(&ambiguous);
    (result, defined)
}

/// The maximum, total only up to `max(+0, -0)`; see [`min_with_undefined`].
pub fn max_with_undefined<B: Backend>(
    bd: &mut B,
    fmt: Format,
    a: &Unpacked<B>,
    b: &Unpacked<B>,
    undefined: &Unpacked<B>,
) -> (Unpacked<B>, B::Prop) {
    let a_lt_b = less_than(bd, fmt, a, b);
    let larger = Unpacked::ite(bd, &a_lt_b, b, a);
    let skip_a = Unpacked::ite(bd, a.nan(), b, &larger);
    let chosen = Unpacked::ite(bd, b.nan(), a, &skip_a);

    let both_zero = bd.prop_and(a.zero(), b.zero());
    let signs_differ = bd.prop_xor(a.sign(), b.sign());
    let ambiguous = bd.prop_and(&both_zero, &signs_differ);
    let result = Unpacked::ite(bd, &ambiguous, undefined, &chosen);
    let defined = bd.prop_not(&ambiguous);
    (result, defined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::UBits;
    use crate::concrete::Concrete;
    use crate::pack::unpack;

    fn v(bd: &mut Concrete, bits: u64) -> Unpacked<Concrete> {
        let packed = UBits::lit(bd, 32, bits);
        unpack(bd, Format::BINARY32, &packed)
    }

    #[test]
    fn ordering_matches_hardware() {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let cases: &[(u32, u32)] = &[
            (0x3f80_0000, 0x4000_0000), // 1.0, 2.0
            (0xbf80_0000, 0x3f80_0000), // -1.0, 1.0
            (0x8000_0000, 0x0000_0000), // -0.0, +0.0
            (0xff80_0000, 0x7f80_0000), // -inf, +inf
            (0x0000_0001, 0x0000_0002), // subnormals
            (0x7fc0_0000, 0x3f80_0000), // NaN, 1.0
            (0xc000_0000, 0xbf80_0000), // -2.0, -1.0
        ];
        for &(x, y) in cases {
            let (fx, fy) = (f32::from_bits(x), f32::from_bits(y));
            let a = v(bd, u64::from(x));
            let b = v(bd, u64::from(y));
            assert_eq!(less_than(bd, fmt, &a, &b), fx < fy, "{fx} < {fy}");
            assert_eq!(less_than(bd, fmt, &b, &a), fy < fx, "{fy} < {fx}");
            assert_eq!(ieee_equal(bd, fmt, &a, &b), fx == fy, "{fx} == {fy}");
            assert_eq!(
                less_than_or_equal(bd, fmt, &a, &b),
                fx <= fy,
                "{fx} <= {fy}"
            );
        }
    }

    #[test]
    fn signed_zeros_compare_equal() {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let pz = v(bd, 0x0000_0000);
        let nz = v(bd, 0x8000_0000);
        assert!(ieee_equal(bd, fmt, &pz, &nz));
        assert!(!less_than(bd, fmt, &nz, &pz));
    }

    #[test]
    fn min_of_opposite_zeros_is_partial() {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let pz = v(bd, 0x0000_0000);
        let nz = v(bd, 0x8000_0000);
        let undef = v(bd, 0x7f7f_ffff);
        let (result, defined) = min_with_undefined(bd, fmt, &pz, &nz, &undef);
        assert!(!defined);
        // The undefined stand-in is passed through verbatim.
        assert!(result.significand().eq(bd, undef.significand()));

        let one = v(bd, 0x3f80_0000);
        let (result, defined) = min_with_undefined(bd, fmt, &one, &nz, &undef);
        assert!(defined);
        assert!(result.zero().to_owned());
    }

    #[test]
    fn nan_arguments_fall_away_in_min_max() {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let nan = v(bd, 0x7fc0_0000);
        let one = v(bd, 0x3f80_0000);
        let undef = v(bd, 0x0000_0000);
        let (result, defined) = max_with_undefined(bd, fmt, &nan, &one, &undef);
        assert!(defined);
        assert!(!result.nan().to_owned());
        let (result, _) = min_with_undefined(bd, fmt, &one, &nan, &undef);
        assert!(!result.nan().to_owned());
    }
}
