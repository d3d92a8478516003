//! IEEE-754 remainder.
//!
//! `rem(a, b) = a - n*b` with `n` the integer nearest `a/b`, ties to even.
//! The quotient can span the whole exponent range, so the encoding runs a
//! shift-and-subtract ladder long enough for the worst case; each step is
//! predicated on the actual exponent difference having reached it. The
//! result is always exact, so no rounding mode is taken.

use crate::backend::Backend;
use crate::bits::{SBits, UBits};
use crate::format::{Format, RoundingMode};
use crate::rounder::rounder;
use crate::unpacked::Unpacked;

/// IEEE-754 remainder.
pub fn rem<B: Backend>(
    bd: &mut B,
    fmt: Format,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let sig_width = fmt.unpacked_significand_width();
    let exp_width = fmt.unpacked_exponent_width();
    let cmp_width = exp_width + 1;

    // Exponent distance; every ladder depth up to the full exponent range
    // must be encoded.
    let left_exp = left.exponent().extend(bd, 1);
    let right_exp = right.exponent().extend(bd, 1);
    let distance = left_exp.sub(bd, &right_exp);
    let ladder = u32::try_from(fmt.max_normal_exponent() - fmt.min_subnormal_exponent())
        .expect("exponent range fits");
    tracing::trace!(ladder, "remainder reduction depth");

    // Long division on significands: after the active steps the running
    // value is |a| mod' |b| at b's scale, held below 2|b|.
    let divisor = right.significand().extend(bd, 1);
    let mut partial = left.significand().extend(bd, 1);
    for i in (1..=ladder).rev() {
        let depth = SBits::lit(bd, cmp_width, i64::from(i));
        let active = distance.sge(bd, &depth);
        let fits = partial.uge(bd, &divisor);
        let reduced = partial.sub(bd, &divisor);
        let after_sub = UBits::ite(bd, &fits, &reduced, &partial);
        let stepped = after_sub.shl_lit(bd, 1);
        partial = UBits::ite(bd, &active, &stepped, &partial);
    }

    // Final reduction gives the floor remainder and the quotient parity.
    let zero_d = SBits::zero(bd, cmp_width);
    let in_range = distance.sge(bd, &zero_d);
    let fits = partial.uge(bd, &divisor);
    let reduced = partial.sub(bd, &divisor);
    let parity = bd.prop_and(&in_range, &fits);
    let floor_rem = UBits::ite(bd, &parity, &reduced, &partial);

    // Nearest correction: past the halfway point, or exactly on it with an
    // odd quotient, the remainder flips to the other side of b.
    let rem2 = floor_rem.extend(bd, 1).shl_lit(bd, 1);
    let div2 = divisor.extend(bd, 1);
    let past_half = div2.ult(bd, &rem2);
    let at_half = rem2.eq(bd, &div2);
    let tie_up = bd.prop_and(&at_half, &parity);
    let bump = bd.prop_or(&past_half, &tie_up);

    let rem_x = floor_rem.extend(bd, 1);
    let flipped = div2.sub(bd, &rem_x);
    let main_mag = UBits::ite(bd, &bump, &flipped, &rem_x);

    // One place below b's exponent the quotient is 0 or 1 and the ladder
    // never runs; the cases resolve against the bare significands.
    let minus_one = SBits::lit(bd, cmp_width, -1);
    let just_below = distance.eq(bd, &minus_one);
    let far_below = distance.slt(bd, &minus_one);

    let a_larger = right.significand().ult(bd, left.significand());
    let twice_b = div2.shl_lit(bd, 1);
    let a_ext = left.significand().extend(bd, 2);
    let from_b = twice_b.sub(bd, &a_ext);
    let below_mag = UBits::ite(bd, &a_larger, &from_b, &a_ext);

    let magnitude = UBits::ite(bd, &just_below, &below_mag, &main_mag);

    // Scale: the magnitude sits against b's exponent, one octave lower in
    // the just-below case.
    let base_exp = right.exponent().extend(bd, 2);
    let one_e = SBits::one(bd, exp_width + 2);
    let two_e = SBits::lit(bd, exp_width + 2, 2);
    let up_two = base_exp.add(bd, &two_e);
    let up_one = base_exp.add(bd, &one_e);
    let scale = SBits::ite(bd, &just_below, &up_one, &up_two);

    let flip = bd.ite_prop(&just_below, &a_larger, &bump);
    let sign = bd.prop_xor(left.sign(), &flip);

    let shaped = Unpacked::number(bd, sign, scale, magnitude);
    let normalised = shaped.normalise_up_detect_zero(bd);
    // Exact by construction; the mode cannot matter.
    let mode = bd.rm_const(RoundingMode::TowardZero);
    let narrowed = rounder(bd, fmt, &mode, &normalised);

    let computed = Unpacked::ite(bd, &far_below, left, &narrowed);

    // Special cases: an infinite dividend or zero divisor poisons, an
    // infinite divisor or zero dividend passes the dividend through.
    let generates_nan = {
        let either_nan = bd.prop_or(left.nan(), right.nan());
        let bad = bd.prop_or(left.inf(), right.zero());
        bd.prop_or(&either_nan, &bad)
    };
    let identity = bd.prop_or(right.inf(), left.zero());

    let nan_result = Unpacked::make_nan(bd, fmt);
    let on_identity = Unpacked::ite(bd, &identity, left, &computed);
    Unpacked::ite(bd, &generates_nan, &nan_result, &on_identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{pack, unpack};
    use crate::concrete::Concrete;

    fn rem_f32(a: f32, b: f32) -> u32 {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let pa = UBits::lit(bd, 32, u64::from(a.to_bits()));
        let pb = UBits::lit(bd, 32, u64::from(b.to_bits()));
        let ua = unpack(bd, fmt, &pa);
        let ub = unpack(bd, fmt, &pb);
        let result = rem(bd, fmt, &ua, &ub);
        assert!(result.is_valid(bd, fmt));
        u32::try_from(pack(bd, fmt, &result).raw()).expect("fits")
    }

    #[test]
    fn nearest_quotient_with_ties_to_even() {
        assert_eq!(rem_f32(5.0, 3.0), (-1.0f32).to_bits());
        assert_eq!(rem_f32(7.5, 2.0), (-0.5f32).to_bits());
        assert_eq!(rem_f32(6.0, 4.0), (-2.0f32).to_bits()); // 1.5 ties to 2
        assert_eq!(rem_f32(2.0, 4.0), 2.0f32.to_bits()); // 0.5 ties to 0
        assert_eq!(rem_f32(5.0, 2.5), 0.0f32.to_bits());
        assert_eq!(rem_f32(1.5, 2.0), (-0.5f32).to_bits());
        assert_eq!(rem_f32(1.0, 2.0), 1.0f32.to_bits());
        assert_eq!(rem_f32(0.75, 4.0), 0.75f32.to_bits());
    }

    #[test]
    fn signs_follow_the_dividend() {
        assert_eq!(rem_f32(-5.0, 3.0), 1.0f32.to_bits());
        assert_eq!(rem_f32(5.0, -3.0), (-1.0f32).to_bits());
        assert_eq!(rem_f32(-5.0, -3.0), 1.0f32.to_bits());
        // Exact multiples keep the dividend's signed zero.
        assert_eq!(rem_f32(6.0, 3.0), 0.0f32.to_bits());
        assert_eq!(rem_f32(-6.0, 3.0), (-0.0f32).to_bits());
    }

    #[test]
    fn special_cases() {
        assert_eq!(rem_f32(1.0, 0.0), 0x7fc0_0000);
        assert_eq!(rem_f32(f32::INFINITY, 2.0), 0x7fc0_0000);
        assert_eq!(rem_f32(2.0, f32::INFINITY), 2.0f32.to_bits());
        assert_eq!(rem_f32(-0.0, 1.0), 0x8000_0000);
        assert_eq!(rem_f32(f32::NAN, 1.0), 0x7fc0_0000);
    }

    #[test]
    fn large_exponent_gaps_reduce_fully() {
        // 2^40 mod 7 = 2 and 2/7 is below the halfway point.
        let big = (1u64 << 40) as f32;
        assert_eq!(rem_f32(big, 7.0), 2.0f32.to_bits());
        // 2^40 mod 3 = 1.
        assert_eq!(rem_f32(big, 3.0), 1.0f32.to_bits());
        // Exact multiples across a 50-octave gap cancel to zero.
        assert_eq!(rem_f32(big, f32::from_bits(0x3a80_0000)), 0.0f32.to_bits());
    }
}
