//! Conversions: between formats, to and from integers, to and from reals.

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::backend::{Backend, Likelihood};
use crate::bits::{SBits, UBits};
use crate::concrete::Concrete;
use crate::format::{Format, RoundingMode};
use crate::ops::{collar, conditional_increment_s, conditional_negate_s, sabs, smax};
use crate::rounder::{fixed_position_round, rounder, variable_position_round};
use crate::unpacked::Unpacked;

/// Bits needed to represent `x`: the position of its leading one plus one.
fn bits_to_represent(x: u32) -> u32 {
    32 - x.leading_zeros()
}

/// Convert between floating-point formats.
///
/// A strict promotion (both widths grow or stay) is an exact extension;
/// anything else extends as needed and rounds.
pub fn float_to_float<B: Backend>(
    bd: &mut B,
    source: Format,
    target: Format,
    rm: &B::Rm,
    input: &Unpacked<B>,
) -> Unpacked<B> {
    let src_exp = source.unpacked_exponent_width();
    let src_sig = source.unpacked_significand_width();
    let tgt_exp = target.unpacked_exponent_width();
    let tgt_sig = target.unpacked_significand_width();

    // Format sizes are literal, so branching on them is sound.
    if src_exp <= tgt_exp && src_sig <= tgt_sig {
        return input.extend(bd, tgt_exp - src_exp, tgt_sig - src_sig);
    }

    // The rounder wants room for a guard and a sticky beyond the target
    // precision, and at least the target's exponent range.
    let exp_extra = tgt_exp.saturating_sub(src_exp);
    let sig_extra = (tgt_sig + 2).saturating_sub(src_sig);
    let extended = input.extend(bd, exp_extra, sig_extra);
    rounder(bd, target, rm, &extended)
}

/// Round to a nearby integer, staying in the same format.
pub fn round_to_integral<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    input: &Unpacked<B>,
) -> Unpacked<B> {
    let sig_width = fmt.unpacked_significand_width();
    let exp_width = fmt.unpacked_exponent_width();

    // Two extra bits so that `sig_width + 1` is representable even in the
    // smallest formats.
    let point_width = exp_width + 2;
    let exponent = input.exponent().extend(bd, 2);
    let fraction_bits = SBits::lit(bd, point_width, i64::from(fmt.packed_significand_width()));

    // Values with all significand bits left of the point are already
    // integral, as are the specials.
    let integral = fraction_bits.sle(bd, &exponent);
    let special = {
        let a = bd.prop_or(input.nan(), input.inf());
        bd.prop_or(&a, input.zero())
    };
    let identity = bd.prop_or(&integral, &special);
    bd.annotate(&identity, Likelihood::Likely);

    let initial_point = fraction_bits.sub(bd, &exponent);
    let zero_p = SBits::zero(bd, point_width);
    let limit = SBits::lit(bd, point_width, i64::from(sig_width) + 1);
    let point = collar(bd, &initial_point, &zero_p, &limit);
    let position = point.to_unsigned().resize(bd, sig_width);

    let rounded = variable_position_round(bd, rm, input.sign(), input.significand(), &position);

    // Rounding up from below one crosses several exponents at once; the
    // clamp to zero lands it on exactly one.
    let bumped = conditional_increment_s(bd, &rounded.increment_exponent, input.exponent());
    let zero_e = SBits::zero(bd, exp_width);
    let new_exp = smax(bd, &bumped, &zero_e);

    let reconstructed = Unpacked::number(bd, input.sign().clone(), new_exp, rounded.significand.clone());

    let vanished = rounded.significand.is_all_zeros(bd);
    let zero_result = Unpacked::make_zero(bd, fmt, input.sign().clone());
    let on_vanish = Unpacked::ite(bd, &vanished, &zero_result, &reconstructed);
    Unpacked::ite(bd, &identity, input, &on_vanish)
}

/// Interpret an unsigned bit vector as a float, with the binary point
/// `decimal_point` bits up from the least-significant end.
pub fn ubv_to_float<B: Backend>(
    bd: &mut B,
    target: Format,
    rm: &B::Rm,
    input: &UBits<B>,
    decimal_point: u32,
) -> Unpacked<B> {
    assert!(
        decimal_point <= input.width(),
        "decimal point beyond the input width"
    );

    // Single-bit inputs are padded so a working format exists.
    let working = if input.width() < 2 {
        input.extend(bd, 2 - input.width())
    } else {
        input.clone()
    };
    let width = working.width();

    // A format just big enough to hold the input exactly.
    let initial_fmt = Format::new(bits_to_represent(width) + 1, width);
    let exp_width = initial_fmt.unpacked_exponent_width();

    // With the leading one at the top, the exponent is the position of the
    // input's own top bit relative to the point.
    let exponent = SBits::lit(
        bd,
        exp_width,
        i64::from(width) - 1 - i64::from(decimal_point),
    );
    let sign = bd.prop(false);
    let raw = Unpacked::number(bd, sign, exponent, working);
    let normalised = raw.normalise_up_detect_zero(bd);

    float_to_float(bd, initial_fmt, target, rm, &normalised)
}

/// Interpret a signed (two's complement) bit vector as a float.
pub fn sbv_to_float<B: Backend>(
    bd: &mut B,
    target: Format,
    rm: &B::Rm,
    input: &SBits<B>,
    decimal_point: u32,
) -> Unpacked<B> {
    assert!(
        decimal_point <= input.width(),
        "decimal point beyond the input width"
    );
    let width = input.width();

    // One extra bit so the magnitude of the minimum value fits.
    let initial_fmt = Format::new(bits_to_represent(width) + 1, width + 1);
    let exp_width = initial_fmt.unpacked_exponent_width();

    let zero = SBits::zero(bd, width);
    let negative = input.slt(bd, &zero);

    let widened = input.extend(bd, 1);
    let magnitude = sabs(bd, &widened).to_unsigned();

    let exponent = SBits::lit(bd, exp_width, i64::from(width) - i64::from(decimal_point));
    let raw = Unpacked::number(bd, negative, exponent, magnitude);
    let normalised = raw.normalise_up_detect_zero(bd);

    float_to_float(bd, initial_fmt, target, rm, &normalised)
}

/// Shared alignment and rounding for the float-to-bit-vector conversions:
/// the value, scaled by `2^decimal_point`, rounded to `target_width` bits
/// of integer.
fn float_to_bv_core<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    input: &Unpacked<B>,
    target_width: u32,
    decimal_point: u32,
) -> crate::rounder::SigRounded<B> {
    let sig_width = input.significand_width();
    let exp_width = input.exponent_width();

    // A zero input must contribute no bits at all.
    let ones = UBits::all_ones(bd, sig_width);
    let none = UBits::zero(bd, sig_width);
    let keep = UBits::ite(bd, input.zero(), &none, &ones);
    let cleared = input.significand().and(bd, &keep);

    // Start fully right, in the sticky position, and shift up into place.
    // The shift arithmetic runs wide enough for both the exponent range
    // and the target width.
    let shift_width = (exp_width + 1).max(bits_to_represent(target_width + 1) + 2);
    let expanded = cleared.extend(bd, target_width + 1);
    let wide_exp = input.exponent().extend(bd, shift_width - exp_width);
    let offset = SBits::lit(bd, shift_width, i64::from(decimal_point) + 2);
    let raw_shift = wide_exp.add(bd, &offset);
    let zero_s = SBits::zero(bd, shift_width);
    let max_shift = SBits::lit(bd, shift_width, i64::from(target_width) + 1);
    let shift = collar(bd, &raw_shift, &zero_s, &max_shift);
    let shift_u = shift.to_unsigned().resize(bd, expanded.width());
    let aligned = expanded.shl(bd, &shift_u);

    fixed_position_round(bd, rm, input.sign(), &aligned, target_width)
}

/// Convert to an unsigned bit vector of `target_width` bits.
///
/// Returns the caller's `undefined` stand-in, and a false definedness
/// proposition, on NaN, infinities, negative values, and overflow.
pub fn float_to_ubv<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    input: &Unpacked<B>,
    target_width: u32,
    undefined: &UBits<B>,
    decimal_point: u32,
) -> (UBits<B>, B::Prop) {
    assert!(decimal_point < target_width, "decimal point out of range");
    assert_eq!(undefined.width(), target_width, "stand-in width mismatch");
    let exp_width = input.exponent_width();
    let cmp_width = (exp_width + 1).max(bits_to_represent(target_width) + 2);

    let special = bd.prop_or(input.inf(), input.nan());
    let wide_exp = input.exponent().extend(bd, cmp_width - exp_width);
    let limit = SBits::lit(bd, cmp_width, i64::from(target_width));
    let too_large = limit.sle(bd, &wide_exp);
    // A negative value of magnitude one or more can never round into an
    // unsigned range.
    let zero_e = SBits::zero(bd, cmp_width);
    let whole = zero_e.sle(bd, &wide_exp);
    let too_negative = bd.prop_and(input.sign(), &whole);

    let early = {
        let a = bd.prop_or(&special, &too_large);
        bd.prop_or(&a, &too_negative)
    };
    bd.annotate(&early, Likelihood::Likely);

    let rounded = float_to_bv_core(bd, rm, input, target_width, decimal_point);

    // A small negative that fails to round all the way to zero is also
    // out of range.
    let some_bits = {
        let none = rounded.significand.is_all_zeros(bd);
        bd.prop_not(&none)
    };
    let negative_residue = bd.prop_and(input.sign(), &some_bits);
    let undefined_result = {
        let a = bd.prop_or(&early, &rounded.increment_exponent);
        bd.prop_or(&a, &negative_residue)
    };

    let value = UBits::ite(bd, &undefined_result, undefined, &rounded.significand);
    let defined = bd.prop_not(&undefined_result);
    (value, defined)
}

/// Convert to a signed bit vector of `target_width` bits.
///
/// Returns the caller's `undefined` stand-in, and a false definedness
/// proposition, on NaN, infinities, and overflow; the asymmetric minimum
/// (`-2^(w-1)`) is in range.
pub fn float_to_sbv<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    input: &Unpacked<B>,
    target_width: u32,
    undefined: &SBits<B>,
    decimal_point: u32,
) -> (SBits<B>, B::Prop) {
    assert!(decimal_point < target_width, "decimal point out of range");
    assert_eq!(undefined.width(), target_width, "stand-in width mismatch");
    let exp_width = input.exponent_width();
    let cmp_width = (exp_width + 1).max(bits_to_represent(target_width) + 2);

    let special = bd.prop_or(input.inf(), input.nan());
    let wide_exp = input.exponent().extend(bd, cmp_width - exp_width);
    let limit = SBits::lit(bd, cmp_width, i64::from(target_width));
    let too_large = limit.sle(bd, &wide_exp);
    let early = bd.prop_or(&special, &too_large);
    bd.annotate(&early, Likelihood::Likely);

    // Round the magnitude at full width: anything at or above 2^(w-1) is
    // out of range except the exact minimum.
    let rounded = float_to_bv_core(bd, rm, input, target_width, decimal_point);

    let top_set = rounded.significand.bit(bd, target_width - 1);
    let low_zero = if target_width >= 2 {
        let low = rounded.significand.extract(bd, target_width - 2, 0);
        low.is_all_zeros(bd)
    } else {
        bd.prop(true)
    };
    let exact_minimum = bd.prop_and(input.sign(), &low_zero);
    let magnitude_overflow = {
        let not_min = bd.prop_not(&exact_minimum);
        bd.prop_and(&top_set, &not_min)
    };
    let undefined_result = {
        let a = bd.prop_or(&early, &rounded.increment_exponent);
        bd.prop_or(&a, &magnitude_overflow)
    };

    let signed = rounded.significand.to_signed();
    let negated = conditional_negate_s(bd, input.sign(), &signed);
    let value = SBits::ite(bd, &undefined_result, undefined, &negated);
    let defined = bd.prop_not(&undefined_result);
    (value, defined)
}

/// Decode a concrete two's-complement field into an `i64`.
fn read_signed(bits: &BigUint, width: u32) -> i64 {
    if bits.bit(u64::from(width) - 1) {
        let v = BigInt::from(bits.clone()) - (BigInt::one() << width);
        i64::try_from(&v).expect("field fits a machine word")
    } else {
        i64::try_from(bits).expect("field fits a machine word")
    }
}

/// The exact rational value of a finite concrete float.
///
/// Partial: NaN and infinities take the caller's `undefined` stand-in and
/// report `false`.
pub fn float_to_real(
    fmt: Format,
    value: &Unpacked<Concrete>,
    undefined: &BigRational,
) -> (BigRational, bool) {
    let defined = !value.nan() && !value.inf();
    if !defined {
        return (undefined.clone(), false);
    }
    if *value.zero() {
        return (BigRational::zero(), true);
    }

    let sig = BigInt::from(value.significand().raw().clone());
    let exponent = read_signed(value.exponent().raw(), value.exponent_width());
    // value = sign * sig * 2^(exponent - (s - 1))
    let shift = exponent - (i64::from(fmt.unpacked_significand_width()) - 1);
    let magnitude = if shift >= 0 {
        BigRational::from_integer(sig << shift)
    } else {
        BigRational::new(sig, BigInt::one() << (-shift))
    };
    let signed = if *value.sign() { -magnitude } else { magnitude };
    (signed, true)
}

/// Round an exact rational into a float. This is the constructor the
/// surrounding solver uses to elaborate real literals; it exists only on
/// the concrete evaluator.
pub fn real_to_float(
    bd: &mut Concrete,
    fmt: Format,
    rm: RoundingMode,
    value: &BigRational,
) -> Unpacked<Concrete> {
    let sig_width = fmt.unpacked_significand_width();
    let exp_width = fmt.unpacked_exponent_width();

    if value.is_zero() {
        let pos = bd.prop(false);
        return Unpacked::make_zero(bd, fmt, pos);
    }

    let sign = value.is_negative();
    let magnitude = value.abs();
    let num = magnitude.numer().magnitude().clone();
    let den = magnitude.denom().magnitude().clone();

    // Floor of the base-two logarithm: bit-length estimate, corrected by
    // direct comparison.
    let mut exponent = i64::from(u32::try_from(num.bits()).expect("sane"))
        - i64::from(u32::try_from(den.bits()).expect("sane"));
    let cmp = |e: i64| -> std::cmp::Ordering {
        if e >= 0 {
            num.cmp(&(&den << u64::try_from(e).expect("sane")))
        } else {
            (&num << u64::try_from(-e).expect("sane")).cmp(&den)
        }
    };
    while cmp(exponent) == std::cmp::Ordering::Less {
        exponent -= 1;
    }
    while cmp(exponent + 1) != std::cmp::Ordering::Less {
        exponent += 1;
    }

    // Clamp far outside the format: only the sticky matters out there.
    let clamped = exponent
        .max(fmt.min_subnormal_exponent() - 2)
        .min(fmt.max_normal_exponent() + 1);

    // s + 2 significand bits of num / (den * 2^clamped), plus a sticky.
    let scale = i64::from(sig_width) + 1 - clamped;
    let (shifted_num, shifted_den) = if scale >= 0 {
        (&num << u64::try_from(scale).expect("sane"), den.clone())
    } else {
        (num.clone(), &den << u64::try_from(-scale).expect("sane"))
    };
    let quotient = &shifted_num / &shifted_den;
    let remainder = &shifted_num % &shifted_den;
    let sticky = !remainder.is_zero() || clamped != exponent;

    let low = BigUint::from(u8::from(sticky));
    let sig_value = (quotient | low) & ((BigUint::one() << (sig_width + 2)) - BigUint::one());

    let sign_p = bd.prop(sign);
    let exp_bits = SBits::lit(bd, exp_width + 1, clamped);
    let sig_bits = UBits::from_biguint(bd, sig_width + 2, &sig_value);
    let raw = Unpacked::number(bd, sign_p, exp_bits, sig_bits);
    let mode = bd.rm_const(rm);
    rounder(bd, fmt, &mode, &raw)
}
