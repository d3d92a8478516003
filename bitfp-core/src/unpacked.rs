//! The working representation of a floating-point number.
//!
//! Unpacked values differ from the packed interchange form in four ways:
//! explicit flags for NaN, infinity and zero; an unbiased signed exponent;
//! an explicit hidden bit; and normalised subnormals. This uniformity is
//! what keeps the encoders compact: every finite non-zero value has a
//! leading one, and the special values carry a default exponent and
//! significand that also happen to be the valid normal 1.0, so they pass
//! through arithmetic without extra guards.

use crate::backend::Backend;
use crate::bits::{SBits, UBits};
use crate::format::Format;
use crate::ops::order_encode;

/// Largest power of two strictly below `x` (for `x >= 2`).
pub(crate) fn previous_power_of_two(x: u32) -> u32 {
    debug_assert!(x >= 2);
    let mut power = 1;
    while power * 2 < x {
        power *= 2;
    }
    power
}

/// The format's smallest normal exponent as a constant of `width` bits.
pub fn min_normal_exponent<B: Backend>(bd: &mut B, fmt: Format, width: u32) -> SBits<B> {
    SBits::lit(bd, width, fmt.min_normal_exponent())
}

/// The format's largest normal exponent as a constant of `width` bits.
pub fn max_normal_exponent<B: Backend>(bd: &mut B, fmt: Format, width: u32) -> SBits<B> {
    SBits::lit(bd, width, fmt.max_normal_exponent())
}

/// The format's largest (normalised) subnormal exponent at `width` bits.
pub fn max_subnormal_exponent<B: Backend>(bd: &mut B, fmt: Format, width: u32) -> SBits<B> {
    SBits::lit(bd, width, fmt.max_subnormal_exponent())
}

/// The format's smallest (normalised) subnormal exponent at `width` bits.
pub fn min_subnormal_exponent<B: Backend>(bd: &mut B, fmt: Format, width: u32) -> SBits<B> {
    SBits::lit(bd, width, fmt.min_subnormal_exponent())
}

/// An unpacked floating-point value over back-end `B`.
pub struct Unpacked<B: Backend> {
    nan: B::Prop,
    inf: B::Prop,
    zero: B::Prop,
    sign: B::Prop,
    exponent: SBits<B>,
    significand: UBits<B>,
}

impl<B: Backend> Clone for Unpacked<B> {
    fn clone(&self) -> Self {
        Self {
            nan: self.nan.clone(),
            inf: self.inf.clone(),
            zero: self.zero.clone(),
            sign: self.sign.clone(),
            exponent: self.exponent.clone(),
            significand: self.significand.clone(),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Unpacked<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unpacked")
            .field("nan", &self.nan)
            .field("inf", &self.inf)
            .field("zero", &self.zero)
            .field("sign", &self.sign)
            .field("exponent", &self.exponent)
            .field("significand", &self.significand)
            .finish()
    }
}

impl<B: Backend> Unpacked<B> {
    /// Assemble from raw parts. Only the field-wise `ite` and the
    /// back-ends have business calling this.
    pub(crate) fn from_parts(
        nan: B::Prop,
        inf: B::Prop,
        zero: B::Prop,
        sign: B::Prop,
        exponent: SBits<B>,
        significand: UBits<B>,
    ) -> Self {
        Self {
            nan,
            inf,
            zero,
            sign,
            exponent,
            significand,
        }
    }

    /// A finite non-zero number: all flags clear.
    pub fn number(bd: &mut B, sign: B::Prop, exponent: SBits<B>, significand: UBits<B>) -> Self {
        let f = bd.prop(false);
        Self::from_parts(f.clone(), f.clone(), f, sign, exponent, significand)
    }

    /// The default exponent carried by special values: zero.
    pub fn default_exponent(bd: &mut B, width: u32) -> SBits<B> {
        SBits::zero(bd, width)
    }

    /// The default significand carried by special values: 1.0.
    pub fn default_significand(bd: &mut B, width: u32) -> UBits<B> {
        UBits::leading_one(bd, width)
    }

    pub(crate) fn nan_with_widths(bd: &mut B, exp_width: u32, sig_width: u32) -> Self {
        let t = bd.prop(true);
        let f = bd.prop(false);
        let exponent = Self::default_exponent(bd, exp_width);
        let significand = Self::default_significand(bd, sig_width);
        Self::from_parts(t, f.clone(), f.clone(), f, exponent, significand)
    }

    pub(crate) fn inf_with_widths(
        bd: &mut B,
        exp_width: u32,
        sig_width: u32,
        sign: B::Prop,
    ) -> Self {
        let t = bd.prop(true);
        let f = bd.prop(false);
        let exponent = Self::default_exponent(bd, exp_width);
        let significand = Self::default_significand(bd, sig_width);
        Self::from_parts(f.clone(), t, f, sign, exponent, significand)
    }

    pub(crate) fn zero_with_widths(
        bd: &mut B,
        exp_width: u32,
        sig_width: u32,
        sign: B::Prop,
    ) -> Self {
        let t = bd.prop(true);
        let f = bd.prop(false);
        let exponent = Self::default_exponent(bd, exp_width);
        let significand = Self::default_significand(bd, sig_width);
        Self::from_parts(f.clone(), f, t, sign, exponent, significand)
    }

    /// The canonical quiet NaN of a format.
    pub fn make_nan(bd: &mut B, fmt: Format) -> Self {
        Self::nan_with_widths(
            bd,
            fmt.unpacked_exponent_width(),
            fmt.unpacked_significand_width(),
        )
    }

    /// A signed infinity.
    pub fn make_inf(bd: &mut B, fmt: Format, sign: B::Prop) -> Self {
        Self::inf_with_widths(
            bd,
            fmt.unpacked_exponent_width(),
            fmt.unpacked_significand_width(),
            sign,
        )
    }

    /// A signed zero.
    pub fn make_zero(bd: &mut B, fmt: Format, sign: B::Prop) -> Self {
        Self::zero_with_widths(
            bd,
            fmt.unpacked_exponent_width(),
            fmt.unpacked_significand_width(),
            sign,
        )
    }

    /// NaN flag.
    pub fn nan(&self) -> &B::Prop {
        &self.nan
    }

    /// Infinity flag.
    pub fn inf(&self) -> &B::Prop {
        &self.inf
    }

    /// Zero flag.
    pub fn zero(&self) -> &B::Prop {
        &self.zero
    }

    /// Sign bit; 1 means negative. NaN carries sign 0.
    pub fn sign(&self) -> &B::Prop {
        &self.sign
    }

    /// Unbiased exponent.
    pub fn exponent(&self) -> &SBits<B> {
        &self.exponent
    }

    /// Significand with the hidden bit explicit.
    pub fn significand(&self) -> &UBits<B> {
        &self.significand
    }

    /// Width of the exponent field.
    pub fn exponent_width(&self) -> u32 {
        self.exponent.width()
    }

    /// Width of the significand field.
    pub fn significand_width(&self) -> u32 {
        self.significand.width()
    }

    /// Copy with the sign replaced; NaN keeps its fixed sign.
    pub fn with_sign(&self, bd: &mut B, sign: &B::Prop) -> Self {
        let kept = bd.ite_prop(&self.nan, &self.sign, sign);
        Self::from_parts(
            self.nan.clone(),
            self.inf.clone(),
            self.zero.clone(),
            kept,
            self.exponent.clone(),
            self.significand.clone(),
        )
    }

    /// Widen into an extended format: `exp_extra` more exponent bits and
    /// `sig_extra` more (low, zero) significand bits. Exact.
    pub fn extend(&self, bd: &mut B, exp_extra: u32, sig_extra: u32) -> Self {
        let exponent = self.exponent.extend(bd, exp_extra);
        let significand = self.significand.extend(bd, sig_extra).shl_lit(bd, sig_extra);
        Self::from_parts(
            self.nan.clone(),
            self.inf.clone(),
            self.zero.clone(),
            self.sign.clone(),
            exponent,
            significand,
        )
    }

    /// Move the leading one up to the top of the significand, adjusting
    /// the exponent to match.
    ///
    /// A logarithmic ladder: for each power of two below the significand
    /// width, shift left by that power when the corresponding top bits are
    /// all zero. The shifts are modular because an unconditional shift
    /// would destroy data in the branches where it is not selected.
    pub fn normalise_up(&self, bd: &mut B) -> Self {
        let sig_width = self.significand.width();
        let exp_width = self.exponent.width();

        let mut significand = self.significand.clone();
        let mut exponent = self.exponent.clone();

        let mut power = previous_power_of_two(sig_width);
        while power != 0 {
            let rem = sig_width - power;
            let mask_value = ((num_bigint::BigUint::from(1u8) << power)
                - num_bigint::BigUint::from(1u8))
                << rem;
            let mask = UBits::from_biguint(bd, sig_width, &mask_value);
            let top = mask.and(bd, &significand);
            let shift_needed = top.is_all_zeros(bd);

            let shifted = significand.shl_lit(bd, power);
            significand = UBits::ite(bd, &shift_needed, &shifted, &significand);

            let step = SBits::lit(bd, exp_width, i64::from(power));
            let reduced = exponent.sub(bd, &step);
            exponent = SBits::ite(bd, &shift_needed, &reduced, &exponent);

            power >>= 1;
        }

        Self::from_parts(
            self.nan.clone(),
            self.inf.clone(),
            self.zero.clone(),
            self.sign.clone(),
            exponent,
            significand,
        )
    }

    /// Normalise up, mapping an all-zero significand to a true zero
    /// instead of garbage. Used by the integer-to-float conversions.
    pub fn normalise_up_detect_zero(&self, bd: &mut B) -> Self {
        let is_zero = self.significand.is_all_zeros(bd);
        let normalised = self.normalise_up(bd);
        let zero = Self::zero_with_widths(
            bd,
            self.exponent.width(),
            self.significand.width(),
            self.sign.clone(),
        );
        Self::ite(bd, &is_zero, &zero, &normalised)
    }

    /// Is the exponent within the format's normal range?
    pub fn in_normal_range(&self, bd: &mut B, fmt: Format) -> B::Prop {
        let w = self.exponent.width();
        let lo = min_normal_exponent(bd, fmt, w);
        let hi = max_normal_exponent(bd, fmt, w);
        let above = lo.sle(bd, &self.exponent);
        let below = self.exponent.sle(bd, &hi);
        bd.prop_and(&above, &below)
    }

    /// Is the exponent within the format's (normalised) subnormal range?
    pub fn in_subnormal_range(&self, bd: &mut B, fmt: Format) -> B::Prop {
        let w = self.exponent.width();
        let lo = min_subnormal_exponent(bd, fmt, w);
        let hi = max_subnormal_exponent(bd, fmt, w);
        let above = lo.sle(bd, &self.exponent);
        let below = self.exponent.sle(bd, &hi);
        bd.prop_and(&above, &below)
    }

    /// How far below the normal range the exponent sits; zero outside the
    /// subnormal range.
    pub fn subnormal_amount(&self, bd: &mut B, fmt: Format) -> SBits<B> {
        let w = self.exponent.width();
        let in_range = self.in_subnormal_range(bd, fmt);
        let min_normal = min_normal_exponent(bd, fmt, w);
        let amount = min_normal.sub(bd, &self.exponent);
        let zero = SBits::zero(bd, w);
        SBits::ite(bd, &in_range, &amount, &zero)
    }

    /// Positive infinity test.
    pub fn is_positive_inf(&self, bd: &mut B) -> B::Prop {
        let pos = bd.prop_not(&self.sign);
        bd.prop_and(&self.inf, &pos)
    }

    /// Negative infinity test.
    pub fn is_negative_inf(&self, bd: &mut B) -> B::Prop {
        bd.prop_and(&self.inf, &self.sign)
    }

    /// The well-formedness invariant for this format.
    ///
    /// Exactly one of the five cases holds: NaN, infinity or zero with the
    /// default payload; a normal with a leading one; or a subnormal with a
    /// leading one and the low bits of the abbreviation zeroed. This does
    /// not hold at every intermediate point inside the encoders, only at
    /// their boundaries.
    pub fn is_valid(&self, bd: &mut B, fmt: Format) -> B::Prop {
        let exp_width = fmt.unpacked_exponent_width();
        let sig_width = fmt.unpacked_significand_width();
        assert_eq!(exp_width, self.exponent.width(), "exponent width mismatch");
        assert_eq!(
            sig_width,
            self.significand.width(),
            "significand width mismatch"
        );

        let leading = UBits::leading_one(bd, sig_width);
        let masked = leading.and(bd, &self.significand);
        let no_leading = masked.is_all_zeros(bd);
        let has_leading_one = bd.prop_not(&no_leading);

        // Subnormals must not carry more precision than their exponent
        // admits: the low `subnormal_amount` bits are zero.
        let amount = self.subnormal_amount(bd, fmt).to_unsigned();
        let trimmed = amount.resize(bd, sig_width + 1);
        let mask = order_encode(bd, &trimmed, sig_width);
        let below = mask.and(bd, &self.significand);
        let correctly_abbreviated = below.is_all_zeros(bd);

        let in_normal = self.in_normal_range(bd, fmt);
        let in_subnormal = self.in_subnormal_range(bd, fmt);

        let not_nan = bd.prop_not(&self.nan);
        let not_inf = bd.prop_not(&self.inf);
        let not_zero = bd.prop_not(&self.zero);
        let not_sign = bd.prop_not(&self.sign);

        let no_flags = {
            let a = bd.prop_and(&not_nan, &not_inf);
            bd.prop_and(&a, &not_zero)
        };

        let normal_case = {
            let a = bd.prop_and(&no_flags, &in_normal);
            bd.prop_and(&a, &has_leading_one)
        };
        let subnormal_case = {
            let a = bd.prop_and(&no_flags, &in_subnormal);
            let b = bd.prop_and(&a, &has_leading_one);
            bd.prop_and(&b, &correctly_abbreviated)
        };

        let default_exp = Self::default_exponent(bd, exp_width);
        let default_sig = Self::default_significand(bd, sig_width);
        let exp_is_default = self.exponent.eq(bd, &default_exp);
        let sig_is_default = self.significand.eq(bd, &default_sig);
        let defaults = bd.prop_and(&exp_is_default, &sig_is_default);

        let nan_case = {
            let a = bd.prop_and(&self.nan, &not_inf);
            let b = bd.prop_and(&a, &not_zero);
            let c = bd.prop_and(&b, &defaults);
            bd.prop_and(&c, &not_sign)
        };
        let inf_case = {
            let a = bd.prop_and(&not_nan, &self.inf);
            let b = bd.prop_and(&a, &not_zero);
            bd.prop_and(&b, &defaults)
        };
        let zero_case = {
            let a = bd.prop_and(&not_nan, &not_inf);
            let b = bd.prop_and(&a, &self.zero);
            bd.prop_and(&b, &defaults)
        };

        let specials = {
            let a = bd.prop_or(&nan_case, &inf_case);
            bd.prop_or(&a, &zero_case)
        };
        let numbers = bd.prop_or(&normal_case, &subnormal_case);
        bd.prop_or(&specials, &numbers)
    }

    /// Field-wise select between two values of identical widths.
    pub fn ite(bd: &mut B, cond: &B::Prop, l: &Self, r: &Self) -> Self {
        let nan = bd.ite_prop(cond, &l.nan, &r.nan);
        let inf = bd.ite_prop(cond, &l.inf, &r.inf);
        let zero = bd.ite_prop(cond, &l.zero, &r.zero);
        let sign = bd.ite_prop(cond, &l.sign, &r.sign);
        let exponent = SBits::ite(bd, cond, &l.exponent, &r.exponent);
        let significand = UBits::ite(bd, cond, &l.significand, &r.significand);
        Self::from_parts(nan, inf, zero, sign, exponent, significand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::Concrete;

    #[test]
    fn special_values_satisfy_the_invariant() {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let t = bd.prop(true);
        let nan = Unpacked::make_nan(bd, fmt);
        let inf = Unpacked::make_inf(bd, fmt, t);
        let f = bd.prop(false);
        let zero = Unpacked::make_zero(bd, fmt, f);
        assert!(nan.is_valid(bd, fmt));
        assert!(inf.is_valid(bd, fmt));
        assert!(zero.is_valid(bd, fmt));
    }

    #[test]
    fn normalise_up_moves_the_leading_one() {
        let bd = &mut Concrete;
        let fmt = Format::new(4, 6);
        let sign = bd.prop(false);
        let exp = SBits::lit(bd, fmt.unpacked_exponent_width(), 0);
        let sig = UBits::lit(bd, 6, 0b000101);
        let raw = Unpacked::number(bd, sign, exp, sig);
        let n = raw.normalise_up(bd);
        let want_sig = UBits::lit(bd, 6, 0b101000);
        let want_exp = SBits::lit(bd, fmt.unpacked_exponent_width(), -3);
        assert!(n.significand().eq(bd, &want_sig));
        assert!(n.exponent().eq(bd, &want_exp));
    }

    #[test]
    fn subnormal_abbreviation_is_checked() {
        let bd = &mut Concrete;
        let fmt = Format::new(4, 4);
        let ew = fmt.unpacked_exponent_width();
        let sign = bd.prop(false);
        // Exponent two below the normal range: the low two bits must be 0.
        let exp = SBits::lit(bd, ew, fmt.min_normal_exponent() - 2);
        let good = UBits::lit(bd, 4, 0b1000);
        let bad = UBits::lit(bd, 4, 0b1010);
        let ok = Unpacked::number(bd, sign.clone(), exp.clone(), good);
        let not_ok = Unpacked::number(bd, sign, exp, bad);
        assert!(ok.is_valid(bd, fmt));
        assert!(!not_ok.is_valid(bd, fmt));
    }
}
