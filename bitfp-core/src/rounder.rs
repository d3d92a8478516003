//! Correct rounding from extended precision into a target format.
//!
//! The generic [`rounder`] consumes an unpacked value whose significand is
//! wider than the target (at least guard and sticky beyond the target
//! precision) and whose exponent field is at least as wide as the
//! target's, and produces a well-formed value: rounded at the right
//! position even inside the subnormal range, overflowed to infinity or
//! clamped to the largest normal as the mode directs, and underflowed to
//! zero or the smallest subnormal likewise.
//!
//! Rounding never shifts the significand. The round position is expressed
//! as a variable-width mask over the input bits, so a subnormal result
//! keeps its leading one in place and picks up the low zero bits of the
//! abbreviation for free.

use crate::backend::{Backend, Likelihood};
use crate::bits::{SBits, UBits};
use crate::format::{Format, RoundingMode};
use crate::ops::{collar, conditional_increment_s, order_encode};
use crate::unpacked::{
    max_normal_exponent, min_normal_exponent, min_subnormal_exponent, Unpacked,
};

/// Facts a caller has proved about the value it is rounding.
///
/// Each flag promises a case cannot occur, letting the rounder drop the
/// corresponding branch. The flags are conjoined into the branch
/// conditions, so a literal `true` folds the branch away entirely and a
/// truthful symbolic flag leaves the result identical to the generic
/// rounder's.
pub struct RounderHints<B: Backend> {
    /// The exponent cannot exceed the normal range.
    pub no_overflow: B::Prop,
    /// The exponent cannot fall below the subnormal range.
    pub no_underflow: B::Prop,
    /// The discarded bits are all zero; no increment can fire.
    pub exact: B::Prop,
    /// The increment cannot carry out of the significand.
    pub no_significand_overflow: B::Prop,
    /// Any subnormal result is already exact and abbreviated.
    pub subnormal_exact: B::Prop,
}

impl<B: Backend> Clone for RounderHints<B> {
    fn clone(&self) -> Self {
        Self {
            no_overflow: self.no_overflow.clone(),
            no_underflow: self.no_underflow.clone(),
            exact: self.exact.clone(),
            no_significand_overflow: self.no_significand_overflow.clone(),
            subnormal_exact: self.subnormal_exact.clone(),
        }
    }
}

impl<B: Backend> RounderHints<B> {
    /// No promises: the generic rounder.
    pub fn none(bd: &mut B) -> Self {
        let f = bd.prop(false);
        Self {
            no_overflow: f.clone(),
            no_underflow: f.clone(),
            exact: f.clone(),
            no_significand_overflow: f.clone(),
            subnormal_exact: f,
        }
    }
}

/// Result of rounding a bare significand: the rounded bits and whether the
/// increment carried out (so the exponent must grow by one).
pub struct SigRounded<B: Backend> {
    /// The rounded significand, leading one restored on carry.
    pub significand: UBits<B>,
    /// The increment carried past the top of the kept field.
    pub increment_exponent: B::Prop,
}

/// The five-mode increment decision from the (lsb, guard, sticky) triple.
pub(crate) fn round_up_decision<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    sign: &B::Prop,
    lsb: &B::Prop,
    guard: &B::Prop,
    sticky: &B::Prop,
) -> B::Prop {
    let is_rne = bd.rm_is(rm, RoundingMode::NearestEven);
    let is_rna = bd.rm_is(rm, RoundingMode::NearestAway);
    let is_rtp = bd.rm_is(rm, RoundingMode::TowardPositive);
    let is_rtn = bd.rm_is(rm, RoundingMode::TowardNegative);

    let l_or_s = bd.prop_or(lsb, sticky);
    let rne_up = bd.prop_and(guard, &l_or_s);

    let g_or_s = bd.prop_or(guard, sticky);
    let positive = bd.prop_not(sign);
    let rtp_up = bd.prop_and(&positive, &g_or_s);
    let rtn_up = bd.prop_and(sign, &g_or_s);

    let f = bd.prop(false);
    let on_rtn = bd.ite_prop(&is_rtn, &rtn_up, &f);
    let on_rtp = bd.ite_prop(&is_rtp, &rtp_up, &on_rtn);
    let on_rna = bd.ite_prop(&is_rna, guard, &on_rtp);
    bd.ite_prop(&is_rne, &rne_up, &on_rna)
}

/// Round into the target format with no prior knowledge.
pub fn rounder<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    input: &Unpacked<B>,
) -> Unpacked<B> {
    let hints = RounderHints::none(bd);
    rounder_with_hints(bd, fmt, rm, input, &hints)
}

/// Round into the target format, eliding the branches the hints rule out.
pub fn rounder_with_hints<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    input: &Unpacked<B>,
    hints: &RounderHints<B>,
) -> Unpacked<B> {
    let target_sig_width = fmt.unpacked_significand_width();
    let target_exp_width = fmt.unpacked_exponent_width();
    let sig_width = input.significand_width();
    let exp_width = input.exponent_width();
    assert!(
        sig_width >= target_sig_width + 2,
        "rounder input must carry guard and sticky bits"
    );
    assert!(
        exp_width >= target_exp_width,
        "rounder input exponent is narrower than the target"
    );

    let sign = input.sign().clone();

    // Exponent work happens one bit wider so the distance to the normal
    // range cannot wrap.
    let cmp_width = exp_width + 1;
    let exponent = input.exponent().extend(bd, 1);
    let e_min = min_normal_exponent(bd, fmt, cmp_width);
    let e_max = max_normal_exponent(bd, fmt, cmp_width);

    // Distance below the normal range; positive only for subnormals.
    let k_raw = e_min.sub(bd, &exponent);
    let zero_k = SBits::zero(bd, cmp_width);
    let s_lit = SBits::lit(bd, cmp_width, i64::from(target_sig_width));
    let k_positive = k_raw.sgt(bd, &zero_k);

    // Past the point where even the guard bit falls off the significand the
    // result can only be zero or the smallest subnormal.
    let deep_raw = k_raw.sgt(bd, &s_lit);
    let may_underflow = bd.prop_not(&hints.no_underflow);
    let deep = bd.prop_and(&deep_raw, &may_underflow);
    bd.annotate(&deep, Likelihood::VeryUnlikely);

    let k = collar(bd, &k_raw, &zero_k, &s_lit);
    // With exact subnormals the variable round position collapses to the
    // fixed guard position.
    let k_for_masks = SBits::ite(bd, &hints.subnormal_exact, &zero_k, &k);

    // Two working bits above the input significand: room for the increment
    // at the highest round position and its carry.
    let work_width = sig_width + 2;
    let sig = input.significand().extend(bd, 2);

    // discard = (sig_width - target_sig_width) + k bits are dropped; the
    // guard sits just below them, the sticky gathers everything under it.
    let discard_base = sig_width - target_sig_width;
    let k_u = k_for_masks.to_unsigned().resize(bd, work_width);
    let base = UBits::lit(bd, work_width, u64::from(discard_base));
    let discard = k_u.add(bd, &base);
    let discard_m1 = discard.decrement(bd);

    let above_guard = sig.lshr(bd, &discard);
    let lsb = above_guard.bit(bd, 0);
    let at_guard = sig.lshr(bd, &discard_m1);
    let guard = at_guard.bit(bd, 0);

    let sticky_mask = order_encode(bd, &discard_m1, work_width);
    let sticky_bits = sig.and(bd, &sticky_mask);
    let sticky_zero = sticky_bits.is_all_zeros(bd);
    let sticky = bd.prop_not(&sticky_zero);

    let wants_up = round_up_decision(bd, rm, &sign, &lsb, &guard, &sticky);
    let may_round = bd.prop_not(&hints.exact);
    let round_up = bd.prop_and(&wants_up, &may_round);

    // Truncate below the round position, then add one unit there.
    let trunc_mask = order_encode(bd, &discard, work_width);
    let keep_mask = trunc_mask.not(bd);
    let kept = sig.and(bd, &keep_mask);
    let one = UBits::one(bd, work_width);
    let unit = one.shl(bd, &discard);
    let zero_w = UBits::zero(bd, work_width);
    let increment = UBits::ite(bd, &round_up, &unit, &zero_w);
    let rounded = kept.add(bd, &increment);

    let carry_raw = rounded.bit(bd, sig_width);
    let may_carry = bd.prop_not(&hints.no_significand_overflow);
    let carried = bd.prop_and(&carry_raw, &may_carry);
    bd.annotate(&carried, Likelihood::Unlikely);

    let plain_sig = rounded.extract(bd, sig_width - 1, discard_base);
    let carried_sig = rounded.extract(bd, sig_width, discard_base + 1);
    let result_sig = UBits::ite(bd, &carried, &carried_sig, &plain_sig);

    // A subnormal keeps the exponent that matches its alignment; the carry
    // bumps either case by one.
    let e_min_minus_k = e_min.sub(bd, &k);
    let not_sub_exact = bd.prop_not(&hints.subnormal_exact);
    let use_aligned = bd.prop_and(&k_positive, &not_sub_exact);
    let exp_base = SBits::ite(bd, &use_aligned, &e_min_minus_k, &exponent);
    let exp_rounded = conditional_increment_s(bd, &carried, &exp_base);

    let overflow_raw = exp_rounded.sgt(bd, &e_max);
    let may_overflow = bd.prop_not(&hints.no_overflow);
    let overflow = bd.prop_and(&overflow_raw, &may_overflow);
    bd.annotate(&overflow, Likelihood::Unlikely);

    // Where the extremes land depends on the mode and the sign.
    let is_rne = bd.rm_is(rm, RoundingMode::NearestEven);
    let is_rna = bd.rm_is(rm, RoundingMode::NearestAway);
    let is_rtp = bd.rm_is(rm, RoundingMode::TowardPositive);
    let is_rtn = bd.rm_is(rm, RoundingMode::TowardNegative);
    let positive = bd.prop_not(&sign);
    let rtp_away = bd.prop_and(&is_rtp, &positive);
    let rtn_away = bd.prop_and(&is_rtn, &sign);
    let away = bd.prop_or(&rtp_away, &rtn_away);
    let nearest = bd.prop_or(&is_rne, &is_rna);
    let to_inf = bd.prop_or(&nearest, &away);

    let exp_final = exp_rounded.resize(bd, target_exp_width);
    let numeric = Unpacked::number(bd, sign.clone(), exp_final, result_sig.clone());

    let zero_res = Unpacked::make_zero(bd, fmt, sign.clone());
    let inf_res = Unpacked::make_inf(bd, fmt, sign.clone());
    let nan_res = Unpacked::make_nan(bd, fmt);

    let min_sub_exp = min_subnormal_exponent(bd, fmt, target_exp_width);
    let min_sub_sig = UBits::leading_one(bd, target_sig_width);
    let min_sub = Unpacked::number(bd, sign.clone(), min_sub_exp, min_sub_sig);

    let max_exp = max_normal_exponent(bd, fmt, target_exp_width);
    let max_sig = UBits::all_ones(bd, target_sig_width);
    let max_normal = Unpacked::number(bd, sign, max_exp, max_sig);

    // Everything truncated away: a clean zero.
    let sig_vanished = result_sig.is_all_zeros(bd);
    let with_zero = Unpacked::ite(bd, &sig_vanished, &zero_res, &numeric);

    let at_overflow = Unpacked::ite(bd, &to_inf, &inf_res, &max_normal);
    let with_overflow = Unpacked::ite(bd, &overflow, &at_overflow, &with_zero);

    // Deep underflow: the guard bit itself fell off, so the value rounds
    // to zero except under a directed mode pointing away from it.
    let at_deep = Unpacked::ite(bd, &away, &min_sub, &zero_res);
    let with_deep = Unpacked::ite(bd, &deep, &at_deep, &with_overflow);

    // Flagged inputs ride through on their default payloads.
    let with_flagged_zero = Unpacked::ite(bd, input.zero(), &zero_res, &with_deep);
    let with_flagged_inf = Unpacked::ite(bd, input.inf(), &inf_res, &with_flagged_zero);
    Unpacked::ite(bd, input.nan(), &nan_res, &with_flagged_inf)
}

/// Round a bare significand at a fixed bit position.
///
/// Keeps the top `keep` bits of `x`, rounding at the boundary. Used by the
/// float-to-bit-vector conversions, where the kept field is the candidate
/// integer.
pub fn fixed_position_round<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    sign: &B::Prop,
    x: &UBits<B>,
    keep: u32,
) -> SigRounded<B> {
    let width = x.width();
    assert!(keep >= 1 && keep < width, "nothing to round at this position");
    let discard = width - keep;

    let guard = x.bit(bd, discard - 1);
    let lsb = x.bit(bd, discard);
    let sticky = if discard >= 2 {
        let low = x.extract(bd, discard - 2, 0);
        let low_zero = low.is_all_zeros(bd);
        bd.prop_not(&low_zero)
    } else {
        bd.prop(false)
    };

    let round_up = round_up_decision(bd, rm, sign, &lsb, &guard, &sticky);

    let kept = x.extract(bd, width - 1, discard).extend(bd, 1);
    let one = UBits::one(bd, keep + 1);
    let zero = UBits::zero(bd, keep + 1);
    let increment = UBits::ite(bd, &round_up, &one, &zero);
    let rounded = kept.add(bd, &increment);

    let carry = rounded.bit(bd, keep);
    let plain = rounded.extract(bd, keep - 1, 0);
    let restored = UBits::leading_one(bd, keep);
    let significand = UBits::ite(bd, &carry, &restored, &plain);

    SigRounded {
        significand,
        increment_exponent: carry,
    }
}

/// Round a bare significand at a variable bit position.
///
/// The result keeps the bits of `x` at and above `position` (which may be
/// anywhere in `[0, width + 1]`), with the low bits zeroed; rounding past
/// the top restores a single leading one and reports the carry. Used by
/// round-to-integral.
pub fn variable_position_round<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    sign: &B::Prop,
    x: &UBits<B>,
    position: &UBits<B>,
) -> SigRounded<B> {
    let width = x.width();
    // One low bit so position zero has an (empty) guard, two high bits for
    // the increment at the highest position and its carry.
    let low = UBits::zero(bd, 1);
    let padded = x.append(bd, &low).extend(bd, 2);
    let work_width = width + 3;

    let pos = position.resize(bd, work_width);
    let pos_p1 = pos.increment(bd);

    let at_guard = padded.lshr(bd, &pos);
    let guard = at_guard.bit(bd, 0);
    let above = padded.lshr(bd, &pos_p1);
    let lsb = above.bit(bd, 0);

    let sticky_mask = order_encode(bd, &pos, work_width);
    let sticky_bits = padded.and(bd, &sticky_mask);
    let sticky_zero = sticky_bits.is_all_zeros(bd);
    let sticky = bd.prop_not(&sticky_zero);

    let round_up = round_up_decision(bd, rm, sign, &lsb, &guard, &sticky);

    let trunc_mask = order_encode(bd, &pos_p1, work_width);
    let keep_mask = trunc_mask.not(bd);
    let kept = padded.and(bd, &keep_mask);
    let one = UBits::one(bd, work_width);
    let unit = one.shl(bd, &pos_p1);
    let zero = UBits::zero(bd, work_width);
    let increment = UBits::ite(bd, &round_up, &unit, &zero);
    let rounded = kept.add(bd, &increment);

    // Any bit above the original top bit means the round crossed a power
    // of two; the value is then exactly one at the next exponent.
    let high = rounded.extract(bd, width + 2, width + 1);
    let high_zero = high.is_all_zeros(bd);
    let carry = bd.prop_not(&high_zero);

    let plain = rounded.extract(bd, width, 1);
    let restored = UBits::leading_one(bd, width);
    let significand = UBits::ite(bd, &carry, &restored, &plain);

    SigRounded {
        significand,
        increment_exponent: carry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::Concrete;

    /// Drive the rounder directly: value = significand / 2^(s+1) * 2^exp
    /// in an extended format two sig bits and one exp bit wider.
    fn round_binary32(sig: u64, exp: i64, rm: RoundingMode) -> (i64, u64, bool, bool) {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let ew = fmt.unpacked_exponent_width() + 1;
        let sign = bd.prop(false);
        let e = SBits::lit(bd, ew, exp);
        let s = UBits::lit(bd, 26, sig);
        let input = Unpacked::number(bd, sign, e, s);
        let rmv = bd.rm_const(rm);
        let out = rounder(bd, fmt, &rmv, &input);
        let ow = fmt.unpacked_exponent_width();
        let ov = u64::try_from(out.exponent().raw()).expect("fits");
        let oe = if ov >= 1 << (ow - 1) {
            ov as i64 - (1i64 << ow)
        } else {
            ov as i64
        };
        let os = u64::try_from(out.significand().raw()).expect("fits");
        (oe, os, out.zero().to_owned(), out.inf().to_owned())
    }

    #[test]
    fn exact_values_pass_through() {
        // 1.0 with zero guard and sticky.
        let (e, s, z, i) = round_binary32(1 << 25, 0, RoundingMode::NearestEven);
        assert_eq!((e, s, z, i), (0, 1 << 23, false, false));
    }

    #[test]
    fn ties_go_to_even() {
        // 1.0 + half an ulp exactly: guard set, sticky clear.
        let (e, s, _, _) = round_binary32((1 << 25) | 0b10, 0, RoundingMode::NearestEven);
        assert_eq!((e, s), (0, 1 << 23));
        // One past the tie rounds up.
        let (e, s, _, _) = round_binary32((1 << 25) | 0b11, 0, RoundingMode::NearestEven);
        assert_eq!((e, s), (0, (1 << 23) + 1));
    }

    #[test]
    fn overflow_honours_the_mode() {
        // All-ones significand just past the largest normal exponent.
        let sig = (1u64 << 26) - 1;
        let (_, _, _, inf) = round_binary32(sig, 127, RoundingMode::NearestEven);
        assert!(inf);
        let (e, s, _, inf) = round_binary32(sig, 127, RoundingMode::TowardZero);
        assert!(!inf);
        assert_eq!((e, s), (127, (1 << 24) - 1));
    }

    #[test]
    fn deep_underflow_rounds_to_zero_or_min_subnormal() {
        let sig = 1u64 << 25; // 1.0
        let (_, _, zero, _) = round_binary32(sig, -200, RoundingMode::NearestEven);
        assert!(zero);
        let (e, s, zero, _) = round_binary32(sig, -200, RoundingMode::TowardPositive);
        assert!(!zero);
        assert_eq!((e, s), (-149, 1 << 23));
    }

    #[test]
    fn subnormal_results_keep_their_abbreviation() {
        // 1.1b at exponent -130: four bits below the normal range.
        let sig = (1u64 << 25) | (1 << 24);
        let (e, s, zero, _) = round_binary32(sig, -130, RoundingMode::NearestEven);
        assert!(!zero);
        assert_eq!(e, -130);
        // The low four bits of the significand must be clear.
        assert_eq!(s & 0b1111, 0);
        assert_eq!(s, (1 << 23) | (1 << 22));
    }
}
