//! Addition and subtraction.
//!
//! A single-path adder: order the operands, align the smaller significand
//! with a sticky shift, add or subtract in extended precision, then patch
//! up the three outcomes (carry out, one-bit cancellation, major
//! cancellation) before rounding. The exponent-difference analysis also
//! yields a set of facts the rounder can elide branches with: an effective
//! subtraction cannot overflow, addition never underflows, and any
//! subnormal it produces is exact.

use crate::backend::{Backend, Likelihood};
use crate::bits::{SBits, UBits};
use crate::format::{Format, RoundingMode};
use crate::ops::{
    conditional_decrement_s, conditional_increment_s, conditional_left_shift_one_u,
    conditional_negate_u, conditional_right_shift_one_u, right_shift_sticky_bit, smax, smin,
};
use crate::rounder::{rounder_with_hints, RounderHints};
use crate::sign::negate;
use crate::unpacked::Unpacked;

/// The arithmetic core: correct only for finite inputs; special values are
/// spliced in afterwards by [`add_special_cases`]. Returns the over-precise
/// sum in the extended format together with the rounder facts.
///
/// Widths come from the operands, so the same core also serves the fused
/// multiply-add at doubled precision. The rounding mode is needed here
/// only to give an exact-zero sum the right sign.
pub(crate) fn arithmetic_add<B: Backend>(
    bd: &mut B,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
    is_add: &B::Prop,
) -> (Unpacked<B>, RounderHints<B>) {
    assert_eq!(left.significand_width(), right.significand_width());
    assert_eq!(left.exponent_width(), right.exponent_width());
    let sig_width = left.significand_width();
    let cmp_width = left.exponent_width() + 1;
    let sum_width = sig_width + 3;

    let sign_diff = bd.prop_xor(left.sign(), right.sign());
    let effective_add = bd.prop_xor(&sign_diff, is_add);

    // Exponent distance, one bit wider so it cannot wrap.
    let left_exp = left.exponent().extend(bd, 1);
    let right_exp = right.exponent().extend(bd, 1);
    let max_exp = smax(bd, &left_exp, &right_exp);
    let min_exp = smin(bd, &left_exp, &right_exp);
    let difference = max_exp.sub(bd, &min_exp);

    let zero_e = SBits::zero(bd, cmp_width);
    let one_e = SBits::one(bd, cmp_width);
    let precision = SBits::lit(bd, cmp_width, i64::from(sig_width));
    let diff_is_zero = difference.eq(bd, &zero_e);
    let diff_is_one = difference.eq(bd, &one_e);
    let diff_past_precision = precision.slt(bd, &difference);
    bd.annotate(&diff_is_zero, Likelihood::Unlikely);
    bd.annotate(&diff_is_one, Likelihood::Unlikely);
    bd.annotate(&diff_past_precision, Likelihood::Likely);

    // Facts for the rounder.
    let no_overflow = bd.prop_not(&effective_add);
    let no_underflow = bd.prop(true);
    let subnormal_exact = bd.prop(true);
    let diff_at_most_one = bd.prop_or(&diff_is_zero, &diff_is_one);
    let no_significand_overflow = {
        let eff_sub = bd.prop_not(&effective_add);
        let on_add = bd.prop_and(&effective_add, &diff_is_zero);
        let on_sub = bd.prop_and(&eff_sub, &diff_at_most_one);
        bd.prop_or(&on_add, &on_sub)
    };
    let sticky_is_zero = diff_at_most_one.clone();

    // Order the operands by magnitude.
    let left_exp_is_max = left_exp.eq(bd, &max_exp);
    let left_sig_ge = right.significand().ule(bd, left.significand());
    let not_diff_zero = bd.prop_not(&diff_is_zero);
    let wins_tie = bd.prop_or(&not_diff_zero, &left_sig_ge);
    let left_larger = bd.prop_and(&left_exp_is_max, &wins_tie);

    // Room for a carry above, guard and sticky below.
    let pad = UBits::zero(bd, 2);
    let larger_sig = UBits::ite(bd, &left_larger, left.significand(), right.significand());
    let smaller_sig = UBits::ite(bd, &left_larger, right.significand(), left.significand());
    let lsig = larger_sig.extend(bd, 1).append(bd, &pad);
    let ssig = smaller_sig.extend(bd, 1).append(bd, &pad);

    let flipped_right = {
        let not_add = bd.prop_not(is_add);
        bd.prop_xor(&not_add, right.sign())
    };
    let result_sign = bd.ite_prop(&left_larger, left.sign(), &flipped_right);

    // Negate before the shift so sign extension does the bookkeeping.
    let eff_sub = bd.prop_not(&effective_add);
    let negated_smaller = conditional_negate_u(bd, &eff_sub, &ssig);

    let shift_amount = difference.to_unsigned().resize(bd, sum_width);

    // Fast path for no overlap at all (one past the guard bit): the
    // smaller operand collapses to a sticky contribution.
    let far_limit = SBits::lit(bd, cmp_width, i64::from(sig_width + 1));
    let far = far_limit.slt(bd, &difference);
    let zeros = UBits::zero(bd, sum_width);
    let ones = UBits::all_ones(bd, sum_width);
    let vanished = UBits::ite(bd, &effective_add, &zeros, &ones);
    let aligned = negated_smaller.ashr(bd, &shift_amount);
    let negated_aligned_smaller = UBits::ite(bd, &far, &vanished, &aligned);

    let shift_sticky = right_shift_sticky_bit(bd, &negated_smaller, &shift_amount);
    let one_w = UBits::one(bd, sum_width);
    let shifted_sticky = UBits::ite(bd, &diff_past_precision, &one_w, &shift_sticky);

    // The sum and its three shapes.
    let sum = lsig.add(bd, &negated_aligned_smaller);

    let top_bit = sum.bit(bd, sum_width - 1);
    let aligned_bit = sum.bit(bd, sum_width - 2);
    let lower_bit = sum.bit(bd, sum_width - 3);

    let overflow = top_bit.clone();
    let cancel = {
        let no_top = bd.prop_not(&top_bit);
        let no_aligned = bd.prop_not(&aligned_bit);
        bd.prop_and(&no_top, &no_aligned)
    };
    let minor_cancel = bd.prop_and(&cancel, &lower_bit);
    let major_cancel = {
        let no_lower = bd.prop_not(&lower_bit);
        bd.prop_and(&cancel, &no_lower)
    };
    let sum_is_zero = sum.is_all_zeros(bd);
    let full_cancel = bd.prop_and(&major_cancel, &sum_is_zero);
    bd.annotate(&overflow, Likelihood::Unlikely);
    bd.annotate(&cancel, Likelihood::Unlikely);
    bd.annotate(&minor_cancel, Likelihood::Unlikely);
    bd.annotate(&major_cancel, Likelihood::VeryUnlikely);
    bd.annotate(&full_cancel, Likelihood::VeryUnlikely);

    let exact = bd.prop_and(&cancel, &diff_at_most_one);

    let after_overflow = conditional_right_shift_one_u(bd, &overflow, &sum);
    let aligned_sum = conditional_left_shift_one_u(bd, &minor_cancel, &after_overflow);

    let after_increment = conditional_increment_s(bd, &overflow, &max_exp);
    let corrected_exponent = conditional_decrement_s(bd, &minor_cancel, &after_increment);

    // The overflow shift pushes the old low bit out; fold it into the
    // sticky so nothing is lost.
    let sum_low = sum.extract(bd, 0, 0).resize(bd, sum_width);
    let zero_low = UBits::zero(bd, sum_width);
    let overflow_spill = UBits::ite(bd, &overflow, &sum_low, &zero_low);
    let gathered = shifted_sticky.or(bd, &overflow_spill);
    let sticky_moot = bd.prop_or(&sticky_is_zero, &major_cancel);
    let sticky_bits = UBits::ite(bd, &sticky_moot, &zeros, &gathered);

    let final_sig = aligned_sum.or(bd, &sticky_bits).contract(bd, 1);
    let sum_result = Unpacked::number(bd, result_sign, corrected_exponent, final_sig);

    // Major cancellation needs a full renormalisation; an exact-zero sum
    // takes its sign from the rounding mode.
    let is_rtn = bd.rm_is(rm, RoundingMode::TowardNegative);
    let extended_exp_width = cmp_width;
    let extended_sig_width = sig_width + 2;
    let zero_sum = Unpacked::zero_with_widths(bd, extended_exp_width, extended_sig_width, is_rtn);
    let renormalised = sum_result.normalise_up(bd);

    let on_major = Unpacked::ite(bd, &major_cancel, &renormalised, &sum_result);
    let value = Unpacked::ite(bd, &full_cancel, &zero_sum, &on_major);

    let hints = RounderHints {
        no_overflow,
        no_underflow,
        exact,
        no_significand_overflow,
        subnormal_exact,
    };
    (value, hints)
}

/// Splice the NaN, infinity, and zero cases around an arithmetic result.
pub(crate) fn add_special_cases<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
    arithmetic: &Unpacked<B>,
    is_add: &B::Prop,
) -> Unpacked<B> {
    let either_nan = bd.prop_or(left.nan(), right.nan());
    let both_inf = bd.prop_and(left.inf(), right.inf());
    let signs_match = bd.prop_iff(left.sign(), right.sign());
    let signs_clash = bd.prop_not(&signs_match);
    let compatible_signs = bd.prop_xor(is_add, &signs_clash);

    let incompatible = bd.prop_not(&compatible_signs);
    let inf_clash = bd.prop_and(&both_inf, &incompatible);
    let generates_nan = bd.prop_or(&either_nan, &inf_clash);

    let generates_inf = {
        let both_ok = bd.prop_and(&both_inf, &compatible_signs);
        let only_left = {
            let no_right = bd.prop_not(right.inf());
            bd.prop_and(left.inf(), &no_right)
        };
        let only_right = {
            let no_left = bd.prop_not(left.inf());
            bd.prop_and(&no_left, right.inf())
        };
        let either_alone = bd.prop_or(&only_left, &only_right);
        bd.prop_or(&both_ok, &either_alone)
    };
    let sign_of_inf = {
        let not_right_sign = bd.prop_not(right.sign());
        let flipped = bd.prop_xor(is_add, &not_right_sign);
        bd.ite_prop(left.inf(), left.sign(), &flipped)
    };

    let both_zero = bd.prop_and(left.zero(), right.zero());
    let flip_right_sign = {
        let not_add = bd.prop_not(is_add);
        bd.prop_xor(&not_add, right.sign())
    };
    let is_rtn = bd.rm_is(rm, RoundingMode::TowardNegative);
    let sign_of_zero = {
        let either_neg = bd.prop_or(left.sign(), &flip_right_sign);
        let both_neg = bd.prop_and(left.sign(), &flip_right_sign);
        bd.ite_prop(&is_rtn, &either_neg, &both_neg)
    };

    let identity_left = {
        let left_number = bd.prop_not(left.zero());
        bd.prop_and(&left_number, right.zero())
    };
    let identity_right = {
        let right_number = bd.prop_not(right.zero());
        bd.prop_and(left.zero(), &right_number)
    };

    let nan_result = Unpacked::make_nan(bd, fmt);
    let inf_result = Unpacked::make_inf(bd, fmt, sign_of_inf);
    let zero_result = Unpacked::make_zero(bd, fmt, sign_of_zero);
    let negated_right = negate(bd, fmt, right);
    let right_as_is = Unpacked::ite(bd, is_add, right, &negated_right);

    let on_id_right = Unpacked::ite(bd, &identity_right, &right_as_is, arithmetic);
    let on_id_left = Unpacked::ite(bd, &identity_left, left, &on_id_right);
    let on_zero = Unpacked::ite(bd, &both_zero, &zero_result, &on_id_left);
    let on_inf = Unpacked::ite(bd, &generates_inf, &inf_result, &on_zero);
    Unpacked::ite(bd, &generates_nan, &nan_result, &on_inf)
}

/// Addition or subtraction, selected by `is_add`, which may itself be
/// symbolic.
pub fn add_sub<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
    is_add: &B::Prop,
) -> Unpacked<B> {
    let (value, hints) = arithmetic_add(bd, rm, left, right, is_add);
    let rounded = rounder_with_hints(bd, fmt, rm, &value, &hints);
    add_special_cases(bd, fmt, rm, left, right, &rounded, is_add)
}

/// IEEE-754 addition.
pub fn add<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let t = bd.prop(true);
    add_sub(bd, fmt, rm, left, right, &t)
}

/// IEEE-754 subtraction.
pub fn sub<B: Backend>(
    bd: &mut B,
    fmt: Format,
    rm: &B::Rm,
    left: &Unpacked<B>,
    right: &Unpacked<B>,
) -> Unpacked<B> {
    let f = bd.prop(false);
    add_sub(bd, fmt, rm, left, right, &f)
}
