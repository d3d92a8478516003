//! Width-polymorphic helper operations over the back-end primitives.
//!
//! These are the small building blocks the encoders lean on: clamping,
//! unary shift masks, sticky shifts and branch-free conditional edits.
//! None of them branches on back-end data; every choice goes through the
//! back-end's `ite`.

use crate::backend::Backend;
use crate::bits::{SBits, UBits};

/// Signed maximum.
pub fn smax<B: Backend>(bd: &mut B, a: &SBits<B>, b: &SBits<B>) -> SBits<B> {
    let a_less = a.slt(bd, b);
    SBits::ite(bd, &a_less, b, a)
}

/// Signed minimum.
pub fn smin<B: Backend>(bd: &mut B, a: &SBits<B>, b: &SBits<B>) -> SBits<B> {
    let a_less = a.slt(bd, b);
    SBits::ite(bd, &a_less, a, b)
}

/// Signed absolute value (modular: the minimum value maps to itself).
pub fn sabs<B: Backend>(bd: &mut B, a: &SBits<B>) -> SBits<B> {
    let zero = SBits::zero(bd, a.width());
    let negative = a.slt(bd, &zero);
    conditional_negate_s(bd, &negative, a)
}

/// Clamp into the closed interval `[lo, hi]`.
pub fn collar<B: Backend>(bd: &mut B, x: &SBits<B>, lo: &SBits<B>, hi: &SBits<B>) -> SBits<B> {
    let capped = smin(bd, hi, x);
    smax(bd, lo, &capped)
}

/// Add with one bit of growth: never overflows.
pub fn expanding_add<B: Backend>(bd: &mut B, a: &SBits<B>, b: &SBits<B>) -> SBits<B> {
    let ea = a.extend(bd, 1);
    let eb = b.extend(bd, 1);
    ea.add(bd, &eb)
}

/// Subtract with one bit of growth: never overflows.
pub fn expanding_subtract<B: Backend>(bd: &mut B, a: &SBits<B>, b: &SBits<B>) -> SBits<B> {
    let ea = a.extend(bd, 1);
    let eb = b.extend(bd, 1);
    ea.sub(bd, &eb)
}

/// Unsigned multiply at doubled width: exact.
pub fn expanding_multiply<B: Backend>(bd: &mut B, a: &UBits<B>, b: &UBits<B>) -> UBits<B> {
    assert_eq!(a.width(), b.width(), "expanding multiply width mismatch");
    let w = a.width();
    let ea = a.extend(bd, w);
    let eb = b.extend(bd, w);
    ea.mul(bd, &eb)
}

/// Negate when the condition holds.
pub fn conditional_negate_u<B: Backend>(bd: &mut B, cond: &B::Prop, x: &UBits<B>) -> UBits<B> {
    let negated = x.negate(bd);
    UBits::ite(bd, cond, &negated, x)
}

/// Negate when the condition holds.
pub fn conditional_negate_s<B: Backend>(bd: &mut B, cond: &B::Prop, x: &SBits<B>) -> SBits<B> {
    let negated = x.negate(bd);
    SBits::ite(bd, cond, &negated, x)
}

/// Add one when the condition holds.
pub fn conditional_increment_s<B: Backend>(bd: &mut B, cond: &B::Prop, x: &SBits<B>) -> SBits<B> {
    let bumped = x.increment(bd);
    SBits::ite(bd, cond, &bumped, x)
}

/// Subtract one when the condition holds.
pub fn conditional_decrement_s<B: Backend>(bd: &mut B, cond: &B::Prop, x: &SBits<B>) -> SBits<B> {
    let dropped = x.decrement(bd);
    SBits::ite(bd, cond, &dropped, x)
}

/// Shift left one place when the condition holds.
pub fn conditional_left_shift_one_u<B: Backend>(
    bd: &mut B,
    cond: &B::Prop,
    x: &UBits<B>,
) -> UBits<B> {
    let shifted = x.shl_lit(bd, 1);
    UBits::ite(bd, cond, &shifted, x)
}

/// Shift right one place when the condition holds.
pub fn conditional_right_shift_one_u<B: Backend>(
    bd: &mut B,
    cond: &B::Prop,
    x: &UBits<B>,
) -> UBits<B> {
    let shifted = x.lshr_lit(bd, 1);
    UBits::ite(bd, cond, &shifted, x)
}

/// The unary mask `(1 << k) - 1` at `width` bits.
///
/// `k` is an unsigned vector whose value must not exceed `width`; the mask
/// saturates to all-ones at `k = width`.
pub fn order_encode<B: Backend>(bd: &mut B, k: &UBits<B>, width: u32) -> UBits<B> {
    // One extra bit so that k = width does not shift the one away.
    let kx = k.resize(bd, width + 1);
    let one = UBits::one(bd, width + 1);
    let shifted = one.shl(bd, &kx);
    shifted.decrement(bd).contract(bd, 1)
}

/// Would a right shift of `x` by `amount` discard a set bit?
///
/// Returns a vector of the width of `x` holding 0 or 1; amounts at or past
/// the width collect every bit of `x` into the sticky.
pub fn right_shift_sticky_bit<B: Backend>(
    bd: &mut B,
    x: &UBits<B>,
    amount: &UBits<B>,
) -> UBits<B> {
    assert_eq!(x.width(), amount.width(), "sticky shift width mismatch");
    let w = x.width();
    let full = UBits::lit(bd, w, u64::from(w));
    let past_end = amount.uge(bd, &full);
    let clamped = UBits::ite(bd, &past_end, &full, amount);
    let mask = order_encode(bd, &clamped, w);
    let discarded = x.and(bd, &mask);
    let all_zero = discarded.is_all_zeros(bd);
    let any = bd.prop_not(&all_zero);
    UBits::from_prop(bd, &any).resize(bd, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::Concrete;

    fn u(bd: &mut Concrete, w: u32, v: u64) -> UBits<Concrete> {
        UBits::lit(bd, w, v)
    }

    fn s(bd: &mut Concrete, w: u32, v: i64) -> SBits<Concrete> {
        SBits::lit(bd, w, v)
    }

    #[test]
    fn collar_clamps_both_ends() {
        let bd = &mut Concrete;
        let lo = s(bd, 8, -5);
        let hi = s(bd, 8, 9);
        for (input, expect) in [(-20i64, -5i64), (-5, -5), (0, 0), (9, 9), (100, 9)] {
            let x = s(bd, 8, input);
            let clamped = collar(bd, &x, &lo, &hi);
            let want = s(bd, 8, expect);
            assert!(clamped.eq(bd, &want), "collar({input})");
        }
    }

    #[test]
    fn order_encode_builds_unary_masks() {
        let bd = &mut Concrete;
        for k in 0..=8u64 {
            let kv = u(bd, 8, k);
            let mask = order_encode(bd, &kv, 8);
            let want = u(bd, 8, (1u64 << k) - 1);
            assert!(mask.eq(bd, &want), "order_encode({k})");
        }
    }

    #[test]
    fn sticky_bit_sees_discarded_ones() {
        let bd = &mut Concrete;
        let x = u(bd, 8, 0b0101_0000);
        for (amount, expect) in [(0u64, 0u64), (4, 0), (5, 1), (6, 1), (8, 1), (200, 1)] {
            let amt = u(bd, 8, amount);
            let sticky = right_shift_sticky_bit(bd, &x, &amt);
            let want = u(bd, 8, expect);
            assert!(sticky.eq(bd, &want), "sticky at {amount}");
        }
    }

    #[test]
    fn sabs_and_minmax() {
        let bd = &mut Concrete;
        let a = s(bd, 8, -7);
        let b = s(bd, 8, 3);
        let mx = smax(bd, &a, &b);
        let mn = smin(bd, &a, &b);
        let abs_a = sabs(bd, &a);
        let three = s(bd, 8, 3);
        let minus7 = s(bd, 8, -7);
        let seven = s(bd, 8, 7);
        assert!(mx.eq(bd, &three));
        assert!(mn.eq(bd, &minus7));
        assert!(abs_a.eq(bd, &seven));
    }
}
