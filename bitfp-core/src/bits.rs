//! Width-carrying bit-vector wrappers.
//!
//! [`UBits`] and [`SBits`] pair a back-end bit-vector handle with its width
//! and fix the signedness discipline: extension, right shift and comparison
//! pick the unsigned or signed primitive. Widths are construction-time
//! data; every helper asserts its equal-width contract, and a violation is
//! a caller bug that aborts.

use num_bigint::BigUint;
use num_traits::One;

use crate::backend::Backend;

/// Encode a two's-complement value into `[0, 2^width)`.
#[must_use]
pub(crate) fn signed_to_biguint(width: u32, value: i64) -> BigUint {
    if value >= 0 {
        BigUint::from(value as u64)
    } else {
        (BigUint::one() << width) - BigUint::from(value.unsigned_abs())
    }
}

/// An unsigned bit vector: zero extension, logical right shift, unsigned
/// comparison.
pub struct UBits<B: Backend> {
    bits: B::Bv,
    width: u32,
}

/// A signed (two's complement) bit vector: sign extension, arithmetic right
/// shift, signed comparison.
pub struct SBits<B: Backend> {
    bits: B::Bv,
    width: u32,
}

impl<B: Backend> Clone for UBits<B> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            width: self.width,
        }
    }
}

impl<B: Backend> Clone for SBits<B> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            width: self.width,
        }
    }
}

impl<B: Backend> std::fmt::Debug for UBits<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UBits(w={}, {:?})", self.width, self.bits)
    }
}

impl<B: Backend> std::fmt::Debug for SBits<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SBits(w={}, {:?})", self.width, self.bits)
    }
}

impl<B: Backend> UBits<B> {
    /// Wrap a raw back-end value; `width` must match how it was built.
    #[must_use]
    pub fn from_raw(bits: B::Bv, width: u32) -> Self {
        assert!(width > 0, "zero-width bit vector");
        Self { bits, width }
    }

    /// Literal constant from a `u64`.
    pub fn lit(bd: &mut B, width: u32, value: u64) -> Self {
        Self::from_biguint(bd, width, &BigUint::from(value))
    }

    /// Literal constant from an arbitrary-precision value.
    pub fn from_biguint(bd: &mut B, width: u32, value: &BigUint) -> Self {
        Self::from_raw(bd.bv_const(width, value), width)
    }

    /// The all-zero value.
    pub fn zero(bd: &mut B, width: u32) -> Self {
        Self::lit(bd, width, 0)
    }

    /// The value one.
    pub fn one(bd: &mut B, width: u32) -> Self {
        Self::lit(bd, width, 1)
    }

    /// The all-ones value.
    pub fn all_ones(bd: &mut B, width: u32) -> Self {
        let v = (BigUint::one() << width) - BigUint::one();
        Self::from_biguint(bd, width, &v)
    }

    /// `1 << (width - 1)`: a leading one over zeros.
    pub fn leading_one(bd: &mut B, width: u32) -> Self {
        Self::from_biguint(bd, width, &(BigUint::one() << (width - 1)))
    }

    /// Width-1 vector holding a proposition.
    pub fn from_prop(bd: &mut B, p: &B::Prop) -> Self {
        Self::from_raw(bd.prop_to_bv(p), 1)
    }

    /// The wrapped back-end value.
    #[must_use]
    pub fn raw(&self) -> &B::Bv {
        &self.bits
    }

    /// Bit width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    fn same_width(&self, other: &Self) {
        assert_eq!(
            self.width, other.width,
            "bit-vector width mismatch ({} vs {})",
            self.width, other.width
        );
    }

    /// Equality.
    pub fn eq(&self, bd: &mut B, other: &Self) -> B::Prop {
        self.same_width(other);
        bd.bv_eq(self.width, &self.bits, &other.bits)
    }

    /// Unsigned `<`.
    pub fn ult(&self, bd: &mut B, other: &Self) -> B::Prop {
        self.same_width(other);
        bd.bv_ult(self.width, &self.bits, &other.bits)
    }

    /// Unsigned `<=`.
    pub fn ule(&self, bd: &mut B, other: &Self) -> B::Prop {
        self.same_width(other);
        bd.bv_ule(self.width, &self.bits, &other.bits)
    }

    /// Unsigned `>`.
    pub fn ugt(&self, bd: &mut B, other: &Self) -> B::Prop {
        other.ult(bd, self)
    }

    /// Unsigned `>=`.
    pub fn uge(&self, bd: &mut B, other: &Self) -> B::Prop {
        other.ule(bd, self)
    }

    /// Is every bit zero?
    pub fn is_all_zeros(&self, bd: &mut B) -> B::Prop {
        let z = Self::zero(bd, self.width);
        self.eq(bd, &z)
    }

    /// Is every bit one?
    pub fn is_all_ones(&self, bd: &mut B) -> B::Prop {
        let ones = Self::all_ones(bd, self.width);
        self.eq(bd, &ones)
    }

    /// Modular addition.
    pub fn add(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_add(self.width, &self.bits, &other.bits), self.width)
    }

    /// Modular subtraction.
    pub fn sub(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_sub(self.width, &self.bits, &other.bits), self.width)
    }

    /// Modular multiplication.
    pub fn mul(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_mul(self.width, &self.bits, &other.bits), self.width)
    }

    /// Two's-complement negation (modular).
    pub fn negate(&self, bd: &mut B) -> Self {
        Self::from_raw(bd.bv_neg(self.width, &self.bits), self.width)
    }

    /// Bitwise complement.
    pub fn not(&self, bd: &mut B) -> Self {
        Self::from_raw(bd.bv_not(self.width, &self.bits), self.width)
    }

    /// Bitwise and.
    pub fn and(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_and(self.width, &self.bits, &other.bits), self.width)
    }

    /// Bitwise or.
    pub fn or(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_or(self.width, &self.bits, &other.bits), self.width)
    }

    /// Bitwise xor.
    pub fn xor(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_xor(self.width, &self.bits, &other.bits), self.width)
    }

    /// Left shift by a same-width amount (modular: overshifts give zero).
    pub fn shl(&self, bd: &mut B, amount: &Self) -> Self {
        self.same_width(amount);
        Self::from_raw(bd.bv_shl(self.width, &self.bits, &amount.bits), self.width)
    }

    /// Logical right shift by a same-width amount.
    pub fn lshr(&self, bd: &mut B, amount: &Self) -> Self {
        self.same_width(amount);
        Self::from_raw(bd.bv_lshr(self.width, &self.bits, &amount.bits), self.width)
    }

    /// Arithmetic right shift by a same-width amount; the top bit is
    /// treated as a sign regardless of the unsigned view.
    pub fn ashr(&self, bd: &mut B, amount: &Self) -> Self {
        self.same_width(amount);
        Self::from_raw(bd.bv_ashr(self.width, &self.bits, &amount.bits), self.width)
    }

    /// Left shift by a literal amount.
    pub fn shl_lit(&self, bd: &mut B, amount: u32) -> Self {
        let amt = Self::lit(bd, self.width, u64::from(amount));
        self.shl(bd, &amt)
    }

    /// Logical right shift by a literal amount.
    pub fn lshr_lit(&self, bd: &mut B, amount: u32) -> Self {
        let amt = Self::lit(bd, self.width, u64::from(amount));
        self.lshr(bd, &amt)
    }

    /// Plus one, modular.
    pub fn increment(&self, bd: &mut B) -> Self {
        let one = Self::one(bd, self.width);
        self.add(bd, &one)
    }

    /// Minus one, modular.
    pub fn decrement(&self, bd: &mut B) -> Self {
        let one = Self::one(bd, self.width);
        self.sub(bd, &one)
    }

    /// Zero-extend by `by` bits.
    pub fn extend(&self, bd: &mut B, by: u32) -> Self {
        if by == 0 {
            return self.clone();
        }
        Self::from_raw(
            bd.bv_zero_extend(self.width, by, &self.bits),
            self.width + by,
        )
    }

    /// Drop the top `by` bits.
    pub fn contract(&self, bd: &mut B, by: u32) -> Self {
        assert!(self.width > by, "contraction would leave no bits");
        self.extract(bd, self.width - 1 - by, 0)
    }

    /// Extend or contract to `new_width`.
    pub fn resize(&self, bd: &mut B, new_width: u32) -> Self {
        if new_width > self.width {
            self.extend(bd, new_width - self.width)
        } else if new_width < self.width {
            self.contract(bd, self.width - new_width)
        } else {
            self.clone()
        }
    }

    /// Extend to the width of a wider vector.
    pub fn match_width(&self, bd: &mut B, other: &Self) -> Self {
        assert!(self.width <= other.width, "match_width cannot narrow");
        self.extend(bd, other.width - self.width)
    }

    /// Concatenate; `self` occupies the upper bits.
    pub fn append(&self, bd: &mut B, lower: &Self) -> Self {
        Self::from_raw(
            bd.bv_concat(self.width, lower.width, &self.bits, &lower.bits),
            self.width + lower.width,
        )
    }

    /// Extract bits `hi..=lo`, inclusive of both end points.
    pub fn extract(&self, bd: &mut B, hi: u32, lo: u32) -> Self {
        assert!(
            hi >= lo && hi < self.width,
            "extract [{hi}:{lo}] out of width {}",
            self.width
        );
        Self::from_raw(bd.bv_extract(self.width, hi, lo, &self.bits), hi - lo + 1)
    }

    /// A single bit as a proposition.
    pub fn bit(&self, bd: &mut B, index: u32) -> B::Prop {
        let b = self.extract(bd, index, index);
        bd.bv_to_prop(&b.bits)
    }

    /// Reinterpret the same bits as signed.
    #[must_use]
    pub fn to_signed(&self) -> SBits<B> {
        SBits {
            bits: self.bits.clone(),
            width: self.width,
        }
    }

    /// Select between two vectors of equal width.
    pub fn ite(bd: &mut B, cond: &B::Prop, t: &Self, e: &Self) -> Self {
        t.same_width(e);
        Self::from_raw(bd.ite_bv(t.width, cond, &t.bits, &e.bits), t.width)
    }
}

impl<B: Backend> SBits<B> {
    /// Wrap a raw back-end value; `width` must match how it was built.
    #[must_use]
    pub fn from_raw(bits: B::Bv, width: u32) -> Self {
        assert!(width > 0, "zero-width bit vector");
        Self { bits, width }
    }

    /// Literal constant from an `i64`, two's-complement encoded.
    pub fn lit(bd: &mut B, width: u32, value: i64) -> Self {
        let encoded = signed_to_biguint(width, value);
        Self::from_raw(bd.bv_const(width, &encoded), width)
    }

    /// The value zero.
    pub fn zero(bd: &mut B, width: u32) -> Self {
        Self::lit(bd, width, 0)
    }

    /// The value one.
    pub fn one(bd: &mut B, width: u32) -> Self {
        Self::lit(bd, width, 1)
    }

    /// The wrapped back-end value.
    #[must_use]
    pub fn raw(&self) -> &B::Bv {
        &self.bits
    }

    /// Bit width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    fn same_width(&self, other: &Self) {
        assert_eq!(
            self.width, other.width,
            "bit-vector width mismatch ({} vs {})",
            self.width, other.width
        );
    }

    /// Equality.
    pub fn eq(&self, bd: &mut B, other: &Self) -> B::Prop {
        self.same_width(other);
        bd.bv_eq(self.width, &self.bits, &other.bits)
    }

    /// Signed `<`.
    pub fn slt(&self, bd: &mut B, other: &Self) -> B::Prop {
        self.same_width(other);
        bd.bv_slt(self.width, &self.bits, &other.bits)
    }

    /// Signed `<=`.
    pub fn sle(&self, bd: &mut B, other: &Self) -> B::Prop {
        self.same_width(other);
        bd.bv_sle(self.width, &self.bits, &other.bits)
    }

    /// Signed `>`.
    pub fn sgt(&self, bd: &mut B, other: &Self) -> B::Prop {
        other.slt(bd, self)
    }

    /// Signed `>=`.
    pub fn sge(&self, bd: &mut B, other: &Self) -> B::Prop {
        other.sle(bd, self)
    }

    /// Is the value zero?
    pub fn is_all_zeros(&self, bd: &mut B) -> B::Prop {
        let z = Self::zero(bd, self.width);
        self.eq(bd, &z)
    }

    /// Modular addition.
    pub fn add(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_add(self.width, &self.bits, &other.bits), self.width)
    }

    /// Modular subtraction.
    pub fn sub(&self, bd: &mut B, other: &Self) -> Self {
        self.same_width(other);
        Self::from_raw(bd.bv_sub(self.width, &self.bits, &other.bits), self.width)
    }

    /// Two's-complement negation (modular).
    pub fn negate(&self, bd: &mut B) -> Self {
        Self::from_raw(bd.bv_neg(self.width, &self.bits), self.width)
    }

    /// Plus one, modular.
    pub fn increment(&self, bd: &mut B) -> Self {
        let one = Self::one(bd, self.width);
        self.add(bd, &one)
    }

    /// Minus one, modular.
    pub fn decrement(&self, bd: &mut B) -> Self {
        let one = Self::one(bd, self.width);
        self.sub(bd, &one)
    }

    /// Arithmetic right shift by an unsigned same-width amount.
    pub fn ashr(&self, bd: &mut B, amount: &UBits<B>) -> Self {
        assert_eq!(self.width, amount.width(), "shift amount width mismatch");
        Self::from_raw(
            bd.bv_ashr(self.width, &self.bits, &amount.bits),
            self.width,
        )
    }

    /// Sign-extend by `by` bits.
    pub fn extend(&self, bd: &mut B, by: u32) -> Self {
        if by == 0 {
            return self.clone();
        }
        Self::from_raw(
            bd.bv_sign_extend(self.width, by, &self.bits),
            self.width + by,
        )
    }

    /// Drop the top `by` bits.
    pub fn contract(&self, bd: &mut B, by: u32) -> Self {
        assert!(self.width > by, "contraction would leave no bits");
        let narrowed = self.to_unsigned().extract(bd, self.width - 1 - by, 0);
        narrowed.to_signed()
    }

    /// Extend or contract to `new_width`.
    pub fn resize(&self, bd: &mut B, new_width: u32) -> Self {
        if new_width > self.width {
            self.extend(bd, new_width - self.width)
        } else if new_width < self.width {
            self.contract(bd, self.width - new_width)
        } else {
            self.clone()
        }
    }

    /// Extend to the width of a wider vector.
    pub fn match_width(&self, bd: &mut B, other: &Self) -> Self {
        assert!(self.width <= other.width, "match_width cannot narrow");
        self.extend(bd, other.width - self.width)
    }

    /// Reinterpret the same bits as unsigned.
    #[must_use]
    pub fn to_unsigned(&self) -> UBits<B> {
        UBits {
            bits: self.bits.clone(),
            width: self.width,
        }
    }

    /// Select between two vectors of equal width.
    pub fn ite(bd: &mut B, cond: &B::Prop, t: &Self, e: &Self) -> Self {
        t.same_width(e);
        Self::from_raw(bd.ite_bv(t.width, cond, &t.bits, &e.bits), t.width)
    }
}
