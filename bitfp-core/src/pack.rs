//! Conversion between the packed interchange encoding and the unpacked
//! working representation.

use crate::backend::Backend;
use crate::bits::{SBits, UBits};
use crate::format::Format;
use crate::unpacked::{min_normal_exponent, Unpacked};

/// Interpret a packed `e + s` wide bit vector.
///
/// Subnormals are normalised on the way in, and every NaN payload folds to
/// the canonical quiet NaN.
pub fn unpack<B: Backend>(bd: &mut B, fmt: Format, packed: &UBits<B>) -> Unpacked<B> {
    assert_eq!(
        packed.width(),
        fmt.packed_width(),
        "packed width does not match the format"
    );

    let packed_sig_width = fmt.packed_significand_width();
    let packed_exp_width = fmt.exponent_width();

    let packed_sig = packed.extract(bd, packed_sig_width - 1, 0);
    let packed_exp = packed.extract(
        bd,
        packed_sig_width + packed_exp_width - 1,
        packed_sig_width,
    );
    let sign = packed.bit(bd, fmt.packed_width() - 1);

    let exp_all_ones = packed_exp.is_all_ones(bd);
    let exp_all_zeros = packed_exp.is_all_zeros(bd);
    let sig_all_zeros = packed_sig.is_all_zeros(bd);
    let sig_non_zero = bd.prop_not(&sig_all_zeros);

    let is_nan = bd.prop_and(&exp_all_ones, &sig_non_zero);
    let is_inf = bd.prop_and(&exp_all_ones, &sig_all_zeros);
    let is_zero = bd.prop_and(&exp_all_zeros, &sig_all_zeros);
    let is_subnormal = bd.prop_and(&exp_all_zeros, &sig_non_zero);

    let unpacked_exp_width = fmt.unpacked_exponent_width();
    let unpacked_sig_width = fmt.unpacked_significand_width();

    // Make the hidden bit explicit: a one for normals, a zero for
    // subnormals (normalised away below).
    let extended_sig = packed_sig.extend(bd, 1);
    let leading = UBits::leading_one(bd, unpacked_sig_width);
    let sig_with_leading_one = leading.or(bd, &extended_sig);

    // Re-bias. The subtraction is modular; the result fits the unpacked
    // exponent width by construction.
    let bias = SBits::lit(bd, unpacked_exp_width, fmt.bias());
    let widened = packed_exp.resize(bd, unpacked_exp_width).to_signed();
    let normal_exp = widened.sub(bd, &bias);

    let normal = Unpacked::number(bd, sign.clone(), normal_exp, sig_with_leading_one);

    let min_normal = min_normal_exponent(bd, fmt, unpacked_exp_width);
    let subnormal =
        Unpacked::number(bd, sign.clone(), min_normal, extended_sig).normalise_up(bd);

    let nan = Unpacked::make_nan(bd, fmt);
    let inf = Unpacked::make_inf(bd, fmt, sign.clone());
    let zero = Unpacked::make_zero(bd, fmt, sign);

    let on_subnormal = Unpacked::ite(bd, &is_subnormal, &subnormal, &normal);
    let on_zero = Unpacked::ite(bd, &is_zero, &zero, &on_subnormal);
    let on_inf = Unpacked::ite(bd, &is_inf, &inf, &on_zero);
    Unpacked::ite(bd, &is_nan, &nan, &on_inf)
}

/// Produce the packed encoding of a well-formed unpacked value.
///
/// The inverse of [`unpack`] up to NaN canonicalisation: every NaN packs
/// to the canonical quiet NaN with sign 0.
pub fn pack<B: Backend>(bd: &mut B, fmt: Format, value: &Unpacked<B>) -> UBits<B> {
    assert_eq!(
        value.exponent_width(),
        fmt.unpacked_exponent_width(),
        "exponent width does not match the format"
    );
    assert_eq!(
        value.significand_width(),
        fmt.unpacked_significand_width(),
        "significand width does not match the format"
    );

    let packed_sig_width = fmt.packed_significand_width();
    let packed_exp_width = fmt.exponent_width();
    let unpacked_exp_width = fmt.unpacked_exponent_width();
    let unpacked_sig_width = fmt.unpacked_significand_width();

    let sign_bit = UBits::from_prop(bd, value.sign());

    // Exponent field: re-bias, then overwrite for the fixed encodings.
    let bias = SBits::lit(bd, unpacked_exp_width, fmt.bias());
    let biased = value.exponent().add(bd, &bias);
    // Safe to narrow: a normal's biased exponent fits the packed width and
    // every other case is overwritten below.
    let narrowed = biased.to_unsigned().resize(bd, packed_exp_width);

    let in_subnormal = value.in_subnormal_range(bd, fmt);
    let max_exp_field = bd.prop_or(value.nan(), value.inf());
    let min_exp_field = bd.prop_or(value.zero(), &in_subnormal);

    let ones = UBits::all_ones(bd, packed_exp_width);
    let zeros = UBits::zero(bd, packed_exp_width);
    let exp_min_applied = UBits::ite(bd, &min_exp_field, &zeros, &narrowed);
    let exp_field = UBits::ite(bd, &max_exp_field, &ones, &exp_min_applied);

    // Significand field: hide the leading bit; subnormals first shift
    // their significand back down by the subnormal amount.
    let normal_sig = value.significand().extract(bd, packed_sig_width - 1, 0);

    let amount = value.subnormal_amount(bd, fmt).to_unsigned();
    let shift = amount.resize(bd, unpacked_sig_width);
    let shifted = value.significand().lshr(bd, &shift);
    let subnormal_sig = shifted.extract(bd, packed_sig_width - 1, 0);

    // The canonical quiet NaN sets only the top trailing bit.
    let nan_sig = UBits::leading_one(bd, packed_sig_width);
    let empty_sig = UBits::zero(bd, packed_sig_width);

    let inf_or_zero = bd.prop_or(value.inf(), value.zero());
    let sig_sub_applied = UBits::ite(bd, &in_subnormal, &subnormal_sig, &normal_sig);
    let sig_cleared = UBits::ite(bd, &inf_or_zero, &empty_sig, &sig_sub_applied);
    let sig_field = UBits::ite(bd, value.nan(), &nan_sig, &sig_cleared);

    let upper = sign_bit.append(bd, &exp_field);
    upper.append(bd, &sig_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concrete::Concrete;

    fn round_trip(fmt: Format, bits: u64) -> u64 {
        let bd = &mut Concrete;
        let packed = UBits::lit(bd, fmt.packed_width(), bits);
        let unpacked = unpack(bd, fmt, &packed);
        assert!(unpacked.is_valid(bd, fmt), "unpack({bits:#x}) is well formed");
        let repacked = pack(bd, fmt, &unpacked);
        u64::try_from(repacked.raw()).expect("fits")
    }

    #[test]
    fn binary32_round_trips() {
        let fmt = Format::BINARY32;
        for bits in [
            0x0000_0000u64, // +0
            0x8000_0000,    // -0
            0x3f80_0000,    // 1.0
            0xbf80_0000,    // -1.0
            0x7f80_0000,    // +inf
            0xff80_0000,    // -inf
            0x0000_0001,    // smallest subnormal
            0x807f_ffff,    // largest negative subnormal
            0x0080_0000,    // smallest normal
            0x7f7f_ffff,    // largest normal
        ] {
            assert_eq!(round_trip(fmt, bits), bits, "bits {bits:#010x}");
        }
    }

    #[test]
    fn nan_payloads_canonicalise() {
        let fmt = Format::BINARY32;
        assert_eq!(round_trip(fmt, 0x7fc0_0000), 0x7fc0_0000);
        assert_eq!(round_trip(fmt, 0x7f80_0001), 0x7fc0_0000);
        assert_eq!(round_trip(fmt, 0xffff_ffff), 0x7fc0_0000);
    }

    #[test]
    fn tiny_formats_round_trip_exhaustively() {
        for fmt in [Format::new(2, 2), Format::new(3, 2), Format::new(2, 3)] {
            let bd = &mut Concrete;
            let width = fmt.packed_width();
            for bits in 0..(1u64 << width) {
                let packed = UBits::lit(bd, width, bits);
                let unpacked = unpack(bd, fmt, &packed);
                assert!(unpacked.is_valid(bd, fmt), "{fmt:?} {bits:#b}");
                let repacked = pack(bd, fmt, &unpacked);
                let exp_field =
                    (bits >> (fmt.significand_width() - 1)) & ((1 << fmt.exponent_width()) - 1);
                let trailing = bits & ((1 << (fmt.significand_width() - 1)) - 1);
                let all_ones = (1 << fmt.exponent_width()) - 1;
                let expect = if exp_field == all_ones && trailing != 0 {
                    // canonical NaN
                    let quiet = 1u64 << (fmt.significand_width() - 2);
                    (all_ones << (fmt.significand_width() - 1)) | quiet
                } else {
                    bits
                };
                let got = u64::try_from(repacked.raw()).expect("fits");
                assert_eq!(got, expect, "{fmt:?} {bits:#b}");
            }
        }
    }
}
