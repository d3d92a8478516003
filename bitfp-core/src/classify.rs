//! Classification predicates over unpacked values.

use crate::backend::Backend;
use crate::format::Format;
use crate::unpacked::Unpacked;

/// NaN test.
pub fn is_nan<B: Backend>(_bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> B::Prop {
    value.nan().clone()
}

/// Infinity test, either sign.
pub fn is_infinite<B: Backend>(_bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> B::Prop {
    value.inf().clone()
}

/// Zero test, either sign.
pub fn is_zero<B: Backend>(_bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> B::Prop {
    value.zero().clone()
}

/// Finite: neither NaN nor infinite.
pub fn is_finite<B: Backend>(bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> B::Prop {
    let not_nan = bd.prop_not(value.nan());
    let not_inf = bd.prop_not(value.inf());
    bd.prop_and(&not_nan, &not_inf)
}

/// Normal: finite, non-zero and within the normal exponent range.
pub fn is_normal<B: Backend>(bd: &mut B, fmt: Format, value: &Unpacked<B>) -> B::Prop {
    let finite = is_finite(bd, fmt, value);
    let not_zero = bd.prop_not(value.zero());
    let number = bd.prop_and(&finite, &not_zero);
    let in_range = value.in_normal_range(bd, fmt);
    bd.prop_and(&number, &in_range)
}

/// Subnormal: finite, non-zero and below the normal exponent range.
pub fn is_subnormal<B: Backend>(bd: &mut B, fmt: Format, value: &Unpacked<B>) -> B::Prop {
    let finite = is_finite(bd, fmt, value);
    let not_zero = bd.prop_not(value.zero());
    let number = bd.prop_and(&finite, &not_zero);
    let in_range = value.in_subnormal_range(bd, fmt);
    bd.prop_and(&number, &in_range)
}

/// Strictly negative, zeros excluded; false on NaN.
pub fn is_negative<B: Backend>(bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> B::Prop {
    let not_nan = bd.prop_not(value.nan());
    bd.prop_and(&not_nan, value.sign())
}

/// Strictly positive, zeros excluded; false on NaN.
pub fn is_positive<B: Backend>(bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> B::Prop {
    let not_nan = bd.prop_not(value.nan());
    let not_sign = bd.prop_not(value.sign());
    bd.prop_and(&not_nan, &not_sign)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::UBits;
    use crate::concrete::Concrete;
    use crate::pack::unpack;

    fn classify_bits(bits: u64) -> (bool, bool, bool, bool, bool) {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let packed = UBits::lit(bd, 32, bits);
        let v = unpack(bd, fmt, &packed);
        (
            is_nan(bd, fmt, &v),
            is_infinite(bd, fmt, &v),
            is_zero(bd, fmt, &v),
            is_normal(bd, fmt, &v),
            is_subnormal(bd, fmt, &v),
        )
    }

    #[test]
    fn classifies_binary32_cases() {
        assert_eq!(classify_bits(0x7fc0_0000), (true, false, false, false, false));
        assert_eq!(classify_bits(0xff80_0000), (false, true, false, false, false));
        assert_eq!(classify_bits(0x8000_0000), (false, false, true, false, false));
        assert_eq!(classify_bits(0x3f80_0000), (false, false, false, true, false));
        assert_eq!(classify_bits(0x0000_0001), (false, false, false, false, true));
        assert_eq!(classify_bits(0x007f_ffff), (false, false, false, false, true));
        assert_eq!(classify_bits(0x0080_0000), (false, false, false, true, false));
    }
}
