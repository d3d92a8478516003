//! Sign manipulation: negate and absolute value.
//!
//! Both are total and exact; NaN keeps its fixed sign so the invariant of
//! the unpacked form is preserved.

use crate::backend::Backend;
use crate::format::Format;
use crate::unpacked::Unpacked;

/// Flip the sign.
pub fn negate<B: Backend>(bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> Unpacked<B> {
    let flipped = bd.prop_not(value.sign());
    value.with_sign(bd, &flipped)
}

/// Clear the sign.
pub fn absolute<B: Backend>(bd: &mut B, _fmt: Format, value: &Unpacked<B>) -> Unpacked<B> {
    let positive = bd.prop(false);
    value.with_sign(bd, &positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::UBits;
    use crate::concrete::Concrete;
    use crate::pack::{pack, unpack};

    fn through(bits: u64, f: impl Fn(&mut Concrete, Format, &Unpacked<Concrete>) -> Unpacked<Concrete>) -> u64 {
        let bd = &mut Concrete;
        let fmt = Format::BINARY32;
        let packed = UBits::lit(bd, 32, bits);
        let v = unpack(bd, fmt, &packed);
        let out = f(bd, fmt, &v);
        u64::try_from(pack(bd, fmt, &out).raw()).expect("fits")
    }

    #[test]
    fn negate_flips_every_sign_but_nan() {
        assert_eq!(through(0x3f80_0000, negate), 0xbf80_0000);
        assert_eq!(through(0x8000_0000, negate), 0x0000_0000);
        assert_eq!(through(0x7f80_0000, negate), 0xff80_0000);
        assert_eq!(through(0x7fc0_0000, negate), 0x7fc0_0000);
    }

    #[test]
    fn absolute_clears_the_sign() {
        assert_eq!(through(0xbf80_0000, absolute), 0x3f80_0000);
        assert_eq!(through(0x8000_0001, absolute), 0x0000_0001);
        assert_eq!(through(0x7fc0_0000, absolute), 0x7fc0_0000);
    }
}
