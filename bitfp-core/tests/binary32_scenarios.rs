//! End-to-end binary32 scenarios and boundary behaviours, bit exact under
//! both back-ends.

use num_bigint::BigUint;
use rustc_hash::FxHashMap;

use bitfp_core::backend::Backend;
use bitfp_core::bits::UBits;
use bitfp_core::compare::min_with_undefined;
use bitfp_core::concrete::Concrete;
use bitfp_core::format::{Format, RoundingMode};
use bitfp_core::pack::{pack, unpack};
use bitfp_core::symbolic::SymBackend;
use bitfp_core::{add, div, fma, mul, sqrt};

#[derive(Debug, Clone, Copy)]
enum Scenario {
    Add(u32, u32),
    Mul(u32, u32),
    Div(u32, u32),
    Sqrt(u32),
    Fma(u32, u32, u32),
}

fn encode<B: Backend>(bd: &mut B, rm: &B::Rm, scenario: Scenario) -> UBits<B> {
    let fmt = Format::BINARY32;
    let lift = |bd: &mut B, bits: u32| {
        let packed = UBits::lit(bd, 32, u64::from(bits));
        unpack(bd, fmt, &packed)
    };
    let result = match scenario {
        Scenario::Add(a, b) => {
            let (ua, ub) = (lift(bd, a), lift(bd, b));
            add::add(bd, fmt, rm, &ua, &ub)
        }
        Scenario::Mul(a, b) => {
            let (ua, ub) = (lift(bd, a), lift(bd, b));
            mul::mul(bd, fmt, rm, &ua, &ub)
        }
        Scenario::Div(a, b) => {
            let (ua, ub) = (lift(bd, a), lift(bd, b));
            div::div(bd, fmt, rm, &ua, &ub)
        }
        Scenario::Sqrt(a) => {
            let ua = lift(bd, a);
            sqrt::sqrt(bd, fmt, rm, &ua)
        }
        Scenario::Fma(a, b, c) => {
            let (ua, ub, uc) = (lift(bd, a), lift(bd, b), lift(bd, c));
            fma::fma(bd, fmt, rm, &ua, &ub, &uc)
        }
    };
    pack(bd, fmt, &result)
}

fn run_both(rm: RoundingMode, scenario: Scenario) -> (u32, u32) {
    let concrete = {
        let bd = &mut Concrete;
        let mode = bd.rm_const(rm);
        let out = encode(bd, &mode, scenario);
        u32::try_from(out.raw()).expect("fits")
    };
    let symbolic = {
        // Constant inputs, so the dag's eager folding plays the part of
        // the surrounding solver's constant folder.
        let mut sym = SymBackend::new();
        let mode = sym.rm_const(rm);
        let out = encode(&mut sym, &mode, scenario);
        let value = sym
            .dag()
            .eval(*out.raw(), &FxHashMap::default())
            .expect("closed");
        u32::try_from(&value).expect("fits")
    };
    (concrete, symbolic)
}

fn check(rm: RoundingMode, scenario: Scenario, expect: u32) {
    let (concrete, symbolic) = run_both(rm, scenario);
    assert_eq!(concrete, expect, "concrete {scenario:?} under {rm}");
    assert_eq!(symbolic, expect, "symbolic {scenario:?} under {rm}");
}

#[test]
fn one_plus_one_is_two() {
    check(
        RoundingMode::NearestEven,
        Scenario::Add(0x3f80_0000, 0x3f80_0000),
        0x4000_0000,
    );
}

#[test]
fn adding_the_largest_normals_overflows_to_infinity() {
    check(
        RoundingMode::NearestEven,
        Scenario::Add(0x7f7f_ffff, 0x7f7f_ffff),
        0x7f80_0000,
    );
}

#[test]
fn halving_the_smallest_subnormal_underflows_to_zero() {
    check(
        RoundingMode::NearestEven,
        Scenario::Mul(0x0000_0001, 0x3f00_0000),
        0x0000_0000,
    );
}

#[test]
fn square_root_of_four_is_two() {
    check(RoundingMode::NearestEven, Scenario::Sqrt(0x4080_0000), 0x4000_0000);
}

#[test]
fn fused_one_times_one_plus_one_is_three() {
    check(
        RoundingMode::NearestEven,
        Scenario::Fma(0x3f80_0000, 0x3f80_0000, 0x3f80_0000),
        0x4040_0000,
    );
}

#[test]
fn one_over_positive_zero_is_positive_infinity() {
    check(
        RoundingMode::NearestEven,
        Scenario::Div(0x3f80_0000, 0x0000_0000),
        0x7f80_0000,
    );
}

#[test]
fn signed_zero_sums_depend_on_the_mode() {
    check(
        RoundingMode::NearestEven,
        Scenario::Add(0x0000_0000, 0x8000_0000),
        0x0000_0000,
    );
    check(
        RoundingMode::TowardNegative,
        Scenario::Add(0x0000_0000, 0x8000_0000),
        0x8000_0000,
    );
}

#[test]
fn indeterminate_products_and_quotients_are_nan() {
    let nan = 0x7fc0_0000;
    check(
        RoundingMode::NearestEven,
        Scenario::Mul(0x0000_0000, 0x7f80_0000),
        nan,
    );
    check(
        RoundingMode::NearestEven,
        Scenario::Mul(0xff80_0000, 0x8000_0000),
        nan,
    );
    check(
        RoundingMode::NearestEven,
        Scenario::Div(0x8000_0000, 0x0000_0000),
        nan,
    );
    check(
        RoundingMode::NearestEven,
        Scenario::Div(0xbf80_0000, 0x0000_0000),
        0xff80_0000,
    );
    check(
        RoundingMode::NearestEven,
        Scenario::Fma(0x7f80_0000, 0x0000_0000, 0x3f80_0000),
        nan,
    );
}

#[test]
fn square_roots_of_signed_zeros_and_negatives() {
    check(RoundingMode::NearestEven, Scenario::Sqrt(0x8000_0000), 0x8000_0000);
    check(RoundingMode::NearestEven, Scenario::Sqrt(0x0000_0000), 0x0000_0000);
    check(RoundingMode::NearestEven, Scenario::Sqrt(0xbf80_0000), 0x7fc0_0000);
    check(RoundingMode::NearestEven, Scenario::Sqrt(0x7f80_0000), 0x7f80_0000);
}

#[test]
fn min_of_opposite_zeros_is_undefined_on_both_back_ends() {
    let fmt = Format::BINARY32;
    // Concrete.
    let concrete_defined = {
        let bd = &mut Concrete;
        let pz_bits = UBits::lit(bd, 32, 0x0000_0000);
        let pz = unpack(bd, fmt, &pz_bits);
        let nz_bits = UBits::lit(bd, 32, 0x8000_0000);
        let nz = unpack(bd, fmt, &nz_bits);
        let undef_bits = UBits::lit(bd, 32, 0x3f80_0000);
        let undef = unpack(bd, fmt, &undef_bits);
        min_with_undefined(bd, fmt, &pz, &nz, &undef).1
    };
    assert!(!concrete_defined);
    // Symbolic: the definedness proposition folds to the constant zero.
    let mut sym = SymBackend::new();
    let pz_bits = UBits::lit(&mut sym, 32, 0x0000_0000);
    let nz_bits = UBits::lit(&mut sym, 32, 0x8000_0000);
    let undef_bits = UBits::lit(&mut sym, 32, 0x3f80_0000);
    let pz = unpack(&mut sym, fmt, &pz_bits);
    let nz = unpack(&mut sym, fmt, &nz_bits);
    let undef = unpack(&mut sym, fmt, &undef_bits);
    let (_, defined) = min_with_undefined(&mut sym, fmt, &pz, &nz, &undef);
    let value = sym
        .dag()
        .eval(defined, &FxHashMap::default())
        .expect("closed");
    assert_eq!(value, BigUint::from(0u8));
}
