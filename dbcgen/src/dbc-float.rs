/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

//! Portable IEEE-754 conversion routines copied into the implementation unit
//! whenever the database holds a floating point signal.
//!
//! The emitted text is the very source compiled (and tested) below.

use crate::output::{CodeUnit, IDT0};

#[path = "float754-pack.rs"]
mod pack;

#[path = "float754-unpack.rs"]
mod unpack;

const FLOAT754_PACK: &str = include_str!("float754-pack.rs");
const FLOAT754_UNPACK: &str = include_str!("float754-unpack.rs");

/// Emit `pack754`, `pack754_32` and `pack754_64`.
pub fn gen_float_pack(code: &mut CodeUnit) {
    code_output!(code, IDT0, FLOAT754_PACK);
}

/// Emit `unpack754`, `unpack754_32` and `unpack754_64`.
pub fn gen_float_unpack(code: &mut CodeUnit) {
    code_output!(code, IDT0, FLOAT754_UNPACK);
}

#[cfg(test)]
mod tests {
    use super::pack::*;
    use super::unpack::*;

    #[test]
    fn pack_matches_native_layout() {
        for value in [1.0_f32, -1.0, 0.1, 3.5, -2.75e-3, 1.0e30, f32::MIN_POSITIVE, f32::MAX] {
            assert_eq!(pack754_32(value), value.to_bits(), "f32:{value}");
        }
        for value in [1.0_f64, -1.0, 0.1, 1234.5678, -9.87e-200, f64::MAX] {
            assert_eq!(pack754_64(value), value.to_bits(), "f64:{value}");
        }
    }

    #[test]
    fn pack_special_values() {
        assert_eq!(pack754_32(0.0), 0);
        assert_eq!(pack754_32(-0.0), 0x8000_0000);
        assert_eq!(pack754_32(f32::INFINITY), 0x7f80_0000);
        assert_eq!(pack754_32(f32::NEG_INFINITY), 0xff80_0000);
        assert!(f32::from_bits(pack754_32(f32::NAN)).is_nan());
        assert_eq!(pack754_64(f64::INFINITY), 0x7ff0_0000_0000_0000);
    }

    #[test]
    fn unpack_matches_native_layout() {
        for bits in [0x3f80_0000_u32, 0xbf80_0000, 0x3dcc_cccd, 0x4060_0000, 0x7f7f_ffff] {
            assert_eq!(unpack754_32(bits).to_bits(), bits, "bits:{bits:#x}");
        }
        for value in [1.0_f64, -0.5, 1234.5678, 6.02e23] {
            assert_eq!(unpack754_64(value.to_bits()).to_bits(), value.to_bits());
        }
    }

    #[test]
    fn unpack_special_values() {
        let zero = unpack754_32(0x8000_0000);
        assert_eq!(zero, 0.0);
        assert!(zero.is_sign_negative());
        assert!(unpack754_32(0).is_sign_positive());
        assert_eq!(unpack754_32(0x7f80_0000), f32::INFINITY);
        assert_eq!(unpack754_32(0xff80_0000), f32::NEG_INFINITY);
        assert!(unpack754_32(0x7fc0_0000).is_nan());
        assert!(unpack754_64(0x7ff8_0000_0000_0000).is_nan());
    }

    #[test]
    fn emitted_text_carries_routines() {
        let mut code = crate::output::CodeUnit::new();
        super::gen_float_pack(&mut code);
        super::gen_float_unpack(&mut code);
        let text = code.into_string();
        assert!(text.contains("pub fn pack754_32(f: f32) -> u32 {"));
        assert!(text.contains("pub fn unpack754_64(i: u64) -> f64 {"));
    }
}
