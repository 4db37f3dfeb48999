/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * IEEE-754 packing adapted from Beej's Guide to Network Programming (public domain).
 */

/// Encode `f` as an IEEE-754 number of `bits` total width with `expbits`
/// exponent bits, without relying on the host float layout.
#[allow(dead_code, clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn pack754(f: f64, bits: u32, expbits: u32) -> u64 {
    let signbit = 1_u64 << (bits - 1);
    let significandbits = bits - expbits - 1;
    let expset = ((1_u64 << expbits) - 1) << significandbits;

    if f == 0.0 {
        return if f.is_sign_negative() { signbit } else { 0 };
    }
    if f.is_nan() {
        return signbit - 1;
    }
    if f.is_infinite() {
        return if f < 0.0 { signbit | expset } else { expset };
    }

    let (sign, mut fnorm) = if f < 0.0 { (signbit, -f) } else { (0, f) };

    // normalize into [1.0, 2.0) and track the exponent
    let mut shift: i64 = 0;
    while fnorm >= 2.0 {
        fnorm /= 2.0;
        shift += 1;
    }
    while fnorm < 1.0 {
        fnorm *= 2.0;
        shift -= 1;
    }
    fnorm -= 1.0;

    let significand = (fnorm * ((1_u64 << significandbits) as f64 + 0.5)) as u64;
    let bias = (1_i64 << (expbits - 1)) - 1;
    let exp = ((shift + bias) as u64) & ((1_u64 << expbits) - 1);

    sign | (exp << significandbits) | significand
}

#[allow(dead_code, clippy::cast_possible_truncation)]
pub fn pack754_32(f: f32) -> u32 {
    pack754(f64::from(f), 32, 8) as u32
}

#[allow(dead_code)]
pub fn pack754_64(f: f64) -> u64 {
    pack754(f, 64, 11)
}
