/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
 * IEEE-754 unpacking adapted from Beej's Guide to Network Programming (public domain).
 */

/// Decode an IEEE-754 number of `bits` total width with `expbits` exponent
/// bits. A zero magnitude keeps its sign, so `-0.0` reads back as `-0.0`.
#[allow(dead_code, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn unpack754(i: u64, bits: u32, expbits: u32) -> f64 {
    let signbit = 1_u64 << (bits - 1);
    let significandbits = bits - expbits - 1;
    let significandmask = (1_u64 << significandbits) - 1;
    let expset = ((1_u64 << expbits) - 1) << significandbits;

    if i & !signbit == 0 {
        return if i & signbit != 0 { -0.0 } else { 0.0 };
    }
    if i & expset == expset {
        if i & significandmask != 0 {
            return f64::NAN;
        }
        return if i & signbit != 0 { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    // significand back to [1.0, 2.0)
    let mut result = (i & significandmask) as f64;
    result /= (1_u64 << significandbits) as f64;
    result += 1.0;

    let bias = (1_i64 << (expbits - 1)) - 1;
    let mut shift = ((i >> significandbits) & ((1_u64 << expbits) - 1)) as i64 - bias;
    while shift > 0 {
        result *= 2.0;
        shift -= 1;
    }
    while shift < 0 {
        result /= 2.0;
        shift += 1;
    }

    if i & signbit != 0 {
        -result
    } else {
        result
    }
}

#[allow(dead_code, clippy::cast_possible_truncation)]
pub fn unpack754_32(i: u32) -> f32 {
    unpack754(u64::from(i), 32, 8) as f32
}

#[allow(dead_code)]
pub fn unpack754_64(i: u64) -> f64 {
    unpack754(i, 64, 11)
}
