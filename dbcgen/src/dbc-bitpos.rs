/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

use crate::data::ByteOrder;

/// Map a declared start bit onto the least significant bit position inside
/// the 64 bit register the generated code shifts from.
///
/// Intel positions are used as is. Motorola start bits name the most
/// significant bit in DBC sawtooth numbering; they are mirrored byte wise and
/// moved down by `size - 1`. Returns `None` when the arithmetic underflows,
/// meaning the signal would spill over the first byte of the frame.
#[must_use]
pub fn resolve_start_bit(byte_order: ByteOrder, start_bit: u64, size: u64) -> Option<u64> {
    match byte_order {
        ByteOrder::LittleEndian => Some(start_bit),
        ByteOrder::BigEndian => {
            let byte = start_bit.checked_div(8)?;
            let bit = start_bit.checked_rem(8)?;
            let msb = 7u64.checked_sub(byte)?.checked_mul(8)?.checked_add(bit)?;
            msb.checked_sub(size.checked_sub(1)?)
        }
    }
}
