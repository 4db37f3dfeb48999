/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

//! Per signal shift/mask statements of the generated pack and unpack routines.
//!
//! Generated routines work on two registers: `i` holds the frame as received
//! (intel signals), `m` holds it byte reversed (motorola signals). Once
//! reversed a motorola signal is a plain bit field, so both byte orders share
//! the same extraction statements.

use crate::data::{ByteOrder, Message, Signal};
use crate::error::DbcError;
use crate::output::CodeUnit;

/// Smallest unsigned storage holding `size` bits.
#[must_use]
pub fn unsigned_type(size: u64) -> &'static str {
    match size {
        n if n <= 8 => "u8",
        n if n <= 16 => "u16",
        n if n <= 32 => "u32",
        _ => "u64",
    }
}

/// Smallest signed storage holding `size` bits.
#[must_use]
pub fn signed_type(size: u64) -> &'static str {
    match size {
        n if n <= 8 => "i8",
        n if n <= 16 => "i16",
        n if n <= 32 => "i32",
        _ => "i64",
    }
}

impl Signal {
    /// Raw wire value storage type of the record field.
    #[must_use]
    pub fn get_data_type(&self) -> &'static str {
        if self.is_floating {
            if self.size == 64 {
                "f64"
            } else {
                "f32"
            }
        } else if self.is_signed() {
            signed_type(self.size)
        } else {
            unsigned_type(self.size)
        }
    }

    /// Register name the signal is extracted from.
    #[must_use]
    pub fn get_register(&self) -> &'static str {
        match self.byte_order {
            ByteOrder::BigEndian => "m",
            ByteOrder::LittleEndian => "i",
        }
    }

    /// Bits to OR in once the top payload bit is set, so the truncated storage
    /// reads back as a negative two's complement number. Zero when the signal
    /// fills its storage type.
    #[must_use]
    pub fn negative_mask(&self) -> u64 {
        if !self.is_signed() || self.is_floating {
            return 0;
        }
        let storage = match self.size {
            n if n <= 8 => 0xff,
            n if n <= 16 => 0xffff,
            n if n <= 32 => 0xffff_ffff,
            _ => u64::MAX,
        };
        !self.mask() & storage
    }
}

fn gen_signal_comment(code: &mut CodeUnit, indent: &str, sig: &Signal, start: u64) {
    let endianess = match sig.byte_order {
        ByteOrder::BigEndian => "motorola",
        ByteOrder::LittleEndian => "intel",
    };
    code_output!(
        code,
        indent,
        "// {}: start-bit {}, length {}, endianess {}, scaling {}, offset {}",
        sig.name,
        start,
        sig.size,
        endianess,
        sig.factor,
        sig.offset
    );
}

/// Emit statements extracting `sig` from its register into `self.<field>`.
///
/// # Errors
/// `InvalidStartBit` when the signal does not fit the frame.
pub fn gen_signal_unpack(
    code: &mut CodeUnit,
    indent: &str,
    sig: &Signal,
    msg: &Message,
) -> Result<(), DbcError> {
    let start = sig.canonical_start(msg)?;
    let reg = sig.get_register();
    let field = sig.get_type_snake();
    gen_signal_comment(code, indent, sig, start);

    if start == 0 {
        code_output!(code, indent, "x = {} & {:#x};", reg, sig.mask());
    } else {
        code_output!(code, indent, "x = ({} >> {}) & {:#x};", reg, start, sig.mask());
    }

    if sig.is_floating {
        if sig.size == 64 {
            code_output!(code, indent, "self.{} = unpack754_64(x);", field);
        } else {
            code_output!(code, indent, "self.{} = unpack754_32(x as u32);", field);
        }
        return Ok(());
    }

    let negative = sig.negative_mask();
    if negative != 0 {
        let top = 1_u64 << (sig.size - 1);
        code_output!(code, indent, "if x & {:#x} != 0 {{", top);
        code_output!(code, indent, "    x |= {:#x};", negative);
        code_output!(code, indent, "}");
    }
    code_output!(code, indent, "self.{} = x as {};", field, sig.get_data_type());
    Ok(())
}

/// Emit statements inserting `self.<field>` into its register.
///
/// # Errors
/// `InvalidStartBit` when the signal does not fit the frame.
pub fn gen_signal_pack(
    code: &mut CodeUnit,
    indent: &str,
    sig: &Signal,
    msg: &Message,
) -> Result<(), DbcError> {
    let start = sig.canonical_start(msg)?;
    let reg = sig.get_register();
    let field = sig.get_type_snake();
    gen_signal_comment(code, indent, sig, start);

    match (sig.is_floating, sig.size) {
        (true, 64) => code_output!(code, indent, "x = pack754_64(self.{}) & {:#x};", field, sig.mask()),
        (true, _) => code_output!(
            code,
            indent,
            "x = u64::from(pack754_32(self.{})) & {:#x};",
            field,
            sig.mask()
        ),
        _ => code_output!(code, indent, "x = (self.{} as u64) & {:#x};", field, sig.mask()),
    }

    if start != 0 {
        code_output!(code, indent, "x <<= {};", start);
    }
    code_output!(code, indent, "{} |= x;", reg);
    Ok(())
}
