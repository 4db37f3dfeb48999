/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

//! Physical value accessors: `decode_<signal>` and `encode_<signal>`.
//!
//! physical = raw * factor + offset. Declared bounds are only checked when
//! they are tighter than what the raw field can hold anyway.

use crate::data::{Message, Signal};
use crate::error::DbcError;
use crate::gencode::GenOptions;
use crate::output::{CodeUnit, IDT1, IDT2, IDT3};

/// Which declared bounds the accessors enforce.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeCheck {
    pub min: bool,
    pub max: bool,
}

impl RangeCheck {
    #[must_use]
    pub fn any(&self) -> bool {
        self.min || self.max
    }
}

/// Render a float as a typed Rust literal, `0.25_f64`, `-40.0_f64`.
#[must_use]
pub fn f64_literal(value: f64) -> String {
    format!("{value:?}_f64")
}

impl Signal {
    /// True when factor or offset moves the raw value.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_scaled(&self) -> bool {
        self.factor != 1.0 || self.offset != 0.0
    }

    /// Bounds the raw storage range does not already imply. `min == max`
    /// means no declared range. Floating point signals with a declared range
    /// always check both bounds.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap, clippy::float_cmp)]
    pub fn range_check(&self) -> RangeCheck {
        if self.min == self.max {
            return RangeCheck::default();
        }
        if self.is_floating {
            return RangeCheck { min: true, max: true };
        }
        if self.is_signed() {
            let (smin, smax) = if self.size >= 64 {
                (i64::MIN, i64::MAX)
            } else {
                let smax = (1_i64 << (self.size - 1)) - 1;
                (-smax - 1, smax)
            };
            RangeCheck { min: self.min > smin as f64, max: self.max < smax as f64 }
        } else {
            RangeCheck { min: self.min > 0.0, max: self.max < self.mask() as f64 }
        }
    }

    /// Type of the value handed to or returned by the accessors.
    #[must_use]
    pub fn get_physical_type(&self, opts: &GenOptions) -> &'static str {
        if self.is_scaled() || opts.use_doubles_for_scaled_accessors {
            "f64"
        } else {
            self.get_data_type()
        }
    }
}

fn gen_range_error(code: &mut CodeUnit, msg: &Message, sig: &Signal, value: &str, bound: &str) {
    code_output!(
        code,
        IDT3,
        "return Err(CanError::new(\"out-of-range\", format!(\"{}:{}={{}} {}\", {})));",
        msg.name,
        sig.name,
        bound,
        value
    );
}

/// Emit `decode_<signal>` returning the physical value.
///
/// # Errors
/// `InvalidScaling` on a zero factor.
pub fn gen_signal_decode(
    code: &mut CodeUnit,
    msg: &Message,
    sig: &Signal,
    opts: &GenOptions,
) -> Result<(), DbcError> {
    if sig.factor == 0.0 {
        return Err(DbcError::InvalidScaling { message: msg.name.clone(), signal: sig.name.clone() });
    }

    let field = sig.get_type_snake();
    let physical = sig.get_physical_type(opts);
    let check = sig.range_check();
    #[allow(clippy::float_cmp)]
    let (scale, shift) = (sig.factor != 1.0, sig.offset != 0.0);

    code_output!(code, IDT1, "/// {}::{} physical value{}", msg.name, sig.name, unit_suffix(sig));
    code_output!(code, IDT1, "pub fn decode_{}(&self) -> Result<{}, CanError> {{", field, physical);
    if scale || shift {
        code_output!(code, IDT2, "let mut rval = self.{} as {};", field, physical);
        if scale {
            code_output!(code, IDT2, "rval *= {};", f64_literal(sig.factor));
        }
        if shift {
            code_output!(code, IDT2, "rval += {};", f64_literal(sig.offset));
        }
    } else {
        code_output!(code, IDT2, "let rval = self.{} as {};", field, physical);
    }

    let rval = if physical == "f64" { "rval" } else { "(rval as f64)" };
    if check.min {
        code_output!(code, IDT2, "if {} < {} {{", rval, f64_literal(sig.min));
        gen_range_error(code, msg, sig, "rval", &format!("below {}", sig.min));
        code_output!(code, IDT2, "}");
    }
    if check.max {
        code_output!(code, IDT2, "if {} > {} {{", rval, f64_literal(sig.max));
        gen_range_error(code, msg, sig, "rval", &format!("above {}", sig.max));
        code_output!(code, IDT2, "}");
    }
    code_output!(code, IDT2, "Ok(rval)");
    code_output!(code, IDT1, "}\n");
    Ok(())
}

/// Emit `encode_<signal>` storing a physical value into the raw field.
///
/// When a bound is checked the raw field is cleared first, so a rejected
/// value leaves it at zero.
///
/// # Errors
/// `InvalidScaling` on a zero factor.
pub fn gen_signal_encode(
    code: &mut CodeUnit,
    msg: &Message,
    sig: &Signal,
    opts: &GenOptions,
) -> Result<(), DbcError> {
    if sig.factor == 0.0 {
        return Err(DbcError::InvalidScaling { message: msg.name.clone(), signal: sig.name.clone() });
    }

    let field = sig.get_type_snake();
    let physical = sig.get_physical_type(opts);
    let raw = sig.get_data_type();
    let check = sig.range_check();
    #[allow(clippy::float_cmp)]
    let (scale, shift) = (sig.factor != 1.0, sig.offset != 0.0);

    code_output!(code, IDT1, "/// {}::{} from physical value{}", msg.name, sig.name, unit_suffix(sig));
    code_output!(code, IDT1, "pub fn encode_{}(&mut self, value: {}) -> Result<(), CanError> {{", field, physical);

    if check.any() {
        let zero = if sig.is_floating { "0.0" } else { "0" };
        code_output!(code, IDT2, "self.{} = {};", field, zero);
    }
    let value = if physical == "f64" { "value" } else { "(value as f64)" };
    if check.min {
        code_output!(code, IDT2, "if {} < {} {{", value, f64_literal(sig.min));
        gen_range_error(code, msg, sig, "value", &format!("below {}", sig.min));
        code_output!(code, IDT2, "}");
    }
    if check.max {
        code_output!(code, IDT2, "if {} > {} {{", value, f64_literal(sig.max));
        gen_range_error(code, msg, sig, "value", &format!("above {}", sig.max));
        code_output!(code, IDT2, "}");
    }

    if physical == raw {
        code_output!(code, IDT2, "self.{} = value;", field);
    } else {
        match (shift, scale) {
            (true, true) => code_output!(
                code,
                IDT2,
                "let value = (value - {}) / {};",
                f64_literal(sig.offset),
                f64_literal(sig.factor)
            ),
            (true, false) => code_output!(code, IDT2, "let value = value - {};", f64_literal(sig.offset)),
            (false, true) => code_output!(code, IDT2, "let value = value / {};", f64_literal(sig.factor)),
            (false, false) => {}
        }
        if sig.is_floating {
            code_output!(code, IDT2, "self.{} = value as {};", field, raw);
        } else {
            code_output!(code, IDT2, "self.{} = value.round() as {};", field, raw);
        }
    }
    code_output!(code, IDT2, "Ok(())");
    code_output!(code, IDT1, "}\n");
    Ok(())
}

fn unit_suffix(sig: &Signal) -> String {
    if sig.unit.is_empty() {
        String::new()
    } else {
        format!(" [{}]", sig.unit)
    }
}
