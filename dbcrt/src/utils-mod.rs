/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Runtime codec failure returned by generated routines.
///
/// `uid` is one of:
/// - `out-of-range`: physical value outside the declared signal range
/// - `invalid-dlc`: received length smaller than the declared DLC
/// - `unknown-multiplex`: multiplexor value without a matching signal group
/// - `unknown-canid`: identifier not defined in the database
/// - `invalid-frame`: raw frame longer than 8 bytes
/// - `print-fail`: output sink rejected a write
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub struct CanError {
    uid: String,
    info: String,
}

pub trait MakeError<T> {
    fn make(uid: &str, msg: T) -> CanError;
}

impl MakeError<&str> for CanError {
    fn make(uid: &str, msg: &str) -> CanError {
        CanError { uid: uid.to_string(), info: msg.to_string() }
    }
}

impl MakeError<String> for CanError {
    fn make(uid: &str, msg: String) -> CanError {
        CanError { uid: uid.to_string(), info: msg }
    }
}

impl CanError {
    pub fn new<T>(uid: &str, msg: T) -> CanError
    where
        CanError: MakeError<T>,
    {
        Self::make(uid, msg)
    }
    #[must_use]
    pub fn get_uid(&self) -> String {
        self.uid.clone()
    }
    #[must_use]
    pub fn get_info(&self) -> String {
        self.info.clone()
    }
}

impl fmt::Display for CanError {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        write!(format, "uid:{} info:{}", self.uid, self.info)
    }
}

impl fmt::Debug for CanError {
    fn fmt(&self, format: &mut fmt::Formatter) -> fmt::Result {
        write!(format, "uid:{} info:{}", self.uid, self.info)
    }
}

impl std::error::Error for CanError {}

/// Assemble up to 8 received bytes into the 64 bit word consumed by generated
/// `unpack` routines. Byte 0 of the frame lands in the least significant byte.
///
/// # Errors
/// Returns `invalid-frame` when `data` holds more than 8 bytes.
pub fn can_frame_word(data: &[u8]) -> Result<u64, CanError> {
    if data.len() > 8 {
        return Err(CanError::new(
            "invalid-frame",
            format!("frame len:{} exceeds 8 bytes", data.len()),
        ));
    }
    let mut buffer = [0_u8; 8];
    buffer[..data.len()].copy_from_slice(data);
    Ok(u64::from_le_bytes(buffer))
}

/// Split a packed 64 bit word back into on-wire frame bytes.
#[must_use]
pub fn can_word_frame(word: u64) -> [u8; 8] {
    word.to_le_bytes()
}

/// Write one `name = (wire: value)` line, used by generated print routines.
/// Integer fields are printed as integers, floats with their shortest form.
///
/// # Errors
/// Returns `print-fail` when the output sink refuses the write.
pub fn can_print_signal<W: Write, V: fmt::Display>(
    output: &mut W,
    name: &str,
    value: V,
) -> Result<(), CanError> {
    writeln!(output, "{name} = (wire: {value})")
        .map_err(|error| CanError::new("print-fail", error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_keeps_uid_and_info() {
        let error = CanError::new("unknown-canid", format!("canid:{} not found", 0x42));
        assert_eq!(error.get_uid(), "unknown-canid");
        assert_eq!(error.get_info(), "canid:66 not found");
        assert_eq!(error.to_string(), "uid:unknown-canid info:canid:66 not found");
    }

    #[test]
    fn frame_word_is_little_endian() {
        let word = can_frame_word(&[0x11, 0x22, 0x33]).unwrap();
        assert_eq!(word, 0x0033_2211);
        assert_eq!(can_word_frame(word), [0x11, 0x22, 0x33, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn frame_word_rejects_long_frames() {
        let error = can_frame_word(&[0; 9]).unwrap_err();
        assert_eq!(error.get_uid(), "invalid-frame");
    }

    #[test]
    fn print_signal_formats_wire_values() {
        let mut output = Vec::new();
        can_print_signal(&mut output, "Speed", 12_u16).unwrap();
        can_print_signal(&mut output, "Ratio", 0.5_f32).unwrap();
        can_print_signal(&mut output, "Level", -1_i16).unwrap();
        // beyond f64 integer precision
        can_print_signal(&mut output, "Odometer", u64::MAX).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "Speed = (wire: 12)\nRatio = (wire: 0.5)\nLevel = (wire: -1)\nOdometer = (wire: 18446744073709551615)\n"
        );
    }
}
