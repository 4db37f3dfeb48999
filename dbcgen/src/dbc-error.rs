/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

use std::fmt;
use thiserror::Error;

/// Fatal generation failure, the whole run is aborted.
#[derive(Debug, Error)]
pub enum DbcError {
    #[error("signal:{signal} in message:{message} has invalid scaling factor 0 (fix your dbc file)")]
    InvalidScaling { message: String, signal: String },

    #[error("signal:{signal} in message:{message} is floating point number but has length {size} (fix your dbc file)")]
    InvalidFloatSize { message: String, signal: String, size: u64 },

    #[error("signal:{signal} in message:{message} has bit length of {size} (fix your dbc file)")]
    InvalidSignalSize { message: String, signal: String, size: u64 },

    #[error("signal:{signal} in message:{message} starts at {start_bit} with {size} bits, it does not fit a 64 bits frame")]
    InvalidStartBit { message: String, signal: String, start_bit: u64, size: u64 },

    #[error("multiple multiplexor values detected (only one per CAN msg is allowed) for {message}")]
    DuplicateMultiplexor { message: String },

    #[error("multiplexor:{signal} in message:{message} must be an integer signal")]
    InvalidMultiplexor { message: String, signal: String },

    #[error("message:{message} canid:{id:#x} does not fit 29 bits")]
    InvalidMessageId { message: String, id: u32 },

    #[error("message:{message} declares {size} bytes, CAN frames hold at most 8")]
    InvalidDlc { message: String, size: u64 },

    #[error("setting schema or schema_file is mandatory")]
    MissingSchema,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fail to parse schema: {0}")]
    Json(#[from] serde_json::Error),
}

/// Non fatal schema issue, generation proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbcWarning {
    DlcTooSmall { message: String, used: u64, available: u64 },
}

impl fmt::Display for DbcWarning {
    fn fmt(&self, format: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbcWarning::DlcTooSmall { message, used, available } => write!(
                format,
                "Too many signals, not enough bytes (DLC is too low, fix your DBC file): {message} uses {used} bits, frame holds {available}"
            ),
        }
    }
}
