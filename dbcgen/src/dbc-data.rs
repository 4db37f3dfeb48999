/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

//! In-memory CAN database: messages, signals and their wire layout.
//!
//! The schema is handed over already parsed. It can be built in code through
//! the small builder helpers below, or loaded from its JSON dump.

use crate::bitpos::resolve_start_bit;
use crate::error::DbcError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// CAN identifier (11 or 29 bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u32);

/// Signal bit numbering on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// intel, bit 0 is the least significant bit of byte 0
    #[serde(alias = "intel")]
    LittleEndian,
    /// motorola, start bit points to the most significant bit
    #[serde(alias = "motorola")]
    BigEndian,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Signed,
    Unsigned,
}

/// Multiplex role of a signal inside its message.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplexIndicator {
    /// always present
    #[default]
    Plain,
    /// selector, its raw value picks the active signal group
    Multiplexor,
    /// only present when the multiplexor equals the switch value
    MultiplexedSignal(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    #[serde(default)]
    pub multiplexer_indicator: MultiplexIndicator,
    pub start_bit: u64,
    pub size: u64,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// IEEE-754 payload, size must be 32 or 64
    #[serde(default)]
    pub is_floating: bool,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub receivers: Vec<String>,
}

fn default_factor() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub name: String,
    /// DLC, declared payload length in bytes
    pub size: u64,
    #[serde(default)]
    pub transmitter: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

/// Full bus description, the generator input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DbcObject {
    pub messages: Vec<Message>,
    /// at least one signal carries an IEEE-754 payload
    #[serde(skip)]
    use_float: bool,
}

impl Signal {
    /// Unsigned intel signal with unit scaling and no declared range.
    #[must_use]
    pub fn new(name: &str, start_bit: u64, size: u64, byte_order: ByteOrder) -> Self {
        Signal {
            name: name.to_owned(),
            multiplexer_indicator: MultiplexIndicator::Plain,
            start_bit,
            size,
            byte_order,
            value_type: ValueType::Unsigned,
            is_floating: false,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: String::new(),
            comment: None,
            receivers: Vec::new(),
        }
    }

    #[must_use]
    pub fn signed(mut self) -> Self {
        self.value_type = ValueType::Signed;
        self
    }

    #[must_use]
    pub fn floating(mut self) -> Self {
        self.is_floating = true;
        self
    }

    #[must_use]
    pub fn scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_owned();
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_owned());
        self
    }

    #[must_use]
    pub fn multiplexor(mut self) -> Self {
        self.multiplexer_indicator = MultiplexIndicator::Multiplexor;
        self
    }

    #[must_use]
    pub fn multiplexed(mut self, switch_value: u64) -> Self {
        self.multiplexer_indicator = MultiplexIndicator::MultiplexedSignal(switch_value);
        self
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.value_type == ValueType::Signed
    }

    #[must_use]
    pub fn is_multiplexor(&self) -> bool {
        self.multiplexer_indicator == MultiplexIndicator::Multiplexor
    }

    #[must_use]
    pub fn switch_value(&self) -> Option<u64> {
        match self.multiplexer_indicator {
            MultiplexIndicator::MultiplexedSignal(value) => Some(value),
            _ => None,
        }
    }

    /// Raw payload mask, `size` low bits set.
    #[must_use]
    pub fn mask(&self) -> u64 {
        if self.size >= 64 {
            u64::MAX
        } else {
            (1_u64 << self.size) - 1
        }
    }

    /// Reject signals no code can be generated for.
    ///
    /// # Errors
    /// `InvalidSignalSize`, `InvalidFloatSize`, `InvalidScaling` or `InvalidStartBit`.
    pub fn validate(&self, msg: &Message) -> Result<(), DbcError> {
        if self.size == 0 || self.size > 64 {
            return Err(DbcError::InvalidSignalSize {
                message: msg.name.clone(),
                signal: self.name.clone(),
                size: self.size,
            });
        }

        if self.is_floating && self.size != 32 && self.size != 64 {
            return Err(DbcError::InvalidFloatSize {
                message: msg.name.clone(),
                signal: self.name.clone(),
                size: self.size,
            });
        }

        if self.factor == 0.0 {
            return Err(DbcError::InvalidScaling {
                message: msg.name.clone(),
                signal: self.name.clone(),
            });
        }

        self.canonical_start(msg)?;
        Ok(())
    }

    /// Least significant bit position of the signal inside its 64 bit register.
    ///
    /// # Errors
    /// `InvalidStartBit` when the signal does not fit a 64 bit frame.
    pub fn canonical_start(&self, msg: &Message) -> Result<u64, DbcError> {
        let start = resolve_start_bit(self.byte_order, self.start_bit, self.size)
            .filter(|start| start.checked_add(self.size).is_some_and(|end| end <= 64));

        start.ok_or_else(|| DbcError::InvalidStartBit {
            message: msg.name.clone(),
            signal: self.name.clone(),
            start_bit: self.start_bit,
            size: self.size,
        })
    }
}

impl Message {
    #[must_use]
    pub fn new(id: u32, name: &str, size: u64, signals: Vec<Signal>) -> Self {
        Message {
            id: MessageId(id),
            name: name.to_owned(),
            size,
            transmitter: None,
            comment: None,
            signals,
        }
    }

    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_owned());
        self
    }

    #[must_use]
    pub fn transmitter(mut self, transmitter: &str) -> Self {
        self.transmitter = Some(transmitter.to_owned());
        self
    }

    #[must_use]
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|sig| sig.name == name)
    }

    /// # Errors
    /// `InvalidMessageId`, `InvalidDlc` or the first signal validation failure.
    pub fn validate(&self) -> Result<(), DbcError> {
        if self.id.0 >= 1 << 29 {
            return Err(DbcError::InvalidMessageId { message: self.name.clone(), id: self.id.0 });
        }
        if self.size > 8 {
            return Err(DbcError::InvalidDlc { message: self.name.clone(), size: self.size });
        }
        for sig in &self.signals {
            sig.validate(self)?;
        }
        Ok(())
    }
}

impl DbcObject {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        let mut dbcfd = DbcObject { messages, use_float: false };
        dbcfd.update_float();
        dbcfd
    }

    /// # Errors
    /// `Json` when the text does not match the schema layout.
    pub fn from_json_str(text: &str) -> Result<Self, DbcError> {
        let mut dbcfd: DbcObject = serde_json::from_str(text)?;
        dbcfd.update_float();
        Ok(dbcfd)
    }

    /// # Errors
    /// `Io` when the file cannot be read, `Json` when its content is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DbcError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    #[must_use]
    pub fn use_float(&self) -> bool {
        self.use_float
    }

    pub(crate) fn update_float(&mut self) {
        self.use_float =
            self.messages.iter().flat_map(|msg| msg.signals.iter()).any(|sig| sig.is_floating);
    }
}
