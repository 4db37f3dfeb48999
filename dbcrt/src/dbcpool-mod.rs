/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
*/
use crate::utils::CanError;
use bitflags::bitflags;
use std::fmt;
use std::io::Write;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Receive time stamp handed to `unpack`, units are up to the caller.
pub type CanTimeStamp = u64;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CanDataStatus {
    /// message never sent/received
    #[default]
    Unset,
    Ok,
    /// last decode failed (range/dlc/multiplex)
    Error,
}

impl fmt::Display for CanDataStatus {
    fn fmt(&self, format: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            CanDataStatus::Unset => "Unset",
            CanDataStatus::Ok => "Ok",
            CanDataStatus::Error => "Error",
        };
        write!(format, "{status}")
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct CanMsgFlag: u8 {
        /// message was unpacked at least once
        const RX = 0b0000_0001;
        /// message was packed at least once
        const TX = 0b0000_0010;
    }
}

impl Default for CanMsgFlag {
    fn default() -> Self {
        CanMsgFlag::empty()
    }
}

/// Static description every generated message record carries.
pub trait CanDbcMessage {
    const ID: u32;
    const DLC: u8;
    const NAME: &'static str;
}

pub trait CanMsgPack: CanDbcMessage {
    /// Encode the record into its on-wire 64 bit word.
    ///
    /// # Errors
    /// Returns `unknown-multiplex` when the multiplexor field selects no signal group.
    fn pack(&self) -> Result<u64, CanError>;
}

pub trait CanMsgUnpack: CanDbcMessage {
    /// Decode an on-wire 64 bit word into the record.
    ///
    /// # Errors
    /// Returns `invalid-dlc` when `dlc` is smaller than the declared DLC, or
    /// `unknown-multiplex` when the decoded multiplexor selects no signal group.
    fn unpack(&mut self, data: u64, dlc: u8) -> Result<(), CanError>;
}

pub trait CanMsgPrint: CanDbcMessage {
    /// Dump every signal raw value to `output`.
    ///
    /// # Errors
    /// Returns `print-fail` when `output` refuses a write.
    fn print<W: Write>(&self, output: &mut W) -> Result<(), CanError>;
}

/// One message entry of a generated `CanMsgPool`: decoded record plus its
/// receive time stamp and status bits.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanMsgSlot<T> {
    pub stamp: CanTimeStamp,
    pub status: CanDataStatus,
    pub flags: CanMsgFlag,
    pub data: T,
}

impl<T: CanDbcMessage> CanMsgSlot<T> {
    pub fn get_id(&self) -> u32 {
        T::ID
    }

    pub fn get_name(&self) -> &'static str {
        T::NAME
    }

    pub fn get_dlc(&self) -> u8 {
        T::DLC
    }
}

impl<T: Default> CanMsgSlot<T> {
    pub fn reset(&mut self) {
        *self = CanMsgSlot::default();
    }
}

impl<T: CanMsgPack> CanMsgSlot<T> {
    /// Pack the record and mark the slot as transmitted.
    ///
    /// # Errors
    /// Propagates the record `pack` failure, the slot is left untouched.
    pub fn pack(&mut self) -> Result<u64, CanError> {
        let data = self.data.pack()?;
        self.flags.insert(CanMsgFlag::TX);
        Ok(data)
    }
}

impl<T: CanMsgUnpack> CanMsgSlot<T> {
    /// Unpack `data` into the record, stamp it and mark it as received.
    ///
    /// # Errors
    /// Propagates the record `unpack` failure after flagging the slot status as `Error`.
    pub fn unpack(&mut self, data: u64, dlc: u8, stamp: CanTimeStamp) -> Result<(), CanError> {
        match self.data.unpack(data, dlc) {
            Ok(()) => {
                self.status = CanDataStatus::Ok;
                self.flags.insert(CanMsgFlag::RX);
                self.stamp = stamp;
                Ok(())
            }
            Err(error) => {
                self.status = CanDataStatus::Error;
                Err(error)
            }
        }
    }
}

impl<T: CanMsgPrint> CanMsgSlot<T> {
    /// # Errors
    /// Returns `print-fail` when `output` refuses a write.
    pub fn print<W: Write>(&self, output: &mut W) -> Result<(), CanError> {
        self.data.print(output)
    }
}

/// Identifier keyed view over a generated database aggregate.
pub trait CanDbcPool {
    fn get_uid(&self) -> &'static str;

    /// Returns the list of known CAN IDs, sorted ascending.
    fn get_ids(&self) -> &'static [u32];

    /// # Errors
    /// Returns `unknown-canid` when `canid` is not part of the database.
    fn get_name(&self, canid: u32) -> Result<&'static str, CanError>;

    /// Returns status, flags and receive stamp of the `canid` slot.
    ///
    /// # Errors
    /// Returns `unknown-canid` when `canid` is not part of the database.
    fn get_status(&self, canid: u32) -> Result<(CanDataStatus, CanMsgFlag, CanTimeStamp), CanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, Clone, PartialEq)]
    struct Probe {
        value: u8,
    }

    impl CanDbcMessage for Probe {
        const ID: u32 = 0x42;
        const DLC: u8 = 1;
        const NAME: &'static str = "Probe";
    }

    impl CanMsgPack for Probe {
        fn pack(&self) -> Result<u64, CanError> {
            Ok(u64::from(self.value))
        }
    }

    impl CanMsgUnpack for Probe {
        fn unpack(&mut self, data: u64, dlc: u8) -> Result<(), CanError> {
            if dlc < Self::DLC {
                return Err(CanError::new("invalid-dlc", "too short"));
            }
            self.value = (data & 0xff) as u8;
            Ok(())
        }
    }

    #[test]
    fn slot_starts_unset() {
        let slot = CanMsgSlot::<Probe>::default();
        assert_eq!(slot.status, CanDataStatus::Unset);
        assert!(slot.flags.is_empty());
        assert_eq!(slot.get_id(), 0x42);
        assert_eq!(slot.get_name(), "Probe");
    }

    #[test]
    fn slot_pack_marks_tx() {
        let mut slot = CanMsgSlot::<Probe>::default();
        slot.data.value = 7;
        assert_eq!(slot.pack().unwrap(), 7);
        assert!(slot.flags.contains(CanMsgFlag::TX));
        assert!(!slot.flags.contains(CanMsgFlag::RX));
    }

    #[test]
    fn slot_unpack_marks_rx_and_stamp() {
        let mut slot = CanMsgSlot::<Probe>::default();
        slot.unpack(0x1234, 1, 99).unwrap();
        assert_eq!(slot.data.value, 0x34);
        assert_eq!(slot.stamp, 99);
        assert_eq!(slot.status, CanDataStatus::Ok);
        assert!(slot.flags.contains(CanMsgFlag::RX));
    }

    #[test]
    fn slot_unpack_failure_flags_error() {
        let mut slot = CanMsgSlot::<Probe>::default();
        let error = slot.unpack(0x12, 0, 5).unwrap_err();
        assert_eq!(error.get_uid(), "invalid-dlc");
        assert_eq!(slot.status, CanDataStatus::Error);
        assert_eq!(slot.stamp, 0);
        assert!(slot.flags.is_empty());

        slot.reset();
        assert_eq!(slot, CanMsgSlot::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn slot_serializes() {
        let mut slot = CanMsgSlot::<u8>::default();
        slot.flags = CanMsgFlag::RX;
        let json = serde_json::to_string(&slot).unwrap();
        assert!(json.contains("\"status\":\"Unset\""));
    }
}
