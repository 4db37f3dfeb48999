/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

//! Demo bus codec, generated at build time by `build.rs` from `etc/demo-bus.json`.

/// Records, aggregate and codec routines of the demo bus.
#[allow(clippy::all, clippy::pedantic, missing_docs)]
pub mod canbus {
    include!(concat!(env!("OUT_DIR"), "/canbus-types.rs"));
    include!(concat!(env!("OUT_DIR"), "/canbus-codec.rs"));
}

pub use canbus::CanMsgPool;
