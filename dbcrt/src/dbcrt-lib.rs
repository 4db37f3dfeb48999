/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 *
*/

//! Runtime support for code generated by `dbcgen`.
//!
//! Generated message records implement the codec traits defined here and
//! live inside [`prelude::CanMsgSlot`] entries of the generated `CanMsgPool`.

#![doc(
    html_logo_url = "https://iot.bzh/images/defaults/company/512-479-max-transp.png",
    html_favicon_url = "https://iot.bzh/images/defaults/favicon.ico"
)]
extern crate bitflags;

#[cfg(feature = "serde")]
extern crate serde;

#[path = "./utils-mod.rs"]
mod utils;

#[path = "./dbcpool-mod.rs"]
mod dbcpool;

pub mod prelude {
    pub use crate::dbcpool::*;
    pub use crate::utils::*;
}
