/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

//! CAN database to Rust codec generator.
//!
//! Takes an in-memory CAN schema (messages -> signals) and emits, for every
//! message, direct shift/mask pack and unpack routines, scaled physical value
//! accessors and a bus wide aggregate with dispatch by CAN identifier. The
//! generated units depend on the `dbcrt` runtime crate.
//!
//! ```no_run
//! use dbcgen::prelude::*;
//!
//! let code = DbcGenerator::new("canbus")
//!     .schema_file("etc/bus.json")
//!     .outdir("target/generated")
//!     .generate()
//!     .expect("valid schema");
//! for warning in &code.warnings {
//!     println!("{warning}");
//! }
//! ```

#![doc(
    html_logo_url = "https://iot.bzh/images/defaults/company/512-479-max-transp.png",
    html_favicon_url = "https://iot.bzh/images/defaults/favicon.ico"
)]

#[macro_use]
#[path = "dbc-output.rs"]
pub mod output;

#[path = "dbc-error.rs"]
pub mod error;

#[path = "dbc-data.rs"]
pub mod data;

#[path = "dbc-bitpos.rs"]
pub mod bitpos;

#[path = "dbc-intcodec.rs"]
pub mod intcodec;

#[path = "dbc-float.rs"]
pub mod float;

#[path = "dbc-mux.rs"]
pub mod mux;

#[path = "dbc-scaling.rs"]
pub mod scaling;

#[path = "dbc-gencode.rs"]
pub mod gencode;

pub use crate::data::*;
pub use crate::error::*;
pub use crate::gencode::*;

/// Prelude for `use dbcgen::prelude::*;`
pub mod prelude {
    pub use crate::data::*;
    pub use crate::error::*;
    pub use crate::gencode::*;
}
