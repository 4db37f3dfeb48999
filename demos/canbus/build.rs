/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

// generates OUT_DIR/canbus-types.rs and OUT_DIR/canbus-codec.rs from etc/demo-bus.json
use dbcgen::prelude::*;
use std::env;
use std::error::Error;

const HEADER: &str = "
// -----------------------------------------------------------------------
//         <- canbus demo, schema: etc/demo-bus.json ->
// -----------------------------------------------------------------------";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=etc/demo-bus.json");
    println!("cargo:rerun-if-changed=build.rs");

    let outdir = env::var("OUT_DIR")?;
    let code = DbcGenerator::new("canbus")
        .schema_file("etc/demo-bus.json")
        .outdir(&outdir)
        .header(HEADER)
        .serde(true)
        .generate()?;

    for warning in &code.warnings {
        println!("cargo:warning={warning}");
    }
    Ok(())
}
