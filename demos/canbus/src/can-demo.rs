/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

use candemo::CanMsgPool;
use clap::Parser;
use dbcrt::prelude::*;
use log::{debug, info};
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

/// Decode one raw CAN frame with the generated demo bus codec.
///
/// Examples:
///   can-demo --list
///   can-demo --canid 0x100 --data 40060a32fbff0000
///   can-demo -c 0x400 -d fff0 --json
#[derive(Debug, Parser)]
#[command(name = "can-demo", version, about, author)]
struct Args {
    /// CAN identifier, decimal or 0x prefixed hexadecimal
    #[arg(short = 'c', long = "canid", value_parser = parse_canid)]
    canid: Option<u32>,

    /// frame payload as hexadecimal bytes, byte 0 first
    #[arg(short = 'd', long = "data", default_value = "")]
    data: String,

    /// list known identifiers and exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// also dump the whole pool as JSON
    #[arg(short = 'j', long = "json")]
    json: bool,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_canid(text: &str) -> Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|error| format!("invalid canid:{text} ({error})"))
}

fn parse_frame(text: &str) -> Result<Vec<u8>, CanError> {
    let text = text.trim();
    if text.len() % 2 != 0 || !text.is_ascii() {
        return Err(CanError::new("invalid-frame", format!("data:{text} is not an hex byte string")));
    }
    (0..text.len())
        .step_by(2)
        .map(|idx| {
            let byte = &text[idx..idx + 2];
            u8::from_str_radix(byte, 16)
                .map_err(|error| CanError::new("invalid-frame", format!("invalid hex byte:{byte} ({error})")))
        })
        .collect()
}

fn init_logging(verbosity: u8) {
    // map -v levels to env_logger filters
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}

fn main() -> Result<(), CanError> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut pool = CanMsgPool::new();
    if args.list {
        for &canid in pool.get_ids() {
            println!("0x{canid:03X} {}", pool.get_name(canid)?);
        }
        return Ok(());
    }

    let Some(canid) = args.canid else {
        return Err(CanError::new("missing-canid", "--canid is mandatory unless --list"));
    };

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    let data = parse_frame(&args.data)?;
    let word = can_frame_word(&data)?;
    let dlc = u8::try_from(data.len()).unwrap_or(u8::MAX);
    debug!("canid:0x{canid:03X} word:{word:#018x} dlc:{dlc}");

    pool.unpack_by_id(canid, word, dlc, stamp)?;
    let (status, flags, stamp) = pool.get_status(canid)?;
    info!("canid:0x{canid:03X} name:{} status:{status} flags:{flags:?} stamp:{stamp}", pool.get_name(canid)?);

    let mut stdout = io::stdout();
    pool.print_by_id(canid, &mut stdout)?;

    if args.json {
        let json = serde_json::to_string_pretty(&pool)
            .map_err(|error| CanError::new("json-fail", error.to_string()))?;
        println!("{json}");
    }
    Ok(())
}
