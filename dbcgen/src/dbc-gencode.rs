/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

use crate::data::{DbcObject, Message, MessageId, Signal};
use crate::error::{DbcError, DbcWarning};
use crate::float::{gen_float_pack, gen_float_unpack};
use crate::intcodec::{gen_signal_pack, gen_signal_unpack};
use crate::mux::{gen_mux_switch, plain_signals, resolve_multiplex, MuxLayout};
use crate::output::{CodeUnit, IDT0, IDT1, IDT2, IDT3};
use crate::scaling::{f64_literal, gen_signal_decode, gen_signal_encode};
use chrono::Local;
use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

const KEYWORDS: [&str; 52] = [
    // https://doc.rust-lang.org/stable/reference/keywords.html
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "union",
];

/// Aggregate type name, shared by every generated database.
const POOL_TYPE: &str = "CanMsgPool";
const POOL_IDS: &str = "CAN_MSG_POOL_IDS";

fn safe_name(name: &str) -> String {
    if KEYWORDS.contains(&name.to_lowercase().as_str())
        || !name.starts_with(|c: char| c.is_ascii_alphabetic())
    {
        format!("X{name}")
    } else {
        name.to_owned()
    }
}

/// Knobs of one generation run. None of them changes bit layout semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenOptions {
    pub generate_pack: bool,
    pub generate_unpack: bool,
    pub generate_print: bool,
    /// unpack rejects a `dlc` above 8 bytes
    pub generate_asserts: bool,
    /// prefix record names with the hex CAN identifier
    pub use_identifier_in_name: bool,
    /// unscaled accessors take and return f64 as well
    pub use_doubles_for_scaled_accessors: bool,
    pub include_generation_timestamp: bool,
    /// records derive serde Serialize/Deserialize
    pub serde: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        GenOptions {
            generate_pack: true,
            generate_unpack: true,
            generate_print: true,
            generate_asserts: true,
            use_identifier_in_name: false,
            use_doubles_for_scaled_accessors: false,
            include_generation_timestamp: false,
            serde: false,
        }
    }
}

impl Message {
    /// Record type name.
    #[must_use]
    pub fn get_type_kamel(&self, opts: &GenOptions) -> String {
        let kamel = safe_name(&self.name).to_upper_camel_case();
        if opts.use_identifier_in_name {
            format!("Can0x{:03x}{}", self.id.0, kamel)
        } else {
            kamel
        }
    }

    /// Aggregate field name.
    #[must_use]
    pub fn get_field_snake(&self, opts: &GenOptions) -> String {
        let snake = safe_name(&self.name).to_snake_case();
        if opts.use_identifier_in_name {
            format!("can_0x{:03x}_{}", self.id.0, snake)
        } else {
            snake
        }
    }
}

impl Signal {
    #[must_use]
    pub fn get_type_kamel(&self) -> String {
        safe_name(&self.name).to_upper_camel_case()
    }

    /// Record field name.
    #[must_use]
    pub fn get_type_snake(&self) -> String {
        safe_name(&self.name).to_snake_case()
    }

    /// Prefix of the `_MIN`/`_MAX` range constants.
    #[must_use]
    pub fn get_const_shouty(&self) -> String {
        safe_name(&self.name).to_shouty_snake_case()
    }
}

/// Signals the codec routines actually move: plain ones plus every
/// multiplexed group member.
fn coded_signals<'a>(msg: &'a Message, layout: Option<&MuxLayout<'a>>) -> Vec<&'a Signal> {
    let mut signals: Vec<&Signal> = plain_signals(msg).collect();
    if let Some(layout) = layout {
        for group in &layout.groups {
            signals.extend(group.signals.iter().copied());
        }
    }
    signals
}

/// Frame bits used by plain signals plus the widest multiplexed group.
fn check_dlc(msg: &Message, layout: Option<&MuxLayout>) -> Option<DbcWarning> {
    let plain: u64 = plain_signals(msg).map(|sig| sig.size).sum();
    let used = plain + layout.map_or(0, MuxLayout::max_group_bits);
    let available = msg.size * 8;
    if used > available {
        Some(DbcWarning::DlcTooSmall { message: msg.name.clone(), used, available })
    } else {
        None
    }
}

pub trait MsgCodeGen {
    /// Record struct, range constants and `CanDbcMessage` impl.
    ///
    /// # Errors
    /// Never fails today, kept for symmetry with `gen_msg_codec`.
    fn gen_msg_types(&self, decl: &mut CodeUnit, opts: &GenOptions) -> Result<(), DbcError>;

    /// Pack/unpack/print impls and scaled accessors.
    ///
    /// # Errors
    /// Any schema error found while emitting a signal.
    fn gen_msg_codec(
        &self,
        code: &mut CodeUnit,
        opts: &GenOptions,
        layout: Option<&MuxLayout>,
    ) -> Result<(), DbcError>;
}

impl Message {
    fn gen_msg_pack(
        &self,
        code: &mut CodeUnit,
        layout: Option<&MuxLayout>,
        msg_type: &str,
    ) -> Result<(), DbcError> {
        let coded = coded_signals(self, layout);
        let motorola = coded.iter().any(|sig| sig.get_register() == "m");
        let intel = coded.iter().any(|sig| sig.get_register() == "i");

        code_output!(code, IDT0, "#[allow(unused_mut, unused_assignments, clippy::all)]");
        code_output!(code, IDT0, "impl CanMsgPack for {} {{", msg_type);
        code_output!(code, IDT1, "fn pack(&self) -> Result<u64, CanError> {");
        if !coded.is_empty() {
            code_output!(code, IDT2, "let mut x: u64;");
        }
        if motorola {
            code_output!(code, IDT2, "let mut m: u64 = 0;");
        }
        if intel {
            code_output!(code, IDT2, "let mut i: u64 = 0;");
        }

        for sig in plain_signals(self) {
            gen_signal_pack(code, IDT2, sig, self)?;
        }
        if let Some(layout) = layout {
            gen_mux_switch(code, IDT2, self, layout, |code, indent, sig| {
                gen_signal_pack(code, indent, sig, self)
            })?;
        }

        match (motorola, intel) {
            (true, true) => code_output!(code, IDT2, "Ok(m.swap_bytes() | i)"),
            (true, false) => code_output!(code, IDT2, "Ok(m.swap_bytes())"),
            (false, true) => code_output!(code, IDT2, "Ok(i)"),
            (false, false) => code_output!(code, IDT2, "Ok(0)"),
        }
        code_output!(code, IDT1, "}");
        code_output!(code, IDT0, "}\n");
        Ok(())
    }

    fn gen_msg_unpack(
        &self,
        code: &mut CodeUnit,
        opts: &GenOptions,
        layout: Option<&MuxLayout>,
        msg_type: &str,
    ) -> Result<(), DbcError> {
        let coded = coded_signals(self, layout);
        let motorola = coded.iter().any(|sig| sig.get_register() == "m");
        let intel = coded.iter().any(|sig| sig.get_register() == "i");

        code_output!(code, IDT0, "#[allow(unused_mut, unused_variables, clippy::all)]");
        code_output!(code, IDT0, "impl CanMsgUnpack for {} {{", msg_type);
        code_output!(code, IDT1, "fn unpack(&mut self, data: u64, dlc: u8) -> Result<(), CanError> {");
        if opts.generate_asserts {
            code_output!(code, IDT2, "if dlc > 8 {");
            code_output!(
                code,
                IDT3,
                "return Err(CanError::new(\"invalid-dlc\", format!(\"{} dlc:{{}} exceeds 8 bytes\", dlc)));",
                self.name
            );
            code_output!(code, IDT2, "}");
        }
        if self.size > 0 {
            code_output!(code, IDT2, "if dlc < {} {{", self.size);
            code_output!(
                code,
                IDT3,
                "return Err(CanError::new(\"invalid-dlc\", format!(\"{} dlc:{{}} < {}\", dlc)));",
                self.name,
                self.size
            );
            code_output!(code, IDT2, "}");
        }
        if !coded.is_empty() {
            code_output!(code, IDT2, "let mut x: u64;");
        }
        if motorola {
            code_output!(code, IDT2, "let m: u64 = data.swap_bytes();");
        }
        if intel {
            code_output!(code, IDT2, "let i: u64 = data;");
        }

        for sig in plain_signals(self) {
            gen_signal_unpack(code, IDT2, sig, self)?;
        }
        if let Some(layout) = layout {
            gen_mux_switch(code, IDT2, self, layout, |code, indent, sig| {
                gen_signal_unpack(code, indent, sig, self)
            })?;
        }

        code_output!(code, IDT2, "Ok(())");
        code_output!(code, IDT1, "}");
        code_output!(code, IDT0, "}\n");
        Ok(())
    }

    fn gen_msg_print(&self, code: &mut CodeUnit, msg_type: &str) {
        code_output!(code, IDT0, "#[allow(clippy::all)]");
        code_output!(code, IDT0, "impl CanMsgPrint for {} {{", msg_type);
        code_output!(
            code,
            IDT1,
            "fn print<W: std::io::Write>(&self, output: &mut W) -> Result<(), CanError> {"
        );
        if self.signals.is_empty() {
            code_output!(code, IDT2, "let _ = output;");
        }
        for sig in &self.signals {
            code_output!(
                code,
                IDT2,
                "can_print_signal(output, \"{}\", self.{})?;",
                sig.name,
                sig.get_type_snake()
            );
        }
        code_output!(code, IDT2, "Ok(())");
        code_output!(code, IDT1, "}");
        code_output!(code, IDT0, "}\n");
    }

    fn gen_signal_doc(sig: &Signal, decl: &mut CodeUnit) {
        code_output!(decl, IDT1, "/// {}", sig.name);
        code_output!(decl, IDT1, "///");
        code_output!(decl, IDT1, "/// - Min: {}", sig.min);
        code_output!(decl, IDT1, "/// - Max: {}", sig.max);
        code_output!(decl, IDT1, "/// - Unit: {:?}", sig.unit);
        code_output!(decl, IDT1, "/// - Start bit: {}", sig.start_bit);
        code_output!(decl, IDT1, "/// - Signal size: {} bits", sig.size);
        code_output!(decl, IDT1, "/// - Factor: {}", sig.factor);
        code_output!(decl, IDT1, "/// - Offset: {}", sig.offset);
        code_output!(decl, IDT1, "/// - Byte order: {:?}", sig.byte_order);
        code_output!(decl, IDT1, "/// - Value type: {:?}", sig.value_type);
        if sig.is_floating {
            code_output!(decl, IDT1, "/// - IEEE-754 float");
        }
        if let Some(value) = sig.switch_value() {
            code_output!(decl, IDT1, "/// - Multiplexed, switch value: {}", value);
        } else if sig.is_multiplexor() {
            code_output!(decl, IDT1, "/// - Multiplexor");
        }
        if let Some(comment) = &sig.comment {
            code_output!(decl, IDT1, "///");
            for line in comment.lines() {
                code_output!(decl, IDT1, "/// {}", line);
            }
        }
    }
}

impl MsgCodeGen for Message {
    fn gen_msg_types(&self, decl: &mut CodeUnit, opts: &GenOptions) -> Result<(), DbcError> {
        let msg_type = self.get_type_kamel(opts);

        code_output!(decl, IDT0, "/// {} Message", self.name);
        code_output!(decl, IDT0, "/// - ID: {} ({:#x})", self.id.0, self.id.0);
        code_output!(decl, IDT0, "/// - Size: {} bytes", self.size);
        if let Some(transmitter) = &self.transmitter {
            code_output!(decl, IDT0, "/// - Transmitter: {}", transmitter);
        }
        if let Some(comment) = &self.comment {
            code_output!(decl, IDT0, "///");
            for line in comment.lines() {
                code_output!(decl, IDT0, "/// {}", line);
            }
        }
        code_output!(decl, IDT0, "#[derive(Debug, Default, Clone, Copy, PartialEq)]");
        if opts.serde {
            code_output!(decl, IDT0, "#[derive(Serialize, Deserialize)]");
        }
        code_output!(decl, IDT0, "pub struct {} {{", msg_type);
        for sig in &self.signals {
            Message::gen_signal_doc(sig, decl);
            code_output!(decl, IDT1, "pub {}: {},", sig.get_type_snake(), sig.get_data_type());
        }
        code_output!(decl, IDT0, "}\n");

        let ranged: Vec<&Signal> = self.signals.iter().filter(|sig| sig.min != sig.max).collect();
        if !ranged.is_empty() {
            code_output!(decl, IDT0, "impl {} {{", msg_type);
            for sig in ranged {
                let shouty = sig.get_const_shouty();
                code_output!(decl, IDT1, "pub const {}_MIN: f64 = {};", shouty, f64_literal(sig.min));
                code_output!(decl, IDT1, "pub const {}_MAX: f64 = {};", shouty, f64_literal(sig.max));
            }
            code_output!(decl, IDT0, "}\n");
        }

        code_output!(decl, IDT0, "impl CanDbcMessage for {} {{", msg_type);
        code_output!(decl, IDT1, "const ID: u32 = {:#x};", self.id.0);
        code_output!(decl, IDT1, "const DLC: u8 = {};", self.size);
        code_output!(decl, IDT1, "const NAME: &'static str = \"{}\";", self.name);
        code_output!(decl, IDT0, "}\n");
        Ok(())
    }

    fn gen_msg_codec(
        &self,
        code: &mut CodeUnit,
        opts: &GenOptions,
        layout: Option<&MuxLayout>,
    ) -> Result<(), DbcError> {
        let msg_type = self.get_type_kamel(opts);
        code_output!(code, IDT0, "// {} ({:#x}) codec", self.name, self.id.0);

        if opts.generate_pack {
            self.gen_msg_pack(code, layout, &msg_type)?;
        }
        if opts.generate_unpack {
            self.gen_msg_unpack(code, opts, layout, &msg_type)?;
        }

        // decode goes with unpack, encode with pack
        if opts.generate_unpack || opts.generate_pack {
            code_output!(code, IDT0, "#[allow(clippy::all)]");
            code_output!(code, IDT0, "impl {} {{", msg_type);
            for sig in &self.signals {
                if opts.generate_unpack {
                    gen_signal_decode(code, self, sig, opts)?;
                }
                if opts.generate_pack {
                    gen_signal_encode(code, self, sig, opts)?;
                }
            }
            code_output!(code, IDT0, "}\n");
        }

        if opts.generate_print {
            self.gen_msg_print(code, &msg_type);
        }
        Ok(())
    }
}

/// Working state of one generation run.
struct DbcCodeGen {
    uid: &'static str,
    dbcfd: DbcObject,
    opts: GenOptions,
    decl: CodeUnit,
    code: CodeUnit,
}

impl DbcCodeGen {
    fn gen_banner(&mut self, source: &str, header: Option<&'static str>) {
        let stamp = if self.opts.include_generation_timestamp {
            format!(" ({})", Local::now().format("%c"))
        } else {
            String::new()
        };

        for unit in [&mut self.decl, &mut self.code] {
            if let Some(header) = header {
                code_output!(unit, IDT0, header);
            }
            code_output!(unit, IDT0, "// --------------------------------------------------------------");
            code_output!(unit, IDT0, "//       WARNING: Manual modification will be destroyed");
            code_output!(unit, IDT0, "// --------------------------------------------------------------");
            code_output!(unit, IDT0, "// - code generated from {}{}", source, stamp);
            code_output!(unit, IDT0, "// - update only with [dbcgen|build.rs::DbcGenerator]");
            code_output!(unit, IDT0, "// - source code: https://github.com/redpesk-labs/canbus-rs");
            code_output!(unit, IDT0, "// - (C)IoT.bzh(2023), Author: Fulup Ar Foll, http://redpesk.bzh");
            code_output!(unit, IDT0, "// - License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$");
            code_output!(unit, IDT0, "// --------------------------------------------------------------\n");
        }
    }

    fn gen_pool_types(&mut self) {
        let decl = &mut self.decl;
        let opts = &self.opts;

        code_output!(decl, IDT0, "/// Every `{}` message with its receive stamp and status bits", self.uid);
        code_output!(decl, IDT0, "#[derive(Debug, Default, Clone, PartialEq)]");
        if opts.serde {
            code_output!(decl, IDT0, "#[derive(Serialize, Deserialize)]");
        }
        code_output!(decl, IDT0, "pub struct {} {{", POOL_TYPE);
        for msg in &self.dbcfd.messages {
            code_output!(
                decl,
                IDT1,
                "pub {}: CanMsgSlot<{}>,",
                msg.get_field_snake(opts),
                msg.get_type_kamel(opts)
            );
        }
        code_output!(decl, IDT0, "}\n");

        let ids: Vec<String> =
            self.dbcfd.messages.iter().map(|msg| format!("{:#x}", msg.id.0)).collect();
        code_output!(decl, IDT0, "/// Sorted identifiers of every `{}` message", POOL_TYPE);
        code_output!(decl, IDT0, "pub static {}: [u32; {}] = [{}];\n", POOL_IDS, ids.len(), ids.join(", "));

        code_output!(decl, IDT0, "impl {} {{", POOL_TYPE);
        code_output!(decl, IDT1, "pub const UID: &'static str = \"{}\";", self.uid);
        code_output!(decl, IDT0, "}\n");
    }

    /// One `match canid` arm per message, `call` renders the arm body.
    fn gen_pool_match<F>(&mut self, indent: &str, call: F)
    where
        F: Fn(&str, &str) -> String,
    {
        let code = &mut self.code;
        let opts = &self.opts;
        code_output!(code, indent, "match canid {");
        for msg in &self.dbcfd.messages {
            code_output!(
                code,
                indent,
                "    {:#x} => {},",
                msg.id.0,
                call(&msg.get_field_snake(opts), &msg.get_type_kamel(opts))
            );
        }
        code_output!(
            code,
            indent,
            "    _ => Err(CanError::new(\"unknown-canid\", format!(\"canid:{{:#x}} not found in {}\", canid))),",
            self.uid
        );
        code_output!(code, indent, "}");
    }

    fn gen_pool_dispatch(&mut self) {
        code_output!(self.code, IDT0, "#[allow(unused_variables, clippy::all)]");
        code_output!(self.code, IDT0, "impl {} {{", POOL_TYPE);
        code_output!(self.code, IDT1, "#[must_use]");
        code_output!(self.code, IDT1, "pub fn new() -> Self {");
        code_output!(self.code, IDT2, "Self::default()");
        code_output!(self.code, IDT1, "}\n");

        if self.opts.generate_pack {
            code_output!(self.code, IDT1, "/// Pack the `canid` record into its on-wire 64 bit word.");
            code_output!(self.code, IDT1, "pub fn pack_by_id(&mut self, canid: u32) -> Result<u64, CanError> {");
            self.gen_pool_match(IDT2, |field, _| format!("self.{field}.pack()"));
            code_output!(self.code, IDT1, "}\n");
        }

        if self.opts.generate_unpack {
            code_output!(self.code, IDT1, "/// Unpack a received frame word into the `canid` record.");
            code_output!(
                self.code,
                IDT1,
                "pub fn unpack_by_id(&mut self, canid: u32, data: u64, dlc: u8, stamp: CanTimeStamp) -> Result<(), CanError> {"
            );
            self.gen_pool_match(IDT2, |field, _| format!("self.{field}.unpack(data, dlc, stamp)"));
            code_output!(self.code, IDT1, "}\n");
        }

        if self.opts.generate_print {
            code_output!(self.code, IDT1, "/// Dump the `canid` record raw values.");
            code_output!(
                self.code,
                IDT1,
                "pub fn print_by_id<W: std::io::Write>(&self, canid: u32, output: &mut W) -> Result<(), CanError> {"
            );
            self.gen_pool_match(IDT2, |field, _| format!("self.{field}.print(output)"));
            code_output!(self.code, IDT1, "}");
        }
        code_output!(self.code, IDT0, "}\n");

        code_output!(self.code, IDT0, "#[allow(clippy::all)]");
        code_output!(self.code, IDT0, "impl CanDbcPool for {} {{", POOL_TYPE);
        code_output!(self.code, IDT1, "fn get_uid(&self) -> &'static str {");
        code_output!(self.code, IDT2, "Self::UID");
        code_output!(self.code, IDT1, "}\n");
        code_output!(self.code, IDT1, "fn get_ids(&self) -> &'static [u32] {");
        code_output!(self.code, IDT2, "&{}", POOL_IDS);
        code_output!(self.code, IDT1, "}\n");
        code_output!(self.code, IDT1, "fn get_name(&self, canid: u32) -> Result<&'static str, CanError> {");
        self.gen_pool_match(IDT2, |_, msg_type| format!("Ok({msg_type}::NAME)"));
        code_output!(self.code, IDT1, "}\n");
        code_output!(
            self.code,
            IDT1,
            "fn get_status(&self, canid: u32) -> Result<(CanDataStatus, CanMsgFlag, CanTimeStamp), CanError> {"
        );
        self.gen_pool_match(IDT2, |field, _| {
            format!("Ok((self.{field}.status, self.{field}.flags, self.{field}.stamp))")
        });
        code_output!(self.code, IDT1, "}");
        code_output!(self.code, IDT0, "}");
    }
}

/// Emitted source units of one database.
#[derive(Clone, Debug, Default)]
pub struct GeneratedCode {
    /// `<stem>-types.rs`: records, range constants, aggregate
    pub declarations: String,
    /// `<stem>-codec.rs`: pack/unpack/print, accessors, dispatch
    pub implementation: String,
    pub warnings: Vec<DbcWarning>,
}

impl GeneratedCode {
    /// Write both units as `<outdir>/<stem>-types.rs` and `<outdir>/<stem>-codec.rs`.
    ///
    /// # Errors
    /// `Io` when the directory or a file cannot be written.
    pub fn write_to<P: AsRef<Path>>(&self, outdir: P, stem: &str) -> Result<(PathBuf, PathBuf), DbcError> {
        let outdir = outdir.as_ref();
        fs::create_dir_all(outdir)?;
        let types = outdir.join(format!("{stem}-types.rs"));
        let codec = outdir.join(format!("{stem}-codec.rs"));
        fs::write(&types, &self.declarations)?;
        fs::write(&codec, &self.implementation)?;
        Ok((types, codec))
    }
}

/// Code generator entry point, configured through chained setters.
pub struct DbcGenerator {
    uid: &'static str,
    schema: Option<DbcObject>,
    infile: Option<String>,
    outdir: Option<String>,
    stem: Option<String>,
    header: Option<&'static str>,
    whitelist: Option<Vec<u32>>,
    blacklist: Option<Vec<u32>>,
    opts: GenOptions,
}

impl DbcGenerator {
    #[must_use]
    pub fn new(uid: &'static str) -> Self {
        DbcGenerator {
            uid,
            schema: None,
            infile: None,
            outdir: None,
            stem: None,
            header: None,
            whitelist: None,
            blacklist: None,
            opts: GenOptions::default(),
        }
    }

    pub fn schema(&mut self, schema: DbcObject) -> &mut Self {
        self.schema = Some(schema);
        self
    }

    /// JSON schema dump, only read when no in-memory schema is set.
    pub fn schema_file(&mut self, path: &str) -> &mut Self {
        self.infile = Some(path.to_owned());
        self
    }

    pub fn outdir(&mut self, outdir: &str) -> &mut Self {
        self.outdir = Some(outdir.to_owned());
        self
    }

    /// Output file prefix, defaults to the uid.
    pub fn stem(&mut self, stem: &str) -> &mut Self {
        self.stem = Some(stem.to_owned());
        self
    }

    pub fn header(&mut self, header: &'static str) -> &mut Self {
        self.header = Some(header);
        self
    }

    pub fn whitelist(&mut self, canids: Vec<u32>) -> &mut Self {
        self.whitelist = Some(canids);
        self
    }

    pub fn blacklist(&mut self, canids: Vec<u32>) -> &mut Self {
        self.blacklist = Some(canids);
        self
    }

    pub fn options(&mut self, opts: GenOptions) -> &mut Self {
        self.opts = opts;
        self
    }

    pub fn generate_pack(&mut self, flag: bool) -> &mut Self {
        self.opts.generate_pack = flag;
        self
    }

    pub fn generate_unpack(&mut self, flag: bool) -> &mut Self {
        self.opts.generate_unpack = flag;
        self
    }

    pub fn generate_print(&mut self, flag: bool) -> &mut Self {
        self.opts.generate_print = flag;
        self
    }

    pub fn generate_asserts(&mut self, flag: bool) -> &mut Self {
        self.opts.generate_asserts = flag;
        self
    }

    pub fn use_identifier_in_name(&mut self, flag: bool) -> &mut Self {
        self.opts.use_identifier_in_name = flag;
        self
    }

    pub fn use_doubles_for_scaled_accessors(&mut self, flag: bool) -> &mut Self {
        self.opts.use_doubles_for_scaled_accessors = flag;
        self
    }

    pub fn include_generation_timestamp(&mut self, flag: bool) -> &mut Self {
        self.opts.include_generation_timestamp = flag;
        self
    }

    pub fn serde(&mut self, flag: bool) -> &mut Self {
        self.opts.serde = flag;
        self
    }

    fn check_list(canid: MessageId, list: &[u32]) -> bool {
        list.binary_search(&canid.0).is_ok()
    }

    /// Generate both source units from the configured schema.
    ///
    /// Nothing is emitted when any message fails validation.
    ///
    /// # Errors
    /// `MissingSchema`, any schema error, or I/O errors reading the schema
    /// file and writing the units.
    pub fn generate(&mut self) -> Result<GeneratedCode, DbcError> {
        let (mut dbcfd, source) = match (&self.schema, &self.infile) {
            (Some(schema), _) => (schema.clone(), "in-memory schema".to_owned()),
            (None, Some(infile)) => (DbcObject::from_file(infile)?, infile.clone()),
            (None, None) => return Err(DbcError::MissingSchema),
        };
        info!("dbcgen uid:{} generating from {}", self.uid, source);

        if let Some(mut list) = self.whitelist.clone() {
            list.sort_unstable();
            dbcfd.messages.retain(|msg| DbcGenerator::check_list(msg.id, &list));
        }

        if let Some(mut list) = self.blacklist.clone() {
            list.sort_unstable();
            dbcfd.messages.retain(|msg| !DbcGenerator::check_list(msg.id, &list));
        }

        // sort message by canid, signals widest first
        dbcfd.messages.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        for msg in &mut dbcfd.messages {
            msg.signals.sort_by(|a, b| b.size.cmp(&a.size));
        }
        dbcfd.update_float();

        // validate everything before emitting anything
        let mut warnings = Vec::new();
        for msg in &dbcfd.messages {
            msg.validate()?;
            let layout = resolve_multiplex(msg)?;
            if layout.is_none() && msg.signals.iter().any(|sig| sig.switch_value().is_some()) {
                warn!("message:{} has multiplexed signals but no multiplexor, ignoring them", msg.name);
            }
            if let Some(warning) = check_dlc(msg, layout.as_ref()) {
                warn!("{warning}");
                warnings.push(warning);
            }
        }

        let mut codegen = DbcCodeGen {
            uid: self.uid,
            dbcfd: DbcObject::default(),
            opts: self.opts.clone(),
            decl: CodeUnit::new(),
            code: CodeUnit::new(),
        };
        codegen.gen_banner(&source, self.header);

        code_output!(codegen.decl, IDT0, "use dbcrt::prelude::*;");
        if codegen.opts.serde {
            code_output!(codegen.decl, IDT0, "use serde::{Deserialize, Serialize};");
        }
        code_output!(codegen.decl, IDT0, "");

        if dbcfd.use_float() {
            if codegen.opts.generate_pack {
                gen_float_pack(&mut codegen.code);
            }
            if codegen.opts.generate_unpack {
                gen_float_unpack(&mut codegen.code);
            }
        }

        for msg in &dbcfd.messages {
            debug!("dbcgen uid:{} message:{} canid:{:#x}", self.uid, msg.name, msg.id.0);
            let layout = resolve_multiplex(msg)?;
            msg.gen_msg_types(&mut codegen.decl, &codegen.opts)?;
            msg.gen_msg_codec(&mut codegen.code, &codegen.opts, layout.as_ref())?;
        }

        codegen.dbcfd = dbcfd;
        codegen.gen_pool_types();
        codegen.gen_pool_dispatch();

        let code = GeneratedCode {
            declarations: codegen.decl.into_string(),
            implementation: codegen.code.into_string(),
            warnings,
        };

        if let Some(outdir) = &self.outdir {
            let stem = self.stem.as_deref().unwrap_or(self.uid);
            let (types, codec) = code.write_to(outdir, stem)?;
            info!("dbcgen uid:{} wrote {} and {}", self.uid, types.display(), codec.display());
        }

        info!(
            "dbcgen uid:{} done, {} messages, {} warnings",
            self.uid,
            codegen.dbcfd.messages.len(),
            code.warnings.len()
        );
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ByteOrder;

    fn engine() -> Message {
        Message::new(
            0x100,
            "EngineData",
            8,
            vec![
                Signal::new("EngineTemp", 16, 8, ByteOrder::LittleEndian)
                    .scaling(1.0, -40.0)
                    .range(-40.0, 215.0)
                    .unit("degC"),
                Signal::new("EngineSpeed", 0, 16, ByteOrder::LittleEndian)
                    .scaling(0.25, 0.0)
                    .range(0.0, 16383.75)
                    .comment("crank shaft speed"),
                Signal::new("Type", 24, 8, ByteOrder::LittleEndian),
            ],
        )
        .comment("engine status")
    }

    fn gearbox() -> Message {
        Message::new(
            0x101,
            "Gearbox",
            8,
            vec![
                Signal::new("GearRatio", 7, 8, ByteOrder::BigEndian),
                Signal::new("ClutchWear", 48, 8, ByteOrder::LittleEndian),
            ],
        )
    }

    fn generate(messages: Vec<Message>) -> GeneratedCode {
        DbcGenerator::new("canbus").schema(DbcObject::new(messages)).generate().unwrap()
    }

    #[test]
    fn naming_is_keyword_safe() {
        let opts = GenOptions::default();
        let msg = engine();
        assert_eq!(msg.get_type_kamel(&opts), "EngineData");
        assert_eq!(msg.get_field_snake(&opts), "engine_data");
        assert_eq!(msg.signal("Type").unwrap().get_type_snake(), "x_type");
        assert_eq!(msg.signal("EngineSpeed").unwrap().get_const_shouty(), "ENGINE_SPEED");
        assert_eq!(Signal::new("2nd", 0, 1, ByteOrder::LittleEndian).get_type_kamel(), "X2nd");

        let opts = GenOptions { use_identifier_in_name: true, ..GenOptions::default() };
        assert_eq!(msg.get_type_kamel(&opts), "Can0x100EngineData");
        assert_eq!(msg.get_field_snake(&opts), "can_0x100_engine_data");
    }

    #[test]
    fn declarations_hold_records_and_pool() {
        let code = generate(vec![gearbox(), engine()]);
        let decl = &code.declarations;
        assert!(decl.contains("use dbcrt::prelude::*;"));
        assert!(!decl.contains("use serde"));
        assert!(decl.contains("/// EngineData Message"));
        assert!(decl.contains("/// - ID: 256 (0x100)"));
        assert!(decl.contains("/// engine status"));
        assert!(decl.contains("    /// crank shaft speed"));
        assert!(decl.contains("pub struct EngineData {"));
        assert!(decl.contains("    pub engine_speed: u16,"));
        assert!(decl.contains("    pub x_type: u8,"));
        assert!(decl.contains("pub const ENGINE_SPEED_MAX: f64 = 16383.75_f64;"));
        assert!(decl.contains("pub const ENGINE_TEMP_MIN: f64 = -40.0_f64;"));
        assert!(!decl.contains("X_TYPE_MIN"));
        assert!(decl.contains("const ID: u32 = 0x101;"));
        assert!(decl.contains("pub static CAN_MSG_POOL_IDS: [u32; 2] = [0x100, 0x101];"));
        assert!(decl.contains("    pub gearbox: CanMsgSlot<Gearbox>,"));
        assert!(decl.contains("pub const UID: &'static str = \"canbus\";"));

        // messages sorted by canid, signals widest first
        let engine_at = decl.find("pub struct EngineData").unwrap();
        let gearbox_at = decl.find("pub struct Gearbox").unwrap();
        assert!(engine_at < gearbox_at);
        let speed_at = decl.find("pub engine_speed").unwrap();
        let temp_at = decl.find("pub engine_temp").unwrap();
        assert!(speed_at < temp_at);
    }

    #[test]
    fn implementation_merges_registers() {
        let code = generate(vec![gearbox(), engine()]);
        let text = &code.implementation;
        assert!(text.contains("impl CanMsgPack for Gearbox {"));
        assert!(text.contains("Ok(m.swap_bytes() | i)"));
        assert!(text.contains("let m: u64 = data.swap_bytes();"));
        assert!(text.contains("impl CanMsgPack for EngineData {"));
        assert!(text.contains("        Ok(i)\n"));
        assert!(text.contains("return Err(CanError::new(\"invalid-dlc\", format!(\"EngineData dlc:{} < 8\", dlc)));"));
        assert!(text.contains(
            "        if dlc > 8 {\n            return Err(CanError::new(\"invalid-dlc\", format!(\"EngineData dlc:{} exceeds 8 bytes\", dlc)));\n        }\n"
        ));
        assert!(!text.contains("{{"));
        assert!(!text.contains("assert!"));
        assert!(!text.contains("1 << 29"));
        assert!(text.contains("can_print_signal(output, \"EngineSpeed\", self.engine_speed)?;"));
        assert!(text.contains("pub fn decode_engine_speed(&self) -> Result<f64, CanError> {"));
        assert!(text.contains("0x100 => self.engine_data.unpack(data, dlc, stamp),"));
        assert!(text.contains("0x101 => Ok(Gearbox::NAME),"));
        assert!(text.contains("\"unknown-canid\""));
        assert!(!text.contains("pack754"));
        assert!(code.warnings.is_empty());
    }

    #[test]
    fn options_toggle_routines() {
        let code = DbcGenerator::new("canbus")
            .schema(DbcObject::new(vec![engine()]))
            .generate_pack(false)
            .generate_print(false)
            .generate_asserts(false)
            .serde(true)
            .include_generation_timestamp(true)
            .header("// custom header")
            .generate()
            .unwrap();

        assert!(code.declarations.starts_with("// custom header\n"));
        assert!(code.declarations.contains("use serde::{Deserialize, Serialize};"));
        assert!(code.declarations.contains("#[derive(Serialize, Deserialize)]"));
        assert!(code.implementation.contains("// - code generated from in-memory schema ("));
        assert!(!code.implementation.contains("impl CanMsgPack"));
        assert!(!code.implementation.contains("pub fn pack_by_id("));
        assert!(code.implementation.contains("pub fn unpack_by_id("));
        assert!(!code.implementation.contains("impl CanMsgPrint"));
        assert!(!code.implementation.contains("if dlc > 8"));
        assert!(code.implementation.contains("impl CanMsgUnpack for EngineData {"));
        assert!(code.implementation.contains("pub fn decode_engine_speed(&self)"));
        assert!(!code.implementation.contains("pub fn encode_"));
    }

    #[test]
    fn unpack_off_drops_decoders() {
        let code = DbcGenerator::new("canbus")
            .schema(DbcObject::new(vec![engine()]))
            .generate_unpack(false)
            .generate()
            .unwrap();
        let text = &code.implementation;
        assert!(!text.contains("pub fn decode_"));
        assert!(!text.contains("pub fn unpack_by_id("));
        assert!(text.contains("pub fn encode_engine_temp(&mut self, value: f64)"));
        assert!(text.contains("pub fn pack_by_id("));

        let code = DbcGenerator::new("canbus")
            .schema(DbcObject::new(vec![engine()]))
            .generate_unpack(false)
            .generate_pack(false)
            .generate()
            .unwrap();
        assert!(!code.implementation.contains("impl EngineData {"));
    }

    #[test]
    fn float_routines_only_when_used() {
        let msg = Message::new(
            0x300,
            "FloatFrame",
            4,
            vec![Signal::new("Pressure", 0, 32, ByteOrder::LittleEndian).floating()],
        );
        let code = generate(vec![msg]);
        assert!(code.implementation.contains("pub fn pack754_32(f: f32) -> u32 {"));
        assert!(code.implementation.contains("pub fn unpack754_32(i: u32) -> f32 {"));
        assert!(code.declarations.contains("pub pressure: f32,"));
    }

    #[test]
    fn whitelist_and_blacklist_filter_ids() {
        let code = DbcGenerator::new("canbus")
            .schema(DbcObject::new(vec![engine(), gearbox()]))
            .whitelist(vec![0x101, 0x100])
            .blacklist(vec![0x100])
            .generate()
            .unwrap();
        assert!(!code.declarations.contains("pub struct EngineData"));
        assert!(code.declarations.contains("[u32; 1] = [0x101];"));
    }

    #[test]
    fn dlc_warning_counts_widest_group() {
        let msg = Message::new(
            0x200,
            "MuxFrame",
            2,
            vec![
                Signal::new("Selector", 0, 8, ByteOrder::LittleEndian).multiplexor(),
                Signal::new("A", 8, 8, ByteOrder::LittleEndian).multiplexed(1),
                Signal::new("B", 8, 8, ByteOrder::LittleEndian).multiplexed(2),
            ],
        );
        assert!(generate(vec![msg.clone()]).warnings.is_empty());

        let mut msg = msg;
        msg.signals.push(Signal::new("C", 16, 4, ByteOrder::LittleEndian).multiplexed(2));
        let code = generate(vec![msg]);
        assert_eq!(
            code.warnings,
            vec![DbcWarning::DlcTooSmall { message: "MuxFrame".to_owned(), used: 20, available: 16 }]
        );
        assert!(code.implementation.contains("match self.selector as u64 {"));
    }

    #[test]
    fn schema_errors_abort_generation() {
        let mut bad = engine();
        bad.signals.push(Signal::new("Broken", 0, 16, ByteOrder::LittleEndian).floating());
        let result = DbcGenerator::new("canbus").schema(DbcObject::new(vec![gearbox(), bad])).generate();
        assert!(matches!(result, Err(DbcError::InvalidFloatSize { size: 16, .. })));

        let result = DbcGenerator::new("canbus").generate();
        assert!(matches!(result, Err(DbcError::MissingSchema)));
    }

    #[test]
    fn units_written_to_outdir() {
        let outdir = tempfile::tempdir().unwrap();
        DbcGenerator::new("canbus")
            .schema(DbcObject::new(vec![gearbox()]))
            .outdir(outdir.path().to_str().unwrap())
            .stem("bus")
            .generate()
            .unwrap();
        let types = fs::read_to_string(outdir.path().join("bus-types.rs")).unwrap();
        let codec = fs::read_to_string(outdir.path().join("bus-codec.rs")).unwrap();
        assert!(types.contains("pub struct Gearbox"));
        assert!(codec.contains("impl CanMsgUnpack for Gearbox"));
    }

    #[test]
    fn schema_file_is_loaded() {
        let outdir = tempfile::tempdir().unwrap();
        let path = outdir.path().join("bus.json");
        let schema = DbcObject::new(vec![engine()]);
        fs::write(&path, serde_json::to_string(&schema).unwrap()).unwrap();

        let code = DbcGenerator::new("canbus").schema_file(path.to_str().unwrap()).generate().unwrap();
        assert!(code.declarations.contains("pub struct EngineData {"));
        assert!(code.declarations.contains(&format!("// - code generated from {}", path.display())));
    }
}
