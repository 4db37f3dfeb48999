/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

use crate::data::{Message, Signal};
use crate::error::DbcError;
use crate::output::CodeUnit;

/// Signals sharing one multiplexor switch value.
#[derive(Debug, Clone)]
pub struct MuxGroup<'a> {
    pub switch_value: u64,
    pub signals: Vec<&'a Signal>,
}

/// Multiplex layout of one message: the selector and its signal groups,
/// ordered by ascending switch value.
#[derive(Debug, Clone)]
pub struct MuxLayout<'a> {
    pub multiplexor: &'a Signal,
    pub groups: Vec<MuxGroup<'a>>,
}

impl MuxLayout<'_> {
    /// Widest signal group in bits.
    #[must_use]
    pub fn max_group_bits(&self) -> u64 {
        self.groups
            .iter()
            .map(|group| group.signals.iter().map(|sig| sig.size).sum::<u64>())
            .max()
            .unwrap_or(0)
    }
}

/// Find the multiplexor and group multiplexed signals by switch value.
///
/// Returns `None` for messages without multiplexor. Multiplexed signals of a
/// message without multiplexor are left out of the layout and never coded.
///
/// # Errors
/// `DuplicateMultiplexor` when more than one selector is declared,
/// `InvalidMultiplexor` when the selector is a floating point signal.
pub fn resolve_multiplex(msg: &Message) -> Result<Option<MuxLayout<'_>>, DbcError> {
    let mut selectors = msg.signals.iter().filter(|sig| sig.is_multiplexor());
    let Some(multiplexor) = selectors.next() else {
        return Ok(None);
    };
    if selectors.next().is_some() {
        return Err(DbcError::DuplicateMultiplexor { message: msg.name.clone() });
    }
    if multiplexor.is_floating {
        return Err(DbcError::InvalidMultiplexor {
            message: msg.name.clone(),
            signal: multiplexor.name.clone(),
        });
    }

    let mut multiplexed: Vec<(u64, &Signal)> = msg
        .signals
        .iter()
        .filter_map(|sig| sig.switch_value().map(|value| (value, sig)))
        .collect();
    // stable, keeps declaration order within a group
    multiplexed.sort_by_key(|(value, _)| *value);

    let mut groups: Vec<MuxGroup> = Vec::new();
    for (value, sig) in multiplexed {
        match groups.last_mut() {
            Some(group) if group.switch_value == value => group.signals.push(sig),
            _ => groups.push(MuxGroup { switch_value: value, signals: vec![sig] }),
        }
    }

    Ok(Some(MuxLayout { multiplexor, groups }))
}

/// Signals coded unconditionally, multiplexor included.
pub fn plain_signals(msg: &Message) -> impl Iterator<Item = &Signal> {
    msg.signals.iter().filter(|sig| sig.switch_value().is_none())
}

/// Emit the `match` on the multiplexor field, `emit` produces each group signal.
/// Unknown selector values fail with `unknown-multiplex`.
///
/// # Errors
/// Propagates `emit` failures.
pub fn gen_mux_switch<F>(
    code: &mut CodeUnit,
    indent: &str,
    msg: &Message,
    layout: &MuxLayout,
    mut emit: F,
) -> Result<(), DbcError>
where
    F: FnMut(&mut CodeUnit, &str, &Signal) -> Result<(), DbcError>,
{
    if layout.groups.is_empty() {
        return Ok(());
    }

    let field = layout.multiplexor.get_type_snake();
    let inner = format!("{indent}        ");
    code_output!(code, indent, "match self.{} as u64 {{", field);
    for group in &layout.groups {
        code_output!(code, indent, "    {} => {{", group.switch_value);
        for &sig in &group.signals {
            emit(&mut *code, inner.as_str(), sig)?;
        }
        code_output!(code, indent, "    }");
    }
    code_output!(code, indent, "    _ => {");
    code_output!(
        code,
        indent,
        "        return Err(CanError::new(\"unknown-multiplex\", format!(\"{}:{}={{}} selects no signal group\", self.{})));",
        msg.name,
        layout.multiplexor.name,
        field
    );
    code_output!(code, indent, "    }");
    code_output!(code, indent, "}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ByteOrder;

    fn mux_message() -> Message {
        Message::new(
            0x200,
            "MuxFrame",
            8,
            vec![
                Signal::new("Selector", 0, 8, ByteOrder::LittleEndian).multiplexor(),
                Signal::new("Gamma", 8, 16, ByteOrder::LittleEndian).multiplexed(3),
                Signal::new("BetaA", 8, 8, ByteOrder::LittleEndian).multiplexed(2),
                Signal::new("Alpha", 8, 16, ByteOrder::LittleEndian).multiplexed(1),
                Signal::new("BetaB", 16, 16, ByteOrder::LittleEndian).multiplexed(2),
                Signal::new("Common", 56, 8, ByteOrder::LittleEndian),
            ],
        )
    }

    #[test]
    fn groups_sorted_by_switch_value() {
        let msg = mux_message();
        let layout = resolve_multiplex(&msg).unwrap().unwrap();
        assert_eq!(layout.multiplexor.name, "Selector");
        let values: Vec<u64> = layout.groups.iter().map(|group| group.switch_value).collect();
        assert_eq!(values, vec![1, 2, 3]);
        let beta: Vec<&str> = layout.groups[1].signals.iter().map(|sig| sig.name.as_str()).collect();
        assert_eq!(beta, vec!["BetaA", "BetaB"]);
        assert_eq!(layout.max_group_bits(), 24);

        let plain: Vec<&str> = plain_signals(&msg).map(|sig| sig.name.as_str()).collect();
        assert_eq!(plain, vec!["Selector", "Common"]);
    }

    #[test]
    fn plain_message_has_no_layout() {
        let msg = Message::new(1, "Plain", 1, vec![Signal::new("A", 0, 8, ByteOrder::LittleEndian)]);
        assert!(resolve_multiplex(&msg).unwrap().is_none());
    }

    #[test]
    fn two_selectors_rejected() {
        let mut msg = mux_message();
        msg.signals.push(Signal::new("Other", 48, 8, ByteOrder::LittleEndian).multiplexor());
        assert!(matches!(resolve_multiplex(&msg), Err(DbcError::DuplicateMultiplexor { .. })));
    }

    #[test]
    fn float_selector_rejected() {
        let msg = Message::new(
            1,
            "Float",
            8,
            vec![Signal::new("Sel", 0, 32, ByteOrder::LittleEndian).floating().multiplexor()],
        );
        assert!(matches!(resolve_multiplex(&msg), Err(DbcError::InvalidMultiplexor { .. })));
    }

    #[test]
    fn switch_emits_one_arm_per_group() {
        let msg = mux_message();
        let layout = resolve_multiplex(&msg).unwrap().unwrap();
        let mut code = CodeUnit::new();
        gen_mux_switch(&mut code, "", &msg, &layout, |code, indent, sig| {
            code.output(indent, format!("// {}", sig.name));
            Ok(())
        })
        .unwrap();
        let text = code.into_string();
        assert!(text.starts_with("match self.selector as u64 {\n    1 => {\n        // Alpha\n"));
        assert_eq!(text.matches(" => {").count(), 4);
        assert!(text.contains("MuxFrame:Selector={} selects no signal group"));
    }

    #[test]
    fn selector_without_groups_emits_nothing() {
        let msg = Message::new(
            1,
            "Lonely",
            1,
            vec![Signal::new("Sel", 0, 8, ByteOrder::LittleEndian).multiplexor()],
        );
        let layout = resolve_multiplex(&msg).unwrap().unwrap();
        let mut code = CodeUnit::new();
        gen_mux_switch(&mut code, "", &msg, &layout, |_, _, _| Ok(())).unwrap();
        assert!(code.as_str().is_empty());
    }
}
