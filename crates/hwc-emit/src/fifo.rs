//! FIFO extern declarations (spec §4.5.1, §6.2): one per distinct element
//! type/depth combination referenced by any channel in the design. The
//! actual FIFO body is supplied by the caller at elaboration time; the
//! core only ever emits the extern's port list.

use crate::naming::{int_type, mod_ref, sanitize};
use crate::writer::TextWriter;
use hwc_ir::{Channel, Module};
use itertools::Itertools;
use std::collections::BTreeSet;

pub fn fifo_module_name(prefix: &str, ch: &Channel) -> String {
    format!("{prefix}_fifo_{}_d{}", sanitize(&int_type(ch.elem)), ch.depth)
}

pub fn emit_externs(w: &mut TextWriter, modules: &[Module], prefix: &str) {
    let distinct: BTreeSet<(String, String)> = modules
        .iter()
        .flat_map(|m| m.channels())
        .map(|(_, ch)| (fifo_module_name(prefix, ch), int_type(ch.elem)))
        .collect();

    for (name, elem_ty) in distinct.into_iter().sorted() {
        w.line(format!(
            "extern {}(clk: in i1, rst: in i1, in_data: in {elem_ty}, in_valid: in i1, in_ready: out i1, out_data: out {elem_ty}, out_valid: out i1, out_ready: in i1)",
            mod_ref(&name)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwc_ir::SignalType;

    #[test]
    fn distinct_elem_and_depth_combinations_emit_once_each() {
        let mut m = Module::new("m", None);
        m.add_channel(Channel::new("a", SignalType::new(8, false), 4, None)).unwrap();
        m.add_channel(Channel::new("b", SignalType::new(8, false), 4, None)).unwrap();
        m.add_channel(Channel::new("c", SignalType::new(16, true), 2, None)).unwrap();

        let mut w = TextWriter::new();
        emit_externs(&mut w, std::slice::from_ref(&m), "hwc");
        let text = w.finish();
        assert_eq!(text.matches("extern @hwc_fifo_i8_d4").count(), 1);
        assert_eq!(text.matches("extern @hwc_fifo_i16_d2").count(), 1);
    }
}
