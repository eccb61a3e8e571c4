//! Structural module emission (spec §4.5.1, §4.5.2): the top-level module
//! wrapper with its channel wires, FIFO instances and inlined root-process
//! operations, plus one structural child module per non-root process.

use crate::fifo;
use crate::fsm;
use crate::naming::{int_type, mod_ref, sig_ref, NameScope};
use crate::ops;
use crate::writer::TextWriter;
use crate::EmitError;
use hwc_ir::{Channel, ChannelId, Module, Operation, PortDir, Process};
use itertools::Itertools;
use std::collections::BTreeMap;

fn port_dir_text(dir: PortDir) -> &'static str {
    match dir {
        PortDir::In => "in",
        PortDir::Out => "out",
        PortDir::InOut => "inout",
    }
}

/// Which of a channel's two directions a process actually uses, keyed by
/// channel id so the result can be re-sorted by channel name — the shared
/// source of truth for both a process module's port list (§4.5.2) and the
/// top-level wrapper's instance connections (§4.5.1 step 5).
fn channel_usage(process: &Process) -> BTreeMap<u32, (bool, bool)> {
    let mut usage: BTreeMap<u32, (bool, bool)> = BTreeMap::new();
    for block in &process.blocks {
        for op in &block.ops {
            match op {
                Operation::Send { channel, .. } => usage.entry(channel.0).or_default().0 = true,
                Operation::Recv { channel, .. } => usage.entry(channel.0).or_default().1 = true,
                _ => {}
            }
        }
    }
    usage
}

fn sorted_channel_usage(module: &Module, process: &Process) -> Vec<(ChannelId, bool, bool)> {
    channel_usage(process)
        .into_iter()
        .map(|(id, (sends, recvs))| (ChannelId(id), sends, recvs))
        .sorted_by(|a, b| module.channel(a.0).name.cmp(&module.channel(b.0).name))
        .collect()
}

fn emit_ops_flat(w: &mut TextWriter, module: &Module, process: &Process, scope: &mut NameScope) {
    if process.has_phi() {
        fsm::emit_state_machine(w, module, process, scope);
        return;
    }
    let mut clk_seq = None;
    for block in &process.blocks {
        for op in &block.ops {
            ops::emit_operation(w, module, op, scope, &mut clk_seq);
        }
    }
}

fn emit_channel_wires_and_instance(w: &mut TextWriter, module: &Module, ch: &Channel, fifo_prefix: &str) {
    let base = ch.name.clone();
    w.line(format!("wire {} : {}", sig_ref(&format!("{base}_write_data")), int_type(ch.elem)));
    w.line(format!("wire {} : i1", sig_ref(&format!("{base}_write_valid"))));
    w.line(format!("wire {} : i1", sig_ref(&format!("{base}_write_ready"))));
    w.line(format!("wire {} : {}", sig_ref(&format!("{base}_read_data")), int_type(ch.elem)));
    w.line(format!("wire {} : i1", sig_ref(&format!("{base}_read_valid"))));
    w.line(format!("wire {} : i1", sig_ref(&format!("{base}_read_ready"))));
    w.line(format!("// {base}: occupancy={}/depth={}", ch.occupancy, ch.depth));

    for prod in ch.producers.iter().sorted_by_key(|e| (module.processes[e.process.0 as usize].stage, &module.processes[e.process.0 as usize].name)) {
        let p = &module.processes[prod.process.0 as usize];
        w.line(format!("// {base}: producer {} stage={}", p.name, p.stage));
    }
    for cons in ch.consumers.iter().sorted_by_key(|e| (module.processes[e.process.0 as usize].stage, &module.processes[e.process.0 as usize].name)) {
        let p = &module.processes[cons.process.0 as usize];
        w.line(format!("// {base}: consumer {} stage={}", p.name, p.stage));
    }

    let fifo_name = fifo::fifo_module_name(fifo_prefix, ch);
    w.line(format!(
        "inst {base}_fifo = {}(clk=%clk, rst=%rst, in_data={}, in_valid={}, in_ready={}, out_data={}, out_valid={}, out_ready={})",
        mod_ref(&fifo_name),
        sig_ref(&format!("{base}_write_data")),
        sig_ref(&format!("{base}_write_valid")),
        sig_ref(&format!("{base}_write_ready")),
        sig_ref(&format!("{base}_read_data")),
        sig_ref(&format!("{base}_read_valid")),
        sig_ref(&format!("{base}_read_ready")),
    ));
}

fn emit_child_instance(w: &mut TextWriter, module: &Module, child: &Process) {
    let mut conns = vec!["clk=%clk".to_string(), "rst=%rst".to_string()];
    for (chan_id, sends, receives) in sorted_channel_usage(module, child) {
        let ch = module.channel(chan_id);
        let base = &ch.name;
        if sends {
            for suffix in ["write_data", "write_valid", "write_ready"] {
                conns.push(format!("{base}_{suffix}={}", sig_ref(&format!("{base}_{suffix}"))));
            }
        }
        if receives {
            for suffix in ["read_data", "read_valid", "read_ready"] {
                conns.push(format!("{base}_{suffix}={}", sig_ref(&format!("{base}_{suffix}"))));
            }
        }
    }
    w.line(format!("inst {} = {}({})", child.name, mod_ref(&child.name), conns.join(", ")));
}

fn emit_process_module(w: &mut TextWriter, module: &Module, process: &Process) {
    let mut ports = vec!["clk: in i1".to_string(), "rst: in i1".to_string()];
    for (chan_id, sends, receives) in sorted_channel_usage(module, process) {
        let ch = module.channel(chan_id);
        let elem = int_type(ch.elem);
        let base = &ch.name;
        if sends {
            ports.push(format!("{base}_write_data: out {elem}"));
            ports.push(format!("{base}_write_valid: out i1"));
            ports.push(format!("{base}_write_ready: in i1"));
        }
        if receives {
            ports.push(format!("{base}_read_data: in {elem}"));
            ports.push(format!("{base}_read_valid: in i1"));
            ports.push(format!("{base}_read_ready: out i1"));
        }
    }

    w.open_block(format!("{}({})", mod_ref(&process.name), ports.join(", ")));
    let mut scope = NameScope::new();
    emit_ops_flat(w, module, process, &mut scope);
    w.close_block();
}

pub fn emit_top_level_module(w: &mut TextWriter, module: &Module, fifo_prefix: &str) -> Result<(), EmitError> {
    let root = module.processes.first().ok_or_else(|| EmitError::EmptyModule(module.name.clone()))?;

    let port_list = module
        .ports
        .iter()
        .map(|p| format!("{}: {} {}", p.name, port_dir_text(p.dir), int_type(p.ty)))
        .join(", ");
    w.open_block(format!("{}({port_list})", mod_ref(&module.name)));

    for (_, ch) in module.channels().sorted_by(|a, b| a.1.name.cmp(&b.1.name)) {
        emit_channel_wires_and_instance(w, module, ch, fifo_prefix);
    }

    let mut scope = NameScope::new();
    emit_ops_flat(w, module, root, &mut scope);

    for child in module.processes[1..].iter().sorted_by(|a, b| a.name.cmp(&b.name)) {
        emit_child_instance(w, module, child);
    }

    w.close_block();

    for child in module.processes[1..].iter().sorted_by(|a, b| a.name.cmp(&b.name)) {
        emit_process_module(w, module, child);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwc_ir::{BasicBlock, Sensitivity, Signal, SignalType, Terminator};

    #[test]
    fn empty_module_is_an_error() {
        let m = Module::new("m", None);
        let mut w = TextWriter::new();
        assert!(emit_top_level_module(&mut w, &m, "hwc").is_err());
    }

    #[test]
    fn top_level_emits_ports_and_inlines_root_ops() {
        let mut m = Module::new("top", None);
        let a = m.add_signal(Signal::wire("a", SignalType::new(8, false), None)).unwrap();
        let b = m.add_signal(Signal::wire("b", SignalType::new(8, false), None)).unwrap();
        let d = m.add_signal(Signal::wire("d", SignalType::new(8, false), None)).unwrap();
        let mut root = Process::new("top", Sensitivity::Combinational, 0);
        let mut bb = BasicBlock::new("entry", Terminator::Return);
        bb.ops.push(Operation::Bin { dest: d, op: hwc_ssa::ArithOp::Add, left: a, right: b });
        root.blocks.push(bb);
        m.processes.push(root);

        let mut w = TextWriter::new();
        emit_top_level_module(&mut w, &m, "hwc").unwrap();
        let text = w.finish();
        assert!(text.contains("@top(clk: in i1, rst: in i1) {"));
        assert!(text.contains("%d = add i8 %a, %b"));
    }
}
