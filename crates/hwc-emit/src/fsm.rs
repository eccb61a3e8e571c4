//! State-machine lowering for retained `Phi` operations (spec §4.5.4).
//! Installed instead of flat operation emission whenever a process has any
//! phi left after the builder's phi-to-mux opportunism.

use crate::naming::{int_type, sig_ref, NameScope};
use crate::ops;
use crate::writer::TextWriter;
use hwc_ir::{BasicBlock, BlockId, Module, Operation, Process, SignalType, Terminator};

/// `⌈log₂(block_count + 1)⌉`, the width needed to number every block plus
/// one terminal "done" state (spec §4.5.4, step 1).
fn state_width(block_count: usize) -> u32 {
    let states = block_count as u32 + 1;
    (u32::BITS - states.saturating_sub(1).leading_zeros()).max(1)
}

pub fn emit_state_machine(w: &mut TextWriter, module: &Module, process: &Process, scope: &mut NameScope) {
    let block_count = process.blocks.len();
    let done_state = block_count as u32;
    let state_ty = SignalType::new(state_width(block_count), false);

    w.line(format!("reg {} : {} init 0", sig_ref("state"), int_type(state_ty)));

    let phi_regs: Vec<(String, SignalType)> = process
        .blocks
        .iter()
        .flat_map(|b| &b.ops)
        .filter_map(|op| match op {
            Operation::Phi { dest, .. } => {
                let sig = module.signal(*dest);
                Some((sig.name.clone(), sig.ty))
            }
            _ => None,
        })
        .collect();
    for (name, ty) in &phi_regs {
        w.line(format!("reg {} : {}", sig_ref(name), int_type(*ty)));
    }

    let mut clk_seq = None;
    w.open_block("always @(posedge %clk)");
    w.open_block(format!("switch {}", sig_ref("state")));
    for (idx, block) in process.blocks.iter().enumerate() {
        w.open_block(format!("case {idx}"));
        for op in &block.ops {
            if matches!(op, Operation::Phi { .. }) {
                continue;
            }
            ops::emit_operation(w, module, op, scope, &mut clk_seq);
        }
        emit_transition(w, module, process, block, idx as u32, done_state);
        w.close_block();
    }
    w.open_block(format!("case {done_state}"));
    w.line("// terminal state: hold");
    w.close_block();
    w.close_block();
    w.close_block();
}

fn emit_transition(
    w: &mut TextWriter,
    module: &Module,
    process: &Process,
    block: &BasicBlock,
    this_id: u32,
    done_state: u32,
) {
    match &block.term {
        Terminator::Branch { cond, true_succ, false_succ } => {
            let cond_name = module.signal(*cond).name.clone();
            w.open_block(format!("if {}", sig_ref(&cond_name)));
            w.line(format!("{} = {}", sig_ref("state"), true_succ.0));
            emit_phi_updates(w, module, process, *true_succ, this_id);
            w.close_block();
            w.open_block("else");
            w.line(format!("{} = {}", sig_ref("state"), false_succ.0));
            emit_phi_updates(w, module, process, *false_succ, this_id);
            w.close_block();
        }
        Terminator::Jump(target) => {
            w.line(format!("{} = {}", sig_ref("state"), target.0));
            emit_phi_updates(w, module, process, *target, this_id);
        }
        Terminator::Return => {
            w.line(format!("{} = {}", sig_ref("state"), done_state));
        }
    }
}

fn emit_phi_updates(w: &mut TextWriter, module: &Module, process: &Process, target: BlockId, from: u32) {
    for op in &process.block(target).ops {
        if let Operation::Phi { dest, incomings } = op {
            if let Some((_, val)) = incomings.iter().find(|(b, _)| b.0 == from) {
                let d = module.signal(*dest);
                let v = module.signal(*val);
                w.line(format!("{} = {}", sig_ref(&d.name), sig_ref(&v.name)));
            }
        }
    }
}
