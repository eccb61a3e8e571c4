//! Per-block lowering: the instruction dispatch loop, terminator
//! translation, and the reverse-postorder reordering pass that gives
//! every process's blocks a deterministic, entry-first numbering (spec
//! §3, "the first block is the entry"; spec §4.4, determinism).

use super::{alloc, binop, concurrency, print, Ctx, FnCtx};
use hwc_diag::{Severity, Sink};
use hwc_ir::{BasicBlock, BlockId, Operation, ProcessId, Terminator};
use hwc_ssa::{Block, Callee, Function, Instr, Position, Term};
use std::collections::HashMap;

/// Lowers one SSA block's instructions into HW-IR operations plus a
/// terminator. Block numbering still matches the SSA block's original
/// index at this point; [`reorder_rpo`] renumbers afterward.
pub(crate) fn lower_block(ctx: &mut Ctx, func: &Function, block: &Block, fctx: &mut FnCtx, proc_id: ProcessId) -> BasicBlock {
    let mut ops = Vec::with_capacity(block.instrs.len());

    for inode in &block.instrs {
        let pos = ctx.program.positions.get(inode.node).cloned();
        match &inode.instr {
            Instr::Alloc { dest, ty, name } => {
                alloc::lower_alloc(&mut ctx.sink, ctx.design.top_mut(), fctx, *dest, ty, name, pos);
            }
            Instr::Const { dest, ty, value } => {
                alloc::lower_const(&mut ctx.sink, ctx.design.top_mut(), fctx, *dest, ty, *value, pos);
            }
            Instr::Store { ptr, value } => {
                if let Some(op) = alloc::lower_store(&mut ctx.sink, fctx, *ptr, *value, pos) {
                    ops.push(op);
                }
            }
            Instr::Load { dest, ptr } => {
                alloc::lower_load(&mut ctx.sink, fctx, *dest, *ptr, pos);
            }
            Instr::BinOp { dest, op, lhs, rhs } => {
                if let Some(lowered) = binop::lower_binop(&mut ctx.sink, ctx.design.top_mut(), fctx, *dest, *op, *lhs, *rhs, pos) {
                    ops.push(lowered);
                }
            }
            Instr::Not { dest, value } => {
                if let Some(lowered) = binop::lower_not(&mut ctx.sink, ctx.design.top_mut(), fctx, *dest, *value, pos) {
                    ops.push(lowered);
                }
            }
            Instr::Convert { dest, value, to } => {
                if let Some(op) = alloc::lower_convert(&mut ctx.sink, ctx.design.top_mut(), fctx, *dest, *value, to, pos) {
                    ops.push(op);
                }
            }
            Instr::ChangeType { dest, value, .. } => {
                alloc::lower_change_type(&mut ctx.sink, fctx, *dest, *value, pos);
            }
            Instr::MakeChan { dest, elem, depth, name } => {
                concurrency::lower_make_chan(&mut ctx.sink, ctx.design.top_mut(), fctx, *dest, elem, depth, name, pos);
            }
            Instr::Send { chan, value } => {
                if let Some(op) = concurrency::lower_send(&mut ctx.sink, ctx.design.top_mut(), fctx, proc_id, *chan, *value, pos) {
                    ops.push(op);
                }
            }
            Instr::Recv { dest, chan } => {
                if let Some(op) = concurrency::lower_recv(&mut ctx.sink, ctx.design.top_mut(), fctx, proc_id, *dest, *chan, pos) {
                    ops.push(op);
                }
            }
            Instr::Phi { dest, incomings } => {
                if let Some(op) = binop::lower_phi(&mut ctx.sink, ctx.design.top_mut(), func, fctx, *dest, incomings, pos) {
                    ops.push(op);
                }
            }
            Instr::Go { callee, args } => {
                if let Some(op) = concurrency::lower_go(ctx, func, fctx, proc_id, callee, args, pos) {
                    ops.push(op);
                }
            }
            Instr::Call { callee, print: print_call, .. } => match print_call {
                Some(pc) => {
                    if let Some(op) = print::lower_print(&mut ctx.sink, fctx, pc, pos) {
                        ops.push(op);
                    }
                }
                None => {
                    let name = match callee {
                        Callee::Static(n) => n.as_str(),
                        Callee::Dynamic => "<dynamic>",
                    };
                    ctx.sink.report(
                        Severity::Warning,
                        pos,
                        format!("call to `{name}` is not a print invocation; ordinary function calls are not lowered and are dropped"),
                    );
                }
            },
            // Rejected by the validator; nothing to lower if somehow reached.
            Instr::Select | Instr::MapOp => {}
        }
    }

    let term_pos = block
        .instrs
        .last()
        .and_then(|inode| ctx.program.positions.get(inode.node).cloned());
    let term = lower_term(&mut ctx.sink, fctx, &block.term, term_pos);
    let mut bb = BasicBlock::new(block.display_label(), term);
    bb.ops = ops;
    bb
}

/// Translates one SSA terminator. An unmapped branch condition falls
/// back to the false arm with a warning (spec §8 boundary behavior)
/// rather than failing the whole build.
fn lower_term(sink: &mut Sink, fctx: &FnCtx, term: &Term, pos: Option<Position>) -> Terminator {
    match term {
        Term::Branch { cond, then_blk, else_blk } => match fctx.signal(*cond) {
            Some(sid) => Terminator::Branch {
                cond: sid,
                true_succ: BlockId(then_blk.0),
                false_succ: BlockId(else_blk.0),
            },
            None => {
                sink.report(
                    Severity::Warning,
                    pos,
                    "branch condition is an unmapped value; defaulting to the false arm",
                );
                Terminator::Jump(BlockId(else_blk.0))
            }
        },
        Term::Jump(b) => Terminator::Jump(BlockId(b.0)),
        Term::Return => Terminator::Return,
    }
}

/// Reorders a process's blocks into reverse postorder from the entry
/// block, renumbering every `BlockId` reference in terminators and phi
/// incomings to match (spec §4.4's determinism requirement: emission
/// order must not depend on the front-end's original numbering).
pub(crate) fn reorder_rpo(blocks: Vec<BasicBlock>) -> Vec<BasicBlock> {
    if blocks.is_empty() {
        return blocks;
    }

    let mut postorder = Vec::with_capacity(blocks.len());
    let mut visited = vec![false; blocks.len()];
    visit(0, &blocks, &mut visited, &mut postorder);
    let mut order: Vec<u32> = postorder.into_iter().rev().collect();
    // Any block unreachable from the entry (shouldn't occur for a valid
    // SSA function, but keep the reorder total) is appended in original
    // order after the reachable prefix.
    for (i, seen) in visited.iter().enumerate() {
        if !seen {
            order.push(i as u32);
        }
    }

    let mut old_to_new = HashMap::with_capacity(order.len());
    for (new_idx, &old_idx) in order.iter().enumerate() {
        old_to_new.insert(old_idx, new_idx as u32);
    }

    let mut reordered: Vec<BasicBlock> = order
        .iter()
        .map(|&old_idx| {
            let mut block = blocks[old_idx as usize].clone();
            block.term = remap_terminator(&block.term, &old_to_new);
            for op in &mut block.ops {
                if let Operation::Phi { incomings, .. } = op {
                    for (blk, _) in incomings.iter_mut() {
                        *blk = BlockId(old_to_new[&blk.0]);
                    }
                }
            }
            block.predecessors.clear();
            block.successors.clear();
            block
        })
        .collect();

    for idx in 0..reordered.len() {
        reordered[idx].successors = reordered[idx].term.successors();
    }
    for idx in 0..reordered.len() {
        let succs = reordered[idx].successors.clone();
        for succ in succs {
            reordered[succ.0 as usize].predecessors.push(BlockId(idx as u32));
        }
    }

    reordered
}

fn remap_terminator(term: &Terminator, map: &HashMap<u32, u32>) -> Terminator {
    match term {
        Terminator::Branch { cond, true_succ, false_succ } => Terminator::Branch {
            cond: *cond,
            true_succ: BlockId(map[&true_succ.0]),
            false_succ: BlockId(map[&false_succ.0]),
        },
        Terminator::Jump(b) => Terminator::Jump(BlockId(map[&b.0])),
        Terminator::Return => Terminator::Return,
    }
}

fn visit(idx: u32, blocks: &[BasicBlock], visited: &mut [bool], postorder: &mut Vec<u32>) {
    if visited[idx as usize] {
        return;
    }
    visited[idx as usize] = true;
    for succ in blocks[idx as usize].term.successors() {
        visit(succ.0, blocks, visited, postorder);
    }
    postorder.push(idx);
}
