//! Lowering for binary/unary arithmetic and the phi-to-mux rewrite
//! (spec §4.3: "when a two-input phi's predecessors are exactly a single
//! header's branch targets, lower it to a mux instead of a state-holding
//! phi").

use super::FnCtx;
use hwc_diag::{Severity, Sink};
use hwc_ir::{BlockId, Module, Operation, Signal, SignalId, SignalType};
use hwc_ssa::{BinOp, BlockIdx, Function, Position, Term, ValueId};
use std::collections::HashSet;

pub(crate) fn lower_binop(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    dest: ValueId,
    op: BinOp,
    lhs: ValueId,
    rhs: ValueId,
    pos: Option<Position>,
) -> Option<Operation> {
    let (Some(left), Some(right)) = (fctx.signal(lhs), fctx.signal(rhs)) else {
        sink.report(Severity::Warning, pos, "binary operation over an unmapped operand, skipping");
        return None;
    };

    let name = fctx.fresh_name("bin");
    let (sty, is_compare) = match op {
        BinOp::Rel(_) => (SignalType::bit(), true),
        BinOp::Arith(_) => (SignalType::unknown(), false),
    };
    let dest_sig = match module.add_signal(Signal::wire(name, sty, pos.clone())) {
        Ok(sid) => sid,
        Err(e) => {
            sink.report(Severity::Warning, pos, e.to_string());
            return None;
        }
    };
    fctx.value_map.insert(dest, dest_sig);

    Some(if is_compare {
        let BinOp::Rel(pred) = op else { unreachable!() };
        Operation::Compare {
            dest: dest_sig,
            pred,
            left,
            right,
        }
    } else {
        let BinOp::Arith(arith) = op else { unreachable!() };
        Operation::Bin {
            dest: dest_sig,
            op: arith,
            left,
            right,
        }
    })
}

pub(crate) fn lower_not(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    dest: ValueId,
    value: ValueId,
    pos: Option<Position>,
) -> Option<Operation> {
    let Some(val_sig) = fctx.signal(value) else {
        sink.report(Severity::Warning, pos, "not over an unmapped operand, skipping");
        return None;
    };
    let name = fctx.fresh_name("not");
    let dest_sig = match module.add_signal(Signal::wire(name, SignalType::unknown(), pos.clone())) {
        Ok(sid) => sid,
        Err(e) => {
            sink.report(Severity::Warning, pos, e.to_string());
            return None;
        }
    };
    fctx.value_map.insert(dest, dest_sig);
    Some(Operation::Not {
        dest: dest_sig,
        value: val_sig,
    })
}

/// Lowers a phi node, opportunistically rewriting a two-input phi whose
/// predecessors are exactly one header's branch targets into a `Mux`.
/// Falls back to a `Phi` operation — retaining state-machine semantics
/// for the emitter (spec §4.5.4) — whenever no matching header is found
/// or an incoming value doesn't resolve to a signal.
pub(crate) fn lower_phi(
    sink: &mut Sink,
    module: &mut Module,
    func: &Function,
    fctx: &mut FnCtx,
    dest: ValueId,
    incomings: &[(BlockIdx, ValueId)],
    pos: Option<Position>,
) -> Option<Operation> {
    if let Some(mux) = try_mux(func, fctx, incomings) {
        let name = fctx.fresh_name("mux");
        let dest_sig = match module.add_signal(Signal::wire(name, SignalType::unknown(), pos.clone())) {
            Ok(sid) => sid,
            Err(e) => {
                sink.report(Severity::Warning, pos, e.to_string());
                return None;
            }
        };
        fctx.value_map.insert(dest, dest_sig);
        let (cond, if_true, if_false) = mux;
        return Some(Operation::Mux {
            dest: dest_sig,
            cond,
            if_true,
            if_false,
        });
    }

    let name = fctx.fresh_name("phi");
    let dest_sig = match module.add_signal(Signal::wire(name, SignalType::unknown(), pos.clone())) {
        Ok(sid) => sid,
        Err(e) => {
            sink.report(Severity::Warning, pos, e.to_string());
            return None;
        }
    };
    fctx.value_map.insert(dest, dest_sig);

    let mut resolved = Vec::with_capacity(incomings.len());
    for (blk, val) in incomings {
        match fctx.signal(*val) {
            Some(sid) => resolved.push((BlockId(blk.0), sid)),
            None => sink.report(Severity::Warning, pos.clone(), "phi incoming value is unmapped, dropping that edge"),
        }
    }
    Some(Operation::Phi {
        dest: dest_sig,
        incomings: resolved,
    })
}

/// Searches `func` for a block whose terminator branches on a condition
/// with exactly `{then, else}` equal to the phi's two predecessor
/// blocks, returning `(cond, if_true, if_false)` signals when found.
fn try_mux(
    func: &Function,
    fctx: &FnCtx,
    incomings: &[(BlockIdx, ValueId)],
) -> Option<(SignalId, SignalId, SignalId)> {
    if incomings.len() != 2 {
        return None;
    }
    let (blk_a, val_a) = incomings[0];
    let (blk_b, val_b) = incomings[1];
    let targets: HashSet<u32> = [blk_a.0, blk_b.0].into_iter().collect();

    for block in &func.blocks {
        if let Term::Branch { cond, then_blk, else_blk } = &block.term {
            let header_targets: HashSet<u32> = [then_blk.0, else_blk.0].into_iter().collect();
            if header_targets != targets {
                continue;
            }
            let cond_sig = fctx.signal(*cond)?;
            let (true_val, false_val) = if then_blk.0 == blk_a.0 {
                (val_a, val_b)
            } else {
                (val_b, val_a)
            };
            let if_true = fctx.signal(true_val)?;
            let if_false = fctx.signal(false_val)?;
            return Some((cond_sig, if_true, if_false));
        }
    }
    None
}
