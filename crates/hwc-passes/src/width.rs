//! Width/signedness inference (spec §4.4): propagate `SignalType` across
//! every operation in a module to a fixed point, bounded by
//! `max_iterations`.

use crate::PassError;
use hwc_diag::{Severity, Sink};
use hwc_ir::{BlockId, Module, Operation, Signal, SignalId, SignalType};
use hwc_ssa::{ArithOp, BinOp};
use std::collections::HashSet;
use tracing::trace;

/// A pending "insert an implicit shift-amount `Convert`" fix discovered
/// while scanning a block, applied after the scan so we don't mutate
/// `ops` while iterating it (spec §4.4, "Bin (shift)").
struct ShiftFix {
    op_index: usize,
    amount_sig: SignalId,
    data_ty: SignalType,
}

/// Runs width inference over `module` to a fixed point, then defaults any
/// signal still unknown to 1-bit unsigned (spec §8 invariant 2: "after
/// width inference converges, every signal has width ≥ 1").
pub(crate) fn infer_widths(module: &mut Module, sink: &mut Sink, max_iterations: u32) -> Result<u32, PassError> {
    let errors_before = sink.error_count();
    let mut iterations = 0u32;
    // Destinations already reported as mismatched, so a type error that
    // persists across iterations is only surfaced once.
    let mut reported: HashSet<SignalId> = HashSet::new();
    loop {
        let changed = run_iteration(module, sink, &mut reported);
        iterations += 1;
        trace!(target: "passes.width", module = %module.name, iteration = iterations, changed, "width_iteration");
        if !changed {
            break;
        }
        if iterations >= max_iterations {
            let _ = sink.report_recoverable(
                Severity::Fatal,
                module.pos.clone(),
                format!("width inference did not converge within {max_iterations} iterations in module `{}`", module.name),
            );
            return Err(PassError::NotConverged {
                module: module.name.clone(),
                max: max_iterations,
            });
        }
    }

    default_remaining_unknowns(module, sink);

    if sink.error_count() > errors_before {
        return Err(PassError::Failed { module: module.name.clone() });
    }
    Ok(iterations)
}

fn run_iteration(module: &mut Module, sink: &mut Sink, reported: &mut HashSet<SignalId>) -> bool {
    let mut changed = false;
    for p in 0..module.processes.len() {
        for b in 0..module.processes[p].blocks.len() {
            changed |= run_block(module, p, b, sink, reported);
        }
    }
    changed
}

fn run_block(module: &mut Module, p: usize, b: usize, sink: &mut Sink, reported: &mut HashSet<SignalId>) -> bool {
    let mut changed = false;
    let op_count = module.processes[p].blocks[b].ops.len();
    let mut shift_fixes: Vec<ShiftFix> = Vec::new();

    for i in 0..op_count {
        let op = module.processes[p].blocks[b].ops[i].clone();
        changed |= match op {
            Operation::Bin { dest, op, left, right } => propagate_bin(module, dest, op, left, right, i, &mut shift_fixes, sink, reported),
            Operation::Compare { dest, left, right, .. } => propagate_compare(module, dest, left, right, sink, reported),
            Operation::Assign { dest, value } => propagate_assign(module, dest, value, sink, reported),
            Operation::Not { dest, value } => unify(module, dest, value),
            Operation::Mux { dest, cond, if_true, if_false } => propagate_mux(module, dest, cond, if_true, if_false),
            Operation::Phi { dest, incomings } => propagate_phi(module, dest, &incomings),
            Operation::Convert { .. } | Operation::Print { .. } | Operation::Send { .. } | Operation::Recv { .. } | Operation::Spawn { .. } => false,
        };
    }

    // Apply highest index first so earlier, not-yet-applied indices stay valid.
    shift_fixes.sort_by(|a, b| b.op_index.cmp(&a.op_index));
    for fix in shift_fixes {
        changed |= apply_shift_fix(module, p, b, fix, sink);
    }
    changed
}

/// If exactly one side is unknown, copies the other's type onto it.
fn unify(module: &mut Module, a: SignalId, b: SignalId) -> bool {
    let at = module.signal(a).ty;
    let bt = module.signal(b).ty;
    if at.is_unknown() && !bt.is_unknown() {
        module.signal_mut(a).ty = bt;
        true
    } else if bt.is_unknown() && !at.is_unknown() {
        module.signal_mut(b).ty = at;
        true
    } else {
        false
    }
}

/// Sets `dest`'s type to `result` if `dest` is still unknown; otherwise
/// verifies `result` fits within it without truncation.
fn propagate_to_dest(module: &mut Module, dest: SignalId, result: SignalType, sink: &mut Sink, reported: &mut HashSet<SignalId>, context: &str) -> bool {
    if result.is_unknown() {
        return false;
    }
    let dest_ty = module.signal(dest).ty;
    if dest_ty.is_unknown() {
        module.signal_mut(dest).ty = result;
        return true;
    }
    if !result.fits_within(&dest_ty) && reported.insert(dest) {
        let pos = module.signal(dest).pos.clone();
        sink.report(Severity::Error, pos, format!("{context} result does not fit within destination width"));
    }
    false
}

fn propagate_bin(
    module: &mut Module,
    dest: SignalId,
    op: ArithOp,
    left: SignalId,
    right: SignalId,
    op_index: usize,
    shift_fixes: &mut Vec<ShiftFix>,
    sink: &mut Sink,
    reported: &mut HashSet<SignalId>,
) -> bool {
    let is_shift = matches!(op, ArithOp::Shl | ArithOp::ShrUnsigned | ArithOp::ShrSigned);
    if is_shift {
        let lt = module.signal(left).ty;
        let rt = module.signal(right).ty;
        if !lt.is_unknown() && !rt.is_unknown() && lt.width != rt.width {
            shift_fixes.push(ShiftFix { op_index, amount_sig: right, data_ty: lt });
        }
        return propagate_to_dest(module, dest, lt, sink, reported, "shift");
    }

    let mut changed = unify(module, left, right);
    let lt = module.signal(left).ty;
    let rt = module.signal(right).ty;
    if !lt.is_unknown() && !rt.is_unknown() && !lt.signed_compatible(&rt) && reported.insert(dest) {
        let pos = module.signal(dest).pos.clone();
        sink.report(Severity::Error, pos, format!("mixed signed/unsigned operands in {op:?}"));
    }
    let result = lt.result_for_binop(&rt, BinOp::Arith(op));
    changed |= propagate_to_dest(module, dest, result, sink, reported, "binary operation");
    changed
}

/// Assign (a clocked register update): like [`unify`], but once both sides
/// are known, verify the value both fits within and shares signedness
/// with the register (spec §4.4, "Assign").
fn propagate_assign(module: &mut Module, dest: SignalId, value: SignalId, sink: &mut Sink, reported: &mut HashSet<SignalId>) -> bool {
    let changed = unify(module, dest, value);
    let dt = module.signal(dest).ty;
    let vt = module.signal(value).ty;
    if !dt.is_unknown() && !vt.is_unknown() && reported.insert(dest) {
        if !vt.fits_within(&dt) {
            let pos = module.signal(dest).pos.clone();
            sink.report(Severity::Error, pos, "assigned value does not fit within the register's width");
        } else if !vt.signed_compatible(&dt) {
            let pos = module.signal(dest).pos.clone();
            sink.report(Severity::Error, pos, "assigned value has incompatible signedness with the register");
        } else {
            reported.remove(&dest);
        }
    }
    changed
}

fn propagate_compare(module: &mut Module, dest: SignalId, left: SignalId, right: SignalId, sink: &mut Sink, reported: &mut HashSet<SignalId>) -> bool {
    let changed = unify(module, left, right);
    let lt = module.signal(left).ty;
    let rt = module.signal(right).ty;
    if !lt.is_unknown() && !rt.is_unknown() && (lt.width != rt.width || !lt.signed_compatible(&rt)) && reported.insert(dest) {
        let pos = module.signal(dest).pos.clone();
        sink.report(Severity::Error, pos, "compare operands have mismatched width or signedness");
    }
    // Destination is already forced to 1-bit unsigned at construction.
    changed
}

fn propagate_mux(module: &mut Module, dest: SignalId, cond: SignalId, if_true: SignalId, if_false: SignalId) -> bool {
    let mut changed = false;
    if module.signal(cond).ty.is_unknown() {
        module.signal_mut(cond).ty = SignalType::bit();
        changed = true;
    }
    changed |= unify(module, if_true, if_false);
    changed |= unify(module, dest, if_true);
    changed |= unify(module, dest, if_false);
    changed
}

fn propagate_phi(module: &mut Module, dest: SignalId, incomings: &[(BlockId, SignalId)]) -> bool {
    let mut changed = false;
    for &(_, sig) in incomings {
        changed |= unify(module, dest, sig);
    }
    changed
}

/// Materializes a shift's pending implicit `Convert`: a new signal at the
/// data width with the amount's signedness, spliced in before the shift
/// and wired into its `right` operand.
fn apply_shift_fix(module: &mut Module, p: usize, b: usize, fix: ShiftFix, sink: &mut Sink) -> bool {
    let amount = module.signal(fix.amount_sig);
    let new_ty = SignalType::new(fix.data_ty.width, amount.ty.signed);
    let pos = amount.pos.clone();
    let proc_name = module.processes[p].name.clone();
    let block_label = module.processes[p].blocks[b].label.clone();
    let name = format!("{proc_name}__{block_label}__shamt{}", fix.op_index);

    let new_sig = match module.add_signal(Signal::wire(name, new_ty, pos)) {
        Ok(sid) => sid,
        Err(e) => {
            sink.report(Severity::Warning, None, e.to_string());
            return false;
        }
    };

    let block = &mut module.processes[p].blocks[b];
    block.ops.insert(fix.op_index, Operation::Convert { dest: new_sig, value: fix.amount_sig });
    if let Operation::Bin { right, .. } = &mut block.ops[fix.op_index + 1] {
        *right = new_sig;
    }
    true
}

fn default_remaining_unknowns(module: &mut Module, sink: &mut Sink) {
    let unresolved: Vec<SignalId> = module.signals().filter(|(_, s)| s.ty.is_unknown()).map(|(id, _)| id).collect();
    for id in unresolved {
        let signal = module.signal(id);
        let name = signal.name.clone();
        let pos = signal.pos.clone();
        sink.report(
            Severity::Warning,
            pos,
            format!("signal `{name}` has no inferred type after width inference converged; defaulting to 1-bit unsigned"),
        );
        module.signal_mut(id).ty = SignalType::bit();
    }
}
