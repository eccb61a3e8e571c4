//! Lowering for the non-branching, non-concurrency SSA forms: local
//! allocation, store, load (pointer indirection), convert, and
//! change-type (spec §4.3 dispatch table).

use super::FnCtx;
use hwc_diag::{Severity, Sink};
use hwc_ir::{Module, Operation, Signal, SignalType};
use hwc_ssa::{Position, Type, ValueId};

/// Flattens an SSA type down to a bit width/signedness pair. Arrays
/// flatten to `elem_width * len`; channel types have no signal
/// representation (callers must branch on `Type::Chan` before reaching
/// here).
pub(crate) fn to_signal_type(ty: &Type) -> SignalType {
    match ty {
        Type::Int { width, signed } => SignalType::new(*width, *signed),
        Type::Bool => SignalType::bit(),
        Type::Array { elem, len } => {
            let inner = to_signal_type(elem);
            SignalType::new(inner.width.saturating_mul(*len), inner.signed)
        }
        Type::Chan(_) => SignalType::unknown(),
    }
}

pub(crate) fn lower_alloc(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    dest: ValueId,
    ty: &Type,
    name: &Option<String>,
    pos: Option<Position>,
) {
    let sty = to_signal_type(ty);
    let sig_name = name
        .clone()
        .map(|n| format!("{}__{}", fctx.proc_name, n))
        .unwrap_or_else(|| fctx.fresh_name("reg"));
    let signal = Signal::register(sig_name, sty, pos.clone());
    match module.add_signal(signal) {
        Ok(sid) => {
            fctx.value_map.insert(dest, sid);
        }
        Err(e) => sink.report(Severity::Warning, pos, e.to_string()),
    }
}

/// Lowers a literal into a `SignalKind::Constant` signal, named after its
/// own value so repeated identical literals don't collide (spec §3's
/// constant kind, reachable via literal operands in `store`/`binop`/etc).
pub(crate) fn lower_const(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    dest: ValueId,
    ty: &Type,
    value: u64,
    pos: Option<Position>,
) {
    let sty = to_signal_type(ty);
    let name = fctx.fresh_name(&format!("const{value}"));
    let signal = Signal::constant(name, sty, value, pos.clone());
    match module.add_signal(signal) {
        Ok(sid) => {
            fctx.value_map.insert(dest, sid);
        }
        Err(e) => sink.report(Severity::Warning, pos, e.to_string()),
    }
}

pub(crate) fn lower_store(
    sink: &mut Sink,
    fctx: &FnCtx,
    ptr: ValueId,
    value: ValueId,
    pos: Option<Position>,
) -> Option<Operation> {
    let (Some(ptr_sig), Some(val_sig)) = (fctx.signal(ptr), fctx.signal(value)) else {
        sink.report(Severity::Warning, pos, "store to an unmapped allocation, skipping");
        return None;
    };
    Some(Operation::Assign {
        dest: ptr_sig,
        value: val_sig,
    })
}

/// Loads through a pointer alias the pointer's register directly;
/// loads and stores share the same HW-IR signal (spec §4.3).
pub(crate) fn lower_load(sink: &mut Sink, fctx: &mut FnCtx, dest: ValueId, ptr: ValueId, pos: Option<Position>) {
    match fctx.signal(ptr) {
        Some(sid) => {
            fctx.value_map.insert(dest, sid);
        }
        None => sink.report(Severity::Warning, pos, "load through an unmapped pointer, skipping"),
    }
}

pub(crate) fn lower_convert(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    dest: ValueId,
    value: ValueId,
    to: &Type,
    pos: Option<Position>,
) -> Option<Operation> {
    let Some(val_sig) = fctx.signal(value) else {
        sink.report(Severity::Warning, pos, "convert of an unmapped value, skipping");
        return None;
    };
    let name = fctx.fresh_name("cvt");
    let sty = to_signal_type(to);
    let dest_sig = match module.add_signal(Signal::wire(name, sty, pos.clone())) {
        Ok(sid) => sid,
        Err(e) => {
            sink.report(Severity::Warning, pos, e.to_string());
            return None;
        }
    };
    fctx.value_map.insert(dest, dest_sig);
    Some(Operation::Convert {
        dest: dest_sig,
        value: val_sig,
    })
}

/// Change-type is a same-width reinterpretation: alias the source
/// signal, no operation emitted (spec §4.3, "change-type | alias source
/// signal (no-op)").
pub(crate) fn lower_change_type(sink: &mut Sink, fctx: &mut FnCtx, dest: ValueId, value: ValueId, pos: Option<Position>) {
    match fctx.signal(value) {
        Some(sid) => {
            fctx.value_map.insert(dest, sid);
        }
        None => sink.report(Severity::Warning, pos, "change-type of an unmapped value, skipping"),
    }
}
