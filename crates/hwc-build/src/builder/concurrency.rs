//! Lowering for channel construction, send/receive, and goroutine spawn
//! (spec §4.3: concurrency forms). `lower_go` is the one lowering that
//! needs the whole build context rather than just a signal/module slice,
//! since spawning recurses into [`super::Ctx::build_process`] for the
//! callee and assigns it a pipeline stage.

use super::{alloc, Binding, Ctx, FnCtx};
use hwc_diag::{Severity, Sink};
use hwc_ir::{Channel, Module, Operation, ProcessId, Signal};
use hwc_ssa::{Callee, ChanDepth, Function, Position, Type, ValueId};

pub(crate) fn lower_make_chan(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    dest: ValueId,
    elem: &Type,
    depth: &ChanDepth,
    name: &Option<String>,
    pos: Option<Position>,
) {
    let depth = match depth {
        ChanDepth::Const(n) if *n > 0 => *n,
        _ => {
            sink.report(Severity::Warning, pos.clone(), "non-constant channel depth, defaulting to 1");
            1
        }
    };
    let chan_name = name
        .clone()
        .map(|n| format!("{}__{}", fctx.proc_name, n))
        .unwrap_or_else(|| fctx.fresh_name("chan"));
    let ety = alloc::to_signal_type(elem);
    let channel = Channel::new(chan_name, ety, depth, pos.clone());
    match module.add_channel(channel) {
        Ok(cid) => {
            fctx.chan_map.insert(dest, cid);
        }
        Err(e) => sink.report(Severity::Warning, pos, e.to_string()),
    }
}

pub(crate) fn lower_send(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &FnCtx,
    proc_id: ProcessId,
    chan: ValueId,
    value: ValueId,
    pos: Option<Position>,
) -> Option<Operation> {
    let (Some(cid), Some(val_sig)) = (fctx.chan(chan), fctx.signal(value)) else {
        sink.report(Severity::Warning, pos, "send on an unmapped channel or value, skipping");
        return None;
    };
    let channel = module.channel_mut(cid);
    channel.add_producer(proc_id);
    channel.record_send();
    Some(Operation::Send { channel: cid, value: val_sig })
}

pub(crate) fn lower_recv(
    sink: &mut Sink,
    module: &mut Module,
    fctx: &mut FnCtx,
    proc_id: ProcessId,
    dest: ValueId,
    chan: ValueId,
    pos: Option<Position>,
) -> Option<Operation> {
    let Some(cid) = fctx.chan(chan) else {
        sink.report(Severity::Warning, pos, "receive on an unmapped channel, skipping");
        return None;
    };
    let elem_ty = module.channel(cid).elem;
    let name = fctx.fresh_name("recv");
    let dest_sig = match module.add_signal(Signal::wire(name, elem_ty, pos.clone())) {
        Ok(sid) => sid,
        Err(e) => {
            sink.report(Severity::Warning, pos, e.to_string());
            return None;
        }
    };
    fctx.value_map.insert(dest, dest_sig);
    let channel = module.channel_mut(cid);
    channel.add_consumer(proc_id);
    channel.record_recv();
    Some(Operation::Recv { channel: cid, dest: dest_sig })
}

/// Spawns `callee` as a process, threading the caller's resolved
/// arguments through as the child's parameter bindings (spec §4.3,
/// "Parameter binding across goroutines"). The child's stage is
/// `max(parent_stage + 1, next_free_stage)`, then `next_free_stage`
/// advances past it (spec §9 open-question resolution, see DESIGN.md).
pub(crate) fn lower_go(
    ctx: &mut Ctx,
    _caller: &Function,
    fctx: &FnCtx,
    proc_id: ProcessId,
    callee: &Callee,
    args: &[ValueId],
    pos: Option<Position>,
) -> Option<Operation> {
    let name = match callee {
        Callee::Static(n) => n,
        Callee::Dynamic => {
            ctx.sink.report(Severity::Warning, pos, "go with a dynamic callee, skipping spawn");
            return None;
        }
    };
    let Some(target) = ctx.program.find_function(name) else {
        ctx.sink.report(Severity::Warning, pos, format!("go target `{name}` not found, skipping spawn"));
        return None;
    };
    let target = target.clone();

    let mut bindings = Vec::with_capacity(args.len());
    for arg in args {
        let binding = match (fctx.signal(*arg), fctx.chan(*arg)) {
            (Some(sid), _) => Some(Binding::Signal(sid)),
            (None, Some(cid)) => Some(Binding::Channel(cid)),
            (None, None) => {
                ctx.sink.report(Severity::Warning, pos.clone(), "spawn argument is unmapped, passing no binding");
                None
            }
        };
        bindings.push(binding);
    }

    let parent_stage = ctx.design.top().processes[proc_id.0 as usize].stage;
    let child_stage = (parent_stage + 1).max(ctx.next_free_stage);
    ctx.next_free_stage = child_stage + 1;

    let child_id = ctx.build_process(&target, child_stage, &bindings);

    let mut signal_args = Vec::new();
    let mut channel_args = Vec::new();
    for binding in bindings.into_iter().flatten() {
        match binding {
            Binding::Signal(sid) => signal_args.push(sid),
            Binding::Channel(cid) => channel_args.push(cid),
        }
    }

    Some(Operation::Spawn {
        callee: child_id,
        signal_args,
        channel_args,
    })
}
