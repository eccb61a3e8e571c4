mod alloc;
mod binop;
mod concurrency;
mod control;
mod print;

use hwc_diag::{Severity, Sink};
use hwc_ir::{BasicBlock, ChannelId, Design, Module, Process, ProcessId, Sensitivity, SignalId};
use hwc_ssa::{Function, Position, Program, ValueId};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing main package or entry function")]
    MissingEntry,
}

/// A value bound into a callee's parameter list by its spawn site: either
/// a plain signal or a channel (spec §4.3, "Parameter binding across
/// goroutines").
#[derive(Debug, Clone, Copy)]
pub(crate) enum Binding {
    Signal(SignalId),
    Channel(ChannelId),
}

/// Per-function building state: the SSA-value-to-HW-IR-identity maps
/// (spec §9, "SSA identity dependency") and a name-uniquing counter,
/// since every process's signals live in one shared module-level
/// namespace.
pub(crate) struct FnCtx {
    proc_name: String,
    value_map: HashMap<ValueId, SignalId>,
    chan_map: HashMap<ValueId, ChannelId>,
    counter: u32,
}

impl FnCtx {
    fn new(proc_name: impl Into<String>) -> Self {
        Self {
            proc_name: proc_name.into(),
            value_map: HashMap::new(),
            chan_map: HashMap::new(),
            counter: 0,
        }
    }

    fn signal(&self, v: ValueId) -> Option<SignalId> {
        self.value_map.get(&v).copied()
    }

    fn chan(&self, v: ValueId) -> Option<ChannelId> {
        self.chan_map.get(&v).copied()
    }

    /// A fresh, module-wide-unique identifier for a synthesized signal or
    /// channel, scoped by the owning process so two processes' local
    /// variables never collide in the module's shared namespace.
    fn fresh_name(&mut self, base: &str) -> String {
        self.counter += 1;
        format!("{}__{}{}", self.proc_name, base, self.counter)
    }
}

/// Top-level build state, threaded through one `build` invocation.
pub(crate) struct Ctx<'p> {
    program: &'p Program,
    sink: &'p mut Sink,
    design: Design,
    process_ids: HashMap<String, ProcessId>,
    next_free_stage: u32,
}

impl<'p> Ctx<'p> {
    fn pos(&self, node: hwc_ssa::NodeId) -> Option<Position> {
        self.program.positions.get(node).cloned()
    }

    /// Builds (or, if already memoized, looks up) the process for
    /// `func`, binding its parameters from `bindings` (spec §4.3,
    /// "process construction"/"Parameter binding across goroutines").
    /// `stage` is only applied the first time `func` is built — per the
    /// open question in spec §9, a function spawned from multiple sites
    /// gets the stage from whichever spawn site is encountered first in
    /// the builder's (reverse-postorder) traversal.
    pub(crate) fn build_process(
        &mut self,
        func: &Function,
        stage: u32,
        bindings: &[Option<Binding>],
    ) -> ProcessId {
        if let Some(&id) = self.process_ids.get(&func.name) {
            return id;
        }

        let proc_id = ProcessId(self.design.top().processes.len() as u32);
        // Insert before recursing so mutual goroutine spawns (A spawns B,
        // B spawns A) terminate instead of looping forever.
        self.process_ids.insert(func.name.clone(), proc_id);
        self.design
            .top_mut()
            .processes
            .push(Process::new(func.name.clone(), Sensitivity::Sequential, stage));

        let mut fctx = FnCtx::new(func.name.clone());
        self.bind_params(func, bindings, &mut fctx);

        let mut blocks: Vec<BasicBlock> = Vec::with_capacity(func.blocks.len());
        for block in &func.blocks {
            let lowered = control::lower_block(self, func, block, &mut fctx, proc_id);
            blocks.push(lowered);
        }
        let blocks = control::reorder_rpo(blocks);
        self.design.top_mut().processes[proc_id.0 as usize].blocks = blocks;

        proc_id
    }

    fn bind_params(&mut self, func: &Function, bindings: &[Option<Binding>], fctx: &mut FnCtx) {
        for (i, param) in func.params.iter().enumerate() {
            match bindings.get(i).copied().flatten() {
                Some(Binding::Signal(sid)) => {
                    fctx.value_map.insert(param.value, sid);
                }
                Some(Binding::Channel(cid)) => {
                    fctx.chan_map.insert(param.value, cid);
                }
                None => match &param.ty {
                    hwc_ssa::Type::Chan(elem) => {
                        // Channel-typed parameter without a caller binding:
                        // a freshly allocated depth-1 channel (spec §4.3).
                        let name = fctx.fresh_name("chan");
                        let ety = alloc::to_signal_type(elem);
                        let channel = hwc_ir::Channel::new(name, ety, 1, self.pos(func.node));
                        if let Ok(cid) = self.design.top_mut().add_channel(channel) {
                            fctx.chan_map.insert(param.value, cid);
                        }
                    }
                    ty => {
                        let name = fctx.fresh_name("param");
                        let sty = alloc::to_signal_type(ty);
                        let sig = hwc_ir::Signal::wire(name, sty, self.pos(func.node));
                        if let Ok(sid) = self.design.top_mut().add_signal(sig) {
                            fctx.value_map.insert(param.value, sid);
                        }
                    }
                },
            }
        }
    }
}

/// Lowers a validated SSA program into a single-module HW-IR design
/// (spec §4.3 contract).
pub fn build(program: &Program, sink: &mut Sink) -> Result<Design, BuildError> {
    let entry_fn = match program.entry() {
        Some(f) => f,
        None => {
            let _ = sink.report_recoverable(
                Severity::Fatal,
                None,
                "missing main package or entry function",
            );
            return Err(BuildError::MissingEntry);
        }
    };

    let module_pos = program.positions.get(entry_fn.node).cloned();
    let module = Module::new(&entry_fn.name, module_pos);
    let design = Design::new(module);

    let mut ctx = Ctx {
        program,
        sink,
        design,
        process_ids: HashMap::new(),
        next_free_stage: 1,
    };

    ctx.build_process(entry_fn, 0, &[]);

    let module = ctx.design.top_mut();
    let channel_ids: Vec<ChannelId> = module.channels().map(|(id, _)| id).collect();
    for id in channel_ids {
        module.channel_mut(id).finalize_occupancy();
    }

    Ok(ctx.design)
}
