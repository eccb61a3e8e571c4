//! Enforces the supported SSA subset (spec §4.2): rejects dynamic
//! dispatch, goroutines inside loops, recursion, `select`, maps, and
//! non-constant channel capacities, raising one diagnostic per violation.

mod scc;

use hwc_diag::{Severity, Sink};
use hwc_ssa::{Callee, ChanDepth, Function, Instr, Program, Type};

/// Runs all validator rules over `program`, reporting every violation it
/// finds to `sink` rather than stopping at the first one. Returns `Err`
/// once any error-severity diagnostic has been raised, matching spec
/// §4.2's "fail the compilation if any error was raised."
#[tracing::instrument(skip(program, sink))]
pub fn validate(program: &Program, sink: &mut Sink) -> Result<(), ()> {
    for package in &program.packages {
        for function in &package.functions {
            tracing::debug!(package = %package.name, function = %function.name, "validating function");
            validate_function(program, function, sink);
        }
    }
    if sink.had_errors() {
        Err(())
    } else {
        Ok(())
    }
}

fn validate_function(program: &Program, function: &Function, sink: &mut Sink) {
    let loops = scc::loop_blocks(function);

    for block in &function.blocks {
        let in_loop = loops.contains(&block.idx);
        for inode in &block.instrs {
            let pos = program.positions.get(inode.node).cloned();
            match &inode.instr {
                Instr::Go { callee, .. } => {
                    // Rule 1: only statically-resolved named functions.
                    if matches!(callee, Callee::Dynamic) {
                        sink.report(
                            Severity::Error,
                            pos.clone(),
                            "go statement requires a statically resolved named function \
                             (no interface dispatch, indirect calls, or closures capturing \
                             non-channel state)",
                        );
                    }
                    // Rule 2: no goroutines inside loops.
                    if in_loop {
                        sink.report(
                            Severity::Error,
                            pos.clone(),
                            "goroutines created inside loops are not supported",
                        );
                    }
                    // Rule 3: direct recursion through a static callee.
                    if let Callee::Static(name) = callee {
                        if name == &function.name {
                            sink.report(
                                Severity::Error,
                                pos.clone(),
                                format!("function `{}` cannot spawn itself (recursion)", function.name),
                            );
                        }
                    }
                }
                Instr::Call { callee, .. } => {
                    // Rule 4: interface method calls (dynamic dispatch) are
                    // rejected for ordinary calls too.
                    if matches!(callee, Callee::Dynamic) {
                        sink.report(
                            Severity::Error,
                            pos.clone(),
                            "dynamic dispatch (interface method calls) is not supported",
                        );
                    }
                    // Rule 3, call form: direct self-recursion.
                    if let Callee::Static(name) = callee {
                        if name == &function.name {
                            sink.report(
                                Severity::Error,
                                pos.clone(),
                                format!("function `{}` cannot call itself (recursion)", function.name),
                            );
                        }
                    }
                }
                Instr::MakeChan { elem, depth, .. } => {
                    // Rule 5: constant positive depth, supported element type.
                    match depth {
                        ChanDepth::Const(n) if *n > 0 => {}
                        _ => {
                            sink.report(
                                Severity::Error,
                                pos.clone(),
                                "channel capacity must be a compile-time-constant positive integer",
                            );
                        }
                    }
                    if !is_supported_channel_elem(elem) {
                        sink.report(
                            Severity::Error,
                            pos.clone(),
                            "channel element type must be a supported integer width, bool, \
                             or a fixed-size array of such",
                        );
                    }
                }
                Instr::Select => {
                    // Rule 6.
                    sink.report(Severity::Error, pos.clone(), "select statements are not supported");
                }
                Instr::MapOp => {
                    // Rule 7.
                    sink.report(
                        Severity::Error,
                        pos.clone(),
                        "map construction, lookup, and update are not supported",
                    );
                }
                _ => {}
            }
        }
    }
}

fn is_supported_channel_elem(ty: &Type) -> bool {
    match ty {
        Type::Int { .. } | Type::Bool => true,
        Type::Array { elem, .. } => is_supported_channel_elem(elem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwc_ssa::{Block, BlockIdx, Function, InstrNode, NodeId, Package, PosTable, Term, ValueId};

    fn wrap(program_blocks: Vec<Block>) -> Program {
        let func = Function {
            name: "main".into(),
            node: NodeId(0),
            params: Vec::new(),
            blocks: program_blocks,
        };
        Program {
            packages: vec![Package {
                name: "main".into(),
                functions: vec![func],
            }],
            entry_package: "main".into(),
            entry_function: "main".into(),
            positions: PosTable::new(),
        }
    }

    fn block(idx: u32, instrs: Vec<InstrNode>, term: Term) -> Block {
        Block {
            idx: BlockIdx(idx),
            label: None,
            instrs,
            term,
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }

    #[test]
    fn go_inside_a_loop_is_rejected() {
        // for {} containing `go worker()`: a single self-looping block.
        let go_instr = InstrNode {
            node: NodeId(1),
            instr: Instr::Go {
                callee: Callee::Static("worker".into()),
                args: Vec::new(),
            },
        };
        let blocks = vec![block(0, vec![go_instr], Term::Jump(BlockIdx(0)))];
        let program = wrap(blocks);
        let mut sink = Sink::new();
        let result = validate(&program, &mut sink);
        assert!(result.is_err());
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("inside loops")));
    }

    #[test]
    fn go_outside_a_loop_with_static_callee_is_accepted() {
        let go_instr = InstrNode {
            node: NodeId(1),
            instr: Instr::Go {
                callee: Callee::Static("worker".into()),
                args: Vec::new(),
            },
        };
        let blocks = vec![block(0, vec![go_instr], Term::Return)];
        let program = wrap(blocks);
        let mut sink = Sink::new();
        assert!(validate(&program, &mut sink).is_ok());
    }

    #[test]
    fn self_recursive_call_is_rejected() {
        let call = InstrNode {
            node: NodeId(1),
            instr: Instr::Call {
                dest: None,
                callee: Callee::Static("main".into()),
                args: Vec::new(),
                print: None,
            },
        };
        let blocks = vec![block(0, vec![call], Term::Return)];
        let program = wrap(blocks);
        let mut sink = Sink::new();
        assert!(validate(&program, &mut sink).is_err());
    }

    #[test]
    fn dynamic_dispatch_call_is_rejected() {
        let call = InstrNode {
            node: NodeId(1),
            instr: Instr::Call {
                dest: None,
                callee: Callee::Dynamic,
                args: Vec::new(),
                print: None,
            },
        };
        let blocks = vec![block(0, vec![call], Term::Return)];
        let program = wrap(blocks);
        let mut sink = Sink::new();
        assert!(validate(&program, &mut sink).is_err());
    }

    #[test]
    fn non_const_channel_depth_is_rejected() {
        let make = InstrNode {
            node: NodeId(1),
            instr: Instr::MakeChan {
                dest: ValueId(0),
                elem: Type::Int { width: 8, signed: false },
                depth: ChanDepth::NonConst,
                name: None,
            },
        };
        let blocks = vec![block(0, vec![make], Term::Return)];
        let program = wrap(blocks);
        let mut sink = Sink::new();
        assert!(validate(&program, &mut sink).is_err());
    }

    #[test]
    fn select_and_map_ops_are_rejected() {
        let blocks = vec![block(
            0,
            vec![
                InstrNode {
                    node: NodeId(1),
                    instr: Instr::Select,
                },
                InstrNode {
                    node: NodeId(2),
                    instr: Instr::MapOp,
                },
            ],
            Term::Return,
        )];
        let program = wrap(blocks);
        let mut sink = Sink::new();
        assert!(validate(&program, &mut sink).is_err());
        assert_eq!(sink.error_count(), 2);
    }
}
