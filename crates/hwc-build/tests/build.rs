//! End-to-end tests lowering small hand-built SSA programs through
//! `hwc_build::build` and checking the resulting HW-IR design.

use hwc_diag::Sink;
use hwc_ir::{Operation, Sensitivity, Terminator};
use hwc_ssa::{
    ArithOp, BinOp, Block, BlockIdx, Callee, ChanDepth, Function, Instr, InstrNode, NodeId, Package,
    Param, PosTable, Program, Term, Type, ValueId,
};

fn single_function_program(func: Function) -> Program {
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

fn node(n: u64, instr: Instr) -> InstrNode {
    InstrNode { node: NodeId(n), instr }
}

#[test]
fn two_operand_addition_builds_a_single_wire_and_bin_op() {
    let blocks = vec![block(
        0,
        vec![
            node(
                1,
                Instr::Alloc {
                    dest: ValueId(0),
                    ty: Type::Int { width: 8, signed: false },
                    name: Some("a".into()),
                },
            ),
            node(
                2,
                Instr::Alloc {
                    dest: ValueId(1),
                    ty: Type::Int { width: 8, signed: false },
                    name: Some("b".into()),
                },
            ),
            node(
                3,
                Instr::BinOp {
                    dest: ValueId(2),
                    op: BinOp::Arith(ArithOp::Add),
                    lhs: ValueId(0),
                    rhs: ValueId(1),
                },
            ),
        ],
        Term::Return,
    )];
    let func = Function {
        name: "main".into(),
        node: NodeId(0),
        params: Vec::new(),
        blocks,
    };
    let program = single_function_program(func);
    let mut sink = Sink::new();
    let design = hwc_build::build(&program, &mut sink).expect("build succeeds");

    let module = design.top();
    assert_eq!(module.signal_count(), 3);
    let root = module.root_process();
    let bin_ops: Vec<_> = root.blocks[0]
        .ops
        .iter()
        .filter(|op| matches!(op, Operation::Bin { op: ArithOp::Add, .. }))
        .collect();
    assert_eq!(bin_ops.len(), 1);
}

#[test]
fn pipeline_with_goroutine_gets_two_processes_and_a_channel() {
    let main_blocks = vec![block(
        0,
        vec![
            node(
                1,
                Instr::MakeChan {
                    dest: ValueId(0),
                    elem: Type::Int { width: 8, signed: false },
                    depth: ChanDepth::Const(4),
                    name: Some("work".into()),
                },
            ),
            node(
                2,
                Instr::Alloc {
                    dest: ValueId(1),
                    ty: Type::Int { width: 8, signed: false },
                    name: Some("item".into()),
                },
            ),
            node(3, Instr::Send { chan: ValueId(0), value: ValueId(1) }),
            node(
                4,
                Instr::Go {
                    callee: Callee::Static("worker".into()),
                    args: vec![ValueId(0)],
                },
            ),
        ],
        Term::Return,
    )];
    let main_fn = Function {
        name: "main".into(),
        node: NodeId(0),
        params: Vec::new(),
        blocks: main_blocks,
    };

    let worker_blocks = vec![block(
        0,
        vec![node(10, Instr::Recv { dest: ValueId(1), chan: ValueId(0) })],
        Term::Return,
    )];
    let worker_fn = Function {
        name: "worker".into(),
        node: NodeId(1),
        params: vec![Param {
            value: ValueId(0),
            ty: Type::Chan(Box::new(Type::Int { width: 8, signed: false })),
        }],
        blocks: worker_blocks,
    };

    let program = Program {
        packages: vec![Package {
            name: "main".into(),
            functions: vec![main_fn, worker_fn],
        }],
        entry_package: "main".into(),
        entry_function: "main".into(),
        positions: PosTable::new(),
    };

    let mut sink = Sink::new();
    let design = hwc_build::build(&program, &mut sink).expect("build succeeds");
    let module = design.top();

    assert_eq!(module.processes.len(), 2);
    assert_eq!(module.channel_count(), 1);
    let (chan_id, channel) = module.channels().next().unwrap();
    assert_eq!(channel.producers.len(), 1);
    assert_eq!(channel.consumers.len(), 1);
    let _ = chan_id;

    let worker_proc = module.processes.iter().find(|p| p.name == "worker").unwrap();
    assert_eq!(worker_proc.stage, 1);
    assert_eq!(worker_proc.sensitivity, Sensitivity::Sequential);
}

#[test]
fn phi_between_a_single_headers_branch_targets_lowers_to_mux() {
    // bb0: branch cond -> bb1, bb2
    // bb1: jump bb3, value a
    // bb2: jump bb3, value b
    // bb3: phi [bb1: a, bb2: b] -> mux(cond, a, b)
    let blocks = vec![
        block(
            0,
            vec![
                node(
                    1,
                    Instr::Alloc {
                        dest: ValueId(0),
                        ty: Type::Bool,
                        name: Some("cond".into()),
                    },
                ),
                node(
                    2,
                    Instr::Alloc {
                        dest: ValueId(1),
                        ty: Type::Int { width: 8, signed: false },
                        name: Some("a".into()),
                    },
                ),
                node(
                    3,
                    Instr::Alloc {
                        dest: ValueId(2),
                        ty: Type::Int { width: 8, signed: false },
                        name: Some("b".into()),
                    },
                ),
            ],
            Term::Branch {
                cond: ValueId(0),
                then_blk: BlockIdx(1),
                else_blk: BlockIdx(2),
            },
        ),
        block(1, vec![], Term::Jump(BlockIdx(3))),
        block(2, vec![], Term::Jump(BlockIdx(3))),
        block(
            3,
            vec![node(
                4,
                Instr::Phi {
                    dest: ValueId(3),
                    incomings: vec![(BlockIdx(1), ValueId(1)), (BlockIdx(2), ValueId(2))],
                },
            )],
            Term::Return,
        ),
    ];
    let func = Function {
        name: "main".into(),
        node: NodeId(0),
        params: Vec::new(),
        blocks,
    };
    let program = single_function_program(func);
    let mut sink = Sink::new();
    let design = hwc_build::build(&program, &mut sink).expect("build succeeds");

    let module = design.top();
    let root = module.root_process();
    let has_mux = root
        .blocks
        .iter()
        .any(|b| b.ops.iter().any(|op| matches!(op, Operation::Mux { .. })));
    assert!(has_mux, "expected the phi to be rewritten into a mux");
    let has_phi = root.blocks.iter().any(|b| b.ops.iter().any(|op| matches!(op, Operation::Phi { .. })));
    assert!(!has_phi, "a mux-eligible phi should not also emit a Phi operation");
}

#[test]
fn reverse_postorder_keeps_the_entry_block_first_and_successors_consistent() {
    // Diamond control flow: entry branches to two arms that both join at
    // a return block. Reordering must keep block 0 as the entry and keep
    // every terminator's successors in range and mirrored by
    // predecessors, regardless of how the front-end originally numbered
    // the arms.
    let blocks = vec![
        block(
            0,
            vec![],
            Term::Branch {
                cond: ValueId(0),
                then_blk: BlockIdx(1),
                else_blk: BlockIdx(2),
            },
        ),
        block(1, vec![], Term::Jump(BlockIdx(3))),
        block(2, vec![], Term::Jump(BlockIdx(3))),
        block(3, vec![], Term::Return),
    ];
    let func = Function {
        name: "main".into(),
        node: NodeId(0),
        params: vec![Param { value: ValueId(0), ty: Type::Bool }],
        blocks,
    };
    let program = single_function_program(func);
    let mut sink = Sink::new();
    let design = hwc_build::build(&program, &mut sink).expect("build succeeds");

    let root = design.top().root_process();
    assert_eq!(root.blocks.len(), 4);
    assert!(matches!(root.blocks[0].term, Terminator::Branch { .. }));

    for (idx, b) in root.blocks.iter().enumerate() {
        for succ in b.term.successors() {
            assert!((succ.0 as usize) < root.blocks.len());
            assert!(
                root.blocks[succ.0 as usize].predecessors.contains(&hwc_ir::BlockId(idx as u32)),
                "successor {} of block {idx} does not list it as a predecessor",
                succ.0
            );
        }
    }

    let return_blocks: Vec<_> = root.blocks.iter().filter(|b| matches!(b.term, Terminator::Return)).collect();
    assert_eq!(return_blocks.len(), 1);
}

#[test]
fn missing_entry_function_is_reported_without_aborting_the_test_process() {
    let program = Program {
        packages: vec![Package {
            name: "main".into(),
            functions: vec![],
        }],
        entry_package: "main".into(),
        entry_function: "main".into(),
        positions: PosTable::new(),
    };
    let mut sink = Sink::new();
    let result = hwc_build::build(&program, &mut sink);
    assert!(result.is_err());
}
