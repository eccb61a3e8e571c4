use crate::channel::ChannelId;
use crate::process::{BlockId, ProcessId};
use crate::signal::SignalId;
use hwc_ssa::{ArithOp, RelOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintVerb {
    Dec,
    Hex,
    Bin,
}

#[derive(Debug, Clone)]
pub enum PrintSegment {
    Literal(String),
    Value { signal: SignalId, verb: PrintVerb },
}

/// One HW-IR operation (spec §3, "Operations (sum type)").
#[derive(Debug, Clone)]
pub enum Operation {
    Bin {
        dest: SignalId,
        op: ArithOp,
        left: SignalId,
        right: SignalId,
    },
    Compare {
        dest: SignalId,
        pred: RelOp,
        left: SignalId,
        right: SignalId,
    },
    /// Clocked register update.
    Assign { dest: SignalId, value: SignalId },
    /// Bit-width change: truncate, zero-extend, or sign-extend depending
    /// on the source's signedness.
    Convert { dest: SignalId, value: SignalId },
    Not { dest: SignalId, value: SignalId },
    Mux {
        dest: SignalId,
        cond: SignalId,
        if_true: SignalId,
        if_false: SignalId,
    },
    Phi {
        dest: SignalId,
        incomings: Vec<(BlockId, SignalId)>,
    },
    Print { segments: Vec<PrintSegment> },
    Send { channel: ChannelId, value: SignalId },
    Recv { channel: ChannelId, dest: SignalId },
    Spawn {
        callee: ProcessId,
        signal_args: Vec<SignalId>,
        channel_args: Vec<ChannelId>,
    },
}

/// A basic block's terminator (spec §3, "Terminators (sum type)").
#[derive(Debug, Clone)]
pub enum Terminator {
    Branch {
        cond: SignalId,
        true_succ: BlockId,
        false_succ: BlockId,
    },
    Jump(BlockId),
    Return,
}

impl Terminator {
    /// The block's successor list, which must always equal this (spec
    /// §8 invariant 4).
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Branch {
                true_succ,
                false_succ,
                ..
            } => vec![*true_succ, *false_succ],
            Terminator::Jump(b) => vec![*b],
            Terminator::Return => Vec::new(),
        }
    }
}
