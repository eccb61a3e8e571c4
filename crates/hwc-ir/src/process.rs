use crate::op::{Operation, Terminator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

/// A basic block's index within its owning process, stable after the
/// builder's reverse-postorder reordering (spec §3: "the first block is
/// the entry").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Combinational,
    Sequential,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub ops: Vec<Operation>,
    pub term: Terminator,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>, term: Terminator) -> Self {
        Self {
            label: label.into(),
            ops: Vec::new(),
            term,
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Process {
    pub name: String,
    pub sensitivity: Sensitivity,
    pub blocks: Vec<BasicBlock>,
    pub stage: u32,
}

impl Process {
    pub fn new(name: impl Into<String>, sensitivity: Sensitivity, stage: u32) -> Self {
        Self {
            name: name.into(),
            sensitivity,
            blocks: Vec::new(),
            stage,
        }
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    /// True if `self` contains at least one `Phi` operation anywhere
    /// (spec §4.5.3: drives whether the emitter installs a state-machine
    /// lowering for this process).
    pub fn has_phi(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| b.ops.iter().any(|op| matches!(op, Operation::Phi { .. })))
    }
}
