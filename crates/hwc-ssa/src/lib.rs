//! The contract this compiler core consumes from its external front-end
//! (spec §6.1): packages of functions built from basic blocks of SSA
//! instructions, plus the position table the front-end attaches to them.
//!
//! Nothing in this crate does any work — it is the Rust shape of "already
//! parsed, already type-checked SSA," the boundary the validator and the
//! IR builder both sit behind. Front-end concerns (lexing, parsing,
//! package loading, file I/O) are out of scope (spec §1) and have no
//! representation here.

use std::collections::HashMap;

/// Stable identity for an SSA value, assigned by the front-end. The
/// builder maps these to HW-IR signals by identity (spec §9, "SSA
/// identity dependency"), so two instructions referencing the same
/// `ValueId` are guaranteed by the front-end to mean the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// Index of a basic block within its owning function, numbered from zero
/// (spec §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockIdx(pub u32);

/// Identity of a source-level node (instruction, block, or function) used
/// as a key into the position table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// A source file/line/column triple, as supplied by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

/// Maps SSA nodes to source positions. Injected into the diagnostics sink
/// once the front-end has produced it (spec §4.1).
#[derive(Debug, Clone, Default)]
pub struct PosTable {
    entries: HashMap<NodeId, Position>,
}

impl PosTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, pos: Position) {
        self.entries.insert(node, pos);
    }

    pub fn get(&self, node: NodeId) -> Option<&Position> {
        self.entries.get(&node)
    }
}

/// Integer width/signedness, or a fixed-size array of one. Channel
/// element types are restricted to these by the validator (spec §4.2
/// rule 5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `width == 0` means "not yet known" — mirrors the HW-IR signal
    /// type's unknown test (spec §3, Signal type operations).
    Int { width: u32, signed: bool },
    Bool,
    Array { elem: Box<Type>, len: u32 },
    /// A channel-typed value, used for `make(chan T, N)` results and for
    /// channel-typed function parameters (spec §3, Channel: "default 1
    /// for channel-typed function parameters").
    Chan(Box<Type>),
}

impl Type {
    pub fn unknown() -> Self {
        Type::Int {
            width: 0,
            signed: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Int { width: 0, .. })
    }
}

/// How a function is being invoked. `Dynamic` covers interface method
/// dispatch and indirect calls through a value — the validator rejects it
/// unconditionally for `go` (rule 1) and for ordinary calls (rule 4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    Static(String),
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
    ShrUnsigned,
    ShrSigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

/// One binary-operator family SSA instructions dispatch on (spec §4.3
/// table, "binary op").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Arith(ArithOp),
    Rel(RelOp),
}

/// A channel's declared capacity. Only `Const` is legal; `NonConst` exists
/// so the validator has something concrete to reject under rule 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDepth {
    Const(u32),
    NonConst,
}

/// One formatted-print verb operand, pre-parsing; `hwc-build` does the
/// actual format-string parsing (spec §4.3.1).
#[derive(Debug, Clone)]
pub struct PrintCall {
    pub format_is_const: bool,
    pub format: String,
    pub args: Vec<ValueId>,
}

/// The SSA instruction forms the builder dispatches on (spec §4.3 table),
/// plus the constructs the validator must reject (`Select`, map
/// operations, interface calls folded into `Call`/`Go` via
/// `Callee::Dynamic`).
#[derive(Debug, Clone)]
pub enum Instr {
    /// Local allocation of an integer (or array-of-integer) type. `name`
    /// is the allocation's source comment, when the front-end attaches
    /// one (spec §4.3: "create a register signal named after the
    /// allocation's source comment").
    Alloc {
        dest: ValueId,
        ty: Type,
        name: Option<String>,
    },
    /// A compile-time integer literal (spec §3: a signal's kind may be
    /// "constant", with an optional literal value).
    Const {
        dest: ValueId,
        ty: Type,
        value: u64,
    },
    Store { ptr: ValueId, value: ValueId },
    /// Unary indirection (load through pointer).
    Load { dest: ValueId, ptr: ValueId },
    BinOp {
        dest: ValueId,
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// Unary not.
    Not { dest: ValueId, value: ValueId },
    Convert { dest: ValueId, value: ValueId, to: Type },
    /// Same-width reinterpretation; no-op at the HW-IR level.
    ChangeType { dest: ValueId, value: ValueId, to: Type },
    MakeChan {
        dest: ValueId,
        elem: Type,
        depth: ChanDepth,
        /// The `make`-bound variable's source comment, if any, used to
        /// name the channel in the HW-IR module's channel table.
        name: Option<String>,
    },
    Send { chan: ValueId, value: ValueId },
    /// Unary arrow (channel receive).
    Recv { dest: ValueId, chan: ValueId },
    Phi {
        dest: ValueId,
        incomings: Vec<(BlockIdx, ValueId)>,
    },
    Go { callee: Callee, args: Vec<ValueId> },
    Call {
        dest: Option<ValueId>,
        callee: Callee,
        args: Vec<ValueId>,
        print: Option<PrintCall>,
    },
    /// Always rejected by the validator (rule 6).
    Select,
    /// Always rejected by the validator (rule 7): construction, lookup,
    /// or update of a map value.
    MapOp,
}

/// One instruction plus the node identity used to look its position up in
/// the `PosTable`.
#[derive(Debug, Clone)]
pub struct InstrNode {
    pub node: NodeId,
    pub instr: Instr,
}

/// A basic block's terminator (spec §3, Terminators).
#[derive(Debug, Clone)]
pub enum Term {
    Branch {
        cond: ValueId,
        then_blk: BlockIdx,
        else_blk: BlockIdx,
    },
    Jump(BlockIdx),
    Return,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub idx: BlockIdx,
    /// Free-form label, usually derived from an SSA comment; falls back
    /// to the block index when absent (mirrors spec §3's "derived from
    /// SSA block comment or index").
    pub label: Option<String>,
    pub instrs: Vec<InstrNode>,
    pub term: Term,
    pub predecessors: Vec<BlockIdx>,
    pub successors: Vec<BlockIdx>,
}

impl Block {
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("bb{}", self.idx.0))
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub value: ValueId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub node: NodeId,
    pub params: Vec<Param>,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn block(&self, idx: BlockIdx) -> &Block {
        &self.blocks[idx.0 as usize]
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub functions: Vec<Function>,
}

impl Package {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// The full program supplied by the front-end: a set of packages plus the
/// entry point (spec §6.1, "missing main package or entry function" is a
/// fatal error surfaced downstream if these don't resolve).
#[derive(Debug, Clone)]
pub struct Program {
    pub packages: Vec<Package>,
    pub entry_package: String,
    pub entry_function: String,
    pub positions: PosTable,
}

impl Program {
    pub fn entry(&self) -> Option<&Function> {
        self.packages
            .iter()
            .find(|p| p.name == self.entry_package)
            .and_then(|p| p.function(&self.entry_function))
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.packages.iter().find_map(|p| p.function(name))
    }
}
