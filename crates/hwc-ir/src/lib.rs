//! The structural hardware intermediate representation (spec §3):
//! designs, modules, signals, channels, processes, basic blocks,
//! operations and terminators.
//!
//! This crate is pure data plus the handful of type-algebra operations
//! width inference needs (`SignalType::promote` and friends). Nothing
//! here builds, validates, or emits a design — see `hwc-build`,
//! `hwc-validate`, `hwc-passes` and `hwc-emit`.

mod channel;
mod design;
mod module;
mod op;
mod process;
mod signal;
mod types;

pub use channel::{Channel, ChannelId, Direction, Endpoint};
pub use design::Design;
pub use module::{IrError, Module, Port, PortDir};
pub use op::{Operation, PrintSegment, PrintVerb, Terminator};
pub use process::{BasicBlock, BlockId, Process, ProcessId, Sensitivity};
pub use signal::{Signal, SignalId, SignalKind};
pub use types::SignalType;
