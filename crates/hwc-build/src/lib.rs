//! Lowers a validated SSA program into the structural hardware IR (spec
//! §4.3): one module per program, one process per function reachable
//! from `main` via direct entry or `go`, with signals, channels, and
//! operations built up instruction by instruction.

mod builder;

pub use builder::{build, BuildError};
