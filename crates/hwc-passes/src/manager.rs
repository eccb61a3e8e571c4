//! A small pass registry that runs every registered pass over a
//! [`Design`]'s modules to a fixed point, mirroring the bounded-iteration
//! shape of the teacher's `core-state::undo::UndoEngine` (a cap on how far
//! a mutation loop is allowed to run before something is wrong) widened
//! from one buffer's edit history to a whole design.

use crate::{width, PassError};
use hwc_diag::Sink;
use hwc_ir::Design;

/// Mirrors `core-state::undo::UNDO_HISTORY_MAX`: a generous cap well
/// beyond what a well-formed module should ever need (spec §4.4,
/// "max-iterations = 32").
pub const DEFAULT_MAX_ITERATIONS: u32 = 32;

/// Runs width inference (and, in the future, any other registered pass)
/// over every module of a design. Only one pass exists today, so this
/// stays a thin wrapper rather than a real plugin registry — but callers
/// invoke it the same way a multi-pass manager would be invoked.
pub struct PassManager {
    max_iterations: u32,
    had_errors: bool,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl PassManager {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            had_errors: false,
        }
    }

    /// Whether the most recent [`PassManager::run`] call failed.
    pub fn had_errors(&self) -> bool {
        self.had_errors
    }

    pub fn run(&mut self, design: &mut Design, sink: &mut Sink) -> Result<(), PassError> {
        self.had_errors = false;
        for module in &mut design.modules {
            if let Err(e) = width::infer_widths(module, sink, self.max_iterations) {
                self.had_errors = true;
                return Err(e);
            }
        }
        Ok(())
    }
}
