//! Post-build passes over the HW-IR design: today just width/signedness
//! inference (spec §4.4), run to a fixed point by [`PassManager`].

mod manager;
mod width;

pub use manager::{PassManager, DEFAULT_MAX_ITERATIONS};

/// A registered pass failed to complete (spec §7: "Width inference
/// non-convergence | Fatal").
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("width inference did not converge within {max} iterations in module `{module}`")]
    NotConverged { module: String, max: u32 },
    #[error("width inference reported one or more errors in module `{module}`")]
    Failed { module: String },
}
