//! Pipeline facade tying the validator, builder, pass manager and emitter
//! together into one entry point. Owns no parsing or file I/O beyond the
//! `Write` sink it is handed; everything else is delegated to the stage
//! crates.

use std::io::Write;

use hwc_diag::Sink;
use hwc_ssa::Program;

/// Which textual form [`compile`] renders accumulated diagnostics in when a
/// stage fails. Mirrors `hwc-diag`'s `emit_text`/`emit_json` split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticFormat {
    #[default]
    Text,
    Json,
}

/// Caller-constructed configuration for [`compile`]. There is deliberately
/// no file-backed config loader here (§1's non-goal on CLI/package I/O) —
/// callers that want one build a `CompileOptions` from whatever source they
/// like and pass it in.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub diagnostic_format: DiagnosticFormat,
    pub max_width_inference_iterations: u32,
    pub extern_fifo_prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            diagnostic_format: DiagnosticFormat::default(),
            max_width_inference_iterations: hwc_passes::DEFAULT_MAX_ITERATIONS,
            extern_fifo_prefix: hwc_emit::DEFAULT_FIFO_PREFIX.to_string(),
        }
    }
}

/// Aggregates the per-stage failure modes of [`compile`]. Each stage variant
/// carries its accumulated diagnostics, rendered in the format requested by
/// `CompileOptions::diagnostic_format`, so a caller can surface them without
/// reaching back into a `Sink`.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("SSA validation failed:\n{0}")]
    Validate(String),
    #[error("IR build failed:\n{0}")]
    Build(String),
    #[error("width inference failed:\n{0}")]
    Passes(String),
    #[error("emission failed: {0}")]
    Emit(#[from] hwc_emit::EmitError),
    #[error("{0}")]
    Fatal(String),
}

fn render_diagnostics(sink: &Sink, format: DiagnosticFormat) -> String {
    let mut buf = Vec::new();
    let result = match format {
        DiagnosticFormat::Text => sink.emit_text(&mut buf),
        DiagnosticFormat::Json => sink.emit_json(&mut buf),
    };
    result.expect("writing to an in-memory buffer never fails");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Runs the full pipeline over `program`: validation (§4.2), HW-IR building
/// (§4.3), width inference to a fixed point (§4.4), then deterministic
/// textual emission (§4.5) written to `out`.
///
/// Every stage uses [`Sink::report_recoverable`] internally (directly or
/// transitively), so a fatal diagnostic unwinds through this `Result`
/// instead of aborting the process.
#[tracing::instrument(skip(program, out))]
pub fn compile(
    program: &Program,
    options: &CompileOptions,
    out: &mut dyn Write,
) -> Result<(), CompileError> {
    let mut sink = Sink::new();

    if hwc_validate::validate(program, &mut sink).is_err() {
        return Err(CompileError::Validate(render_diagnostics(&sink, options.diagnostic_format)));
    }

    let mut design = match hwc_build::build(program, &mut sink) {
        Ok(design) => design,
        Err(_) => return Err(CompileError::Build(render_diagnostics(&sink, options.diagnostic_format))),
    };

    let mut passes = hwc_passes::PassManager::new(options.max_width_inference_iterations);
    if passes.run(&mut design, &mut sink).is_err() {
        return Err(CompileError::Passes(render_diagnostics(&sink, options.diagnostic_format)));
    }

    let text = hwc_emit::emit(&design, &options.extern_fifo_prefix)?;
    out.write_all(text.as_bytes())
        .map_err(|e| CompileError::Fatal(e.to_string()))?;

    if sink.had_errors() {
        tracing::warn!(count = sink.error_count(), "compile finished with non-fatal diagnostics");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwc_ssa::{
        ArithOp, BinOp, Block, BlockIdx, Function, Instr, InstrNode, NodeId, Package, PosTable,
        Term, Type, ValueId,
    };

    fn node(n: u64, instr: Instr) -> InstrNode {
        InstrNode { node: NodeId(n), instr }
    }

    fn single_function_program(func: Function) -> Program {
        Program {
            packages: vec![Package { name: "main".into(), functions: vec![func] }],
            entry_package: "main".into(),
            entry_function: "main".into(),
            positions: PosTable::new(),
        }
    }

    fn addition_program() -> Program {
        let blocks = vec![Block {
            idx: BlockIdx(0),
            label: None,
            instrs: vec![
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
            term: Term::Return,
            predecessors: Vec::new(),
            successors: Vec::new(),
        }];
        single_function_program(Function { name: "main".into(), node: NodeId(0), params: Vec::new(), blocks })
    }

    #[test]
    fn compiling_a_well_formed_program_emits_hw_dialect_text() {
        let program = addition_program();
        let options = CompileOptions::default();
        let mut out = Vec::new();
        compile(&program, &options, &mut out).expect("compile succeeds");
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("module {\n"));
        assert!(text.contains("add i8"));
    }

    #[test]
    fn an_empty_program_fails_the_build_stage_with_rendered_diagnostics() {
        let program = Program {
            packages: vec![Package { name: "main".into(), functions: Vec::new() }],
            entry_package: "main".into(),
            entry_function: "main".into(),
            positions: PosTable::new(),
        };
        let options = CompileOptions::default();
        let mut out = Vec::new();
        let err = compile(&program, &options, &mut out).unwrap_err();
        match err {
            CompileError::Build(rendered) => assert!(!rendered.is_empty()),
            other => panic!("expected a Build failure, got {other:?}"),
        }
    }

    #[test]
    fn json_diagnostic_format_is_valid_json_lines() {
        let program = Program {
            packages: vec![Package { name: "main".into(), functions: Vec::new() }],
            entry_package: "main".into(),
            entry_function: "main".into(),
            positions: PosTable::new(),
        };
        let options = CompileOptions { diagnostic_format: DiagnosticFormat::Json, ..CompileOptions::default() };
        let mut out = Vec::new();
        let err = compile(&program, &options, &mut out).unwrap_err();
        let CompileError::Build(rendered) = err else { panic!("expected a Build failure") };
        for line in rendered.lines() {
            assert!(serde_json::from_str::<serde_json::Value>(line).is_ok());
        }
    }

    #[test]
    fn default_options_use_the_pass_manager_and_emitter_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.max_width_inference_iterations, hwc_passes::DEFAULT_MAX_ITERATIONS);
        assert_eq!(options.extern_fifo_prefix, hwc_emit::DEFAULT_FIFO_PREFIX);
    }
}
