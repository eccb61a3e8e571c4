//! Non-phi operation lowering (spec §4.5.3). `Phi` is handled separately by
//! `fsm.rs` whenever its process retains one; if one is ever seen here it
//! gets only a comment stub, matching the contract's "otherwise emit a
//! comment stub."

use crate::convert;
use crate::naming::{int_type, sig_ref, NameScope};
use crate::writer::TextWriter;
use hwc_ir::{Module, Operation, PrintSegment, PrintVerb};
use hwc_ssa::{ArithOp, RelOp};

fn arith_mnemonic(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "add",
        ArithOp::Sub => "sub",
        ArithOp::Mul => "mul",
        ArithOp::And => "and",
        ArithOp::Or => "or",
        ArithOp::Xor => "xor",
        ArithOp::Shl => "shl",
        ArithOp::ShrUnsigned => "shr-u",
        ArithOp::ShrSigned => "shr-s",
    }
}

fn rel_mnemonic(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "eq",
        RelOp::Ne => "ne",
        RelOp::Slt => "slt",
        RelOp::Sle => "sle",
        RelOp::Sgt => "sgt",
        RelOp::Sge => "sge",
        RelOp::Ult => "ult",
        RelOp::Ule => "ule",
        RelOp::Ugt => "ugt",
        RelOp::Uge => "uge",
    }
}

fn build_print_format(module: &Module, segments: &[PrintSegment]) -> (String, Vec<String>) {
    let mut fmt = String::new();
    let mut args = Vec::new();
    for seg in segments {
        match seg {
            PrintSegment::Literal(s) => fmt.push_str(&s.replace('%', "%%")),
            PrintSegment::Value { signal, verb } => {
                fmt.push_str(match verb {
                    PrintVerb::Dec => "%d",
                    PrintVerb::Hex => "%x",
                    PrintVerb::Bin => "%b",
                });
                args.push(sig_ref(&module.signal(*signal).name));
            }
        }
    }
    (fmt, args)
}

/// Emits one operation's lowering into `w`. `clk_seq` lazily holds the
/// process-scoped sequential-clock value name, cast the first time an
/// `Assign` is seen (spec §4.5.3, "the clock is lazily cast once per
/// process").
pub fn emit_operation(
    w: &mut TextWriter,
    module: &Module,
    op: &Operation,
    scope: &mut NameScope,
    clk_seq: &mut Option<String>,
) {
    match op {
        Operation::Bin { dest, op, left, right } => {
            let d = module.signal(*dest);
            let l = module.signal(*left);
            let r = module.signal(*right);
            w.line(format!(
                "{} = {} {} {}, {}",
                sig_ref(&d.name),
                arith_mnemonic(*op),
                int_type(l.ty),
                sig_ref(&l.name),
                sig_ref(&r.name)
            ));
        }
        Operation::Compare { dest, pred, left, right } => {
            let d = module.signal(*dest);
            let l = module.signal(*left);
            let r = module.signal(*right);
            w.line(format!(
                "{} = cmp {} {} {}, {}",
                sig_ref(&d.name),
                rel_mnemonic(*pred),
                int_type(l.ty),
                sig_ref(&l.name),
                sig_ref(&r.name)
            ));
        }
        Operation::Not { dest, value } => {
            let d = module.signal(*dest);
            let v = module.signal(*value);
            w.line(format!("{} = not {} {}", sig_ref(&d.name), int_type(v.ty), sig_ref(&v.name)));
        }
        Operation::Mux { dest, cond, if_true, if_false } => {
            let d = module.signal(*dest);
            let c = module.signal(*cond);
            let t = module.signal(*if_true);
            let f = module.signal(*if_false);
            w.line(format!(
                "{} = mux {} {}, {} {}, {} {}",
                sig_ref(&d.name),
                int_type(c.ty),
                sig_ref(&c.name),
                int_type(t.ty),
                sig_ref(&t.name),
                int_type(f.ty),
                sig_ref(&f.name)
            ));
        }
        Operation::Convert { dest, value } => {
            let d = module.signal(*dest);
            let v = module.signal(*value);
            for line in convert::lower(&d.name, d.ty, &v.name, v.ty, scope) {
                w.line(line);
            }
        }
        Operation::Assign { dest, value } => {
            let d = module.signal(*dest);
            let v = module.signal(*value);
            if clk_seq.is_none() {
                w.line(format!("{} = seqclock %clk", sig_ref("clk_seq")));
                *clk_seq = Some("clk_seq".to_string());
            }
            let clk = clk_seq.as_ref().expect("clk_seq just set above");
            w.line(format!(
                "reg {} : {} <= {} @posedge {}",
                sig_ref(&d.name),
                int_type(d.ty),
                sig_ref(&v.name),
                sig_ref(clk)
            ));
        }
        Operation::Send { channel, value } => {
            let ch = module.channel(*channel);
            let v = module.signal(*value);
            w.line(format!("{} = {}", sig_ref(&format!("{}_write_data", ch.name)), sig_ref(&v.name)));
            w.line(format!("{} = const i1 1", sig_ref(&format!("{}_write_valid", ch.name))));
        }
        Operation::Recv { channel, dest } => {
            let ch = module.channel(*channel);
            let d = module.signal(*dest);
            w.line(format!("{} = {}", sig_ref(&d.name), sig_ref(&format!("{}_read_data", ch.name))));
            w.line(format!("{} = const i1 1", sig_ref(&format!("{}_read_ready", ch.name))));
        }
        Operation::Spawn { callee, .. } => {
            let child = &module.processes[callee.0 as usize];
            w.line(format!("// spawn {} stage={}", child.name, child.stage));
        }
        Operation::Print { segments } => {
            let (fmt, args) = build_print_format(module, segments);
            w.open_block("always @(posedge %clk)");
            if args.is_empty() {
                w.line(format!("fwrite 0x80000001, \"{fmt}\""));
            } else {
                w.line(format!("fwrite 0x80000001, \"{fmt}\", {}", args.join(", ")));
            }
            w.close_block();
        }
        Operation::Phi { .. } => {
            w.line("// phi (lowered by state machine)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwc_ir::{Module as IrModule, Signal, SignalType};

    fn two_signal_module(lty: SignalType, rty: SignalType) -> (IrModule, hwc_ir::SignalId, hwc_ir::SignalId, hwc_ir::SignalId) {
        let mut m = IrModule::new("m", None);
        let l = m.add_signal(Signal::wire("l", lty, None)).unwrap();
        let r = m.add_signal(Signal::wire("r", rty, None)).unwrap();
        let d = m.add_signal(Signal::wire("d", lty.promote(&rty), None)).unwrap();
        (m, l, r, d)
    }

    #[test]
    fn bin_emits_one_mnemonic_line() {
        let (m, l, r, d) = two_signal_module(SignalType::new(8, false), SignalType::new(8, false));
        let mut w = TextWriter::new();
        let mut scope = NameScope::new();
        let mut clk = None;
        emit_operation(&mut w, &m, &Operation::Bin { dest: d, op: ArithOp::Add, left: l, right: r }, &mut scope, &mut clk);
        assert_eq!(w.finish(), "%d = add i8 %l, %r\n");
    }

    #[test]
    fn assign_casts_the_clock_exactly_once_per_process() {
        let mut m = IrModule::new("m", None);
        let v = m.add_signal(Signal::wire("v", SignalType::new(8, false), None)).unwrap();
        let d1 = m.add_signal(Signal::register("d1", SignalType::new(8, false), None)).unwrap();
        let d2 = m.add_signal(Signal::register("d2", SignalType::new(8, false), None)).unwrap();
        let mut w = TextWriter::new();
        let mut scope = NameScope::new();
        let mut clk = None;
        emit_operation(&mut w, &m, &Operation::Assign { dest: d1, value: v }, &mut scope, &mut clk);
        emit_operation(&mut w, &m, &Operation::Assign { dest: d2, value: v }, &mut scope, &mut clk);
        let text = w.finish();
        assert_eq!(text.matches("seqclock").count(), 1);
        assert_eq!(text.matches("@posedge %clk_seq").count(), 2);
    }

    #[test]
    fn print_wraps_in_a_posedge_always_block_and_escapes_percent() {
        let mut m = IrModule::new("m", None);
        let v = m.add_signal(Signal::wire("v", SignalType::new(8, false), None)).unwrap();
        let mut w = TextWriter::new();
        let mut scope = NameScope::new();
        let mut clk = None;
        let segments = vec![
            PrintSegment::Literal("100% done: ".to_string()),
            PrintSegment::Value { signal: v, verb: PrintVerb::Dec },
        ];
        emit_operation(&mut w, &m, &Operation::Print { segments }, &mut scope, &mut clk);
        let text = w.finish();
        assert!(text.contains("always @(posedge %clk) {"));
        assert!(text.contains("100%% done: %d"));
        assert!(text.contains("0x80000001"));
        assert!(text.contains("%v"));
    }
}
