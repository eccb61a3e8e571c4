//! Format-string lowering for `print`-flavored calls (spec §4.3.1):
//! `%d`/`%v`/`%x`/`%X`/`%b`/`%t` each consume one argument signal, `%%` is a
//! literal percent, and anything else — or a non-constant format string,
//! or an argument-count mismatch — drops the whole print with a warning
//! rather than failing the build.

use super::FnCtx;
use hwc_diag::{Severity, Sink};
use hwc_ir::{Operation, PrintSegment, PrintVerb};
use hwc_ssa::{Position, PrintCall};

enum Piece {
    Literal(String),
    Verb(PrintVerb),
}

pub(crate) fn lower_print(sink: &mut Sink, fctx: &FnCtx, call: &PrintCall, pos: Option<Position>) -> Option<Operation> {
    if !call.format_is_const {
        sink.report(Severity::Warning, pos, "print format string is not a compile-time constant, dropping print");
        return None;
    }

    let pieces = match parse_format(&call.format) {
        Some(p) => p,
        None => {
            sink.report(Severity::Warning, pos, "print format string contains an unsupported verb, dropping print");
            return None;
        }
    };

    let verb_count = pieces.iter().filter(|p| matches!(p, Piece::Verb(_))).count();
    if verb_count != call.args.len() {
        sink.report(
            Severity::Warning,
            pos,
            format!(
                "print format expects {verb_count} argument(s) but {} were supplied, dropping print",
                call.args.len()
            ),
        );
        return None;
    }

    let mut segments = Vec::with_capacity(pieces.len());
    let mut args = call.args.iter();
    for piece in pieces {
        match piece {
            Piece::Literal(s) => segments.push(PrintSegment::Literal(s)),
            Piece::Verb(verb) => {
                let arg = args.next().expect("verb/arg counts already checked equal");
                match fctx.signal(*arg) {
                    Some(signal) => segments.push(PrintSegment::Value { signal, verb }),
                    None => {
                        sink.report(Severity::Warning, pos.clone(), "print argument is unmapped, dropping print");
                        return None;
                    }
                }
            }
        }
    }

    Some(Operation::Print { segments })
}

/// Parses a format string into literal/verb pieces, returning `None` if
/// it contains a verb this dialect doesn't support.
fn parse_format(format: &str) -> Option<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        let Some(&verb) = chars.peek() else {
            return None;
        };
        chars.next();
        match verb {
            '%' => literal.push('%'),
            'd' | 'v' | 'x' | 'X' | 'b' | 't' => {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                let verb = match verb {
                    'd' | 'v' | 't' => PrintVerb::Dec,
                    'x' | 'X' => PrintVerb::Hex,
                    'b' => PrintVerb::Bin,
                    _ => unreachable!(),
                };
                pieces.push(Piece::Verb(verb));
            }
            _ => return None,
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Some(pieces)
}
