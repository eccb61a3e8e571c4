//! `Convert` lowering (spec §4.5.3): bitcast when widths match, sign- or
//! zero-extension when the destination is wider (per the *source*'s
//! signedness), truncation when it is narrower.

use crate::naming::{int_type, sig_ref, NameScope};
use hwc_ir::SignalType;

pub fn lower(
    dest_name: &str,
    dest_ty: SignalType,
    value_name: &str,
    value_ty: SignalType,
    scope: &mut NameScope,
) -> Vec<String> {
    let dest = sig_ref(dest_name);
    let value = sig_ref(value_name);

    if dest_ty.width == value_ty.width {
        return vec![format!(
            "{dest} = bitcast {} {value} to {}",
            int_type(value_ty),
            int_type(dest_ty)
        )];
    }

    if dest_ty.width > value_ty.width {
        let pad_width = dest_ty.width - value_ty.width;
        if value_ty.signed {
            let msb = scope.fresh("msb");
            let rep = scope.fresh("sext");
            return vec![
                format!("{} = extract-msb {} {value}", sig_ref(&msb), int_type(value_ty)),
                format!("{} = replicate i1 {} x{pad_width}", sig_ref(&rep), sig_ref(&msb)),
                format!("{dest} = concat {}, {value} to {}", sig_ref(&rep), int_type(dest_ty)),
            ];
        }
        let zpad = scope.fresh("zpad");
        return vec![
            format!("{} = const i{pad_width} 0", sig_ref(&zpad)),
            format!("{dest} = concat {}, {value} to {}", sig_ref(&zpad), int_type(dest_ty)),
        ];
    }

    vec![format!(
        "{dest} = trunc {} {value} to {}",
        int_type(value_ty),
        int_type(dest_ty)
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_width_converts_to_a_bitcast() {
        let mut scope = NameScope::new();
        let lines = lower("d", SignalType::new(8, true), "v", SignalType::new(8, false), &mut scope);
        assert_eq!(lines, vec!["%d = bitcast i8 %v to i8"]);
    }

    #[test]
    fn widening_a_signed_source_sign_extends() {
        let mut scope = NameScope::new();
        let lines = lower("d", SignalType::new(16, true), "v", SignalType::new(8, true), &mut scope);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("extract-msb"));
        assert!(lines[1].contains("replicate"));
        assert!(lines[2].starts_with("%d = concat"));
    }

    #[test]
    fn widening_an_unsigned_source_zero_pads() {
        let mut scope = NameScope::new();
        let lines = lower("d", SignalType::new(16, false), "v", SignalType::new(8, false), &mut scope);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("const i8 0"));
        assert!(lines[1].starts_with("%d = concat"));
    }

    #[test]
    fn narrowing_truncates() {
        let mut scope = NameScope::new();
        let lines = lower("d", SignalType::new(8, false), "v", SignalType::new(16, false), &mut scope);
        assert_eq!(lines, vec!["%d = trunc i16 %v to i8"]);
    }
}
