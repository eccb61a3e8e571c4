//! Signal types: width-in-bits plus signedness, and the handful of
//! operations the width inference pass needs on them (spec §3, "Signal
//! type operations").

use hwc_ssa::BinOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalType {
    pub width: u32,
    pub signed: bool,
}

impl SignalType {
    pub const fn new(width: u32, signed: bool) -> Self {
        Self { width, signed }
    }

    pub const fn unknown() -> Self {
        Self {
            width: 0,
            signed: false,
        }
    }

    pub const fn bit() -> Self {
        Self {
            width: 1,
            signed: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.width == 0
    }

    /// Widest width, signed if either operand is (spec §3: "promote (max
    /// width, OR of signedness)").
    pub fn promote(&self, other: &Self) -> Self {
        Self {
            width: self.width.max(other.width),
            signed: self.signed || other.signed,
        }
    }

    /// Result type for a binary op: `promote` for everything except
    /// shifts, which preserve the left operand's type untouched (spec
    /// §3).
    pub fn result_for_binop(&self, other: &Self, op: BinOp) -> Self {
        match op {
            BinOp::Arith(hwc_ssa::ArithOp::Shl)
            | BinOp::Arith(hwc_ssa::ArithOp::ShrUnsigned)
            | BinOp::Arith(hwc_ssa::ArithOp::ShrSigned) => *self,
            _ => self.promote(other),
        }
    }

    /// True when `self` (the source) can be assigned into a signal of
    /// type `target` without truncation.
    pub fn fits_within(&self, target: &Self) -> bool {
        target.width >= self.width
    }

    pub fn signed_compatible(&self, other: &Self) -> bool {
        self.signed == other.signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwc_ssa::ArithOp;

    #[test]
    fn promote_takes_max_width_and_ors_signedness() {
        let a = SignalType::new(8, true);
        let b = SignalType::new(16, false);
        let p = a.promote(&b);
        assert_eq!(p, SignalType::new(16, true));
    }

    #[test]
    fn shift_result_preserves_left_operand_type() {
        let data = SignalType::new(32, true);
        let amount = SignalType::new(8, false);
        let result = data.result_for_binop(&amount, BinOp::Arith(ArithOp::Shl));
        assert_eq!(result, data);
    }

    #[test]
    fn fits_within_requires_target_at_least_as_wide() {
        assert!(SignalType::new(8, false).fits_within(&SignalType::new(16, false)));
        assert!(!SignalType::new(16, false).fits_within(&SignalType::new(8, false)));
    }
}
