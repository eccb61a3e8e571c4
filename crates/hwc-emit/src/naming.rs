//! Name formatting and the per-scope fresh-name counter (spec §4.5.5:
//! "fresh SSA names are allocated from a monotonically increasing counter
//! per emission scope").

use hwc_ir::SignalType;

pub fn int_type(ty: SignalType) -> String {
    format!("i{}", ty.width)
}

pub fn sig_ref(name: &str) -> String {
    format!("%{name}")
}

pub fn mod_ref(name: &str) -> String {
    format!("@{name}")
}

/// Sanitizes a name for use inside a generated FIFO extern module name:
/// non-alphanumeric characters become `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// A monotonically increasing counter scoped to one process's emission,
/// used to name Convert-lowering temporaries.
#[derive(Debug, Default)]
pub struct NameScope {
    next: u32,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, hint: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("__{hint}{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_names_increase_monotonically_within_one_scope() {
        let mut scope = NameScope::new();
        assert_eq!(scope.fresh("t"), "__t0");
        assert_eq!(scope.fresh("t"), "__t1");
    }

    #[test]
    fn sanitize_replaces_non_alphanumeric_with_underscore() {
        assert_eq!(sanitize("i8"), "i8");
        assert_eq!(sanitize("a b"), "a_b");
    }
}
