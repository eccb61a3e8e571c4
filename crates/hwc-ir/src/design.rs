use crate::module::Module;

/// A design: an ordered sequence of modules plus a distinguished
/// top-level module (spec §3, "Design"). The current pipeline always
/// produces a single-module design (spec §4.3 contract), but the type
/// keeps the door open for a multi-module design (e.g. one day splitting
/// library modules out) without an API break.
#[derive(Debug, Clone)]
pub struct Design {
    pub modules: Vec<Module>,
    top: usize,
}

impl Design {
    pub fn new(top_module: Module) -> Self {
        Self {
            modules: vec![top_module],
            top: 0,
        }
    }

    pub fn top(&self) -> &Module {
        &self.modules[self.top]
    }

    pub fn top_mut(&mut self) -> &mut Module {
        &mut self.modules[self.top]
    }
}
