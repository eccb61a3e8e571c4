//! Tarjan's strongly-connected-components algorithm over one function's
//! basic-block graph, used to find the "in a loop" block set (spec §4.2
//! rule 2).

use hwc_ssa::{BlockIdx, Function};
use std::collections::HashSet;

struct Tarjan<'a> {
    func: &'a Function,
    index_counter: u32,
    index: Vec<Option<u32>>,
    lowlink: Vec<u32>,
    on_stack: Vec<bool>,
    stack: Vec<u32>,
    sccs: Vec<Vec<u32>>,
}

impl<'a> Tarjan<'a> {
    fn new(func: &'a Function) -> Self {
        let n = func.blocks.len();
        Self {
            func,
            index_counter: 0,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            sccs: Vec::new(),
        }
    }

    fn successors(&self, v: u32) -> Vec<u32> {
        self.func.block(BlockIdx(v)).successors()
    }

    fn strongconnect(&mut self, v: u32) {
        self.index[v as usize] = Some(self.index_counter);
        self.lowlink[v as usize] = self.index_counter;
        self.index_counter += 1;
        self.stack.push(v);
        self.on_stack[v as usize] = true;

        for w in self.successors(v) {
            if self.index[w as usize].is_none() {
                self.strongconnect(w);
                self.lowlink[v as usize] = self.lowlink[v as usize].min(self.lowlink[w as usize]);
            } else if self.on_stack[w as usize] {
                self.lowlink[v as usize] = self.lowlink[v as usize].min(self.index[w as usize].unwrap());
            }
        }

        if self.lowlink[v as usize] == self.index[v as usize].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().unwrap();
                self.on_stack[w as usize] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.sccs.push(component);
        }
    }

    fn run(mut self) -> Vec<Vec<u32>> {
        for v in 0..self.func.blocks.len() as u32 {
            if self.index[v as usize].is_none() {
                self.strongconnect(v);
            }
        }
        self.sccs
    }
}

trait BlockExt {
    fn successors(&self) -> Vec<u32>;
}

impl BlockExt for hwc_ssa::Block {
    fn successors(&self) -> Vec<u32> {
        match &self.term {
            hwc_ssa::Term::Branch {
                then_blk, else_blk, ..
            } => vec![then_blk.0, else_blk.0],
            hwc_ssa::Term::Jump(b) => vec![b.0],
            hwc_ssa::Term::Return => Vec::new(),
        }
    }
}

/// Returns the set of block indices that participate in a loop: any
/// block in a strongly-connected component of size >= 2, or with a
/// self-edge (spec §4.2 rule 2 / §4.2 "Algorithms").
pub fn loop_blocks(func: &Function) -> HashSet<BlockIdx> {
    let sccs = Tarjan::new(func).run();
    let mut result = HashSet::new();
    for component in &sccs {
        let in_loop = component.len() > 1
            || component
                .first()
                .map(|&v| func.block(BlockIdx(v)).successors().contains(&v))
                .unwrap_or(false);
        if in_loop {
            for &v in component {
                result.insert(BlockIdx(v));
            }
        }
    }
    result
}
