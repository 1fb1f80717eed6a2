//! Open list ordered by the configured strategy.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use planforge_config::SearchStrategy;

use super::node::SearchNode;

/// Heap entry for a node in the arena.
///
/// `seq` is the generation order; it breaks every remaining tie so the
/// expansion order never depends on heap internals.
#[derive(Debug, Clone, Copy)]
struct PriorityNode {
    index: usize,
    h: u64,
    now: f64,
    depth: u64,
    seq: u64,
    strategy: SearchStrategy,
}

impl Eq for PriorityNode {}

impl PartialEq for PriorityNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for PriorityNode {
    /// Greater pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.strategy {
            SearchStrategy::BestFirst => {
                // Lower estimate, then earlier clock, then older node
                other
                    .h
                    .cmp(&self.h)
                    .then(other.now.total_cmp(&self.now))
                    .then(other.seq.cmp(&self.seq))
            }
            SearchStrategy::BreadthFirst => {
                other.depth.cmp(&self.depth).then(other.seq.cmp(&self.seq))
            }
            SearchStrategy::DepthFirst => {
                // Deeper first, newest sibling first
                self.depth.cmp(&other.depth).then(self.seq.cmp(&other.seq))
            }
        }
    }
}

impl PartialOrd for PriorityNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub(crate) struct Frontier {
    heap: BinaryHeap<PriorityNode>,
    strategy: SearchStrategy,
    seq: u64,
}

impl Frontier {
    pub fn new(strategy: SearchStrategy) -> Self {
        Self {
            heap: BinaryHeap::new(),
            strategy,
            seq: 0,
        }
    }

    pub fn push(&mut self, index: usize, node: &SearchNode) {
        self.heap.push(PriorityNode {
            index,
            h: node.h,
            now: node.now,
            depth: node.depth,
            seq: self.seq,
            strategy: self.strategy,
        });
        self.seq += 1;
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|p| p.index)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
