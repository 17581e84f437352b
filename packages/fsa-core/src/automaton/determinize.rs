//! Subset construction
//!
//! Determinization walks power-set states as they are discovered. Each
//! subset is interned through [`Interner`] into a flat member arena, so a
//! subset's id doubles as the output state id and revisiting an already
//! known subset costs one hash probe.
//!
//! The transitions leaving a subset are produced by a multiway merge: one
//! cursor per member state, ordered by current transition label in a
//! small binary heap. Draining the heap yields the subset's outgoing
//! labels in ascending order, with all target states for one label pooled
//! before the next label starts. The output is therefore built already
//! sorted and only needs its row pointers rebuilt.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::fnv;
use crate::interner::{InternStore, Interner};
use crate::sequence::IntSeq;

use super::{Automaton, NO};

/// Interned subsets of source states
///
/// `set_first_member[id]` points into `members`; a subset's members are
/// the run up to the next subset's start, kept sorted so slice equality
/// is set equality.
#[derive(Debug, Default)]
struct SubsetPool {
    set_first_member: IntSeq,
    members: IntSeq,
}

impl SubsetPool {
    fn num_sets(&self) -> i32 {
        self.set_first_member.len() as i32
    }

    fn member_run(&self, set: i32) -> &[i32] {
        let start = self.set_first_member[set as usize] as usize;
        let end = if set + 1 < self.num_sets() {
            self.set_first_member[(set + 1) as usize] as usize
        } else {
            self.members.len()
        };
        &self.members.as_slice()[start..end]
    }

    fn clear(&mut self) {
        self.set_first_member.clear();
        self.members.clear();
    }
}

impl InternStore for SubsetPool {
    type Key = [i32];

    fn hash_key(&self, key: &[i32]) -> u64 {
        fnv::hash_ints(key)
    }

    fn hash_entry(&self, id: i32) -> u64 {
        fnv::hash_ints(self.member_run(id))
    }

    fn matches(&self, key: &[i32], id: i32) -> bool {
        key == self.member_run(id)
    }

    fn materialize(&mut self, key: &[i32]) -> i32 {
        let id = self.num_sets();
        self.set_first_member.push(self.members.len() as i32);
        self.members.extend_from_slice(key);
        id
    }
}

/// Reusable subset-construction worker
///
/// Holds the subset arena, intern table, and merge heap across runs.
/// Expects a sorted source automaton. One construction per
/// [`reset`](Self::reset); the result automaton passed to
/// [`determinize_into`](Self::determinize_into) must be empty.
pub struct Determinizer<'a> {
    source: &'a Automaton,
    pool: SubsetPool,
    table: Interner,
    scratch: FxHashSet<i32>,
    subset: IntSeq,
    heap: IntSeq,
    next_set: i32,
}

impl<'a> Determinizer<'a> {
    pub fn new(source: &'a Automaton) -> Self {
        Determinizer {
            source,
            pool: SubsetPool::default(),
            table: Interner::new(),
            scratch: FxHashSet::default(),
            subset: IntSeq::new(),
            heap: IntSeq::new(),
            next_set: 0,
        }
    }

    /// Forget all discovered subsets, keeping allocated capacity
    pub fn reset(&mut self) {
        self.pool.clear();
        self.table.reset();
        self.scratch.clear();
        self.subset.clear();
        self.heap.clear();
        self.next_set = 0;
    }

    /// Run the construction into a fresh automaton
    pub fn determinize(&mut self) -> Automaton {
        let mut result = Automaton::new();
        self.determinize_into(&mut result);
        result
    }

    /// Run the construction into `result`
    ///
    /// The output is deterministic, sorted, and reaches only subsets
    /// discovered from the initial one. With no initial states the output
    /// is the single empty subset accepting nothing.
    pub fn determinize_into(&mut self, result: &mut Automaton) {
        let source = self.source;
        for &q in &source.initial_states {
            self.scratch.insert(q);
        }
        let initial = self.intern_scratch();
        result.add_state(initial);
        result.add_initial_state(initial);

        while self.next_set < self.pool.num_sets() {
            let set = self.next_set;
            self.next_set += 1;
            result.add_state(set);
            if self.contains_final_state(set) {
                result.set_state_finality(set, 1);
            }
            self.enqueue_cursors(set);

            // Drain the merge in label order; all cursors on one label
            // pool their targets before the subset is flushed.
            let mut current_label = NO;
            while !self.heap.is_empty() {
                let tr = self.heap[0];
                let label = source.trans_label[tr as usize];
                if label != current_label {
                    if current_label != NO {
                        let target = self.intern_scratch();
                        result.add_transition(set, current_label, target);
                    }
                    current_label = label;
                }
                self.scratch.insert(source.trans_to[tr as usize]);
                self.advance(tr);
            }
            if current_label != NO {
                let target = self.intern_scratch();
                result.add_transition(set, current_label, target);
            }
        }

        result.init_state_offsets();
        debug!(
            "determinized {} states / {} transitions into {} subset states",
            source.num_states(),
            source.num_transitions(),
            result.num_states()
        );
    }

    /// Intern the pooled target states as a subset id, draining the pool
    fn intern_scratch(&mut self) -> i32 {
        self.subset.clear();
        for &q in &self.scratch {
            self.subset.push(q);
        }
        self.scratch.clear();
        self.subset.as_mut_slice().sort_unstable();
        self.table.add(&mut self.pool, self.subset.as_slice())
    }

    fn contains_final_state(&self, set: i32) -> bool {
        self.pool
            .member_run(set)
            .iter()
            .any(|&q| self.source.state_finality(q) != 0)
    }

    /// Push one transition cursor per member with outgoing transitions
    fn enqueue_cursors(&mut self, set: i32) {
        let source = self.source;
        for &member in self.pool.member_run(set) {
            if source.state_transition_count(member) != 0 {
                heap_push(
                    source,
                    &mut self.heap,
                    source.state_first_trans[member as usize],
                );
            }
        }
    }

    /// Step the root cursor past `tr`, dropping it when its state's run
    /// is exhausted
    fn advance(&mut self, tr: i32) {
        let source = self.source;
        let from = source.trans_from[tr as usize];
        let run_end =
            source.state_first_trans[from as usize] + source.state_transition_count(from);
        if tr + 1 < run_end {
            self.heap[0] = tr + 1;
            heap_sink(source, &mut self.heap);
        } else {
            let last = self.heap.len() - 1;
            let moved = self.heap[last];
            self.heap.truncate(last);
            if !self.heap.is_empty() {
                self.heap[0] = moved;
                heap_sink(source, &mut self.heap);
            }
        }
    }
}

/// Heap order: the cursor on the smaller current label comes first
///
/// Ties are left unordered; cursors on the same label pool into the same
/// subset no matter which pops first.
fn cursor_precedes(source: &Automaton, t1: i32, t2: i32) -> bool {
    source.trans_label[t1 as usize] < source.trans_label[t2 as usize]
}

fn heap_push(source: &Automaton, heap: &mut IntSeq, tr: i32) {
    heap.push(tr);
    let mut child = heap.len() - 1;
    while child > 0 {
        let parent = (child - 1) / 2;
        if !cursor_precedes(source, heap[child], heap[parent]) {
            break;
        }
        let tmp = heap[parent];
        heap[parent] = heap[child];
        heap[child] = tmp;
        child = parent;
    }
}

fn heap_sink(source: &Automaton, heap: &mut IntSeq) {
    let len = heap.len();
    let mut parent = 0;
    loop {
        let left = 2 * parent + 1;
        if left >= len {
            break;
        }
        let mut smallest = parent;
        if cursor_precedes(source, heap[left], heap[smallest]) {
            smallest = left;
        }
        let right = left + 1;
        if right < len && cursor_precedes(source, heap[right], heap[smallest]) {
            smallest = right;
        }
        if smallest == parent {
            break;
        }
        let tmp = heap[parent];
        heap[parent] = heap[smallest];
        heap[smallest] = tmp;
        parent = smallest;
    }
}
