//! Automaton store over flat integer arenas
//!
//! States and transitions live in parallel [`IntSeq`] columns indexed by
//! dense `i32` ids; there are no node objects or pointer graphs:
//! - `trans_from` / `trans_label` / `trans_to`: one transition per position
//! - `state_first_trans`: per-state row pointer into the transition arrays
//! - `state_finality`: per-state finality weight (0 = non-final)
//! - `initial_states`: the initial-state set, ordered
//!
//! [`sort`](Automaton::sort) establishes the `(from, label, to)` total
//! order and rebuilds the row pointers, after which each state's
//! transitions form one contiguous label-sorted run (compressed sparse
//! row form). Lookup by label is then a binary search inside the run, and
//! out-degree is one subtraction of adjacent row pointers.
//!
//! Operations that read the row pointers expect a sorted automaton, and
//! [`delta`](Automaton::delta) additionally expects a deterministic one.
//! These are documented preconditions, not checked errors; violating them
//! yields wrong answers, not panics with meaning.
//!
//! # References
//! - Hopcroft, J. E., Motwani, R., Ullman, J. D.
//!   "Introduction to Automata Theory, Languages, and Computation"

use fixedbitset::FixedBitSet;
use std::io::{Read, Write};
use tracing::debug;

use crate::error::Result;
use crate::sequence::IntSeq;

mod determinize;
mod minimize;

pub use determinize::Determinizer;
pub use minimize::Minimizer;

/// Sentinel for "no transition" and uninitialized row pointers
///
/// Distinct from every valid id; state and transition ids are dense
/// non-negative `i32`s.
pub const NO: i32 = i32::MIN;

/// Finite-state automaton in struct-of-arrays form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Automaton {
    pub(crate) initial_states: IntSeq,
    pub(crate) trans_from: IntSeq,
    pub(crate) trans_label: IntSeq,
    pub(crate) trans_to: IntSeq,
    pub(crate) state_first_trans: IntSeq,
    pub(crate) state_finality: IntSeq,
}

impl Automaton {
    /// Create an empty automaton
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states
    #[inline]
    pub fn num_states(&self) -> i32 {
        self.state_first_trans.len() as i32
    }

    /// Number of transitions
    #[inline]
    pub fn num_transitions(&self) -> i32 {
        self.trans_to.len() as i32
    }

    /// Number of states with finality 1
    pub fn num_final_states(&self) -> i32 {
        self.state_finality.iter().filter(|&&f| f == 1).count() as i32
    }

    /// Finality weight of `state`
    #[inline]
    pub fn state_finality(&self, state: i32) -> i32 {
        self.state_finality[state as usize]
    }

    /// Set the finality weight of an existing `state`
    #[inline]
    pub fn set_state_finality(&mut self, state: i32, finality: i32) {
        self.state_finality[state as usize] = finality;
    }

    /// The initial-state set, in insertion order
    #[inline]
    pub fn initial_states(&self) -> &IntSeq {
        &self.initial_states
    }

    /// Out-degree of `state`
    ///
    /// Expects a sorted automaton.
    pub fn state_transition_count(&self, state: i32) -> i32 {
        let next = if state + 1 < self.num_states() {
            self.state_first_trans[(state + 1) as usize]
        } else {
            self.num_transitions()
        };
        next - self.state_first_trans[state as usize]
    }

    /// Grow the state range to cover `state`
    ///
    /// New states have no transitions and finality 0. Existing states are
    /// untouched.
    pub fn add_state(&mut self, state: i32) {
        for _ in self.num_states()..=state {
            self.state_first_trans.push(NO);
            self.state_finality.push(0);
        }
    }

    /// Append `state` to the initial-state set
    ///
    /// Does not grow the state range by itself.
    pub fn add_initial_state(&mut self, state: i32) {
        self.initial_states.push(state);
    }

    /// Append the transition `(from, label, to)`, growing the state range
    /// over both endpoints
    pub fn add_transition(&mut self, from: i32, label: i32, to: i32) {
        let num_transitions = self.num_transitions();
        self.add_state(from.max(to));
        self.trans_from.push(from);
        self.trans_label.push(label);
        self.trans_to.push(to);
        if self.state_first_trans[from as usize] == NO {
            self.state_first_trans[from as usize] = num_transitions;
        }
    }

    /// Sort transitions into `(from, label, to)` order and rebuild the
    /// row pointers
    ///
    /// The permutation is applied in place by following its cycles, so the
    /// three columns are rearranged without secondary copies of
    /// themselves.
    pub fn sort(&mut self) {
        let num_transitions = self.trans_to.len();
        let mut order: Vec<i32> = (0..num_transitions as i32).collect();
        order.sort_unstable_by_key(|&t| {
            let t = t as usize;
            (self.trans_from[t], self.trans_label[t], self.trans_to[t])
        });
        // Cycle-follow the permutation; NO marks slots already final.
        for i in 0..num_transitions {
            if order[i] == NO {
                continue;
            }
            let from = self.trans_from[i];
            let label = self.trans_label[i];
            let to = self.trans_to[i];
            let mut j = i;
            while order[j] != i as i32 {
                let next = order[j] as usize;
                self.trans_from[j] = self.trans_from[next];
                self.trans_label[j] = self.trans_label[next];
                self.trans_to[j] = self.trans_to[next];
                order[j] = NO;
                j = next;
            }
            self.trans_from[j] = from;
            self.trans_label[j] = label;
            self.trans_to[j] = to;
            order[j] = NO;
        }
        self.init_state_offsets();
        debug!(
            "sorted {} transitions across {} states",
            num_transitions,
            self.num_states()
        );
    }

    /// Rebuild the per-state row pointers from already-ordered transitions
    ///
    /// One linear pass: states before the first transition source point at
    /// 0, states in source gaps point at the next transition, trailing
    /// states point past the end.
    pub fn init_state_offsets(&mut self) {
        let num_states = self.num_states();
        let num_transitions = self.num_transitions();
        if num_transitions == 0 {
            for s in 0..num_states {
                self.state_first_trans[s as usize] = 0;
            }
            return;
        }
        let mut state = self.trans_from[0];
        for s in 0..=state {
            self.state_first_trans[s as usize] = 0;
        }
        for i in 1..num_transitions {
            let prev_state = self.trans_from[(i - 1) as usize];
            state = self.trans_from[i as usize];
            if prev_state != state {
                for s in (prev_state + 1)..=state {
                    self.state_first_trans[s as usize] = i;
                }
            }
        }
        for s in (state + 1)..num_states {
            self.state_first_trans[s as usize] = num_transitions;
        }
    }

    /// Transition id of `(state, label)`, or [`NO`] when absent
    ///
    /// Expects a sorted deterministic automaton.
    pub fn transition(&self, state: i32, label: i32) -> i32 {
        let count = self.state_transition_count(state);
        if count == 0 {
            return NO;
        }
        let first = self.state_first_trans[state as usize] as usize;
        let run = &self.trans_label.as_slice()[first..first + count as usize];
        match run.binary_search(&label) {
            Ok(position) => (first + position) as i32,
            Err(_) => NO,
        }
    }

    /// Target of the `(state, label)` transition, or [`NO`] when absent
    ///
    /// Expects a sorted deterministic automaton.
    pub fn delta(&self, state: i32, label: i32) -> i32 {
        let tr = self.transition(state, label);
        if tr != NO {
            self.trans_to[tr as usize]
        } else {
            NO
        }
    }

    /// Run `word` from the first initial state
    ///
    /// Returns the finality weight of the reached state, or 0 when a
    /// transition is missing or there is no initial state.
    ///
    /// Expects a sorted deterministic automaton; only the first initial
    /// state is used.
    pub fn accepts(&self, word: &[i32]) -> i32 {
        if self.initial_states.is_empty() {
            return 0;
        }
        let mut state = self.initial_states[0];
        for &label in word {
            let next = self.delta(state, label);
            if next == NO {
                return 0;
            }
            state = next;
        }
        self.state_finality[state as usize]
    }

    /// Number of states reachable from the initial states
    ///
    /// Expects a sorted automaton.
    pub fn num_reachable_states(&self) -> i32 {
        let mut visited = FixedBitSet::with_capacity(self.num_states() as usize);
        let mut stack: Vec<i32> = self.initial_states.as_slice().to_vec();
        self.dfs(&mut stack, &mut visited);
        visited.count_ones(..) as i32
    }

    fn dfs(&self, stack: &mut Vec<i32>, visited: &mut FixedBitSet) {
        while let Some(top) = stack.pop() {
            visited.insert(top as usize);
            let first = self.state_first_trans[top as usize];
            for i in 0..self.state_transition_count(top) {
                let adjacent = self.trans_to[(first + i) as usize];
                if !visited.contains(adjacent as usize) {
                    stack.push(adjacent);
                }
            }
        }
    }

    /// Number of states from which some final state is reachable
    ///
    /// Expects a sorted automaton. Runs one forward search per state, so
    /// this is O(states * transitions) and meant for offline statistics.
    pub fn num_co_reachable_states(&self) -> i32 {
        let num_states = self.num_states();
        let mut visited = FixedBitSet::with_capacity(num_states as usize);
        let mut stack = Vec::new();
        let mut count = 0;
        for state in 0..num_states {
            visited.clear();
            stack.clear();
            if self.co_reachable(state, &mut stack, &mut visited) {
                count += 1;
            }
        }
        count
    }

    fn co_reachable(&self, state: i32, stack: &mut Vec<i32>, visited: &mut FixedBitSet) -> bool {
        stack.push(state);
        while let Some(top) = stack.pop() {
            visited.insert(top as usize);
            if self.state_finality[top as usize] == 1 {
                return true;
            }
            let first = self.state_first_trans[top as usize];
            for i in 0..self.state_transition_count(top) {
                let adjacent = self.trans_to[(first + i) as usize];
                if !visited.contains(adjacent as usize) {
                    stack.push(adjacent);
                }
            }
        }
        false
    }

    /// Approximate cycle check over the part reachable from the initial
    /// states
    ///
    /// Expects a sorted automaton. The search marks states visited when
    /// popped and reports a cycle as soon as a scanned edge targets an
    /// already-visited state. On graphs where every reachable state has a
    /// single in-edge this is exact; converging paths (two routes into the
    /// same state) are reported as cycles, and cycles not reachable from
    /// the initial states are missed.
    pub fn contains_cycle(&self) -> bool {
        let mut visited = FixedBitSet::with_capacity(self.num_states() as usize);
        let mut stack: Vec<i32> = self.initial_states.as_slice().to_vec();
        while let Some(top) = stack.pop() {
            visited.insert(top as usize);
            let first = self.state_first_trans[top as usize];
            for i in 0..self.state_transition_count(top) {
                let adjacent = self.trans_to[(first + i) as usize];
                if visited.contains(adjacent as usize) {
                    return true;
                }
                stack.push(adjacent);
            }
        }
        false
    }

    /// Structural equality up to state renaming
    ///
    /// Expects sorted deterministic automata. Fails fast on differing
    /// state, transition, or initial counts, then grows a bijection over a
    /// synchronized breadth-first traversal from the first initial states,
    /// comparing finality, out-degree, and label runs position by
    /// position.
    pub fn isomorphic(a1: &Automaton, a2: &Automaton) -> bool {
        let num_states = a1.num_states();
        if num_states != a2.num_states()
            || a1.num_transitions() != a2.num_transitions()
            || a1.initial_states.len() != a2.initial_states.len()
        {
            return false;
        }
        if a1.initial_states.is_empty() {
            return true;
        }
        let mut map_forward = vec![NO; num_states as usize];
        let mut map_backward = vec![NO; num_states as usize];
        let mut visited = FixedBitSet::with_capacity(num_states as usize);
        let mut q1 = a1.initial_states[0];
        let mut q2 = a2.initial_states[0];
        map_forward[q1 as usize] = q2;
        map_backward[q2 as usize] = q1;
        let mut queue = IntSeq::with_capacity(num_states as usize, -1);
        queue.push(q1);
        visited.insert(q1 as usize);
        let mut head = 0;
        while head != queue.len() {
            q1 = queue[head];
            head += 1;
            q2 = map_forward[q1 as usize];
            if q2 == NO || a1.state_finality(q1) != a2.state_finality(q2) {
                return false;
            }
            let count = a1.state_transition_count(q1);
            if a2.state_transition_count(q2) != count {
                return false;
            }
            for i in 0..count {
                let tr1 = (a1.state_first_trans[q1 as usize] + i) as usize;
                let tr2 = (a2.state_first_trans[q2 as usize] + i) as usize;
                if a1.trans_label[tr1] != a2.trans_label[tr2] {
                    return false;
                }
                let to1 = a1.trans_to[tr1];
                let to2 = a2.trans_to[tr2];
                let mapped1 = map_forward[to1 as usize];
                let mapped2 = map_backward[to2 as usize];
                if (mapped1 == NO) != (mapped2 == NO) {
                    return false;
                }
                if mapped1 == NO {
                    map_forward[to1 as usize] = to2;
                    map_backward[to2 as usize] = to1;
                } else if mapped1 != to2 || mapped2 != to1 {
                    return false;
                }
                if !visited.contains(to1 as usize) {
                    queue.push(to1);
                    visited.insert(to1 as usize);
                }
            }
        }
        true
    }

    /// Determinize through a fresh [`Determinizer`]
    ///
    /// Expects a sorted automaton.
    pub fn determinize(&self) -> Automaton {
        Determinizer::new(self).determinize()
    }

    /// Minimize through a fresh [`Minimizer`]
    ///
    /// Expects a sorted, trimmed, deterministic automaton.
    pub fn minimize(&self) -> Automaton {
        Minimizer::new(self).run()
    }

    /// Reversal: initial and final roles swap, every transition flips
    pub fn reverse(&self) -> Automaton {
        let mut result = Automaton::new();
        self.reverse_into(&mut result);
        result
    }

    /// Reversal into an existing empty automaton; the result is sorted
    pub fn reverse_into(&self, result: &mut Automaton) {
        let num_states = self.num_states();
        for q in 0..num_states {
            result.add_state(q);
            if self.state_finality[q as usize] != 0 {
                result.initial_states.push(q);
            }
        }
        for i in 0..self.initial_states.len() {
            result.set_state_finality(self.initial_states[i], 1);
        }
        for i in 0..self.num_transitions() as usize {
            result.add_transition(self.trans_to[i], self.trans_label[i], self.trans_from[i]);
        }
        result.sort();
    }

    /// Disjoint union of two automata
    ///
    /// States of `a2` are renumbered past `a1`'s range; the result keeps
    /// both initial sets and is sorted. The result generally has several
    /// initial states, so determinize before running words through it.
    pub fn union(a1: &Automaton, a2: &Automaton) -> Automaton {
        let mut result = Automaton::new();
        let a1_num_states = a1.num_states();
        for q1 in 0..a1_num_states {
            result.add_state(q1);
            result.set_state_finality(q1, a1.state_finality(q1));
        }
        result.initial_states.copy_from(&a1.initial_states);
        for t1 in 0..a1.num_transitions() as usize {
            result.add_transition(a1.trans_from[t1], a1.trans_label[t1], a1.trans_to[t1]);
        }
        let a2_num_states = a2.num_states();
        for q2 in 0..a2_num_states {
            result.add_state(a1_num_states + q2);
            result.set_state_finality(a1_num_states + q2, a2.state_finality(q2));
        }
        for t2 in 0..a2.num_transitions() as usize {
            result.add_transition(
                a1_num_states + a2.trans_from[t2],
                a2.trans_label[t2],
                a1_num_states + a2.trans_to[t2],
            );
        }
        for i in 0..a2.initial_states.len() {
            result.add_initial_state(a1_num_states + a2.initial_states[i]);
        }
        result.sort();
        result
    }

    /// Concatenation without epsilon transitions
    ///
    /// Every final state of `a1` receives a copy of the transitions
    /// leaving each initial state of `a2`; final states of `a1` keep their
    /// finality exactly when `a2` accepts the empty word. Expects `a2`
    /// sorted (its transition runs are read through the row pointers); the
    /// result is sorted.
    pub fn concat(a1: &Automaton, a2: &Automaton) -> Automaton {
        let a2_accepts_epsilon = a2.accepts_epsilon();

        let mut result = Automaton::new();
        let a1_num_states = a1.num_states();
        for q1 in 0..a1_num_states {
            result.add_state(q1);
            if a2_accepts_epsilon && a1.state_finality(q1) != 0 {
                result.set_state_finality(q1, a1.state_finality(q1));
            }
        }
        result.initial_states.copy_from(&a1.initial_states);
        for t1 in 0..a1.num_transitions() as usize {
            result.add_transition(a1.trans_from[t1], a1.trans_label[t1], a1.trans_to[t1]);
        }

        let a2_num_states = a2.num_states();
        for q2 in 0..a2_num_states {
            result.add_state(a1_num_states + q2);
            result.set_state_finality(a1_num_states + q2, a2.state_finality(q2));
        }
        for t2 in 0..a2.num_transitions() as usize {
            result.add_transition(
                a1_num_states + a2.trans_from[t2],
                a2.trans_label[t2],
                a1_num_states + a2.trans_to[t2],
            );
        }

        for q1 in 0..a1_num_states {
            if a1.state_finality(q1) != 0 {
                for i in 0..a2.initial_states.len() {
                    let i2 = a2.initial_states[i];
                    let first = a2.state_first_trans[i2 as usize];
                    for j in 0..a2.state_transition_count(i2) {
                        let tr = (first + j) as usize;
                        result.add_transition(
                            q1,
                            a2.trans_label[tr],
                            a1_num_states + a2.trans_to[tr],
                        );
                    }
                }
            }
        }

        result.sort();
        result
    }

    /// Kleene plus: at least one repetition
    ///
    /// Every transition into a final state is duplicated onto each initial
    /// state; the result is sorted.
    pub fn plus(&self) -> Automaton {
        let mut result = self.unsorted_plus();
        result.sort();
        result
    }

    /// Kleene star: [`plus`](Self::plus) with one fresh state that is both
    /// initial and final, accepting the empty word
    pub fn star(&self) -> Automaton {
        let mut result = self.unsorted_plus();
        let q = result.num_states();
        result.add_state(q);
        result.add_initial_state(q);
        result.set_state_finality(q, 1);
        result.sort();
        result
    }

    fn accepts_epsilon(&self) -> bool {
        self.initial_states
            .iter()
            .any(|&q| self.state_finality(q) != 0)
    }

    fn unsorted_plus(&self) -> Automaton {
        let mut result = Automaton::new();
        let num_states = self.num_states();
        for q in 0..num_states {
            result.add_state(q);
            result.set_state_finality(q, self.state_finality(q));
        }
        result.initial_states.append(&self.initial_states);
        for t in 0..self.num_transitions() as usize {
            let from = self.trans_from[t];
            let label = self.trans_label[t];
            let to = self.trans_to[t];
            result.add_transition(from, label, to);
            if self.state_finality(to) != 0 {
                for j in 0..self.initial_states.len() {
                    result.add_transition(from, label, self.initial_states[j]);
                }
            }
        }
        result
    }

    /// Reset to the empty automaton, keeping allocated capacity
    pub fn clear(&mut self) {
        self.initial_states.clear();
        self.trans_from.clear();
        self.trans_label.clear();
        self.trans_to.clear();
        self.state_first_trans.clear();
        self.state_finality.clear();
    }

    /// Write the six-block binary image
    ///
    /// Block order: initial states, transition sources, labels, targets,
    /// row pointers, finality. Each block is a self-describing [`IntSeq`]
    /// image.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.initial_states.write_to(writer)?;
        self.trans_from.write_to(writer)?;
        self.trans_label.write_to(writer)?;
        self.trans_to.write_to(writer)?;
        self.state_first_trans.write_to(writer)?;
        self.state_finality.write_to(writer)?;
        Ok(())
    }

    /// Read a six-block binary image written by
    /// [`write_to`](Self::write_to)
    ///
    /// Blocks are consumed in exactly the write order; the image is taken
    /// as-is with no re-sorting or validation beyond block framing.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Automaton> {
        Ok(Automaton {
            initial_states: IntSeq::read_from(reader)?,
            trans_from: IntSeq::read_from(reader)?,
            trans_label: IntSeq::read_from(reader)?,
            trans_to: IntSeq::read_from(reader)?,
            state_first_trans: IntSeq::read_from(reader)?,
            state_finality: IntSeq::read_from(reader)?,
        })
    }
}
