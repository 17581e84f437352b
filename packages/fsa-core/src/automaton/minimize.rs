//! Partition refinement
//!
//! Moore-style minimization over interned equivalence classes. States
//! start partitioned by signature (finality plus outgoing label run) and
//! classes are refined round-robin: a class splits when, at some
//! transition position, its members' targets fall into different classes.
//! Every split resets the pass counter, so refinement ends only after a
//! full clean sweep over the current classes.
//!
//! Class membership is an intrusive linked list threaded through
//! `state_next`, with `class_first_state` holding each class's head. The
//! head doubles as the class representative when the minimized automaton
//! is emitted.
//!
//! Expects a sorted, deterministic input whose states are all reachable
//! and co-reachable; a non-trimmed input yields classes for dead states
//! instead of dropping them.

use tracing::debug;

use crate::fnv;
use crate::interner::{InternStore, Interner};
use crate::sequence::IntSeq;

use super::{Automaton, NO};

/// Signature hash of a state: finality, then the outgoing label run
fn signature_hash(source: &Automaton, state: i32) -> u64 {
    let mut code = fnv::mix_int(fnv::OFFSET_BASIS, source.state_finality(state));
    let first = source.state_first_trans[state as usize];
    for i in 0..source.state_transition_count(state) {
        code = fnv::mix_int(code, source.trans_label[(first + i) as usize]);
    }
    fnv::finalize(code)
}

/// Push `state` onto the front of `class`'s member list
fn link_state(
    class_first_state: &mut IntSeq,
    state_next: &mut [i32],
    state_class: &mut [i32],
    class: i32,
    state: i32,
) {
    state_next[state as usize] = class_first_state[class as usize];
    class_first_state[class as usize] = state;
    state_class[state as usize] = class;
}

/// Intern view for the initial partition: states are equal when their
/// finality and outgoing label runs agree
struct SignatureStore<'b> {
    source: &'b Automaton,
    class_first_state: &'b mut IntSeq,
    state_next: &'b mut [i32],
    state_class: &'b mut [i32],
}

impl InternStore for SignatureStore<'_> {
    type Key = i32;

    fn hash_key(&self, key: &i32) -> u64 {
        signature_hash(self.source, *key)
    }

    fn hash_entry(&self, id: i32) -> u64 {
        signature_hash(self.source, self.class_first_state[id as usize])
    }

    fn matches(&self, key: &i32, id: i32) -> bool {
        let state = *key;
        let rep = self.class_first_state[id as usize];
        let count = self.source.state_transition_count(state);
        if count != self.source.state_transition_count(rep)
            || self.source.state_finality(state) != self.source.state_finality(rep)
        {
            return false;
        }
        let first_state = self.source.state_first_trans[state as usize];
        let first_rep = self.source.state_first_trans[rep as usize];
        (0..count).all(|i| {
            self.source.trans_label[(first_state + i) as usize]
                == self.source.trans_label[(first_rep + i) as usize]
        })
    }

    fn materialize(&mut self, key: &i32) -> i32 {
        let id = self.class_first_state.len() as i32;
        self.class_first_state.push(NO);
        link_state(
            self.class_first_state,
            self.state_next,
            self.state_class,
            id,
            *key,
        );
        id
    }
}

/// Intern view for one split position: members are equal when their
/// transition at `position` targets the same class
struct SplitStore<'b> {
    source: &'b Automaton,
    state_class: &'b [i32],
    reps: &'b mut IntSeq,
    position: i32,
}

impl SplitStore<'_> {
    fn target_class(&self, state: i32) -> i32 {
        let first = self.source.state_first_trans[state as usize];
        let to = self.source.trans_to[(first + self.position) as usize];
        self.state_class[to as usize]
    }
}

impl InternStore for SplitStore<'_> {
    type Key = i32;

    fn hash_key(&self, key: &i32) -> u64 {
        fnv::hash_int(self.target_class(*key))
    }

    fn hash_entry(&self, id: i32) -> u64 {
        fnv::hash_int(self.target_class(self.reps[id as usize]))
    }

    fn matches(&self, key: &i32, id: i32) -> bool {
        self.target_class(*key) == self.target_class(self.reps[id as usize])
    }

    fn materialize(&mut self, key: &i32) -> i32 {
        let id = self.reps.len() as i32;
        self.reps.push(*key);
        id
    }
}

/// Single-use minimization worker
///
/// Expects a sorted, trimmed, deterministic automaton with one initial
/// state.
pub struct Minimizer<'a> {
    source: &'a Automaton,
    state_class: Vec<i32>,
    state_new_class: Vec<i32>,
    state_next: Vec<i32>,
    class_first_state: IntSeq,
    classes: Interner,
    splitter_table: Interner,
    splitter_reps: IntSeq,
}

impl<'a> Minimizer<'a> {
    pub fn new(source: &'a Automaton) -> Self {
        let num_states = source.num_states() as usize;
        Minimizer {
            source,
            state_class: vec![NO; num_states],
            state_new_class: vec![NO; num_states],
            state_next: vec![NO; num_states],
            class_first_state: IntSeq::new(),
            classes: Interner::new(),
            // Reset once per split position; the journal keeps that cheap.
            splitter_table: Interner::with_options(63, true),
            splitter_reps: IntSeq::new(),
        }
    }

    /// Refine to the minimal automaton
    pub fn run(mut self) -> Automaton {
        if self.source.initial_states.is_empty() {
            return Automaton::new();
        }
        self.build_initial_partition();

        let mut checked = 0;
        let mut splits = 0;
        let mut cl = 0;
        while checked < self.class_first_state.len() {
            if self.split_class(cl) {
                checked = 0;
                splits += 1;
            } else {
                checked += 1;
            }
            cl = (cl + 1) % self.class_first_state.len() as i32;
        }
        debug!(
            "refined {} states into {} classes after {} splits",
            self.source.num_states(),
            self.class_first_state.len(),
            splits
        );

        self.emit()
    }

    fn build_initial_partition(&mut self) {
        for state in 0..self.source.num_states() {
            let class_count = self.class_first_state.len() as i32;
            let class = self.intern_signature(state);
            if class < class_count {
                // Known signature: join as an additional member.
                link_state(
                    &mut self.class_first_state,
                    &mut self.state_next,
                    &mut self.state_class,
                    class,
                    state,
                );
            }
        }
    }

    fn intern_signature(&mut self, state: i32) -> i32 {
        let mut store = SignatureStore {
            source: self.source,
            class_first_state: &mut self.class_first_state,
            state_next: &mut self.state_next,
            state_class: &mut self.state_class,
        };
        self.classes.add(&mut store, &state)
    }

    /// Try to split class `cl`; true when it broke into new classes
    ///
    /// Positions are scanned left to right and the scan stops at the
    /// first splitting one; later positions wait for the next visit.
    fn split_class(&mut self, cl: i32) -> bool {
        let head = self.class_first_state[cl as usize];
        if self.state_next[head as usize] == NO {
            return false;
        }
        let rep_count = self.source.state_transition_count(head);
        let mut position = 0;
        while position < rep_count {
            self.splitter_table.reset();
            self.splitter_reps.clear();

            // Bucket members by the class their transition at `position`
            // targets. The head is scanned first, so bucket 0 keeps `cl`.
            let mut state = head;
            while state != NO {
                let bucket = self.intern_split_target(state, position);
                self.state_new_class[state as usize] = if bucket == 0 {
                    cl
                } else {
                    self.class_first_state.len() as i32 + bucket - 1
                };
                state = self.state_next[state as usize];
            }

            if self.splitter_reps.len() > 1 {
                self.relink_movers(cl);
                break;
            }
            position += 1;
        }
        position < rep_count
    }

    fn intern_split_target(&mut self, state: i32, position: i32) -> i32 {
        let mut store = SplitStore {
            source: self.source,
            state_class: &self.state_class,
            reps: &mut self.splitter_reps,
            position,
        };
        self.splitter_table.add(&mut store, &state)
    }

    /// Move members whose new class differs from `cl` out of its list
    ///
    /// New classes are allocated on first use; buckets appear in member
    /// order, so each new class id arrives exactly when the list reaches
    /// its first member.
    fn relink_movers(&mut self, cl: i32) {
        let head = self.class_first_state[cl as usize];
        let mut prev = head;
        let mut state = self.state_next[head as usize];
        while state != NO {
            let next = self.state_next[state as usize];
            let new_class = self.state_new_class[state as usize];
            if new_class == cl {
                prev = state;
            } else {
                if new_class == self.class_first_state.len() as i32 {
                    self.class_first_state.push(NO);
                }
                self.state_next[prev as usize] = next;
                link_state(
                    &mut self.class_first_state,
                    &mut self.state_next,
                    &mut self.state_class,
                    new_class,
                    state,
                );
            }
            state = next;
        }
    }

    /// Build the minimized automaton from class representatives
    fn emit(self) -> Automaton {
        let source = self.source;
        let num_classes = self.class_first_state.len() as i32;
        let mut result = Automaton::new();
        result.add_state(num_classes - 1);
        result.add_initial_state(self.state_class[source.initial_states[0] as usize]);
        for class in 0..num_classes {
            let rep = self.class_first_state[class as usize];
            result.set_state_finality(class, source.state_finality(rep));
            let first = source.state_first_trans[rep as usize];
            for i in 0..source.state_transition_count(rep) {
                let tr = (first + i) as usize;
                result.add_transition(
                    class,
                    source.trans_label[tr],
                    self.state_class[source.trans_to[tr] as usize],
                );
            }
        }
        result.init_state_offsets();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: i32 = 'a' as i32;
    const B: i32 = 'b' as i32;
    const C: i32 = 'c' as i32;

    fn build(initials: &[i32], finals: &[i32], transitions: &[(i32, i32, i32)]) -> Automaton {
        let mut a = Automaton::new();
        for &q in initials {
            a.add_state(q);
            a.add_initial_state(q);
        }
        for &(from, label, to) in transitions {
            a.add_transition(from, label, to);
        }
        for &q in finals {
            a.add_state(q);
            a.set_state_finality(q, 1);
        }
        a.sort();
        a
    }

    #[test]
    fn test_minimize_merges_equivalent_states() {
        // Determinized trie of {aa, ab, b}: the three final states carry
        // the same signature and collapse, which then splits the two
        // non-final states apart.
        let trie = build(
            &[0],
            &[2, 4, 5],
            &[(0, A, 1), (1, A, 2), (0, A, 3), (3, B, 4), (0, B, 5)],
        );
        let minimal = trie.determinize().minimize();
        assert_eq!(minimal.num_states(), 3);
        assert_eq!(minimal.num_transitions(), 4);
        assert_eq!(minimal.num_final_states(), 1);
        assert_eq!(minimal.accepts(&[A, A]), 1);
        assert_eq!(minimal.accepts(&[A, B]), 1);
        assert_eq!(minimal.accepts(&[B]), 1);
        assert_eq!(minimal.accepts(&[A]), 0);
        assert_eq!(minimal.accepts(&[]), 0);
        assert_eq!(minimal.accepts(&[B, A]), 0);
        assert_eq!(minimal.accepts(&[B, B]), 0);
        assert_eq!(minimal.accepts(&[A, A, B]), 0);
    }

    #[test]
    fn test_minimize_collapses_shared_suffixes() {
        // {ab, cb}: both b-states are equivalent, both finals too.
        let trie = build(&[0], &[2, 4], &[(0, A, 1), (1, B, 2), (0, C, 3), (3, B, 4)]);
        let minimal = trie.minimize();
        assert_eq!(minimal.num_states(), 3);
        assert_eq!(minimal.num_transitions(), 3);
        assert_eq!(minimal.num_final_states(), 1);
        assert_eq!(minimal.accepts(&[A, B]), 1);
        assert_eq!(minimal.accepts(&[C, B]), 1);
        assert_eq!(minimal.accepts(&[A]), 0);
        assert_eq!(minimal.accepts(&[B]), 0);
        assert_eq!(minimal.accepts(&[C, C]), 0);
    }

    #[test]
    fn test_minimize_keeps_minimal_automata() {
        let minimal = build(&[0], &[1], &[(0, A, 1), (0, B, 1)]);
        let again = minimal.minimize();
        assert_eq!(again.num_states(), 2);
        assert_eq!(again.num_transitions(), 2);
        assert!(Automaton::isomorphic(&minimal, &again));
    }

    #[test]
    fn test_determinized_diamond_is_already_minimal() {
        let nfa = build(&[0], &[3], &[(0, A, 1), (0, A, 2), (1, B, 3), (2, C, 3)]);
        let dfa = nfa.determinize();
        let minimal = dfa.minimize();
        assert_eq!(minimal.num_states(), dfa.num_states());
        assert!(Automaton::isomorphic(&dfa, &minimal));
    }

    #[test]
    fn test_minimize_is_idempotent() {
        let trie = build(
            &[0],
            &[2, 4, 5],
            &[(0, A, 1), (1, A, 2), (0, A, 3), (3, B, 4), (0, B, 5)],
        );
        let once = trie.determinize().minimize();
        let twice = once.minimize();
        assert_eq!(twice.num_states(), once.num_states());
        assert_eq!(twice.num_transitions(), once.num_transitions());
        assert!(Automaton::isomorphic(&once, &twice));
    }

    #[test]
    fn test_minimize_without_initial_states() {
        let mut empty = Automaton::new();
        empty.add_state(2);
        empty.sort();
        let minimal = empty.minimize();
        assert_eq!(minimal.num_states(), 0);
        assert_eq!(minimal.num_transitions(), 0);
        assert!(minimal.initial_states().is_empty());
    }
}
