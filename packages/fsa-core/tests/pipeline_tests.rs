//! End-to-end pipeline tests
//!
//! Builds word tries the way callers do (one fresh branch per word off a
//! shared root), then pushes them through sort, subset construction,
//! minimization, and the binary image, checking state counts and word
//! membership at every stage.

use fsa_core::{Automaton, AutomatonError, IntSeq};
use pretty_assertions::assert_eq;
use std::io::{Seek, SeekFrom};

/// One branch per word off the shared root state
fn trie(words: &[&str]) -> Automaton {
    let mut a = Automaton::new();
    a.add_state(0);
    a.add_initial_state(0);
    let mut next = 1;
    for word in words {
        let mut state = 0;
        for ch in word.chars() {
            a.add_transition(state, ch as i32, next);
            state = next;
            next += 1;
        }
        a.set_state_finality(state, 1);
    }
    a.sort();
    a
}

fn word(s: &str) -> Vec<i32> {
    s.chars().map(|c| c as i32).collect()
}

#[test]
fn test_two_letter_words_minimize_to_three_states() {
    let nfa = trie(&["aa", "ab", "ba", "bb"]);
    assert_eq!(nfa.num_states(), 9);
    assert_eq!(nfa.num_transitions(), 8);
    assert_eq!(nfa.num_final_states(), 4);

    let dfa = nfa.determinize();
    assert_eq!(dfa.num_states(), 7);
    assert_eq!(dfa.num_transitions(), 6);
    assert_eq!(dfa.num_final_states(), 4);

    let minimal = dfa.minimize();
    assert_eq!(minimal.num_states(), 3);
    assert_eq!(minimal.num_transitions(), 4);
    assert_eq!(minimal.num_final_states(), 1);

    for w in ["aa", "ab", "ba", "bb"] {
        assert_eq!(minimal.accepts(&word(w)), 1, "should accept {w:?}");
    }
    for w in ["", "a", "b", "aaa", "ca"] {
        assert_eq!(minimal.accepts(&word(w)), 0, "should reject {w:?}");
    }
}

#[test]
fn test_minimal_result_is_canonical() {
    let first = trie(&["aa", "ab", "b"]).determinize().minimize();
    let second = trie(&["b", "ab", "aa"]).determinize().minimize();
    assert_eq!(first.num_states(), second.num_states());
    assert_eq!(first.num_transitions(), second.num_transitions());
    assert!(Automaton::isomorphic(&first, &second));
}

#[test]
fn test_union_accepts_both_languages() {
    let u = Automaton::union(&trie(&["ab"]), &trie(&["cd", "c"]));
    let dfa = u.determinize().minimize();
    for w in ["ab", "cd", "c"] {
        assert_eq!(dfa.accepts(&word(w)), 1, "should accept {w:?}");
    }
    for w in ["", "a", "d", "abc", "abcd"] {
        assert_eq!(dfa.accepts(&word(w)), 0, "should reject {w:?}");
    }
}

#[test]
fn test_concat_crosses_the_seam() {
    let joined = Automaton::concat(&trie(&["a", "ab"]), &trie(&["c"]));
    let dfa = joined.determinize().minimize();
    for w in ["ac", "abc"] {
        assert_eq!(dfa.accepts(&word(w)), 1, "should accept {w:?}");
    }
    for w in ["", "a", "ab", "c", "acc", "abcc"] {
        assert_eq!(dfa.accepts(&word(w)), 0, "should reject {w:?}");
    }
}

#[test]
fn test_plus_and_star_repeat_the_language() {
    let base = trie(&["ab"]);
    let plus = base.plus().determinize().minimize();
    let star = base.star().determinize().minimize();

    assert_eq!(plus.accepts(&word("")), 0);
    assert_eq!(star.accepts(&word("")), 1);
    for w in ["ab", "abab", "ababab"] {
        assert_eq!(plus.accepts(&word(w)), 1, "plus should accept {w:?}");
        assert_eq!(star.accepts(&word(w)), 1, "star should accept {w:?}");
    }
    for w in ["a", "aba", "abb", "ba"] {
        assert_eq!(plus.accepts(&word(w)), 0, "plus should reject {w:?}");
        assert_eq!(star.accepts(&word(w)), 0, "star should reject {w:?}");
    }
}

#[test]
fn test_reverse_swaps_word_direction() {
    let rev = trie(&["ab", "cb"]).reverse().determinize();
    assert_eq!(rev.accepts(&word("ba")), 1);
    assert_eq!(rev.accepts(&word("bc")), 1);
    assert_eq!(rev.accepts(&word("ab")), 0);
    assert_eq!(rev.accepts(&word("b")), 0);
}

#[test]
fn test_double_reversal_determinization_minimizes() {
    // Determinizing the reversal twice lands on the minimal automaton.
    let a = trie(&["abc", "ac", "bc"]);
    let direct = a.determinize().minimize();
    let doubled = a.reverse().determinize().reverse().determinize();
    assert_eq!(doubled.num_states(), direct.num_states());
    assert!(Automaton::isomorphic(&direct, &doubled));
}

#[test]
fn test_statistics_on_tries_and_loops() {
    let a = trie(&["ab", "cd"]);
    assert_eq!(a.num_reachable_states(), a.num_states());
    assert_eq!(a.num_co_reachable_states(), a.num_states());
    assert!(!a.contains_cycle());

    let looped = a.plus();
    assert!(looped.contains_cycle());
}

#[test]
fn test_empty_word_set_pipeline() {
    let minimal = trie(&[]).determinize().minimize();
    assert_eq!(minimal.num_states(), 1);
    assert_eq!(minimal.num_transitions(), 0);
    assert_eq!(minimal.num_final_states(), 0);
    assert_eq!(minimal.accepts(&word("")), 0);
}

#[test]
fn test_empty_word_language() {
    let minimal = trie(&[""]).determinize().minimize();
    assert_eq!(minimal.num_states(), 1);
    assert_eq!(minimal.num_final_states(), 1);
    assert_eq!(minimal.accepts(&word("")), 1);
    assert_eq!(minimal.accepts(&word("a")), 0);
}

#[test]
fn test_binary_image_layout() {
    let a = trie(&["a"]);
    let mut bytes = Vec::new();
    a.write_to(&mut bytes).unwrap();
    // Six blocks of 8 framing bytes each, then one initial state, three
    // transition columns of one, and two row pointers plus two finality
    // weights.
    assert_eq!(bytes.len(), 6 * 8 + (1 + 3 + 4) * 4);

    let back = Automaton::read_from(&mut bytes.as_slice()).unwrap();
    assert_eq!(back, a);
}

#[test]
fn test_file_round_trip() {
    let a = trie(&["alpha", "beta"]).determinize().minimize();
    let mut file = tempfile::tempfile().unwrap();
    a.write_to(&mut file).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let back = Automaton::read_from(&mut file).unwrap();
    assert_eq!(back, a);
    assert_eq!(back.accepts(&word("alpha")), 1);
    assert_eq!(back.accepts(&word("beta")), 1);
    assert_eq!(back.accepts(&word("gamma")), 0);
}

#[test]
fn test_truncated_image_is_rejected() {
    let a = trie(&["ab"]);
    let mut bytes = Vec::new();
    a.write_to(&mut bytes).unwrap();

    let truncated = &bytes[..bytes.len() / 2];
    assert!(Automaton::read_from(&mut &truncated[..]).is_err());
}

#[test]
fn test_negative_block_length_is_rejected() {
    let mut bytes = Vec::new();
    trie(&["ab"]).write_to(&mut bytes).unwrap();
    // Flip the sign of the first block's length.
    bytes[0] = 0xFF;

    let err = Automaton::read_from(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(err, AutomatonError::Corrupted(_)));
}

#[test]
fn test_inflated_growth_header_does_not_inflate_buffers() {
    // The growth word in a block header is restored as data; it must not
    // size the buffers the reader allocates.
    let mut block = Vec::new();
    block.extend_from_slice(&1i32.to_be_bytes());
    block.extend_from_slice(&i32::MAX.to_be_bytes());
    block.extend_from_slice(&42i32.to_be_bytes());

    let seq = IntSeq::read_from(&mut block.as_slice()).unwrap();
    assert_eq!(seq.as_slice(), &[42]);
    assert_eq!(seq.growth(), i32::MAX);
    assert!(seq.capacity() <= 2);

    // The same lie inside a full image, which carries one header per block.
    let a = trie(&["ab"]);
    let mut bytes = Vec::new();
    a.write_to(&mut bytes).unwrap();
    bytes[4..8].copy_from_slice(&i32::MAX.to_be_bytes());

    let back = Automaton::read_from(&mut bytes.as_slice()).unwrap();
    assert_eq!(back.num_states(), a.num_states());
    assert_eq!(back.num_transitions(), a.num_transitions());
    assert_eq!(back.accepts(&word("ab")), 1);
    assert_eq!(back.accepts(&word("a")), 0);
}
