//! Finite-state automaton engine over flat integer arenas
//!
//! Everything in this crate is built from two primitives: [`IntSeq`], a
//! growable `i32` array with a configurable growth policy, and
//! [`Interner`], an open-addressing id table that deduplicates entries
//! held in caller-owned arenas through the [`InternStore`] trait. On top
//! of them, [`Automaton`] stores states and transitions as parallel
//! columns, [`Determinizer`] runs subset construction, and [`Minimizer`]
//! runs Moore-style partition refinement.
//!
//! The usual pipeline builds an automaton by pushing transitions, sorts
//! it into compressed-sparse-row form, then determinizes and minimizes:
//!
//! ```
//! use fsa_core::Automaton;
//!
//! let mut words = Automaton::new();
//! words.add_initial_state(0);
//! // "ab" and "ba" as two branches of a trie
//! words.add_transition(0, 'a' as i32, 1);
//! words.add_transition(1, 'b' as i32, 2);
//! words.add_transition(0, 'b' as i32, 3);
//! words.add_transition(3, 'a' as i32, 4);
//! words.set_state_finality(2, 1);
//! words.set_state_finality(4, 1);
//! words.sort();
//!
//! let minimal = words.determinize().minimize();
//! assert_eq!(minimal.accepts(&['a' as i32, 'b' as i32]), 1);
//! assert_eq!(minimal.accepts(&['a' as i32, 'a' as i32]), 0);
//! ```
//!
//! Automata serialize to a framed big-endian binary image through
//! [`Automaton::write_to`] and [`Automaton::read_from`]; malformed
//! images surface as [`AutomatonError`] values, never panics.

pub mod automaton;
pub mod error;
pub mod fnv;
pub mod interner;
pub mod sequence;

pub use automaton::{Automaton, Determinizer, Minimizer, NO};
pub use error::{AutomatonError, Result};
pub use interner::{InternStore, Interner, NOT_FOUND};
pub use sequence::IntSeq;
