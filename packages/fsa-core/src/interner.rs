//! Interning table mapping caller-stored objects to dense ids
//!
//! The table enforces at-most-one id per equivalence class: adding an
//! object equal to one seen before returns the existing id, otherwise the
//! caller materializes a new one. Only ids live in the table; the objects
//! themselves stay in the caller's storage, reached through the
//! [`InternStore`] capability trait.
//!
//! Layout is open addressing over a slot array of ids, probed with a fixed
//! additive stride. Capacity is always `2^n - 1`, so the stride stays
//! coprime with the table length and every probe chain visits all slots.
//! Deletion relinks the remainder of the probe chain instead of leaving
//! tombstones. A table built in fast-reset mode journals occupied slots so
//! that [`reset`](Interner::reset) costs O(occupied) instead of
//! O(capacity).
//!
//! # References
//! - Knuth, D. E. "The Art of Computer Programming", Vol. 3, §6.4

use crate::sequence::IntSeq;

/// Returned by [`Interner::get`] when the key is not present
pub const NOT_FOUND: i32 = -1;

/// Fixed additive probe stride
pub const HASH_STEP: usize = 107;

/// Empty-slot marker; ids are always non-negative
const EMPTY: i32 = -1;

/// Default slot count; must be `2^n - 1`
const DEFAULT_CAPACITY: usize = 63;

/// Storage capability the table requires from its caller
///
/// `hash_key` and `hash_entry` must agree: an entry's hash through its id
/// equals the hash of the key it was materialized from. `materialize` must
/// hand out dense ids counting up from 0.
pub trait InternStore {
    /// Lookup key type; borrowed, so slices work directly
    type Key: ?Sized;

    /// Hash of a candidate key
    fn hash_key(&self, key: &Self::Key) -> u64;

    /// Hash of an already-stored entry, used when rebuilding the table
    fn hash_entry(&self, id: i32) -> u64;

    /// Whether `key` is equal to the stored entry `id`
    fn matches(&self, key: &Self::Key, id: i32) -> bool;

    /// Store `key` and return its new id
    fn materialize(&mut self, key: &Self::Key) -> i32;
}

/// Open-addressing id table over an [`InternStore`]
#[derive(Debug)]
pub struct Interner {
    /// Slot array holding entry ids, `EMPTY` when free
    slots: Vec<i32>,

    /// Number of live entries
    len: usize,

    /// Journal of occupied slot positions, kept only in fast-reset mode
    occupied: Option<IntSeq>,
}

impl Interner {
    /// Create a table with the default capacity
    pub fn new() -> Self {
        Self::with_options(DEFAULT_CAPACITY, false)
    }

    /// Create a table with the given capacity
    ///
    /// `capacity` must be `2^n - 1` for some `n > 1`, i.e. one of
    /// 3, 7, 15, 31, 63, 127, ...
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(capacity, false)
    }

    /// Create a table with the given capacity and reset mode
    pub fn with_options(capacity: usize, fast_reset: bool) -> Self {
        debug_assert!(
            capacity >= 3 && (capacity + 1).is_power_of_two(),
            "capacity must be 2^n - 1"
        );
        Self {
            slots: vec![EMPTY; capacity],
            len: 0,
            occupied: if fast_reset { Some(IntSeq::new()) } else { None },
        }
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slot count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Intern `key`: return its existing id, or materialize a new one
    ///
    /// Grows the table once more than 90% of the slots are occupied.
    pub fn add<S: InternStore>(&mut self, store: &mut S, key: &S::Key) -> i32 {
        let cap = self.slots.len();
        let mut i = (store.hash_key(key) % cap as u64) as usize;
        while self.slots[i] != EMPTY {
            if store.matches(key, self.slots[i]) {
                return self.slots[i];
            }
            i = (i + HASH_STEP) % cap;
        }
        let id = store.materialize(key);
        self.slots[i] = id;
        if let Some(journal) = &mut self.occupied {
            journal.push(i as i32);
        }
        self.len += 1;
        if 9 * cap < 10 * self.len {
            self.grow(store);
        }
        id
    }

    /// Look up `key` without inserting; [`NOT_FOUND`] when absent
    pub fn get<S: InternStore>(&self, store: &S, key: &S::Key) -> i32 {
        let cap = self.slots.len();
        let mut i = (store.hash_key(key) % cap as u64) as usize;
        while self.slots[i] != EMPTY {
            if store.matches(key, self.slots[i]) {
                return self.slots[i];
            }
            i = (i + HASH_STEP) % cap;
        }
        NOT_FOUND
    }

    /// Remove `key` from the table; the store keeps the entry itself
    ///
    /// The remainder of the probe chain is reinserted at natural positions,
    /// so later lookups never cross a hole.
    pub fn remove<S: InternStore>(&mut self, store: &S, key: &S::Key) {
        let cap = self.slots.len();
        let mut i = (store.hash_key(key) % cap as u64) as usize;
        while self.slots[i] != EMPTY {
            if store.matches(key, self.slots[i]) {
                break;
            }
            i = (i + HASH_STEP) % cap;
        }
        if self.slots[i] == EMPTY {
            return;
        }
        self.slots[i] = EMPTY;
        i = (i + HASH_STEP) % cap;
        while self.slots[i] != EMPTY {
            let id = self.slots[i];
            self.slots[i] = EMPTY;
            let mut j = (store.hash_entry(id) % cap as u64) as usize;
            while self.slots[j] != EMPTY {
                j = (j + HASH_STEP) % cap;
            }
            self.slots[j] = id;
            if let Some(journal) = &mut self.occupied {
                journal.push(j as i32);
            }
            i = (i + HASH_STEP) % cap;
        }
        self.len -= 1;
    }

    /// Clear the table; O(occupied) in fast-reset mode
    pub fn reset(&mut self) {
        if let Some(journal) = &mut self.occupied {
            for &position in journal.as_slice() {
                self.slots[position as usize] = EMPTY;
            }
            journal.clear();
        } else {
            self.slots.fill(EMPTY);
        }
        self.len = 0;
    }

    /// Rebuild into `2 * capacity + 1` slots, rehashing by entry id
    fn grow<S: InternStore>(&mut self, store: &S) {
        let new_cap = 2 * self.slots.len() + 1;
        let old = std::mem::replace(&mut self.slots, vec![EMPTY; new_cap]);
        if let Some(journal) = &mut self.occupied {
            journal.clear();
        }
        for id in old {
            if id == EMPTY {
                continue;
            }
            let mut i = (store.hash_entry(id) % new_cap as u64) as usize;
            while self.slots[i] != EMPTY {
                i = (i + HASH_STEP) % new_cap;
            }
            self.slots[i] = id;
            if let Some(journal) = &mut self.occupied {
                journal.push(i as i32);
            }
        }
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
