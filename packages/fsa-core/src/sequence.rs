//! Growable `i32` sequence with a configurable growth policy
//!
//! `IntSeq` is the single backing store for automaton data: transition
//! arrays, state attributes, intern pools, heaps, and queues all live in
//! flat `i32` sequences. The growth parameter controls reallocation:
//! - `growth > 0`: capacity grows by a fixed increment of `growth` slots
//! - `growth < 0`: capacity grows multiplicatively to `len - len / growth`
//!   (`-1` doubles, `-2` grows by half, ...)
//!
//! In all cases a grow step yields room for at least one more element.
//!
//! A sequence also has a self-describing binary form used by the persisted
//! automaton image: `len` and `growth` as big-endian `i32`, followed by
//! `len` big-endian `i32` payload values.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Read, Write};
use std::ops::{Index, IndexMut};

use crate::error::{AutomatonError, Result};

/// Default initial capacity (63 slots, doubling growth)
const DEFAULT_CAPACITY: usize = 63;

/// Default growth policy: double on reallocation
const DEFAULT_GROWTH: i32 = -1;

/// Dynamic `i32` array with explicit growth policy
#[derive(Clone)]
pub struct IntSeq {
    /// Backing storage; `buf.len()` is the capacity
    buf: Vec<i32>,

    /// Logical length; elements at `len..` are dead storage
    len: usize,

    /// Growth policy parameter
    growth: i32,
}

impl IntSeq {
    /// Create a sequence with the default capacity and doubling growth
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_GROWTH)
    }

    /// Create a sequence with explicit initial capacity and growth policy
    pub fn with_capacity(capacity: usize, growth: i32) -> Self {
        Self {
            buf: vec![0; capacity],
            len: 0,
            growth,
        }
    }

    /// Logical length
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently allocated slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Growth policy parameter
    #[inline]
    pub fn growth(&self) -> i32 {
        self.growth
    }

    /// View of the live elements
    #[inline]
    pub fn as_slice(&self) -> &[i32] {
        &self.buf[..self.len]
    }

    /// Mutable view of the live elements
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.buf[..self.len]
    }

    /// Iterator over the live elements
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, i32> {
        self.as_slice().iter()
    }

    /// Append one element, growing per the policy when full
    #[inline]
    pub fn push(&mut self, value: i32) {
        if self.len == self.buf.len() {
            let grown = self.grown_capacity();
            self.buf.resize(grown, 0);
        }
        self.buf[self.len] = value;
        self.len += 1;
    }

    /// Append all values from a slice
    pub fn extend_from_slice(&mut self, values: &[i32]) {
        if values.is_empty() {
            return;
        }
        let new_len = self.len + values.len();
        if self.buf.len() < new_len {
            let grown = self.capacity_for(new_len);
            self.buf.resize(grown, 0);
        }
        self.buf[self.len..new_len].copy_from_slice(values);
        self.len = new_len;
    }

    /// Append the contents of another sequence
    pub fn append(&mut self, other: &IntSeq) {
        self.extend_from_slice(other.as_slice());
    }

    /// Overwrite this sequence with the contents of `src`
    pub fn copy_from(&mut self, src: &IntSeq) {
        if self.buf.len() < src.len {
            let grown = self.capacity_for(src.len);
            self.buf.resize(grown, 0);
        }
        self.buf[..src.len].copy_from_slice(src.as_slice());
        self.len = src.len;
    }

    /// Linear-scan membership test
    pub fn contains(&self, value: i32) -> bool {
        self.as_slice().contains(&value)
    }

    /// Drop all elements; capacity is kept
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shorten to `len` elements; no-op when already shorter
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// Next capacity when one more slot is needed
    fn grown_capacity(&self) -> usize {
        let len = self.len as i64;
        let growth = self.growth as i64;
        let mut grown = if growth < 0 {
            len - len / growth
        } else {
            len + growth
        };
        if grown <= len {
            grown = len + 1;
        }
        grown as usize
    }

    /// Capacity satisfying `new_len` under the growth policy
    fn capacity_for(&self, new_len: usize) -> usize {
        let new_len = new_len as i64;
        let growth = self.growth as i64;
        let grown = if growth < 0 {
            new_len - new_len / growth
        } else {
            new_len + growth
        };
        grown as usize
    }

    /// Write the binary block: `len`, `growth`, then the payload
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<BigEndian>(self.len as i32)?;
        writer.write_i32::<BigEndian>(self.growth)?;
        for &value in self.as_slice() {
            writer.write_i32::<BigEndian>(value)?;
        }
        Ok(())
    }

    /// Read a binary block written by [`write_to`](Self::write_to)
    ///
    /// The payload is consumed element by element, so a truncated stream
    /// with an inflated header length fails on the short read instead of
    /// allocating the claimed length up front. The growth word is restored
    /// as data once the payload is in; buffer growth during the read
    /// follows the default doubling policy, never the header.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<IntSeq> {
        let len = reader.read_i32::<BigEndian>()?;
        if len < 0 {
            return Err(AutomatonError::corrupted(format!(
                "sequence block claims negative length {}",
                len
            )));
        }
        let growth = reader.read_i32::<BigEndian>()?;
        let mut seq = IntSeq::with_capacity(0, DEFAULT_GROWTH);
        for _ in 0..len {
            seq.push(reader.read_i32::<BigEndian>()?);
        }
        seq.growth = growth;
        Ok(seq)
    }
}

impl Default for IntSeq {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for IntSeq {
    type Output = i32;

    #[inline]
    fn index(&self, index: usize) -> &i32 {
        &self.as_slice()[index]
    }
}

impl IndexMut<usize> for IntSeq {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut i32 {
        &mut self.buf[..self.len][index]
    }
}

/// Equality over logical content and growth policy; dead capacity is ignored
impl PartialEq for IntSeq {
    fn eq(&self, other: &Self) -> bool {
        self.growth == other.growth && self.as_slice() == other.as_slice()
    }
}

impl Eq for IntSeq {}

impl fmt::Debug for IntSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntSeq")
            .field("len", &self.len)
            .field("growth", &self.growth)
            .field("seq", &self.as_slice())
            .finish()
    }
}

impl<'a> IntoIterator for &'a IntSeq {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
