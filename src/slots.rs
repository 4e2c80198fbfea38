//! The open-addressed slot table.
//!
//! A slot cell is a single atomic word in one of three states:
//!
//! - **Empty**: untagged null. Terminates probe sequences.
//! - **Tombstone**: null tagged with [`Tag::First`]. A vacated slot; probes
//!   continue past it.
//! - **Occupied**: an [`Entry`] pointer.
//!
//! Writers publish, replace, and vacate cells with release-ordered CAS;
//! readers load with acquire ordering, so entry contents written before
//! publication are visible to any reader that observes the pointer.

use sdd::AtomicShared;
use sdd::Guard;
use sdd::Ptr;
use sdd::Tag;

use core::sync::atomic::Ordering::Acquire;
use core::sync::atomic::Ordering::Relaxed;

use crate::entry::Entry;
use crate::primes::PRIMES;
use crate::record::NodeRecord;

// -----------------------------------------------------------------------------
// Probe Sequence
// -----------------------------------------------------------------------------

/// Double-hashing probe sequence over a prime-sized table.
///
/// Starts at `hash % size` and advances by `1 + (hash % (size - 2))`. The
/// step is nonzero and less than the prime `size`, hence coprime to it, so
/// the sequence visits every slot exactly once before the iterator runs dry.
pub(crate) struct Probe {
  index: u32,
  step: u32,
  size: u32,
  remaining: u32,
}

impl Probe {
  #[inline]
  pub(crate) fn new(hash: u32, size: u32) -> Self {
    Self {
      index: hash % size,
      step: 1 + hash % (size - 2),
      size,
      remaining: size,
    }
  }
}

impl Iterator for Probe {
  type Item = usize;

  #[inline]
  fn next(&mut self) -> Option<usize> {
    if self.remaining == 0 {
      return None;
    }

    self.remaining -= 1;

    let current: u32 = self.index;

    self.index += self.step;

    if self.index >= self.size {
      self.index -= self.size;
    }

    Some(current as usize)
  }
}

// -----------------------------------------------------------------------------
// Slot State
// -----------------------------------------------------------------------------

/// Decoded state of a loaded slot cell.
enum Slot<'guard, N> {
  Empty,
  Tombstone,
  Occupied(&'guard Entry<N>),
}

#[inline]
fn decode<'guard, N>(ptr: Ptr<'guard, Entry<N>>) -> Slot<'guard, N> {
  match ptr.as_ref() {
    Some(entry) => Slot::Occupied(entry),
    None if ptr.tag() == Tag::First => Slot::Tombstone,
    None => Slot::Empty,
  }
}

// -----------------------------------------------------------------------------
// Slot Array
// -----------------------------------------------------------------------------

/// A fixed-size array of slot cells with prime capacity.
///
/// The array never changes size; growing or shrinking builds a fresh array
/// via [`rebuilt`] and publishes it in the array's place.
///
/// [`rebuilt`]: SlotArray::rebuilt
pub(crate) struct SlotArray<N: NodeRecord> {
  prime_index: usize,
  cells: Box<[AtomicShared<Entry<N>>]>,
}

impl<N: NodeRecord> SlotArray<N> {
  pub(crate) fn new(prime_index: usize) -> Self {
    let size: usize = PRIMES[prime_index] as usize;

    Self {
      prime_index,
      cells: (0..size).map(|_| AtomicShared::null()).collect(),
    }
  }

  /// The prime capacity of this array.
  #[inline]
  pub(crate) const fn size(&self) -> u32 {
    PRIMES[self.prime_index]
  }

  #[inline]
  pub(crate) fn cell(&self, index: usize) -> &AtomicShared<Entry<N>> {
    &self.cells[index]
  }

  #[inline]
  fn probe(&self, hash: u32) -> Probe {
    Probe::new(hash, self.size())
  }

  /// Locates the slot holding `key`.
  ///
  /// Returns the slot index and the observed entry pointer, or `None` when
  /// the scan meets an Empty slot or completes a full cycle.
  pub(crate) fn find_occupied<'guard>(
    &self,
    key: &N::Key,
    hash: u32,
    guard: &'guard Guard,
  ) -> Option<(usize, Ptr<'guard, Entry<N>>)> {
    for index in self.probe(hash) {
      let ptr: Ptr<'guard, Entry<N>> = self.cells[index].load(Acquire, guard);

      match decode(ptr) {
        Slot::Empty => return None,
        Slot::Tombstone => {}
        Slot::Occupied(entry) => {
          if entry.hash == hash && entry.node.key() == key {
            return Some((index, ptr));
          }
        }
      }
    }

    None
  }

  /// Locates a slot that an entry for `key` could be published into.
  ///
  /// Returns `None` when the key is already present, or when a full cycle
  /// finds neither an Empty slot nor a reusable Tombstone. The first
  /// Tombstone in probe order is remembered but the scan continues, because
  /// the key may still live further along the sequence; an Empty slot
  /// settles the question.
  pub(crate) fn find_insert_slot<'guard>(
    &self,
    key: &N::Key,
    hash: u32,
    guard: &'guard Guard,
  ) -> Option<(usize, Ptr<'guard, Entry<N>>)> {
    let mut candidate: Option<(usize, Ptr<'guard, Entry<N>>)> = None;

    for index in self.probe(hash) {
      let ptr: Ptr<'guard, Entry<N>> = self.cells[index].load(Acquire, guard);

      match decode(ptr) {
        Slot::Empty => return candidate.or(Some((index, ptr))),
        Slot::Tombstone => {
          if candidate.is_none() {
            candidate = Some((index, ptr));
          }
        }
        Slot::Occupied(entry) => {
          if entry.hash == hash && entry.node.key() == key {
            return None;
          }
        }
      }
    }

    candidate
  }

  /// Builds a fresh array of the given capacity holding this array's live
  /// entries.
  ///
  /// Entries are re-placed by their cached hash and are not re-allocated;
  /// tombstones do not migrate. The fresh array is private to the caller
  /// until it publishes it.
  pub(crate) fn rebuilt(&self, prime_index: usize, guard: &Guard) -> Self {
    let next: Self = Self::new(prime_index);

    for cell in &self.cells {
      if let Some(entry) = cell.get_shared(Acquire, guard) {
        let index: usize = next.place(entry.hash, guard);
        let previous = next.cells[index].swap((Some(entry), Tag::None), Relaxed);

        debug_assert!(previous.0.is_none(), "fresh slot is already occupied");
      }
    }

    next
  }

  /// First free slot for `hash` in an array with no tombstones.
  fn place(&self, hash: u32, guard: &Guard) -> usize {
    for index in self.probe(hash) {
      if self.cells[index].load(Relaxed, guard).is_null() {
        return index;
      }
    }

    // A rebuilt array is sized from the live count, so a free slot exists for
    // every entry.
    unreachable!("no free slot in a rebuilt array")
  }
}
