//! Core store implementation.
//!
//! One writer at a time mutates the table; any number of readers may run
//! concurrently without taking a lock. Mutating operations serialize on an
//! internal mutex, publish through release-ordered CAS on the slot cells, and
//! retire superseded entries and arrays through epoch-based reclamation via
//! [`sdd`], so readers that still see the old state finish safely.
//!
//! [`sdd`]: https://docs.rs/sdd

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::AcqRel;
use core::sync::atomic::Ordering::Acquire;
use core::sync::atomic::Ordering::Relaxed;
use core::sync::atomic::Ordering::Release;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use sdd::AtomicShared;
use sdd::Guard;
use sdd::Ptr;
use sdd::Shared;
use sdd::Tag;

use crate::entry::Entry;
use crate::entry::NodeCopy;
use crate::entry::NodeRef;
use crate::error::Error;
use crate::padded::CachePadded;
use crate::primes::INITIAL_PRIME_INDEX;
use crate::primes::MIN_CAPACITY;
use crate::primes::higher_prime_index;
use crate::record::NodeKey;
use crate::record::NodeRecord;
use crate::slots::SlotArray;

// -----------------------------------------------------------------------------
// Store State
// -----------------------------------------------------------------------------

pub(crate) struct Store<N: NodeRecord> {
  volatile: CachePadded<Volatile>,
  array: CachePadded<AtomicShared<SlotArray<N>>>,
}

/// Writer-side state, padded away from the array pointer the readers hammer.
struct Volatile {
  /// Number of occupied slots; tombstones are not counted.
  count: AtomicU32,
  /// Serializes mutating operations. Readers never take it.
  writer: Mutex<()>,
}

impl<N: NodeRecord> Store<N> {
  pub(crate) fn new() -> Self {
    Self {
      volatile: CachePadded::new(Volatile {
        count: AtomicU32::new(0),
        writer: Mutex::new(()),
      }),
      array: CachePadded::new(AtomicShared::new(SlotArray::new(INITIAL_PRIME_INDEX))),
    }
  }

  #[inline]
  pub(crate) fn len(&self) -> u32 {
    self.volatile.count.load(Relaxed)
  }

  #[inline]
  pub(crate) fn capacity(&self) -> u32 {
    self.slots(&Guard::new()).size()
  }

  /// The currently published slot array.
  #[inline]
  fn slots<'guard>(&self, guard: &'guard Guard) -> &'guard SlotArray<N> {
    // Set at construction and only ever swapped for another array.
    self
      .array
      .load(Acquire, guard)
      .as_ref()
      .expect("slot array pointer is never null")
  }

  #[inline]
  fn lock_writer(&self) -> MutexGuard<'_, ()> {
    // A poisoned lock means a writer panicked, not that the table is torn:
    // every publication step is a single CAS.
    self
      .volatile
      .writer
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  // ---------------------------------------------------------------------------
  // Readers
  // ---------------------------------------------------------------------------

  /// Pins the entry holding `key`.
  pub(crate) fn pin(&self, key: &N::Key) -> Option<Shared<Entry<N>>> {
    let hash: u32 = key.hash32();
    let guard: Guard = Guard::new();

    loop {
      let slots: &SlotArray<N> = self.slots(&guard);
      let (index, _) = slots.find_occupied(key, hash, &guard)?;

      let Some(entry) = slots.cell(index).get_shared(Acquire, &guard) else {
        // Vacated between the probe and the pin; take a fresh look.
        continue;
      };

      if entry.hash == hash && entry.node.key() == key {
        return Some(entry);
      }

      // The slot was reused for a different key in the meantime.
    }
  }

  pub(crate) fn contains(&self, key: &N::Key) -> bool {
    let guard: Guard = Guard::new();

    self
      .slots(&guard)
      .find_occupied(key, key.hash32(), &guard)
      .is_some()
  }

  pub(crate) fn get_copy(&self, key: &N::Key) -> Result<NodeCopy<N>, Error> {
    let orig: Shared<Entry<N>> = self.pin(key).ok_or(Error::NodeIdUnknown)?;
    let node: N = orig.node.try_clone()?;

    Ok(NodeCopy {
      node,
      hash: orig.hash,
      orig,
    })
  }

  pub(crate) fn iter(&self) -> Iter<'_, N> {
    let guard: Guard = Guard::new();

    Iter {
      array: self
        .array
        .get_shared(Acquire, &guard)
        .expect("slot array pointer is never null"),
      index: 0,
      table: PhantomData,
    }
  }

  // ---------------------------------------------------------------------------
  // Writers
  // ---------------------------------------------------------------------------

  pub(crate) fn insert(&self, mut node: N) -> Result<N::Key, Error> {
    let writer: MutexGuard<'_, ()> = self.lock_writer();
    let guard: Guard = Guard::new();

    // Grow ahead of the insert so the probe below sees the final geometry.
    if u64::from(self.slots(&guard).size()) * 3 <= u64::from(self.len()) * 4 {
      self.expand(&guard);
    }

    let slots: &SlotArray<N> = self.slots(&guard);

    let (index, observed, hash) = if node.key().is_unassigned() {
      self.assign_identifier(slots, &mut node, &guard)?
    } else {
      let hash: u32 = node.key().hash32();

      match slots.find_insert_slot(node.key(), hash, &guard) {
        Some((index, observed)) => (index, observed, hash),
        None => return Err(Error::NodeIdExists),
      }
    };

    let key: N::Key = node.key().clone();
    let entry: Shared<Entry<N>> = Shared::new(Entry::new(hash, node));

    let result = slots.cell(index).compare_exchange(
      observed,
      (Some(entry), Tag::None),
      AcqRel,
      Acquire,
      &guard,
    );

    match result {
      Ok(_) => {
        self.volatile.count.fetch_add(1, Relaxed);
        drop(writer);

        Ok(key)
      }
      // The slot changed under the writer lock; the staged entry is dropped
      // with the error.
      Err(_) => Err(Error::Internal),
    }
  }

  /// Picks a fresh numeric identifier for a node inserted with the
  /// "assign me" key form, and reserves its slot.
  ///
  /// Candidates start at `50_000 + size + 1` and advance by a count-derived
  /// step with the table size as the wrap bound, so the candidate set is a
  /// residue class covering every slot once before it repeats.
  fn assign_identifier<'guard>(
    &self,
    slots: &'guard SlotArray<N>,
    node: &mut N,
    guard: &'guard Guard,
  ) -> Result<(usize, Ptr<'guard, Entry<N>>, u32), Error> {
    let size: u32 = slots.size();
    let step: u32 = 1 + self.len().wrapping_add(1) % (size - 2);
    let mut identifier: u32 = 50_000_u32.wrapping_add(size).wrapping_add(1);

    for _ in 0..size {
      let key: N::Key = node.key().with_numeric(identifier);
      let hash: u32 = key.hash32();

      if let Some((index, observed)) = slots.find_insert_slot(&key, hash, guard) {
        node.set_key(key);

        return Ok((index, observed, hash));
      }

      identifier = identifier.wrapping_add(step);

      if identifier >= size {
        identifier -= size;
      }
    }

    Err(Error::NodeIdExists)
  }

  pub(crate) fn replace(&self, copy: NodeCopy<N>) -> Result<(), Error> {
    let NodeCopy { node, hash, orig } = copy;

    let writer: MutexGuard<'_, ()> = self.lock_writer();
    let guard: Guard = Guard::new();
    let slots: &SlotArray<N> = self.slots(&guard);

    let (index, current) = slots
      .find_occupied(node.key(), hash, &guard)
      .ok_or(Error::NodeIdUnknown)?;

    // A different occupant means the key was replaced or removed and
    // re-inserted since the copy was taken. The copy is stale; the caller
    // re-reads and retries.
    if current != orig.get_guarded_ptr(&guard) {
      return Err(Error::Internal);
    }

    let entry: Shared<Entry<N>> = Shared::new(Entry::new(hash, node));

    let result = slots.cell(index).compare_exchange(
      current,
      (Some(entry), Tag::None),
      AcqRel,
      Acquire,
      &guard,
    );

    match result {
      Ok((superseded, _)) => {
        // Retired once outstanding pins are gone.
        drop(superseded);
        drop(orig);
        drop(writer);

        Ok(())
      }
      Err(_) => Err(Error::Internal),
    }
  }

  pub(crate) fn remove(&self, key: &N::Key) -> Result<(), Error> {
    let hash: u32 = key.hash32();

    let writer: MutexGuard<'_, ()> = self.lock_writer();
    let guard: Guard = Guard::new();
    let slots: &SlotArray<N> = self.slots(&guard);

    let (index, current) = slots
      .find_occupied(key, hash, &guard)
      .ok_or(Error::NodeIdUnknown)?;

    let result =
      slots
        .cell(index)
        .compare_exchange(current, (None, Tag::First), AcqRel, Acquire, &guard);

    match result {
      Ok((removed, _)) => {
        drop(removed);
        self.volatile.count.fetch_sub(1, Relaxed);

        // Downsize when the table got very empty. Never fatal.
        let count: u32 = self.len();
        let size: u32 = slots.size();

        if u64::from(count) * 8 < u64::from(size) && size > 32 {
          self.expand(&guard);
        }

        drop(writer);

        Ok(())
      }
      Err(_) => Err(Error::Internal),
    }
  }

  /// Rebuilds the slot array at a capacity fitted to the live count.
  ///
  /// Skips the rebuild while the table is neither too full nor too empty,
  /// with [`MIN_CAPACITY`] as the shrink floor. Must be called with the
  /// writer lock held.
  fn expand(&self, guard: &Guard) {
    let slots: &SlotArray<N> = self.slots(guard);
    let count: u32 = self.len();
    let size: u32 = slots.size();

    if u64::from(count) * 2 < u64::from(size)
      && (u64::from(count) * 8 > u64::from(size) || size <= MIN_CAPACITY)
    {
      return;
    }

    let next: SlotArray<N> = slots.rebuilt(higher_prime_index(count.saturating_mul(2)), guard);
    let previous = self.array.swap((Some(Shared::new(next)), Tag::None), Release);

    // Readers that captured the old array keep probing it until their guards
    // drop; the epoch collector reclaims it after that.
    drop(previous);
  }

  pub(crate) fn clear(&mut self) {
    let previous = self.array.swap(
      (Some(Shared::new(SlotArray::new(INITIAL_PRIME_INDEX))), Tag::None),
      Release,
    );

    drop(previous);
    self.volatile.count.store(0, Relaxed);
  }
}

impl<N> Debug for Store<N>
where
  N: NodeRecord + Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let guard: Guard = Guard::new();
    let slots: &SlotArray<N> = self.slots(&guard);
    let mut debug = f.debug_map();

    for index in 0..slots.size() as usize {
      if let Some(entry) = slots.cell(index).load(Acquire, &guard).as_ref() {
        debug.entry(&index, &entry.node);
      }
    }

    debug.finish()
  }
}

// -----------------------------------------------------------------------------
// Iterator
// -----------------------------------------------------------------------------

/// A weakly consistent iterator over the nodes in a [`NodeTab`].
///
/// Scans the slot array that was published when the iterator was created and
/// pins each occupied entry as it is yielded. Entries inserted or removed
/// during the scan may or may not be observed; no entry is yielded twice.
///
/// [`NodeTab`]: crate::NodeTab
pub struct Iter<'tab, N: NodeRecord> {
  array: Shared<SlotArray<N>>,
  index: usize,
  table: PhantomData<&'tab ()>,
}

impl<'tab, N: NodeRecord> Iterator for Iter<'tab, N> {
  type Item = NodeRef<'tab, N>;

  fn next(&mut self) -> Option<Self::Item> {
    let guard: Guard = Guard::new();

    while self.index < self.array.size() as usize {
      let index: usize = self.index;

      self.index += 1;

      if let Some(entry) = self.array.cell(index).get_shared(Acquire, &guard) {
        return Some(NodeRef::new(entry));
      }
    }

    None
  }
}
