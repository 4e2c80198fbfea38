//! Entry records and the handles through which callers hold them.
//!
//! An [`Entry`] wraps a node together with its cached key hash. Published
//! entries are owned by their slot and by any outstanding pins; reclamation is
//! deferred through [`sdd`] until the last holder is gone, so a pinned node
//! stays valid across concurrent removal or replacement.
//!
//! [`sdd`]: https://docs.rs/sdd

use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ops::DerefMut;

use sdd::Shared;

use crate::record::NodeRecord;

/// A node plus the table metadata cached alongside it.
///
/// The hash is computed once at publication and reused by probes and by
/// rebuilds, so re-placement never re-hashes a key.
pub(crate) struct Entry<N> {
  pub(crate) hash: u32,
  pub(crate) node: N,
}

impl<N> Entry<N> {
  #[inline]
  pub(crate) const fn new(hash: u32, node: N) -> Self {
    Self { hash, node }
  }
}

// -----------------------------------------------------------------------------
// Fresh Node
// -----------------------------------------------------------------------------

/// An unpublished node produced by [`NodeTab::new_node`].
///
/// The caller owns the node exclusively and may mutate it freely through
/// `DerefMut`. Feeding it to [`NodeTab::insert`] publishes it; dropping it
/// discards it. There is no other way out, so a `FreshNode` can never be
/// confused with a copy taken from the table.
///
/// [`NodeTab::new_node`]: crate::NodeTab::new_node
/// [`NodeTab::insert`]: crate::NodeTab::insert
pub struct FreshNode<N> {
  node: N,
}

impl<N: NodeRecord> FreshNode<N> {
  #[inline]
  pub(crate) fn new(class: N::Class) -> Self {
    Self {
      node: N::with_class(class),
    }
  }

  /// Unwraps the node without publishing it.
  #[inline]
  pub fn into_inner(self) -> N {
    self.node
  }
}

impl<N> Deref for FreshNode<N> {
  type Target = N;

  #[inline]
  fn deref(&self) -> &N {
    &self.node
  }
}

impl<N> DerefMut for FreshNode<N> {
  #[inline]
  fn deref_mut(&mut self) -> &mut N {
    &mut self.node
  }
}

impl<N: Debug> Debug for FreshNode<N> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("FreshNode").field(&self.node).finish()
  }
}

// -----------------------------------------------------------------------------
// Node Copy
// -----------------------------------------------------------------------------

/// An unpublished deep copy produced by [`NodeTab::get_copy`].
///
/// The copy is mutable through `DerefMut` and invisible to readers until
/// [`NodeTab::replace`] succeeds. It keeps a handle to the entry it was copied
/// from; `replace` compares that handle against the current slot occupant to
/// detect that the copy has gone stale.
///
/// [`NodeTab::get_copy`]: crate::NodeTab::get_copy
/// [`NodeTab::replace`]: crate::NodeTab::replace
pub struct NodeCopy<N> {
  pub(crate) node: N,
  pub(crate) hash: u32,
  pub(crate) orig: Shared<Entry<N>>,
}

impl<N> Deref for NodeCopy<N> {
  type Target = N;

  #[inline]
  fn deref(&self) -> &N {
    &self.node
  }
}

impl<N> DerefMut for NodeCopy<N> {
  #[inline]
  fn deref_mut(&mut self) -> &mut N {
    &mut self.node
  }
}

impl<N: Debug> Debug for NodeCopy<N> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("NodeCopy").field(&self.node).finish()
  }
}

// -----------------------------------------------------------------------------
// Node Ref
// -----------------------------------------------------------------------------

/// A pinned, read-only borrow of a published node.
///
/// Returned by [`NodeTab::get`] and yielded by [`NodeTab::iter`]. The pin
/// keeps the node valid even if it is removed or replaced while the handle is
/// held; dropping the handle releases the pin. The borrow ties the handle to
/// the table, so a table cannot be cleared or dropped while pins are
/// outstanding.
///
/// [`NodeTab::get`]: crate::NodeTab::get
/// [`NodeTab::iter`]: crate::NodeTab::iter
pub struct NodeRef<'tab, N> {
  entry: Shared<Entry<N>>,
  table: PhantomData<&'tab ()>,
}

impl<'tab, N> NodeRef<'tab, N> {
  #[inline]
  pub(crate) fn new(entry: Shared<Entry<N>>) -> Self {
    Self {
      entry,
      table: PhantomData,
    }
  }
}

impl<N> Deref for NodeRef<'_, N> {
  type Target = N;

  #[inline]
  fn deref(&self) -> &N {
    &self.entry.node
  }
}

impl<N: Debug> Debug for NodeRef<'_, N> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("NodeRef").field(&self.entry.node).finish()
  }
}
