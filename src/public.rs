use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::entry::FreshNode;
use crate::entry::NodeCopy;
use crate::entry::NodeRef;
use crate::error::Error;
use crate::record::NodeRecord;
use crate::store::Iter;
use crate::store::Store;

/// A concurrently readable node store.
///
/// `NodeTab` maps node identifiers to polymorphic node records of type `N`.
/// Lookups, pins, and iteration are lock-free and may run from any thread
/// while another thread mutates the table; mutating operations serialize on
/// an internal lock.
///
/// See the [crate-level documentation] for an overview and examples.
///
/// # Type Parameters
///
/// - `N`: The node record type, implementing [`NodeRecord`].
///
/// # Examples
///
/// ```
/// use nodetab::NodeTab;
/// use nodetab::model::{Node, NodeClass, NodeId};
///
/// let tab: NodeTab<Node> = NodeTab::new();
///
/// let mut node = tab.new_node(NodeClass::Variable);
/// node.set_id(NodeId::numeric(1, 42));
/// let id = tab.insert(node)?;
///
/// assert!(tab.contains(&id));
/// # Ok::<(), nodetab::Error>(())
/// ```
///
/// [crate-level documentation]: crate
#[repr(transparent)]
pub struct NodeTab<N>
where
  N: NodeRecord,
{
  inner: Store<N>,
}

impl<N> NodeTab<N>
where
  N: NodeRecord,
{
  /// Creates a new, empty table at the initial capacity.
  ///
  /// # Examples
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::Node;
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  /// assert!(tab.is_empty());
  /// ```
  #[inline]
  pub fn new() -> Self {
    Self {
      inner: Store::new(),
    }
  }

  /// Returns the number of nodes currently in the table.
  ///
  /// May change immediately due to concurrent operations.
  #[inline]
  pub fn len(&self) -> usize {
    self.inner.len() as usize
  }

  /// Returns `true` if the table contains no nodes.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the current slot capacity.
  ///
  /// Always a prime from the capacity ladder. The table grows past a load
  /// factor of 3/4 and shrinks below 1/8, so the value observed here changes
  /// as nodes come and go.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.inner.capacity() as usize
  }

  /// Returns `true` if `id` is in the table.
  ///
  /// May become stale immediately due to concurrent operations.
  #[inline]
  pub fn contains(&self, id: &N::Key) -> bool {
    self.inner.contains(id)
  }

  /// Stages a blank, unpublished node of the given class.
  ///
  /// The node is owned by the caller and invisible to readers. Fill in its
  /// identifier and attributes through the handle, then publish it with
  /// [`insert`]; dropping the handle discards it instead.
  ///
  /// # Examples
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::{Node, NodeClass, NodeId};
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  ///
  /// let mut node = tab.new_node(NodeClass::Object);
  /// node.set_id(NodeId::numeric(1, 7));
  /// node.set_browse_name("Pump");
  /// tab.insert(node)?;
  /// # Ok::<(), nodetab::Error>(())
  /// ```
  ///
  /// [`insert`]: Self::insert
  #[inline]
  pub fn new_node(&self, class: N::Class) -> FreshNode<N> {
    FreshNode::new(class)
  }

  /// Looks up `id` and pins the node for reading.
  ///
  /// Returns `None` if the identifier is not in the table. The returned
  /// handle keeps the node valid, and unchanged, even if the node is
  /// removed or replaced concurrently; drop it to release the pin.
  ///
  /// # Examples
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::{Node, NodeClass, NodeId};
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  ///
  /// let mut node = tab.new_node(NodeClass::Variable);
  /// node.set_id(NodeId::numeric(1, 42));
  /// node.set_browse_name("Temperature");
  /// let id = tab.insert(node)?;
  ///
  /// let pinned = tab.get(&id).unwrap();
  /// assert_eq!(pinned.browse_name(), "Temperature");
  /// # Ok::<(), nodetab::Error>(())
  /// ```
  #[inline]
  pub fn get(&self, id: &N::Key) -> Option<NodeRef<'_, N>> {
    self.inner.pin(id).map(NodeRef::new)
  }

  /// Deep-copies the node holding `id` into an unpublished, mutable handle.
  ///
  /// Mutations through the handle are invisible to readers until
  /// [`replace`] publishes them. The handle remembers which entry it was
  /// copied from, so a replace that lost a race against an intervening update
  /// fails with [`Error::Internal`] instead of silently clobbering it.
  ///
  /// # Errors
  ///
  /// [`Error::NodeIdUnknown`] if `id` is absent; [`Error::OutOfMemory`] or
  /// [`Error::BadEncoding`] if the node's deep copy fails.
  ///
  /// [`replace`]: Self::replace
  #[inline]
  pub fn get_copy(&self, id: &N::Key) -> Result<NodeCopy<N>, Error> {
    self.inner.get_copy(id)
  }

  /// Publishes a staged node, consuming the handle.
  ///
  /// Returns the node's identifier. A node whose identifier is the numeric
  /// "assign me" form (value zero) is given a fresh numeric identifier,
  /// which is the one returned.
  ///
  /// The handle is consumed on every path; a failed insert discards the
  /// node.
  ///
  /// # Errors
  ///
  /// [`Error::NodeIdExists`] if the identifier is already present, or if no
  /// free identifier could be assigned; [`Error::Internal`] if publication
  /// lost an unexpected race.
  ///
  /// # Examples
  ///
  /// Identifier assignment:
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::{Node, NodeClass, NodeId};
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  ///
  /// let mut node = tab.new_node(NodeClass::Object);
  /// node.set_id(NodeId::numeric(1, 0)); // value zero: assign one
  /// let id = tab.insert(node)?;
  ///
  /// assert_ne!(id, NodeId::numeric(1, 0));
  /// assert!(tab.contains(&id));
  /// # Ok::<(), nodetab::Error>(())
  /// ```
  #[inline]
  pub fn insert(&self, node: FreshNode<N>) -> Result<N::Key, Error> {
    self.inner.insert(node.into_inner())
  }

  /// Publishes a mutated copy over the entry it was taken from, consuming
  /// the handle.
  ///
  /// The swap is atomic: readers observe either the old node or the new one,
  /// never a mix. Pins taken on the old node remain valid.
  ///
  /// # Errors
  ///
  /// [`Error::NodeIdUnknown`] if the identifier is no longer present;
  /// [`Error::Internal`] if the entry the copy was taken from is no longer
  /// the current occupant; re-read with [`get_copy`] and retry.
  ///
  /// # Examples
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::{Node, NodeClass, NodeId};
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  ///
  /// let mut node = tab.new_node(NodeClass::Variable);
  /// node.set_id(NodeId::numeric(1, 42));
  /// let id = tab.insert(node)?;
  ///
  /// let mut copy = tab.get_copy(&id)?;
  /// copy.set_browse_name("Pressure");
  /// tab.replace(copy)?;
  ///
  /// assert_eq!(tab.get(&id).unwrap().browse_name(), "Pressure");
  /// # Ok::<(), nodetab::Error>(())
  /// ```
  ///
  /// [`get_copy`]: Self::get_copy
  #[inline]
  pub fn replace(&self, copy: NodeCopy<N>) -> Result<(), Error> {
    self.inner.replace(copy)
  }

  /// Removes the node holding `id`.
  ///
  /// The slot is tombstoned so probe sequences stay intact. Outstanding pins
  /// keep the removed node's contents valid until they are dropped.
  ///
  /// # Errors
  ///
  /// [`Error::NodeIdUnknown`] if `id` is absent; [`Error::Internal`] if the
  /// vacation lost an unexpected race.
  ///
  /// # Examples
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::{Node, NodeClass, NodeId};
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  ///
  /// let mut node = tab.new_node(NodeClass::Variable);
  /// node.set_id(NodeId::numeric(1, 42));
  /// let id = tab.insert(node)?;
  ///
  /// tab.remove(&id)?;
  /// assert!(tab.get(&id).is_none());
  /// # Ok::<(), nodetab::Error>(())
  /// ```
  #[inline]
  pub fn remove(&self, id: &N::Key) -> Result<(), Error> {
    self.inner.remove(id)
  }

  /// Returns a weakly consistent iterator over the nodes in the table.
  ///
  /// Each yielded item is pinned for as long as it is held. Nodes inserted
  /// or removed during the scan may or may not be observed; no node is
  /// yielded twice.
  ///
  /// # Examples
  ///
  /// ```
  /// use nodetab::NodeTab;
  /// use nodetab::model::{Node, NodeClass, NodeId};
  ///
  /// let tab: NodeTab<Node> = NodeTab::new();
  ///
  /// for value in 1..=3 {
  ///   let mut node = tab.new_node(NodeClass::Variable);
  ///   node.set_id(NodeId::numeric(1, value));
  ///   tab.insert(node)?;
  /// }
  ///
  /// assert_eq!(tab.iter().count(), 3);
  /// # Ok::<(), nodetab::Error>(())
  /// ```
  #[inline]
  pub fn iter(&self) -> Iter<'_, N> {
    self.inner.iter()
  }

  /// Discards every node and resets the table to its initial capacity.
  ///
  /// Requires exclusive access, so it cannot run while pins or iterators are
  /// outstanding.
  #[inline]
  pub fn clear(&mut self) {
    self.inner.clear();
  }
}

impl<'tab, N> IntoIterator for &'tab NodeTab<N>
where
  N: NodeRecord,
{
  type Item = NodeRef<'tab, N>;
  type IntoIter = Iter<'tab, N>;

  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<N> Debug for NodeTab<N>
where
  N: NodeRecord + Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_tuple("NodeTab").field(&self.inner).finish()
  }
}

impl<N> Default for NodeTab<N>
where
  N: NodeRecord,
{
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
