//! Collaborator traits: what the host must provide for its identifiers and
//! node records.
//!
//! The store is generic over the node type. It never inspects a node beyond
//! the embedded identifier, and it never hashes or compares identifiers
//! itself; both are obligations of the host, expressed here.

use crate::error::Error;

/// A node identifier with host-defined hashing and equality.
///
/// # Contract
///
/// - [`hash32`] must be stable for the lifetime of a key and agree with
///   equality: equal keys hash identically.
/// - [`is_unassigned`] reports the "assign me" form: a numeric-subtype
///   identifier with value zero. [`insert`] replaces such keys with a fresh
///   numeric identifier before publication.
/// - [`with_numeric`] derives a key from `self` with the numeric value
///   replaced, preserving everything else (in particular the namespace).
///
/// [`hash32`]: NodeKey::hash32
/// [`is_unassigned`]: NodeKey::is_unassigned
/// [`with_numeric`]: NodeKey::with_numeric
/// [`insert`]: crate::NodeTab::insert
pub trait NodeKey: Clone + Eq {
  /// Returns the 32-bit hash of this key.
  fn hash32(&self) -> u32;

  /// Returns `true` if this key requests identifier assignment on insert.
  fn is_unassigned(&self) -> bool;

  /// Returns a copy of this key with its numeric value replaced.
  fn with_numeric(&self, numeric: u32) -> Self;
}

/// A polymorphic node record stored in the table.
///
/// The record's class tag fixes its variant; the store only ever constructs
/// records through [`with_class`] and reads them through [`key`].
///
/// [`with_class`]: NodeRecord::with_class
/// [`key`]: NodeRecord::key
pub trait NodeRecord: Sized + 'static {
  /// The identifier type embedded in this record.
  type Key: NodeKey;

  /// The class tag selecting the record variant.
  type Class: Copy;

  /// Creates a blank record of the given class with an unassigned key.
  fn with_class(class: Self::Class) -> Self;

  /// Returns the embedded identifier.
  fn key(&self) -> &Self::Key;

  /// Replaces the embedded identifier.
  fn set_key(&mut self, key: Self::Key);

  /// Deep-copies this record.
  ///
  /// # Errors
  ///
  /// Implementations may fail with [`Error::OutOfMemory`] or
  /// [`Error::BadEncoding`]; the store propagates either from
  /// [`get_copy`](crate::NodeTab::get_copy) without interpretation.
  fn try_clone(&self) -> Result<Self, Error>;
}
