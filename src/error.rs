//! Status codes surfaced by store operations.

use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

/// The error type returned by fallible [`NodeTab`] operations.
///
/// Key-state errors (`NodeIdUnknown`, `NodeIdExists`) report the state of the
/// table at the time of the call and are never retried internally.
/// [`Internal`] reports a conflicting concurrent update; the caller is
/// expected to re-read and retry. [`OutOfMemory`] and [`BadEncoding`] are
/// propagated from the node implementation's deep copy and never generated by
/// the store itself.
///
/// [`NodeTab`]: crate::NodeTab
/// [`Internal`]: Error::Internal
/// [`OutOfMemory`]: Error::OutOfMemory
/// [`BadEncoding`]: Error::BadEncoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
  /// A collaborator allocation failed.
  OutOfMemory,
  /// The requested NodeId is not in the table.
  NodeIdUnknown,
  /// The NodeId is already taken, or no free identifier could be assigned.
  NodeIdExists,
  /// A concurrent update conflicted with this operation.
  ///
  /// On [`replace`] this specifically means the copy is stale: the entry it
  /// was taken from has been replaced or removed since. Re-read with
  /// [`get_copy`] and retry.
  ///
  /// [`replace`]: crate::NodeTab::replace
  /// [`get_copy`]: crate::NodeTab::get_copy
  Internal,
  /// A node payload could not be decoded during a collaborator copy.
  BadEncoding,
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::OutOfMemory => f.write_str("allocation failed"),
      Self::NodeIdUnknown => f.write_str("node id is not in the table"),
      Self::NodeIdExists => f.write_str("node id is already in the table"),
      Self::Internal => f.write_str("conflicting concurrent update"),
      Self::BadEncoding => f.write_str("node payload could not be decoded"),
    }
  }
}

impl std::error::Error for Error {}
