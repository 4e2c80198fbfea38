//! A concurrently readable node store.
//!
//! `nodetab` provides [`NodeTab`], an in-memory associative store mapping
//! structured node identifiers to polymorphic node records, the
//! address-space backing of an OPC UA-style information-model server. It is
//! optimized for read-heavy workloads: lookups, pins, and iteration are
//! lock-free and safe to run from any thread while a writer mutates the
//! table.
//!
//! # Overview
//!
//! The table is open-addressed with double hashing over a prime capacity
//! ladder, growing past 3/4 load and shrinking below 1/8. Nodes enter the
//! table through a staging handle, are looked up as pinned read-only
//! borrows, and are updated copy-on-write: mutate a private deep copy, then
//! publish it atomically over the entry it was taken from.
//!
//! # Usage
//!
//! ```
//! use nodetab::NodeTab;
//! use nodetab::model::{Node, NodeClass, NodeId};
//!
//! let tab: NodeTab<Node> = NodeTab::new();
//!
//! // Stage a node, give it an identifier, publish it.
//! let mut node = tab.new_node(NodeClass::Variable);
//! node.set_id(NodeId::numeric(1, 2025));
//! node.set_browse_name("Temperature");
//! let id = tab.insert(node)?;
//!
//! // Pinned, read-only access.
//! let pinned = tab.get(&id).unwrap();
//! assert_eq!(pinned.browse_name(), "Temperature");
//! drop(pinned);
//!
//! // Copy-on-write update.
//! let mut copy = tab.get_copy(&id)?;
//! copy.set_display_name("Boiler inlet temperature");
//! tab.replace(copy)?;
//!
//! tab.remove(&id)?;
//! assert!(tab.get(&id).is_none());
//! # Ok::<(), nodetab::Error>(())
//! ```
//!
//! # Custom node types
//!
//! The store is generic: implement [`NodeKey`] for your identifier type and
//! [`NodeRecord`] for your node type. The [`model`] module is a complete
//! reference implementation used by the examples and tests.
//!
//! # Concurrency
//!
//! One writer at a time mutates the table (mutating calls serialize on an
//! internal lock); readers never block and never take it. A pinned borrow
//! obtained from [`NodeTab::get`] or iteration remains valid, and unchanged,
//! for as long as it is held, regardless of concurrent removal,
//! replacement, or resizing.
//!
//! ```no_run
//! use std::thread;
//!
//! use nodetab::NodeTab;
//! use nodetab::model::{Node, NodeClass, NodeId};
//!
//! let tab: NodeTab<Node> = NodeTab::new();
//!
//! thread::scope(|scope| {
//!   scope.spawn(|| {
//!     for value in 1..1000 {
//!       let mut node = tab.new_node(NodeClass::Variable);
//!       node.set_id(NodeId::numeric(1, value));
//!       let id = tab.insert(node).unwrap();
//!       tab.remove(&id).unwrap();
//!     }
//!   });
//!
//!   scope.spawn(|| {
//!     for value in 1..1000 {
//!       // Runs against the live table without locking.
//!       let _ = tab.get(&NodeId::numeric(1, value));
//!     }
//!   });
//! });
//! ```
//!
//! # Memory Reclamation
//!
//! Removed and replaced nodes are reclaimed through epoch-based memory
//! management via [`sdd`]: readers that still hold a pin, or are mid-probe
//! in an array that has since been resized away, finish safely, and the
//! memory is freed once every such reader has moved on.
//!
//! [`sdd`]: https://docs.rs/sdd

mod entry;
mod error;
mod padded;
mod primes;
mod public;
mod record;
mod slots;
mod store;

pub mod model;

#[cfg(test)]
mod tests;

pub mod implementation {
  #![doc = include_str!("../IMPLEMENTATION.md")]
}

pub use self::entry::FreshNode;
pub use self::entry::NodeCopy;
pub use self::entry::NodeRef;
pub use self::error::Error;
pub use self::public::NodeTab;
pub use self::record::NodeKey;
pub use self::record::NodeRecord;
pub use self::store::Iter;
