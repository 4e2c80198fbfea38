
use crate::error::Error;
use crate::record::NodeKey;
use crate::record::NodeRecord;

/// Nudges the epoch collector until deferred reclamation has run.
pub(crate) fn try_reclaim() {
  // sdd reclaims after three new epochs have been observed.
  sdd::Guard::new().accelerate();
  sdd::Guard::new().accelerate();
  sdd::Guard::new().accelerate();

  drop(sdd::Guard::new());
}

// -----------------------------------------------------------------------------
// Raw test records
// -----------------------------------------------------------------------------

/// A key with a steerable hash, for directing entries at chosen slots.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RawKey {
  pub(crate) hash: u32,
  pub(crate) value: u32,
}

impl RawKey {
  pub(crate) const fn new(hash: u32, value: u32) -> Self {
    Self { hash, value }
  }
}

impl NodeKey for RawKey {
  fn hash32(&self) -> u32 {
    self.hash
  }

  fn is_unassigned(&self) -> bool {
    self.value == 0
  }

  fn with_numeric(&self, numeric: u32) -> Self {
    Self::new(numeric, numeric)
  }
}

/// A minimal record over [`RawKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawNode {
  pub(crate) key: RawKey,
  pub(crate) payload: u64,
}

impl RawNode {
  pub(crate) const fn new(hash: u32, value: u32, payload: u64) -> Self {
    Self {
      key: RawKey::new(hash, value),
      payload,
    }
  }
}

impl NodeRecord for RawNode {
  type Key = RawKey;
  type Class = ();

  fn with_class((): ()) -> Self {
    Self::new(u32::MAX, u32::MAX, 0)
  }

  fn key(&self) -> &RawKey {
    &self.key
  }

  fn set_key(&mut self, key: RawKey) {
    self.key = key;
  }

  fn try_clone(&self) -> Result<Self, Error> {
    Ok(self.clone())
  }
}
