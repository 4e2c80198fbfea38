//! Cache-line padding to prevent false sharing.

use core::ops::Deref;
use core::ops::DerefMut;

/// Pads and aligns a value to the length of a cache line.
///
/// The alignment values follow the scheme used by [`crossbeam-utils`]:
/// 128 bytes where adjacent cache lines are prefetched in pairs, 64 bytes
/// elsewhere.
///
/// [`crossbeam-utils`]: https://crates.io/crates/crossbeam-utils
#[cfg_attr(
  any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "powerpc64",
  ),
  repr(align(128))
)]
#[cfg_attr(
  not(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "powerpc64",
  )),
  repr(align(64))
)]
#[derive(Debug, Default)]
pub(crate) struct CachePadded<T> {
  value: T,
}

impl<T> CachePadded<T> {
  #[inline]
  pub(crate) const fn new(value: T) -> Self {
    Self { value }
  }
}

impl<T> Deref for CachePadded<T> {
  type Target = T;

  #[inline]
  fn deref(&self) -> &T {
    &self.value
  }
}

impl<T> DerefMut for CachePadded<T> {
  #[inline]
  fn deref_mut(&mut self) -> &mut T {
    &mut self.value
  }
}
