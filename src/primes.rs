//! Table geometry: the prime capacity ladder.
//!
//! Slot arrays are always sized by a prime so the double-hashing step is
//! coprime to the capacity and a probe cycle visits every slot exactly once.

/// The smallest load the table is created for.
///
/// The initial capacity is the smallest ladder prime that is at least this
/// large. Arrays at or below this size are never shrunk further.
pub(crate) const MIN_CAPACITY: u32 = 64;

/// Ascending capacity ladder: the largest prime below each power of two, up
/// to the 32-bit range.
pub(crate) const PRIMES: [u32; 29] = [
  7,
  13,
  31,
  61,
  127,
  251,
  509,
  1021,
  2039,
  4093,
  8191,
  16381,
  32749,
  65521,
  131071,
  262139,
  524287,
  1048573,
  2097143,
  4194301,
  8388593,
  16777213,
  33554393,
  67108859,
  134217689,
  268435399,
  536870909,
  1073741789,
  2147483647,
];

/// Ladder index of the initial capacity.
pub(crate) const INITIAL_PRIME_INDEX: usize = higher_prime_index(MIN_CAPACITY);

/// Returns the smallest ladder index whose prime is `>= n`.
///
/// Requests beyond the largest ladder prime saturate at the last index.
pub(crate) const fn higher_prime_index(n: u32) -> usize {
  let mut low: usize = 0;
  let mut high: usize = PRIMES.len();

  while low != high {
    let mid: usize = low + (high - low) / 2;

    if n > PRIMES[mid] {
      low = mid + 1;
    } else {
      high = mid;
    }
  }

  if low == PRIMES.len() { PRIMES.len() - 1 } else { low }
}

const _: () = assert!(
  PRIMES[INITIAL_PRIME_INDEX] >= MIN_CAPACITY,
  "invalid ladder: initial capacity below the minimum",
);
