//! Count-bounded uniform sampling without replacement.

use indexmap::IndexSet;
use rand::Rng;

/// How many elements of a pool a policy takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Count {
    /// Take nothing.
    None,
    /// Take the whole pool.
    All,
    /// Take up to `n` elements.
    Exactly(usize),
}

impl Count {
    /// Number of elements taken from a pool of `len`.
    pub fn bound(self, len: usize) -> usize {
        match self {
            Self::None => 0,
            Self::All => len,
            Self::Exactly(n) => n.min(len),
        }
    }
}

/// Indices of a uniform sample of `n` distinct elements from `0..len`,
/// in ascending order.
///
/// Draws indices and deduplicates through a set until it holds `n`
/// of them. `n` is clamped to `len` first, so the loop always ends.
pub fn sample_indices<R: Rng + ?Sized>(len: usize, n: usize, rng: &mut R) -> Vec<usize> {
    let n = n.min(len);
    if n == len {
        return (0..len).collect();
    }
    let mut picked = IndexSet::with_capacity(n);
    while picked.len() < n {
        picked.insert(rng.gen_range(0..len));
    }
    let mut out: Vec<usize> = picked.into_iter().collect();
    out.sort_unstable();
    out
}

/// Apply `count` to `pool`.
///
/// - `None` takes nothing.
/// - `All`, or a pool no larger than the requested size, takes everything.
/// - Otherwise a uniform sample without replacement is drawn. Pool order
///   is preserved in the output.
pub fn sample<T: Clone, R: Rng + ?Sized>(pool: &[T], count: Count, rng: &mut R) -> Vec<T> {
    match count {
        Count::None => Vec::new(),
        Count::All => pool.to_vec(),
        Count::Exactly(n) if n >= pool.len() => pool.to_vec(),
        Count::Exactly(n) => sample_indices(pool.len(), n, rng)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect(),
    }
}
