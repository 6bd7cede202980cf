//! Balanced associative reduction.
//!
//! The original pipeline reduced per-node partial results on the GPU with a
//! pairwise tree. `fold_balanced` is the CPU stand-in: it combines items in
//! rounds of adjacent pairs, so any associative `combine` (sums, sums of
//! squares, histogram merges, normal-equation accumulators) produces the
//! same result as a sequential fold and can be parallelised later without
//! changing numerics.
//!
//! This only covers pure reductions over a snapshot of node data. Ring
//! buffer eviction inside `CyclicStat` is order-sensitive and must stay
//! serialized per cell; it is deliberately not expressible through this
//! function.

/// Reduce `items` pairwise until one value remains. Returns `identity` for
/// an empty input. `combine` must be associative.
pub fn fold_balanced<T, F>(mut items: Vec<T>, identity: T, combine: F) -> T
where
    F: Fn(T, T) -> T,
{
    while items.len() > 1 {
        let mut next = Vec::with_capacity(items.len().div_ceil(2));
        let mut it = items.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(combine(a, b)),
                None => next.push(a),
            }
        }
        items = next;
    }
    items.into_iter().next().unwrap_or(identity)
}
