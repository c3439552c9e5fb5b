//! Exact similarity functions on sorted token sets.
//!
//! Every function takes two slices sorted in ascending order without duplicates, such as
//! the rank sequences produced by [`TokenOrdering::order`](crate::TokenOrdering::order).
//! Two empty sets have similarity `1.0`; an empty and a non-empty set have similarity `0.0`.
use std::cmp::Ordering;

/// Counts the elements shared by two sorted sets.
///
/// # Examples
///
/// ```
/// use set_sim_join::simfunc::overlap_size;
///
/// assert_eq!(overlap_size(&[1, 2, 4, 8], &[2, 3, 4]), 2);
/// ```
pub fn overlap_size<T: Ord>(x: &[T], y: &[T]) -> usize {
    let (mut i, mut j, mut overlap) = (0, 0, 0);
    while i < x.len() && j < y.len() {
        match x[i].cmp(&y[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                overlap += 1;
                i += 1;
                j += 1;
            }
        }
    }
    overlap
}

#[inline(always)]
fn empty_convention<T>(x: &[T], y: &[T]) -> Option<f64> {
    match (x.is_empty(), y.is_empty()) {
        (true, true) => Some(1.),
        (true, false) | (false, true) => Some(0.),
        (false, false) => None,
    }
}

/// Computes the Jaccard similarity.
pub fn jaccard<T: Ord>(x: &[T], y: &[T]) -> f64 {
    if let Some(sim) = empty_convention(x, y) {
        return sim;
    }
    let overlap = overlap_size(x, y);
    overlap as f64 / (x.len() + y.len() - overlap) as f64
}

/// Computes the cosine similarity of the binary vectors of two sets.
pub fn cosine<T: Ord>(x: &[T], y: &[T]) -> f64 {
    if let Some(sim) = empty_convention(x, y) {
        return sim;
    }
    overlap_size(x, y) as f64 / ((x.len() * y.len()) as f64).sqrt()
}

/// Computes the Dice similarity.
pub fn dice<T: Ord>(x: &[T], y: &[T]) -> f64 {
    if let Some(sim) = empty_convention(x, y) {
        return sim;
    }
    2. * overlap_size(x, y) as f64 / (x.len() + y.len()) as f64
}

/// Computes the overlap, i.e., the number of shared elements.
pub fn overlap<T: Ord>(x: &[T], y: &[T]) -> f64 {
    if let Some(sim) = empty_convention(x, y) {
        return sim;
    }
    overlap_size(x, y) as f64
}
