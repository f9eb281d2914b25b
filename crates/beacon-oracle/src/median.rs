//! Median of signed words.
//!
//! For an odd number of values the median is the middle element of the
//! sorted sequence. For an even number it is the mean of the two middle
//! elements, truncated toward zero ([`SignedWord::average`]).
//!
//! [`median_in_place`] finds the middle element(s) with quickselect instead
//! of a full sort. Its result is identical to [`median_by_sort`] for every
//! ordering of the same multiset; [`median`] runs it over a private copy so
//! the caller's slice is left untouched.

use std::cmp::Ordering;

use beacon_types::SignedWord;

/// Median of `values`, or `None` if `values` is empty.
///
/// The input is copied; its order is not changed.
///
/// # Examples
///
/// ```
/// use beacon_oracle::median::median;
/// use beacon_types::SignedWord;
///
/// let values: Vec<SignedWord> = [1i64, 2, 3, 4].into_iter().map(SignedWord::from).collect();
/// assert_eq!(median(&values), Some(SignedWord::from(2i64)));
/// ```
pub fn median(values: &[SignedWord]) -> Option<SignedWord> {
    let mut scratch = values.to_vec();
    median_in_place(&mut scratch)
}

/// Median of `values`, reordering the slice while selecting.
pub fn median_in_place(values: &mut [SignedWord]) -> Option<SignedWord> {
    let len = values.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    let upper = quickselect(values, mid);
    if len % 2 == 1 {
        return Some(upper);
    }
    // After selection every element left of `mid` is <= values[mid], so the
    // lower middle element is the largest of them.
    let lower = values[..mid].iter().copied().max()?;
    Some(SignedWord::average(lower, upper))
}

/// Reference median computed with a full sort.
pub fn median_by_sort(values: &[SignedWord]) -> Option<SignedWord> {
    let len = values.len();
    if len == 0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = len / 2;
    if len % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(SignedWord::average(sorted[mid - 1], sorted[mid]))
    }
}

/// Place the `k`-th smallest element at index `k` and return it.
///
/// Requires `k < values.len()`. On return, `values[..k]` are all `<=`
/// `values[k]` and `values[k + 1..]` are all `>=` it.
fn quickselect(values: &mut [SignedWord], k: usize) -> SignedWord {
    let mut lo = 0;
    let mut hi = values.len();
    loop {
        let (lt, gt) = partition(values, lo, hi);
        if k < lt {
            hi = lt;
        } else if k >= gt {
            lo = gt;
        } else {
            return values[k];
        }
    }
}

/// Three-way partition of `values[lo..hi]` around its middle element.
///
/// Returns `(lt, gt)` such that `values[lo..lt]` are smaller than the pivot,
/// `values[lt..gt]` equal it and `values[gt..hi]` are greater. The equal
/// band is never empty, so runs of identical values settle in one pass.
fn partition(values: &mut [SignedWord], lo: usize, hi: usize) -> (usize, usize) {
    let pivot = values[lo + (hi - lo) / 2];
    let mut lt = lo;
    let mut i = lo;
    let mut gt = hi;
    while i < gt {
        match values[i].cmp(&pivot) {
            Ordering::Less => {
                values.swap(i, lt);
                lt += 1;
                i += 1;
            }
            Ordering::Greater => {
                gt -= 1;
                values.swap(i, gt);
            }
            Ordering::Equal => i += 1,
        }
    }
    (lt, gt)
}
