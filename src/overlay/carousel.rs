//! Sample carousel navigation
//!
//! The session stores whatever index was requested. The presentation layer
//! folds it back into the sample set here and re-selects that image.

/// Fold any raw index into `0..count`, wrapping in both directions
///
/// Returns `None` when there are no samples.
pub fn wrap_index(raw: i64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    // rem_euclid with a positive divisor is always in 0..count
    Some(raw.rem_euclid(count) as usize)
}
