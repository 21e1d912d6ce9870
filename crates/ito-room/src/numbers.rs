//! Secret number draws.

use std::collections::HashSet;

use crate::random::{RandomSource, number_in};
use crate::RoomError;

/// Draws `count` pairwise-distinct integers uniformly from `min..=max`.
///
/// Rejection sampling: redraw until an unseen value comes up. The range is
/// checked first, so the loop always terminates.
///
/// # Errors
/// Returns [`RoomError::NumberRangeExhausted`] if the range holds fewer
/// than `count` values.
pub fn draw_unique(
    count: usize,
    min: u32,
    max: u32,
    rng: &dyn RandomSource,
) -> Result<Vec<u32>, RoomError> {
    let range = if max < min { 0 } else { (max - min) as usize + 1 };
    if count > range {
        return Err(RoomError::NumberRangeExhausted {
            players: count,
            range,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    let mut numbers = Vec::with_capacity(count);
    while numbers.len() < count {
        let n = number_in(rng, min, max);
        if seen.insert(n) {
            numbers.push(n);
        }
    }
    Ok(numbers)
}
