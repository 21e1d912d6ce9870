//! Injectable randomness.
//!
//! Every random decision a room makes (room codes, player id suffixes, the
//! theme draw, vote tie-breaks, secret numbers) goes through a
//! [`RandomSource`]. Production uses [`ThreadRandom`]; tests seed a
//! [`SeededRandom`] so that draws are reproducible.

use std::sync::{Mutex, PoisonError};

use ito_protocol::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform random indices.
///
/// One primitive is enough: every draw in this crate reduces to "pick a
/// position in a slice". Shared by all room actors, hence `Send + Sync`.
pub trait RandomSource: Send + Sync + 'static {
    /// Returns a uniformly random value in `0..bound`.
    ///
    /// `bound` is always greater than zero.
    fn index(&self, bound: usize) -> usize;
}

/// Thread-local OS-seeded generator (`rand::rng()`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

/// A deterministic generator for tests and replays.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, bound: usize) -> usize {
        // A panic elsewhere can't leave an StdRng in a broken state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(0..bound)
    }
}

/// Draws a fresh room code. The caller checks it against active rooms.
pub fn room_code(rng: &dyn RandomSource) -> RoomCode {
    let raw: String = (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.index(ROOM_CODE_ALPHABET.len())] as char)
        .collect();
    // Built from the alphabet, so it always parses.
    RoomCode::parse(&raw).unwrap_or_else(|_| unreachable!("generated code {raw} is well formed"))
}

/// A lowercase alphanumeric string of `len` characters.
pub fn alnum_suffix(rng: &dyn RandomSource, len: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..len)
        .map(|_| ALPHABET[rng.index(ALPHABET.len())] as char)
        .collect()
}

/// Picks `count` distinct indices from `0..len` (partial Fisher–Yates).
///
/// Returns fewer than `count` indices only when `len < count`.
pub fn sample_indices(rng: &dyn RandomSource, len: usize, count: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..len).collect();
    let take = count.min(len);
    for i in 0..take {
        let j = i + rng.index(len - i);
        pool.swap(i, j);
    }
    pool.truncate(take);
    pool
}

/// A uniform integer in `min..=max`.
pub fn number_in(rng: &dyn RandomSource, min: u32, max: u32) -> u32 {
    let span = (max - min) as usize + 1;
    min + rng.index(span) as u32
}
