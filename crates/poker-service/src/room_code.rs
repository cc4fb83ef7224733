//! Short human-readable codes for rooms and voting sessions.

use rand::seq::SliceRandom;
use rand::Rng;

/// Code alphabet: digits and uppercase ASCII letters.
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of every generated code.
pub const CODE_LEN: usize = 6;

/// Generate a code using the thread-local RNG.
#[must_use]
pub fn generate_room_id() -> String {
    generate_with(&mut rand::thread_rng())
}

/// Generate a code from the given RNG.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .filter_map(|_| ALPHABET.choose(rng).map(|&byte| char::from(byte)))
        .collect()
}
