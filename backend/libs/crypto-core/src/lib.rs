//! Token primitives shared by services: signed access tokens and random
//! opaque tokens.

pub mod jwt;

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

/// Generate a random alphanumeric token of `len` characters from the OS RNG.
pub fn random_token(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
