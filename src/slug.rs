// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Random identifiers for new entries and authorization state.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of an entry slug.
pub const SLUG_LEN: usize = 5;

/// Length of an authorization state nonce.
pub const STATE_LEN: usize = 32;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a short letters-only slug for a new entry.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..SLUG_LEN)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// Generate an unpredictable state nonce from the thread-local CSPRNG.
pub fn state_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}
