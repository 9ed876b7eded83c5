//! Group join code allocation.
//!
//! Codes are sampled uniformly from a fixed alphabet. [`CodeAllocator::allocate`]
//! keeps sampling until the caller's `is_taken` check reports a free code and has
//! no retry bound of its own: callers cap it, typically by returning an error from
//! `is_taken` once their attempt budget is spent. Nothing is reserved; the store's
//! uniqueness constraint on `groups.code` is the real guard.

use rand::seq::SliceRandom;
use rand::Rng;

use super::manager::GroupError;
use crate::storage::GroupSettings;

/// Generates candidate group codes.
#[derive(Debug, Clone)]
pub struct CodeAllocator {
    alphabet: Vec<char>,
    length: usize,
}

impl CodeAllocator {
    /// Create an allocator over `alphabet` producing codes of `length` characters.
    ///
    /// The alphabet is uppercased so generated codes survive [`normalize_code`], and
    /// duplicate characters are dropped so every symbol is equally likely.
    pub fn new(alphabet: &str, length: usize) -> Result<Self, GroupError> {
        if alphabet.chars().any(char::is_whitespace) {
            return Err(GroupError::InvalidCodeSettings(
                "alphabet must not contain whitespace".to_string(),
            ));
        }

        let mut symbols: Vec<char> = Vec::with_capacity(alphabet.len());
        for c in alphabet.chars().flat_map(char::to_uppercase) {
            if !symbols.contains(&c) {
                symbols.push(c);
            }
        }

        if symbols.is_empty() {
            return Err(GroupError::InvalidCodeSettings(
                "alphabet must not be empty".to_string(),
            ));
        }
        if length == 0 {
            return Err(GroupError::InvalidCodeSettings(
                "code length must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            alphabet: symbols,
            length,
        })
    }

    /// Build an allocator from configuration.
    pub fn from_settings(settings: &GroupSettings) -> Result<Self, GroupError> {
        Self::new(&settings.code_alphabet, settings.code_length)
    }

    /// Number of distinct codes, if it fits in a `u128`.
    pub fn code_space(&self) -> Option<u128> {
        (self.alphabet.len() as u128).checked_pow(self.length as u32)
    }

    /// Sample one candidate code.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.length)
            .filter_map(|_| self.alphabet.choose(rng))
            .collect()
    }

    /// Sample until `is_taken` reports a free candidate.
    ///
    /// Errors from `is_taken` abort the loop and are returned unchanged.
    pub fn allocate<R, F, E>(&self, rng: &mut R, mut is_taken: F) -> Result<String, E>
    where
        R: Rng + ?Sized,
        F: FnMut(&str) -> Result<bool, E>,
    {
        loop {
            let candidate = self.sample(rng);
            if !is_taken(&candidate)? {
                return Ok(candidate);
            }
            tracing::debug!(code = %candidate, "Group code collision, resampling");
        }
    }
}

/// Normalize a code typed by a user: trimmed and uppercased.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}
