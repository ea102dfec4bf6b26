//! Identifier generation
//!
//! Record ids are short hex strings taken from a SHA-256 digest of a seed
//! (usually the record's name) and a random nonce. Project perma names are
//! random alphanumeric handles. Callers check each candidate for collisions
//! and ask for the next one until a free value turns up.

use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};

/// Length of a generated record id, in hex characters
pub const ID_LENGTH: usize = 12;

/// Length of a generated project perma name
pub const PERMA_NAME_LENGTH: usize = 8;

/// Candidates produced before a generator gives up
pub const MAX_ATTEMPTS: usize = 16;

/// Yields collision-retry candidates for a record id
pub struct IdGenerator {
    seed: String,
    attempts: usize,
}

impl IdGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            attempts: 0,
        }
    }

    /// Next candidate id, or `None` once [`MAX_ATTEMPTS`] are used up.
    pub fn next_id(&mut self) -> Option<String> {
        if self.attempts >= MAX_ATTEMPTS {
            return None;
        }
        self.attempts += 1;

        let nonce: u64 = rand::rng().random();
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();

        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Some(hex[..ID_LENGTH].to_string())
    }
}

/// Yields collision-retry candidates for a project perma name
pub struct PermaNameGenerator {
    attempts: usize,
}

impl PermaNameGenerator {
    pub fn new() -> Self {
        Self { attempts: 0 }
    }

    /// Next candidate perma name, or `None` once [`MAX_ATTEMPTS`] are used up.
    pub fn next_name(&mut self) -> Option<String> {
        if self.attempts >= MAX_ATTEMPTS {
            return None;
        }
        self.attempts += 1;

        Some(
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(PERMA_NAME_LENGTH)
                .map(char::from)
                .collect(),
        )
    }
}

impl Default for PermaNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_is_lowercase_hex_of_fixed_length() {
        let id = IdGenerator::new("Project Alpha").next_id().unwrap();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_same_seed_gives_different_candidates() {
        let mut generator = IdGenerator::new("same");
        let ids: HashSet<String> = std::iter::from_fn(|| generator.next_id()).collect();
        assert!(ids.len() > 1);
    }

    #[test]
    fn test_generator_stops_after_max_attempts() {
        let mut generator = IdGenerator::new("seed");
        let count = std::iter::from_fn(|| generator.next_id()).count();
        assert_eq!(count, MAX_ATTEMPTS);
        assert!(generator.next_id().is_none());
    }

    #[test]
    fn test_perma_name_is_alphanumeric() {
        let name = PermaNameGenerator::new().next_name().unwrap();
        assert_eq!(name.len(), PERMA_NAME_LENGTH);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_perma_name_generator_stops_after_max_attempts() {
        let mut generator = PermaNameGenerator::default();
        let count = std::iter::from_fn(|| generator.next_name()).count();
        assert_eq!(count, MAX_ATTEMPTS);
    }
}
