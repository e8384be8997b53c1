// Copyright (c) 2025 - Cowboy AI, Inc.
//! Master password generation
//!
//! The engine calls a [`PasswordGenerator`] at most once per compilation,
//! and only when the claim carries no replayed password. The orchestrator
//! persists the result from the secret bundle and feeds it back on the next
//! reconcile, which keeps repeated compilations identical.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
/// Specials accepted by the provider (no `/`, `"`, `@` or space)
const SPECIALS: &[u8] = b"!#$%&*()-_=+[]{}<>:?";

/// Source of fresh master passwords
pub trait PasswordGenerator: Send + Sync {
    /// Produce a password of exactly `length` characters
    fn generate(&self, length: usize) -> String;
}

/// Thread-local CSPRNG backed generator
///
/// Output always contains at least one lowercase letter, uppercase letter,
/// digit and special character.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPasswordGenerator;

impl RandomPasswordGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate(&self, length: usize) -> String {
        generate_with(&mut rand::thread_rng(), length)
    }
}

/// Generate from an explicit RNG
pub fn generate_with<R: RngCore>(rng: &mut R, length: usize) -> String {
    let classes = [LOWERCASE, UPPERCASE, DIGITS, SPECIALS];
    let alphabet: Vec<u8> = classes.concat();

    let mut chars: Vec<u8> = classes
        .iter()
        .take(length)
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();
    while chars.len() < length {
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}

/// Fixed password, for replay scenarios and tests
#[derive(Debug, Clone)]
pub struct StaticPasswordGenerator(String);

impl StaticPasswordGenerator {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }
}

impl PasswordGenerator for StaticPasswordGenerator {
    fn generate(&self, _length: usize) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invariants::validate_master_password;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_password_has_every_class() {
        let generator = RandomPasswordGenerator::new();
        for _ in 0..50 {
            let password = generator.generate(32);
            assert_eq!(password.len(), 32);
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.bytes().any(|b| SPECIALS.contains(&b)));
            assert!(validate_master_password(&password).is_ok());
        }
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        let a = generate_with(&mut StdRng::seed_from_u64(7), 24);
        let b = generate_with(&mut StdRng::seed_from_u64(7), 24);
        assert_eq!(a, b);
    }

    #[test]
    fn test_static_generator() {
        let generator = StaticPasswordGenerator::new("Replayed#Pass1");
        assert_eq!(generator.generate(32), "Replayed#Pass1");
    }
}
