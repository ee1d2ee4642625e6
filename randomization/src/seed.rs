use std::cell::RefCell;

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_os_rng());
}

/// Runs `f` with the global generator of the current thread.
///
/// Do not call `with_rng` or `SeedScope::push` from inside `f`.
pub fn with_rng<F, T>(f: F) -> T
where
    F: FnOnce(&mut StdRng) -> T,
{
    RNG.with(|rng| f(&mut rng.borrow_mut()))
}

/// A deterministic seed for the global generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Value(u64),
    /// A word sequence; words beyond the generator's 256-bit state are folded in by xor.
    Words(Vec<u32>),
}

impl Seed {
    fn generator(&self) -> StdRng {
        match self {
            Seed::Value(value) => StdRng::seed_from_u64(*value),
            Seed::Words(words) => {
                let mut bytes = [0u8; 32];
                for (i, word) in words.iter().enumerate() {
                    let slot = (i % 8) * 4;
                    for (b, w) in bytes[slot..slot + 4].iter_mut().zip(word.to_le_bytes()) {
                        *b ^= w;
                    }
                }
                StdRng::from_seed(bytes)
            }
        }
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::Value(value)
    }
}

impl From<Vec<u32>> for Seed {
    fn from(words: Vec<u32>) -> Self {
        Seed::Words(words)
    }
}

/// Scoped ownership of the global generator.
///
/// Pushing a scope saves the generator state and, if a seed is given, reseeds it.
/// Dropping the scope restores the saved state, whether the enclosed block returned,
/// bailed out with `?` or panicked.
#[must_use = "the generator is restored as soon as the scope is dropped"]
pub struct SeedScope {
    saved: Option<StdRng>,
}

impl SeedScope {
    /// Creates a new `SeedScope`.
    ///
    /// # Arguments
    /// * `seed` - The seed to apply, or `None` to keep drawing from the current state.
    pub fn push(seed: impl Into<Option<Seed>>) -> Self {
        let seed = seed.into();
        let saved = with_rng(|rng| {
            let saved = rng.clone();
            if let Some(seed) = &seed {
                *rng = seed.generator();
            }
            saved
        });

        Self { saved: Some(saved) }
    }
}

impl Drop for SeedScope {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            // The thread-local may already be gone during thread teardown.
            let _ = RNG.try_with(|rng| *rng.borrow_mut() = saved);
        }
    }
}
