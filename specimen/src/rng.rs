//! RNG backend integration for Random-kind value generation.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Trait for providing random number generators.
pub trait RngProvider {
    /// The type of RNG this provider creates.
    type Rng: rand::RngCore;

    /// Create a new RNG instance with an optional seed.
    fn create_rng(&self, seed: Option<u64>) -> Self::Rng;
}

/// Default RNG provider backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct DefaultRngProvider;

impl RngProvider for DefaultRngProvider {
    type Rng = StdRng;

    fn create_rng(&self, seed: Option<u64>) -> Self::Rng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// RNG state owned by one engine context.
///
/// There is no global manager: the context that owns the repository owns the
/// RNG, and Random-kind generators draw from a handle it hands out.
#[derive(Debug)]
pub struct RngManager<P: RngProvider> {
    provider: P,
    seed: Option<u64>,
}

impl<P: RngProvider> RngManager<P> {
    /// Create a manager with the given provider and no fixed seed.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            seed: None,
        }
    }

    /// Create a manager that seeds every RNG it hands out.
    pub fn with_seed(provider: P, seed: u64) -> Self {
        Self {
            provider,
            seed: Some(seed),
        }
    }

    /// Create an RNG using the manager's seed, if any.
    pub fn get_rng(&self) -> P::Rng {
        self.provider.create_rng(self.seed)
    }

    /// Create an RNG with a specific seed, regardless of the manager's.
    pub fn create_seeded_rng(&self, seed: u64) -> P::Rng {
        self.provider.create_rng(Some(seed))
    }

    /// The manager's seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Set the seed for future RNG instances.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }
}

/// A shared RNG handle that zero-argument Random generators can capture.
///
/// The engine is single-threaded; the `RefCell` gives the boxed generator
/// closures interior mutability without any synchronization.
pub type SharedRng = Rc<RefCell<StdRng>>;

/// Create a shared RNG handle, seeded when a seed is given.
pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    Rc::new(RefCell::new(
        DefaultRngProvider.create_rng(seed),
    ))
}
