//! Seeded random number generation for Monte Carlo simulation.
//!
//! Every simulated path owns its own [`PricerRng`], seeded by mixing the
//! request seed with the path index through a SplitMix64 finaliser. The draws
//! of path `i` therefore depend on `(seed, i)` only, so partitioning paths
//! across worker batches cannot change the result.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson, StandardNormal};

/// SplitMix64 output function.
///
/// Bijective on `u64` with full avalanche, used to decorrelate the seeds of
/// neighbouring paths.
#[inline]
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of path `index` under request seed `seed`.
#[inline]
pub fn path_seed(seed: u64, index: u64) -> u64 {
    splitmix64(seed ^ splitmix64(index))
}

/// Seed for requests that did not supply one, taken from the system clock.
pub fn entropy_seed() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    splitmix64(nanos)
}

/// Monte Carlo random number generator.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::rng::PricerRng;
///
/// let mut a = PricerRng::for_path(42, 7);
/// let mut b = PricerRng::for_path(42, 7);
/// assert_eq!(a.gen_normal(), b.gen_normal());
///
/// let u = PricerRng::from_seed(1).gen_uniform();
/// assert!((0.0..1.0).contains(&u));
/// ```
pub struct PricerRng {
    inner: StdRng,
    seed: u64,
}

impl PricerRng {
    /// Creates a generator initialised with `seed`.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates the generator of path `index` for request seed `seed`.
    #[inline]
    pub fn for_path(seed: u64, index: u64) -> Self {
        Self::from_seed(path_seed(seed, index))
    }

    /// Returns the seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform variate in [0, 1).
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Standard normal variate (Ziggurat via `rand_distr::StandardNormal`).
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Fills `buffer` with standard normal variates.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }

    /// Poisson count with mean `lambda`; zero for a non-positive mean.
    #[inline]
    pub fn gen_poisson(&mut self, lambda: f64) -> u64 {
        if lambda.is_nan() || lambda <= 0.0 {
            return 0;
        }
        match Poisson::new(lambda) {
            Ok(dist) => {
                let count: f64 = dist.sample(&mut self.inner);
                count as u64
            }
            Err(_) => 0,
        }
    }
}
