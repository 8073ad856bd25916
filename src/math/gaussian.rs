//! Discrete Gaussian sampling.
//!
//! Rejection sampler over Z for the error terms of RLWE encryptions and
//! switching keys. Samples are drawn centered and then projected onto each
//! RNS modulus, so one draw feeds every row of an RNS polynomial.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::modular::ModQ;

/// Default Gaussian standard deviation.
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Discrete Gaussian sampler over Z using rejection sampling.
#[derive(Clone)]
pub struct GaussianSampler {
    /// Standard deviation σ.
    sigma: f64,
    /// Reject samples beyond this many standard deviations (6σ).
    bound: i64,
    rng: ChaCha20Rng,
}

impl GaussianSampler {
    /// Creates a sampler with the given standard deviation and a fresh
    /// entropy seed.
    pub fn new(sigma: f64) -> Self {
        Self::from_rng(sigma, ChaCha20Rng::from_entropy())
    }

    /// Creates a deterministic sampler for tests and reproducible keygen.
    pub fn with_seed(sigma: f64, seed: u64) -> Self {
        Self::from_rng(sigma, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(sigma: f64, rng: ChaCha20Rng) -> Self {
        let bound = (sigma * 6.0).ceil() as i64;
        Self { sigma, bound, rng }
    }

    /// The standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Samples a single value in centered representation.
    pub fn sample(&mut self) -> i64 {
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;
        loop {
            let x = self.rng.gen_range(-self.bound..=self.bound);
            let prob = (-((x * x) as f64) / sigma_sq_2).exp();
            let u: f64 = self.rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    /// Samples a vector of centered values.
    pub fn sample_vec(&mut self, len: usize) -> Vec<i64> {
        (0..len).map(|_| self.sample()).collect()
    }

    /// Projects one vector of centered samples onto an RNS row for `q`.
    pub fn project_row(samples: &[i64], q: u64, out: &mut [u64]) {
        for (o, &s) in out.iter_mut().zip(samples.iter()) {
            *o = ModQ::from_signed(s, q);
        }
    }
}

impl std::fmt::Debug for GaussianSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianSampler")
            .field("sigma", &self.sigma)
            .field("bound", &self.bound)
            .finish()
    }
}
