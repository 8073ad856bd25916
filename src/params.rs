//! Parameter sets for level-aware hybrid key-switching.
//!
//! A parameter set carries the modulus chain: an ordered list of
//! "ciphertext" primes `q`, an ordered list of "special" primes `p`, the
//! ring degree `N = 2^log_n`, and the error standard deviation. The number
//! of gadget digits is `beta = ceil(#q / #p)`.
//!
//! The level-aware switcher reuses the top ciphertext primes as extra
//! special primes, which requires `#p` to divide `#q`; construction of a
//! [`crate::ks::KeySwitcher`] panics otherwise.
//!
//! # Example
//!
//! ```
//! use levelks::params::Params;
//!
//! let params = Params::research();
//! assert_eq!(params.q_count(), 40);
//! assert_eq!(params.p_count(), 4);
//! assert_eq!(params.beta(), 10);
//! assert!(params.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

/// Default error standard deviation.
pub const DEFAULT_SIGMA: f64 = crate::math::gaussian::DEFAULT_SIGMA;

/// The 40-prime ciphertext chain of the research parameter set
/// (44-bit NTT-friendly primes, `log N = 16`).
pub const RESEARCH_Q: [u64; 40] = [
    0xffff480001, 0xffff420001, 0xffff340001, 0xfffeb60001,
    0xfffeb00001, 0xfffe9e0001, 0xfffe860001, 0xfffe680001,
    0xfffe620001, 0xfffe4a0001, 0xfffe2c0001, 0xfffe100001,
    0xfffd800001, 0xfffd720001, 0xfffd6e0001, 0xfffd5a0001,
    0xfffd3e0001, 0xfffd260001, 0xfffd080001, 0xfffcfa0001,
    0xfffcf60001, 0xfffcc60001, 0xfffca00001, 0xfffc940001,
    0xfffc880001, 0xfffc6a0001, 0xfffc640001, 0xfffc600001,
    0xfffc540001, 0xfffc360001, 0xfffc1e0001, 0xfffbf40001,
    0xfffbdc0001, 0xfffbb80001, 0xfffba60001, 0xfffba00001,
    0xfffb5e0001, 0xfffb340001, 0xfffb1a0001, 0xfffb0e0001,
];

/// The 4-prime special chain of the research parameter set.
pub const RESEARCH_P: [u64; 4] = [0xffff8a0001, 0xffff820001, 0xffff780001, 0xffff580001];

/// Modulus chains and ring degree for one parameter set.
///
/// # Fields
///
/// * `log_n` - log2 of the ring degree
/// * `q` - ciphertext primes, ordered (level `l` uses `q[0..=l]`)
/// * `p` - special primes
/// * `sigma` - standard deviation of the error distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    log_n: usize,
    q: Vec<u64>,
    p: Vec<u64>,
    sigma: f64,
}

impl Params {
    /// Creates a parameter set after validating it.
    pub fn new(log_n: usize, q: Vec<u64>, p: Vec<u64>, sigma: f64) -> Result<Self, &'static str> {
        let params = Self { log_n, q, p, sigma };
        params.validate()?;
        Ok(params)
    }

    /// The research parameter set: `log N = 16`, 40 ciphertext primes,
    /// 4 special primes, 44 bits each.
    pub fn research() -> Self {
        Self {
            log_n: 16,
            q: RESEARCH_Q.to_vec(),
            p: RESEARCH_P.to_vec(),
            sigma: DEFAULT_SIGMA,
        }
    }

    /// A truncation of the research chain, for fast tests and small rings.
    ///
    /// # Panics
    ///
    /// Panics if more primes are requested than the research chain has.
    pub fn research_truncated(log_n: usize, q_count: usize, p_count: usize) -> Self {
        assert!(q_count <= RESEARCH_Q.len() && p_count <= RESEARCH_P.len());
        Self {
            log_n,
            q: RESEARCH_Q[..q_count].to_vec(),
            p: RESEARCH_P[..p_count].to_vec(),
            sigma: DEFAULT_SIGMA,
        }
    }

    /// Checks the structural constraints of the chain.
    ///
    /// # Errors
    ///
    /// - `"log_n must be at least 1"`
    /// - `"q must be non-empty"` / `"p must be non-empty"`
    /// - `"moduli must be ≡ 1 (mod 2N) for the NTT"`
    /// - `"p_count must divide q_count"`
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.log_n == 0 {
            return Err("log_n must be at least 1");
        }
        if self.q.is_empty() {
            return Err("q must be non-empty");
        }
        if self.p.is_empty() {
            return Err("p must be non-empty");
        }
        let two_n = 2u64 << self.log_n;
        if self.q.iter().chain(self.p.iter()).any(|&m| m % two_n != 1) {
            return Err("moduli must be ≡ 1 (mod 2N) for the NTT");
        }
        if self.q.len() % self.p.len() != 0 {
            return Err("p_count must divide q_count");
        }
        Ok(())
    }

    /// log2 of the ring degree.
    pub fn log_n(&self) -> usize {
        self.log_n
    }

    /// Ring degree `N`.
    pub fn n(&self) -> usize {
        1 << self.log_n
    }

    /// Number of ciphertext primes.
    pub fn q_count(&self) -> usize {
        self.q.len()
    }

    /// Number of special primes.
    pub fn p_count(&self) -> usize {
        self.p.len()
    }

    /// The ciphertext prime chain.
    pub fn q(&self) -> &[u64] {
        &self.q
    }

    /// The special prime chain.
    pub fn p(&self) -> &[u64] {
        &self.p
    }

    /// Highest ciphertext level.
    pub fn max_level(&self) -> usize {
        self.q.len() - 1
    }

    /// Number of gadget digits, `ceil(q_count / p_count)`.
    pub fn beta(&self) -> usize {
        self.q.len().div_ceil(self.p.len())
    }

    /// Error standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::research()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_params_valid() {
        let params = Params::research();
        assert!(params.validate().is_ok());
        assert_eq!(params.beta(), 10);
        assert_eq!(params.max_level(), 39);
        assert_eq!(params.n(), 1 << 16);
    }

    #[test]
    fn test_truncated_chain_valid() {
        let params = Params::research_truncated(12, 12, 2);
        assert!(params.validate().is_ok());
        assert_eq!(params.beta(), 6);
    }

    #[test]
    fn test_divisibility_enforced() {
        let params = Params::new(
            12,
            RESEARCH_Q[..5].to_vec(),
            RESEARCH_P[..2].to_vec(),
            DEFAULT_SIGMA,
        );
        assert_eq!(params.unwrap_err(), "p_count must divide q_count");
    }

    #[test]
    fn test_ntt_friendliness_enforced() {
        // 17 is prime but not ≡ 1 mod 2N.
        let params = Params::new(12, vec![17], RESEARCH_P[..1].to_vec(), DEFAULT_SIGMA);
        assert!(params.is_err());
    }
}
