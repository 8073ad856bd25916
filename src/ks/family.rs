//! The ring family: one auxiliary ring per special-modulus size.
//!
//! For each admissible size index `k`, the auxiliary ring spans the top
//! `k·P` ciphertext primes followed by all `P` special primes. The family
//! also carries the basis-change engines bound to each ring and the
//! pre-scale constants `PkDivP[k] = Π(top k·P ciphertext primes)` over
//! `R_Q` in Montgomery form (the switching key already carries the factor
//! `Π p_l`, so only the reused primes enter the pre-scale).

use num_bigint::BigUint;
use num_traits::One;
use tracing::debug;

use crate::params::Params;
use crate::ring::{BasisExtender, Decomposer, Poly, RnsRing};

/// Precomputed auxiliary rings, engines, and pre-scale constants.
#[derive(Debug)]
pub struct RingFamily {
    rings: Vec<RnsRing>,
    extenders: Vec<BasisExtender>,
    decomposers: Vec<Decomposer>,
    pk_div_p: Vec<Poly>,
}

impl RingFamily {
    /// Builds the family for sizes `k ∈ [0, beta/2]`.
    pub fn new(params: &Params, ring_q: &RnsRing) -> Self {
        let q_count = params.q_count();
        let p_count = params.p_count();
        let max_sp = params.beta() / 2;
        let level_q = params.max_level();

        let mut rings = Vec::with_capacity(max_sp + 1);
        let mut extenders = Vec::with_capacity(max_sp + 1);
        let mut decomposers = Vec::with_capacity(max_sp + 1);
        let mut pk_div_p = Vec::with_capacity(max_sp + 1);

        for k in 0..=max_sp {
            let reused = &params.q()[q_count - k * p_count..];
            let mut aux: Vec<u64> = reused.to_vec();
            aux.extend_from_slice(params.p());

            let ring = RnsRing::new(params.n(), &aux);
            extenders.push(BasisExtender::new(ring_q, &ring));
            decomposers.push(Decomposer::new(ring_q, &ring));

            // PkDivP[k]: the constant Π(reused primes), 1 when k = 0.
            let mut scalar = BigUint::one();
            for &q in reused {
                scalar *= q;
            }
            let mut constant = ring_q.new_poly();
            ring_q.add_scalar_bigint_lvl(level_q, &scalar, &mut constant);
            ring_q.mform_lvl(level_q, &mut constant);
            pk_div_p.push(constant);

            rings.push(ring);
        }

        debug!(
            sizes = max_sp + 1,
            aux_primes_max = max_sp * p_count + p_count,
            "ring family ready"
        );

        Self {
            rings,
            extenders,
            decomposers,
            pk_div_p,
        }
    }

    /// Largest size index in the family.
    pub fn max_sp(&self) -> usize {
        self.rings.len() - 1
    }

    /// The auxiliary ring for size `k`.
    #[inline]
    pub fn ring(&self, k: usize) -> &RnsRing {
        &self.rings[k]
    }

    /// The mod-down engine for size `k`.
    #[inline]
    pub fn extender(&self, k: usize) -> &BasisExtender {
        &self.extenders[k]
    }

    /// The gadget decomposer for size `k`.
    #[inline]
    pub fn decomposer(&self, k: usize) -> &Decomposer {
        &self.decomposers[k]
    }

    /// The pre-scale constant for size `k`, Montgomery form over `R_Q`.
    #[inline]
    pub fn pk_div_p(&self, k: usize) -> &Poly {
        &self.pk_div_p[k]
    }
}
