//! Key generation.
//!
//! Generates ternary secret keys and hybrid switching keys over `Q × P`.
//! A switching key from `s_in` to `s_out` has `beta` gadget rows; row `i`
//! is an encryption of zero under `s_out` to which `P·s_in` is added on
//! the ciphertext rows of digit window `i` (the RNS gadget: the digit
//! constant is `P` on its own window primes and `0` everywhere else,
//! including the special rows).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::math::{GaussianSampler, ModQ};
use crate::params::Params;
use crate::ring::{Poly, PolyQp, RnsRing};

use super::keys::{SecretKey, SwitchingKey};

/// Generator for secret and switching keys.
pub struct KeyGenerator {
    params: Params,
    ring_q: RnsRing,
    ring_p: RnsRing,
    gaussian: GaussianSampler,
    rng: ChaCha20Rng,
    /// `Π p_l mod q_j` per ciphertext prime, for the gadget term.
    p_mod_q: Vec<u64>,
}

impl KeyGenerator {
    /// Creates a generator seeded from system entropy.
    pub fn new(params: Params) -> Self {
        Self::from_rng(params, ChaCha20Rng::from_entropy())
    }

    /// Creates a deterministic generator for tests.
    pub fn with_seed(params: Params, seed: u64) -> Self {
        Self::from_rng(params, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(params: Params, mut rng: ChaCha20Rng) -> Self {
        let n = params.n();
        let ring_q = RnsRing::new(n, params.q());
        let ring_p = RnsRing::new(n, params.p());
        let gaussian = GaussianSampler::with_seed(params.sigma(), rng.gen());

        let p_mod_q = params
            .q()
            .iter()
            .map(|&q| {
                params
                    .p()
                    .iter()
                    .fold(1u64, |acc, &p| ModQ::mul(acc, p % q, q))
            })
            .collect();

        Self {
            params,
            ring_q,
            ring_p,
            gaussian,
            rng,
            p_mod_q,
        }
    }

    /// The parameter set this generator serves.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Samples ternary secret coefficients, uniform over {-1, 0, 1}.
    pub fn sample_ternary(&mut self) -> Vec<i64> {
        (0..self.params.n())
            .map(|_| self.rng.gen_range(-1i64..=1))
            .collect()
    }

    /// Generates a fresh ternary secret key.
    pub fn gen_secret_key(&mut self) -> SecretKey {
        let coeffs = self.sample_ternary();
        SecretKey::from_signed_coeffs(&self.ring_q, &self.ring_p, &coeffs)
    }

    /// Generates the switching key from `sk_in` to `sk_out`.
    ///
    /// Both keys must live in this generator's rings (a smaller-ring secret
    /// is first embedded by the caller via
    /// [`SecretKey::from_signed_coeffs`] on spread-out coefficients).
    pub fn gen_switching_key(&mut self, sk_in: &SecretKey, sk_out: &SecretKey) -> SwitchingKey {
        let beta = self.params.beta();
        let p_count = self.params.p_count();
        let q_count = self.params.q_count();
        let n = self.params.n();

        let mut rows = Vec::with_capacity(beta);
        for i in 0..beta {
            let mut row0 = PolyQp::zero(q_count, p_count, n);
            let mut row1 = PolyQp::zero(q_count, p_count, n);
            self.encrypt_zero_qp(sk_out, &mut row0, &mut row1);

            // Gadget term: P·s_in on the window rows of digit i.
            let window_end = ((i + 1) * p_count).min(q_count);
            for j in i * p_count..window_end {
                self.ring_q.table(j).scalar_mul_add_row(
                    &sk_in.value.q.coeffs[j],
                    self.p_mod_q[j],
                    &mut row0.q.coeffs[j],
                );
            }

            rows.push([row0, row1]);
        }

        SwitchingKey::from_rows(rows)
    }

    /// Fills `(row0, row1)` with an RLWE encryption of zero under `sk` over
    /// the full `Q × P` basis, NTT and Montgomery form.
    fn encrypt_zero_qp(&mut self, sk: &SecretKey, row0: &mut PolyQp, row1: &mut PolyQp) {
        let level_q = self.params.max_level();
        let level_p = self.params.p_count() - 1;

        // Uniform mask; uniformity is preserved by the Montgomery bijection,
        // so the samples are taken to be in NTT + Montgomery form directly.
        self.ring_q.random_lvl(level_q, &mut self.rng, &mut row1.q);
        self.ring_p.random_lvl(level_p, &mut self.rng, &mut row1.p);
        row1.q.is_ntt = true;
        row1.p.is_ntt = true;

        // Error term, shared across all rows.
        let e = self.gaussian.sample_vec(self.params.n());
        project_signed(&self.ring_q, level_q, &e, &mut row0.q);
        project_signed(&self.ring_p, level_p, &e, &mut row0.p);
        self.ring_q.ntt_lvl(level_q, &mut row0.q);
        self.ring_p.ntt_lvl(level_p, &mut row0.p);
        self.ring_q.mform_lvl(level_q, &mut row0.q);
        self.ring_p.mform_lvl(level_p, &mut row0.p);

        // row0 = e - a·sk.
        for j in 0..=level_q {
            let t = self.ring_q.table(j);
            for col in 0..self.params.n() {
                let prod = t.mred(row1.q.coeffs[j][col], sk.value.q.coeffs[j][col]);
                row0.q.coeffs[j][col] = t.sub(row0.q.coeffs[j][col], prod);
            }
        }
        for l in 0..=level_p {
            let t = self.ring_p.table(l);
            for col in 0..self.params.n() {
                let prod = t.mred(row1.p.coeffs[l][col], sk.value.p.coeffs[l][col]);
                row0.p.coeffs[l][col] = t.sub(row0.p.coeffs[l][col], prod);
            }
        }
    }
}

impl SecretKey {
    /// Builds a secret key from signed coefficients, projecting onto every
    /// row of both rings and converting to NTT + Montgomery form.
    ///
    /// Used by [`KeyGenerator::gen_secret_key`] and by callers embedding a
    /// small-ring secret into a larger ring (`Y ↦ X^{N/n}` spreads the
    /// coefficients with stride `N/n`).
    pub fn from_signed_coeffs(ring_q: &RnsRing, ring_p: &RnsRing, coeffs: &[i64]) -> Self {
        assert_eq!(coeffs.len(), ring_q.dimension(), "coefficient count must match the ring");
        let level_q = ring_q.max_level();
        let level_p = ring_p.max_level();

        let mut value = PolyQp::zero(level_q + 1, level_p + 1, ring_q.dimension());
        project_signed(ring_q, level_q, coeffs, &mut value.q);
        project_signed(ring_p, level_p, coeffs, &mut value.p);
        ring_q.ntt_lvl(level_q, &mut value.q);
        ring_p.ntt_lvl(level_p, &mut value.p);
        ring_q.mform_lvl(level_q, &mut value.q);
        ring_p.mform_lvl(level_p, &mut value.p);

        Self { value }
    }
}

/// Projects signed coefficients onto rows `0..=level` of `out`.
fn project_signed(ring: &RnsRing, level: usize, coeffs: &[i64], out: &mut Poly) {
    for (i, row) in out.coeffs[..=level].iter_mut().enumerate() {
        GaussianSampler::project_row(coeffs, ring.moduli()[i], row);
    }
    out.is_ntt = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> Params {
        Params::research_truncated(8, 4, 2)
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let params = small_params();
        let mut kgen = KeyGenerator::with_seed(params.clone(), 11);
        let coeffs = kgen.sample_ternary();
        let sk = SecretKey::from_signed_coeffs(&kgen.ring_q, &kgen.ring_p, &coeffs);

        // Undo Montgomery and NTT on the Q part and compare.
        let mut q = sk.value.q.clone();
        for i in 0..=kgen.ring_q.max_level() {
            let t = kgen.ring_q.table(i);
            for v in q.coeffs[i].iter_mut() {
                *v = t.inv_mform(*v);
            }
        }
        kgen.ring_q.intt_lvl(kgen.ring_q.max_level(), &mut q);

        for (col, &c) in coeffs.iter().enumerate() {
            let want = ModQ::from_signed(c, kgen.ring_q.moduli()[0]);
            assert_eq!(q.coeffs[0][col], want, "coefficient {} mismatch", col);
        }
    }

    #[test]
    fn test_switching_key_rows_decrypt_to_gadget() {
        let params = small_params();
        let beta = params.beta();
        let mut kgen = KeyGenerator::with_seed(params.clone(), 12);
        let sk_in = kgen.gen_secret_key();
        let sk_out = kgen.gen_secret_key();
        let swk = kgen.gen_switching_key(&sk_in, &sk_out);
        assert_eq!(swk.digits(), beta);
        assert!(swk.is_canonical());

        let ring_q = &kgen.ring_q;
        let level_q = params.max_level();
        let n = params.n();

        // row0 + row1·s_out = e + P·g_i·s_in; on a window row this equals
        // e + P·s_in, elsewhere e. Check the noise is small on a row
        // outside every window after removing the mask.
        for (i, row) in swk.value.iter().enumerate() {
            let mut phase = Poly::zero(level_q + 1, n);
            phase.is_ntt = true;
            for j in 0..=level_q {
                let t = ring_q.table(j);
                for col in 0..n {
                    // row values are in Montgomery form; strip it.
                    let c0 = t.inv_mform(row[0].q.coeffs[j][col]);
                    let a_sk = t.inv_mform(t.mred(row[1].q.coeffs[j][col], sk_out.value.q.coeffs[j][col]));
                    phase.coeffs[j][col] = t.add(c0, a_sk);
                }
            }
            ring_q.intt_lvl(level_q, &mut phase);

            // Pick a row outside digit i's window: residues there are pure
            // noise, so the centered single-row values must be tiny.
            let outside = if i == 0 { params.p_count() } else { 0 };
            let q = ring_q.moduli()[outside];
            for col in 0..n {
                let v = ModQ::to_signed(phase.coeffs[outside][col], q);
                // Pure error residues stay within the 6σ tailcut.
                assert!(
                    v.abs() <= 20,
                    "row {} has large off-window residue {}",
                    i,
                    v
                );
            }
        }
    }
}
