//! Symmetric RLWE encryption of zero plaintexts.
//!
//! The key-switching noise tests only need ciphertexts whose decryption
//! residue is the fresh error: `(c0, c1)` with `c1` uniform and
//! `c0 = -c1·s + e`. Everything is produced in evaluation (NTT) form over
//! `R_Q` at a chosen level.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::math::GaussianSampler;
use crate::params::Params;
use crate::ring::{Poly, RnsRing};

use super::keys::SecretKey;

/// Ciphertext pair over `R_Q`.
#[derive(Debug, Clone)]
pub struct Ciphertext {
    pub c0: Poly,
    pub c1: Poly,
    pub level: usize,
}

/// Symmetric encryptor bound to one secret key.
pub struct Encryptor {
    ring_q: RnsRing,
    sk: SecretKey,
    gaussian: GaussianSampler,
    rng: ChaCha20Rng,
    n: usize,
}

impl Encryptor {
    /// Creates an encryptor with a deterministic seed.
    pub fn with_seed(params: &Params, sk: &SecretKey, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let gaussian = GaussianSampler::with_seed(params.sigma(), rng.gen());
        Self {
            ring_q: RnsRing::new(params.n(), params.q()),
            sk: sk.clone(),
            gaussian,
            rng,
            n: params.n(),
        }
    }

    /// Encrypts a zero plaintext at `level`, output in NTT form.
    pub fn encrypt_zero_ntt(&mut self, level: usize) -> Ciphertext {
        let mut c1 = self.ring_q.new_poly_lvl(level);
        self.ring_q.random_lvl(level, &mut self.rng, &mut c1);
        c1.is_ntt = true;

        // c0 = e - c1·s.
        let e = self.gaussian.sample_vec(self.n);
        let mut c0 = self.ring_q.new_poly_lvl(level);
        for (i, row) in c0.coeffs[..=level].iter_mut().enumerate() {
            GaussianSampler::project_row(&e, self.ring_q.moduli()[i], row);
        }
        self.ring_q.ntt_lvl(level, &mut c0);

        for i in 0..=level {
            let t = self.ring_q.table(i);
            for col in 0..self.n {
                let prod = t.mred(c1.coeffs[i][col], self.sk.value.q.coeffs[i][col]);
                c0.coeffs[i][col] = t.sub(c0.coeffs[i][col], prod);
            }
        }

        Ciphertext { c0, c1, level }
    }

    /// The phase `c0 + c1·s` of a ciphertext, in coefficient form: the
    /// decryption residue when the plaintext is zero.
    pub fn phase(&self, ct: &Ciphertext) -> Poly {
        let level = ct.level;
        let mut out = ct.c0.clone();
        self.ring_q
            .mul_coeffs_montgomery_and_add_lvl(level, &ct.c1, &self.sk.value.q, &mut out);
        self.ring_q.intt_lvl(level, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ModQ;
    use crate::rlwe::KeyGenerator;

    #[test]
    fn test_fresh_ciphertext_residue_is_small() {
        let params = Params::research_truncated(8, 4, 2);
        let mut kgen = KeyGenerator::with_seed(params.clone(), 21);
        let sk = kgen.gen_secret_key();
        let mut enc = Encryptor::with_seed(&params, &sk, 22);

        let ct = enc.encrypt_zero_ntt(params.max_level());
        let residue = enc.phase(&ct);

        let q0 = params.q()[0];
        for col in 0..params.n() {
            let v = ModQ::to_signed(residue.coeffs[0][col], q0);
            assert!(v.abs() <= 20, "fresh residue too large: {}", v);
        }
    }
}
