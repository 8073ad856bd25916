//! The RNS ring `R_Q = Z_Q[X]/(X^N + 1)`.
//!
//! Bundles one Montgomery table and one NTT table per modulus and exposes
//! the leveled operations of the ring layer: forward/inverse NTT (lazy and
//! non-lazy), coefficient-wise Montgomery multiplication with its lazy and
//! accumulate-without-reduction variants, additions, lazy-to-canonical
//! reduction, scalar addition, and the overflow margins that bound how many
//! unreduced accumulations a row tolerates.
//!
//! A "level" selects the active prefix of the modulus chain: an operation
//! at `level` touches rows `0..=level` only.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::Rng;

use crate::math::{MontTable, NttTable};

use super::poly::Poly;

/// An RNS ring over an ordered list of NTT-friendly primes.
#[derive(Debug, Clone)]
pub struct RnsRing {
    n: usize,
    moduli: Vec<u64>,
    mont: Vec<MontTable>,
    ntt: Vec<NttTable>,
    /// `modulus_at_level[l] = q_0 * … * q_l`.
    modulus_at_level: Vec<BigUint>,
}

impl RnsRing {
    /// Builds the ring of dimension `n` over `moduli`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two, `moduli` is empty, or any
    /// modulus is not NTT-friendly for dimension `n`.
    pub fn new(n: usize, moduli: &[u64]) -> Self {
        assert!(n.is_power_of_two(), "n must be a power of two");
        assert!(!moduli.is_empty(), "moduli must be non-empty");

        let mont: Vec<MontTable> = moduli.iter().map(|&q| MontTable::new(q)).collect();
        let ntt: Vec<NttTable> = moduli.iter().map(|&q| NttTable::new(n, q)).collect();

        let mut modulus_at_level = Vec::with_capacity(moduli.len());
        let mut acc = BigUint::one();
        for &q in moduli {
            acc *= q;
            modulus_at_level.push(acc.clone());
        }

        Self {
            n,
            moduli: moduli.to_vec(),
            mont,
            ntt,
            modulus_at_level,
        }
    }

    /// Ring dimension.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// The modulus chain.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Highest level of this ring.
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Product of the first `level + 1` moduli.
    pub fn modulus_at_level(&self, level: usize) -> &BigUint {
        &self.modulus_at_level[level]
    }

    /// Montgomery table for row `i`.
    #[inline]
    pub fn table(&self, i: usize) -> &MontTable {
        &self.mont[i]
    }

    /// NTT table for row `i`.
    #[inline]
    pub fn ntt_table(&self, i: usize) -> &NttTable {
        &self.ntt[i]
    }

    /// Allocates a zero polynomial spanning the full chain.
    pub fn new_poly(&self) -> Poly {
        Poly::zero(self.moduli.len(), self.n)
    }

    /// Allocates a zero polynomial with `level + 1` rows.
    pub fn new_poly_lvl(&self, level: usize) -> Poly {
        Poly::zero(level + 1, self.n)
    }

    /// Fills rows `0..=level` with uniform values in `[0, q_i)`.
    pub fn random_lvl<R: Rng>(&self, level: usize, rng: &mut R, out: &mut Poly) {
        for (i, row) in out.coeffs[..=level].iter_mut().enumerate() {
            let q = self.moduli[i];
            for v in row.iter_mut() {
                *v = rng.gen_range(0..q);
            }
        }
    }

    // --- transforms ------------------------------------------------------

    /// Forward NTT in place on rows `0..=level`.
    pub fn ntt_lvl(&self, level: usize, p: &mut Poly) {
        debug_assert!(!p.is_ntt, "polynomial is already in NTT form");
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            self.ntt[i].forward(row);
        }
        p.is_ntt = true;
    }

    /// Forward NTT with the lazy output bound `[0, 2q)`.
    pub fn ntt_lazy_lvl(&self, level: usize, p: &mut Poly) {
        debug_assert!(!p.is_ntt, "polynomial is already in NTT form");
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            self.ntt[i].forward_lazy(row);
        }
        p.is_ntt = true;
    }

    /// Inverse NTT in place on rows `0..=level`.
    pub fn intt_lvl(&self, level: usize, p: &mut Poly) {
        debug_assert!(p.is_ntt, "polynomial is not in NTT form");
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            self.ntt[i].inverse(row);
        }
        p.is_ntt = false;
    }

    /// Inverse NTT with the lazy output bound `[0, 2q)`.
    pub fn intt_lazy_lvl(&self, level: usize, p: &mut Poly) {
        debug_assert!(p.is_ntt, "polynomial is not in NTT form");
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            self.ntt[i].inverse_lazy(row);
        }
        p.is_ntt = false;
    }

    /// Copies rows `0..=level` of `src` and forward-transforms the copy.
    pub fn ntt_lvl_into(&self, level: usize, src: &Poly, dst: &mut Poly) {
        dst.copy_lvl(level, src);
        self.ntt_lvl(level, dst);
    }

    /// Copies rows `0..=level` of `src` and inverse-transforms the copy.
    pub fn intt_lvl_into(&self, level: usize, src: &Poly, dst: &mut Poly) {
        dst.copy_lvl(level, src);
        self.intt_lvl(level, dst);
    }

    /// Forward NTT of a single row, lazy output bound.
    pub fn ntt_single_lazy(&self, i: usize, row: &mut [u64]) {
        self.ntt[i].forward_lazy(row);
    }

    // --- coefficient-wise arithmetic -------------------------------------

    /// `out = a ⊙ b` with `b` in Montgomery form, fully reduced.
    pub fn mul_coeffs_montgomery_lvl(&self, level: usize, a: &Poly, b: &Poly, out: &mut Poly) {
        for i in 0..=level {
            self.mont[i].mul_row(&a.coeffs[i], &b.coeffs[i], &mut out.coeffs[i]);
        }
        out.is_ntt = a.is_ntt;
    }

    /// `out = a ⊙ b + out mod q` with `b` in Montgomery form.
    pub fn mul_coeffs_montgomery_and_add_lvl(
        &self,
        level: usize,
        a: &Poly,
        b: &Poly,
        out: &mut Poly,
    ) {
        for i in 0..=level {
            self.mont[i].mul_add_row(&a.coeffs[i], &b.coeffs[i], &mut out.coeffs[i]);
        }
    }

    /// `out = a + b mod q`.
    pub fn add_lvl(&self, level: usize, a: &Poly, b: &Poly, out: &mut Poly) {
        for i in 0..=level {
            self.mont[i].add_row(&a.coeffs[i], &b.coeffs[i], &mut out.coeffs[i]);
        }
        out.is_ntt = a.is_ntt;
    }

    /// `out = out + b mod q`.
    pub fn add_assign_lvl(&self, level: usize, b: &Poly, out: &mut Poly) {
        for i in 0..=level {
            let t = &self.mont[i];
            for (o, &v) in out.coeffs[i].iter_mut().zip(b.coeffs[i].iter()) {
                *o = t.add(*o, v);
            }
        }
    }

    /// `out = a - b mod q`.
    pub fn sub_lvl(&self, level: usize, a: &Poly, b: &Poly, out: &mut Poly) {
        for i in 0..=level {
            self.mont[i].sub_row(&a.coeffs[i], &b.coeffs[i], &mut out.coeffs[i]);
        }
        out.is_ntt = a.is_ntt;
    }

    /// Reduces rows `0..=level` to their canonical representatives.
    pub fn reduce_lvl(&self, level: usize, p: &mut Poly) {
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            self.mont[i].reduce_row(row);
        }
    }

    /// Converts rows `0..=level` into Montgomery form in place.
    pub fn mform_lvl(&self, level: usize, p: &mut Poly) {
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            self.mont[i].mform_row(row);
        }
    }

    /// Adds a scalar (given as a big integer) to every coefficient of rows
    /// `0..=level`.
    pub fn add_scalar_bigint_lvl(&self, level: usize, scalar: &BigUint, p: &mut Poly) {
        for (i, row) in p.coeffs[..=level].iter_mut().enumerate() {
            let s = (scalar % self.moduli[i]).to_u64_digits().first().copied().unwrap_or(0);
            let t = &self.mont[i];
            for v in row.iter_mut() {
                *v = t.add(*v, s);
            }
        }
    }

    // --- overflow margins ------------------------------------------------

    /// How many unreduced accumulations the rows `0..=level` tolerate.
    pub fn overflow_margin(&self, level: usize) -> usize {
        self.mont[..=level]
            .iter()
            .map(|t| t.overflow_margin())
            .min()
            .expect("ring has at least one modulus")
    }

    // --- reconstruction --------------------------------------------------

    /// CRT-reconstructs rows `0..=level` into centered big integers.
    ///
    /// Used by tests and norm computations; not a fast path.
    pub fn poly_to_bigint_centered_lvl(&self, level: usize, p: &Poly) -> Vec<num_bigint::BigInt> {
        use num_bigint::BigInt;

        let big_q = &self.modulus_at_level[level];
        let half_q = big_q / 2u32;

        // Per-row CRT basis: (Q/q_i) * ((Q/q_i)^-1 mod q_i).
        let mut basis = Vec::with_capacity(level + 1);
        for i in 0..=level {
            let qi = BigUint::from(self.moduli[i]);
            let q_over_qi = big_q / &qi;
            let inv = crate::math::mod_inverse(
                (&q_over_qi % &qi).to_u64_digits().first().copied().unwrap_or(0),
                self.moduli[i],
            );
            basis.push(&q_over_qi * inv);
        }

        (0..self.n)
            .map(|col| {
                let mut acc = BigUint::zero();
                for i in 0..=level {
                    acc += &basis[i] * p.coeffs[i][col];
                }
                acc %= big_q;
                if acc > half_q {
                    BigInt::from(acc) - BigInt::from(big_q.clone())
                } else {
                    BigInt::from(acc)
                }
            })
            .collect()
    }
}
