//! Number-Theoretic Transform for negacyclic convolution.
//!
//! Cooley-Tukey / Gentleman-Sande transform pair over
//! `R_q = Z_q[X]/(X^n + 1)`, one table per RNS prime. Twiddle factors are
//! powers of a primitive 2n-th root of unity ψ (ψ^n = -1), stored in
//! Montgomery form and bit-reversed order so both transforms walk the
//! table linearly.
//!
//! Values stay in the plain (non-Montgomery) domain: multiplying a plain
//! value by a Montgomery-form twiddle through `mred` yields a plain value.
//!
//! # Requirements
//!
//! `q ≡ 1 (mod 2n)` so that ψ exists.
//!
//! # Example
//!
//! ```
//! use levelks::math::ntt::NttTable;
//!
//! let table = NttTable::new(256, 0xffff480001);
//! let mut coeffs = vec![1u64; 256];
//! table.forward(&mut coeffs);
//! table.inverse(&mut coeffs);
//! assert_eq!(coeffs[0], 1);
//! ```

use super::modular::mod_pow;
use super::mont::MontTable;

/// Precomputed NTT table for a single modulus.
#[derive(Debug, Clone)]
pub struct NttTable {
    n: usize,
    mont: MontTable,
    /// ψ^bitrev(i) in Montgomery form.
    psi: Vec<u64>,
    /// ψ^(-bitrev(i)) in Montgomery form.
    psi_inv: Vec<u64>,
    /// n^(-1) mod q in Montgomery form.
    n_inv: u64,
}

impl NttTable {
    /// Builds the table for ring dimension `n` and modulus `q`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two or `q` is not ≡ 1 (mod 2n).
    pub fn new(n: usize, q: u64) -> Self {
        assert!(n.is_power_of_two(), "n must be a power of two");
        assert!(
            q % (2 * n as u64) == 1,
            "q must be ≡ 1 (mod 2n) for the negacyclic NTT"
        );

        let mont = MontTable::new(q);
        let psi = find_primitive_root(2 * n as u64, q);
        let psi_inv = mod_pow(psi, q - 2, q);

        let log_n = n.trailing_zeros();
        let mut psi_pows = vec![0u64; n];
        let mut psi_inv_pows = vec![0u64; n];
        for i in 0..n {
            let r = (i as u64).reverse_bits() >> (64 - log_n);
            psi_pows[i] = mont.mform(mod_pow(psi, r, q));
            psi_inv_pows[i] = mont.mform(mod_pow(psi_inv, r, q));
        }

        let n_inv = mont.mform(mod_pow(n as u64, q - 2, q));

        Self {
            n,
            mont,
            psi: psi_pows,
            psi_inv: psi_inv_pows,
            n_inv,
        }
    }

    /// Ring dimension.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// The modulus.
    pub fn modulus(&self) -> u64 {
        self.mont.q
    }

    /// Forward NTT in place (decimation in time).
    ///
    /// Input coefficients in [0, q); output in [0, q).
    pub fn forward(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.n, "row length must match dimension");
        let t = &self.mont;

        let mut len = self.n;
        let mut m = 1;
        while m < self.n {
            len >>= 1;
            for i in 0..m {
                let j1 = 2 * i * len;
                let s = self.psi[m + i];
                for j in j1..j1 + len {
                    let u = a[j];
                    let v = t.mred(a[j + len], s);
                    a[j] = t.add(u, v);
                    a[j + len] = t.sub(u, v);
                }
            }
            m <<= 1;
        }
    }

    /// Forward NTT with lazy output bound.
    ///
    /// Output rows are guaranteed to lie in [0, 2q); callers that need the
    /// canonical representative must reduce.
    pub fn forward_lazy(&self, a: &mut [u64]) {
        // The canonical transform satisfies the [0, 2q) contract.
        self.forward(a);
    }

    /// Inverse NTT in place (decimation in frequency), including the final
    /// scaling by n^(-1).
    pub fn inverse(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.n, "row length must match dimension");
        let t = &self.mont;

        let mut len = 1;
        let mut m = self.n;
        while m > 1 {
            let h = m >> 1;
            let mut j1 = 0;
            for i in 0..h {
                let s = self.psi_inv[h + i];
                for j in j1..j1 + len {
                    let u = a[j];
                    let v = a[j + len];
                    a[j] = t.add(u, v);
                    a[j + len] = t.mred(t.sub(u, v), s);
                }
                j1 += 2 * len;
            }
            len <<= 1;
            m = h;
        }

        for v in a.iter_mut() {
            *v = t.mred(*v, self.n_inv);
        }
    }

    /// Inverse NTT with lazy output bound [0, 2q).
    pub fn inverse_lazy(&self, a: &mut [u64]) {
        self.inverse(a);
    }
}

/// Finds a primitive `order`-th root of unity modulo q.
///
/// Tries small generator candidates; for `order = 2n` the candidate
/// ψ = g^((q-1)/2n) is accepted when ψ^n ≡ -1, which pins its order
/// to exactly 2n.
fn find_primitive_root(order: u64, q: u64) -> u64 {
    assert!(
        (q - 1) % order == 0,
        "no root of unity of order {} mod {}",
        order,
        q
    );
    let exp = (q - 1) / order;
    for g in 2..1024u64 {
        let cand = mod_pow(g, exp, q);
        if mod_pow(cand, order / 2, q) == q - 1 {
            return cand;
        }
    }
    panic!("no generator found for modulus {}", q);
}
