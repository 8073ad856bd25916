//! RNS basis changes: gadget decomposition and mod-down.
//!
//! Both engines use the float-corrected fast base conversion: given the
//! residues `x_j` of a value modulo a source basis `D = Π d_j`, compute
//! `y_j = x_j · (D/d_j)^{-1} mod d_j`, then for any target modulus `m`
//!
//! ```text
//! x mod m = Σ_j y_j · (D/d_j) − v·D   with   v = round(Σ_j y_j / d_j)
//! ```
//!
//! Rounding `v` (instead of flooring) yields the *centered* representative
//! of `x` up to a ±1 slip on the correction, which the hybrid key-switching
//! noise budget absorbs. All per-window constants are precomputed at
//! construction; the conversion itself allocates nothing.

use num_bigint::BigUint;
use num_traits::One;

use crate::math::{mod_inverse, ModQ};

use super::poly::{Poly, PolyQp};
use super::rns::RnsRing;

/// Upper bound on the width of a conversion basis. Wide enough for any
/// admissible special-modulus size and keeps the per-coefficient residue
/// scratch on the stack.
const MAX_BASE: usize = 64;

/// Largest supported prime size. The conversion accumulates up to
/// `MAX_BASE` products of two residues in a u128.
const MAX_PRIME_BITS: u32 = 52;

fn assert_prime_sizes(moduli: &[u64]) {
    for &q in moduli {
        assert!(
            q < 1u64 << MAX_PRIME_BITS,
            "modulus {:#x} exceeds the supported {} bits",
            q,
            MAX_PRIME_BITS
        );
    }
}

fn big_mod_u64(x: &BigUint, m: u64) -> u64 {
    (x % m).to_u64_digits().first().copied().unwrap_or(0)
}

/// Precomputed conversion constants from one source basis to fixed `Q` and
/// special target lists.
#[derive(Debug, Clone)]
struct ConvTable {
    /// `(D/d_j)^{-1} mod d_j` per source prime.
    d_hat_inv: Vec<u64>,
    /// `1 / d_j` as f64, for the correction term.
    d_inv_f: Vec<f64>,
    /// `(D/d_j) mod q_r` for every `Q` target.
    lift_q: Vec<Vec<u64>>,
    /// `D mod q_r` per `Q` target.
    d_mod_q: Vec<u64>,
    /// `(D/d_j) mod p_l` for every special target.
    lift_p: Vec<Vec<u64>>,
    /// `D mod p_l` per special target.
    d_mod_p: Vec<u64>,
}

impl ConvTable {
    fn new(source: &[u64], q_targets: &[u64], p_targets: &[u64]) -> Self {
        let mut d = BigUint::one();
        for &w in source {
            d *= w;
        }

        let mut d_hat_inv = Vec::with_capacity(source.len());
        let mut d_inv_f = Vec::with_capacity(source.len());
        let mut hats = Vec::with_capacity(source.len());
        for &w in source {
            let hat = &d / w;
            d_hat_inv.push(mod_inverse(big_mod_u64(&hat, w), w));
            d_inv_f.push(1.0 / w as f64);
            hats.push(hat);
        }

        let lift_for = |m: u64| -> Vec<u64> { hats.iter().map(|h| big_mod_u64(h, m)).collect() };

        Self {
            d_hat_inv,
            d_inv_f,
            lift_q: q_targets.iter().map(|&m| lift_for(m)).collect(),
            d_mod_q: q_targets.iter().map(|&m| big_mod_u64(&d, m)).collect(),
            lift_p: p_targets.iter().map(|&m| lift_for(m)).collect(),
            d_mod_p: p_targets.iter().map(|&m| big_mod_u64(&d, m)).collect(),
        }
    }

    /// Residues `y_j` and correction `v` for one coefficient of the source.
    #[inline]
    fn residues(
        &self,
        source_moduli: &[u64],
        rows: &[Vec<u64>],
        col: usize,
        y: &mut [u64; MAX_BASE],
    ) -> u64 {
        let t = source_moduli.len();
        let mut corr = 0.0f64;
        for j in 0..t {
            let yj = ModQ::mul(rows[j][col], self.d_hat_inv[j], source_moduli[j]);
            y[j] = yj;
            corr += yj as f64 * self.d_inv_f[j];
        }
        (corr + 0.5) as u64
    }

    /// Projects one coefficient onto target `m`.
    #[inline]
    fn project(&self, y: &[u64], v: u64, lift: &[u64], d_mod: u64, m: u64) -> u64 {
        let mut acc: u128 = 0;
        for (yj, lj) in y.iter().zip(lift.iter()) {
            acc += *yj as u128 * *lj as u128;
        }
        let pos = (acc % m as u128) as u64;
        let neg = ((v as u128 * d_mod as u128) % m as u128) as u64;
        ModQ::sub(pos, neg, m)
    }
}

/// Gadget decomposition engine: extracts one RNS digit of a polynomial and
/// lifts it to the `Q` and special bases.
///
/// Bound to a ciphertext ring and one auxiliary ring; the digit width
/// `alpha` is the auxiliary ring's size.
#[derive(Debug, Clone)]
pub struct Decomposer {
    alpha: usize,
    q_moduli: Vec<u64>,
    p_moduli: Vec<u64>,
    /// `windows[w][t-1]`: constants for digit `w` truncated to `t` primes.
    windows: Vec<Vec<ConvTable>>,
}

impl Decomposer {
    /// Builds the decomposer for `ring_q` digits lifted into `ring_aux`.
    pub fn new(ring_q: &RnsRing, ring_aux: &RnsRing) -> Self {
        let alpha = ring_aux.moduli().len();
        let q_count = ring_q.moduli().len();
        assert!(alpha <= MAX_BASE, "digit width exceeds {}", MAX_BASE);
        assert_prime_sizes(ring_q.moduli());
        assert_prime_sizes(ring_aux.moduli());

        let windows = (0..q_count.div_ceil(alpha))
            .map(|w| {
                let start = w * alpha;
                let max_t = alpha.min(q_count - start);
                (1..=max_t)
                    .map(|t| {
                        ConvTable::new(
                            &ring_q.moduli()[start..start + t],
                            ring_q.moduli(),
                            ring_aux.moduli(),
                        )
                    })
                    .collect()
            })
            .collect();

        Self {
            alpha,
            q_moduli: ring_q.moduli().to_vec(),
            p_moduli: ring_aux.moduli().to_vec(),
            windows,
        }
    }

    /// The digit width (number of source primes per digit).
    pub fn alpha(&self) -> usize {
        self.alpha
    }

    /// Extracts digit `digit` of `input` (coefficient form) and lifts it to
    /// the full `Q` basis (`out_q`) and the special basis (`out_p`).
    ///
    /// Rows of `out_q` inside the digit's home window receive the exact
    /// source residues; every other row receives the centered fast-base
    /// conversion of the digit. Outputs are in coefficient form.
    pub fn decompose_and_split(
        &self,
        level_q: usize,
        level_p: usize,
        alpha: usize,
        digit: usize,
        input: &Poly,
        out_q: &mut Poly,
        out_p: &mut Poly,
    ) {
        debug_assert_eq!(alpha, self.alpha, "digit width mismatch");
        debug_assert_eq!(level_p, self.alpha - 1, "special level mismatch");
        debug_assert!(!input.is_ntt, "decomposition input must be in coefficient form");

        let start = digit * alpha;
        let end = (start + alpha).min(level_q + 1);
        debug_assert!(start < end, "digit {} is empty at level {}", digit, level_q);
        let t = end - start;
        let table = &self.windows[digit][t - 1];
        let source_moduli = &self.q_moduli[start..end];

        // Home-window rows: the digit equals the source there.
        for j in 0..t {
            out_q.coeffs[start + j].copy_from_slice(&input.coeffs[start + j]);
        }

        let n = input.dimension();
        let mut y = [0u64; MAX_BASE];
        for col in 0..n {
            let v = table.residues(source_moduli, &input.coeffs[start..end], col, &mut y);

            for r in 0..=level_q {
                if r >= start && r < end {
                    continue;
                }
                out_q.coeffs[r][col] =
                    table.project(&y[..t], v, &table.lift_q[r], table.d_mod_q[r], self.q_moduli[r]);
            }
            for l in 0..=level_p {
                out_p.coeffs[l][col] =
                    table.project(&y[..t], v, &table.lift_p[l], table.d_mod_p[l], self.p_moduli[l]);
            }
        }

        out_q.is_ntt = false;
        out_p.is_ntt = false;
    }
}

/// Basis extension engine for the mod-down step: divides a `QP` value by
/// the special modulus and rounds, landing back in `R_Q`.
#[derive(Debug, Clone)]
pub struct BasisExtender {
    q_moduli: Vec<u64>,
    p_moduli: Vec<u64>,
    /// Conversion constants per special level, plus `P^{-1} mod q_r`.
    tables: Vec<ConvTable>,
    p_inv_mod_q: Vec<Vec<u64>>,
}

impl BasisExtender {
    /// Builds the extender between a ciphertext ring and one auxiliary ring.
    pub fn new(ring_q: &RnsRing, ring_aux: &RnsRing) -> Self {
        assert_prime_sizes(ring_q.moduli());
        assert_prime_sizes(ring_aux.moduli());
        let alpha = ring_aux.moduli().len();
        assert!(alpha <= MAX_BASE, "special basis exceeds {}", MAX_BASE);

        let mut tables = Vec::with_capacity(alpha);
        let mut p_inv_mod_q = Vec::with_capacity(alpha);
        for level_p in 0..alpha {
            let source = &ring_aux.moduli()[..=level_p];
            tables.push(ConvTable::new(source, ring_q.moduli(), &[]));

            let mut p_big = BigUint::one();
            for &p in source {
                p_big *= p;
            }
            p_inv_mod_q.push(
                ring_q
                    .moduli()
                    .iter()
                    .map(|&q| mod_inverse(big_mod_u64(&p_big, q), q))
                    .collect(),
            );
        }

        Self {
            q_moduli: ring_q.moduli().to_vec(),
            p_moduli: ring_aux.moduli().to_vec(),
            tables,
            p_inv_mod_q,
        }
    }

    /// `a_q = round((a_q || a_p) / P) mod Q`, coefficient form, in place.
    ///
    /// Both inputs must hold canonical (reduced) coefficient-form rows.
    pub fn mod_down_qp_to_q(&self, level_q: usize, level_p: usize, a_q: &mut Poly, a_p: &Poly) {
        debug_assert!(!a_q.is_ntt && !a_p.is_ntt, "mod-down expects coefficient form");
        let table = &self.tables[level_p];
        let p_inv = &self.p_inv_mod_q[level_p];
        let source_moduli = &self.p_moduli[..=level_p];
        let n = a_p.dimension();

        let mut y = [0u64; MAX_BASE];
        for col in 0..n {
            let v = table.residues(source_moduli, &a_p.coeffs[..=level_p], col, &mut y);
            for r in 0..=level_q {
                let q = self.q_moduli[r];
                let ext =
                    table.project(&y[..=level_p], v, &table.lift_q[r], table.d_mod_q[r], q);
                let diff = ModQ::sub(a_q.coeffs[r][col], ext, q);
                a_q.coeffs[r][col] = ModQ::mul(diff, p_inv[r], q);
            }
        }
    }

    /// NTT-domain variant: `a_q = round((a_q || a_p) / P) mod Q` with both
    /// inputs in evaluation form; the result stays in evaluation form.
    ///
    /// `scratch` provides the coefficient-form staging rows (a full `QP`
    /// scratch polynomial from the switcher's buffer pool).
    pub fn mod_down_qp_to_q_ntt(
        &self,
        ring_q: &RnsRing,
        ring_aux: &RnsRing,
        level_q: usize,
        level_p: usize,
        a_q: &mut Poly,
        a_p: &Poly,
        scratch: &mut PolyQp,
    ) {
        debug_assert!(a_q.is_ntt && a_p.is_ntt, "mod-down NTT expects evaluation form");
        let table = &self.tables[level_p];
        let p_inv = &self.p_inv_mod_q[level_p];
        let source_moduli = &self.p_moduli[..=level_p];
        let n = a_p.dimension();

        // Special part back to coefficient form.
        scratch.p.copy_lvl(level_p, a_p);
        ring_aux.intt_lvl(level_p, &mut scratch.p);

        // Convert onto Q in coefficient form, then back to evaluation form.
        let mut y = [0u64; MAX_BASE];
        for col in 0..n {
            let v = table.residues(source_moduli, &scratch.p.coeffs[..=level_p], col, &mut y);
            for r in 0..=level_q {
                scratch.q.coeffs[r][col] = table.project(
                    &y[..=level_p],
                    v,
                    &table.lift_q[r],
                    table.d_mod_q[r],
                    self.q_moduli[r],
                );
            }
        }
        scratch.q.is_ntt = false;
        ring_q.ntt_lvl(level_q, &mut scratch.q);

        for r in 0..=level_q {
            let q = self.q_moduli[r];
            for col in 0..n {
                let diff = ModQ::sub(a_q.coeffs[r][col], scratch.q.coeffs[r][col], q);
                a_q.coeffs[r][col] = ModQ::mul(diff, p_inv[r], q);
            }
        }
    }
}
