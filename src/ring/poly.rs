//! RNS polynomial representations.
//!
//! A polynomial of `R_Q = Z_Q[X]/(X^N + 1)` is stored as one coefficient
//! row per RNS prime: `coeffs[i][j]` is the j-th coefficient modulo `q_i`.
//! Operations are *leveled*: they touch rows `0..=level` and leave the
//! rest untouched, so one allocation serves every level.
//!
//! `is_ntt` records whether the rows currently hold evaluation (NTT) or
//! coefficient form; ring operations respect and update it.

use serde::{Deserialize, Serialize};

/// Polynomial in RNS representation, one row per modulus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poly {
    /// Coefficient rows, `coeffs[i][j] = c_j mod q_i`.
    pub coeffs: Vec<Vec<u64>>,
    /// Whether rows are in evaluation (NTT) form.
    pub is_ntt: bool,
}

impl Poly {
    /// Allocates a zero polynomial with `rows` rows of dimension `n`.
    pub fn zero(rows: usize, n: usize) -> Self {
        Self {
            coeffs: vec![vec![0u64; n]; rows],
            is_ntt: false,
        }
    }

    /// Number of allocated rows.
    pub fn rows(&self) -> usize {
        self.coeffs.len()
    }

    /// Highest level this polynomial can hold.
    pub fn max_level(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// Ring dimension.
    pub fn dimension(&self) -> usize {
        self.coeffs.first().map_or(0, |r| r.len())
    }

    /// Copies rows `0..=level` from `src`, taking over its NTT flag.
    pub fn copy_lvl(&mut self, level: usize, src: &Poly) {
        for (dst, s) in self.coeffs[..=level].iter_mut().zip(&src.coeffs[..=level]) {
            dst.copy_from_slice(s);
        }
        self.is_ntt = src.is_ntt;
    }

    /// Zeroes rows `0..=level`.
    pub fn zero_lvl(&mut self, level: usize) {
        for row in self.coeffs[..=level].iter_mut() {
            row.fill(0);
        }
    }
}

/// A polynomial over the product basis `Q × P`: a `Q` part and a special
/// (auxiliary) part, kept as two separately leveled polynomials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolyQp {
    pub q: Poly,
    pub p: Poly,
}

impl PolyQp {
    /// Allocates a zero `QP` polynomial.
    pub fn zero(q_rows: usize, p_rows: usize, n: usize) -> Self {
        Self {
            q: Poly::zero(q_rows, n),
            p: Poly::zero(p_rows, n),
        }
    }
}

/// A read-only reshaping of a canonical `QP` polynomial onto a larger
/// special modulus.
///
/// The extended special basis is `[q_{Q-kP}, …, q_{Q-1}, p_0, …, p_{P-1}]`:
/// its first `k·P` rows are the *top* rows of the `Q` part, reused in
/// place, and its last `P` rows are the original `P` part. No coefficient
/// is moved; the view borrows the rows and lives no longer than the
/// switching key it was taken from.
#[derive(Debug, Clone, Copy)]
pub struct PolyQpView<'a> {
    /// Active `Q` rows (`0..=level_q` of the source).
    q: &'a [Vec<u64>],
    /// Reused top `Q` rows, serving as the leading special rows.
    p_hi: &'a [Vec<u64>],
    /// The source's own `P` rows, serving as the trailing special rows.
    p_lo: &'a [Vec<u64>],
}

impl<'a> PolyQpView<'a> {
    /// Reshapes `src` so that its special part spans `k·P + P` rows.
    ///
    /// `level_q` bounds the active `Q` rows; `k_p` is the number of top
    /// `Q` rows reused as special rows (`k·P`); `level_p` is the level of
    /// the extended special part, `k·P + P - 1`.
    ///
    /// The reused rows must not overlap the active rows, which the level
    /// policy guarantees.
    pub fn extend(src: &'a PolyQp, level_q: usize, k_p: usize, level_p: usize) -> Self {
        let q_rows = src.q.rows();
        debug_assert!(
            level_q < q_rows - k_p,
            "active rows overlap the reused special rows"
        );
        debug_assert_eq!(level_p + 1, k_p + src.p.rows(), "special part size mismatch");
        Self {
            q: &src.q.coeffs[..=level_q],
            p_hi: &src.q.coeffs[q_rows - k_p..],
            p_lo: &src.p.coeffs[..],
        }
    }

    /// Number of active `Q` rows.
    pub fn q_rows(&self) -> usize {
        self.q.len()
    }

    /// Number of special rows after reshaping.
    pub fn p_rows(&self) -> usize {
        self.p_hi.len() + self.p_lo.len()
    }

    /// Row `i` of the `Q` part.
    #[inline]
    pub fn q_row(&self, i: usize) -> &'a [u64] {
        &self.q[i]
    }

    /// Row `l` of the reshaped special part.
    #[inline]
    pub fn p_row(&self, l: usize) -> &'a [u64] {
        if l < self.p_hi.len() {
            &self.p_hi[l]
        } else {
            &self.p_lo[l - self.p_hi.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted_poly_qp(q_rows: usize, p_rows: usize, n: usize) -> PolyQp {
        // Row i of Q gets value i, row l of P gets 1000 + l.
        let mut q = Poly::zero(q_rows, n);
        for (i, row) in q.coeffs.iter_mut().enumerate() {
            row.fill(i as u64);
        }
        let mut p = Poly::zero(p_rows, n);
        for (l, row) in p.coeffs.iter_mut().enumerate() {
            row.fill(1000 + l as u64);
        }
        PolyQp { q, p }
    }

    #[test]
    fn test_extend_is_a_pure_reshaping() {
        let q_rows = 12;
        let p_count = 2;
        let k = 2; // reuse the top 4 Q rows
        let k_p = k * p_count;
        let level_q = 5;
        let level_p = k_p + p_count - 1;

        let src = counted_poly_qp(q_rows, p_count, 8);
        let view = PolyQpView::extend(&src, level_q, k_p, level_p);

        // Q rows are untouched.
        for i in 0..=level_q {
            assert_eq!(view.q_row(i)[0], i as u64);
        }
        // Leading special rows are the top Q rows, in order.
        for l in 0..k_p {
            assert_eq!(view.p_row(l)[0], (q_rows - k_p + l) as u64);
        }
        // Trailing special rows are the original P rows.
        for l in k_p..=level_p {
            assert_eq!(view.p_row(l)[0], 1000 + (l - k_p) as u64);
        }
        // The concatenated view is a permutation of source rows: count them.
        assert_eq!(view.q_rows() + view.p_rows(), level_q + 1 + k_p + p_count);
    }

    #[test]
    fn test_copy_lvl_partial() {
        let mut a = Poly::zero(4, 4);
        let mut b = Poly::zero(4, 4);
        for row in b.coeffs.iter_mut() {
            row.fill(9);
        }
        b.is_ntt = true;
        a.copy_lvl(1, &b);
        assert_eq!(a.coeffs[0], vec![9; 4]);
        assert_eq!(a.coeffs[1], vec![9; 4]);
        assert_eq!(a.coeffs[2], vec![0; 4]);
        assert!(a.is_ntt);
    }
}
