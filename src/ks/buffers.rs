//! Scratch buffers for one switcher instance.
//!
//! Sized once at construction for the worst case (`levelQ = Q − 1` and the
//! largest auxiliary ring) so no allocation happens during a switch. Not
//! shared between threads; [`crate::ks::KeySwitcher::shallow_copy`] gives
//! every worker its own set.

use crate::params::Params;
use crate::ring::{Poly, PolyQp};

/// Per-switcher scratch polynomials.
///
/// Roles during a switch:
/// - `qp[0]` — the on-the-fly decomposition of the current digit
/// - `qp[1]`, `qp[2]` — special-part accumulators of the two output polys
/// - `qp[3]` — staging rows for the NTT-domain mod-down
/// - `la` — level-aware sums of switching-key rows when a canonical key is
///   grouped inline
/// - `ntt`, `inv_ntt` — the pre-scaled input in both domains
#[derive(Debug)]
pub struct SwitcherBuffers {
    pub qp: [PolyQp; 4],
    pub la: [PolyQp; 2],
    pub ntt: Poly,
    pub inv_ntt: Poly,
}

impl SwitcherBuffers {
    /// Allocates worst-case buffers for a parameter set.
    pub fn new(params: &Params) -> Self {
        let n = params.n();
        let q_rows = params.q_count();
        // Largest auxiliary ring in the family: (beta/2)·P reused primes
        // plus the P special primes.
        let p_rows = (params.beta() / 2 + 1) * params.p_count();

        let qp = std::array::from_fn(|_| PolyQp::zero(q_rows, p_rows, n));
        let la = std::array::from_fn(|_| PolyQp::zero(q_rows, p_rows, n));

        Self {
            qp,
            la,
            ntt: Poly::zero(q_rows, n),
            inv_ntt: Poly::zero(q_rows, n),
        }
    }
}
