//! RLWE key material.
//!
//! Keys live over the product basis `Q × P`: a secret key is a small
//! polynomial stored in evaluation (NTT) and Montgomery form on every row,
//! and a switching key is a vector of gadget rows, each an RLWE encryption
//! of a scaled digit of the source secret under the target secret.

use serde::{Deserialize, Serialize};

use crate::ring::PolyQp;

/// RLWE secret key over `Q × P`, in NTT and Montgomery form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretKey {
    /// The secret polynomial's residues on every `q` and `p` row.
    pub value: PolyQp,
}

impl SecretKey {
    /// Wraps an already-prepared `QP` polynomial.
    pub fn from_poly_qp(value: PolyQp) -> Self {
        debug_assert!(value.q.is_ntt && value.p.is_ntt, "secret key must be in NTT form");
        Self { value }
    }
}

/// Switching key from a source to a target secret key.
///
/// `value[i]` holds the two `QP` polynomials of gadget row `i`:
/// `value[i][0] = -a_i·s_out + e_i + P·g_i·s_in` and `value[i][1] = a_i`,
/// both in NTT and Montgomery form.
///
/// `group` records how many canonical gadget digits each row aggregates:
/// `1` for a freshly generated (canonical) key, `sp + 1` after
/// [`crate::ks::KeySwitcher::preprocess_switch_key`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchingKey {
    pub value: Vec<[PolyQp; 2]>,
    pub group: usize,
}

impl SwitchingKey {
    /// Creates a canonical key from its gadget rows.
    pub fn from_rows(value: Vec<[PolyQp; 2]>) -> Self {
        Self { value, group: 1 }
    }

    /// Number of gadget rows.
    pub fn digits(&self) -> usize {
        self.value.len()
    }

    /// Whether this key is canonical (not pre-grouped).
    pub fn is_canonical(&self) -> bool {
        self.group == 1
    }
}
