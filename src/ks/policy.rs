//! The level policy: choosing the special-modulus size per level.
//!
//! At level `levelQ` the switcher may enlarge the special modulus to
//! `(sp+1)·P` by reusing the top `sp·P` ciphertext primes. Larger special
//! moduli mean fewer, wider gadget digits. The policy minimizes
//!
//! ```text
//! cost(levelQ, sp) = (decompSize + 2) · (levelQ + levelSP + 2)
//!   where levelSP    = (sp+1)·P − 1
//!         decompSize = ceil((levelQ+1) / (levelSP+1))
//! ```
//!
//! subject to `levelQ + levelSP + 2 ≤ Q + P` (the reused primes must not
//! overlap the active ones). `decompSize` counts the RNS multiplies of the
//! inner product, the second factor is the width of each multiply, and the
//! `+2` models the fixed pre-scale and mod-down overhead.
//!
//! The map is computed once and stored densely; the first admissible `sp`
//! attaining the minimum wins.

use crate::params::Params;

/// Dense `level → sp` lookup.
#[derive(Debug, Clone)]
pub struct LevelPolicy {
    sp: Vec<usize>,
}

impl LevelPolicy {
    /// Computes the optimal table for a parameter set.
    pub fn new(params: &Params) -> Self {
        let q_count = params.q_count();
        let mut sp = vec![0usize; q_count];

        for (level_q, slot) in sp.iter_mut().enumerate() {
            let mut min_cost = usize::MAX;
            for k in 0..params.beta() / 2 {
                match Self::cost(params, level_q, k) {
                    Some(cost) if cost < min_cost => {
                        min_cost = cost;
                        *slot = k;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }

        Self { sp }
    }

    /// The cost of switching at `level_q` with special-modulus index `k`,
    /// or `None` if `k` is not admissible at that level.
    pub fn cost(params: &Params, level_q: usize, k: usize) -> Option<usize> {
        let p_count = params.p_count();
        let level_sp = p_count * (k + 1) - 1;
        if level_q + level_sp + 2 > params.q_count() + p_count {
            return None;
        }
        let decomp_size = (level_q + 1).div_ceil(level_sp + 1);
        Some((decomp_size + 2) * (level_q + level_sp + 2))
    }

    /// The chosen special-modulus index for `level_q`.
    #[inline]
    pub fn sp_index(&self, level_q: usize) -> usize {
        self.sp[level_q]
    }

    /// Number of levels covered.
    pub fn len(&self) -> usize {
        self.sp.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.sp.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chosen_sp_is_admissible_and_optimal() {
        let params = Params::research();
        let policy = LevelPolicy::new(&params);

        for level_q in 0..params.q_count() {
            let k = policy.sp_index(level_q);
            let chosen = LevelPolicy::cost(&params, level_q, k)
                .expect("chosen sp must be admissible");

            // (sp+1)·P special primes must fit above the active levels.
            let level_sp = params.p_count() * (k + 1) - 1;
            assert!(level_q + level_sp + 2 <= params.q_count() + params.p_count());

            for other in 0..params.beta() / 2 {
                if let Some(cost) = LevelPolicy::cost(&params, level_q, other) {
                    assert!(
                        chosen <= cost,
                        "level {}: sp {} (cost {}) beaten by sp {} (cost {})",
                        level_q,
                        k,
                        chosen,
                        other,
                        cost
                    );
                }
            }
        }
    }

    #[test]
    fn test_low_levels_use_small_special_modulus() {
        let params = Params::research();
        let policy = LevelPolicy::new(&params);
        // At level 0 a single digit suffices; widening only adds width.
        assert_eq!(policy.sp_index(0), 0);
    }

    #[test]
    fn test_mid_levels_widen_the_special_modulus() {
        let params = Params::research();
        let policy = LevelPolicy::new(&params);
        // In the middle of the chain fewer, wider digits win.
        assert!(policy.sp_index(28) > 0);
        // At the very top the reused primes would overlap the active ones,
        // so only the plain special modulus is admissible.
        assert_eq!(policy.sp_index(params.max_level()), 0);
    }
}
