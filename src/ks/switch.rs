//! Level-aware hybrid key-switching.
//!
//! Given a ciphertext polynomial `cx` under a source secret and a
//! switching key toward a target secret, computes the two polynomials of
//! the switched ciphertext without decrypting:
//!
//! 1. Pre-scale `cx` by `PkDivP[sp]` so the digit scale matches the
//!    enlarged special modulus.
//! 2. Gadget-decompose the result into `ceil((levelQ+1)/alpha)` digits,
//!    each lifted to the `Q × P_sp` basis.
//! 3. Inner-product the digits with the switching-key rows using lazy
//!    Montgomery multiply-accumulates, reducing only when the overflow
//!    margin requires it.
//! 4. Optionally divide by the special modulus (`mod-down`) to land back
//!    in `R_Q`.
//!
//! The special-modulus size `sp` is chosen per level by the
//! [`LevelPolicy`]; switching-key rows generated for the canonical layout
//! are reshaped on the fly ([`KeySwitcher::extend_special_modulus`]) or
//! pre-grouped once ([`KeySwitcher::preprocess_switch_key`]).
//!
//! A switcher is cheap to fork: [`KeySwitcher::shallow_copy`] shares all
//! precomputed state and allocates only fresh scratch buffers, which is
//! the intended pattern for parallel workers.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::params::Params;
use crate::ring::{Poly, PolyQp, PolyQpView, RnsRing};
use crate::rlwe::SwitchingKey;

use super::buffers::SwitcherBuffers;
use super::family::RingFamily;
use super::policy::LevelPolicy;

/// Row access shared by borrowed reshapes and owned scratch operands.
pub(crate) trait QpRows {
    fn q_row(&self, i: usize) -> &[u64];
    fn p_row(&self, l: usize) -> &[u64];
}

impl QpRows for PolyQpView<'_> {
    #[inline]
    fn q_row(&self, i: usize) -> &[u64] {
        PolyQpView::q_row(self, i)
    }
    #[inline]
    fn p_row(&self, l: usize) -> &[u64] {
        PolyQpView::p_row(self, l)
    }
}

impl QpRows for PolyQp {
    #[inline]
    fn q_row(&self, i: usize) -> &[u64] {
        &self.q.coeffs[i]
    }
    #[inline]
    fn p_row(&self, l: usize) -> &[u64] {
        &self.p.coeffs[l]
    }
}

/// Immutable state shared by all shallow copies of a switcher.
pub(crate) struct SwitcherCore {
    pub(crate) params: Params,
    pub(crate) ring_q: RnsRing,
    pub(crate) family: RingFamily,
    pub(crate) policy: LevelPolicy,
}

/// The key switcher.
pub struct KeySwitcher {
    core: Arc<SwitcherCore>,
    buf: SwitcherBuffers,
    /// Per-level override of the policy table (research knob).
    sp_override: Vec<Option<usize>>,
}

impl KeySwitcher {
    /// Builds a switcher for a parameter set.
    ///
    /// # Panics
    ///
    /// Panics if the parameters are invalid or `p_count` does not divide
    /// `q_count` (the level-aware layout reuses whole special blocks).
    pub fn new(params: Params) -> Self {
        if let Err(e) = params.validate() {
            panic!("invalid parameters: {}", e);
        }
        assert!(
            params.q_count() % params.p_count() == 0,
            "p_count must divide q_count"
        );

        let ring_q = RnsRing::new(params.n(), params.q());
        let family = RingFamily::new(&params, &ring_q);
        let policy = LevelPolicy::new(&params);
        debug!(
            levels = params.q_count(),
            beta = params.beta(),
            "key switcher ready"
        );

        let buf = SwitcherBuffers::new(&params);
        let sp_override = vec![None; params.q_count()];

        Self {
            core: Arc::new(SwitcherCore {
                params,
                ring_q,
                family,
                policy,
            }),
            buf,
            sp_override,
        }
    }

    /// Forks the switcher for another worker thread: shares the parameter
    /// set, rings, engines, and policy; allocates fresh buffers.
    pub fn shallow_copy(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            buf: SwitcherBuffers::new(&self.core.params),
            sp_override: self.sp_override.clone(),
        }
    }

    /// The parameter set.
    pub fn params(&self) -> &Params {
        &self.core.params
    }

    /// The ciphertext ring.
    pub fn ring_q(&self) -> &RnsRing {
        &self.core.ring_q
    }

    /// The special-modulus size index used at `level_q` (override first,
    /// then the policy table).
    pub fn sp_index(&self, level_q: usize) -> usize {
        self.sp_override[level_q].unwrap_or_else(|| self.core.policy.sp_index(level_q))
    }

    /// The special level at `level_q`: `(sp+1)·P − 1`.
    pub fn level_pk(&self, level_q: usize) -> usize {
        (self.sp_index(level_q) + 1) * self.core.params.p_count() - 1
    }

    /// Overrides the policy at one level (research knob).
    ///
    /// # Panics
    ///
    /// Panics if `k` has no precomputed ring or is not admissible at
    /// `level_q`.
    pub fn set_sp_index(&mut self, level_q: usize, k: usize) {
        assert!(
            k <= self.core.family.max_sp(),
            "special-modulus size out of range"
        );
        assert!(
            LevelPolicy::cost(&self.core.params, level_q, k).is_some(),
            "special-modulus size not admissible at this level"
        );
        self.sp_override[level_q] = Some(k);
    }

    /// Reshapes a canonical `QP` polynomial onto the special modulus used
    /// at `level_q`. Pure reindexing: the view borrows the input's rows.
    pub fn extend_special_modulus<'a>(&self, level_q: usize, input: &'a PolyQp) -> PolyQpView<'a> {
        let k = self.sp_index(level_q);
        PolyQpView::extend(
            input,
            level_q,
            k * self.core.params.p_count(),
            self.level_pk(level_q),
        )
    }

    /// Groups the canonical digits of `swk` in runs of `sp + 1`, summing
    /// the grouped rows once so the switch loop does one MAC per compound
    /// digit. Pure: the input key is not modified. `sp = 0` is a no-op.
    pub fn preprocess_switch_key(&self, sp: usize, swk: &SwitchingKey) -> SwitchingKey {
        assert!(swk.is_canonical(), "switching key is already pre-processed");
        assert!(
            sp <= self.core.family.max_sp(),
            "special-modulus size out of range"
        );
        if sp == 0 {
            return swk.clone();
        }

        let core = &*self.core;
        let ring_q = &core.ring_q;
        let ring_p = core.family.ring(0);
        let level_q = core.params.max_level();
        let level_p = core.params.p_count() - 1;

        let value: Vec<[PolyQp; 2]> = swk
            .value
            .par_chunks(sp + 1)
            .map(|chunk| {
                let mut acc = chunk[0].clone();
                for row in &chunk[1..] {
                    for side in 0..2 {
                        ring_q.add_assign_lvl(level_q, &row[side].q, &mut acc[side].q);
                        ring_p.add_assign_lvl(level_p, &row[side].p, &mut acc[side].p);
                    }
                }
                acc
            })
            .collect();

        SwitchingKey {
            value,
            group: sp + 1,
        }
    }

    /// Allocates a hoisting buffer able to hold every digit of a
    /// decomposition at any level.
    pub fn new_hoist_buffer(&self) -> Vec<PolyQp> {
        let p = &self.core.params;
        let p_rows = (p.beta() / 2 + 1) * p.p_count();
        (0..p.beta())
            .map(|_| PolyQp::zero(p.q_count(), p_rows, p.n()))
            .collect()
    }

    /// Decomposes a single digit of the pre-scaled polynomial, given in
    /// both domains, into `(out_q, out_p)` in evaluation form.
    ///
    /// Rows inside the digit's home window are copied verbatim from the
    /// evaluation-form input (the digit equals the source there); all
    /// other rows are base-converted and transformed.
    #[allow(clippy::too_many_arguments)]
    pub fn decompose_single_ntt(
        &self,
        level_q: usize,
        level_p: usize,
        alpha: usize,
        digit: usize,
        c2_ntt: &Poly,
        c2_inv_ntt: &Poly,
        out_q: &mut Poly,
        out_p: &mut Poly,
    ) {
        let k = level_p / self.core.params.p_count();
        decompose_single(
            &self.core, k, level_q, level_p, alpha, digit, c2_ntt, c2_inv_ntt, out_q, out_p,
        );
    }

    /// Pre-scales `c2` and decomposes all of its digits into `out`: the
    /// hoisting entry point, run once per ciphertext and shared by any
    /// number of key switches at the same level.
    pub fn decompose_ntt(
        &mut self,
        level_q: usize,
        level_p: usize,
        alpha: usize,
        c2: &Poly,
        out: &mut [PolyQp],
    ) {
        let k = level_p / self.core.params.p_count();
        let core = &*self.core;
        let buf = &mut self.buf;

        prescale(core, k, level_q, c2, &mut buf.ntt, &mut buf.inv_ntt);

        let decomp_size = (level_q + 1).div_ceil(level_p + 1);
        assert!(out.len() >= decomp_size, "hoist buffer too small");

        for (digit, slot) in out.iter_mut().enumerate().take(decomp_size) {
            decompose_single(
                core,
                k,
                level_q,
                level_p,
                alpha,
                digit,
                &buf.ntt,
                &buf.inv_ntt,
                &mut slot.q,
                &mut slot.p,
            );
        }
    }

    /// The full switch: accumulators over `Q × P_sp` followed by the
    /// mod-down to `R_Q`. The outputs keep the NTT domain of `cx`.
    pub fn switch_keys_in_place(
        &mut self,
        level_q: usize,
        cx: &Poly,
        swk: &SwitchingKey,
        p0: &mut Poly,
        p1: &mut Poly,
    ) {
        let k = self.sp_index(level_q);
        let level_sp = (k + 1) * self.core.params.p_count() - 1;
        let core = &*self.core;
        let SwitcherBuffers {
            qp, la, ntt, inv_ntt,
        } = &mut self.buf;
        let [c2, acc0, acc1, md] = qp;

        prescale(core, k, level_q, cx, ntt, inv_ntt);
        switch_no_mod_down(
            core,
            k,
            level_q,
            ntt,
            inv_ntt,
            c2,
            la,
            swk,
            p0,
            &mut acc0.p,
            p1,
            &mut acc1.p,
        );

        let ext = core.family.extender(k);
        let aux = core.family.ring(k);
        if cx.is_ntt {
            ext.mod_down_qp_to_q_ntt(&core.ring_q, aux, level_q, level_sp, p0, &acc0.p, md);
            ext.mod_down_qp_to_q_ntt(&core.ring_q, aux, level_q, level_sp, p1, &acc1.p, md);
        } else {
            core.ring_q.intt_lazy_lvl(level_q, p0);
            core.ring_q.intt_lazy_lvl(level_q, p1);
            aux.intt_lazy_lvl(level_sp, &mut acc0.p);
            aux.intt_lazy_lvl(level_sp, &mut acc1.p);
            ext.mod_down_qp_to_q(level_q, level_sp, p0, &acc0.p);
            ext.mod_down_qp_to_q(level_q, level_sp, p1, &acc1.p);
        }
    }

    /// The switch without the final mod-down: fills the four accumulators
    /// over `Q × P_sp` (the encrypted input keeps its `P_sp` factor).
    #[allow(clippy::too_many_arguments)]
    pub fn switch_keys_in_place_no_mod_down(
        &mut self,
        level_q: usize,
        cx: &Poly,
        swk: &SwitchingKey,
        c0_q: &mut Poly,
        c0_p: &mut Poly,
        c1_q: &mut Poly,
        c1_p: &mut Poly,
    ) {
        let k = self.sp_index(level_q);
        let core = &*self.core;
        let SwitcherBuffers {
            qp, la, ntt, inv_ntt,
        } = &mut self.buf;
        let [c2, ..] = qp;

        prescale(core, k, level_q, cx, ntt, inv_ntt);
        switch_no_mod_down(
            core, k, level_q, ntt, inv_ntt, c2, la, swk, c0_q, c0_p, c1_q, c1_p,
        );
    }

    /// Key-switch from pre-decomposed digits (see
    /// [`decompose_ntt`](Self::decompose_ntt)), accumulators only.
    ///
    /// The decomposition must have been produced at the same
    /// special-modulus size this switcher resolves for `level_q`.
    #[allow(clippy::too_many_arguments)]
    pub fn keyswitch_hoisted_no_mod_down(
        &mut self,
        level_q: usize,
        decomp: &[PolyQp],
        swk: &SwitchingKey,
        c0_q: &mut Poly,
        c1_q: &mut Poly,
        c0_p: &mut Poly,
        c1_p: &mut Poly,
    ) {
        let k = self.sp_index(level_q);
        let core = &*self.core;
        let la = &mut self.buf.la;
        hoisted_no_mod_down(core, k, level_q, decomp, swk, la, c0_q, c0_p, c1_q, c1_p);
    }

    /// Key-switch from pre-decomposed digits and divide by the special
    /// modulus, writing the `R_Q` results into `c0_q`, `c1_q` (NTT form).
    #[allow(clippy::too_many_arguments)]
    pub fn keyswitch_hoisted(
        &mut self,
        level_q: usize,
        decomp: &[PolyQp],
        swk: &SwitchingKey,
        c0_q: &mut Poly,
        c1_q: &mut Poly,
        c0_p: &mut Poly,
        c1_p: &mut Poly,
    ) {
        let k = self.sp_index(level_q);
        let level_sp = (k + 1) * self.core.params.p_count() - 1;
        let core = &*self.core;
        let SwitcherBuffers { qp, la, .. } = &mut self.buf;
        let [_, _, _, md] = qp;

        hoisted_no_mod_down(core, k, level_q, decomp, swk, la, c0_q, c0_p, c1_q, c1_p);

        let ext = core.family.extender(k);
        let aux = core.family.ring(k);
        ext.mod_down_qp_to_q_ntt(&core.ring_q, aux, level_q, level_sp, c0_q, c0_p, md);
        ext.mod_down_qp_to_q_ntt(&core.ring_q, aux, level_q, level_sp, c1_q, c1_p, md);
    }
}

/// Multiplies `cx` by the pre-scale constant, producing the scaled
/// polynomial in both domains.
fn prescale(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    cx: &Poly,
    ntt: &mut Poly,
    inv_ntt: &mut Poly,
) {
    let ring_q = &core.ring_q;
    let pk_div_p = core.family.pk_div_p(k);
    if cx.is_ntt {
        ring_q.mul_coeffs_montgomery_lvl(level_q, cx, pk_div_p, ntt);
        ring_q.intt_lvl_into(level_q, ntt, inv_ntt);
    } else {
        ring_q.mul_coeffs_montgomery_lvl(level_q, cx, pk_div_p, inv_ntt);
        ring_q.ntt_lvl_into(level_q, inv_ntt, ntt);
    }
}

/// One digit of the decomposition, lifted and transformed.
#[allow(clippy::too_many_arguments)]
fn decompose_single(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    level_sp: usize,
    alpha: usize,
    digit: usize,
    c2_ntt: &Poly,
    c2_inv_ntt: &Poly,
    out_q: &mut Poly,
    out_p: &mut Poly,
) {
    core.family.decomposer(k).decompose_and_split(
        level_q, level_sp, alpha, digit, c2_inv_ntt, out_q, out_p,
    );

    // The digit equals the scaled input on its own moduli: take that row
    // straight from the evaluation-form input instead of re-transforming.
    let home_start = digit * (level_sp + 1);
    let home_end = home_start + 1;
    for x in 0..=level_q {
        if x >= home_start && x < home_end {
            out_q.coeffs[x].copy_from_slice(&c2_ntt.coeffs[x]);
        } else {
            core.ring_q.ntt_single_lazy(x, &mut out_q.coeffs[x]);
        }
    }
    out_q.is_ntt = true;

    core.family.ring(k).ntt_lazy_lvl(level_sp, out_p);
}

/// The accumulators' inner-product loop, decomposing on the fly.
#[allow(clippy::too_many_arguments)]
fn switch_no_mod_down(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    cx_ntt: &Poly,
    cx_inv_ntt: &Poly,
    c2: &mut PolyQp,
    la: &mut [PolyQp; 2],
    swk: &SwitchingKey,
    c0_q: &mut Poly,
    c0_p: &mut Poly,
    c1_q: &mut Poly,
    c1_p: &mut Poly,
) {
    let level_sp = (k + 1) * core.params.p_count() - 1;
    let alpha = level_sp + 1;
    let margin = overflow_margin(core, k, level_sp);
    let decomp_size = (level_q + 1).div_ceil(alpha);

    let mut reduce = 0usize;
    for digit in 0..decomp_size {
        decompose_single(
            core, k, level_q, level_sp, alpha, digit, cx_ntt, cx_inv_ntt, &mut c2.q, &mut c2.p,
        );
        mac_digit(
            core,
            k,
            level_q,
            level_sp,
            digit,
            digit == 0,
            swk,
            la,
            c2,
            c0_q,
            c0_p,
            c1_q,
            c1_p,
        );

        if reduce % margin == margin - 1 {
            reduce_acc(core, k, level_q, level_sp, c0_q, c0_p, c1_q, c1_p);
        }
        reduce += 1;
    }

    if reduce % margin != 0 {
        reduce_acc(core, k, level_q, level_sp, c0_q, c0_p, c1_q, c1_p);
    }

    c0_q.is_ntt = true;
    c0_p.is_ntt = true;
    c1_q.is_ntt = true;
    c1_p.is_ntt = true;
}

/// The inner-product loop over pre-decomposed digits.
#[allow(clippy::too_many_arguments)]
fn hoisted_no_mod_down(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    decomp: &[PolyQp],
    swk: &SwitchingKey,
    la: &mut [PolyQp; 2],
    c0_q: &mut Poly,
    c0_p: &mut Poly,
    c1_q: &mut Poly,
    c1_p: &mut Poly,
) {
    let level_sp = (k + 1) * core.params.p_count() - 1;
    let alpha = level_sp + 1;
    let margin = overflow_margin(core, k, level_sp);
    let decomp_size = (level_q + 1).div_ceil(alpha);
    debug_assert!(decomp.len() >= decomp_size, "decomposition buffer too small");

    let mut reduce = 0usize;
    for (digit, c2) in decomp.iter().enumerate().take(decomp_size) {
        mac_digit(
            core,
            k,
            level_q,
            level_sp,
            digit,
            digit == 0,
            swk,
            la,
            c2,
            c0_q,
            c0_p,
            c1_q,
            c1_p,
        );

        if reduce % margin == margin - 1 {
            reduce_acc(core, k, level_q, level_sp, c0_q, c0_p, c1_q, c1_p);
        }
        reduce += 1;
    }

    if reduce % margin != 0 {
        reduce_acc(core, k, level_q, level_sp, c0_q, c0_p, c1_q, c1_p);
    }

    c0_q.is_ntt = true;
    c0_p.is_ntt = true;
    c1_q.is_ntt = true;
    c1_p.is_ntt = true;
}

/// Half the smaller of the two rings' overflow margins: the lazy-reduce
/// period of the accumulation loop.
fn overflow_margin(core: &SwitcherCore, k: usize, level_sp: usize) -> usize {
    let q = core.ring_q.overflow_margin(core.params.max_level()) >> 1;
    let p = core.family.ring(k).overflow_margin(level_sp) >> 1;
    q.min(p)
}

/// Resolves the switching-key rows for one compound digit and runs the
/// multiply-accumulate into both accumulator pairs.
#[allow(clippy::too_many_arguments)]
fn mac_digit(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    level_sp: usize,
    digit: usize,
    first: bool,
    swk: &SwitchingKey,
    la: &mut [PolyQp; 2],
    c2: &PolyQp,
    c0_q: &mut Poly,
    c0_p: &mut Poly,
    c1_q: &mut Poly,
    c1_p: &mut Poly,
) {
    debug_assert!(
        swk.group == 1 || swk.group == k + 1,
        "switching key pre-processed for a different special-modulus size"
    );
    let k_p = k * core.params.p_count();

    if swk.group == k + 1 {
        // Canonical at sp = 0, or pre-grouped for exactly this size: one
        // row pair per compound digit.
        let row = &swk.value[digit];
        let v0 = PolyQpView::extend(&row[0], level_q, k_p, level_sp);
        let v1 = PolyQpView::extend(&row[1], level_q, k_p, level_sp);
        mac_rows(core, k, level_q, level_sp, first, &v0, c2, c0_q, c0_p);
        mac_rows(core, k, level_q, level_sp, first, &v1, c2, c1_q, c1_p);
        return;
    }

    // Canonical key at sp > 0: group sp + 1 consecutive canonical rows.
    let start = digit * (k + 1);
    let end = (start + k + 1).min(swk.value.len());

    if end - start == 1 {
        // Single row left at the gadget boundary.
        let row = &swk.value[start];
        let v0 = PolyQpView::extend(&row[0], level_q, k_p, level_sp);
        let v1 = PolyQpView::extend(&row[1], level_q, k_p, level_sp);
        mac_rows(core, k, level_q, level_sp, first, &v0, c2, c0_q, c0_p);
        mac_rows(core, k, level_q, level_sp, first, &v1, c2, c1_q, c1_p);
        return;
    }

    let [la0, la1] = la;
    for (idx, j) in (start..end).enumerate() {
        let row = &swk.value[j];
        let v0 = PolyQpView::extend(&row[0], level_q, k_p, level_sp);
        let v1 = PolyQpView::extend(&row[1], level_q, k_p, level_sp);
        if idx == 0 {
            copy_view(level_q, level_sp, &v0, la0);
            copy_view(level_q, level_sp, &v1, la1);
        } else {
            add_view_no_mod(level_q, level_sp, &v0, la0);
            add_view_no_mod(level_q, level_sp, &v1, la1);
        }
    }
    mac_rows(core, k, level_q, level_sp, first, &*la0, c2, c0_q, c0_p);
    mac_rows(core, k, level_q, level_sp, first, &*la1, c2, c1_q, c1_p);
}

/// `acc (+)= key ⊙ digit` over both parts. `first` overwrites with the
/// lazy product, otherwise accumulates without reduction.
#[allow(clippy::too_many_arguments)]
fn mac_rows<K: QpRows>(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    level_sp: usize,
    first: bool,
    key: &K,
    c2: &PolyQp,
    out_q: &mut Poly,
    out_p: &mut Poly,
) {
    let ring_q = &core.ring_q;
    let ring_aux = core.family.ring(k);

    for i in 0..=level_q {
        let t = ring_q.table(i);
        if first {
            t.mul_row_lazy(key.q_row(i), &c2.q.coeffs[i], &mut out_q.coeffs[i]);
        } else {
            t.mul_add_row_no_mod(key.q_row(i), &c2.q.coeffs[i], &mut out_q.coeffs[i]);
        }
    }
    for l in 0..=level_sp {
        let t = ring_aux.table(l);
        if first {
            t.mul_row_lazy(key.p_row(l), &c2.p.coeffs[l], &mut out_p.coeffs[l]);
        } else {
            t.mul_add_row_no_mod(key.p_row(l), &c2.p.coeffs[l], &mut out_p.coeffs[l]);
        }
    }
}

/// Copies a reshaped view into an owned scratch polynomial.
fn copy_view(level_q: usize, level_sp: usize, v: &PolyQpView<'_>, dst: &mut PolyQp) {
    for i in 0..=level_q {
        dst.q.coeffs[i].copy_from_slice(v.q_row(i));
    }
    for l in 0..=level_sp {
        dst.p.coeffs[l].copy_from_slice(v.p_row(l));
    }
}

/// Adds a reshaped view into an owned scratch polynomial without
/// reduction (the grouped sums stay far below the overflow margin).
fn add_view_no_mod(level_q: usize, level_sp: usize, v: &PolyQpView<'_>, dst: &mut PolyQp) {
    for i in 0..=level_q {
        for (d, &s) in dst.q.coeffs[i].iter_mut().zip(v.q_row(i)) {
            *d = d.wrapping_add(s);
        }
    }
    for l in 0..=level_sp {
        for (d, &s) in dst.p.coeffs[l].iter_mut().zip(v.p_row(l)) {
            *d = d.wrapping_add(s);
        }
    }
}

/// Lazy-to-canonical reduction of all four accumulators.
fn reduce_acc(
    core: &SwitcherCore,
    k: usize,
    level_q: usize,
    level_sp: usize,
    c0_q: &mut Poly,
    c0_p: &mut Poly,
    c1_q: &mut Poly,
    c1_p: &mut Poly,
) {
    let ring_q = &core.ring_q;
    let aux = core.family.ring(k);
    ring_q.reduce_lvl(level_q, c0_q);
    ring_q.reduce_lvl(level_q, c1_q);
    aux.reduce_lvl(level_sp, c0_p);
    aux.reduce_lvl(level_sp, c1_p);
}
