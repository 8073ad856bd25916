//! Level-aware hybrid key-switching for RNS CKKS.
//!
//! Hybrid key-switching temporarily enlarges the ciphertext modulus `Q` by
//! a special modulus `P`, runs the gadget inner product there, and divides
//! by `P` afterwards. This crate makes the special modulus *level-aware*:
//! at ciphertext level `l` the top ciphertext primes are reused as extra
//! special primes, so the gadget needs fewer, wider digits, and a cost
//! model picks the width per level. Switching keys are generated once in
//! the canonical layout and reshaped per level, either on the fly
//! (zero-copy row reindexing) or ahead of time (digit grouping).
//!
//! Key components:
//! - [`ks::KeySwitcher`] — the switching procedures, hoisting entry
//!   points, key pre-processing, and the per-level policy
//! - [`ring`] — RNS polynomials, leveled ring arithmetic, gadget
//!   decomposition, and mod-down
//! - [`rlwe`] — secret and switching keys, key generation, and the
//!   minimal encryptor the noise tests use
//!
//! # Example
//!
//! ```
//! use levelks::{ks::KeySwitcher, params::Params, rlwe::KeyGenerator};
//!
//! let params = Params::research_truncated(8, 4, 2);
//! let mut kgen = KeyGenerator::with_seed(params.clone(), 1);
//! let sk = kgen.gen_secret_key();
//! let sk_out = kgen.gen_secret_key();
//! let swk = kgen.gen_switching_key(&sk, &sk_out);
//!
//! let mut ks = KeySwitcher::new(params.clone());
//! let mut p0 = ks.ring_q().new_poly();
//! let mut p1 = ks.ring_q().new_poly();
//!
//! let mut cx = ks.ring_q().new_poly();
//! cx.is_ntt = true; // zero polynomial, evaluation form
//! ks.switch_keys_in_place(params.max_level(), &cx, &swk, &mut p0, &mut p1);
//! ```

pub mod ks;
pub mod math;
pub mod params;
pub mod ring;
pub mod rlwe;

pub use ks::KeySwitcher;
pub use params::Params;
pub use rlwe::{KeyGenerator, SecretKey, SwitchingKey};
