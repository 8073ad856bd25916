//! The RNS ring layer.
//!
//! Polynomials over `R_Q = Z_Q[X]/(X^N + 1)` in residue representation,
//! leveled ring arithmetic, and the two basis-change engines hybrid
//! key-switching is built from: the gadget [`Decomposer`] and the mod-down
//! [`BasisExtender`].

pub mod basis;
pub mod poly;
pub mod rns;

pub use basis::{BasisExtender, Decomposer};
pub use poly::{Poly, PolyQp, PolyQpView};
pub use rns::RnsRing;
