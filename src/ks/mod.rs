//! Level-aware hybrid key-switching.
//!
//! The public surface is [`KeySwitcher`]; [`LevelPolicy`] picks the
//! special-modulus size per level, [`RingFamily`] precomputes one
//! auxiliary ring per size, and [`SwitcherBuffers`] holds the per-instance
//! scratch.

pub mod buffers;
pub mod family;
pub mod policy;
pub mod switch;

pub use buffers::SwitcherBuffers;
pub use family::RingFamily;
pub use policy::LevelPolicy;
pub use switch::KeySwitcher;
