//! RLWE key material and the minimal encryption surface the noise tests
//! need. Key-switching itself lives in [`crate::ks`].

pub mod enc;
pub mod gen;
pub mod keys;

pub use enc::{Ciphertext, Encryptor};
pub use gen::KeyGenerator;
pub use keys::{SecretKey, SwitchingKey};
