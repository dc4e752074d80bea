//! Key newtypes.
//!
//! Each key is a 256-bit secret wrapped in its own type so the compiler
//! rejects passing a master key where an organization key belongs. All of
//! them zeroize on drop.

use crate::error::{CryptoError, CryptoResult};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

macro_rules! key_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name([u8; KEY_SIZE]);

        impl $name {
            pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
                Self(bytes)
            }

            /// Builds a key from a slice, rejecting anything but 32 bytes.
            pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
                if bytes.len() != KEY_SIZE {
                    return Err(CryptoError::InvalidKeyLength {
                        expected: KEY_SIZE,
                        actual: bytes.len(),
                    });
                }
                let mut key = [0u8; KEY_SIZE];
                key.copy_from_slice(bytes);
                Ok(Self(key))
            }

            pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
                &self.0
            }
        }

        // Never print key material, even in debug output.
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(..)"))
            }
        }
    };
}

key_type! {
    /// 256-bit secret derived from (password, email, iterations).
    ///
    /// Exists only transiently during the login, registration,
    /// password-change and reset flows, and while resident in the key store.
    MasterKey
}

key_type! {
    /// AEAD key derived from the master key via HKDF.
    ///
    /// Used exclusively to protect the user's RSA private key at rest.
    SymmetricKey
}

key_type! {
    /// Organization-wide AEAD key protecting all item and file content.
    ///
    /// Generated once at organization creation and re-wrapped (never
    /// regenerated) when shared with new members.
    OrgKey
}
