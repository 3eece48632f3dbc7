use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// A variable-length byte buffer. Serialized with a 32-bit length prefix.
#[derive(Serialize, Deserialize, Hash, Default, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    pub fn new(v: Vec<u8>) -> Bytes {
        Bytes(v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Bytes {
        Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Bytes {
        Bytes(v)
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&hex::encode(&self.0))
    }
}

// One concrete newtype per byte width the protocol uses. The wire form is
// the raw bytes with no framing, which is what the serde derive produces
// for a fixed-size array.
macro_rules! sized_bytes {
    ($name:ident, $len:expr) => {
        #[derive(Serialize, Deserialize, Hash, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(self) -> [u8; $len] {
                self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0; $len])
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(v: [u8; $len]) -> Self {
                Self(v)
            }
        }

        impl From<&[u8; $len]> for $name {
            fn from(v: &[u8; $len]) -> Self {
                Self(*v)
            }
        }

        // Infallible conversion from a slice. Callers use this only on
        // buffers whose length has already been validated (e.g. a
        // sanitized atom).
        impl From<&[u8]> for $name {
            fn from(v: &[u8]) -> Self {
                assert!(
                    v.len() == $len,
                    "expected {} bytes, got {}",
                    $len,
                    v.len()
                );
                let mut ret = [0; $len];
                ret.copy_from_slice(v);
                Self(ret)
            }
        }

        impl TryFrom<Vec<u8>> for $name {
            type Error = std::array::TryFromSliceError;
            fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
                Ok(Self(v.as_slice().try_into()?))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = [u8];
            fn deref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(&hex::encode(self.0))
            }
        }
    };
}

sized_bytes!(Bytes32, 32);
sized_bytes!(Bytes48, 48);
sized_bytes!(Bytes96, 96);
