use crate::bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An opaque, serialized program. Only the evaluator reads its internal
/// structure; everywhere else equality is byte-equality.
#[derive(Serialize, Deserialize, Hash, Debug, Default, Clone, Eq, PartialEq)]
pub struct Program(Bytes);

impl Program {
    pub fn new(bytes: Bytes) -> Program {
        Program(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Program {
    fn from(v: Vec<u8>) -> Program {
        Program(v.into())
    }
}

impl From<&[u8]> for Program {
    fn from(v: &[u8]) -> Program {
        Program(v.into())
    }
}

impl AsRef<[u8]> for Program {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamable::{from_bytes, to_bytes};

    #[test]
    fn length_prefixed_on_the_wire() {
        let p = Program::from(vec![1_u8, 2, 3]);
        let buf = to_bytes(&p).unwrap();
        assert_eq!(buf, [0, 0, 0, 3, 1, 2, 3]);
        assert_eq!(from_bytes::<Program>(&buf).unwrap(), p);
    }
}
