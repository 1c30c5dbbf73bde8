use crate::bytecode::op::{DecodeError, Op, Operand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current layout version of the binary image.
pub const IMAGE_VERSION: u16 = 1;

/// A compiled bytecode program.
///
/// Programs produced by the parser always end in exactly one `Halt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.ops.iter()
    }

    /// Encodes the program as a versioned `postcard` image.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ImageError> {
        let image = Image {
            version: IMAGE_VERSION,
            ops: self
                .ops
                .iter()
                .map(|op| WireOp {
                    opcode: op.opcode(),
                    operand: op.operand(),
                })
                .collect(),
        };
        Ok(postcard::to_allocvec(&image)?)
    }

    /// Decodes an image produced by [`Program::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, ImageError> {
        let image: Image = postcard::from_bytes(bytes)?;
        if image.version != IMAGE_VERSION {
            return Err(ImageError::Version {
                found: image.version,
                expected: IMAGE_VERSION,
            });
        }

        let ops = image
            .ops
            .into_iter()
            .enumerate()
            .map(|(index, wire)| {
                Op::decode(wire.opcode, wire.operand).map_err(|e| match e {
                    DecodeError::UnknownOpcode(opcode) => {
                        ImageError::UnknownOpcode { opcode, index }
                    }
                    DecodeError::BadOperand(opcode) => ImageError::BadOperand { opcode, index },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Program { ops })
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[derive(Serialize, Deserialize)]
struct Image {
    version: u16,
    ops: Vec<WireOp>,
}

#[derive(Serialize, Deserialize)]
struct WireOp {
    opcode: u8,
    operand: Operand,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("malformed bytecode image: {0}")]
    Decode(#[from] postcard::Error),

    #[error("unsupported bytecode image version {found} (expected {expected})")]
    Version { found: u16, expected: u16 },

    #[error("unknown opcode 0x{opcode:02x} at instruction {index}")]
    UnknownOpcode { opcode: u8, index: usize },

    #[error("operand does not match opcode 0x{opcode:02x} at instruction {index}")]
    BadOperand { opcode: u8, index: usize },
}
