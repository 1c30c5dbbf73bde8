use serde::{Deserialize, Serialize};

// =============================================================================
// OP - Bytecode instructions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    // literals
    Push(i64),

    // environment
    Load(String),
    Store(String),

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,

    Halt,
}

/// Operand slot of an encoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    None,
    Int(i64),
    Name(String),
}

impl Op {
    pub const PUSH: u8 = 0x01;
    pub const LOAD: u8 = 0x02;
    pub const STORE: u8 = 0x03;
    pub const ADD: u8 = 0x10;
    pub const SUB: u8 = 0x11;
    pub const MUL: u8 = 0x12;
    pub const DIV: u8 = 0x13;
    pub const HALT: u8 = 0xff;

    /// Numeric opcode used in the binary image.
    pub fn opcode(&self) -> u8 {
        match self {
            Op::Push(_) => Self::PUSH,
            Op::Load(_) => Self::LOAD,
            Op::Store(_) => Self::STORE,
            Op::Add => Self::ADD,
            Op::Sub => Self::SUB,
            Op::Mul => Self::MUL,
            Op::Div => Self::DIV,
            Op::Halt => Self::HALT,
        }
    }

    pub fn operand(&self) -> Operand {
        match self {
            Op::Push(n) => Operand::Int(*n),
            Op::Load(name) | Op::Store(name) => Operand::Name(name.clone()),
            _ => Operand::None,
        }
    }

    /// Rebuilds an op from its opcode and operand.
    ///
    /// Returns `Err(DecodeError::UnknownOpcode)` for bytes outside the
    /// instruction set and `Err(DecodeError::BadOperand)` when the operand
    /// shape does not fit the opcode.
    pub fn decode(opcode: u8, operand: Operand) -> Result<Op, DecodeError> {
        let op = match (opcode, operand) {
            (Self::PUSH, Operand::Int(n)) => Op::Push(n),
            (Self::LOAD, Operand::Name(name)) => Op::Load(name),
            (Self::STORE, Operand::Name(name)) => Op::Store(name),
            (Self::ADD, Operand::None) => Op::Add,
            (Self::SUB, Operand::None) => Op::Sub,
            (Self::MUL, Operand::None) => Op::Mul,
            (Self::DIV, Operand::None) => Op::Div,
            (Self::HALT, Operand::None) => Op::Halt,
            (
                Self::PUSH
                | Self::LOAD
                | Self::STORE
                | Self::ADD
                | Self::SUB
                | Self::MUL
                | Self::DIV
                | Self::HALT,
                _,
            ) => return Err(DecodeError::BadOperand(opcode)),
            _ => return Err(DecodeError::UnknownOpcode(opcode)),
        };
        Ok(op)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Push(_) => "PUSH",
            Op::Load(_) => "LOAD",
            Op::Store(_) => "STORE",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Halt => "HALT",
        }
    }

    /// Returns (pops, pushes) for this op.
    pub fn stack_effect(&self) -> (usize, usize) {
        match self {
            Op::Push(_) | Op::Load(_) => (0, 1),
            Op::Store(_) => (1, 0),
            Op::Add | Op::Sub | Op::Mul | Op::Div => (2, 1),
            Op::Halt => (0, 0),
        }
    }
}

/// Why an encoded instruction could not be turned back into an [`Op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnknownOpcode(u8),
    BadOperand(u8),
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Push(n) => write!(f, "{:<11} {}", self.mnemonic(), n),
            Op::Load(name) | Op::Store(name) => write!(f, "{:<11} {}", self.mnemonic(), name),
            _ => f.write_str(self.mnemonic()),
        }
    }
}
