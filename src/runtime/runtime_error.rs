use crate::bytecode::ImageError;
use thiserror::Error;

/// Fatal errors raised while executing bytecode.
///
/// None of these are recovered inside the VM: the run stops at the failing
/// instruction.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Stack underflow: {op} needs {needed} operand(s), found {found}")]
    StackUnderflow {
        op: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Undefined identifier '{name}'")]
    UndefinedIdentifier { name: String },

    #[error("Unknown opcode 0x{opcode:02x} at instruction {index}")]
    UnknownOpcode { opcode: u8, index: usize },

    #[error("Integer overflow in {op}")]
    ArithmeticOverflow { op: &'static str },

    #[error("stack size limit exceeded ({limit})")]
    StackOverflow { limit: usize },

    #[error("execution step limit exceeded ({limit})")]
    StepLimit { limit: usize },

    #[error(transparent)]
    Image(ImageError),
}

impl From<ImageError> for RuntimeError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::UnknownOpcode { opcode, index } => {
                RuntimeError::UnknownOpcode { opcode, index }
            }
            other => RuntimeError::Image(other),
        }
    }
}

pub fn stack_underflow(op: &'static str, needed: usize, found: usize) -> RuntimeError {
    RuntimeError::StackUnderflow { op, needed, found }
}

pub fn undefined_identifier(name: &str) -> RuntimeError {
    RuntimeError::UndefinedIdentifier {
        name: name.to_string(),
    }
}
