pub mod disasm;
pub mod ir;
pub mod op;
pub mod stack_check;

pub use ir::{ImageError, Program};
pub use op::Op;
