use std::collections::HashSet;

use crate::bytecode::Op;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stack-check error: {message}")]
pub struct StackCheckError {
    pub message: String,
    /// Index of the offending instruction.
    pub ip: usize,
}

impl StackCheckError {
    fn new(ip: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ip,
        }
    }
}

/// Summary of a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackReport {
    /// Deepest the operand stack gets.
    pub max_depth: usize,
    /// Stack depth when execution stops.
    pub final_depth: usize,
}

/// Statically simulates stack depth and variable bindings over `ops`.
///
/// The instruction set has no jumps, so a single linear scan that stops at
/// the first `Halt` sees every instruction the VM would execute. A `Load` of
/// a name with no earlier `Store` is reported, since every run starts with an
/// empty environment.
pub fn check_ops(ops: &[Op]) -> Result<StackReport, StackCheckError> {
    let mut height: usize = 0;
    let mut max_depth: usize = 0;
    let mut bound: HashSet<&str> = HashSet::new();

    for (ip, op) in ops.iter().enumerate() {
        match op {
            Op::Halt => break,
            Op::Load(name) if !bound.contains(name.as_str()) => {
                return Err(StackCheckError::new(
                    ip,
                    format!("'{}' is loaded at ip={} before any store", name, ip),
                ));
            }
            Op::Store(name) => {
                bound.insert(name.as_str());
            }
            _ => {}
        }

        let (pops, pushes) = op.stack_effect();
        height = height.checked_sub(pops).ok_or_else(|| {
            StackCheckError::new(
                ip,
                format!(
                    "stack underflow at ip={}, op={}, needed {} items, have {}",
                    ip,
                    op.mnemonic(),
                    pops,
                    height
                ),
            )
        })?;
        height += pushes;
        max_depth = max_depth.max(height);
    }

    Ok(StackReport {
        max_depth,
        final_depth: height,
    })
}
