//! # Chocoflan
//!
//! A tiny postfix language compiled to bytecode and run on a stack machine.
//!
//! ```text
//! main 10 def x  x 2 * end     ->   PUSH 10, STORE x, LOAD x, PUSH 2, MUL, HALT
//! ```
//!
//! The pipeline has three stages with no back edges: [`frontend::Lexer`]
//! produces tokens on demand, [`frontend::Parser`] turns them into a
//! [`bytecode::Program`], and [`runtime::Vm`] executes that program against an
//! operand stack and a variable environment.

pub mod bytecode;
pub mod frontend;
pub mod runtime;

use std::collections::HashMap;

use thiserror::Error;

pub use bytecode::{Op, Program};
pub use frontend::{Lexer, Parser, SyntaxError};
pub use runtime::{RuntimeError, Vm, VmConfig};

/// Any failure of a compile-and-run invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("SyntaxError: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("{}: {}", runtime_category(.0), .0)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    /// True for a `Load` of a name that was never stored.
    pub fn is_undefined_identifier(&self) -> bool {
        matches!(
            self,
            Error::Runtime(RuntimeError::UndefinedIdentifier { .. })
        )
    }
}

fn runtime_category(e: &RuntimeError) -> &'static str {
    match e {
        RuntimeError::UndefinedIdentifier { .. } => "NameError",
        RuntimeError::DivisionByZero => "ZeroDivisionError",
        _ => "RuntimeError",
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub program: Program,
    pub env: HashMap<String, i64>,
    pub stack: Vec<i64>,
}

impl Execution {
    /// Final top of stack, if anything is left.
    pub fn result(&self) -> Option<i64> {
        self.stack.last().copied()
    }
}

/// Compiles source text to bytecode.
pub fn compile(source: &str) -> Result<Program, SyntaxError> {
    Parser::new(Lexer::new(source)).program()
}

/// Compiles and runs `source` with default VM limits.
pub fn compile_and_run(source: &str) -> Result<Execution, Error> {
    run_with_config(source, VmConfig::default())
}

/// Compiles and runs `source` with the given VM limits.
pub fn run_with_config(source: &str, config: VmConfig) -> Result<Execution, Error> {
    let program = compile(source)?;
    execute(program, config)
}

/// Runs an already compiled program on a fresh VM.
pub fn execute(program: Program, config: VmConfig) -> Result<Execution, Error> {
    let mut vm = Vm::with_config(program, config);
    vm.run()?;
    let (program, env, stack) = vm.into_parts();
    Ok(Execution {
        program,
        env,
        stack,
    })
}
