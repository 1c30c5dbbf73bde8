use crate::bytecode::{Op, Program};
use crate::runtime::runtime_error::{RuntimeError, stack_underflow, undefined_identifier};
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct VmConfig {
    pub max_stack_size: Option<usize>,
    pub max_steps: Option<usize>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_stack_size: None,
            max_steps: None,
        }
    }
}

/// Stack machine executing a compiled [`Program`].
///
/// A VM is built for one program and one run. It owns the program, an
/// integer operand stack and the variable environment that `Store` writes.
pub struct Vm {
    program: Program,
    pc: usize,
    stack: Vec<i64>,
    env: HashMap<String, i64>,
    // Safety limits
    config: VmConfig,
    steps: usize,
}

impl Vm {
    pub fn new(program: Program) -> Self {
        Self::with_config(program, VmConfig::default())
    }

    pub fn with_config(program: Program, config: VmConfig) -> Self {
        Self {
            program,
            pc: 0,
            stack: Vec::new(),
            env: HashMap::new(),
            config,
            steps: 0,
        }
    }

    /// Builds a VM from a binary image written by [`Program::to_bytes`].
    ///
    /// Opcodes outside the instruction set are rejected here with
    /// [`RuntimeError::UnknownOpcode`].
    pub fn load_image(bytes: &[u8], config: VmConfig) -> Result<Self, RuntimeError> {
        let program = Program::from_bytes(bytes)?;
        Ok(Self::with_config(program, config))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn env(&self) -> &HashMap<String, i64> {
        &self.env
    }

    /// Top of the stack, the value a program evaluates to.
    pub fn result(&self) -> Option<i64> {
        self.stack.last().copied()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Consumes the VM, handing back the program, environment and stack.
    pub fn into_parts(self) -> (Program, HashMap<String, i64>, Vec<i64>) {
        (self.program, self.env, self.stack)
    }

    // Execution

    /// Runs until `Halt` or the end of the instruction array.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while let Some(op) = self.program.ops.get(self.pc).cloned() {
            self.pc += 1;
            self.check_limits()?;
            trace!(pc = self.pc - 1, op = %op, depth = self.stack.len(), "dispatch");

            match op {
                Op::Halt => break,
                Op::Push(n) => self.push(n)?,
                Op::Load(name) => {
                    let value = *self
                        .env
                        .get(&name)
                        .ok_or_else(|| undefined_identifier(&name))?;
                    self.push(value)?;
                }
                Op::Store(name) => {
                    let value = self.pop1("STORE")?;
                    self.env.insert(name, value);
                }
                Op::Add => {
                    let (a, b) = self.pop2("ADD")?;
                    self.push(checked("ADD", a.checked_add(b))?)?;
                }
                Op::Sub => {
                    let (a, b) = self.pop2("SUB")?;
                    self.push(checked("SUB", a.checked_sub(b))?)?;
                }
                Op::Mul => {
                    let (a, b) = self.pop2("MUL")?;
                    self.push(checked("MUL", a.checked_mul(b))?)?;
                }
                Op::Div => {
                    let (a, b) = self.pop2("DIV")?;
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    self.push(checked("DIV", floor_div(a, b))?)?;
                }
            }
        }

        debug!(
            steps = self.steps,
            depth = self.stack.len(),
            vars = self.env.len(),
            "halted"
        );
        Ok(())
    }

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeError::StepLimit { limit: max });
            }
        }

        Ok(())
    }

    fn push(&mut self, value: i64) -> Result<(), RuntimeError> {
        if let Some(limit) = self.config.max_stack_size {
            if self.stack.len() >= limit {
                return Err(RuntimeError::StackOverflow { limit });
            }
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop1(&mut self, op: &'static str) -> Result<i64, RuntimeError> {
        self.stack.pop().ok_or_else(|| stack_underflow(op, 1, 0))
    }

    /// Pops the right operand, then the left one.
    fn pop2(&mut self, op: &'static str) -> Result<(i64, i64), RuntimeError> {
        let found = self.stack.len();
        let underflow = || stack_underflow(op, 2, found);
        if found < 2 {
            return Err(underflow());
        }
        let b = self.stack.pop().ok_or_else(underflow)?;
        let a = self.stack.pop().ok_or_else(underflow)?;
        Ok((a, b))
    }
}

fn checked(op: &'static str, value: Option<i64>) -> Result<i64, RuntimeError> {
    value.ok_or(RuntimeError::ArithmeticOverflow { op })
}

/// Integer division rounding toward negative infinity.
///
/// `None` on overflow (`i64::MIN / -1`). The divisor must be non-zero.
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ============================================================
    // Test Helpers
    // ============================================================

    /// Run ops and return the VM for inspection
    fn run_ops(ops: Vec<Op>) -> Result<Vm, RuntimeError> {
        let mut vm = Vm::new(Program::new(ops));
        vm.run()?;
        Ok(vm)
    }

    /// Assert stack contains expected values
    fn assert_stack(ops: Vec<Op>, expected: Vec<i64>) {
        let vm = run_ops(ops).expect("execution should succeed");
        assert_eq!(vm.stack(), expected.as_slice(), "stack mismatch");
    }

    /// Assert execution produces an error containing the given substring
    fn assert_error(ops: Vec<Op>, error_contains: &str) {
        match run_ops(ops) {
            Ok(vm) => panic!(
                "expected error containing '{}', got stack: {:?}",
                error_contains,
                vm.stack()
            ),
            Err(e) => assert!(
                e.to_string().contains(error_contains),
                "expected error containing '{}', got: {}",
                error_contains,
                e
            ),
        }
    }

    #[test]
    fn test_push() {
        assert_stack(vec![Op::Push(42), Op::Halt], vec![42]);
        assert_stack(vec![Op::Push(1), Op::Push(2), Op::Push(3)], vec![1, 2, 3]);
    }

    #[test]
    fn test_arithmetic_operand_order() {
        assert_stack(vec![Op::Push(10), Op::Push(3), Op::Sub], vec![7]);
        assert_stack(vec![Op::Push(3), Op::Push(10), Op::Sub], vec![-7]);
        assert_stack(vec![Op::Push(6), Op::Push(7), Op::Mul], vec![42]);
        assert_stack(vec![Op::Push(2), Op::Push(2), Op::Add], vec![4]);
        assert_stack(vec![Op::Push(20), Op::Push(6), Op::Div], vec![3]);
    }

    #[test]
    fn test_div_floors() {
        assert_eq!(floor_div(7, 2), Some(3));
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_div(-7, -2), Some(3));
        assert_eq!(floor_div(-6, 3), Some(-2));
        assert_eq!(floor_div(i64::MIN, -1), None);

        assert_stack(
            vec![Op::Push(0), Op::Push(7), Op::Sub, Op::Push(2), Op::Div],
            vec![-4],
        );
    }

    #[test]
    fn test_store_and_load() {
        let vm = run_ops(vec![
            Op::Push(10),
            Op::Store("x".into()),
            Op::Load("x".into()),
            Op::Push(2),
            Op::Mul,
            Op::Halt,
        ])
        .unwrap();
        assert_eq!(vm.stack(), &[20]);
        assert_eq!(vm.env().get("x"), Some(&10));
        assert_eq!(vm.result(), Some(20));
    }

    #[test]
    fn test_store_overwrites() {
        let vm = run_ops(vec![
            Op::Push(1),
            Op::Store("x".into()),
            Op::Push(2),
            Op::Store("x".into()),
        ])
        .unwrap();
        assert_eq!(vm.env().len(), 1);
        assert_eq!(vm.env()["x"], 2);
        assert!(vm.stack().is_empty());
        assert_eq!(vm.result(), None);
    }

    #[test]
    fn test_halt_stops_execution() {
        let vm = run_ops(vec![Op::Push(1), Op::Halt, Op::Push(2), Op::Add]).unwrap();
        assert_eq!(vm.stack(), &[1]);
        assert_eq!(vm.pc(), 2);
    }

    #[test]
    fn test_runs_off_the_end_without_halt() {
        assert_stack(vec![Op::Push(5)], vec![5]);
        assert_stack(vec![], vec![]);
    }

    #[test]
    fn test_underflow() {
        assert_error(vec![Op::Add], "Stack underflow");
        assert_error(vec![Op::Push(1), Op::Mul], "Stack underflow");
        assert_error(vec![Op::Store("x".into())], "Stack underflow");
    }

    #[test]
    fn test_underflow_variant() {
        match run_ops(vec![Op::Push(1), Op::Div]) {
            Err(RuntimeError::StackUnderflow { op, needed, found }) => {
                assert_eq!(op, "DIV");
                assert_eq!(needed, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected underflow, got {:?}", other.map(|vm| vm.stack().to_vec())),
        }
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            run_ops(vec![Op::Push(5), Op::Push(0), Op::Div]),
            Err(RuntimeError::DivisionByZero)
        ));
    }

    #[test]
    fn test_undefined_identifier() {
        match run_ops(vec![Op::Load("y".into())]) {
            Err(RuntimeError::UndefinedIdentifier { name }) => assert_eq!(name, "y"),
            other => panic!("expected undefined identifier, got {:?}", other.is_ok()),
        }
        assert_error(vec![Op::Load("y".into())], "Undefined identifier 'y'");
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            run_ops(vec![Op::Push(i64::MAX), Op::Push(1), Op::Add]),
            Err(RuntimeError::ArithmeticOverflow { op: "ADD" })
        ));
        assert!(matches!(
            run_ops(vec![Op::Push(i64::MAX), Op::Push(2), Op::Mul]),
            Err(RuntimeError::ArithmeticOverflow { op: "MUL" })
        ));
        assert!(matches!(
            run_ops(vec![
                Op::Push(0),
                Op::Push(i64::MAX),
                Op::Sub,
                Op::Push(2),
                Op::Sub,
            ]),
            Err(RuntimeError::ArithmeticOverflow { op: "SUB" })
        ));
    }

    #[test]
    fn test_stack_size_limit() {
        let config = VmConfig {
            max_stack_size: Some(2),
            max_steps: None,
        };
        let mut vm = Vm::with_config(
            Program::new(vec![Op::Push(1), Op::Push(2), Op::Push(3)]),
            config,
        );
        assert!(matches!(
            vm.run(),
            Err(RuntimeError::StackOverflow { limit: 2 })
        ));
    }

    #[test]
    fn test_default_stack_is_unbounded() {
        let ops: Vec<Op> = (0..20_000).map(Op::Push).collect();
        let vm = run_ops(ops).expect("deep stack should not overflow by default");
        assert_eq!(vm.stack().len(), 20_000);
        assert_eq!(vm.result(), Some(19_999));
    }

    #[test]
    fn test_step_limit() {
        let config = VmConfig {
            max_stack_size: Some(100),
            max_steps: Some(2),
        };
        let mut vm = Vm::with_config(
            Program::new(vec![Op::Push(1), Op::Push(2), Op::Add, Op::Halt]),
            config,
        );
        assert!(matches!(vm.run(), Err(RuntimeError::StepLimit { limit: 2 })));
    }

    #[test]
    fn test_load_image() {
        let program = Program::new(vec![Op::Push(2), Op::Push(2), Op::Add, Op::Halt]);
        let bytes = program.to_bytes().unwrap();
        let mut vm = Vm::load_image(&bytes, VmConfig::default()).unwrap();
        vm.run().unwrap();
        assert_eq!(vm.result(), Some(4));
    }

    #[test]
    fn test_load_image_garbage() {
        assert!(matches!(
            Vm::load_image(&[0xff, 0xff, 0xff], VmConfig::default()),
            Err(RuntimeError::Image(_))
        ));
    }
}
