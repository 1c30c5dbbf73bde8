use std::fmt::Write;

use crate::bytecode::Program;

/// Print disassembly of a bytecode program
pub fn print_bc(program: &Program) {
    print!("{}", disassemble(program));
}

/// Render a numbered listing, one instruction per line.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "════════════════════════════════════════");
    let _ = writeln!(out, " main");
    let _ = writeln!(out, " {} instructions", program.len());
    let _ = writeln!(out, "════════════════════════════════════════");

    for (ip, op) in program.iter().enumerate() {
        let _ = writeln!(out, "{:04}  {}", ip, op);
    }

    out
}
