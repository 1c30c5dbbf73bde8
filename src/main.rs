use std::io::{self, BufRead, Write};
use std::{env, fs};

use chocoflan::bytecode::disasm::print_bc;
use chocoflan::bytecode::stack_check::check_ops;
use chocoflan::frontend::Lexer;
use chocoflan::frontend::token_dumper::TokenDumper;
use chocoflan::{Execution, Program, Vm, VmConfig, compile, execute};

struct Options {
    tokens_only: bool,
    bytecode: bool,
    check: bool,
    no_color: bool,
    image: bool,
    output: Option<String>,
    filename: Option<String>,
}

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_usage();
            std::process::exit(2);
        }
    };

    match &opts.filename {
        Some(filename) => run_file(filename, &opts),
        None => repl(),
    }
}

/// Installs a stderr subscriber when `RUST_LOG` is set.
///
/// Enable with `RUST_LOG=chocoflan=debug` or `RUST_LOG=chocoflan=trace`.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        tokens_only: false,
        bytecode: false,
        check: false,
        no_color: false,
        image: false,
        output: None,
        filename: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tokens" => opts.tokens_only = true,
            "--bc" | "--bytecode" => opts.bytecode = true,
            "--check" => opts.check = true,
            "--no-color" => opts.no_color = true,
            "--image" => opts.image = true,
            "-o" => {
                let path = iter.next().ok_or("-o needs an output path")?;
                opts.output = Some(path.clone());
            }
            flag if flag.starts_with('-') => return Err(format!("unknown flag {}", flag)),
            // first non-flag argument is the filename
            file => {
                if opts.filename.is_none() {
                    opts.filename = Some(file.to_string());
                }
            }
        }
    }

    Ok(opts)
}

fn print_usage() {
    println!("CHOCOFLAN - postfix calculator language");
    println!();
    println!("Usage:");
    println!("  chocoflan                      Start interactive REPL");
    println!("  chocoflan <file>               Compile and run a program");
    println!("  chocoflan --tokens <file>      Show tokens only");
    println!("  chocoflan --bc <file>          Print the bytecode listing before running");
    println!("  chocoflan --check <file>       Statically check stack usage");
    println!("  chocoflan <file> -o <out>      Write the compiled bytecode image");
    println!("  chocoflan --image <out>        Run a compiled bytecode image");
    println!("  chocoflan --help, -h           Show this help");
}

fn fail(kind: &str, msg: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", kind, msg);
    std::process::exit(1);
}

fn run_file(filename: &str, opts: &Options) {
    if opts.image {
        let bytes = fs::read(filename)
            .unwrap_or_else(|e| fail("Error", format!("failed to read '{}': {}", filename, e)));
        let mut vm = Vm::load_image(&bytes, VmConfig::default())
            .unwrap_or_else(|e| fail("Image error", e));
        if opts.bytecode {
            print_bc(vm.program());
        }
        if let Err(e) = vm.run() {
            fail("Runtime error", e);
        }
        let (program, env, stack) = vm.into_parts();
        report(&Execution {
            program,
            env,
            stack,
        });
        return;
    }

    let source = fs::read_to_string(filename)
        .unwrap_or_else(|e| fail("Error", format!("failed to read '{}': {}", filename, e)));

    if opts.tokens_only {
        let mut dumper = TokenDumper::new();
        if opts.no_color {
            dumper = dumper.no_color();
        }
        dumper.dump(&Lexer::new(&source).tokenize());
        return;
    }

    let program = compile(&source).unwrap_or_else(|e| fail("SyntaxError", e));

    if opts.bytecode {
        print_bc(&program);
    }

    if opts.check {
        match check_ops(program.ops()) {
            Ok(report) => println!(
                "stack check ok: max depth {}, final depth {}",
                report.max_depth, report.final_depth
            ),
            Err(e) => fail("Check failed", e),
        }
    }

    if let Some(out) = &opts.output {
        let bytes = program.to_bytes().unwrap_or_else(|e| fail("Image error", e));
        if let Err(e) = fs::write(out, bytes) {
            fail("Error", format!("failed to write '{}': {}", out, e));
        }
        println!("wrote {} instructions to {}", program.len(), out);
        return;
    }

    match execute(program, VmConfig::default()) {
        Ok(run) => report(&run),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Reads one line at a time and runs it; failures are reported and the
/// loop moves on to the next line.
fn repl() {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("$ ");
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error: {}", e);
                break;
            }
            None => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        match compile(&line) {
            Ok(program) => run_line(program),
            Err(e) => eprintln!("SyntaxError: {}", e),
        }
    }
}

fn run_line(program: Program) {
    print_bc(&program);
    match execute(program, VmConfig::default()) {
        Ok(run) => report(&run),
        Err(e) => eprintln!("{}", e),
    }
}

fn report(run: &Execution) {
    let mut env: Vec<_> = run.env.iter().collect();
    env.sort();

    let env = env
        .iter()
        .map(|(name, value)| format!("'{}': {}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Env: {{{}}}", env);
    println!("Stack: {:?}", run.stack);
    if let Some(result) = run.result() {
        println!("Result: {}", result);
    }
}
