use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use anyhow::{Context, Result, bail};
use mila::error::io_error;
use mila::{Compiler, CompilerOptions};
use tracing::Level;

const VERSION: &str = env!("CARGO_PKG_VERSION");

struct CliOptions {
    input_file: Option<String>,
    output_file: Option<String>,
    verbose: bool,
    compiler: CompilerOptions,
}

fn print_usage() {
    println!("Mila Compiler v{}", VERSION);
    println!("Usage: milac [options] [source_file.mila] [-o output_file.ll]");
    println!();
    println!("Options:");
    println!("  -o <file>              输出文件 (默认: 标准输出)");
    println!("  --target <triple>      写入模块的 target triple");
    println!("  --module-name <name>   模块名 (默认: program 名)");
    println!("  --verbose              输出调试日志");
    println!("  --version, -v          显示版本号");
    println!("  --help, -h             显示帮助信息");
    println!();
    println!("Examples:");
    println!("  milac hello.mila -o hello.ll");
    println!("  cat hello.mila | milac --target x86_64-pc-linux-gnu");
}

fn parse_args(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions {
        input_file: None,
        output_file: None,
        verbose: false,
        compiler: CompilerOptions::default(),
    };
    let mut i = 1;

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--version" | "-v" => {
                println!("Mila Compiler v{}", VERSION);
                process::exit(0);
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--verbose" => {
                options.verbose = true;
            }
            "-o" | "--target" | "--module-name" => {
                i += 1;
                let value = args
                    .get(i)
                    .cloned()
                    .with_context(|| format!("option {} requires a value", arg))?;
                match arg.as_str() {
                    "-o" => options.output_file = Some(value),
                    "--target" => options.compiler.target_triple = Some(value),
                    _ => options.compiler.module_name = Some(value),
                }
            }
            _ => {
                if arg.starts_with('-') {
                    bail!("unknown option: {}", arg);
                }
                if options.input_file.is_some() {
                    bail!("unexpected extra argument: {}", arg);
                }
                options.input_file = Some(arg.clone());
            }
        }
        i += 1;
    }

    Ok(options)
}

fn run(options: &CliOptions) -> Result<()> {
    let source = match &options.input_file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| io_error(format!("failed to read '{}': {}", path, e)))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| io_error(format!("failed to read standard input: {}", e)))?;
            buffer
        }
    };

    let compiler = Compiler::with_options(options.compiler.clone());
    let ir = compiler.compile_to_string(&source)?;

    match &options.output_file {
        Some(path) => fs::write(path, ir).map_err(|e| io_error(format!("failed to write '{}': {}", path, e)))?,
        None => io::stdout()
            .write_all(ir.as_bytes())
            .map_err(|e| io_error(format!("failed to write standard output: {}", e)))?,
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(if options.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&options) {
        eprintln!("Compilation error: {:#}", e);
        process::exit(1);
    }
}
