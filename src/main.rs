//! Jack compiler CLI: compile a `.jack` file or a directory of them.

use std::env;
use std::path::Path;
use std::process;

use jackc::driver::Compiler;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    eprintln!("jackc {} - Jack to VM compiler", VERSION);
    eprintln!();
    eprintln!("Usage: jackc <Jack-dir or Jack-file-name>");
    eprintln!();
    eprintln!("Compiles each .jack file into a .vm file next to it.");
    eprintln!("A file that compiles with errors produces no .vm output.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --help, -h      Show this help message");
    eprintln!("  --version       Show version");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [arg] if arg == "--help" || arg == "-h" => {
            print_usage();
        }
        [arg] if arg == "--version" => {
            println!("jackc {}", VERSION);
        }
        [target] => {
            process::exit(run(Path::new(target)));
        }
        _ => {
            print_usage();
            process::exit(64);
        }
    }
}

fn run(target: &Path) -> i32 {
    if !target.exists() {
        eprintln!("Could not find file or directory: {}", target.display());
        return 66;
    }

    let mut compiler = Compiler::new();
    let compiled = if target.is_dir() {
        compiler.compile_directory(target)
    } else {
        compiler.compile_file(target)
    };

    let mut success = match compiled {
        Ok(success) => success,
        Err(error) => {
            eprintln!("Error reading/writing while compiling {}: {}", target.display(), error);
            return 74;
        }
    };
    success &= compiler.verify();

    if success {
        0
    } else {
        1
    }
}
