//! the interpreter's command-line front end. takes a source file and runs
//! it to completion against stdin/stdout, or dumps its tokens/AST for
//! inspection.
//!
//! run with `--help` for more info.

use microc::eval::{Interpreter, StdHost};
use microc::front::{lex, parse};

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// the input file
    file: String,
    /// dump this instead of running the program
    #[arg(value_enum, short, long)]
    dump: Option<Dump>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
enum Dump {
    /// the list of tokens
    Tokens,
    /// the parsed, type-annotated ast
    Ast,
}

fn main() {
    let args = Args::parse();

    let input = String::from_utf8(std::fs::read(&args.file).expect("file should be readable"))
        .expect("input characters should be utf8");

    match args.dump {
        Some(Dump::Tokens) => {
            let mut lexer = lex::Lexer::new(&input);
            loop {
                match lexer.next() {
                    Ok(Some(token)) => println!("{token}"),
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("{e}");
                        std::process::exit(1);
                    }
                }
            }
        }
        Some(Dump::Ast) => match parse(&input) {
            Ok(tu) => println!("{tu:?}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => {
            let tu = parse(&input).unwrap_or_else(|e| {
                eprintln!("{e}");
                std::process::exit(1);
            });
            let mut interp = Interpreter::new(&tu).unwrap_or_else(|e| {
                eprintln!("{e}");
                std::process::exit(1);
            });
            let stdin = std::io::stdin();
            let mut host = StdHost::new(stdin.lock(), std::io::stdout());
            let status = interp.run(&mut host).unwrap_or_else(|e| {
                eprintln!("{e}");
                std::process::exit(1);
            });
            std::process::exit(status);
        }
    }
}
