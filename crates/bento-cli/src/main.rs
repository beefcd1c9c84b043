use std::fs;
use std::process::exit;

use clap::Parser;

use bento_lang::compiler::code::CompiledProgram;
use bento_lang::compiler::parser;
use bento_lang::vm::VirtualMachine;

use crate::args::BentoCliArgs;

pub mod args;

fn main() {
    env_logger::init();
    let args = BentoCliArgs::parse();
    match run(args) {
        Ok(()) => exit(0),
        Err(err) => {
            eprintln!("{err:#}");
            exit(1);
        }
    }
}

fn run(args: BentoCliArgs) -> Result<(), anyhow::Error> {
    for path in &args.paths {
        let input = fs::read_to_string(path)?;

        if args.ast {
            let program = parser::parse(&input)?;
            println!("{program:#?}");
            return Ok(());
        }

        let program = CompiledProgram::try_from(input.as_str())?;
        let mut vm = VirtualMachine::new(program);
        vm.run()?;
    }
    Ok(())
}
