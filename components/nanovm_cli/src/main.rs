//! NanoVM host runner
//!
//! Entry point for the `nanovm` binary. Parses CLI arguments and delegates
//! to the Runtime for execution.

use clap::Parser as ClapParser;
use core_types::{info, log};
use nanovm_cli::{Cli, CliResult, Runtime};

fn run(cli: &Cli) -> CliResult<()> {
    let config = cli.vm_config()?;
    let mut runtime = Runtime::new(config).with_print_bytecode(cli.print_bytecode);
    if let Some(value) = runtime.execute_file(&cli.file)? {
        info!("main returned {}", value);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    log::set_level(cli.log_level());

    if let Err(err) = run(&cli) {
        eprintln!("nanovm: {}", err);
        std::process::exit(err.exit_code());
    }
}
