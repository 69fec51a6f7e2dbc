//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use core_types::log::Level;
use core_types::{StackCheck, VmConfig};

use crate::error::{CliError, CliResult};

/// Reference build profile to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Desktop host: 32-bit words, floats, console I/O
    Unix,
    /// Asuro robot: 16-bit words, no floats, small code region
    Asuro,
}

impl Profile {
    /// The profile's configuration.
    pub fn config(self) -> VmConfig {
        match self {
            Profile::Unix => VmConfig::unix(),
            Profile::Asuro => VmConfig::asuro(),
        }
    }
}

/// Residual-stack policy as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StackCheckArg {
    /// Fault when a method returns with values left on its stack
    Verify,
    /// Drop leftover values
    Discard,
    /// Leave leftover values for the caller
    Retain,
}

impl From<StackCheckArg> for StackCheck {
    fn from(arg: StackCheckArg) -> Self {
        match arg {
            StackCheckArg::Verify => StackCheck::Verify,
            StackCheckArg::Discard => StackCheck::Discard,
            StackCheckArg::Retain => StackCheck::Retain,
        }
    }
}

/// NanoVM - run a program image
#[derive(Parser, Debug)]
#[command(name = "nanovm")]
#[command(version = "0.1.0")]
#[command(about = "NanoVM bytecode interpreter", long_about = None)]
pub struct Cli {
    /// Program image (JSON) to execute
    #[arg(short, long)]
    pub file: PathBuf,

    /// Build profile
    #[arg(short, long, value_enum, default_value_t = Profile::Unix)]
    pub profile: Profile,

    /// Configuration file (JSON); replaces the profile
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Heap size in bytes
    #[arg(long)]
    pub heap_size: Option<usize>,

    /// Residual operand stack policy on return
    #[arg(long, value_enum)]
    pub stack_check: Option<StackCheckArg>,

    /// Print the disassembled image before running it
    #[arg(long)]
    pub print_bytecode: bool,

    /// Log every executed instruction
    #[arg(long)]
    pub trace: bool,

    /// Log lifecycle events
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with_all = ["verbose", "trace"])]
    pub quiet: bool,
}

impl Cli {
    /// Effective VM configuration: the config file or the profile, then the
    /// individual overrides.
    pub fn vm_config(&self) -> CliResult<VmConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                VmConfig::from_json(&text).map_err(CliError::Load)?
            }
            None => self.profile.config(),
        };

        if let Some(heap_size) = self.heap_size {
            config.heap_size = heap_size;
        }
        if let Some(policy) = self.stack_check {
            config.stack_check = policy.into();
        }
        config.trace |= self.trace;
        config.validate().map_err(CliError::Load)?;
        Ok(config)
    }

    /// Log level selected by the verbosity flags.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::Error
        } else if self.trace {
            Level::Debug
        } else if self.verbose {
            Level::Info
        } else {
            Level::Warn
        }
    }
}
