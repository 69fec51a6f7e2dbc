//! NanoVM Host CLI Library
//!
//! Provides the argument parser and the Runtime used by the `nanovm` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runtime;

pub use cli::{Cli, Profile, StackCheckArg};
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
