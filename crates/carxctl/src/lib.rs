//! Car Expert CLI library
//!
//! Commands and the REPL are exposed so they can be tested in-process.

pub mod commands;
pub mod output;
pub mod repl;
