//! One-shot subcommands.

pub mod output;
pub mod select;
pub mod session;
pub mod vote;
