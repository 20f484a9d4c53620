pub mod cli;
pub mod command;
pub mod config;
pub mod derived;
pub mod diagnostics;
pub mod dump;
pub mod encapsulate;
pub mod error;
