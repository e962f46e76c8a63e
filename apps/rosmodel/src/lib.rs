//! # rosmodel
//!
//! The command-line layer over `rosmodel-core`: argument parsing,
//! configuration, and every file the engine reads or writes.

pub mod cli;
pub mod config;
pub mod io;
