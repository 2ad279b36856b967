//! CLI subcommand implementations for the bingrab binary.

pub mod doctor;
pub mod run_cmd;
