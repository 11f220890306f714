//! CLI subcommands

pub mod init;
pub mod list;
