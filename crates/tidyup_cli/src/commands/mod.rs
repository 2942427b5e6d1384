//! Subcommand implementations

pub mod check;
pub mod default_config;
pub mod extensions;
pub mod list_codes;
