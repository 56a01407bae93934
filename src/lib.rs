pub mod assets;
pub mod callbacks;
pub mod catalog;
pub mod cli;
pub mod command_handlers;
pub mod config;
pub mod error;
pub mod github;
pub mod installer;
pub mod ops;
pub mod output;
pub mod platform;
pub mod requirements;
pub mod tool;
pub mod versioning;

#[cfg(test)]
mod test_support;
